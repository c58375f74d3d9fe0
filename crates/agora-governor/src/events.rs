use agora_types::{Address, Amount, Hash};
use serde::{Deserialize, Serialize};

use crate::proposal::{ProposalActions, VoteSupport};

/// Events emitted by the governor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernorEvent {
    ProposalCreated {
        id: Hash,
        proposer: Address,
        actions: ProposalActions,
        description: String,
        snapshot: u64,
        deadline: u64,
    },
    VoteCast {
        id: Hash,
        voter: Address,
        support: VoteSupport,
        weight: Amount,
        reason: String,
    },
    ProposalQueued {
        id: Hash,
        eta: u64,
    },
    ProposalExecuted {
        id: Hash,
    },
    ProposalCanceled {
        id: Hash,
    },
    VotingDelaySet {
        old: u64,
        new: u64,
    },
    VotingPeriodSet {
        old: u64,
        new: u64,
    },
    ProposalThresholdSet {
        old: Amount,
        new: Amount,
    },
    QuorumNumeratorUpdated {
        old: u64,
        new: u64,
    },
}
