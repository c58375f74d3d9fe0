//! Proposal records, identity and tallies.
//!
//! A proposal is identified by the hash of what it would do, so the same
//! bundle and description always map to the same id. Its state is never
//! stored: the governor derives it from the clock, the tally and the
//! timelock on every read.

use std::fmt;

use agora_types::{Address, Amount, Call, Hash, TypesError};
use serde::{Deserialize, Serialize};

use crate::error::GovernorError;

/// Proposal state in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalState {
    /// Created, voting not yet open
    Pending,
    /// Voting is open
    Active,
    /// Cancelled by its proposer, the guardian or the timelock admin
    Canceled,
    /// Voting ended without quorum or majority
    Defeated,
    /// Voting ended with quorum and majority
    Succeeded,
    /// Scheduled in the timelock
    Queued,
    /// Not executed within the grace period
    Expired,
    /// Executed
    Executed,
}

impl ProposalState {
    /// States from which the same content may be proposed again.
    pub fn allows_resubmission(&self) -> bool {
        matches!(self, ProposalState::Defeated | ProposalState::Canceled | ProposalState::Expired)
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Vote support options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteSupport {
    /// Vote against
    Against = 0,
    /// Vote in favor
    For = 1,
    /// Abstain (counts toward quorum only)
    Abstain = 2,
}

impl TryFrom<u8> for VoteSupport {
    type Error = GovernorError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(VoteSupport::Against),
            1 => Ok(VoteSupport::For),
            2 => Ok(VoteSupport::Abstain),
            other => Err(GovernorError::InvalidVoteType(other)),
        }
    }
}

/// Weighted tally of a proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalVotes {
    pub against: Amount,
    pub for_votes: Amount,
    pub abstain: Amount,
}

impl ProposalVotes {
    /// Participation counted toward quorum.
    pub fn total(&self) -> Amount {
        self.against
            .saturating_add(self.for_votes)
            .saturating_add(self.abstain)
    }

    /// Strict majority of decisive votes.
    pub fn vote_succeeded(&self) -> bool {
        self.for_votes > self.against
    }

    pub(crate) fn add(&mut self, support: VoteSupport, weight: Amount) {
        // Weights are bounded by the snapshotted total supply.
        let slot = match support {
            VoteSupport::Against => &mut self.against,
            VoteSupport::For => &mut self.for_votes,
            VoteSupport::Abstain => &mut self.abstain,
        };
        *slot = slot.saturating_add(weight);
    }
}

/// One voter's recorded ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub support: VoteSupport,
    pub weight: Amount,
}

/// The calls a proposal would make, as parallel sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalActions {
    pub targets: Vec<Address>,
    pub values: Vec<Amount>,
    pub calldatas: Vec<Vec<u8>>,
}

impl ProposalActions {
    pub fn new(targets: Vec<Address>, values: Vec<Amount>, calldatas: Vec<Vec<u8>>) -> Self {
        Self { targets, values, calldatas }
    }

    /// Single call with no value attached.
    pub fn single(target: Address, calldata: Vec<u8>) -> Self {
        Self::new(vec![target], vec![0], vec![calldata])
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Sequences must be non-empty and of equal length.
    pub fn validate(&self) -> Result<(), GovernorError> {
        if self.targets.len() != self.values.len() || self.targets.len() != self.calldatas.len() {
            return Err(GovernorError::InvalidProposalLength {
                targets: self.targets.len(),
                values: self.values.len(),
                calldatas: self.calldatas.len(),
            });
        }
        if self.targets.is_empty() {
            return Err(GovernorError::EmptyProposal);
        }
        Ok(())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.targets
            .iter()
            .zip(&self.values)
            .zip(&self.calldatas)
            .map(|((target, value), data)| Call::new(*target, *value, data.clone()))
            .collect()
    }
}

impl From<Vec<Call>> for ProposalActions {
    fn from(calls: Vec<Call>) -> Self {
        let mut actions = ProposalActions::default();
        for call in calls {
            actions.targets.push(call.target);
            actions.values.push(call.value);
            actions.calldatas.push(call.data);
        }
        actions
    }
}

/// Stored proposal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: Hash,
    pub proposer: Address,
    /// Block whose voting power counts; voting opens after it
    pub snapshot: u64,
    /// Last block on which votes are accepted
    pub deadline: u64,
    pub votes: ProposalVotes,
    pub canceled: bool,
    pub executed: bool,
    /// Timelock ready timestamp, set when queued
    pub eta: Option<u64>,
    /// Timelock operation ids, set when queued. The whole bundle is one
    /// batched operation.
    pub operations: Vec<Hash>,
}

impl Proposal {
    pub fn new(id: Hash, proposer: Address, snapshot: u64, deadline: u64) -> Self {
        Self {
            id,
            proposer,
            snapshot,
            deadline,
            votes: ProposalVotes::default(),
            canceled: false,
            executed: false,
            eta: None,
            operations: Vec::new(),
        }
    }

    pub fn is_queued(&self) -> bool {
        self.eta.is_some()
    }
}

/// Hash of a proposal description.
pub fn hash_description(description: &str) -> Hash {
    Hash::compute(description.as_bytes())
}

/// Proposal id: `hash(targets, values, calldatas, description_hash)`.
pub fn hash_proposal(actions: &ProposalActions, description_hash: Hash) -> Result<Hash, TypesError> {
    Hash::of_encoded(&(
        &actions.targets,
        &actions.values,
        &actions.calldatas,
        description_hash,
    ))
}
