//! Proposal state machine.
//!
//! ```text
//! Pending --(voting delay)--> Active --(deadline)--> Succeeded | Defeated
//! Succeeded --queue--> Queued --execute--> Executed
//! Queued --(grace period)--> Expired
//! Pending | Active --cancel--> Canceled
//! ```
//!
//! The governor reads voting power from a [`VotesLedger`] it never mutates,
//! and acts on the [`Timelock`] through the PROPOSER and EXECUTOR roles it
//! was granted at deployment.

use std::collections::BTreeMap;

use agora_timelock::{OperationStatus, Timelock};
use agora_types::{Address, Amount, Dispatcher, Env, Hash};
use agora_votes::VotesLedger;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::GovernorError;
use crate::events::GovernorEvent;
use crate::proposal::{
    hash_description, hash_proposal, Proposal, ProposalActions, ProposalState, ProposalVotes,
    VoteReceipt, VoteSupport,
};
use crate::router::SettingsRouter;
use crate::settings::{GovernorCall, GovernorConfig, GovernorSettings, QUORUM_DENOMINATOR};

/// Governor state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Governor {
    address: Address,
    timelock: Address,
    settings: GovernorSettings,
    proposals: BTreeMap<Hash, Proposal>,
    receipts: BTreeMap<Hash, BTreeMap<Address, VoteReceipt>>,
    #[serde(skip)]
    events: Vec<GovernorEvent>,
}

impl Governor {
    /// Deploy a governor at `address` that executes through the timelock at
    /// `timelock`.
    pub fn new(
        env: &Env,
        address: Address,
        timelock: Address,
        config: &GovernorConfig,
    ) -> Result<Self, GovernorError> {
        let settings = GovernorSettings::new(env, config)?;
        info!(
            address = %address,
            timelock = %timelock,
            voting_delay = config.voting_delay,
            voting_period = config.voting_period,
            quorum = config.quorum_numerator,
            "governor deployed"
        );
        Ok(Self {
            address,
            timelock,
            settings,
            proposals: BTreeMap::new(),
            receipts: BTreeMap::new(),
            events: Vec::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn timelock(&self) -> Address {
        self.timelock
    }

    pub fn settings(&self) -> &GovernorSettings {
        &self.settings
    }

    pub fn voting_delay(&self) -> u64 {
        self.settings.voting_delay()
    }

    pub fn voting_period(&self) -> u64 {
        self.settings.voting_period()
    }

    pub fn proposal_threshold(&self) -> Amount {
        self.settings.proposal_threshold()
    }

    pub fn quorum_numerator(&self) -> u64 {
        self.settings.quorum_numerator()
    }

    /// Proposal id for a bundle; pure.
    pub fn hash_proposal(&self, actions: &ProposalActions, description_hash: Hash) -> Result<Hash, GovernorError> {
        Ok(hash_proposal(actions, description_hash)?)
    }

    // ---- proposal queries ----

    pub fn proposal(&self, id: &Hash) -> Option<&Proposal> {
        self.proposals.get(id)
    }

    fn get(&self, id: &Hash) -> Result<&Proposal, GovernorError> {
        self.proposals.get(id).ok_or(GovernorError::UnknownProposal(*id))
    }

    pub fn proposal_snapshot(&self, id: &Hash) -> Result<u64, GovernorError> {
        Ok(self.get(id)?.snapshot)
    }

    pub fn proposal_deadline(&self, id: &Hash) -> Result<u64, GovernorError> {
        Ok(self.get(id)?.deadline)
    }

    pub fn proposal_proposer(&self, id: &Hash) -> Result<Address, GovernorError> {
        Ok(self.get(id)?.proposer)
    }

    /// Timelock ready timestamp, once queued.
    pub fn proposal_eta(&self, id: &Hash) -> Result<Option<u64>, GovernorError> {
        Ok(self.get(id)?.eta)
    }

    pub fn proposal_votes(&self, id: &Hash) -> Result<ProposalVotes, GovernorError> {
        Ok(self.get(id)?.votes)
    }

    pub fn has_voted(&self, id: &Hash, account: &Address) -> bool {
        self.receipt(id, account).is_some()
    }

    pub fn receipt(&self, id: &Hash, account: &Address) -> Option<&VoteReceipt> {
        self.receipts.get(id).and_then(|r| r.get(account))
    }

    /// Voting power of `account` at block `time`.
    pub fn get_votes(
        &self,
        env: &Env,
        ledger: &VotesLedger,
        account: &Address,
        time: u64,
    ) -> Result<Amount, GovernorError> {
        Ok(ledger.power_at(env, account, time)?)
    }

    /// Participation needed at block `time`:
    /// `ceil(total_supply(time) * numerator(time) / 100)`.
    pub fn quorum(&self, env: &Env, ledger: &VotesLedger, time: u64) -> Result<Amount, GovernorError> {
        let supply = ledger.past_total_supply(env, time)?;
        let numerator = Amount::from(self.settings.quorum_numerator_at(time));
        let denominator = Amount::from(QUORUM_DENOMINATOR);

        // Split to keep `supply * numerator` from overflowing.
        let whole = (supply / denominator) * numerator;
        let rest = ((supply % denominator) * numerator).div_ceil(denominator);
        Ok(whole + rest)
    }

    /// Current state of a proposal, derived from the clock, the tally and
    /// the timelock.
    pub fn state(
        &self,
        env: &Env,
        ledger: &VotesLedger,
        timelock: &Timelock,
        id: &Hash,
    ) -> Result<ProposalState, GovernorError> {
        let proposal = self.get(id)?;
        if let Some(state) = Self::voting_state(env, proposal) {
            return Ok(state);
        }

        let quorum = self.quorum(env, ledger, proposal.snapshot)?;
        if proposal.votes.total() < quorum || !proposal.votes.vote_succeeded() {
            return Ok(ProposalState::Defeated);
        }

        let Some(eta) = proposal.eta else {
            return Ok(ProposalState::Succeeded);
        };
        // Executions that land after the grace period do not revive the
        // proposal; it stays Expired.
        let expires_at = eta.saturating_add(self.settings.grace_period());
        let statuses: Vec<OperationStatus> = proposal.operations.iter().map(|op| timelock.status(op)).collect();
        let executed_in_time = proposal
            .operations
            .iter()
            .all(|op| timelock.executed_at(op).is_some_and(|at| at < expires_at));
        if statuses.contains(&OperationStatus::Unset) {
            Ok(ProposalState::Canceled)
        } else if statuses.iter().all(|s| *s == OperationStatus::Done) && executed_in_time {
            Ok(ProposalState::Executed)
        } else if env.timestamp >= expires_at {
            Ok(ProposalState::Expired)
        } else {
            Ok(ProposalState::Queued)
        }
    }

    /// States decided by flags and the voting window alone.
    fn voting_state(env: &Env, proposal: &Proposal) -> Option<ProposalState> {
        if proposal.executed {
            Some(ProposalState::Executed)
        } else if proposal.canceled {
            Some(ProposalState::Canceled)
        } else if env.block <= proposal.snapshot {
            Some(ProposalState::Pending)
        } else if env.block <= proposal.deadline {
            Some(ProposalState::Active)
        } else {
            None
        }
    }

    // ---- proposing ----

    /// Create a proposal. Returns its id.
    pub fn propose(
        &mut self,
        env: &Env,
        ledger: &VotesLedger,
        timelock: &Timelock,
        caller: Address,
        actions: ProposalActions,
        description: &str,
    ) -> Result<Hash, GovernorError> {
        actions.validate()?;
        let id = hash_proposal(&actions, hash_description(description))?;

        if self.proposals.contains_key(&id) {
            let state = self.state(env, ledger, timelock, &id)?;
            if !state.allows_resubmission() {
                return Err(GovernorError::AlreadyExists { id, state });
            }
        }

        let threshold = self.settings.proposal_threshold();
        let power = match env.last_block() {
            Some(block) => ledger.power_at(env, &caller, block)?,
            None => 0,
        };
        if power < threshold {
            return Err(GovernorError::InsufficientProposerPower { power, threshold });
        }

        let snapshot = env.block.saturating_add(self.settings.voting_delay());
        let deadline = snapshot.saturating_add(self.settings.voting_period());

        self.proposals.insert(id, Proposal::new(id, caller, snapshot, deadline));
        self.receipts.remove(&id);
        self.events.push(GovernorEvent::ProposalCreated {
            id,
            proposer: caller,
            actions,
            description: description.to_string(),
            snapshot,
            deadline,
        });

        info!(id = %id.short(), proposer = %caller, snapshot, deadline, "proposal created");
        Ok(id)
    }

    // ---- voting ----

    /// Cast a vote. Returns the weight counted.
    pub fn cast_vote(
        &mut self,
        env: &Env,
        ledger: &VotesLedger,
        caller: Address,
        id: Hash,
        support: VoteSupport,
    ) -> Result<Amount, GovernorError> {
        self.cast_vote_with_reason(env, ledger, caller, id, support, "")
    }

    /// Cast a vote with a reason carried in the event.
    pub fn cast_vote_with_reason(
        &mut self,
        env: &Env,
        ledger: &VotesLedger,
        caller: Address,
        id: Hash,
        support: VoteSupport,
        reason: &str,
    ) -> Result<Amount, GovernorError> {
        let proposal = self.get(&id)?;
        if Self::voting_state(env, proposal) != Some(ProposalState::Active) {
            return Err(GovernorError::NotActive(id));
        }
        if self.has_voted(&id, &caller) {
            return Err(GovernorError::AlreadyVoted { id, voter: caller });
        }

        let weight = ledger.power_at(env, &caller, proposal.snapshot)?;
        if weight == 0 {
            return Err(GovernorError::ZeroWeight(caller));
        }

        self.receipts
            .entry(id)
            .or_default()
            .insert(caller, VoteReceipt { support, weight });
        if let Some(proposal) = self.proposals.get_mut(&id) {
            proposal.votes.add(support, weight);
        }
        self.events.push(GovernorEvent::VoteCast {
            id,
            voter: caller,
            support,
            weight,
            reason: reason.to_string(),
        });

        info!(id = %id.short(), voter = %caller, ?support, weight, "vote cast");
        Ok(weight)
    }

    // ---- timelock ----

    fn salt(&self, description_hash: Hash, snapshot: u64) -> Result<Hash, GovernorError> {
        Ok(Hash::of_encoded(&(self.address, description_hash, snapshot))?)
    }

    /// Schedule a succeeded proposal in the timelock as one batched
    /// operation, so its calls can only ever run together. Returns the
    /// operation ids.
    pub fn queue(
        &mut self,
        env: &Env,
        ledger: &VotesLedger,
        timelock: &mut Timelock,
        actions: &ProposalActions,
        description_hash: Hash,
    ) -> Result<Vec<Hash>, GovernorError> {
        let id = hash_proposal(actions, description_hash)?;
        let state = self.state(env, ledger, timelock, &id)?;
        if state != ProposalState::Succeeded {
            return Err(GovernorError::NotSucceeded { id, state });
        }

        let salt = self.salt(description_hash, self.get(&id)?.snapshot)?;
        let delay = timelock.min_delay();
        let op = timelock.schedule_batch(env, self.address, &actions.calls(), Hash::ZERO, salt, delay)?;

        let eta = env.timestamp.saturating_add(delay);
        let operations = vec![op];
        if let Some(proposal) = self.proposals.get_mut(&id) {
            proposal.eta = Some(eta);
            proposal.operations = operations.clone();
        }
        self.events.push(GovernorEvent::ProposalQueued { id, eta });

        info!(id = %id.short(), eta, calls = actions.len(), "proposal queued");
        Ok(operations)
    }

    /// Execute a queued proposal through the timelock.
    ///
    /// All calls run in order. If any fails, the timelock, the governor's
    /// settings and the dispatcher's resources are restored and the
    /// proposal stays queued.
    pub fn execute(
        &mut self,
        env: &Env,
        ledger: &VotesLedger,
        timelock: &mut Timelock,
        dispatcher: &mut dyn Dispatcher,
        actions: &ProposalActions,
        description_hash: Hash,
    ) -> Result<(), GovernorError> {
        let id = hash_proposal(actions, description_hash)?;
        let state = self.state(env, ledger, timelock, &id)?;
        if state != ProposalState::Queued {
            return Err(GovernorError::NotQueued { id, state });
        }

        let salt = self.salt(description_hash, self.get(&id)?.snapshot)?;
        let calls = actions.calls();
        let address = self.address;

        let mut router = SettingsRouter::new(address, timelock.address(), &mut self.settings, dispatcher);
        if let Err(err) = timelock.execute_batch(env, address, &calls, Hash::ZERO, salt, &mut router) {
            warn!(id = %id.short(), error = %err, "proposal execution reverted");
            return Err(err.into());
        }
        let settings_events = router.into_events();

        if let Some(proposal) = self.proposals.get_mut(&id) {
            proposal.executed = true;
        }
        self.events.extend(settings_events);
        self.events.push(GovernorEvent::ProposalExecuted { id });

        info!(id = %id.short(), calls = calls.len(), "proposal executed");
        Ok(())
    }

    /// Cancel a proposal before voting ends. Proposer or guardian only.
    pub fn cancel(
        &mut self,
        env: &Env,
        caller: Address,
        actions: &ProposalActions,
        description_hash: Hash,
    ) -> Result<(), GovernorError> {
        let id = hash_proposal(actions, description_hash)?;
        let proposal = self.get(&id)?;
        if caller != proposal.proposer && Some(caller) != self.settings.guardian() {
            return Err(GovernorError::Unauthorized(caller));
        }
        if !matches!(
            Self::voting_state(env, proposal),
            Some(ProposalState::Pending | ProposalState::Active)
        ) {
            return Err(GovernorError::TooLate(id));
        }

        if let Some(proposal) = self.proposals.get_mut(&id) {
            proposal.canceled = true;
        }
        self.events.push(GovernorEvent::ProposalCanceled { id });
        info!(id = %id.short(), by = %caller, "proposal canceled");
        Ok(())
    }

    // ---- settings ----

    /// Apply a settings change. Only the timelock may call this; proposals
    /// reach it by targeting the governor's address.
    pub fn update_settings(&mut self, env: &Env, caller: Address, call: GovernorCall) -> Result<(), GovernorError> {
        if caller != self.timelock {
            return Err(GovernorError::Unauthorized(caller));
        }
        let event = self.settings.apply(env, call)?;
        self.events.push(event);
        Ok(())
    }

    /// Timelock operation ids of a queued proposal, in call order.
    pub fn proposal_operations(&self, id: &Hash) -> Result<&[Hash], GovernorError> {
        Ok(&self.get(id)?.operations)
    }

    // ---- events ----

    /// Events emitted since the last drain. They accumulate until the
    /// host calls [`Self::drain_events`].
    pub fn events(&self) -> &[GovernorEvent] {
        &self.events
    }

    /// Take the pending events, leaving none behind.
    pub fn drain_events(&mut self) -> Vec<GovernorEvent> {
        std::mem::take(&mut self.events)
    }
}
