//! Governor parameters.
//!
//! [`GovernorConfig`] is what a deployment starts from. [`GovernorSettings`]
//! is the live copy, which only governance itself may change afterwards by
//! executing a [`GovernorCall`] aimed at the governor's own address.

use agora_types::{Address, Amount, Env, TypesError};
use agora_votes::Checkpoints;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::GovernorError;
use crate::events::GovernorEvent;

/// Blocks between proposal creation and the snapshot.
pub const DEFAULT_VOTING_DELAY: u64 = 1;
/// Blocks during which votes are accepted (~1 week at 12s blocks).
pub const DEFAULT_VOTING_PERIOD: u64 = 50_400;
/// Percent of snapshotted supply that must participate.
pub const DEFAULT_QUORUM_NUMERATOR: u64 = 4;
/// Seconds a queued proposal stays executable after its eta (14 days).
pub const DEFAULT_GRACE_PERIOD: u64 = 1_209_600;
/// Denominator of the quorum fraction.
pub const QUORUM_DENOMINATOR: u64 = 100;

/// Initial governor parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    pub voting_delay: u64,
    pub voting_period: u64,
    pub proposal_threshold: Amount,
    /// Quorum as a percentage of total supply
    pub quorum_numerator: u64,
    pub grace_period: u64,
    /// Account allowed to cancel any proposal before voting ends
    pub guardian: Option<Address>,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            voting_delay: DEFAULT_VOTING_DELAY,
            voting_period: DEFAULT_VOTING_PERIOD,
            proposal_threshold: 0,
            quorum_numerator: DEFAULT_QUORUM_NUMERATOR,
            grace_period: DEFAULT_GRACE_PERIOD,
            guardian: None,
        }
    }
}

impl GovernorConfig {
    pub fn validate(&self) -> Result<(), GovernorError> {
        check_voting_period(self.voting_period)?;
        check_quorum_numerator(self.quorum_numerator)?;
        Ok(())
    }
}

fn check_voting_period(period: u64) -> Result<(), GovernorError> {
    if period == 0 {
        return Err(GovernorError::InvalidSetting("voting period must be positive".into()));
    }
    Ok(())
}

fn check_quorum_numerator(numerator: u64) -> Result<(), GovernorError> {
    if numerator > QUORUM_DENOMINATOR {
        return Err(GovernorError::InvalidSetting(format!(
            "quorum numerator {numerator} over denominator {QUORUM_DENOMINATOR}"
        )));
    }
    Ok(())
}

/// Calldata understood by the governor when it is the call target.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum GovernorCall {
    SetVotingDelay { new: u64 },
    SetVotingPeriod { new: u64 },
    SetProposalThreshold { new: Amount },
    UpdateQuorumNumerator { new: u64 },
}

impl GovernorCall {
    pub fn encode(&self) -> Result<Vec<u8>, TypesError> {
        Ok(borsh::to_vec(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self, TypesError> {
        Ok(borsh::from_slice(data)?)
    }
}

/// Live governor parameters.
///
/// The quorum numerator is checkpointed by block so a proposal keeps the
/// quorum in force at its snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorSettings {
    voting_delay: u64,
    voting_period: u64,
    proposal_threshold: Amount,
    quorum_numerator: Checkpoints,
    grace_period: u64,
    guardian: Option<Address>,
}

impl GovernorSettings {
    pub fn new(env: &Env, config: &GovernorConfig) -> Result<Self, GovernorError> {
        config.validate()?;
        let mut quorum_numerator = Checkpoints::new();
        quorum_numerator.push(env.block, Amount::from(config.quorum_numerator))?;

        Ok(Self {
            voting_delay: config.voting_delay,
            voting_period: config.voting_period,
            proposal_threshold: config.proposal_threshold,
            quorum_numerator,
            grace_period: config.grace_period,
            guardian: config.guardian,
        })
    }

    pub fn voting_delay(&self) -> u64 {
        self.voting_delay
    }

    pub fn voting_period(&self) -> u64 {
        self.voting_period
    }

    pub fn proposal_threshold(&self) -> Amount {
        self.proposal_threshold
    }

    pub fn grace_period(&self) -> u64 {
        self.grace_period
    }

    pub fn guardian(&self) -> Option<Address> {
        self.guardian
    }

    /// Current quorum numerator.
    pub fn quorum_numerator(&self) -> u64 {
        as_numerator(self.quorum_numerator.latest())
    }

    /// Quorum numerator in force at block `time`.
    pub fn quorum_numerator_at(&self, time: u64) -> u64 {
        as_numerator(self.quorum_numerator.upper_lookup(time))
    }

    /// Apply a governance call. Callers have already checked it came from
    /// the timelock.
    pub(crate) fn apply(&mut self, env: &Env, call: GovernorCall) -> Result<GovernorEvent, GovernorError> {
        let event = match call {
            GovernorCall::SetVotingDelay { new } => {
                let old = std::mem::replace(&mut self.voting_delay, new);
                GovernorEvent::VotingDelaySet { old, new }
            }
            GovernorCall::SetVotingPeriod { new } => {
                check_voting_period(new)?;
                let old = std::mem::replace(&mut self.voting_period, new);
                GovernorEvent::VotingPeriodSet { old, new }
            }
            GovernorCall::SetProposalThreshold { new } => {
                let old = std::mem::replace(&mut self.proposal_threshold, new);
                GovernorEvent::ProposalThresholdSet { old, new }
            }
            GovernorCall::UpdateQuorumNumerator { new } => {
                check_quorum_numerator(new)?;
                let old = self.quorum_numerator();
                self.quorum_numerator.push(env.block, Amount::from(new))?;
                GovernorEvent::QuorumNumeratorUpdated { old, new }
            }
        };
        info!(?event, block = env.block, "governor setting changed");
        Ok(event)
    }
}

fn as_numerator(value: Amount) -> u64 {
    // Only values <= QUORUM_DENOMINATOR are ever stored.
    u64::try_from(value).unwrap_or(QUORUM_DENOMINATOR)
}
