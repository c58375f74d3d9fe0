use agora_timelock::TimelockError;
use agora_types::{Address, Amount, Hash, TypesError};
use agora_votes::VotesError;
use thiserror::Error;

use crate::proposal::ProposalState;

/// Errors that can occur in governor operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GovernorError {
    #[error("Unknown proposal: {0}")]
    UnknownProposal(Hash),

    #[error("Invalid proposal length: {targets} targets, {values} values, {calldatas} calldatas")]
    InvalidProposalLength {
        targets: usize,
        values: usize,
        calldatas: usize,
    },

    #[error("Empty proposal")]
    EmptyProposal,

    #[error("Proposal already exists: {id} is {state}")]
    AlreadyExists { id: Hash, state: ProposalState },

    #[error("Insufficient proposer power: {power} < threshold {threshold}")]
    InsufficientProposerPower { power: Amount, threshold: Amount },

    #[error("Proposal {0} is not open for voting")]
    NotActive(Hash),

    #[error("Invalid vote type: {0}")]
    InvalidVoteType(u8),

    #[error("{voter} already voted on {id}")]
    AlreadyVoted { id: Hash, voter: Address },

    #[error("{0} had no voting power at the snapshot")]
    ZeroWeight(Address),

    #[error("Proposal {id} has not succeeded ({state})")]
    NotSucceeded { id: Hash, state: ProposalState },

    #[error("Proposal {id} is not queued ({state})")]
    NotQueued { id: Hash, state: ProposalState },

    #[error("Too late to cancel {0}: voting has ended")]
    TooLate(Hash),

    #[error("Unauthorized: {0}")]
    Unauthorized(Address),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Timelock error: {0}")]
    Timelock(#[from] TimelockError),

    #[error("Votes error: {0}")]
    Votes(#[from] VotesError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] TypesError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GovernorError::NotSucceeded { id: Hash::ZERO, state: ProposalState::Defeated };
        assert!(err.to_string().contains("Defeated"));
    }

    #[test]
    fn test_timelock_error_converts() {
        let err: GovernorError = TimelockError::EmptyBatch.into();
        assert_eq!(err, GovernorError::Timelock(TimelockError::EmptyBatch));
    }
}
