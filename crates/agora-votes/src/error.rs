use agora_types::{Address, Amount};
use thiserror::Error;

/// Errors that can occur in voting-power operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VotesError {
    #[error("Future lookup: requested {requested}, current clock {current}")]
    FutureQuery { requested: u64, current: u64 },

    #[error("Checkpoint out of order: last at {last}, attempted {attempted}")]
    CheckpointOutOfOrder { last: u64, attempted: u64 },

    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Amount, need: Amount },

    #[error("Total supply overflow")]
    SupplyOverflow,

    #[error("Voting power overflow for {0}")]
    PowerOverflow(Address),

    #[error("Voting power underflow for {0}")]
    PowerUnderflow(Address),
}
