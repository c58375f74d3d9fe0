use agora_types::{Address, CallError, Hash, TypesError};
use thiserror::Error;

use crate::access::Role;

/// Errors that can occur in timelock operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimelockError {
    #[error("Unauthorized: {account} is missing role {role}")]
    Unauthorized { account: Address, role: Role },

    #[error("Only the timelock itself may call {0}")]
    NotSelf(&'static str),

    #[error("Delay too short: {delay} < minimum {min_delay}")]
    DelayTooShort { delay: u64, min_delay: u64 },

    #[error("Operation already scheduled: {0}")]
    AlreadyScheduled(Hash),

    #[error("Operation not scheduled: {0}")]
    OperationNotScheduled(Hash),

    #[error("Operation {id} not ready: ready at {ready_at}, now {now}")]
    NotReady { id: Hash, ready_at: u64, now: u64 },

    #[error("Operation {id} expired at {expired_at}")]
    Expired { id: Hash, expired_at: u64 },

    #[error("Predecessor not done: {0}")]
    PredecessorNotDone(Hash),

    #[error("Empty batch")]
    EmptyBatch,

    #[error("Call {index} failed: {source}")]
    CallFailed {
        index: usize,
        #[source]
        source: CallError,
    },

    #[error("Encoding error: {0}")]
    Encoding(#[from] TypesError),
}
