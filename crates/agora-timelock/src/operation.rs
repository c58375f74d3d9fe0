//! Timelock operations and their identifiers.

use agora_types::{Address, Call, Hash, TypesError};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::access::Role;

/// Lifecycle of an operation id. `Unset` is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    Unset,
    Scheduled,
    Done,
}

/// Stored operation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Earliest timestamp at which the operation may execute
    pub ready_at: u64,
    pub status: OperationStatus,
    /// Timestamp from which the operation can no longer run, if it expires
    #[serde(default)]
    pub expires_at: Option<u64>,
    /// Timestamp at which the operation ran, once done
    #[serde(default)]
    pub executed_at: Option<u64>,
}

impl Operation {
    pub fn is_pending(&self) -> bool {
        self.status == OperationStatus::Scheduled
    }

    pub fn is_ready(&self, now: u64) -> bool {
        self.is_pending() && now >= self.ready_at && !self.is_expired(now)
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    pub fn is_done(&self) -> bool {
        self.status == OperationStatus::Done
    }
}

/// Calldata understood by the timelock when it is the call target.
///
/// This is how governance changes the timelock's own configuration once
/// the bootstrap admin has stepped away.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum TimelockCall {
    GrantRole { role: Role, account: Address },
    RevokeRole { role: Role, account: Address },
    UpdateDelay { new_delay: u64 },
}

impl TimelockCall {
    pub fn encode(&self) -> Result<Vec<u8>, TypesError> {
        Ok(borsh::to_vec(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self, TypesError> {
        Ok(borsh::from_slice(data)?)
    }
}

/// Id of a single-call operation: `hash(target, value, data, predecessor, salt)`.
pub fn hash_operation(call: &Call, predecessor: Hash, salt: Hash) -> Result<Hash, TypesError> {
    Hash::of_encoded(&(call, predecessor, salt))
}

/// Id of a batched operation over `calls` in order.
pub fn hash_operation_batch(calls: &[Call], predecessor: Hash, salt: Hash) -> Result<Hash, TypesError> {
    Hash::of_encoded(&(calls, predecessor, salt))
}
