//! Call dispatch between the timelock and governed resources.
//!
//! The timelock never owns the resources it drives. The host hands it a
//! [`Dispatcher`] that routes `(target, value, calldata)` to whatever lives
//! at `target`, and that can snapshot and restore its resources so a bundle
//! of calls is applied all-or-nothing.

use crate::{Address, Amount, Env};
use thiserror::Error;

/// One call in a bundle: `value` units and `data` sent to `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "borsh", derive(borsh::BorshSerialize, borsh::BorshDeserialize))]
pub struct Call {
    pub target: Address,
    pub value: Amount,
    pub data: Vec<u8>,
}

impl Call {
    pub fn new(target: Address, value: Amount, data: Vec<u8>) -> Self {
        Self { target, value, data }
    }
}

/// Failure reported by a called resource. Any `CallError` reverts the
/// enclosing execution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("No resource at address {0}")]
    UnknownTarget(Address),

    #[error("Invalid calldata: {0}")]
    InvalidCalldata(String),

    #[error("Call reverted: {0}")]
    Reverted(String),
}

impl CallError {
    pub fn reverted(reason: impl std::fmt::Display) -> Self {
        CallError::Reverted(reason.to_string())
    }
}

/// Token returned by [`Dispatcher::savepoint`].
///
/// Savepoints nest; rolling back or releasing one discards every savepoint
/// taken after it.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a savepoint must be rolled back or released"]
pub struct Savepoint(pub usize);

/// Routes calls to governed resources.
pub trait Dispatcher {
    /// Deliver a call from `caller` to `target`.
    fn dispatch(
        &mut self,
        env: &Env,
        caller: Address,
        target: Address,
        value: Amount,
        calldata: &[u8],
    ) -> Result<Vec<u8>, CallError>;

    /// Snapshot every resource.
    fn savepoint(&mut self) -> Savepoint;

    /// Restore the resources to `savepoint`.
    fn rollback_to(&mut self, savepoint: Savepoint);

    /// Keep the current state and drop `savepoint`.
    fn release(&mut self, savepoint: Savepoint);
}
