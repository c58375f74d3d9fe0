//! Agora Timelock - Delayed, role-gated execution of calls.
//!
//! This crate provides:
//! - Capability-set access control (ADMIN, PROPOSER, EXECUTOR)
//! - Content-addressed operations that move Unset -> Scheduled -> Done
//! - All-or-nothing execution through a host `Dispatcher`
//! - Self-administration: the timelock is ADMIN over itself

pub mod access;
pub mod operation;
pub mod timelock;
pub mod error;

pub use access::{AccessControl, Role, RoleSet};
pub use operation::{hash_operation, hash_operation_batch, Operation, OperationStatus, TimelockCall};
pub use timelock::{Timelock, TimelockEvent};
pub use error::TimelockError;
