//! Agora Votes - Historical voting power.
//!
//! This crate provides:
//! - Append-only, binary-searchable checkpoint histories
//! - A token-like ledger where balances count as votes once delegated
//! - Snapshot queries ("power of X at block T") for the governor

pub mod checkpoints;
pub mod ledger;
pub mod error;

pub use checkpoints::{Checkpoint, Checkpoints};
pub use ledger::{VotesEvent, VotesLedger};
pub use error::VotesError;
