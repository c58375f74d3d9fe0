//! Agora Governor - Token-weighted proposals executed through a timelock.
//!
//! This crate provides:
//! - Content-addressed proposals over bundles of calls
//! - Voting against a snapshot of the votes ledger
//! - Quorum and approval rules deciding the outcome
//! - Queueing and execution through the timelock
//! - Settings that only governance itself may change

pub mod error;
pub mod events;
pub mod proposal;
pub mod settings;
pub mod governor;
mod router;

pub use error::GovernorError;
pub use events::GovernorEvent;
pub use proposal::{
    hash_description, hash_proposal, Proposal, ProposalActions, ProposalState, ProposalVotes,
    VoteReceipt, VoteSupport,
};
pub use settings::{GovernorCall, GovernorConfig, GovernorSettings};
pub use governor::Governor;
