//! Agora Types - Core type definitions shared by the governance crates.
//!
//! This crate provides:
//! - Addresses (20-byte, hex encoded, with the `ANYONE` sentinel)
//! - Hashes (32-byte, blake3 digests)
//! - The logical clock handed to every state transition (`Env`)
//! - The call-dispatch seam between the timelock and governed resources

pub mod address;
pub mod hash;
pub mod env;
pub mod call;
pub mod error;

#[cfg(any(feature = "serde", feature = "borsh"))]
mod serialization;

pub use address::Address;
pub use hash::Hash;
pub use env::Env;
pub use call::{Call, CallError, Dispatcher, Savepoint};
pub use error::TypesError;

/// Token amounts and voting weight.
pub type Amount = u128;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Address, Amount, Call, CallError, Dispatcher, Env, Hash, Savepoint, TypesError};
}
