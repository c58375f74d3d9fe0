//! AGORA Contracts
//!
//! Resources governed through the timelock, and the registry that routes
//! calls to them.

pub mod error;
pub mod registry;
pub mod stored_value;

pub use error::ContractError;
pub use registry::{Resource, TargetRegistry};
pub use stored_value::{StoredValue, StoredValueEvent, ValueStoreCall};

/// Contract version
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");
