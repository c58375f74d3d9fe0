//! Agora Node - Deploys and persists a wired governance system.
//!
//! Ties the ledger, timelock, governor and governed resources together the
//! way a deployment does, then hands control to governance.

pub mod config;
pub mod deploy;
pub mod snapshot;
pub mod telemetry;

pub use config::NodeConfig;
pub use deploy::Deployment;
pub use snapshot::StateSnapshot;
