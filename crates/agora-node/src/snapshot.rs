//! JSON state snapshots.

use std::fs;
use std::path::Path;

use agora_contracts::StoredValue;
use agora_governor::Governor;
use agora_timelock::Timelock;
use agora_types::{Address, Env};
use agora_votes::VotesLedger;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Everything needed to resume a deployment. Pending events are not kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub env: Env,
    pub block_time: u64,
    pub ledger: VotesLedger,
    pub timelock: Timelock,
    pub governor: Governor,
    pub store_address: Address,
    pub store: StoredValue,
}

impl StateSnapshot {
    /// Write the snapshot as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .map_err(|e| anyhow::anyhow!("Failed to write snapshot '{}': {}", path.display(), e))?;
        debug!("State persisted to {:?}", path);
        Ok(())
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read snapshot '{}': {}", path.display(), e))?;
        let snapshot: StateSnapshot = serde_json::from_str(&json)
            .map_err(|e| anyhow::anyhow!("Failed to parse snapshot '{}': {}", path.display(), e))?;
        info!(block = snapshot.env.block, "Loaded state from {:?}", path);
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeConfig;
    use crate::deploy::Deployment;
    use agora_timelock::Role;
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_roundtrip() {
        let config = NodeConfig::default();
        let deployment = Deployment::bootstrap(&config).unwrap();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("snapshot.json");

        deployment.snapshot().unwrap().save(&path).unwrap();
        let restored = Deployment::from_snapshot(StateSnapshot::load(&path).unwrap());

        assert_eq!(restored.env, deployment.env);
        assert_eq!(restored.ledger.total_supply(), deployment.ledger.total_supply());
        assert!(restored.timelock.has_role(Role::Proposer, &config.deployment.governor));
        assert_eq!(restored.stored_value().unwrap().owner(), config.deployment.timelock);
        restored.verify(&config).unwrap();
    }

    #[test]
    fn test_missing_snapshot_errors() {
        let dir = TempDir::new().unwrap();
        assert!(StateSnapshot::load(&dir.path().join("nope.json")).is_err());
    }
}
