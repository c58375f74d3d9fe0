//! Node configuration.
//!
//! Handles loading and validation of the deployment configuration from
//! TOML files and command-line arguments.

use std::path::{Path, PathBuf};

use agora_governor::GovernorConfig;
use agora_types::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node name
    pub name: String,
    /// Data directory
    pub data_dir: PathBuf,
    /// Governor parameters
    pub governor: GovernorSection,
    /// Timelock parameters
    pub timelock: TimelockSection,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Genesis wiring
    pub deployment: DeploymentConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "agora-node".to_string(),
            data_dir: PathBuf::from("./data"),
            governor: GovernorSection::default(),
            timelock: TimelockSection::default(),
            logging: LoggingConfig::default(),
            deployment: DeploymentConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        check_path(path)?;
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: NodeConfig = toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn to_file(&self, path: &Path) -> anyhow::Result<()> {
        check_path(path)?;
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .map_err(|e| anyhow::anyhow!("Failed to write config file '{}': {}", path.display(), e))?;
        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.governor.to_governor_config().validate()?;

        if self.deployment.block_time == 0 {
            anyhow::bail!("Block time cannot be 0");
        }

        let d = &self.deployment;
        let addresses = [d.deployer, d.governor, d.timelock, d.store];
        if addresses.iter().any(Address::is_zero) {
            anyhow::bail!("Deployment addresses cannot be the zero address");
        }
        for (i, a) in addresses.iter().enumerate() {
            if addresses[i + 1..].contains(a) {
                anyhow::bail!("Deployment address {} is used twice", a);
            }
        }

        if d.holders.iter().any(|h| h.address.is_zero()) {
            anyhow::bail!("Token holders cannot be the zero address");
        }
        let supply = d
            .holders
            .iter()
            .try_fold(0 as Amount, |acc, h| acc.checked_add(Amount::from(h.amount)));
        if supply.is_none() {
            anyhow::bail!("Initial supply overflows");
        }

        match self.logging.format.as_str() {
            "json" | "pretty" => {}
            other => anyhow::bail!("Unknown log format '{}'", other),
        }

        Ok(())
    }
}

fn check_path(path: &Path) -> anyhow::Result<()> {
    if path.to_string_lossy().contains("..") {
        anyhow::bail!("Invalid path: directory traversal detected");
    }
    Ok(())
}

/// Governor parameters, in blocks except `grace_period` (seconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorSection {
    pub voting_delay: u64,
    pub voting_period: u64,
    pub proposal_threshold: u64,
    pub quorum_percentage: u64,
    pub grace_period: u64,
    pub guardian: Option<Address>,
}

impl Default for GovernorSection {
    fn default() -> Self {
        let defaults = GovernorConfig::default();
        Self {
            voting_delay: defaults.voting_delay,
            voting_period: defaults.voting_period,
            proposal_threshold: 0,
            quorum_percentage: defaults.quorum_numerator,
            grace_period: defaults.grace_period,
            guardian: None,
        }
    }
}

impl GovernorSection {
    pub fn to_governor_config(&self) -> GovernorConfig {
        GovernorConfig {
            voting_delay: self.voting_delay,
            voting_period: self.voting_period,
            proposal_threshold: Amount::from(self.proposal_threshold),
            quorum_numerator: self.quorum_percentage,
            grace_period: self.grace_period,
            guardian: self.guardian,
        }
    }
}

/// Timelock parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelockSection {
    /// Minimum delay in seconds
    pub min_delay: u64,
    /// Let any account execute ready operations
    pub open_execution: bool,
}

impl Default for TimelockSection {
    fn default() -> Self {
        Self {
            min_delay: 172_800, // 2 days
            open_execution: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log to file
    pub log_file: Option<PathBuf>,
    /// Log format (json|pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_file: None,
            format: "pretty".to_string(),
        }
    }
}

/// Initial token allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderConfig {
    pub address: Address,
    pub amount: u64,
}

/// Genesis wiring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Account that wires the system and then steps away
    pub deployer: Address,
    pub governor: Address,
    pub timelock: Address,
    /// Governed value store
    pub store: Address,
    pub genesis_block: u64,
    pub genesis_timestamp: u64,
    /// Seconds per block
    pub block_time: u64,
    /// Self-delegated at genesis
    pub holders: Vec<HolderConfig>,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        let deployer = Address::derive(b"agora/deployer");
        Self {
            deployer,
            governor: Address::derive(b"agora/governor"),
            timelock: Address::derive(b"agora/timelock"),
            store: Address::derive(b"agora/store"),
            genesis_block: 1,
            genesis_timestamp: 1_700_000_000,
            block_time: 12,
            holders: vec![HolderConfig { address: deployer, amount: 1_000_000 }],
        }
    }
}
