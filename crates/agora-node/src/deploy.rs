//! Genesis wiring.
//!
//! The deployer holds ADMIN over the timelock just long enough to grant
//! the governor PROPOSER and hand the store to the timelock, then renounces
//! it. From then on every privileged change goes through a proposal.

use agora_contracts::{StoredValue, TargetRegistry};
use agora_governor::Governor;
use agora_timelock::{Role, Timelock};
use agora_types::{Address, Amount, Env};
use agora_votes::VotesLedger;
use tracing::{debug, info};

use crate::config::NodeConfig;
use crate::snapshot::StateSnapshot;

/// A wired governance system.
pub struct Deployment {
    pub env: Env,
    pub ledger: VotesLedger,
    pub timelock: Timelock,
    pub governor: Governor,
    pub registry: TargetRegistry,
    pub store: Address,
    pub block_time: u64,
}

impl Deployment {
    /// Deploy every component from `config` and hand control to governance.
    pub fn bootstrap(config: &NodeConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let d = &config.deployment;
        let mut env = Env::new(d.genesis_block, d.genesis_timestamp);

        let mut ledger = VotesLedger::new();
        for holder in &d.holders {
            ledger.mint(&env, holder.address, Amount::from(holder.amount))?;
            ledger.delegate(&env, holder.address, holder.address)?;
        }

        let mut executors = vec![d.governor];
        if config.timelock.open_execution {
            executors.push(Address::ANYONE);
        }
        let mut timelock = Timelock::new(d.timelock, config.timelock.min_delay, &[], &executors, Some(d.deployer))
            .with_grace_period(config.governor.grace_period);
        timelock.grant_role(d.deployer, Role::Proposer, d.governor)?;

        let governor = Governor::new(&env, d.governor, d.timelock, &config.governor.to_governor_config())?;

        let mut store = StoredValue::new(d.deployer);
        store.transfer_ownership(d.deployer, d.timelock)?;
        let mut registry = TargetRegistry::new();
        registry.deploy(d.store, Box::new(store));

        timelock.renounce_role(d.deployer, Role::Admin);

        // Genesis balances become queryable history once the block closes.
        env.advance_blocks(1, d.block_time);

        let mut deployment = Self {
            env,
            ledger,
            timelock,
            governor,
            registry,
            store: d.store,
            block_time: d.block_time,
        };
        deployment.verify(config)?;
        let events = deployment.flush_events();

        info!(
            governor = %d.governor,
            timelock = %d.timelock,
            store = %d.store,
            supply = deployment.ledger.total_supply(),
            events,
            "governance deployed"
        );
        Ok(deployment)
    }

    /// Check the post-bootstrap wiring.
    pub fn verify(&self, config: &NodeConfig) -> anyhow::Result<()> {
        let d = &config.deployment;

        if !self.timelock.access().members_of(Role::Admin).iter().all(|a| *a == d.timelock) {
            anyhow::bail!("Timelock ADMIN held outside the timelock");
        }
        if self.timelock.has_role(Role::Admin, &d.governor) {
            anyhow::bail!("Governor must not hold ADMIN");
        }
        if !self.timelock.has_role(Role::Proposer, &d.governor) {
            anyhow::bail!("Governor is missing PROPOSER");
        }
        if !self.timelock.has_role(Role::Executor, &d.governor) {
            anyhow::bail!("Governor is missing EXECUTOR");
        }
        if self.stored_value()?.owner() != d.timelock {
            anyhow::bail!("Store is not owned by the timelock");
        }
        Ok(())
    }

    pub fn stored_value(&self) -> anyhow::Result<&StoredValue> {
        self.registry
            .get::<StoredValue>(&self.store)
            .ok_or_else(|| anyhow::anyhow!("No store deployed at {}", self.store))
    }

    /// Log and discard every component's pending events. Returns how many
    /// were flushed.
    pub fn flush_events(&mut self) -> usize {
        let mut count = 0;
        for event in self.ledger.drain_events() {
            debug!(?event, "ledger event");
            count += 1;
        }
        for event in self.timelock.drain_events() {
            debug!(?event, "timelock event");
            count += 1;
        }
        for event in self.governor.drain_events() {
            debug!(?event, "governor event");
            count += 1;
        }
        if let Some(store) = self.registry.get_mut::<StoredValue>(&self.store) {
            for event in store.drain_events() {
                debug!(?event, "store event");
                count += 1;
            }
        }
        count
    }

    /// Move the clock forward by `blocks` blocks.
    pub fn mine(&mut self, blocks: u64) {
        self.env.advance_blocks(blocks, self.block_time);
    }

    pub fn snapshot(&self) -> anyhow::Result<StateSnapshot> {
        Ok(StateSnapshot {
            env: self.env,
            block_time: self.block_time,
            ledger: self.ledger.clone(),
            timelock: self.timelock.clone(),
            governor: self.governor.clone(),
            store_address: self.store,
            store: self.stored_value()?.clone(),
        })
    }

    pub fn from_snapshot(snapshot: StateSnapshot) -> Self {
        let mut registry = TargetRegistry::new();
        registry.deploy(snapshot.store_address, Box::new(snapshot.store));
        Self {
            env: snapshot.env,
            ledger: snapshot.ledger,
            timelock: snapshot.timelock,
            governor: snapshot.governor,
            registry,
            store: snapshot.store_address,
            block_time: snapshot.block_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_hands_over_control() {
        let config = NodeConfig::default();
        let deployment = Deployment::bootstrap(&config).unwrap();
        let d = &config.deployment;

        assert!(!deployment.timelock.has_role(Role::Admin, &d.deployer));
        assert!(deployment.timelock.has_role(Role::Admin, &d.timelock));
        assert!(!deployment.timelock.has_role(Role::Executor, &Address::ANYONE));
        assert_eq!(deployment.stored_value().unwrap().owner(), d.timelock);
        assert_eq!(deployment.env.block, d.genesis_block + 1);
        assert_eq!(deployment.ledger.current_votes(&d.deployer), 1_000_000);
    }

    #[test]
    fn test_open_execution_grants_anyone() {
        let mut config = NodeConfig::default();
        config.timelock.open_execution = true;
        let deployment = Deployment::bootstrap(&config).unwrap();
        assert!(deployment.timelock.has_role(Role::Executor, &Address::ANYONE));
    }

    #[test]
    fn test_bootstrap_flushes_events() {
        let config = NodeConfig::default();
        let mut deployment = Deployment::bootstrap(&config).unwrap();
        assert!(deployment.ledger.events().is_empty());
        assert!(deployment.timelock.events().is_empty());
        assert!(deployment.governor.events().is_empty());
        assert!(deployment.stored_value().unwrap().events().is_empty());

        deployment.mine(1);
        let holder = config.deployment.deployer;
        deployment.ledger.delegate(&deployment.env, holder, holder).unwrap();
        assert!(deployment.flush_events() > 0);
        assert!(deployment.ledger.events().is_empty());
    }

    #[test]
    fn test_timelock_expires_with_governor_grace() {
        let config = NodeConfig::default();
        let deployment = Deployment::bootstrap(&config).unwrap();
        assert_eq!(deployment.timelock.grace_period(), Some(config.governor.grace_period));
    }

    #[test]
    fn test_invalid_config_refused() {
        let mut config = NodeConfig::default();
        config.governor.voting_period = 0;
        assert!(Deployment::bootstrap(&config).is_err());
    }
}
