//! Token-weighted voting power with delegation and history.
//!
//! Balances carry no voting power on their own. An account votes with the
//! sum of the balances delegated to it, and must delegate to itself to use
//! its own balance. Every change to a delegate's power or to the total
//! supply posts a checkpoint at the current block, so the governor can ask
//! what the power was at any past block.

use std::collections::BTreeMap;

use agora_types::{Address, Amount, Env};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::checkpoints::{Checkpoint, Checkpoints};
use crate::error::VotesError;

/// Events emitted by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VotesEvent {
    /// `from == None` is a mint, `to == None` a burn.
    Transfer {
        from: Option<Address>,
        to: Option<Address>,
        amount: Amount,
    },
    DelegateChanged {
        delegator: Address,
        from_delegate: Option<Address>,
        to_delegate: Option<Address>,
    },
    DelegateVotesChanged {
        delegate: Address,
        previous: Amount,
        current: Amount,
    },
}

/// Voting-power ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VotesLedger {
    balances: BTreeMap<Address, Amount>,
    delegates: BTreeMap<Address, Address>,
    checkpoints: BTreeMap<Address, Checkpoints>,
    total_supply: Checkpoints,
    #[serde(skip)]
    events: Vec<VotesEvent>,
}

impl VotesLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    // ---- token side ----

    /// Create `amount` new units for `to`.
    pub fn mint(&mut self, env: &Env, to: Address, amount: Amount) -> Result<(), VotesError> {
        let supply = self
            .total_supply
            .latest()
            .checked_add(amount)
            .ok_or(VotesError::SupplyOverflow)?;
        let balance = self.balance_of(&to) + amount;

        self.total_supply.push(env.block, supply)?;
        self.balances.insert(to, balance);
        self.events.push(VotesEvent::Transfer { from: None, to: Some(to), amount });
        self.move_voting_power(env, None, self.delegates(&to), amount)?;

        info!(to = %to, amount, supply, "minted");
        Ok(())
    }

    /// Destroy `amount` units held by `from`.
    pub fn burn(&mut self, env: &Env, from: Address, amount: Amount) -> Result<(), VotesError> {
        let have = self.balance_of(&from);
        if have < amount {
            return Err(VotesError::InsufficientBalance { have, need: amount });
        }
        let supply = self.total_supply.latest() - amount;

        self.total_supply.push(env.block, supply)?;
        self.balances.insert(from, have - amount);
        self.events.push(VotesEvent::Transfer { from: Some(from), to: None, amount });
        self.move_voting_power(env, self.delegates(&from), None, amount)?;

        info!(from = %from, amount, supply, "burned");
        Ok(())
    }

    /// Move `amount` units from `from` to `to`, carrying the voting units
    /// from `from`'s delegate to `to`'s delegate.
    pub fn transfer(
        &mut self,
        env: &Env,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), VotesError> {
        let have = self.balance_of(&from);
        if have < amount {
            return Err(VotesError::InsufficientBalance { have, need: amount });
        }

        if from != to {
            self.balances.insert(from, have - amount);
            // Bounded by total supply, cannot overflow.
            let to_balance = self.balance_of(&to) + amount;
            self.balances.insert(to, to_balance);
        }
        self.events.push(VotesEvent::Transfer { from: Some(from), to: Some(to), amount });
        self.move_voting_power(env, self.delegates(&from), self.delegates(&to), amount)?;

        debug!(from = %from, to = %to, amount, "transferred");
        Ok(())
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply.latest()
    }

    // ---- delegation ----

    /// Point `delegator`'s whole balance at `delegatee`.
    ///
    /// Delegating to the zero address removes the delegation. The previous
    /// and the new delegate both receive a checkpoint at the current block.
    pub fn delegate(
        &mut self,
        env: &Env,
        delegator: Address,
        delegatee: Address,
    ) -> Result<(), VotesError> {
        let old = self.delegates(&delegator);
        let new = (!delegatee.is_zero()).then_some(delegatee);
        let amount = self.balance_of(&delegator);

        self.move_voting_power(env, old, new, amount)?;
        match new {
            Some(to) => self.delegates.insert(delegator, to),
            None => self.delegates.remove(&delegator),
        };
        self.events.push(VotesEvent::DelegateChanged {
            delegator,
            from_delegate: old,
            to_delegate: new,
        });

        info!(delegator = %delegator, ?old, ?new, amount, block = env.block, "delegation changed");
        Ok(())
    }

    /// Current delegate of `account`, if any.
    pub fn delegates(&self, account: &Address) -> Option<Address> {
        self.delegates.get(account).copied()
    }

    // ---- voting power ----

    /// Record `new_power` for `account` at `at_time`.
    ///
    /// Low-level primitive behind every power change: appends when `at_time`
    /// is past the last checkpoint, overwrites when equal, is a no-op when the
    /// power is unchanged, and rejects earlier times.
    pub fn record_checkpoint(
        &mut self,
        account: Address,
        new_power: Amount,
        at_time: u64,
    ) -> Result<(Amount, Amount), VotesError> {
        let (previous, current) = self
            .checkpoints
            .entry(account)
            .or_default()
            .push(at_time, new_power)?;

        if previous != current {
            self.events.push(VotesEvent::DelegateVotesChanged {
                delegate: account,
                previous,
                current,
            });
            debug!(account = %account, previous, current, at_time, "checkpoint recorded");
        }
        Ok((previous, current))
    }

    /// Power currently held by `account`.
    pub fn current_votes(&self, account: &Address) -> Amount {
        self.checkpoints.get(account).map(Checkpoints::latest).unwrap_or(0)
    }

    /// Power held by `account` at block `time`. `time` must be in the past.
    pub fn power_at(&self, env: &Env, account: &Address, time: u64) -> Result<Amount, VotesError> {
        Self::check_past(env, time)?;
        Ok(self
            .checkpoints
            .get(account)
            .map(|cp| cp.upper_lookup(time))
            .unwrap_or(0))
    }

    /// Total supply at block `time`. `time` must be in the past.
    pub fn past_total_supply(&self, env: &Env, time: u64) -> Result<Amount, VotesError> {
        Self::check_past(env, time)?;
        Ok(self.total_supply.upper_lookup(time))
    }

    pub fn num_checkpoints(&self, account: &Address) -> usize {
        self.checkpoints.get(account).map(Checkpoints::len).unwrap_or(0)
    }

    pub fn checkpoint_at(&self, account: &Address, pos: usize) -> Option<Checkpoint> {
        self.checkpoints.get(account).and_then(|cp| cp.get(pos))
    }

    // ---- events ----

    /// Events emitted since the last drain. They accumulate until the
    /// host calls [`Self::drain_events`].
    pub fn events(&self) -> &[VotesEvent] {
        &self.events
    }

    /// Take the pending events, leaving none behind.
    pub fn drain_events(&mut self) -> Vec<VotesEvent> {
        std::mem::take(&mut self.events)
    }

    fn check_past(env: &Env, time: u64) -> Result<(), VotesError> {
        if time >= env.block {
            return Err(VotesError::FutureQuery {
                requested: time,
                current: env.block,
            });
        }
        Ok(())
    }

    /// Shift `amount` voting units between delegates.
    ///
    /// Both sides are computed before either is written.
    fn move_voting_power(
        &mut self,
        env: &Env,
        src: Option<Address>,
        dst: Option<Address>,
        amount: Amount,
    ) -> Result<(), VotesError> {
        if src == dst || amount == 0 {
            return Ok(());
        }

        let src_power = match src {
            Some(account) => Some((
                account,
                self.current_votes(&account)
                    .checked_sub(amount)
                    .ok_or(VotesError::PowerUnderflow(account))?,
            )),
            None => None,
        };
        let dst_power = match dst {
            Some(account) => Some((
                account,
                self.current_votes(&account)
                    .checked_add(amount)
                    .ok_or(VotesError::PowerOverflow(account))?,
            )),
            None => None,
        };

        if let Some((account, power)) = src_power {
            self.record_checkpoint(account, power, env.block)?;
        }
        if let Some((account, power)) = dst_power {
            self.record_checkpoint(account, power, env.block)?;
        }
        Ok(())
    }
}
