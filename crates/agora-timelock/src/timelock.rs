//! Scheduled execution queue.
//!
//! Operations are identified by the hash of their content, scheduled by a
//! PROPOSER with at least `min_delay` seconds of delay, and executed by an
//! EXECUTOR (or anyone, if EXECUTOR is open) once the delay has elapsed.
//! Execution is all-or-nothing: if any call fails, the dispatcher and the
//! timelock itself are restored and the operation stays scheduled.

use std::collections::BTreeMap;

use agora_types::{Address, Amount, Call, CallError, Dispatcher, Env, Hash};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::access::{AccessControl, Role};
use crate::error::TimelockError;
use crate::operation::{
    hash_operation, hash_operation_batch, Operation, OperationStatus, TimelockCall,
};

/// Events emitted by the timelock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimelockEvent {
    CallScheduled {
        id: Hash,
        index: usize,
        target: Address,
        value: Amount,
        data: Vec<u8>,
        predecessor: Hash,
        delay: u64,
    },
    CallExecuted {
        id: Hash,
        index: usize,
        target: Address,
        value: Amount,
        data: Vec<u8>,
    },
    Cancelled {
        id: Hash,
    },
    MinDelayChange {
        old_delay: u64,
        new_delay: u64,
    },
    RoleGranted {
        role: Role,
        account: Address,
        sender: Address,
    },
    RoleRevoked {
        role: Role,
        account: Address,
        sender: Address,
    },
}

/// Timelock controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timelock {
    address: Address,
    min_delay: u64,
    #[serde(default)]
    grace_period: Option<u64>,
    access: AccessControl,
    operations: BTreeMap<Hash, Operation>,
    #[serde(skip)]
    events: Vec<TimelockEvent>,
}

impl Timelock {
    /// Deploy a timelock at `address`.
    ///
    /// The timelock is ADMIN over itself. `admin`, if given, is a bootstrap
    /// administrator expected to renounce once setup is done. Pass
    /// [`Address::ANYONE`] among `executors` to open execution to everyone.
    pub fn new(
        address: Address,
        min_delay: u64,
        proposers: &[Address],
        executors: &[Address],
        admin: Option<Address>,
    ) -> Self {
        let mut timelock = Self {
            address,
            min_delay,
            grace_period: None,
            access: AccessControl::new(),
            operations: BTreeMap::new(),
            events: Vec::new(),
        };

        timelock.bootstrap_grant(Role::Admin, address);
        if let Some(admin) = admin {
            timelock.bootstrap_grant(Role::Admin, admin);
        }
        for proposer in proposers {
            timelock.bootstrap_grant(Role::Proposer, *proposer);
        }
        for executor in executors {
            timelock.bootstrap_grant(Role::Executor, *executor);
        }
        timelock.events.push(TimelockEvent::MinDelayChange { old_delay: 0, new_delay: min_delay });

        info!(address = %address, min_delay, "timelock deployed");
        timelock
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn min_delay(&self) -> u64 {
        self.min_delay
    }

    /// Let operations scheduled from now on expire `grace_period` seconds
    /// after they become ready.
    pub fn with_grace_period(mut self, grace_period: u64) -> Self {
        self.grace_period = Some(grace_period);
        self
    }

    pub fn grace_period(&self) -> Option<u64> {
        self.grace_period
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.access.has_role(role, account)
    }

    // ---- operation queries ----

    pub fn status(&self, id: &Hash) -> OperationStatus {
        self.operations
            .get(id)
            .map(|op| op.status)
            .unwrap_or(OperationStatus::Unset)
    }

    pub fn is_operation(&self, id: &Hash) -> bool {
        self.operations.contains_key(id)
    }

    pub fn is_operation_pending(&self, id: &Hash) -> bool {
        self.operations.get(id).is_some_and(Operation::is_pending)
    }

    pub fn is_operation_ready(&self, env: &Env, id: &Hash) -> bool {
        self.operations.get(id).is_some_and(|op| op.is_ready(env.timestamp))
    }

    pub fn is_operation_done(&self, id: &Hash) -> bool {
        self.operations.get(id).is_some_and(Operation::is_done)
    }

    /// Ready timestamp of a scheduled or done operation.
    pub fn timestamp(&self, id: &Hash) -> Option<u64> {
        self.operations.get(id).map(|op| op.ready_at)
    }

    /// Timestamp at which a done operation ran.
    pub fn executed_at(&self, id: &Hash) -> Option<u64> {
        self.operations.get(id).and_then(|op| op.executed_at)
    }

    pub fn hash_operation(&self, call: &Call, predecessor: Hash, salt: Hash) -> Result<Hash, TimelockError> {
        Ok(hash_operation(call, predecessor, salt)?)
    }

    pub fn hash_operation_batch(
        &self,
        calls: &[Call],
        predecessor: Hash,
        salt: Hash,
    ) -> Result<Hash, TimelockError> {
        Ok(hash_operation_batch(calls, predecessor, salt)?)
    }

    // ---- scheduling ----

    /// Schedule a single call. Returns the operation id.
    pub fn schedule(
        &mut self,
        env: &Env,
        caller: Address,
        call: &Call,
        predecessor: Hash,
        salt: Hash,
        delay: u64,
    ) -> Result<Hash, TimelockError> {
        self.access.check_role(Role::Proposer, &caller)?;
        let id = hash_operation(call, predecessor, salt)?;
        self.insert_schedule(env, id, delay)?;

        self.events.push(TimelockEvent::CallScheduled {
            id,
            index: 0,
            target: call.target,
            value: call.value,
            data: call.data.clone(),
            predecessor,
            delay,
        });
        Ok(id)
    }

    /// Schedule `calls` as one operation. Returns the operation id.
    pub fn schedule_batch(
        &mut self,
        env: &Env,
        caller: Address,
        calls: &[Call],
        predecessor: Hash,
        salt: Hash,
        delay: u64,
    ) -> Result<Hash, TimelockError> {
        self.access.check_role(Role::Proposer, &caller)?;
        if calls.is_empty() {
            return Err(TimelockError::EmptyBatch);
        }
        let id = hash_operation_batch(calls, predecessor, salt)?;
        self.insert_schedule(env, id, delay)?;

        for (index, call) in calls.iter().enumerate() {
            self.events.push(TimelockEvent::CallScheduled {
                id,
                index,
                target: call.target,
                value: call.value,
                data: call.data.clone(),
                predecessor,
                delay,
            });
        }
        Ok(id)
    }

    fn insert_schedule(&mut self, env: &Env, id: Hash, delay: u64) -> Result<(), TimelockError> {
        if self.operations.contains_key(&id) {
            return Err(TimelockError::AlreadyScheduled(id));
        }
        if delay < self.min_delay {
            return Err(TimelockError::DelayTooShort { delay, min_delay: self.min_delay });
        }

        let ready_at = env.timestamp.saturating_add(delay);
        let expires_at = self.grace_period.map(|grace| ready_at.saturating_add(grace));
        self.operations.insert(
            id,
            Operation { ready_at, status: OperationStatus::Scheduled, expires_at, executed_at: None },
        );
        info!(id = %id.short(), ready_at, ?expires_at, delay, "operation scheduled");
        Ok(())
    }

    /// Cancel a pending operation. ADMIN only.
    pub fn cancel(&mut self, caller: Address, id: Hash) -> Result<(), TimelockError> {
        self.access.check_role(Role::Admin, &caller)?;
        if !self.is_operation_pending(&id) {
            return Err(TimelockError::OperationNotScheduled(id));
        }

        self.operations.remove(&id);
        self.events.push(TimelockEvent::Cancelled { id });
        info!(id = %id.short(), by = %caller, "operation cancelled");
        Ok(())
    }

    // ---- execution ----

    /// Execute a ready single-call operation.
    pub fn execute(
        &mut self,
        env: &Env,
        caller: Address,
        call: &Call,
        predecessor: Hash,
        salt: Hash,
        dispatcher: &mut dyn Dispatcher,
    ) -> Result<Vec<u8>, TimelockError> {
        let id = hash_operation(call, predecessor, salt)?;
        let mut output = self.execute_calls(env, caller, id, predecessor, std::slice::from_ref(call), dispatcher)?;
        Ok(output.pop().unwrap_or_default())
    }

    /// Execute a ready batched operation, calls in order.
    pub fn execute_batch(
        &mut self,
        env: &Env,
        caller: Address,
        calls: &[Call],
        predecessor: Hash,
        salt: Hash,
        dispatcher: &mut dyn Dispatcher,
    ) -> Result<Vec<Vec<u8>>, TimelockError> {
        if calls.is_empty() {
            return Err(TimelockError::EmptyBatch);
        }
        let id = hash_operation_batch(calls, predecessor, salt)?;
        self.execute_calls(env, caller, id, predecessor, calls, dispatcher)
    }

    fn execute_calls(
        &mut self,
        env: &Env,
        caller: Address,
        id: Hash,
        predecessor: Hash,
        calls: &[Call],
        dispatcher: &mut dyn Dispatcher,
    ) -> Result<Vec<Vec<u8>>, TimelockError> {
        self.access.check_role_or_open(Role::Executor, &caller)?;
        self.before_call(env, id, predecessor)?;

        let saved = self.clone();
        let savepoint = dispatcher.savepoint();
        let mut outputs = Vec::with_capacity(calls.len());

        for (index, call) in calls.iter().enumerate() {
            match self.perform_call(env, call, dispatcher) {
                Ok(output) => outputs.push(output),
                Err(source) => {
                    dispatcher.rollback_to(savepoint);
                    *self = saved;
                    warn!(id = %id.short(), index, error = %source, "operation reverted");
                    return Err(TimelockError::CallFailed { index, source });
                }
            }
        }

        dispatcher.release(savepoint);
        if let Some(op) = self.operations.get_mut(&id) {
            op.status = OperationStatus::Done;
            op.executed_at = Some(env.timestamp);
        }
        for (index, call) in calls.iter().enumerate() {
            self.events.push(TimelockEvent::CallExecuted {
                id,
                index,
                target: call.target,
                value: call.value,
                data: call.data.clone(),
            });
        }

        info!(id = %id.short(), calls = calls.len(), by = %caller, "operation executed");
        Ok(outputs)
    }

    fn before_call(&self, env: &Env, id: Hash, predecessor: Hash) -> Result<(), TimelockError> {
        let op = self
            .operations
            .get(&id)
            .filter(|op| op.is_pending())
            .ok_or(TimelockError::OperationNotScheduled(id))?;
        if env.timestamp < op.ready_at {
            return Err(TimelockError::NotReady {
                id,
                ready_at: op.ready_at,
                now: env.timestamp,
            });
        }
        if let Some(expired_at) = op.expires_at {
            if env.timestamp >= expired_at {
                return Err(TimelockError::Expired { id, expired_at });
            }
        }
        if !predecessor.is_zero() && !self.is_operation_done(&predecessor) {
            return Err(TimelockError::PredecessorNotDone(predecessor));
        }
        Ok(())
    }

    fn perform_call(
        &mut self,
        env: &Env,
        call: &Call,
        dispatcher: &mut dyn Dispatcher,
    ) -> Result<Vec<u8>, CallError> {
        if call.target == self.address {
            let decoded = TimelockCall::decode(&call.data)
                .map_err(|e| CallError::InvalidCalldata(e.to_string()))?;
            self.apply_self_call(decoded).map_err(CallError::reverted)?;
            return Ok(Vec::new());
        }
        debug!(to = %call.target, value = call.value, "dispatching call");
        dispatcher.dispatch(env, self.address, call.target, call.value, &call.data)
    }

    fn apply_self_call(&mut self, call: TimelockCall) -> Result<(), TimelockError> {
        let me = self.address;
        match call {
            TimelockCall::GrantRole { role, account } => self.grant_role(me, role, account),
            TimelockCall::RevokeRole { role, account } => self.revoke_role(me, role, account),
            TimelockCall::UpdateDelay { new_delay } => self.update_delay(me, new_delay),
        }
    }

    // ---- administration ----

    /// Change the minimum delay. Only the timelock itself, i.e. through an
    /// executed operation.
    pub fn update_delay(&mut self, caller: Address, new_delay: u64) -> Result<(), TimelockError> {
        if caller != self.address {
            return Err(TimelockError::NotSelf("update_delay"));
        }
        let old_delay = std::mem::replace(&mut self.min_delay, new_delay);
        self.events.push(TimelockEvent::MinDelayChange { old_delay, new_delay });
        info!(old_delay, new_delay, "minimum delay changed");
        Ok(())
    }

    pub fn grant_role(&mut self, caller: Address, role: Role, account: Address) -> Result<(), TimelockError> {
        if self.access.grant_role(&caller, role, account)? {
            self.events.push(TimelockEvent::RoleGranted { role, account, sender: caller });
        }
        Ok(())
    }

    pub fn revoke_role(&mut self, caller: Address, role: Role, account: Address) -> Result<(), TimelockError> {
        if self.access.revoke_role(&caller, role, account)? {
            self.events.push(TimelockEvent::RoleRevoked { role, account, sender: caller });
        }
        Ok(())
    }

    /// Drop one of the caller's own roles, e.g. the deployer's ADMIN once
    /// governance is live.
    pub fn renounce_role(&mut self, caller: Address, role: Role) {
        if self.access.renounce_role(&caller, role) {
            self.events.push(TimelockEvent::RoleRevoked { role, account: caller, sender: caller });
        }
    }

    fn bootstrap_grant(&mut self, role: Role, account: Address) {
        if self.access.grant_unchecked(role, account) {
            self.events.push(TimelockEvent::RoleGranted { role, account, sender: self.address });
        }
    }

    // ---- events ----

    /// Events emitted since the last drain. They accumulate until the
    /// host calls [`Self::drain_events`].
    pub fn events(&self) -> &[TimelockEvent] {
        &self.events
    }

    /// Take the pending events, leaving none behind.
    pub fn drain_events(&mut self) -> Vec<TimelockEvent> {
        std::mem::take(&mut self.events)
    }
}
