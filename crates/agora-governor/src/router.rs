//! Dispatcher wrapper used while the governor executes a proposal.
//!
//! Calls aimed at the governor's own address are governance settings
//! changes and are applied here; every other call goes to the host
//! dispatcher. Savepoints cover both, so a failed bundle also reverts any
//! settings it had already changed.

use agora_types::{Address, Amount, CallError, Dispatcher, Env, Savepoint};
use tracing::debug;

use crate::error::GovernorError;
use crate::events::GovernorEvent;
use crate::settings::{GovernorCall, GovernorSettings};

pub(crate) struct SettingsRouter<'a> {
    governor: Address,
    timelock: Address,
    settings: &'a mut GovernorSettings,
    events: Vec<GovernorEvent>,
    saved: Vec<(GovernorSettings, usize, Savepoint)>,
    inner: &'a mut dyn Dispatcher,
}

impl<'a> SettingsRouter<'a> {
    pub(crate) fn new(
        governor: Address,
        timelock: Address,
        settings: &'a mut GovernorSettings,
        inner: &'a mut dyn Dispatcher,
    ) -> Self {
        Self {
            governor,
            timelock,
            settings,
            events: Vec::new(),
            saved: Vec::new(),
            inner,
        }
    }

    /// Settings events produced by the calls that went through.
    pub(crate) fn into_events(self) -> Vec<GovernorEvent> {
        self.events
    }
}

impl Dispatcher for SettingsRouter<'_> {
    fn dispatch(
        &mut self,
        env: &Env,
        caller: Address,
        target: Address,
        value: Amount,
        calldata: &[u8],
    ) -> Result<Vec<u8>, CallError> {
        if target != self.governor {
            return self.inner.dispatch(env, caller, target, value, calldata);
        }
        if caller != self.timelock {
            return Err(CallError::reverted(GovernorError::Unauthorized(caller)));
        }
        if value != 0 {
            return Err(CallError::reverted("governor does not accept value"));
        }

        let call = GovernorCall::decode(calldata).map_err(|e| CallError::InvalidCalldata(e.to_string()))?;
        debug!(?call, "applying governance call");
        let event = self.settings.apply(env, call).map_err(CallError::reverted)?;
        self.events.push(event);
        Ok(Vec::new())
    }

    fn savepoint(&mut self) -> Savepoint {
        let inner = self.inner.savepoint();
        self.saved.push((self.settings.clone(), self.events.len(), inner));
        Savepoint(self.saved.len() - 1)
    }

    fn rollback_to(&mut self, savepoint: Savepoint) {
        self.saved.truncate(savepoint.0 + 1);
        if let Some((settings, events, inner)) = self.saved.pop() {
            *self.settings = settings;
            self.events.truncate(events);
            self.inner.rollback_to(inner);
        }
    }

    fn release(&mut self, savepoint: Savepoint) {
        self.saved.truncate(savepoint.0 + 1);
        if let Some((_, _, inner)) = self.saved.pop() {
            self.inner.release(inner);
        }
    }
}
