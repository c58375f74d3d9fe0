//! Address-keyed resource registry.
//!
//! The host side of [`Dispatcher`]: routes each call to the resource
//! deployed at its target and keeps a stack of full snapshots for
//! savepoints.

use std::any::Any;
use std::collections::BTreeMap;

use agora_types::{Address, Amount, CallError, Dispatcher, Env, Savepoint};
use tracing::debug;

/// A governed object reachable by address.
pub trait Resource: Send {
    /// Handle a call from `caller` carrying `value` units.
    fn call(&mut self, env: &Env, caller: Address, value: Amount, calldata: &[u8]) -> Result<Vec<u8>, CallError>;

    fn box_clone(&self) -> Box<dyn Resource>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl Clone for Box<dyn Resource> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

type Resources = BTreeMap<Address, Box<dyn Resource>>;

/// Deployed resources plus savepoint snapshots.
#[derive(Default)]
pub struct TargetRegistry {
    resources: Resources,
    snapshots: Vec<Resources>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy `resource` at `address`, replacing anything already there.
    pub fn deploy(&mut self, address: Address, resource: Box<dyn Resource>) {
        debug!(address = %address, "resource deployed");
        self.resources.insert(address, resource);
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.resources.contains_key(address)
    }

    /// Typed view of the resource at `address`.
    pub fn get<T: 'static>(&self, address: &Address) -> Option<&T> {
        self.resources.get(address)?.as_any().downcast_ref()
    }

    pub fn get_mut<T: 'static>(&mut self, address: &Address) -> Option<&mut T> {
        self.resources.get_mut(address)?.as_any_mut().downcast_mut()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.resources.keys()
    }
}

impl Dispatcher for TargetRegistry {
    fn dispatch(
        &mut self,
        env: &Env,
        caller: Address,
        target: Address,
        value: Amount,
        calldata: &[u8],
    ) -> Result<Vec<u8>, CallError> {
        let resource = self
            .resources
            .get_mut(&target)
            .ok_or(CallError::UnknownTarget(target))?;
        resource.call(env, caller, value, calldata)
    }

    fn savepoint(&mut self) -> Savepoint {
        self.snapshots.push(self.resources.clone());
        Savepoint(self.snapshots.len() - 1)
    }

    fn rollback_to(&mut self, savepoint: Savepoint) {
        self.snapshots.truncate(savepoint.0 + 1);
        if let Some(resources) = self.snapshots.pop() {
            self.resources = resources;
        }
    }

    fn release(&mut self, savepoint: Savepoint) {
        self.snapshots.truncate(savepoint.0);
    }
}
