//! Single-owner value store.
//!
//! The simplest thing worth governing: one number that only the owner may
//! change. Deployments hand ownership to the timelock, after which the
//! value moves only through executed proposals.

use std::any::Any;

use agora_types::{Address, Amount, CallError, Env, TypesError};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ContractError;
use crate::registry::Resource;

/// Calldata accepted by [`StoredValue`].
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum ValueStoreCall {
    Store(u128),
    Retrieve,
    TransferOwnership(Address),
}

impl ValueStoreCall {
    pub fn encode(&self) -> Result<Vec<u8>, TypesError> {
        Ok(borsh::to_vec(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self, TypesError> {
        Ok(borsh::from_slice(data)?)
    }
}

/// Events emitted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoredValueEvent {
    ValueChanged { value: u128 },
    OwnershipTransferred { previous: Address, new: Address },
}

/// Owner-gated value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredValue {
    owner: Address,
    value: u128,
    #[serde(skip)]
    events: Vec<StoredValueEvent>,
}

impl StoredValue {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            value: 0,
            events: vec![StoredValueEvent::OwnershipTransferred { previous: Address::ZERO, new: owner }],
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn retrieve(&self) -> u128 {
        self.value
    }

    pub fn store(&mut self, caller: Address, value: u128) -> Result<(), ContractError> {
        self.only_owner(caller)?;
        self.value = value;
        self.events.push(StoredValueEvent::ValueChanged { value });
        info!(value, by = %caller, "value stored");
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<(), ContractError> {
        self.only_owner(caller)?;
        if new_owner.is_zero() {
            return Err(ContractError::ZeroAddress);
        }
        let previous = std::mem::replace(&mut self.owner, new_owner);
        self.events.push(StoredValueEvent::OwnershipTransferred { previous, new: new_owner });
        info!(previous = %previous, new = %new_owner, "ownership transferred");
        Ok(())
    }

    pub fn events(&self) -> &[StoredValueEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<StoredValueEvent> {
        std::mem::take(&mut self.events)
    }

    fn only_owner(&self, caller: Address) -> Result<(), ContractError> {
        if caller != self.owner {
            return Err(ContractError::NotOwner { caller, owner: self.owner });
        }
        Ok(())
    }

    fn handle(&mut self, caller: Address, value: Amount, calldata: &[u8]) -> Result<Vec<u8>, ContractError> {
        if value != 0 {
            return Err(ContractError::NotPayable);
        }
        match ValueStoreCall::decode(calldata)? {
            ValueStoreCall::Store(new) => self.store(caller, new)?,
            ValueStoreCall::Retrieve => return Ok(borsh::to_vec(&self.value).map_err(TypesError::from)?),
            ValueStoreCall::TransferOwnership(owner) => self.transfer_ownership(caller, owner)?,
        }
        Ok(Vec::new())
    }
}

impl Resource for StoredValue {
    fn call(&mut self, _env: &Env, caller: Address, value: Amount, calldata: &[u8]) -> Result<Vec<u8>, CallError> {
        self.handle(caller, value, calldata).map_err(|e| match e {
            ContractError::Encoding(e) => CallError::InvalidCalldata(e.to_string()),
            other => CallError::reverted(other),
        })
    }

    fn box_clone(&self) -> Box<dyn Resource> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
