//! Role-based access control.
//!
//! Each account holds a [`RoleSet`], a bitset over [`Role`]; permission
//! checks are set-membership tests. A role granted to [`Address::ANYONE`]
//! is open: `has_role_or_open` treats every account as holding it.

use std::collections::BTreeMap;
use std::fmt;

use agora_types::Address;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::TimelockError;

/// Capabilities recognised by the timelock.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum Role {
    /// May grant and revoke roles and cancel scheduled operations
    Admin = 0,
    /// May schedule operations
    Proposer = 1,
    /// May execute ready operations
    Executor = 2,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Proposer, Role::Executor];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Proposer => "PROPOSER",
            Role::Executor => "EXECUTOR",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of roles held by one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const EMPTY: Self = Self(0);

    pub fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    /// Returns true if the role was newly added.
    pub fn insert(&mut self, role: Role) -> bool {
        let added = !self.contains(role);
        self.0 |= role.bit();
        added
    }

    /// Returns true if the role was present.
    pub fn remove(&mut self, role: Role) -> bool {
        let present = self.contains(role);
        self.0 &= !role.bit();
        present
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|r| self.contains(*r))
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut set = RoleSet::EMPTY;
        for role in iter {
            set.insert(role);
        }
        set
    }
}

/// Role registry. Only ADMIN holders mutate it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessControl {
    members: BTreeMap<Address, RoleSet>,
}

impl AccessControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roles_of(&self, account: &Address) -> RoleSet {
        self.members.get(account).copied().unwrap_or_default()
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.roles_of(account).contains(role)
    }

    /// Held by `account` directly or opened to everyone.
    pub fn has_role_or_open(&self, role: Role, account: &Address) -> bool {
        self.has_role(role, account) || self.has_role(role, &Address::ANYONE)
    }

    pub fn check_role(&self, role: Role, account: &Address) -> Result<(), TimelockError> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(TimelockError::Unauthorized { account: *account, role })
        }
    }

    pub fn check_role_or_open(&self, role: Role, account: &Address) -> Result<(), TimelockError> {
        if self.has_role_or_open(role, account) {
            Ok(())
        } else {
            Err(TimelockError::Unauthorized { account: *account, role })
        }
    }

    /// Grant `role` to `account`. `caller` must be ADMIN.
    pub fn grant_role(
        &mut self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<bool, TimelockError> {
        self.check_role(Role::Admin, caller)?;
        Ok(self.grant_unchecked(role, account))
    }

    /// Revoke `role` from `account`. `caller` must be ADMIN.
    pub fn revoke_role(
        &mut self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<bool, TimelockError> {
        self.check_role(Role::Admin, caller)?;
        Ok(self.revoke_unchecked(role, account))
    }

    /// Drop one of the caller's own roles.
    pub fn renounce_role(&mut self, caller: &Address, role: Role) -> bool {
        self.revoke_unchecked(role, *caller)
    }

    /// Bootstrap-only grant, used while constructing the registry.
    pub(crate) fn grant_unchecked(&mut self, role: Role, account: Address) -> bool {
        let added = self.members.entry(account).or_default().insert(role);
        if added {
            info!(role = %role, account = %account, "role granted");
        }
        added
    }

    pub(crate) fn revoke_unchecked(&mut self, role: Role, account: Address) -> bool {
        let Some(set) = self.members.get_mut(&account) else {
            return false;
        };
        let removed = set.remove(role);
        if set.is_empty() {
            self.members.remove(&account);
        }
        if removed {
            info!(role = %role, account = %account, "role revoked");
        }
        removed
    }

    /// Accounts holding `role`.
    pub fn members_of(&self, role: Role) -> Vec<Address> {
        self.members
            .iter()
            .filter(|(_, set)| set.contains(role))
            .map(|(account, _)| *account)
            .collect()
    }
}
