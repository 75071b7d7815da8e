// GRC ACL
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Actions, permission sets and global role grants

use crate::error::{AclError, AclResult};
use crate::models::object_type::ObjectType;
use crate::models::person::GlobalRole;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operation a person attempts on an object
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| AclError::validation(format!("Unknown action: {}", s)))
    }
}

/// Read/update/delete flags of a role or propagation rule
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PermissionSet {
    pub read: bool,
    pub update: bool,
    pub delete: bool,
}

impl PermissionSet {
    pub const NONE: PermissionSet = PermissionSet::new(false, false, false);
    pub const R: PermissionSet = PermissionSet::new(true, false, false);
    pub const RU: PermissionSet = PermissionSet::new(true, true, false);
    pub const RUD: PermissionSet = PermissionSet::new(true, true, true);

    pub const fn new(read: bool, update: bool, delete: bool) -> Self {
        Self { read, update, delete }
    }

    /// Parse the compact `RUD` notation, e.g. `"R"`, `"RU"`, `"RUD"`
    pub fn parse(notation: &str) -> AclResult<Self> {
        let mut set = PermissionSet::NONE;

        for flag in notation.chars() {
            let slot = match flag {
                'R' => &mut set.read,
                'U' => &mut set.update,
                'D' => &mut set.delete,
                _ => return Err(AclError::validation(format!("Invalid permission flag '{}' in '{}'", flag, notation))),
            };

            if *slot {
                return Err(AclError::validation(format!("Duplicate permission flag '{}' in '{}'", flag, notation)));
            }
            *slot = true;
        }

        if set.is_empty() {
            return Err(AclError::validation("Empty permission notation"));
        }

        Ok(set)
    }

    /// Whether the set grants `action`; creation is never granted by a set
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Create => false,
            Action::Read => self.read,
            Action::Update => self.update,
            Action::Delete => self.delete,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.read || self.update || self.delete)
    }

    pub fn union(self, other: PermissionSet) -> PermissionSet {
        PermissionSet::new(self.read || other.read, self.update || other.update, self.delete || other.delete)
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.read {
            f.write_str("R")?;
        }
        if self.update {
            f.write_str("U")?;
        }
        if self.delete {
            f.write_str("D")?;
        }
        Ok(())
    }
}

/// Whether a global role alone grants `action` on an existing object of `object_type`
pub fn global_role_allows(role: GlobalRole, action: Action, object_type: ObjectType) -> bool {
    match role {
        GlobalRole::Administrator => true,
        GlobalRole::Editor => true,
        GlobalRole::Reader => action == Action::Read || (action == Action::Create && object_type.is_top_level()),
        GlobalRole::Creator => action == Action::Create && object_type.is_top_level(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_notation() {
        assert_eq!(PermissionSet::parse("RU").unwrap(), PermissionSet::RU);
        assert_eq!(PermissionSet::parse("RUD").unwrap(), PermissionSet::RUD);
        assert_eq!(PermissionSet::RU.to_string(), "RU");
        assert!(PermissionSet::parse("").is_err());
        assert!(PermissionSet::parse("RX").is_err());
        assert!(PermissionSet::parse("RR").is_err());
    }

    #[test]
    fn test_permission_set_allows() {
        assert!(PermissionSet::RU.allows(Action::Update));
        assert!(!PermissionSet::RU.allows(Action::Delete));
        assert!(!PermissionSet::RUD.allows(Action::Create));
        assert_eq!(PermissionSet::R.union(PermissionSet::new(false, false, true)), PermissionSet::new(true, false, true));
    }

    #[test]
    fn test_global_role_grants() {
        assert!(global_role_allows(GlobalRole::Creator, Action::Create, ObjectType::Program));
        assert!(!global_role_allows(GlobalRole::Creator, Action::Create, ObjectType::Review));
        assert!(!global_role_allows(GlobalRole::Creator, Action::Read, ObjectType::Program));
        assert!(global_role_allows(GlobalRole::Reader, Action::Read, ObjectType::Review));
        assert!(!global_role_allows(GlobalRole::Reader, Action::Update, ObjectType::Review));
        assert!(global_role_allows(GlobalRole::Editor, Action::Delete, ObjectType::Review));
    }
}
