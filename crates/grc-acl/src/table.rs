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

//! Expected propagation outcomes per global role, scenario and action

use crate::error::{AclError, AclResult};
use crate::factories::FactoryKind;
use crate::models::{GlobalRole, ObjectType};
use crate::rbac::permissions::Action;
use crate::rbac::roles::PRIMARY_CONTACTS_ROLE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parents covered by the built-in Primary Contacts table
pub const PRIMARY_CONTACTS_PARENTS: [ObjectType; 8] = [
    ObjectType::Program,
    ObjectType::Regulation,
    ObjectType::Objective,
    ObjectType::Contract,
    ObjectType::Policy,
    ObjectType::Standard,
    ObjectType::Threat,
    ObjectType::Requirement,
];

/// Action key -> expected outcome
pub type ActionExpectations = BTreeMap<String, bool>;

/// Scenario key (`"<Model> <Parent>"`) -> actions
pub type ScenarioExpectations = BTreeMap<String, ActionExpectations>;

/// Expected outcomes for one access control role, keyed by global role name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionTable {
    /// Name of the access control role granted on each parent
    pub acr_name: String,

    pub permissions: BTreeMap<String, ScenarioExpectations>,
}

/// Parsed `"<Model> <Parent>"` scenario key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario {
    pub model: FactoryKind,
    pub parent: ObjectType,
}

impl Scenario {
    pub fn parse(key: &str) -> AclResult<Self> {
        let mut parts = key.split_whitespace();
        let (Some(model), Some(parent), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(AclError::invalid_table(format!("Scenario '{}' must be '<Model> <Parent>'", key)));
        };

        let model: FactoryKind = model.parse()?;
        let parent: ObjectType = parent
            .parse()
            .map_err(|_| AclError::invalid_table(format!("Unknown parent type in scenario '{}'", key)))?;

        if let Some(child_type) = model.child_type() {
            if !child_type.accepts_parent(parent) {
                return Err(AclError::invalid_table(format!("{} cannot be mapped to {} in scenario '{}'", child_type, parent, key)));
            }
        }

        Ok(Self { model, parent })
    }

    pub fn key(&self) -> String {
        format!("{} {}", self.model, self.parent)
    }
}

/// One flattened table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCase {
    pub role: GlobalRole,
    pub scenario: Scenario,
    pub action_key: String,
    pub action: Action,
    pub expected: bool,
}

impl TableCase {
    /// Scenario key as written in the table
    pub fn model(&self) -> String {
        self.scenario.key()
    }
}

impl PermissionTable {
    pub fn new(acr_name: impl Into<String>) -> Self {
        Self {
            acr_name: acr_name.into(),
            permissions: BTreeMap::new(),
        }
    }

    /// Record one expectation
    pub fn expect(&mut self, role: GlobalRole, scenario: &str, action_key: &str, expected: bool) {
        self.permissions
            .entry(role.to_string())
            .or_default()
            .entry(scenario.to_string())
            .or_default()
            .insert(action_key.to_string(), expected);
    }

    /// Creators holding Primary Contacts on a parent may create, read and update its reviews but not delete them
    pub fn primary_contacts() -> Self {
        let mut table = Self::new(PRIMARY_CONTACTS_ROLE);

        for parent in PRIMARY_CONTACTS_PARENTS {
            let scenario = Scenario {
                model: FactoryKind::MappedReview,
                parent,
            }
            .key();

            for action in Action::ALL {
                table.expect(GlobalRole::Creator, &scenario, &FactoryKind::MappedReview.action_key(action), action != Action::Delete);
            }
        }

        table
    }

    pub fn from_json(json: &str) -> AclResult<Self> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    pub fn to_json(&self) -> AclResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> AclResult<()> {
        if self.acr_name.trim().is_empty() {
            return Err(AclError::invalid_table("acr_name is required"));
        }
        self.cases().map(|_| ())
    }

    /// Flatten the table into cases ordered by role, scenario and action key
    pub fn cases(&self) -> AclResult<Vec<TableCase>> {
        let mut cases = Vec::new();

        for (role_key, scenarios) in &self.permissions {
            let role: GlobalRole = role_key
                .parse()
                .map_err(|_| AclError::invalid_table(format!("Unknown global role '{}'", role_key)))?;

            for (scenario_key, actions) in scenarios {
                let scenario = Scenario::parse(scenario_key)?;

                for (action_key, expected) in actions {
                    cases.push(TableCase {
                        role,
                        scenario,
                        action_key: action_key.clone(),
                        action: scenario.model.parse_action(action_key)?,
                        expected: *expected,
                    });
                }
            }
        }

        Ok(cases)
    }
}
