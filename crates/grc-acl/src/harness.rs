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

//! Runs permission tables against the access control engine

use crate::config::AclConfig;
use crate::error::{AclError, AclResult};
use crate::factories::{RbacFactory, factory_for};
use crate::models::{GlobalRole, ObjectType, Person};
use crate::rbac::system::AclSystem;
use crate::table::{PermissionTable, TableCase};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of running one table case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseOutcome {
    pub role: GlobalRole,
    pub model: String,
    pub action: String,
    pub expected: bool,
    pub actual: bool,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.expected == self.actual
    }

    pub fn into_result(self) -> AclResult<Self> {
        if self.passed() {
            Ok(self)
        } else {
            Err(AclError::PropagationMismatch {
                role: self.role.to_string(),
                model: self.model,
                action: self.action,
                expected: self.expected,
                actual: self.actual,
            })
        }
    }
}

impl fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed() { "ok" } else { "MISMATCH" };
        write!(
            f,
            "{:<8} {} / {} / {}: expected {}, got {}",
            status, self.role, self.model, self.action, self.expected, self.actual
        )
    }
}

/// Outcomes of a whole table run
#[derive(Debug, Clone, Default)]
pub struct PropagationReport {
    pub acr_name: String,
    pub outcomes: Vec<CaseOutcome>,
}

impl PropagationReport {
    pub fn mismatches(&self) -> Vec<&CaseOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.passed()).collect()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(CaseOutcome::passed)
    }

    /// Fail with the first mismatch
    pub fn ensure_success(&self) -> AclResult<()> {
        match self.mismatches().first() {
            Some(mismatch) => (*mismatch).clone().into_result().map(|_| ()),
            None => Ok(()),
        }
    }
}

/// Executes every case of a table, each in a freshly seeded system
pub struct AclPropagationRunner {
    config: AclConfig,
    acr_name: String,
}

impl AclPropagationRunner {
    pub fn new(config: AclConfig, acr_name: impl Into<String>) -> Self {
        Self {
            config,
            acr_name: acr_name.into(),
        }
    }

    /// One person per global role
    pub async fn setup_people(system: &AclSystem) -> AclResult<BTreeMap<GlobalRole, Person>> {
        let mut people = BTreeMap::new();

        for role in GlobalRole::ALL {
            let email = format!("{}@example.com", role.as_str().to_lowercase());
            people.insert(role, system.create_person(&email, role).await?);
        }

        Ok(people)
    }

    /// Look up the role for `parent` and build the scenario factory for the person
    pub async fn init_factory(&self, system: Arc<AclSystem>, person_id: &str, model: &str, parent: ObjectType) -> AclResult<Box<dyn RbacFactory>> {
        let role = system.get_role_by_name(&self.acr_name, parent).await?;
        factory_for(model, system, person_id, &role).await
    }

    pub async fn run_case(&self, case: &TableCase) -> AclResult<CaseOutcome> {
        let system = Arc::new(AclSystem::initialize(self.config.clone()).await?);
        let people = Self::setup_people(&system).await?;
        let person = people
            .get(&case.role)
            .ok_or_else(|| AclError::not_found(format!("No person with global role {}", case.role)))?;

        let model = case.scenario.model.as_str();
        let factory = self.init_factory(system, &person.id, model, case.scenario.parent).await?;
        let actual = factory.run(case.action).await?;

        Ok(CaseOutcome {
            role: case.role,
            model: case.model(),
            action: case.action_key.clone(),
            expected: case.expected,
            actual,
        })
    }

    pub async fn run_table(&self, table: &PermissionTable) -> AclResult<PropagationReport> {
        if table.acr_name != self.acr_name {
            return Err(AclError::invalid_table(format!(
                "Table is for '{}', runner is for '{}'",
                table.acr_name, self.acr_name
            )));
        }

        let mut report = PropagationReport {
            acr_name: self.acr_name.clone(),
            outcomes: Vec::new(),
        };

        for case in table.cases()? {
            let outcome = self.run_case(&case).await?;
            if !outcome.passed() {
                warn!(
                    role = %outcome.role,
                    model = %outcome.model,
                    action = %outcome.action,
                    expected = %outcome.expected,
                    actual = %outcome.actual,
                    "Propagation mismatch"
                );
            }
            report.outcomes.push(outcome);
        }

        info!(
            acr_name = %report.acr_name,
            cases = %report.outcomes.len(),
            mismatches = %report.mismatches().len(),
            "Propagation table run completed"
        );
        Ok(report)
    }
}
