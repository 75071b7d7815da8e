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

//! Access control roles and list entries

use crate::error::{AclError, AclResult};
use crate::models::object_type::ObjectType;
use crate::rbac::permissions::PermissionSet;
use crate::rbac::propagation::{PropagationNode, admin_propagation, contact_propagation, workflow_propagation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ADMIN_ROLE: &str = "Admin";
pub const PRIMARY_CONTACTS_ROLE: &str = "Primary Contacts";
pub const SECONDARY_CONTACTS_ROLE: &str = "Secondary Contacts";
pub const WORKFLOW_MEMBER_ROLE: &str = "Workflow Member";
pub const TASK_ASSIGNEES_ROLE: &str = "Task Assignees";
pub const TASK_SECONDARY_ASSIGNEES_ROLE: &str = "Task Secondary Assignees";
pub const REVIEWERS_ROLE: &str = "Reviewers";

/// Named role scoped to an object type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessControlRole {
    /// Unique role identifier
    pub id: String,

    /// Role name, unique per object type
    pub name: String,

    /// Kind of object the role is granted on
    pub object_type: ObjectType,

    /// Permissions on the object the role is granted on
    pub permissions: PermissionSet,

    /// Every object of the type must have somebody in this role
    pub mandatory: bool,

    /// Built-in role that cannot be edited or deleted
    pub non_editable: bool,

    /// Hidden from people listings
    pub internal: bool,

    /// Permissions conferred on related objects
    pub propagation: Vec<PropagationNode>,

    pub created_at: DateTime<Utc>,
}

impl AccessControlRole {
    pub fn new(name: impl Into<String>, object_type: ObjectType, permissions: PermissionSet) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            object_type,
            permissions,
            mandatory: false,
            non_editable: false,
            internal: false,
            propagation: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Built-in role: non-editable
    pub fn system_role(name: impl Into<String>, object_type: ObjectType, permissions: PermissionSet) -> Self {
        let mut role = Self::new(name, object_type, permissions);
        role.non_editable = true;
        role
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn with_propagation(mut self, propagation: Vec<PropagationNode>) -> Self {
        self.propagation = propagation;
        self
    }

    pub fn validate(&self) -> AclResult<()> {
        if self.name.trim().is_empty() {
            return Err(AclError::validation("Access control role name is required"));
        }
        Ok(())
    }
}

/// Assignment of a role to a person on one object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AclEntry {
    pub id: String,

    pub person_id: String,

    pub ac_role_id: String,

    pub object_id: String,

    /// Who granted the role
    pub assigned_by: String,

    pub created_at: DateTime<Utc>,
}

impl AclEntry {
    pub fn new(person_id: impl Into<String>, ac_role_id: impl Into<String>, object_id: impl Into<String>, assigned_by: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            person_id: person_id.into(),
            ac_role_id: ac_role_id.into(),
            object_id: object_id.into(),
            assigned_by: assigned_by.into(),
            created_at: Utc::now(),
        }
    }

    /// Whether the entry is the (person, role, object) triple
    pub fn is_triple(&self, person_id: &str, ac_role_id: &str, object_id: &str) -> bool {
        self.person_id == person_id && self.ac_role_id == ac_role_id && self.object_id == object_id
    }
}

/// Built-in access control roles
pub fn create_default_roles() -> Vec<AccessControlRole> {
    let mut roles = Vec::new();

    for object_type in ObjectType::REVIEWABLE {
        roles.push(AccessControlRole::system_role(ADMIN_ROLE, object_type, PermissionSet::RUD).mandatory().with_propagation(admin_propagation()));
        roles.push(AccessControlRole::system_role(PRIMARY_CONTACTS_ROLE, object_type, PermissionSet::RUD).with_propagation(contact_propagation()));
        roles.push(AccessControlRole::system_role(SECONDARY_CONTACTS_ROLE, object_type, PermissionSet::RUD).with_propagation(contact_propagation()));
    }

    roles.push(AccessControlRole::system_role(REVIEWERS_ROLE, ObjectType::Review, PermissionSet::RU));

    roles.push(
        AccessControlRole::system_role(ADMIN_ROLE, ObjectType::Workflow, PermissionSet::RUD)
            .mandatory()
            .with_propagation(workflow_propagation(PermissionSet::RUD)),
    );
    roles.push(AccessControlRole::system_role(WORKFLOW_MEMBER_ROLE, ObjectType::Workflow, PermissionSet::R).with_propagation(workflow_propagation(PermissionSet::R)));

    roles.push(AccessControlRole::system_role(TASK_ASSIGNEES_ROLE, ObjectType::TaskGroupTask, PermissionSet::RU).mandatory());
    roles.push(AccessControlRole::system_role(TASK_SECONDARY_ASSIGNEES_ROLE, ObjectType::TaskGroupTask, PermissionSet::RU));

    roles
}
