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

//! Access control role management and assignment

use crate::error::{AclError, AclResult};
use crate::models::ObjectType;
use crate::rbac::audit::AuditLogger;
use crate::rbac::roles::{AccessControlRole, AclEntry, create_default_roles};
use crate::store::ObjectStore;
use std::sync::Arc;
use tracing::debug;

/// Manager for access control roles and ACL entries
#[derive(Clone)]
pub struct AccessControlManager {
    store: Arc<dyn ObjectStore>,
    audit_logger: Arc<AuditLogger>,
}

impl AccessControlManager {
    pub fn new(store: Arc<dyn ObjectStore>, audit_logger: Arc<AuditLogger>) -> Self {
        Self { store, audit_logger }
    }

    /// Insert the built-in roles that are not stored yet, returning how many were added
    pub async fn seed_default_roles(&self) -> AclResult<usize> {
        let mut seeded = 0;

        for role in create_default_roles() {
            if self.store.find_role(&role.name, role.object_type).await?.is_some() {
                continue;
            }
            self.store.insert_role(role).await?;
            seeded += 1;
        }

        debug!(seeded = %seeded, "Default access control roles seeded");
        Ok(seeded)
    }

    pub async fn create_role(&self, role: AccessControlRole, created_by: &str) -> AclResult<AccessControlRole> {
        let role = self.store.insert_role(role).await?;
        self.audit_logger.log_role_created(&role.id, &role.name, created_by).await;
        Ok(role)
    }

    pub async fn get_role(&self, role_id: &str) -> AclResult<AccessControlRole> {
        self.store.get_role(role_id).await?.ok_or_else(|| AclError::not_found(format!("Role with ID '{}' not found", role_id)))
    }

    pub async fn get_role_by_name(&self, name: &str, object_type: ObjectType) -> AclResult<AccessControlRole> {
        self.store
            .find_role(name, object_type)
            .await?
            .ok_or_else(|| AclError::not_found(format!("Role '{}' not found for {}", name, object_type)))
    }

    pub async fn list_roles(&self, object_type: Option<ObjectType>) -> AclResult<Vec<AccessControlRole>> {
        self.store.list_roles(object_type).await
    }

    /// Delete a role and every assignment of it; built-in roles are refused
    pub async fn delete_role(&self, role_id: &str, deleted_by: &str) -> AclResult<()> {
        let role = self.get_role(role_id).await?;
        if role.non_editable {
            return Err(AclError::Forbidden {
                message: format!("Cannot delete system role '{}' of {}", role.name, role.object_type),
            });
        }

        self.store.delete_role(role_id).await?;
        self.audit_logger.log_role_deleted(role_id, deleted_by).await;
        Ok(())
    }

    /// Grant `role_id` to a person on one object
    pub async fn assign_role(&self, person_id: &str, role_id: &str, object_id: &str, assigned_by: &str) -> AclResult<AclEntry> {
        if self.store.get_person(person_id).await?.is_none() {
            return Err(AclError::not_found(format!("Person with ID '{}' not found", person_id)));
        }

        let role = self.get_role(role_id).await?;
        let object = self
            .store
            .get_object(object_id)
            .await?
            .ok_or_else(|| AclError::not_found(format!("Object with ID '{}' not found", object_id)))?;

        if role.object_type != object.object_type {
            return Err(AclError::validation(format!(
                "Role '{}' applies to {}, not {}",
                role.name, role.object_type, object.object_type
            )));
        }

        let entry = self.store.insert_acl_entry(AclEntry::new(person_id, role_id, object_id, assigned_by)).await?;
        self.audit_logger.log_role_assigned(person_id, role_id, object_id, assigned_by).await;
        Ok(entry)
    }

    pub async fn revoke_role(&self, person_id: &str, role_id: &str, object_id: &str, revoked_by: &str) -> AclResult<()> {
        if !self.store.remove_acl_entry(person_id, role_id, object_id).await? {
            return Err(AclError::not_found(format!(
                "Person '{}' does not hold role '{}' on object '{}'",
                person_id, role_id, object_id
            )));
        }

        self.audit_logger.log_role_revoked(person_id, role_id, object_id, revoked_by).await;
        Ok(())
    }

    /// People holding any role on an object
    pub async fn people_on_object(&self, object_id: &str) -> AclResult<Vec<String>> {
        let mut people: Vec<String> = self.store.acl_for_object(object_id).await?.into_iter().map(|entry| entry.person_id).collect();
        people.sort();
        people.dedup();
        Ok(people)
    }
}
