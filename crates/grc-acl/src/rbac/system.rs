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

//! Access control system facade and guarded operations

use crate::config::AclConfig;
use crate::error::{AclError, AclResult};
use crate::models::{Capability, GlobalRole, GrcObject, ObjectType, Person, Relationship};
use crate::rbac::audit::{AuditEventType, AuditLogger};
use crate::rbac::cache::PermissionCache;
use crate::rbac::evaluator::{Decision, GrantSource, PermissionEvaluator};
use crate::rbac::manager::AccessControlManager;
use crate::rbac::permissions::Action;
use crate::rbac::roles::{ADMIN_ROLE, AccessControlRole, AclEntry};
use crate::store::{InMemoryStore, ObjectStore};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Actor recorded for changes made outside a person's session
pub const SYSTEM_ACTOR: &str = "system";

/// Coordinates the store, role manager, evaluator, cache and audit log
pub struct AclSystem {
    config: AclConfig,
    store: Arc<dyn ObjectStore>,
    manager: AccessControlManager,
    evaluator: PermissionEvaluator,
    audit_logger: Arc<AuditLogger>,
    cache: Arc<PermissionCache>,
    cleanup_task: Option<JoinHandle<()>>,
}

impl AclSystem {
    pub fn new(config: AclConfig, store: Arc<dyn ObjectStore>) -> Self {
        let audit_logger = Arc::new(AuditLogger::with_max_events(config.audit_max_events));
        let cache = Arc::new(PermissionCache::new(config.cache_ttl()));
        let manager = AccessControlManager::new(store.clone(), audit_logger.clone());
        let evaluator = PermissionEvaluator::new(store.clone(), config.max_propagation_depth);

        Self {
            config,
            store,
            manager,
            evaluator,
            audit_logger,
            cache,
            cleanup_task: None,
        }
    }

    /// Build a system over an in-memory store
    ///
    /// Seeds the built-in roles when configured, then the roles defined in the
    /// configuration, and starts purging expired cache entries when caching is on.
    pub async fn initialize(config: AclConfig) -> AclResult<Self> {
        config.validate()?;

        let mut system = Self::new(config, Arc::new(InMemoryStore::new()));
        if system.config.seed_default_roles {
            system.manager.seed_default_roles().await?;
        }

        for definition in &system.config.roles {
            system.manager.create_role(definition.to_role()?, SYSTEM_ACTOR).await?;
        }

        if system.cache.is_enabled() {
            system.cleanup_task = Some(PermissionCache::start_cleanup_task(system.cache.clone(), system.config.cache_cleanup_interval()));
        }

        info!(
            max_propagation_depth = %system.config.max_propagation_depth,
            cache_ttl_secs = %system.config.cache_ttl_secs,
            "Access control system initialized"
        );
        Ok(system)
    }

    pub fn config(&self) -> &AclConfig {
        &self.config
    }

    pub fn audit_logger(&self) -> Arc<AuditLogger> {
        self.audit_logger.clone()
    }

    pub fn cache(&self) -> Arc<PermissionCache> {
        self.cache.clone()
    }

    pub fn manager(&self) -> &AccessControlManager {
        &self.manager
    }

    pub async fn create_person(&self, email: &str, global_role: GlobalRole) -> AclResult<Person> {
        self.store.insert_person(Person::new(email, global_role)?).await
    }

    pub async fn get_person(&self, person_id: &str) -> AclResult<Person> {
        self.store
            .get_person(person_id)
            .await?
            .ok_or_else(|| AclError::not_found(format!("Person with ID '{}' not found", person_id)))
    }

    /// Store an object without a permission check
    pub async fn create_object(&self, object: GrcObject) -> AclResult<GrcObject> {
        let object = self.store.insert_object(object).await?;
        self.audit_logger.log_change(AuditEventType::ObjectCreated, SYSTEM_ACTOR, &object.id).await;
        Ok(object)
    }

    pub async fn get_object(&self, object_id: &str) -> AclResult<GrcObject> {
        self.store
            .get_object(object_id)
            .await?
            .ok_or_else(|| AclError::not_found(format!("Object with ID '{}' not found", object_id)))
    }

    /// Delete an object and everything hanging off it without a permission check
    pub async fn delete_object(&self, object_id: &str) -> AclResult<()> {
        self.store.delete_object(object_id).await?;
        self.cache.clear().await;
        self.audit_logger.log_change(AuditEventType::ObjectDeleted, SYSTEM_ACTOR, object_id).await;
        Ok(())
    }

    pub async fn related_objects(&self, object_id: &str) -> AclResult<Vec<(String, ObjectType)>> {
        self.store.related_objects(object_id).await
    }

    /// Map two objects to each other
    pub async fn relate(&self, a_id: &str, b_id: &str) -> AclResult<Relationship> {
        let a = self.get_object(a_id).await?;
        let b = self.get_object(b_id).await?;
        a.object_type.require_capability(Capability::Relatable)?;
        b.object_type.require_capability(Capability::Relatable)?;

        let relationship = self.store.insert_relationship(Relationship::new(&a, &b)).await?;

        // New edges can open propagation paths for anyone
        self.cache.clear().await;
        self.audit_logger.log_change(AuditEventType::RelationshipCreated, SYSTEM_ACTOR, &relationship.id).await;
        Ok(relationship)
    }

    pub async fn unrelate(&self, a_id: &str, b_id: &str) -> AclResult<()> {
        if !self.store.remove_relationship(a_id, b_id).await? {
            return Err(AclError::not_found(format!("Objects '{}' and '{}' are not related", a_id, b_id)));
        }

        self.cache.clear().await;
        self.audit_logger.log_change(AuditEventType::RelationshipRemoved, SYSTEM_ACTOR, a_id).await;
        Ok(())
    }

    pub async fn create_role(&self, role: AccessControlRole, created_by: &str) -> AclResult<AccessControlRole> {
        let role = self.manager.create_role(role, created_by).await?;

        info!(
            role_id = %role.id,
            role_name = %role.name,
            object_type = %role.object_type,
            created_by = %created_by,
            "Role created successfully"
        );
        Ok(role)
    }

    pub async fn get_role_by_name(&self, name: &str, object_type: ObjectType) -> AclResult<AccessControlRole> {
        self.manager.get_role_by_name(name, object_type).await
    }

    pub async fn list_roles(&self, object_type: Option<ObjectType>) -> AclResult<Vec<AccessControlRole>> {
        self.manager.list_roles(object_type).await
    }

    pub async fn delete_role(&self, role_id: &str, deleted_by: &str) -> AclResult<()> {
        self.manager.delete_role(role_id, deleted_by).await?;
        self.cache.clear().await;

        info!(role_id = %role_id, deleted_by = %deleted_by, "Role deleted successfully");
        Ok(())
    }

    pub async fn assign_role(&self, person_id: &str, role_id: &str, object_id: &str, assigned_by: &str) -> AclResult<AclEntry> {
        let entry = self.manager.assign_role(person_id, role_id, object_id, assigned_by).await?;
        self.cache.invalidate_person(person_id).await;

        info!(
            person_id = %person_id,
            role_id = %role_id,
            object_id = %object_id,
            assigned_by = %assigned_by,
            "Role assigned successfully"
        );
        Ok(entry)
    }

    pub async fn revoke_role(&self, person_id: &str, role_id: &str, object_id: &str, revoked_by: &str) -> AclResult<()> {
        self.manager.revoke_role(person_id, role_id, object_id, revoked_by).await?;
        self.cache.invalidate_person(person_id).await;

        info!(
            person_id = %person_id,
            role_id = %role_id,
            object_id = %object_id,
            revoked_by = %revoked_by,
            "Role revoked successfully"
        );
        Ok(())
    }

    /// Check whether a person may perform `action` on an existing object
    pub async fn check_permission(&self, person_id: &str, action: Action, object_id: &str) -> AclResult<bool> {
        let person = self.get_person(person_id).await?;
        let object = self.get_object(object_id).await?;
        self.check_loaded(&person, action, &object).await
    }

    /// Check whether a person may create an object of `child_type`, under `parent_id` for child kinds
    pub async fn check_create(&self, person_id: &str, child_type: ObjectType, parent_id: Option<&str>) -> AclResult<bool> {
        let person = self.get_person(person_id).await?;
        let parent = match parent_id {
            Some(parent_id) => Some(self.get_object(parent_id).await?),
            None => None,
        };

        let start_time = Instant::now();
        let decision = self.evaluator.evaluate_create(&person, child_type, parent.as_ref()).await?;
        let target = parent.as_ref().map(|parent| parent.id.as_str()).unwrap_or(child_type.as_str());
        self.record_check(&person.id, Action::Create, target, &decision, start_time).await;

        Ok(decision.allowed)
    }

    async fn check_loaded(&self, person: &Person, action: Action, object: &GrcObject) -> AclResult<bool> {
        let start_time = Instant::now();
        let cache_key = PermissionCache::key(&person.id, action, &object.id);

        if let Some(allowed) = self.cache.get(&cache_key).await {
            self.record_check(&person.id, action, &object.id, &Decision::cached(allowed), start_time).await;
            return Ok(allowed);
        }

        let generation = self.cache.generation();
        let decision = self.evaluator.evaluate(person, action, object).await?;
        self.cache.set(cache_key, decision.allowed, generation).await;
        self.record_check(&person.id, action, &object.id, &decision, start_time).await;

        Ok(decision.allowed)
    }

    async fn record_check(&self, person_id: &str, action: Action, target: &str, decision: &Decision, start_time: Instant) {
        let duration = start_time.elapsed();
        let source = decision.source.to_string();

        self.audit_logger.log_permission_check(person_id, target, action.as_str(), decision.allowed, &source).await;
        metrics::increment_counter!(
            "grc_acl_permission_checks_total",
            "action" => action.as_str(),
            "result" => if decision.allowed { "allow" } else { "deny" },
            "cached" => if decision.source == GrantSource::Cached { "true" } else { "false" }
        );

        if duration > self.config.slow_check_threshold() {
            warn!(
                person_id = %person_id,
                action = %action,
                target = %target,
                duration_ms = %duration.as_millis(),
                "Slow permission check detected"
            );
        }

        debug!(
            person_id = %person_id,
            action = %action,
            target = %target,
            allowed = %decision.allowed,
            source = %source,
            duration_ms = %duration.as_millis(),
            "Permission check completed"
        );
    }

    async fn deny(&self, person_id: &str, target: &str, action: Action) {
        self.audit_logger.log_operation_denied(person_id, target, action.as_str()).await;
    }

    /// Create a top-level object as a person
    ///
    /// The creator receives the kind's `Admin` role when one exists.
    pub async fn create_as(&self, person_id: &str, object: GrcObject) -> AclResult<Option<GrcObject>> {
        if !object.object_type.is_top_level() {
            return Err(AclError::validation(format!("{} must be created under a parent object", object.object_type)));
        }

        if !self.check_create(person_id, object.object_type, None).await? {
            self.deny(person_id, object.object_type.as_str(), Action::Create).await;
            return Ok(None);
        }

        let object = self.store.insert_object(object).await?;
        self.audit_logger.log_change(AuditEventType::ObjectCreated, person_id, &object.id).await;

        if let Some(admin) = self.store.find_role(ADMIN_ROLE, object.object_type).await? {
            self.assign_role(person_id, &admin.id, &object.id, SYSTEM_ACTOR).await?;
        }

        Ok(Some(object))
    }

    /// Create a child object mapped to `parent_id` as a person
    pub async fn create_related_as(&self, person_id: &str, parent_id: &str, child: GrcObject) -> AclResult<Option<GrcObject>> {
        let parent = self.get_object(parent_id).await?;
        if !child.object_type.accepts_parent(parent.object_type) {
            return Err(AclError::validation(format!("{} cannot be created under {}", child.object_type, parent.object_type)));
        }

        if !self.check_create(person_id, child.object_type, Some(parent_id)).await? {
            self.deny(person_id, parent_id, Action::Create).await;
            return Ok(None);
        }

        let child = self.store.insert_object(child).await?;
        self.store.insert_relationship(Relationship::new(&parent, &child)).await?;
        self.cache.clear().await;
        self.audit_logger.log_change(AuditEventType::ObjectCreated, person_id, &child.id).await;

        Ok(Some(child))
    }

    pub async fn read_as(&self, person_id: &str, object_id: &str) -> AclResult<Option<GrcObject>> {
        let person = self.get_person(person_id).await?;
        let object = self.get_object(object_id).await?;

        if !self.check_loaded(&person, Action::Read, &object).await? {
            self.deny(person_id, object_id, Action::Read).await;
            return Ok(None);
        }
        Ok(Some(object))
    }

    /// Apply `change` to an object as a person, returning whether it was allowed
    pub async fn update_as<F>(&self, person_id: &str, object_id: &str, change: F) -> AclResult<bool>
    where
        F: FnOnce(&mut GrcObject) -> AclResult<()> + Send,
    {
        let person = self.get_person(person_id).await?;
        let mut object = self.get_object(object_id).await?;

        if !self.check_loaded(&person, Action::Update, &object).await? {
            self.deny(person_id, object_id, Action::Update).await;
            return Ok(false);
        }

        change(&mut object)?;
        object.touch();
        self.store.update_object(object).await?;
        self.audit_logger.log_change(AuditEventType::ObjectUpdated, person_id, object_id).await;
        Ok(true)
    }

    /// Delete an object as a person, together with its relationships and ACL entries
    pub async fn delete_as(&self, person_id: &str, object_id: &str) -> AclResult<bool> {
        let person = self.get_person(person_id).await?;
        let object = self.get_object(object_id).await?;

        if !self.check_loaded(&person, Action::Delete, &object).await? {
            self.deny(person_id, object_id, Action::Delete).await;
            return Ok(false);
        }

        self.store.delete_object(object_id).await?;
        self.cache.clear().await;
        self.audit_logger.log_change(AuditEventType::ObjectDeleted, person_id, object_id).await;
        Ok(true)
    }
}

impl Drop for AclSystem {
    fn drop(&mut self) {
        if let Some(task) = self.cleanup_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoleDefinition;
    use crate::rbac::roles::PRIMARY_CONTACTS_ROLE;

    async fn system() -> AclSystem {
        AclSystem::initialize(AclConfig::default()).await.unwrap()
    }

    #[tokio::test]
    async fn test_guarded_operations_follow_grants() {
        let system = system().await;
        let person = system.create_person("creator@example.com", GlobalRole::Creator).await.unwrap();
        let program = system.create_object(GrcObject::new(ObjectType::Program, "SOX")).await.unwrap();

        assert!(system.read_as(&person.id, &program.id).await.unwrap().is_none());
        assert!(!system.update_as(&person.id, &program.id, |p| { p.description = "x".into(); Ok(()) }).await.unwrap());

        let role = system.get_role_by_name(PRIMARY_CONTACTS_ROLE, ObjectType::Program).await.unwrap();
        system.assign_role(&person.id, &role.id, &program.id, SYSTEM_ACTOR).await.unwrap();

        assert!(system.read_as(&person.id, &program.id).await.unwrap().is_some());
        assert!(system.update_as(&person.id, &program.id, |p| { p.description = "updated".into(); Ok(()) }).await.unwrap());
        assert_eq!(system.get_object(&program.id).await.unwrap().description, "updated");

        let denied = system.audit_logger().get_events_by_type(AuditEventType::OperationDenied, None).await;
        assert_eq!(denied.len(), 2);
    }

    #[tokio::test]
    async fn test_cache_does_not_outlive_revocation() {
        let system = system().await;
        let person = system.create_person("creator@example.com", GlobalRole::Creator).await.unwrap();
        let program = system.create_object(GrcObject::new(ObjectType::Program, "SOX")).await.unwrap();
        let role = system.get_role_by_name(PRIMARY_CONTACTS_ROLE, ObjectType::Program).await.unwrap();

        system.assign_role(&person.id, &role.id, &program.id, SYSTEM_ACTOR).await.unwrap();
        assert!(system.check_permission(&person.id, Action::Read, &program.id).await.unwrap());
        assert!(system.check_permission(&person.id, Action::Read, &program.id).await.unwrap());
        assert_eq!(system.cache().get_stats().await.hits, 1);

        system.revoke_role(&person.id, &role.id, &program.id, SYSTEM_ACTOR).await.unwrap();
        assert!(!system.check_permission(&person.id, Action::Read, &program.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_as_makes_creator_admin() {
        let system = system().await;
        let person = system.create_person("creator@example.com", GlobalRole::Creator).await.unwrap();

        let policy = system.create_as(&person.id, GrcObject::new(ObjectType::Policy, "Access")).await.unwrap().unwrap();
        assert!(system.check_permission(&person.id, Action::Delete, &policy.id).await.unwrap());

        let err = system.create_as(&person.id, GrcObject::new(ObjectType::Review, "orphan")).await.unwrap_err();
        assert_eq!(err.error_type(), "validation");
    }

    #[tokio::test]
    async fn test_related_creation_and_delete_cascade() {
        let system = system().await;
        let editor = system.create_person("editor@example.com", GlobalRole::Editor).await.unwrap();
        let reader = system.create_person("reader@example.com", GlobalRole::Reader).await.unwrap();
        let program = system.create_object(GrcObject::new(ObjectType::Program, "SOX")).await.unwrap();

        let review = system.create_related_as(&editor.id, &program.id, GrcObject::new(ObjectType::Review, "Q1")).await.unwrap().unwrap();
        assert_eq!(system.related_objects(&program.id).await.unwrap(), vec![(review.id.clone(), ObjectType::Review)]);

        assert!(system.create_related_as(&reader.id, &program.id, GrcObject::new(ObjectType::Review, "Q2")).await.unwrap().is_none());
        assert!(system.create_related_as(&reader.id, &program.id, GrcObject::new(ObjectType::Comment, "hi")).await.unwrap().is_some());

        let err = system.create_related_as(&editor.id, &review.id, GrcObject::new(ObjectType::Review, "nested")).await.unwrap_err();
        assert_eq!(err.error_type(), "validation");

        assert!(!system.delete_as(&reader.id, &program.id).await.unwrap());
        assert!(system.delete_as(&editor.id, &program.id).await.unwrap());
        assert!(system.related_objects(&review.id).await.unwrap().is_empty());
        assert!(system.get_object(&program.id).await.is_err());
    }

    #[tokio::test]
    async fn test_unrelate_missing_edge() {
        let system = system().await;
        let a = system.create_object(GrcObject::new(ObjectType::Program, "A")).await.unwrap();
        let b = system.create_object(GrcObject::new(ObjectType::Policy, "B")).await.unwrap();

        system.relate(&a.id, &b.id).await.unwrap();
        system.unrelate(&b.id, &a.id).await.unwrap();
        assert_eq!(system.unrelate(&a.id, &b.id).await.unwrap_err().error_type(), "not_found");
    }

    #[tokio::test]
    async fn test_configured_roles_propagate() {
        let config = AclConfig {
            roles: vec![RoleDefinition {
                name: "Auditors".to_string(),
                object_type: "Program".to_string(),
                permissions: "R".to_string(),
                mandatory: false,
                propagation: vec!["Review R > Comment R".to_string()],
            }],
            ..AclConfig::default()
        };
        let system = AclSystem::initialize(config).await.unwrap();
        assert!(system.cleanup_task.is_some());

        let auditor = system.create_person("auditor@example.com", GlobalRole::Creator).await.unwrap();
        let program = system.create_object(GrcObject::new(ObjectType::Program, "SOX")).await.unwrap();
        let review = system.create_object(GrcObject::new(ObjectType::Review, "Q1")).await.unwrap();
        system.relate(&program.id, &review.id).await.unwrap();

        let role = system.get_role_by_name("Auditors", ObjectType::Program).await.unwrap();
        system.assign_role(&auditor.id, &role.id, &program.id, SYSTEM_ACTOR).await.unwrap();

        assert!(system.check_permission(&auditor.id, Action::Read, &review.id).await.unwrap());
        assert!(!system.check_permission(&auditor.id, Action::Update, &review.id).await.unwrap());

        // Cached answers are still counted and audited
        assert!(system.check_permission(&auditor.id, Action::Read, &review.id).await.unwrap());
        let checks = system.audit_logger().get_events_by_type(AuditEventType::PermissionCheck, Some(1)).await;
        assert_eq!(checks[0].details["source"], "cache");
    }

    #[tokio::test]
    async fn test_disabled_cache_starts_no_cleanup() {
        let config = AclConfig {
            cache_ttl_secs: 0,
            ..AclConfig::default()
        };
        let system = AclSystem::initialize(config).await.unwrap();
        assert!(system.cleanup_task.is_none());
    }
}
