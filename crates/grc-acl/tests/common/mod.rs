//! Store wrapper shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use grc_acl::models::{GrcObject, ObjectType, Person, Relationship};
use grc_acl::rbac::{AccessControlRole, AclEntry};
use grc_acl::store::{InMemoryStore, ObjectStore};
use grc_acl::{AclError, AclResult};
use tokio::sync::{Mutex, oneshot};

type Gate = (oneshot::Sender<()>, oneshot::Receiver<()>);

/// In-memory store with hooks for interleaving and failing calls
pub struct ScriptedStore {
    inner: InMemoryStore,
    gate: Mutex<Option<Gate>>,
    rejected_role: Mutex<Option<String>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            gate: Mutex::new(None),
            rejected_role: Mutex::new(None),
        }
    }

    /// Hold the next `acl_for_person` after it has read the entries; yields (paused signal, release handle)
    pub async fn pause_next_acl_lookup(&self) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (paused_tx, paused_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self.gate.lock().await = Some((paused_tx, release_rx));
        (paused_rx, release_tx)
    }

    /// Fail every ACL insert for `role_id`
    pub async fn reject_acl_entries_for(&self, role_id: &str) {
        *self.rejected_role.lock().await = Some(role_id.to_string());
    }
}

#[async_trait]
impl ObjectStore for ScriptedStore {
    async fn insert_object(&self, object: GrcObject) -> AclResult<GrcObject> {
        self.inner.insert_object(object).await
    }

    async fn get_object(&self, object_id: &str) -> AclResult<Option<GrcObject>> {
        self.inner.get_object(object_id).await
    }

    async fn update_object(&self, object: GrcObject) -> AclResult<GrcObject> {
        self.inner.update_object(object).await
    }

    async fn delete_object(&self, object_id: &str) -> AclResult<()> {
        self.inner.delete_object(object_id).await
    }

    async fn insert_person(&self, person: Person) -> AclResult<Person> {
        self.inner.insert_person(person).await
    }

    async fn get_person(&self, person_id: &str) -> AclResult<Option<Person>> {
        self.inner.get_person(person_id).await
    }

    async fn get_person_by_email(&self, email: &str) -> AclResult<Option<Person>> {
        self.inner.get_person_by_email(email).await
    }

    async fn insert_relationship(&self, relationship: Relationship) -> AclResult<Relationship> {
        self.inner.insert_relationship(relationship).await
    }

    async fn remove_relationship(&self, a: &str, b: &str) -> AclResult<bool> {
        self.inner.remove_relationship(a, b).await
    }

    async fn related_objects(&self, object_id: &str) -> AclResult<Vec<(String, ObjectType)>> {
        self.inner.related_objects(object_id).await
    }

    async fn insert_role(&self, role: AccessControlRole) -> AclResult<AccessControlRole> {
        self.inner.insert_role(role).await
    }

    async fn get_role(&self, role_id: &str) -> AclResult<Option<AccessControlRole>> {
        self.inner.get_role(role_id).await
    }

    async fn find_role(&self, name: &str, object_type: ObjectType) -> AclResult<Option<AccessControlRole>> {
        self.inner.find_role(name, object_type).await
    }

    async fn list_roles(&self, object_type: Option<ObjectType>) -> AclResult<Vec<AccessControlRole>> {
        self.inner.list_roles(object_type).await
    }

    async fn delete_role(&self, role_id: &str) -> AclResult<()> {
        self.inner.delete_role(role_id).await
    }

    async fn insert_acl_entry(&self, entry: AclEntry) -> AclResult<AclEntry> {
        if self.rejected_role.lock().await.as_deref() == Some(entry.ac_role_id.as_str()) {
            return Err(AclError::Conflict {
                message: format!("ACL entry for role {} rejected", entry.ac_role_id),
            });
        }
        self.inner.insert_acl_entry(entry).await
    }

    async fn remove_acl_entry(&self, person_id: &str, ac_role_id: &str, object_id: &str) -> AclResult<bool> {
        self.inner.remove_acl_entry(person_id, ac_role_id, object_id).await
    }

    async fn acl_for_person(&self, person_id: &str) -> AclResult<Vec<AclEntry>> {
        let entries = self.inner.acl_for_person(person_id).await?;

        let gate = self.gate.lock().await.take();
        if let Some((paused, release)) = gate {
            let _ = paused.send(());
            let _ = release.await;
        }
        Ok(entries)
    }

    async fn acl_for_object(&self, object_id: &str) -> AclResult<Vec<AclEntry>> {
        self.inner.acl_for_object(object_id).await
    }
}
