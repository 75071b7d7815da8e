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

//! Storage layer for objects, people, relationships and access control data

use crate::error::{AclError, AclResult};
use crate::models::{GrcObject, ObjectType, Person, Relationship};
use crate::rbac::roles::{AccessControlRole, AclEntry};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Storage trait backing the access control engine
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store a new object
    async fn insert_object(&self, object: GrcObject) -> AclResult<GrcObject>;

    /// Get object by ID
    async fn get_object(&self, object_id: &str) -> AclResult<Option<GrcObject>>;

    /// Replace a stored object
    async fn update_object(&self, object: GrcObject) -> AclResult<GrcObject>;

    /// Delete an object together with its relationships and ACL entries
    async fn delete_object(&self, object_id: &str) -> AclResult<()>;

    /// Store a new person; emails are unique
    async fn insert_person(&self, person: Person) -> AclResult<Person>;

    /// Get person by ID
    async fn get_person(&self, person_id: &str) -> AclResult<Option<Person>>;

    /// Get person by email
    async fn get_person_by_email(&self, email: &str) -> AclResult<Option<Person>>;

    /// Store a relationship; rejects self edges and a second edge between the same pair
    async fn insert_relationship(&self, relationship: Relationship) -> AclResult<Relationship>;

    /// Remove the edge between two objects, returning whether one existed
    async fn remove_relationship(&self, a: &str, b: &str) -> AclResult<bool>;

    /// Objects one edge away from `object_id`, in either direction
    async fn related_objects(&self, object_id: &str) -> AclResult<Vec<(String, ObjectType)>>;

    /// Store an access control role; (name, object type) is unique
    async fn insert_role(&self, role: AccessControlRole) -> AclResult<AccessControlRole>;

    async fn get_role(&self, role_id: &str) -> AclResult<Option<AccessControlRole>>;

    /// Find a role by name and object type
    async fn find_role(&self, name: &str, object_type: ObjectType) -> AclResult<Option<AccessControlRole>>;

    async fn list_roles(&self, object_type: Option<ObjectType>) -> AclResult<Vec<AccessControlRole>>;

    /// Delete a role together with the ACL entries using it
    async fn delete_role(&self, role_id: &str) -> AclResult<()>;

    /// Store an ACL entry; (person, role, object) is unique
    async fn insert_acl_entry(&self, entry: AclEntry) -> AclResult<AclEntry>;

    /// Remove the entry for the (person, role, object) triple, returning whether one existed
    async fn remove_acl_entry(&self, person_id: &str, ac_role_id: &str, object_id: &str) -> AclResult<bool>;

    async fn acl_for_person(&self, person_id: &str) -> AclResult<Vec<AclEntry>>;

    async fn acl_for_object(&self, object_id: &str) -> AclResult<Vec<AclEntry>>;
}

#[derive(Debug, Default)]
struct StoreState {
    objects: HashMap<String, GrcObject>,
    people: HashMap<String, Person>,
    relationships: Vec<Relationship>,
    roles: HashMap<String, AccessControlRole>,
    acl: Vec<AclEntry>,
}

/// In-memory store
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn insert_object(&self, object: GrcObject) -> AclResult<GrcObject> {
        object.validate()?;

        let mut state = self.state.write().await;
        if state.objects.contains_key(&object.id) {
            return Err(AclError::conflict(format!("Object {} already exists", object.id)));
        }
        if state.objects.values().any(|existing| existing.slug == object.slug) {
            return Err(AclError::conflict(format!("Slug {} is already taken", object.slug)));
        }

        state.objects.insert(object.id.clone(), object.clone());
        Ok(object)
    }

    async fn get_object(&self, object_id: &str) -> AclResult<Option<GrcObject>> {
        Ok(self.state.read().await.objects.get(object_id).cloned())
    }

    async fn update_object(&self, object: GrcObject) -> AclResult<GrcObject> {
        object.validate()?;

        let mut state = self.state.write().await;
        match state.objects.get_mut(&object.id) {
            Some(existing) => {
                if existing.object_type != object.object_type {
                    return Err(AclError::validation(format!("Object {} cannot change its type", object.id)));
                }
                *existing = object.clone();
                Ok(object)
            }
            None => Err(AclError::not_found(format!("Object {}", object.id))),
        }
    }

    async fn delete_object(&self, object_id: &str) -> AclResult<()> {
        let mut state = self.state.write().await;
        if state.objects.remove(object_id).is_none() {
            return Err(AclError::not_found(format!("Object {}", object_id)));
        }

        state.relationships.retain(|rel| rel.source_id != object_id && rel.destination_id != object_id);
        state.acl.retain(|entry| entry.object_id != object_id);
        Ok(())
    }

    async fn insert_person(&self, person: Person) -> AclResult<Person> {
        let mut state = self.state.write().await;
        if state.people.values().any(|existing| existing.email == person.email) {
            return Err(AclError::conflict(format!("Email {} is already registered", person.email)));
        }

        state.people.insert(person.id.clone(), person.clone());
        Ok(person)
    }

    async fn get_person(&self, person_id: &str) -> AclResult<Option<Person>> {
        Ok(self.state.read().await.people.get(person_id).cloned())
    }

    async fn get_person_by_email(&self, email: &str) -> AclResult<Option<Person>> {
        let email = email.trim().to_lowercase();
        Ok(self.state.read().await.people.values().find(|person| person.email == email).cloned())
    }

    async fn insert_relationship(&self, relationship: Relationship) -> AclResult<Relationship> {
        if relationship.source_id == relationship.destination_id {
            return Err(AclError::validation("An object cannot be related to itself"));
        }

        let mut state = self.state.write().await;
        for end in [&relationship.source_id, &relationship.destination_id] {
            if !state.objects.contains_key(end) {
                return Err(AclError::not_found(format!("Object {}", end)));
            }
        }

        if state.relationships.iter().any(|rel| rel.connects(&relationship.source_id, &relationship.destination_id)) {
            return Err(AclError::conflict(format!(
                "Objects {} and {} are already related",
                relationship.source_id, relationship.destination_id
            )));
        }

        state.relationships.push(relationship.clone());
        Ok(relationship)
    }

    async fn remove_relationship(&self, a: &str, b: &str) -> AclResult<bool> {
        let mut state = self.state.write().await;
        let before = state.relationships.len();
        state.relationships.retain(|rel| !rel.connects(a, b));
        Ok(state.relationships.len() != before)
    }

    async fn related_objects(&self, object_id: &str) -> AclResult<Vec<(String, ObjectType)>> {
        let state = self.state.read().await;
        Ok(state
            .relationships
            .iter()
            .filter_map(|rel| rel.other_end(object_id))
            .map(|(id, object_type)| (id.to_string(), object_type))
            .collect())
    }

    async fn insert_role(&self, role: AccessControlRole) -> AclResult<AccessControlRole> {
        role.validate()?;

        let mut state = self.state.write().await;
        if state.roles.values().any(|existing| existing.name == role.name && existing.object_type == role.object_type) {
            return Err(AclError::conflict(format!("Role '{}' already exists for {}", role.name, role.object_type)));
        }

        state.roles.insert(role.id.clone(), role.clone());
        Ok(role)
    }

    async fn get_role(&self, role_id: &str) -> AclResult<Option<AccessControlRole>> {
        Ok(self.state.read().await.roles.get(role_id).cloned())
    }

    async fn find_role(&self, name: &str, object_type: ObjectType) -> AclResult<Option<AccessControlRole>> {
        let state = self.state.read().await;
        Ok(state.roles.values().find(|role| role.name == name && role.object_type == object_type).cloned())
    }

    async fn list_roles(&self, object_type: Option<ObjectType>) -> AclResult<Vec<AccessControlRole>> {
        let state = self.state.read().await;
        let mut roles: Vec<AccessControlRole> = state.roles.values().filter(|role| object_type.is_none_or(|t| role.object_type == t)).cloned().collect();
        roles.sort_by(|a, b| a.object_type.cmp(&b.object_type).then_with(|| a.name.cmp(&b.name)));
        Ok(roles)
    }

    async fn delete_role(&self, role_id: &str) -> AclResult<()> {
        let mut state = self.state.write().await;
        if state.roles.remove(role_id).is_none() {
            return Err(AclError::not_found(format!("Role {}", role_id)));
        }

        state.acl.retain(|entry| entry.ac_role_id != role_id);
        Ok(())
    }

    async fn insert_acl_entry(&self, entry: AclEntry) -> AclResult<AclEntry> {
        let mut state = self.state.write().await;
        if state.acl.iter().any(|existing| existing.is_triple(&entry.person_id, &entry.ac_role_id, &entry.object_id)) {
            return Err(AclError::conflict(format!(
                "Person {} already holds role {} on object {}",
                entry.person_id, entry.ac_role_id, entry.object_id
            )));
        }

        state.acl.push(entry.clone());
        Ok(entry)
    }

    async fn remove_acl_entry(&self, person_id: &str, ac_role_id: &str, object_id: &str) -> AclResult<bool> {
        let mut state = self.state.write().await;
        let before = state.acl.len();
        state.acl.retain(|entry| !entry.is_triple(person_id, ac_role_id, object_id));
        Ok(state.acl.len() != before)
    }

    async fn acl_for_person(&self, person_id: &str) -> AclResult<Vec<AclEntry>> {
        let state = self.state.read().await;
        Ok(state.acl.iter().filter(|entry| entry.person_id == person_id).cloned().collect())
    }

    async fn acl_for_object(&self, object_id: &str) -> AclResult<Vec<AclEntry>> {
        let state = self.state.read().await;
        Ok(state.acl.iter().filter(|entry| entry.object_id == object_id).cloned().collect())
    }
}
