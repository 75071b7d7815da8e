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

//! Permission evaluation over role assignments and the relationship graph

use crate::error::AclResult;
use crate::models::{GrcObject, ObjectType, Person};
use crate::rbac::permissions::{Action, global_role_allows};
use crate::rbac::propagation::PropagationNode;
use crate::rbac::roles::AccessControlRole;
use crate::store::ObjectStore;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// What granted (or failed to grant) a permission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantSource {
    GlobalRole,
    /// Role held on the target itself
    DirectRole { role: String },
    /// Role held on an object related to the target
    Propagated { role: String, origin_id: String, hops: usize },
    /// Answered from the permission cache
    Cached,
    None,
}

impl fmt::Display for GrantSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantSource::GlobalRole => f.write_str("global_role"),
            GrantSource::DirectRole { role } => write!(f, "acl:{}", role),
            GrantSource::Propagated { role, hops, .. } => write!(f, "propagated:{}:{}", role, hops),
            GrantSource::Cached => f.write_str("cache"),
            GrantSource::None => f.write_str("none"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub source: GrantSource,
}

impl Decision {
    pub fn cached(allowed: bool) -> Self {
        Self {
            allowed,
            source: GrantSource::Cached,
        }
    }

    fn grant(source: GrantSource) -> Self {
        Self { allowed: true, source }
    }

    fn deny() -> Self {
        Self {
            allowed: false,
            source: GrantSource::None,
        }
    }
}

struct Frame<'a> {
    object_id: String,
    rules: &'a [PropagationNode],
    path: Vec<String>,
}

/// Evaluates permissions as the union of global role, direct and propagated grants
pub struct PermissionEvaluator {
    store: Arc<dyn ObjectStore>,
    max_depth: usize,
}

impl PermissionEvaluator {
    pub fn new(store: Arc<dyn ObjectStore>, max_depth: usize) -> Self {
        Self { store, max_depth }
    }

    /// Evaluate `action` on an existing object
    ///
    /// `Create` on an existing object asks whether another top-level object of
    /// the same kind may be created, which only the global role decides.
    pub async fn evaluate(&self, person: &Person, action: Action, target: &GrcObject) -> AclResult<Decision> {
        if global_role_allows(person.global_role, action, target.object_type) {
            return Ok(Decision::grant(GrantSource::GlobalRole));
        }

        if action == Action::Create {
            return Ok(Decision::deny());
        }

        let mut held: Vec<(String, AccessControlRole)> = Vec::new();
        for entry in self.store.acl_for_person(&person.id).await? {
            if let Some(role) = self.store.get_role(&entry.ac_role_id).await? {
                held.push((entry.object_id, role));
            }
        }

        if let Some((_, role)) = held.iter().find(|(object_id, role)| *object_id == target.id && role.permissions.allows(action)) {
            return Ok(Decision::grant(GrantSource::DirectRole { role: role.name.clone() }));
        }

        for (origin_id, role) in held.iter().filter(|(_, role)| !role.propagation.is_empty()) {
            if let Some(hops) = self.walk(origin_id, &role.propagation, action, &target.id).await? {
                return Ok(Decision::grant(GrantSource::Propagated {
                    role: role.name.clone(),
                    origin_id: origin_id.clone(),
                    hops,
                }));
            }
        }

        Ok(Decision::deny())
    }

    /// Evaluate creating an object of `child_type`, under `parent` when the kind needs one
    pub async fn evaluate_create(&self, person: &Person, child_type: ObjectType, parent: Option<&GrcObject>) -> AclResult<Decision> {
        match (child_type.create_requirement(), parent) {
            (None, _) => {
                if global_role_allows(person.global_role, Action::Create, child_type) {
                    Ok(Decision::grant(GrantSource::GlobalRole))
                } else {
                    Ok(Decision::deny())
                }
            }
            (Some(required), Some(parent)) => self.evaluate(person, required, parent).await,
            (Some(_), None) => Ok(Decision::deny()),
        }
    }

    /// Walk one propagation tree from `origin_id`, returning the hop count at which `target_id` was granted
    async fn walk(&self, origin_id: &str, rules: &[PropagationNode], action: Action, target_id: &str) -> AclResult<Option<usize>> {
        let mut stack = vec![Frame {
            object_id: origin_id.to_string(),
            rules,
            path: vec![origin_id.to_string()],
        }];

        while let Some(frame) = stack.pop() {
            if frame.path.len() > self.max_depth {
                continue;
            }

            for (related_id, related_type) in self.store.related_objects(&frame.object_id).await? {
                if frame.path.contains(&related_id) {
                    continue;
                }

                for rule in frame.rules.iter().filter(|rule| rule.object_type == related_type) {
                    if related_id == target_id && rule.permissions.allows(action) {
                        trace!(origin_id = %origin_id, target_id = %target_id, rule = %rule, "Propagated grant matched");
                        return Ok(Some(frame.path.len()));
                    }

                    if !rule.children.is_empty() {
                        let mut path = frame.path.clone();
                        path.push(related_id.clone());
                        stack.push(Frame {
                            object_id: related_id.clone(),
                            rules: &rule.children,
                            path,
                        });
                    }
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AclError;
    use crate::models::{GlobalRole, Relationship};
    use crate::rbac::permissions::PermissionSet;
    use crate::rbac::propagation::contact_propagation;
    use crate::rbac::roles::AclEntry;
    use crate::store::{InMemoryStore, MockObjectStore};

    struct Fixture {
        store: Arc<InMemoryStore>,
        person: Person,
        program: GrcObject,
        review: GrcObject,
        comment: GrcObject,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let person = store.insert_person(Person::new("creator@example.com", GlobalRole::Creator).unwrap()).await.unwrap();
        let program = store.insert_object(GrcObject::new(ObjectType::Program, "SOX")).await.unwrap();
        let review = store.insert_object(GrcObject::new(ObjectType::Review, "Q1")).await.unwrap();
        let comment = store.insert_object(GrcObject::new(ObjectType::Comment, "ok")).await.unwrap();
        store.insert_relationship(Relationship::new(&program, &review)).await.unwrap();
        store.insert_relationship(Relationship::new(&review, &comment)).await.unwrap();

        let role = AccessControlRole::new("Primary Contacts", ObjectType::Program, PermissionSet::RUD).with_propagation(contact_propagation());
        let role = store.insert_role(role).await.unwrap();
        store.insert_acl_entry(AclEntry::new(&person.id, &role.id, &program.id, "system")).await.unwrap();

        Fixture {
            store,
            person,
            program,
            review,
            comment,
        }
    }

    #[tokio::test]
    async fn test_direct_and_propagated_grants() {
        let f = fixture().await;
        let evaluator = PermissionEvaluator::new(f.store.clone(), 4);

        let decision = evaluator.evaluate(&f.person, Action::Delete, &f.program).await.unwrap();
        assert_eq!(decision.source, GrantSource::DirectRole { role: "Primary Contacts".to_string() });

        let decision = evaluator.evaluate(&f.person, Action::Update, &f.review).await.unwrap();
        assert!(decision.allowed);
        assert!(matches!(decision.source, GrantSource::Propagated { hops: 1, .. }));

        assert!(!evaluator.evaluate(&f.person, Action::Delete, &f.review).await.unwrap().allowed);

        // Comment on the review is reached through the nested rule
        let decision = evaluator.evaluate(&f.person, Action::Read, &f.comment).await.unwrap();
        assert!(matches!(decision.source, GrantSource::Propagated { hops: 2, .. }));
        assert!(!evaluator.evaluate(&f.person, Action::Update, &f.comment).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_depth_bound() {
        let f = fixture().await;
        let evaluator = PermissionEvaluator::new(f.store.clone(), 1);

        assert!(evaluator.evaluate(&f.person, Action::Read, &f.review).await.unwrap().allowed);
        assert!(!evaluator.evaluate(&f.person, Action::Read, &f.comment).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_create_requirements() {
        let f = fixture().await;
        let evaluator = PermissionEvaluator::new(f.store.clone(), 4);

        assert!(evaluator.evaluate_create(&f.person, ObjectType::Review, Some(&f.program)).await.unwrap().allowed);
        assert!(evaluator.evaluate_create(&f.person, ObjectType::Policy, None).await.unwrap().allowed);
        assert!(!evaluator.evaluate_create(&f.person, ObjectType::Review, None).await.unwrap().allowed);

        // Comment R on the review is not enough to create a document there
        assert!(evaluator.evaluate_create(&f.person, ObjectType::Comment, Some(&f.review)).await.unwrap().allowed);
        assert!(!evaluator.evaluate_create(&f.person, ObjectType::Document, Some(&f.comment)).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_cycle_terminates() {
        let f = fixture().await;
        let other = f.store.insert_object(GrcObject::new(ObjectType::Review, "Q2")).await.unwrap();
        f.store.insert_relationship(Relationship::new(&f.comment, &other)).await.unwrap();
        f.store.insert_relationship(Relationship::new(&other, &f.program)).await.unwrap();

        let evaluator = PermissionEvaluator::new(f.store.clone(), 16);
        let stranger = f.store.insert_object(GrcObject::new(ObjectType::Document, "unrelated")).await.unwrap();

        assert!(!evaluator.evaluate(&f.person, Action::Read, &stranger).await.unwrap().allowed);
        assert!(evaluator.evaluate(&f.person, Action::Update, &other).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut store = MockObjectStore::new();
        store.expect_acl_for_person().returning(|_| Err(AclError::Config {
            message: "store offline".to_string(),
        }));

        let evaluator = PermissionEvaluator::new(Arc::new(store), 4);
        let person = Person::new("creator@example.com", GlobalRole::Creator).unwrap();
        let program = GrcObject::new(ObjectType::Program, "SOX");

        let err = evaluator.evaluate(&person, Action::Read, &program).await.unwrap_err();
        assert_eq!(err.error_type(), "config");

        // Global grants never touch the store
        let admin = Person::new("admin@example.com", GlobalRole::Administrator).unwrap();
        assert!(evaluator.evaluate(&admin, Action::Delete, &program).await.unwrap().allowed);
    }
}
