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

//! Scenario factories exercising access control roles
//!
//! A factory grants a role on a fresh parent object and builds whatever the
//! scenario acts on, then runs actions as the person through the guarded
//! operations of [`AclSystem`].

use crate::error::{AclError, AclResult};
use crate::models::{GrcObject, ObjectType};
use crate::rbac::permissions::Action;
use crate::rbac::roles::AccessControlRole;
use crate::rbac::system::{AclSystem, SYSTEM_ACTOR};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Scenario model of a permission table
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FactoryKind {
    /// Review mapped to the parent
    MappedReview,
    /// Comment mapped to the parent
    MappedComment,
    /// Document attached to the parent
    MappedDocument,
    /// The parent object itself
    Universal,
}

impl FactoryKind {
    pub const ALL: [FactoryKind; 4] = [FactoryKind::MappedReview, FactoryKind::MappedComment, FactoryKind::MappedDocument, FactoryKind::Universal];

    pub fn as_str(&self) -> &'static str {
        match self {
            FactoryKind::MappedReview => "MappedReview",
            FactoryKind::MappedComment => "MappedComment",
            FactoryKind::MappedDocument => "MappedDocument",
            FactoryKind::Universal => "Universal",
        }
    }

    /// Kind of object the actions run on; `None` means the parent itself
    pub fn child_type(&self) -> Option<ObjectType> {
        match self {
            FactoryKind::MappedReview => Some(ObjectType::Review),
            FactoryKind::MappedComment => Some(ObjectType::Comment),
            FactoryKind::MappedDocument => Some(ObjectType::Document),
            FactoryKind::Universal => None,
        }
    }

    /// Table key of an action, e.g. `create_review`, or `read` for the parent itself
    pub fn action_key(&self, action: Action) -> String {
        match self.child_type() {
            Some(child_type) => format!("{}_{}", action, child_type.as_str().to_lowercase()),
            None => action.to_string(),
        }
    }

    pub fn action_keys(&self) -> Vec<String> {
        Action::ALL.iter().map(|action| self.action_key(*action)).collect()
    }

    /// Parse a table action key for this scenario model
    pub fn parse_action(&self, key: &str) -> AclResult<Action> {
        Action::ALL
            .iter()
            .copied()
            .find(|action| self.action_key(*action) == key)
            .ok_or_else(|| AclError::invalid_table(format!("Unknown action '{}' for {}", key, self)))
    }
}

impl fmt::Display for FactoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FactoryKind {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FactoryKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AclError::invalid_table(format!("Unknown scenario model: {}", s)))
    }
}

/// Fixture that runs table actions as one person
#[async_trait]
pub trait RbacFactory: Send + Sync {
    fn kind(&self) -> FactoryKind;

    /// Object the role was granted on
    fn parent_id(&self) -> &str;

    /// Run an action; `Ok(false)` means it was denied
    async fn run(&self, action: Action) -> AclResult<bool>;

    async fn run_action(&self, key: &str) -> AclResult<bool> {
        let action = self.kind().parse_action(key)?;
        self.run(action).await
    }
}

async fn granted_parent(system: &AclSystem, person_id: &str, role: &AccessControlRole) -> AclResult<GrcObject> {
    let parent = system.create_object(GrcObject::new(role.object_type, format!("{} parent", role.object_type))).await?;
    system.assign_role(person_id, &role.id, &parent.id, SYSTEM_ACTOR).await?;
    Ok(parent)
}

/// Child object mapped to the parent the role is granted on
pub struct MappedObjectFactory {
    system: Arc<AclSystem>,
    kind: FactoryKind,
    child_type: ObjectType,
    person_id: String,
    parent: GrcObject,
    child: GrcObject,
}

impl MappedObjectFactory {
    pub async fn new(system: Arc<AclSystem>, kind: FactoryKind, person_id: &str, role: &AccessControlRole) -> AclResult<Self> {
        let child_type = kind
            .child_type()
            .ok_or_else(|| AclError::validation(format!("{} does not map a child object", kind)))?;
        if !child_type.accepts_parent(role.object_type) {
            return Err(AclError::validation(format!("{} cannot be mapped to {}", child_type, role.object_type)));
        }

        let parent = granted_parent(&system, person_id, role).await?;
        let child = system.create_object(GrcObject::new(child_type, format!("{} of {}", child_type, parent.slug))).await?;
        system.relate(&parent.id, &child.id).await?;

        Ok(Self {
            system,
            kind,
            child_type,
            person_id: person_id.to_string(),
            parent,
            child,
        })
    }
}

#[async_trait]
impl RbacFactory for MappedObjectFactory {
    fn kind(&self) -> FactoryKind {
        self.kind
    }

    fn parent_id(&self) -> &str {
        &self.parent.id
    }

    async fn run(&self, action: Action) -> AclResult<bool> {
        match action {
            Action::Create => {
                let child = GrcObject::new(self.child_type, format!("New {}", self.child_type));
                Ok(self.system.create_related_as(&self.person_id, &self.parent.id, child).await?.is_some())
            }
            Action::Read => Ok(self.system.read_as(&self.person_id, &self.child.id).await?.is_some()),
            Action::Update => {
                self.system
                    .update_as(&self.person_id, &self.child.id, |child| {
                        child.description = "updated".to_string();
                        Ok(())
                    })
                    .await
            }
            Action::Delete => self.system.delete_as(&self.person_id, &self.child.id).await,
        }
    }
}

/// Actions on the object the role is granted on
pub struct UniversalFactory {
    system: Arc<AclSystem>,
    person_id: String,
    object: GrcObject,
}

impl UniversalFactory {
    pub async fn new(system: Arc<AclSystem>, person_id: &str, role: &AccessControlRole) -> AclResult<Self> {
        let object = granted_parent(&system, person_id, role).await?;

        Ok(Self {
            system,
            person_id: person_id.to_string(),
            object,
        })
    }
}

#[async_trait]
impl RbacFactory for UniversalFactory {
    fn kind(&self) -> FactoryKind {
        FactoryKind::Universal
    }

    fn parent_id(&self) -> &str {
        &self.object.id
    }

    async fn run(&self, action: Action) -> AclResult<bool> {
        match action {
            Action::Create => {
                let object = GrcObject::new(self.object.object_type, format!("Another {}", self.object.object_type));
                Ok(self.system.create_as(&self.person_id, object).await?.is_some())
            }
            Action::Read => Ok(self.system.read_as(&self.person_id, &self.object.id).await?.is_some()),
            Action::Update => {
                self.system
                    .update_as(&self.person_id, &self.object.id, |object| {
                        object.title = format!("{} (edited)", object.title);
                        Ok(())
                    })
                    .await
            }
            Action::Delete => self.system.delete_as(&self.person_id, &self.object.id).await,
        }
    }
}

/// Build the factory for a scenario model name
pub async fn factory_for(model: &str, system: Arc<AclSystem>, person_id: &str, role: &AccessControlRole) -> AclResult<Box<dyn RbacFactory>> {
    let kind: FactoryKind = model.parse()?;

    let factory: Box<dyn RbacFactory> = match kind {
        FactoryKind::Universal => Box::new(UniversalFactory::new(system, person_id, role).await?),
        _ => Box::new(MappedObjectFactory::new(system, kind, person_id, role).await?),
    };
    Ok(factory)
}
