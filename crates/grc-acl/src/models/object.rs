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

//! Stored GRC object instances

use crate::error::{AclError, AclResult};
use crate::models::object_type::{Capability, ObjectType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Status of objects composed with the workflow-state capability
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WorkflowState {
    Draft,
    Active,
    Deprecated,
}

/// A stored domain object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrcObject {
    /// Unique object identifier
    pub id: String,

    /// Model kind
    pub object_type: ObjectType,

    /// Human-readable title
    pub title: String,

    /// Unique short code, e.g. `PROGRAM-1a2b3c4d`
    pub slug: String,

    pub description: String,

    /// Present only for kinds with a workflow state
    pub status: Option<WorkflowState>,

    /// Custom attribute values by attribute name
    pub custom_attributes: BTreeMap<String, String>,

    /// Folder identifier for folderable kinds
    pub folder: Option<String>,

    /// Day the object was last moved to `Deprecated`
    pub last_deprecated_date: Option<NaiveDate>,

    /// Task start date
    pub start_date: Option<NaiveDate>,

    /// Task end date
    pub end_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl GrcObject {
    /// Create a new object with a generated id and slug
    pub fn new(object_type: ObjectType, title: impl Into<String>) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let slug = format!("{}-{}", object_type.slug_prefix(), &id[..8]);
        let status = object_type.has_capability(Capability::WithWorkflowState).then_some(WorkflowState::Draft);

        Self {
            id,
            object_type,
            title: title.into(),
            slug,
            description: String::new(),
            status,
            custom_attributes: BTreeMap::new(),
            folder: None,
            last_deprecated_date: None,
            start_date: None,
            end_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Change the status, stamping the deprecation date on entry to `Deprecated`
    pub fn set_status(&mut self, status: WorkflowState, today: NaiveDate) -> AclResult<()> {
        self.object_type.require_capability(Capability::WithWorkflowState)?;

        let was_deprecated = self.status == Some(WorkflowState::Deprecated);
        if status == WorkflowState::Deprecated && !was_deprecated && self.object_type.has_capability(Capability::LastDeprecatedTimeboxed) {
            self.last_deprecated_date = Some(today);
        }

        self.status = Some(status);
        self.touch();
        Ok(())
    }

    pub fn set_custom_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) -> AclResult<()> {
        self.object_type.require_capability(Capability::CustomAttributable)?;

        let name = name.into();
        if name.trim().is_empty() {
            return Err(AclError::validation("Custom attribute name must not be empty"));
        }

        self.custom_attributes.insert(name, value.into());
        self.touch();
        Ok(())
    }

    pub fn set_folder(&mut self, folder: Option<String>) -> AclResult<()> {
        self.object_type.require_capability(Capability::Folderable)?;
        self.folder = folder;
        self.touch();
        Ok(())
    }

    /// Check the invariants every stored object must satisfy
    pub fn validate(&self) -> AclResult<()> {
        if self.title.trim().is_empty() {
            return Err(AclError::validation(format!("{} title is required", self.object_type)));
        }

        if self.status.is_some() != self.object_type.has_capability(Capability::WithWorkflowState) {
            return Err(AclError::validation(format!("{} status does not match its capabilities", self.object_type)));
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(AclError::validation("Start date must not be after end date"));
            }
        }

        Ok(())
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
