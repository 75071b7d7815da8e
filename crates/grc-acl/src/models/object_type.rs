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

//! Object kinds and the capabilities they are composed from

use crate::error::{AclError, AclResult};
use crate::rbac::permissions::Action;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Cross-cutting capability an object kind is composed from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// Accepts custom attribute values
    CustomAttributable,
    /// Comments can be mapped to it
    Commentable,
    /// Documents can be attached to it
    PublicDocumentable,
    /// People can be linked through access control roles
    Personable,
    /// Takes part in relationships
    Relatable,
    /// Mirrored from an external system
    Synchronizable,
    /// Role assignments are mirrored from an external system
    RoleableSynchronizable,
    /// Carries a test plan
    TestPlanned,
    /// Remembers when it was last deprecated
    LastDeprecatedTimeboxed,
    /// Permissions are resolved per object context
    ContextRbac,
    /// Can be stored in a folder
    Folderable,
    /// Belongs to the scoping objects group
    ScopeObject,
    /// Has a Draft/Active/Deprecated status
    WithWorkflowState,
    /// Included in the search index
    Indexed,
}

const DATA_ASSET_CAPABILITIES: &[Capability] = &[
    Capability::RoleableSynchronizable,
    Capability::PublicDocumentable,
    Capability::Synchronizable,
    Capability::CustomAttributable,
    Capability::Personable,
    Capability::Relatable,
    Capability::Commentable,
    Capability::TestPlanned,
    Capability::LastDeprecatedTimeboxed,
    Capability::ContextRbac,
    Capability::Folderable,
    Capability::ScopeObject,
    Capability::WithWorkflowState,
    Capability::Indexed,
];

const DIRECTIVE_CAPABILITIES: &[Capability] = &[
    Capability::CustomAttributable,
    Capability::Commentable,
    Capability::PublicDocumentable,
    Capability::Personable,
    Capability::Relatable,
    Capability::TestPlanned,
    Capability::LastDeprecatedTimeboxed,
    Capability::ContextRbac,
    Capability::Folderable,
    Capability::WithWorkflowState,
    Capability::Indexed,
];

const REVIEW_CAPABILITIES: &[Capability] = &[Capability::Relatable, Capability::Commentable, Capability::Personable];

const ATTACHMENT_CAPABILITIES: &[Capability] = &[Capability::Relatable];

const WORKFLOW_CAPABILITIES: &[Capability] = &[
    Capability::CustomAttributable,
    Capability::Personable,
    Capability::Relatable,
    Capability::ContextRbac,
    Capability::Folderable,
    Capability::Indexed,
];

const TASK_CAPABILITIES: &[Capability] = &[Capability::Personable, Capability::Relatable, Capability::ContextRbac];

/// Import column -> display name; `None` marks a column the kind does not import
pub type ImportAliases = BTreeMap<&'static str, Option<&'static str>>;

const BASE_IMPORT_ALIASES: &[(&str, &str)] = &[("slug", "Code"), ("title", "Title"), ("description", "Description")];

impl Capability {
    /// Import columns a kind gains from this capability
    fn import_aliases(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Capability::PublicDocumentable => &[("documents_file", "Document File"), ("documents_reference_url", "Reference URL")],
            Capability::WithWorkflowState => &[("status", "State")],
            Capability::LastDeprecatedTimeboxed => &[("last_deprecated_date", "Last Deprecated Date")],
            Capability::TestPlanned => &[("test_plan", "Assessment Procedure")],
            Capability::Folderable => &[("folder", "Folder")],
            _ => &[],
        }
    }
}

/// Model kinds known to the access control engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectType {
    Program,
    Regulation,
    Objective,
    Contract,
    Policy,
    Standard,
    Threat,
    Requirement,
    DataAsset,
    Review,
    Comment,
    Document,
    Workflow,
    TaskGroup,
    TaskGroupTask,
}

impl ObjectType {
    /// Every known kind, in declaration order
    pub const ALL: [ObjectType; 15] = [
        ObjectType::Program,
        ObjectType::Regulation,
        ObjectType::Objective,
        ObjectType::Contract,
        ObjectType::Policy,
        ObjectType::Standard,
        ObjectType::Threat,
        ObjectType::Requirement,
        ObjectType::DataAsset,
        ObjectType::Review,
        ObjectType::Comment,
        ObjectType::Document,
        ObjectType::Workflow,
        ObjectType::TaskGroup,
        ObjectType::TaskGroupTask,
    ];

    /// Kinds that carry reviews, contacts and attachments
    pub const REVIEWABLE: [ObjectType; 9] = [
        ObjectType::Program,
        ObjectType::Regulation,
        ObjectType::Objective,
        ObjectType::Contract,
        ObjectType::Policy,
        ObjectType::Standard,
        ObjectType::Threat,
        ObjectType::Requirement,
        ObjectType::DataAsset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Program => "Program",
            ObjectType::Regulation => "Regulation",
            ObjectType::Objective => "Objective",
            ObjectType::Contract => "Contract",
            ObjectType::Policy => "Policy",
            ObjectType::Standard => "Standard",
            ObjectType::Threat => "Threat",
            ObjectType::Requirement => "Requirement",
            ObjectType::DataAsset => "DataAsset",
            ObjectType::Review => "Review",
            ObjectType::Comment => "Comment",
            ObjectType::Document => "Document",
            ObjectType::Workflow => "Workflow",
            ObjectType::TaskGroup => "TaskGroup",
            ObjectType::TaskGroupTask => "TaskGroupTask",
        }
    }

    /// Capabilities this kind is composed from
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            ObjectType::DataAsset => DATA_ASSET_CAPABILITIES,
            ObjectType::Review => REVIEW_CAPABILITIES,
            ObjectType::Comment | ObjectType::Document => ATTACHMENT_CAPABILITIES,
            ObjectType::Workflow => WORKFLOW_CAPABILITIES,
            ObjectType::TaskGroup | ObjectType::TaskGroupTask => TASK_CAPABILITIES,
            _ => DIRECTIVE_CAPABILITIES,
        }
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Fail with a validation error when the kind lacks a capability
    pub fn require_capability(&self, capability: Capability) -> AclResult<()> {
        if self.has_capability(capability) {
            Ok(())
        } else {
            Err(AclError::validation(format!("{} is not {:?}", self, capability)))
        }
    }

    pub fn is_reviewable(&self) -> bool {
        Self::REVIEWABLE.contains(self)
    }

    /// Top-level kinds can be created without a parent object
    pub fn is_top_level(&self) -> bool {
        self.create_requirement().is_none()
    }

    /// Permission the creator must hold on the parent to create a child of this kind
    pub fn create_requirement(&self) -> Option<Action> {
        match self {
            ObjectType::Review | ObjectType::Document | ObjectType::TaskGroup | ObjectType::TaskGroupTask => Some(Action::Update),
            ObjectType::Comment => Some(Action::Read),
            _ => None,
        }
    }

    /// Check whether `parent` can own a child of this kind
    pub fn accepts_parent(&self, parent: ObjectType) -> bool {
        match self {
            ObjectType::Review => parent.is_reviewable(),
            ObjectType::Comment => parent.has_capability(Capability::Commentable),
            ObjectType::Document => parent.has_capability(Capability::PublicDocumentable),
            ObjectType::TaskGroup => parent == ObjectType::Workflow,
            ObjectType::TaskGroupTask => parent == ObjectType::TaskGroup,
            _ => false,
        }
    }

    /// Prefix used for generated slugs
    pub fn slug_prefix(&self) -> &'static str {
        match self {
            ObjectType::DataAsset => "DATA-ASSET",
            ObjectType::TaskGroup => "TASK-GROUP",
            ObjectType::TaskGroupTask => "TASK",
            ObjectType::Program => "PROGRAM",
            ObjectType::Regulation => "REGULATION",
            ObjectType::Objective => "OBJECTIVE",
            ObjectType::Contract => "CONTRACT",
            ObjectType::Policy => "POLICY",
            ObjectType::Standard => "STANDARD",
            ObjectType::Threat => "THREAT",
            ObjectType::Requirement => "REQUIREMENT",
            ObjectType::Review => "REVIEW",
            ObjectType::Comment => "COMMENT",
            ObjectType::Document => "DOCUMENT",
            ObjectType::Workflow => "WORKFLOW",
        }
    }

    /// Import columns disabled for this kind even though a capability provides them
    pub fn disabled_import_columns(&self) -> &'static [&'static str] {
        match self {
            ObjectType::DataAsset => &["documents_file"],
            _ => &[],
        }
    }

    /// Import column aliases, including disabled columns mapped to `None`
    pub fn import_aliases(&self) -> ImportAliases {
        let mut aliases: ImportAliases = BASE_IMPORT_ALIASES.iter().map(|(column, name)| (*column, Some(*name))).collect();

        for capability in self.capabilities() {
            aliases.extend(capability.import_aliases().iter().map(|(column, name)| (*column, Some(*name))));
        }

        if matches!(self, ObjectType::TaskGroupTask) {
            aliases.extend([("start_date", Some("Start Date")), ("end_date", Some("End Date"))]);
        }

        for column in self.disabled_import_columns() {
            aliases.insert(*column, None);
        }
        aliases
    }

    /// Display name of an importable column
    pub fn import_alias(&self, column: &str) -> Option<&'static str> {
        self.import_aliases().get(column).copied().flatten()
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectType::ALL
            .iter()
            .copied()
            .find(|object_type| object_type.as_str() == s)
            .ok_or_else(|| AclError::validation(format!("Unknown object type: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_asset_composition() {
        let capabilities = ObjectType::DataAsset.capabilities();

        assert_eq!(capabilities.len(), 14);
        assert!(ObjectType::DataAsset.has_capability(Capability::ScopeObject));
        assert!(ObjectType::DataAsset.has_capability(Capability::RoleableSynchronizable));
        assert!(!ObjectType::Program.has_capability(Capability::ScopeObject));
        assert_eq!(ObjectType::DataAsset.disabled_import_columns(), &["documents_file"]);
    }

    #[test]
    fn test_import_aliases() {
        let data_asset = ObjectType::DataAsset.import_aliases();
        assert_eq!(data_asset.get("documents_file"), Some(&None));
        assert_eq!(data_asset.get("documents_reference_url"), Some(&Some("Reference URL")));
        assert_eq!(ObjectType::DataAsset.import_alias("documents_file"), None);

        assert_eq!(ObjectType::Program.import_alias("documents_file"), Some("Document File"));
        assert_eq!(ObjectType::Program.import_alias("last_deprecated_date"), Some("Last Deprecated Date"));
        assert_eq!(ObjectType::Comment.import_alias("status"), None);
        assert_eq!(ObjectType::TaskGroupTask.import_alias("end_date"), Some("End Date"));
        assert_eq!(ObjectType::Review.import_alias("slug"), Some("Code"));
    }

    #[test]
    fn test_parse_round_trip() {
        for object_type in ObjectType::ALL {
            assert_eq!(object_type.as_str().parse::<ObjectType>().unwrap(), object_type);
        }
        assert!("Programme".parse::<ObjectType>().is_err());
    }

    #[test]
    fn test_child_parent_rules() {
        assert!(ObjectType::Review.accepts_parent(ObjectType::Threat));
        assert!(!ObjectType::Review.accepts_parent(ObjectType::Workflow));
        assert!(ObjectType::Comment.accepts_parent(ObjectType::Review));
        assert!(!ObjectType::Document.accepts_parent(ObjectType::Comment));
        assert!(ObjectType::TaskGroupTask.accepts_parent(ObjectType::TaskGroup));
        assert!(!ObjectType::Program.accepts_parent(ObjectType::Program));
    }

    #[test]
    fn test_top_level_kinds() {
        assert!(ObjectType::Program.is_top_level());
        assert!(ObjectType::Workflow.is_top_level());
        assert!(!ObjectType::Review.is_top_level());
        assert_eq!(ObjectType::Comment.create_requirement(), Some(Action::Read));
    }
}
