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

//! Propagation trees attached to access control roles
//!
//! A role granted on an object confers permissions on related objects. The
//! tree describes which related kinds receive which permissions, and lets a
//! grant travel further along relationships of those related objects
//! (e.g. Workflow -> TaskGroup -> TaskGroupTask).

use crate::error::{AclError, AclResult};
use crate::models::object_type::ObjectType;
use crate::rbac::permissions::PermissionSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One rule of a propagation tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropagationNode {
    /// Kind of related object the rule applies to
    pub object_type: ObjectType,

    /// Permissions granted on matching related objects
    pub permissions: PermissionSet,

    /// Rules applied to objects related to the matched object
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PropagationNode>,
}

impl PropagationNode {
    pub fn new(object_type: ObjectType, permissions: PermissionSet) -> Self {
        Self {
            object_type,
            permissions,
            children: Vec::new(),
        }
    }

    /// Parse a rule written as `"<ObjectType> <RUD>"`, e.g. `"Review RU"`
    pub fn parse(rule: &str) -> AclResult<Self> {
        let (object_type, permissions) = rule
            .trim()
            .split_once(' ')
            .ok_or_else(|| AclError::validation(format!("Propagation rule '{}' must be '<Type> <RUD>'", rule)))?;

        Ok(Self::new(object_type.parse()?, PermissionSet::parse(permissions.trim())?))
    }

    /// Parse a chain of rules separated by `>`, e.g. `"Review RU > Comment R"`
    ///
    /// Each step applies to objects related to the object matched by the step before it.
    pub fn parse_path(path: &str) -> AclResult<Self> {
        path.split('>')
            .rev()
            .try_fold(None, |child: Option<Self>, step| {
                let node = Self::parse(step)?;
                Ok::<_, AclError>(Some(match child {
                    Some(child) => node.with_child(child),
                    None => node,
                }))
            })?
            .ok_or_else(|| AclError::validation("Empty propagation rule"))
    }

    pub fn with_child(mut self, child: PropagationNode) -> Self {
        self.children.push(child);
        self
    }

    /// Number of relationship hops the deepest rule needs
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(PropagationNode::depth).max().unwrap_or(0)
    }
}

impl fmt::Display for PropagationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.object_type, self.permissions)
    }
}

/// Parse a list of rule chains
pub fn parse_rules<S: AsRef<str>>(rules: &[S]) -> AclResult<Vec<PropagationNode>> {
    rules.iter().map(|rule| PropagationNode::parse_path(rule.as_ref())).collect()
}

/// Rules shared by the contact roles of reviewable objects
pub fn contact_propagation() -> Vec<PropagationNode> {
    vec![
        PropagationNode::new(ObjectType::Review, PermissionSet::RU).with_child(PropagationNode::new(ObjectType::Comment, PermissionSet::R)),
        PropagationNode::new(ObjectType::Comment, PermissionSet::R),
        PropagationNode::new(ObjectType::Document, PermissionSet::RU),
    ]
}

/// Rules of the object admin role of reviewable objects
pub fn admin_propagation() -> Vec<PropagationNode> {
    vec![
        PropagationNode::new(ObjectType::Review, PermissionSet::RUD).with_child(PropagationNode::new(ObjectType::Comment, PermissionSet::R)),
        PropagationNode::new(ObjectType::Comment, PermissionSet::R),
        PropagationNode::new(ObjectType::Document, PermissionSet::RUD),
    ]
}

/// Workflow roles reach task groups and their tasks
pub fn workflow_propagation(permissions: PermissionSet) -> Vec<PropagationNode> {
    vec![PropagationNode::new(ObjectType::TaskGroup, permissions).with_child(PropagationNode::new(ObjectType::TaskGroupTask, permissions))]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rule() {
        let node = PropagationNode::parse("Review RU").unwrap();

        assert_eq!(node.object_type, ObjectType::Review);
        assert_eq!(node.permissions, PermissionSet::RU);
        assert_eq!(node.to_string(), "Review RU");
    }

    #[test]
    fn test_parse_invalid_rules() {
        assert!(PropagationNode::parse("Review").is_err());
        assert!(PropagationNode::parse("Reviews RU").is_err());
        assert!(PropagationNode::parse("Review W").is_err());
        assert!(parse_rules(&["Comment R", "Document"]).is_err());
    }

    #[test]
    fn test_parse_rule_chain() {
        let rules = parse_rules(&["Review RU > Comment R", "Document RUD"]).unwrap();

        assert_eq!(rules[0], contact_propagation()[0]);
        assert_eq!(rules[0].depth(), 2);
        assert_eq!(rules[1], PropagationNode::new(ObjectType::Document, PermissionSet::RUD));
        assert!(PropagationNode::parse_path("Review RU >").is_err());
    }

    #[test]
    fn test_depth() {
        let tree = workflow_propagation(PermissionSet::R);
        assert_eq!(tree[0].depth(), 2);
        assert_eq!(contact_propagation()[2].depth(), 1);
    }
}
