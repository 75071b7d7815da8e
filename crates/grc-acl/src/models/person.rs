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

//! People and their global roles

use crate::error::{AclError, AclResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// System-wide role held by every person
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GlobalRole {
    /// Creates top-level objects, everything else through access control roles
    Creator,
    /// Reads everything, creates top-level objects
    Reader,
    /// Creates, reads, updates and deletes everything
    Editor,
    /// Unrestricted
    Administrator,
}

impl GlobalRole {
    pub const ALL: [GlobalRole; 4] = [GlobalRole::Creator, GlobalRole::Reader, GlobalRole::Editor, GlobalRole::Administrator];

    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalRole::Creator => "Creator",
            GlobalRole::Reader => "Reader",
            GlobalRole::Editor => "Editor",
            GlobalRole::Administrator => "Administrator",
        }
    }
}

impl fmt::Display for GlobalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GlobalRole {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GlobalRole::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AclError::validation(format!("Unknown global role: {}", s)))
    }
}

/// A user identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Person {
    /// Unique person identifier
    pub id: String,

    /// Email address (unique)
    pub email: String,

    /// Display name
    pub name: String,

    pub global_role: GlobalRole,

    pub created_at: DateTime<Utc>,
}

impl Person {
    /// Create a new person, deriving the display name from the email
    pub fn new(email: impl Into<String>, global_role: GlobalRole) -> AclResult<Self> {
        let email = email.into().trim().to_lowercase();
        let name = match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => local.to_string(),
            _ => return Err(AclError::validation(format!("Invalid email address: {}", email))),
        };

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            name,
            global_role,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_creation() {
        let person = Person::new(" Jane.Doe@Example.com ", GlobalRole::Creator).unwrap();

        assert_eq!(person.email, "jane.doe@example.com");
        assert_eq!(person.name, "jane.doe");
        assert_eq!(person.global_role, GlobalRole::Creator);
    }

    #[test]
    fn test_invalid_email() {
        assert!(Person::new("nobody", GlobalRole::Reader).is_err());
        assert!(Person::new("@example.com", GlobalRole::Reader).is_err());
        assert!(Person::new("someone@localhost", GlobalRole::Reader).is_err());
    }

    #[test]
    fn test_global_role_parse() {
        assert_eq!("Editor".parse::<GlobalRole>().unwrap(), GlobalRole::Editor);
        assert!("editor".parse::<GlobalRole>().is_err());
    }
}
