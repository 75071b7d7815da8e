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

//! Relationship edges between objects

use crate::models::object::GrcObject;
use crate::models::object_type::ObjectType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Directed edge between two objects
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,

    pub source_id: String,

    pub source_type: ObjectType,

    pub destination_id: String,

    pub destination_type: ObjectType,

    pub created_at: DateTime<Utc>,
}

impl Relationship {
    pub fn new(source: &GrcObject, destination: &GrcObject) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_id: source.id.clone(),
            source_type: source.object_type,
            destination_id: destination.id.clone(),
            destination_type: destination.object_type,
            created_at: Utc::now(),
        }
    }

    /// Whether the edge joins `a` and `b`, in either direction
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source_id == a && self.destination_id == b) || (self.source_id == b && self.destination_id == a)
    }

    /// The end opposite to `object_id`
    pub fn other_end(&self, object_id: &str) -> Option<(&str, ObjectType)> {
        if self.source_id == object_id {
            Some((&self.destination_id, self.destination_type))
        } else if self.destination_id == object_id {
            Some((&self.source_id, self.source_type))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_is_traversable_both_ways() {
        let program = GrcObject::new(ObjectType::Program, "SOX");
        let review = GrcObject::new(ObjectType::Review, "Q1 review");
        let edge = Relationship::new(&program, &review);

        assert!(edge.connects(&review.id, &program.id));
        assert_eq!(edge.other_end(&program.id), Some((review.id.as_str(), ObjectType::Review)));
        assert_eq!(edge.other_end(&review.id), Some((program.id.as_str(), ObjectType::Program)));
        assert_eq!(edge.other_end("elsewhere"), None);
    }
}
