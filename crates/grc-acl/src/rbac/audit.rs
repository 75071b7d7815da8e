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

//! Audit trail for access control decisions and changes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AuditEventType {
    PermissionCheck,
    RoleCreated,
    RoleDeleted,
    RoleAssigned,
    RoleRevoked,
    ObjectCreated,
    ObjectUpdated,
    ObjectDeleted,
    RelationshipCreated,
    RelationshipRemoved,
    /// A guarded operation was refused
    OperationDenied,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditResult {
    Success,
    Denied,
}

/// Audit event entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: String,

    pub event_type: AuditEventType,

    pub timestamp: DateTime<Utc>,

    /// Person (or `system`) who performed the action
    pub actor: String,

    /// Person affected by a role change
    pub target_person: Option<String>,

    /// Object the event concerns
    pub object_id: Option<String>,

    pub action: Option<String>,

    pub result: AuditResult,

    pub details: HashMap<String, String>,
}

impl AuditEvent {
    pub fn new(event_type: AuditEventType, actor: impl Into<String>, result: AuditResult) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            timestamp: Utc::now(),
            actor: actor.into(),
            target_person: None,
            object_id: None,
            action: None,
            result,
            details: HashMap::new(),
        }
    }

    pub fn with_target_person(mut self, person_id: impl Into<String>) -> Self {
        self.target_person = Some(person_id.into());
        self
    }

    pub fn with_object_action(mut self, object_id: impl Into<String>, action: impl Into<String>) -> Self {
        self.object_id = Some(object_id.into());
        self.action = Some(action.into());
        self
    }

    pub fn with_object(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Bounded in-memory audit log
#[derive(Debug)]
pub struct AuditLogger {
    events: Arc<RwLock<Vec<AuditEvent>>>,
    max_events: usize,
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::with_max_events(10_000)
    }
}

impl AuditLogger {
    pub fn with_max_events(max_events: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            max_events: max_events.max(1),
        }
    }

    pub async fn log_event(&self, event: AuditEvent) {
        match (event.event_type, event.result) {
            // Checks are frequent, keep them out of info
            (AuditEventType::PermissionCheck, _) => {
                debug!(
                    actor = %event.actor,
                    object_id = ?event.object_id,
                    action = ?event.action,
                    result = ?event.result,
                    "Audit event: {:?}", event.event_type
                );
            }
            (_, AuditResult::Success) => {
                info!(
                    event_type = ?event.event_type,
                    actor = %event.actor,
                    target_person = ?event.target_person,
                    object_id = ?event.object_id,
                    action = ?event.action,
                    "Audit event: {:?}", event.event_type
                );
            }
            (_, AuditResult::Denied) => {
                warn!(
                    event_type = ?event.event_type,
                    actor = %event.actor,
                    object_id = ?event.object_id,
                    action = ?event.action,
                    "Audit event: {:?} - {:?}", event.event_type, event.result
                );
            }
        }

        let mut events = self.events.write().await;
        events.push(event);

        if events.len() > self.max_events {
            let excess = events.len() - self.max_events;
            events.drain(0..excess);
        }
    }

    pub async fn log_permission_check(&self, person_id: &str, object_id: &str, action: &str, granted: bool, source: &str) {
        let result = if granted { AuditResult::Success } else { AuditResult::Denied };
        let event = AuditEvent::new(AuditEventType::PermissionCheck, person_id, result)
            .with_object_action(object_id, action)
            .with_detail("source", source);

        self.log_event(event).await;
    }

    pub async fn log_role_created(&self, role_id: &str, role_name: &str, created_by: &str) {
        let event = AuditEvent::new(AuditEventType::RoleCreated, created_by, AuditResult::Success)
            .with_detail("role_id", role_id)
            .with_detail("role_name", role_name);

        self.log_event(event).await;
    }

    pub async fn log_role_deleted(&self, role_id: &str, deleted_by: &str) {
        let event = AuditEvent::new(AuditEventType::RoleDeleted, deleted_by, AuditResult::Success).with_detail("role_id", role_id);

        self.log_event(event).await;
    }

    pub async fn log_role_assigned(&self, person_id: &str, role_id: &str, object_id: &str, assigned_by: &str) {
        let event = AuditEvent::new(AuditEventType::RoleAssigned, assigned_by, AuditResult::Success)
            .with_target_person(person_id)
            .with_object(object_id)
            .with_detail("role_id", role_id);

        self.log_event(event).await;
    }

    pub async fn log_role_revoked(&self, person_id: &str, role_id: &str, object_id: &str, revoked_by: &str) {
        let event = AuditEvent::new(AuditEventType::RoleRevoked, revoked_by, AuditResult::Success)
            .with_target_person(person_id)
            .with_object(object_id)
            .with_detail("role_id", role_id);

        self.log_event(event).await;
    }

    /// Record an object or relationship change
    pub async fn log_change(&self, event_type: AuditEventType, actor: &str, object_id: &str) {
        self.log_event(AuditEvent::new(event_type, actor, AuditResult::Success).with_object(object_id)).await;
    }

    pub async fn log_operation_denied(&self, actor: &str, object_id: &str, action: &str) {
        let event = AuditEvent::new(AuditEventType::OperationDenied, actor, AuditResult::Denied).with_object_action(object_id, action);

        self.log_event(event).await;
    }

    /// Most recent events first
    pub async fn get_events(&self, limit: Option<usize>) -> Vec<AuditEvent> {
        let events = self.events.read().await;
        events.iter().rev().take(limit.unwrap_or(usize::MAX)).cloned().collect()
    }

    /// Events where the person acted or was affected, most recent first
    pub async fn get_person_events(&self, person_id: &str, limit: Option<usize>) -> Vec<AuditEvent> {
        let events = self.events.read().await;
        events
            .iter()
            .rev()
            .filter(|event| event.actor == person_id || event.target_person.as_deref() == Some(person_id))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    pub async fn get_events_by_type(&self, event_type: AuditEventType, limit: Option<usize>) -> Vec<AuditEvent> {
        let events = self.events.read().await;
        events.iter().rev().filter(|event| event.event_type == event_type).take(limit.unwrap_or(usize::MAX)).cloned().collect()
    }

    pub async fn clear_events(&self) {
        self.events.write().await.clear();
        info!("Audit log cleared");
    }

    pub async fn get_statistics(&self) -> AuditStatistics {
        let events = self.events.read().await;
        let mut stats = AuditStatistics {
            total_events: events.len(),
            ..Default::default()
        };

        for event in events.iter() {
            *stats.events_by_type.entry(event.event_type).or_insert(0) += 1;
            if event.result == AuditResult::Denied {
                stats.denied_events += 1;
            }
        }

        stats
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditStatistics {
    pub total_events: usize,

    pub denied_events: usize,

    pub events_by_type: HashMap<AuditEventType, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_are_trimmed() {
        let logger = AuditLogger::with_max_events(3);

        for i in 0..5 {
            logger.log_change(AuditEventType::ObjectCreated, "system", &format!("o{}", i)).await;
        }

        let events = logger.get_events(None).await;
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].object_id.as_deref(), Some("o4"));
        assert_eq!(events[2].object_id.as_deref(), Some("o2"));
    }

    #[tokio::test]
    async fn test_person_events_and_statistics() {
        let logger = AuditLogger::default();

        logger.log_role_assigned("alice", "r1", "o1", "admin").await;
        logger.log_permission_check("alice", "o1", "read", true, "acl").await;
        logger.log_permission_check("bob", "o1", "delete", false, "none").await;
        logger.log_operation_denied("bob", "o1", "delete").await;

        assert_eq!(logger.get_person_events("alice", None).await.len(), 2);
        assert_eq!(logger.get_person_events("bob", Some(1)).await.len(), 1);

        let stats = logger.get_statistics().await;
        assert_eq!(stats.total_events, 4);
        assert_eq!(stats.denied_events, 2);
        assert_eq!(stats.events_by_type.get(&AuditEventType::PermissionCheck), Some(&2));
    }
}
