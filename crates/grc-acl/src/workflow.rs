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

//! Workflows, task groups and task assignment

use crate::error::{AclError, AclResult};
use crate::models::{GrcObject, ObjectType, Person, TaskDraft, closest_weekday, validate_dates};
use crate::rbac::roles::{TASK_ASSIGNEES_ROLE, TASK_SECONDARY_ASSIGNEES_ROLE};
use crate::rbac::system::{AclSystem, SYSTEM_ACTOR};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Title of the task group every new workflow starts with
pub const DEFAULT_TASK_GROUP_TITLE: &str = "Task Group 1";

/// A workflow with its default task group
#[derive(Debug, Clone)]
pub struct WorkflowSetup {
    pub workflow: GrcObject,
    pub task_group: GrcObject,
}

pub struct WorkflowService {
    system: Arc<AclSystem>,
}

fn forbidden(actor_id: &str, what: &str) -> AclError {
    AclError::Forbidden {
        message: format!("Person '{}' may not {}", actor_id, what),
    }
}

impl WorkflowService {
    pub fn new(system: Arc<AclSystem>) -> Self {
        Self { system }
    }

    /// Create a workflow administered by `actor_id`, together with its default task group
    pub async fn create_workflow(&self, actor_id: &str, title: &str) -> AclResult<WorkflowSetup> {
        let workflow = self
            .system
            .create_as(actor_id, GrcObject::new(ObjectType::Workflow, title))
            .await?
            .ok_or_else(|| forbidden(actor_id, "create workflows"))?;

        let task_group = self
            .system
            .create_related_as(actor_id, &workflow.id, GrcObject::new(ObjectType::TaskGroup, DEFAULT_TASK_GROUP_TITLE))
            .await?
            .ok_or_else(|| forbidden(actor_id, "create task groups"))?;

        info!(workflow_id = %workflow.id, task_group_id = %task_group.id, "Workflow created");
        Ok(WorkflowSetup { workflow, task_group })
    }

    /// Create a task in a task group and assign its people
    pub async fn create_task(&self, actor_id: &str, task_group_id: &str, draft: &TaskDraft, today: NaiveDate) -> AclResult<GrcObject> {
        draft.validate(today)?;
        for person_id in draft.assignees.iter().chain(&draft.secondary_assignees) {
            self.system.get_person(person_id).await?;
        }

        let assignee_role = self.system.get_role_by_name(TASK_ASSIGNEES_ROLE, ObjectType::TaskGroupTask).await?;
        let secondary_role = self.system.get_role_by_name(TASK_SECONDARY_ASSIGNEES_ROLE, ObjectType::TaskGroupTask).await?;

        let (start_date, end_date) = draft.resolve_dates(today)?;
        let mut task = GrcObject::new(ObjectType::TaskGroupTask, draft.title.trim()).with_description(draft.description.clone());
        task.start_date = Some(start_date);
        task.end_date = Some(end_date);

        let task = self
            .system
            .create_related_as(actor_id, task_group_id, task)
            .await?
            .ok_or_else(|| forbidden(actor_id, "create tasks in this task group"))?;

        let assignments = draft
            .assignees
            .iter()
            .map(|person_id| (person_id, &assignee_role))
            .chain(draft.secondary_assignees.iter().map(|person_id| (person_id, &secondary_role)));

        for (person_id, role) in assignments {
            if let Err(e) = self.system.assign_role(person_id, &role.id, &task.id, SYSTEM_ACTOR).await {
                // A task never stays without its assignees
                warn!(task_id = %task.id, person_id = %person_id, error = %e, "Task assignment failed, removing task");
                self.system.delete_object(&task.id).await?;
                return Err(e);
            }
        }

        Ok(task)
    }

    /// Move a task's dates, snapping both to weekdays; returns whether the actor was allowed
    pub async fn update_task_dates(&self, actor_id: &str, task_id: &str, start_date: NaiveDate, end_date: NaiveDate) -> AclResult<bool> {
        let (start_date, end_date) = (closest_weekday(start_date)?, closest_weekday(end_date)?);
        validate_dates(start_date, end_date)?;

        self.system
            .update_as(actor_id, task_id, |task| {
                if task.object_type != ObjectType::TaskGroupTask {
                    return Err(AclError::validation(format!("{} has no task dates", task.object_type)));
                }
                task.start_date = Some(start_date);
                task.end_date = Some(end_date);
                Ok(())
            })
            .await
    }

    pub async fn delete_task(&self, actor_id: &str, task_id: &str) -> AclResult<bool> {
        self.system.delete_as(actor_id, task_id).await
    }

    /// Everyone holding a role on the workflow or on one of its tasks
    pub async fn workflow_people(&self, workflow_id: &str) -> AclResult<Vec<Person>> {
        let mut object_ids = vec![workflow_id.to_string()];

        for (group_id, group_type) in self.system.related_objects(workflow_id).await? {
            if group_type != ObjectType::TaskGroup {
                continue;
            }
            for (task_id, task_type) in self.system.related_objects(&group_id).await? {
                if task_type == ObjectType::TaskGroupTask {
                    object_ids.push(task_id);
                }
            }
        }

        let mut person_ids = BTreeSet::new();
        for object_id in &object_ids {
            person_ids.extend(self.system.manager().people_on_object(object_id).await?);
        }

        let mut people = Vec::with_capacity(person_ids.len());
        for person_id in &person_ids {
            people.push(self.system.get_person(person_id).await?);
        }
        people.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(people)
    }
}
