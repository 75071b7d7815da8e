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

//! Task group task drafts and their validation rules

use crate::error::{AclError, AclResult};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default distance between a task's start and end date
pub const DEFAULT_TASK_SPAN_DAYS: i64 = 7;

fn add_days(date: NaiveDate, days: i64) -> AclResult<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
        .ok_or_else(|| AclError::validation(format!("Date {} is out of range", date)))
}

/// Move weekend dates forward to the following Monday
pub fn closest_weekday(date: NaiveDate) -> AclResult<NaiveDate> {
    match date.weekday() {
        Weekday::Sat => add_days(date, 2),
        Weekday::Sun => add_days(date, 1),
        _ => Ok(date),
    }
}

/// Input for creating a task inside a task group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,

    pub description: String,

    /// People receiving the `Task Assignees` role
    pub assignees: Vec<String>,

    /// People receiving the `Task Secondary Assignees` role
    pub secondary_assignees: Vec<String>,

    pub start_date: Option<NaiveDate>,

    pub end_date: Option<NaiveDate>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, assignees: Vec<String>) -> Self {
        Self {
            title: title.into(),
            assignees,
            ..Default::default()
        }
    }

    pub fn with_dates(mut self, start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }

    /// Fill in missing dates and snap both to weekdays
    pub fn resolve_dates(&self, today: NaiveDate) -> AclResult<(NaiveDate, NaiveDate)> {
        let start = self.start_date.unwrap_or(today);
        let end = match self.end_date {
            Some(end) => end,
            None => add_days(today, DEFAULT_TASK_SPAN_DAYS)?,
        };
        Ok((closest_weekday(start)?, closest_weekday(end)?))
    }

    pub fn validate(&self, today: NaiveDate) -> AclResult<()> {
        if self.title.trim().is_empty() {
            return Err(AclError::validation("Task title is required"));
        }

        if self.assignees.is_empty() {
            return Err(AclError::validation("Task needs at least one assignee"));
        }

        for people in [&self.assignees, &self.secondary_assignees] {
            let mut seen = HashSet::new();
            if let Some(duplicate) = people.iter().find(|person_id| !seen.insert(*person_id)) {
                return Err(AclError::validation(format!("Person '{}' is listed twice", duplicate)));
            }
        }

        let (start, end) = self.resolve_dates(today)?;
        validate_dates(start, end)
    }
}

pub fn validate_dates(start: NaiveDate, end: NaiveDate) -> AclResult<()> {
    if start > end {
        return Err(AclError::validation(format!("Start date {} is after end date {}", start, end)));
    }
    Ok(())
}
