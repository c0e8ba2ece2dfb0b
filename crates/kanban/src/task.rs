use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::status::TaskStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Case-insensitive parse used at the store boundary.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

/// Display-only reference to the person a task is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub name: String,
    pub avatar: Option<String>,
    pub role: Option<String>,
}

impl Assignee {
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub code: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    pub assignee: Option<Assignee>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub progress: u8,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        title: impl Into<String>,
        status: TaskStatus,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            project_id: String::new(),
            title: title.into(),
            description: None,
            status,
            priority: Priority::default(),
            assignee: None,
            tags: BTreeSet::new(),
            progress: 0,
            start_date: None,
            due_date: None,
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_date.is_some_and(|due| due < today) && self.progress < 100
    }
}

/// Clamp a raw store value into the 0..=100 progress range.
pub fn clamp_progress(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}

/// Fields for a task that does not exist in the store yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub project_id: String,
    pub code: Option<String>,
    pub title: String,
    pub description: Option<String>,
    /// `None` means the first status of the active sequence.
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Priority,
    pub assignee: Option<Assignee>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub progress: u8,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(project_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            title: title.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub code: Option<String>,
    pub client: Option<String>,
}
