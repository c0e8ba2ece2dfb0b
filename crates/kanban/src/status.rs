//! Task statuses and the ordered pipeline they move through.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{KanbanError, Result};

/// Status of a task on the construction pipeline.
///
/// The `S*` stages follow the usual BIM suitability codes. Any other value
/// coming from the store is kept verbatim as [`TaskStatus::Unrecognized`] so
/// it can be reported instead of silently vanishing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Open,
    S0,
    S1,
    S2,
    S3,
    S4,
    Completed,
    Unrecognized(String),
}

impl TaskStatus {
    pub const KNOWN: [TaskStatus; 7] = [
        TaskStatus::Open,
        TaskStatus::S0,
        TaskStatus::S1,
        TaskStatus::S2,
        TaskStatus::S3,
        TaskStatus::S4,
        TaskStatus::Completed,
    ];

    /// Parse a wire token. Never fails: unknown tokens become `Unrecognized`.
    pub fn parse(value: &str) -> Self {
        let token = value.trim();
        match token.to_ascii_lowercase().as_str() {
            "open" => TaskStatus::Open,
            "s0" => TaskStatus::S0,
            "s1" => TaskStatus::S1,
            "s2" => TaskStatus::S2,
            "s3" => TaskStatus::S3,
            "s4" => TaskStatus::S4,
            "completed" => TaskStatus::Completed,
            _ => TaskStatus::Unrecognized(token.to_string()),
        }
    }

    /// Token written back to the store.
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Open => "Open",
            TaskStatus::S0 => "S0",
            TaskStatus::S1 => "S1",
            TaskStatus::S2 => "S2",
            TaskStatus::S3 => "S3",
            TaskStatus::S4 => "S4",
            TaskStatus::Completed => "Completed",
            TaskStatus::Unrecognized(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TaskStatus::Open => "Open",
            TaskStatus::S0 => "S0 Work in progress",
            TaskStatus::S1 => "S1 Coordination",
            TaskStatus::S2 => "S2 Information",
            TaskStatus::S3 => "S3 Review",
            TaskStatus::S4 => "S4 Approval",
            TaskStatus::Completed => "Completed",
            TaskStatus::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, TaskStatus::Unrecognized(_))
    }
}

impl From<&str> for TaskStatus {
    fn from(value: &str) -> Self {
        TaskStatus::parse(value)
    }
}

impl From<String> for TaskStatus {
    fn from(value: String) -> Self {
        TaskStatus::parse(&value)
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Unrecognized(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, immutable pipeline of statuses.
///
/// The first status is where new tasks start, the last one is terminal.
/// Adjacency is linear; drag-and-drop may still jump to any member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSequence {
    statuses: Vec<TaskStatus>,
}

impl StatusSequence {
    pub fn new(statuses: Vec<TaskStatus>) -> Result<Self> {
        if statuses.is_empty() {
            return Err(KanbanError::EmptySequence);
        }

        for (i, status) in statuses.iter().enumerate() {
            if !status.is_recognized() {
                return Err(KanbanError::UnrecognizedStatus {
                    value: status.to_string(),
                });
            }
            if statuses[..i].contains(status) {
                return Err(KanbanError::DuplicateStatus {
                    status: status.to_string(),
                });
            }
        }

        Ok(Self { statuses })
    }

    /// The full pipeline: Open, S0 to S4, Completed.
    pub fn standard() -> Self {
        Self {
            statuses: TaskStatus::KNOWN.to_vec(),
        }
    }

    /// Build a sequence from configuration tokens such as `["Open", "S0", "Completed"]`.
    pub fn parse_list<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let statuses = tokens
            .iter()
            .map(|t| t.as_ref().trim())
            .filter(|t| !t.is_empty())
            .map(TaskStatus::parse)
            .collect();
        Self::new(statuses)
    }

    pub fn index_of(&self, status: &TaskStatus) -> Option<usize> {
        self.statuses.iter().position(|s| s == status)
    }

    pub fn contains(&self, status: &TaskStatus) -> bool {
        self.index_of(status).is_some()
    }

    pub fn predecessor_of(&self, status: &TaskStatus) -> Option<&TaskStatus> {
        let index = self.index_of(status)?;
        index.checked_sub(1).and_then(|i| self.statuses.get(i))
    }

    pub fn successor_of(&self, status: &TaskStatus) -> Option<&TaskStatus> {
        let index = self.index_of(status)?;
        self.statuses.get(index + 1)
    }

    pub fn first(&self) -> &TaskStatus {
        &self.statuses[0]
    }

    pub fn last(&self) -> &TaskStatus {
        &self.statuses[self.statuses.len() - 1]
    }

    pub fn get(&self, index: usize) -> Option<&TaskStatus> {
        self.statuses.get(index)
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TaskStatus> {
        self.statuses.iter()
    }
}

impl Default for StatusSequence {
    fn default() -> Self {
        Self::standard()
    }
}

impl<'a> IntoIterator for &'a StatusSequence {
    type Item = &'a TaskStatus;
    type IntoIter = std::slice::Iter<'a, TaskStatus>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
