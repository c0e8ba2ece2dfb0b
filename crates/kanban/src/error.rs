//! Error types for the board core

use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, KanbanError>;

/// Errors raised by the board core itself
#[derive(Debug, Error)]
pub enum KanbanError {
    /// A status sequence needs at least one status
    #[error("status sequence is empty")]
    EmptySequence,

    /// The same status appears twice in a sequence
    #[error("status {status} appears more than once in the sequence")]
    DuplicateStatus { status: String },

    /// A sequence may only hold statuses the board knows how to render
    #[error("unrecognized status in sequence: {value}")]
    UnrecognizedStatus { value: String },

    /// A drag gesture is already lifting another task
    #[error("a drag is already in progress for task {task_id}")]
    DragInProgress { task_id: String },

    /// Task is not part of the current task list
    #[error("task not found: {id}")]
    TaskNotFound { id: String },

    /// The task store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors returned by a [`crate::TaskStore`] implementation
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The addressed row does not exist
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// The store answered but refused the request
    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request never got a usable answer
    #[error("transport error: {0}")]
    Transport(String),

    /// The answer could not be decoded into board types
    #[error("failed to decode store response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn task_not_found(id: impl Into<String>) -> Self {
        StoreError::NotFound {
            resource: "task".to_string(),
            id: id.into(),
        }
    }
}
