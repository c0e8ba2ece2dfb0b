//! Task board core.
//!
//! - [`StatusSequence`]: the ordered pipeline a task moves through.
//! - [`TaskBoard`]: tasks partitioned into one bucket per status.
//! - [`DragController`]: turns drag gestures and stepper clicks into [`StatusMove`]s.
//! - [`BoardSession`]: applies moves optimistically and resyncs from a [`TaskStore`] on failure.

mod board;
mod drag;
mod error;
mod session;
mod status;
mod store;
mod task;

pub use board::TaskBoard;
pub use drag::{
    DragController, DragOutcome, DragState, DropTarget, NoOpReason, StatusMove, StepDirection,
};
pub use error::{KanbanError, Result, StoreError};
pub use session::{BoardSession, BoardState, MoveApplied, MoveReport};
pub use status::{StatusSequence, TaskStatus};
pub use store::{MemoryTaskStore, StoreResult, TaskStore};
pub use task::{Assignee, NewTask, Priority, Project, Task, clamp_progress};
