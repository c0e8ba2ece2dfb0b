//! Drag session controller.
//!
//! Owns the ephemeral state of one drag gesture and turns its end into at
//! most one status move. The controller never touches the task list itself;
//! the caller applies the move and rebuilds the board.

use crate::board::TaskBoard;
use crate::error::{KanbanError, Result};
use crate::status::TaskStatus;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        task_id: String,
    },
}

/// Whatever the pointer was released over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Another card; the move takes that card's status.
    Task(String),
    /// A column header or an empty column body.
    Column(TaskStatus),
    /// Empty space or anything that is not droppable.
    Empty,
}

/// A status change requested by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMove {
    pub task_id: String,
    pub from: TaskStatus,
    pub to: TaskStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    NotDragging,
    UnresolvedTarget,
    SameStatus,
    TaskNotOnBoard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    Moved(StatusMove),
    NoOp(NoOpReason),
    Cancelled,
}

impl DragOutcome {
    pub fn moved(&self) -> Option<&StatusMove> {
        match self {
            DragOutcome::Moved(mv) => Some(mv),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Forward,
    Backward,
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Id of the lifted task, if a drag is in progress.
    pub fn dragging(&self) -> Option<&str> {
        match &self.state {
            DragState::Dragging { task_id } => Some(task_id),
            DragState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging().is_some()
    }

    pub fn begin(&mut self, task_id: impl Into<String>) -> Result<()> {
        if let DragState::Dragging { task_id: current } = &self.state {
            return Err(KanbanError::DragInProgress {
                task_id: current.clone(),
            });
        }

        let task_id = task_id.into();
        tracing::debug!(task_id = %task_id, "drag started");
        self.state = DragState::Dragging { task_id };
        Ok(())
    }

    /// Finish the gesture over `target`.
    ///
    /// `on_move` runs exactly once when the target resolves to a status that
    /// differs from the dragged task's current one, and never otherwise.
    /// The controller is back to `Idle` afterwards in every case.
    pub fn end<F>(&mut self, target: DropTarget, board: &TaskBoard, on_move: F) -> DragOutcome
    where
        F: FnOnce(&str, &TaskStatus),
    {
        let DragState::Dragging { task_id } = std::mem::take(&mut self.state) else {
            return DragOutcome::NoOp(NoOpReason::NotDragging);
        };

        let Some(current) = board.status_of(&task_id) else {
            tracing::debug!(task_id = %task_id, "dragged task is no longer on the board");
            return DragOutcome::NoOp(NoOpReason::TaskNotOnBoard);
        };

        let Some(target_status) = resolve_target(&target, board) else {
            return DragOutcome::NoOp(NoOpReason::UnresolvedTarget);
        };

        if &target_status == current {
            return DragOutcome::NoOp(NoOpReason::SameStatus);
        }

        let mv = StatusMove {
            task_id,
            from: current.clone(),
            to: target_status,
        };
        on_move(&mv.task_id, &mv.to);
        tracing::info!(task_id = %mv.task_id, from = %mv.from, to = %mv.to, "drag committed");
        DragOutcome::Moved(mv)
    }

    /// Abort the gesture without requesting anything.
    pub fn cancel(&mut self) -> DragOutcome {
        match std::mem::take(&mut self.state) {
            DragState::Dragging { task_id } => {
                tracing::debug!(task_id = %task_id, "drag cancelled");
                DragOutcome::Cancelled
            }
            DragState::Idle => DragOutcome::NoOp(NoOpReason::NotDragging),
        }
    }

    /// Target status of a stepper control, `None` when the control is disabled.
    pub fn step_target<'a>(
        direction: StepDirection,
        task_id: &str,
        board: &'a TaskBoard,
    ) -> Option<&'a TaskStatus> {
        let current = board.status_of(task_id)?;
        match direction {
            StepDirection::Forward => board.sequence().successor_of(current),
            StepDirection::Backward => board.sequence().predecessor_of(current),
        }
    }

    pub fn can_step(direction: StepDirection, task_id: &str, board: &TaskBoard) -> bool {
        Self::step_target(direction, task_id, board).is_some()
    }

    /// Move a task to the adjacent status. Disabled steps return `None`
    /// without calling `on_move`.
    pub fn step<F>(
        direction: StepDirection,
        task_id: &str,
        board: &TaskBoard,
        on_move: F,
    ) -> Option<StatusMove>
    where
        F: FnOnce(&str, &TaskStatus),
    {
        let to = Self::step_target(direction, task_id, board)?.clone();
        let from = board.status_of(task_id)?.clone();
        let mv = StatusMove {
            task_id: task_id.to_string(),
            from,
            to,
        };
        on_move(&mv.task_id, &mv.to);
        Some(mv)
    }
}

fn resolve_target(target: &DropTarget, board: &TaskBoard) -> Option<TaskStatus> {
    match target {
        DropTarget::Task(id) => board.status_of(id).cloned(),
        DropTarget::Column(status) if board.sequence().contains(status) => Some(status.clone()),
        DropTarget::Column(_) | DropTarget::Empty => None,
    }
}
