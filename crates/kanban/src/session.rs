//! Optimistic board state and its reconciliation with the task store.
//!
//! [`BoardState`] is the synchronous part: the latest task list plus the
//! board derived from it, rebuilt wholesale after every change.
//! [`BoardSession`] wraps it with a [`TaskStore`]: moves are applied locally
//! first, persisted in the background, and any failure is answered with a
//! full resync from the store instead of a local rollback.
//!
//! Moves of the same task reach the store one at a time, in the order they
//! were requested. Moves of different tasks run concurrently.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::board::TaskBoard;
use crate::drag::StatusMove;
use crate::error::{KanbanError, Result, StoreError};
use crate::status::{StatusSequence, TaskStatus};
use crate::store::{StoreResult, TaskStore};
use crate::task::{NewTask, Task};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveApplied {
    Changed { previous: TaskStatus },
    /// The task already had that status.
    Unchanged,
    UnknownTask,
}

#[derive(Debug, Clone)]
pub struct BoardState {
    sequence: StatusSequence,
    tasks: Vec<Task>,
    board: TaskBoard,
}

impl BoardState {
    pub fn new(sequence: StatusSequence) -> Self {
        let board = TaskBoard::empty(&sequence);
        Self {
            sequence,
            tasks: Vec::new(),
            board,
        }
    }

    pub fn sequence(&self) -> &StatusSequence {
        &self.sequence
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn board(&self) -> &TaskBoard {
        &self.board
    }

    /// Discard local state and rebuild from a fresh task list.
    pub fn replace_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.rebuild();

        let excluded = self.board.excluded();
        if !excluded.is_empty() {
            let ids: Vec<&str> = excluded.iter().map(|t| t.id.as_str()).collect();
            let statuses: Vec<&str> = excluded.iter().map(|t| t.status.as_str()).collect();
            tracing::warn!(
                count = excluded.len(),
                ?ids,
                ?statuses,
                "tasks with a status outside the pipeline are hidden from the board"
            );
        }
    }

    pub fn apply_move(&mut self, task_id: &str, status: &TaskStatus) -> MoveApplied {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) else {
            return MoveApplied::UnknownTask;
        };

        if &task.status == status {
            return MoveApplied::Unchanged;
        }

        let previous = std::mem::replace(&mut task.status, status.clone());
        self.rebuild();
        MoveApplied::Changed { previous }
    }

    pub fn insert_task(&mut self, task: Task) {
        self.tasks.push(task);
        self.rebuild();
    }

    pub fn remove_task(&mut self, task_id: &str) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.id == task_id)?;
        let task = self.tasks.remove(index);
        self.rebuild();
        Some(task)
    }

    fn rebuild(&mut self) {
        self.board = TaskBoard::partition(&self.sequence, &self.tasks);
    }
}

/// Result of one persisted move, as seen by the view.
#[derive(Debug, Clone)]
pub enum MoveReport {
    Confirmed(StatusMove),
    Failed { mv: StatusMove, error: StoreError },
    ResyncFailed(StoreError),
}

#[derive(Debug)]
struct Confirmation {
    mv: StatusMove,
    epoch: u64,
    result: StoreResult<()>,
}

pub struct BoardSession<S> {
    store: Arc<S>,
    project_id: String,
    state: BoardState,
    pending: usize,
    /// A key is present while a move of that task is in flight; the value
    /// holds the moves requested after it.
    queued: HashMap<String, VecDeque<StatusMove>>,
    /// Bumped on every resync so late confirmations can be recognised.
    epoch: u64,
    tx: mpsc::UnboundedSender<Confirmation>,
    rx: mpsc::UnboundedReceiver<Confirmation>,
}

impl<S: TaskStore + 'static> BoardSession<S> {
    pub fn new(store: Arc<S>, project_id: impl Into<String>, sequence: StatusSequence) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            store,
            project_id: project_id.into(),
            state: BoardState::new(sequence),
            pending: 0,
            queued: HashMap::new(),
            epoch: 0,
            tx,
            rx,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn board(&self) -> &TaskBoard {
        self.state.board()
    }

    /// Moves not confirmed by the store yet, queued ones included.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub async fn load(&mut self) -> StoreResult<()> {
        self.resync().await
    }

    /// Full fetch of the canonical task list.
    pub async fn resync(&mut self) -> StoreResult<()> {
        let tasks = self.store.list_tasks(&self.project_id).await?;
        self.epoch += 1;
        tracing::debug!(project_id = %self.project_id, count = tasks.len(), "board resynced");
        self.state.replace_tasks(tasks);
        Ok(())
    }

    /// Apply a move locally and persist it in the background.
    ///
    /// Repeating a move that is already applied changes nothing and sends
    /// nothing to the store.
    pub fn request_move(&mut self, mv: StatusMove) -> MoveApplied {
        let applied = self.state.apply_move(&mv.task_id, &mv.to);
        if !matches!(applied, MoveApplied::Changed { .. }) {
            return applied;
        }

        self.pending += 1;
        match self.queued.get_mut(&mv.task_id) {
            Some(waiting) => {
                tracing::debug!(task_id = %mv.task_id, to = %mv.to, "move queued behind an earlier one");
                waiting.push_back(mv);
            }
            None => {
                self.queued.insert(mv.task_id.clone(), VecDeque::new());
                self.send(mv);
            }
        }

        applied
    }

    fn send(&self, mv: StatusMove) {
        let store = Arc::clone(&self.store);
        let tx = self.tx.clone();
        let epoch = self.epoch;

        tokio::spawn(async move {
            let result = store.update_task_status(&mv.task_id, &mv.to).await;
            // The session may be gone; nothing left to reconcile then.
            let _ = tx.send(Confirmation { mv, epoch, result });
        });
    }

    /// Handle every confirmation that has already arrived, without waiting.
    pub async fn process_confirmations(&mut self) -> Vec<MoveReport> {
        let mut batch = Vec::new();
        while let Ok(confirmation) = self.rx.try_recv() {
            batch.push(confirmation);
        }
        self.handle(batch).await
    }

    /// Wait for the next confirmation and handle it.
    pub async fn next_confirmation(&mut self) -> Vec<MoveReport> {
        if self.pending == 0 {
            return Vec::new();
        }
        match self.rx.recv().await {
            Some(confirmation) => self.handle(vec![confirmation]).await,
            None => Vec::new(),
        }
    }

    /// Wait until no move is in flight.
    pub async fn settle(&mut self) -> Vec<MoveReport> {
        let mut reports = Vec::new();
        while self.pending > 0 {
            reports.extend(self.next_confirmation().await);
        }
        reports
    }

    async fn handle(&mut self, batch: Vec<Confirmation>) -> Vec<MoveReport> {
        let mut reports = Vec::with_capacity(batch.len());
        let mut needs_resync = false;

        for Confirmation { mv, epoch, result } in batch {
            self.pending = self.pending.saturating_sub(1);
            match result {
                Ok(()) => {
                    // A resync that ran while this call was in flight may have
                    // read the old status.
                    if epoch < self.epoch {
                        needs_resync = true;
                    }
                    match self.queued.get_mut(&mv.task_id).and_then(VecDeque::pop_front) {
                        Some(next) => self.send(next),
                        None => {
                            self.queued.remove(&mv.task_id);
                        }
                    }
                    reports.push(MoveReport::Confirmed(mv));
                }
                Err(error) => {
                    tracing::error!(
                        task_id = %mv.task_id,
                        to = %mv.to,
                        error = %error,
                        "failed to persist status move"
                    );
                    needs_resync = true;
                    // Later moves of this task were based on the failed one.
                    let dropped = self.queued.remove(&mv.task_id).unwrap_or_default();
                    self.pending = self.pending.saturating_sub(dropped.len());
                    reports.push(MoveReport::Failed {
                        mv,
                        error: error.clone(),
                    });
                    reports.extend(dropped.into_iter().map(|mv| MoveReport::Failed {
                        mv,
                        error: error.clone(),
                    }));
                }
            }
        }

        if needs_resync {
            if let Err(error) = self.resync().await {
                tracing::error!(error = %error, "resync after failed move did not complete");
                reports.push(MoveReport::ResyncFailed(error));
            }
        }

        reports
    }

    pub async fn create_task(&mut self, mut new: NewTask) -> Result<Task> {
        new.project_id = self.project_id.clone();
        if new.status.is_none() {
            new.status = Some(self.state.sequence().first().clone());
        }
        let task = self.store.create_task(new).await?;
        self.state.insert_task(task.clone());
        Ok(task)
    }

    pub async fn delete_task(&mut self, task_id: &str) -> Result<()> {
        if !self.state.tasks().iter().any(|t| t.id == task_id) {
            return Err(KanbanError::TaskNotFound {
                id: task_id.to_string(),
            });
        }
        match self.store.delete_task(task_id).await {
            Ok(()) => {}
            Err(StoreError::NotFound { .. }) => {
                tracing::info!(task_id = %task_id, "task was already deleted in the store");
            }
            Err(error) => return Err(error.into()),
        }
        self.state.remove_task(task_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::{DragController, DropTarget, StepDirection};
    use crate::store::MemoryTaskStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Holds the first status update until `release` is notified and counts
    /// task list fetches.
    struct HeldStore {
        inner: MemoryTaskStore,
        hold_first: AtomicBool,
        release: Notify,
        lists: AtomicUsize,
    }

    impl HeldStore {
        fn new(tasks: Vec<Task>) -> Self {
            Self {
                inner: MemoryTaskStore::with_tasks(short(), vec![], tasks),
                hold_first: AtomicBool::new(true),
                release: Notify::new(),
                lists: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TaskStore for HeldStore {
        async fn list_projects(&self) -> StoreResult<Vec<crate::task::Project>> {
            self.inner.list_projects().await
        }

        async fn list_tasks(&self, project_id: &str) -> StoreResult<Vec<Task>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            self.inner.list_tasks(project_id).await
        }

        async fn update_task_status(&self, task_id: &str, status: &TaskStatus) -> StoreResult<()> {
            if self.hold_first.swap(false, Ordering::SeqCst) {
                self.release.notified().await;
            }
            self.inner.update_task_status(task_id, status).await
        }

        async fn create_task(&self, new: NewTask) -> StoreResult<Task> {
            self.inner.create_task(new).await
        }

        async fn delete_task(&self, task_id: &str) -> StoreResult<()> {
            self.inner.delete_task(task_id).await
        }
    }

    fn mv(id: &str, from: TaskStatus, to: TaskStatus) -> StatusMove {
        StatusMove {
            task_id: id.to_string(),
            from,
            to,
        }
    }

    fn short() -> StatusSequence {
        StatusSequence::new(vec![TaskStatus::Open, TaskStatus::S0, TaskStatus::Completed]).unwrap()
    }

    fn task(id: &str, status: TaskStatus) -> Task {
        let mut task = Task::new(id, format!("T-{}", id), id, status);
        task.project_id = "p1".to_string();
        task
    }

    fn counts(board: &TaskBoard) -> Vec<usize> {
        board.counts().into_iter().map(|(_, c)| c).collect()
    }

    async fn session_with(tasks: Vec<Task>) -> (Arc<MemoryTaskStore>, BoardSession<MemoryTaskStore>) {
        let store = Arc::new(MemoryTaskStore::with_tasks(short(), vec![], tasks));
        let mut session = BoardSession::new(Arc::clone(&store), "p1", short());
        session.load().await.unwrap();
        (store, session)
    }

    #[test]
    fn test_apply_move_is_idempotent() {
        let mut state = BoardState::new(short());
        state.replace_tasks(vec![task("x", TaskStatus::Open), task("y", TaskStatus::Open)]);

        let first = state.apply_move("x", &TaskStatus::S0);
        let after_first = counts(state.board());
        let second = state.apply_move("x", &TaskStatus::S0);

        assert_eq!(first, MoveApplied::Changed { previous: TaskStatus::Open });
        assert_eq!(second, MoveApplied::Unchanged);
        assert_eq!(counts(state.board()), after_first);
        assert_eq!(after_first, vec![1, 1, 0]);
        assert_eq!(state.board().total(), 2);
    }

    #[test]
    fn test_apply_move_unknown_task() {
        let mut state = BoardState::new(short());
        assert_eq!(state.apply_move("nope", &TaskStatus::S0), MoveApplied::UnknownTask);
    }

    #[test]
    fn test_moved_task_lands_in_exactly_one_bucket() {
        for target in short().iter() {
            let mut state = BoardState::new(short());
            state.replace_tasks(vec![task("a", TaskStatus::Open), task("b", TaskStatus::S0)]);

            state.apply_move("a", target);

            for status in short().iter() {
                let present = state.board().bucket(status).iter().any(|t| t.id == "a");
                assert_eq!(present, status == target);
            }
        }
    }

    #[tokio::test]
    async fn test_step_then_drag_scenario() {
        let (store, mut session) = session_with(vec![task("x", TaskStatus::Open)]).await;

        let mv = DragController::step(StepDirection::Forward, "x", session.board(), |_, _| {})
            .expect("Open has a successor");
        session.request_move(mv);
        assert_eq!(counts(session.board()), vec![0, 1, 0]);

        let mut drag = DragController::new();
        drag.begin("x").unwrap();
        let outcome = drag.end(DropTarget::Column(TaskStatus::Completed), session.board(), |_, _| {});
        session.request_move(outcome.moved().cloned().unwrap());
        assert_eq!(counts(session.board()), vec![0, 0, 1]);

        let reports = session.settle().await;
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| matches!(r, MoveReport::Confirmed(_))));
        assert_eq!(store.get("x").unwrap().status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_repeated_move_sends_nothing() {
        let (_store, mut session) = session_with(vec![task("x", TaskStatus::Open)]).await;
        let mv = StatusMove {
            task_id: "x".to_string(),
            from: TaskStatus::Open,
            to: TaskStatus::S0,
        };

        session.request_move(mv.clone());
        let second = session.request_move(mv);

        assert_eq!(second, MoveApplied::Unchanged);
        assert_eq!(session.pending(), 1);
        session.settle().await;
        assert_eq!(counts(session.board()), vec![0, 1, 0]);
    }

    #[tokio::test]
    async fn test_failed_move_reverts_through_resync() {
        let (store, mut session) = session_with(vec![task("x", TaskStatus::Open)]).await;
        store.fail_updates(true);

        session.request_move(StatusMove {
            task_id: "x".to_string(),
            from: TaskStatus::Open,
            to: TaskStatus::Completed,
        });
        assert_eq!(session.board().status_of("x"), Some(&TaskStatus::Completed));

        let reports = session.settle().await;

        assert!(matches!(reports.as_slice(), [MoveReport::Failed { .. }]));
        assert_eq!(session.board().status_of("x"), Some(&TaskStatus::Open));
        assert_eq!(counts(session.board()), vec![1, 0, 0]);
        assert_eq!(session.pending(), 0);
    }

    #[tokio::test]
    async fn test_resync_picks_up_remote_changes() {
        let (store, mut session) = session_with(vec![task("x", TaskStatus::Open)]).await;

        store.set_status("x", TaskStatus::parse("Archived"));
        session.resync().await.unwrap();

        assert_eq!(session.board().total(), 0);
        assert_eq!(session.board().excluded().len(), 1);
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let (store, mut session) = session_with(vec![]).await;

        let created = session.create_task(NewTask::new("ignored", "Clash detection")).await.unwrap();
        assert_eq!(created.project_id, "p1");
        assert_eq!(created.status, TaskStatus::Open);
        assert_eq!(session.board().count(&TaskStatus::Open), 1);

        session.delete_task(&created.id).await.unwrap();
        assert_eq!(session.board().total(), 0);
        assert!(store.get(&created.id).is_none());

        assert!(matches!(
            session.delete_task(&created.id).await,
            Err(KanbanError::TaskNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_moves_of_one_task_reach_the_store_in_order() {
        let store = Arc::new(HeldStore::new(vec![task("x", TaskStatus::Open)]));
        let mut session = BoardSession::new(Arc::clone(&store), "p1", short());
        session.load().await.unwrap();

        session.request_move(mv("x", TaskStatus::Open, TaskStatus::S0));
        session.request_move(mv("x", TaskStatus::S0, TaskStatus::Completed));
        assert_eq!(session.pending(), 2);

        // The second move waits for the first, so it cannot overtake it.
        tokio::task::yield_now().await;
        assert_eq!(store.inner.get("x").unwrap().status, TaskStatus::Open);

        store.release.notify_one();
        let reports = session.settle().await;

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| matches!(r, MoveReport::Confirmed(_))));
        assert_eq!(store.inner.get("x").unwrap().status, TaskStatus::Completed);
        assert_eq!(session.board().status_of("x"), Some(&TaskStatus::Completed));
    }

    #[tokio::test]
    async fn test_failed_move_drops_the_moves_queued_behind_it() {
        let (store, mut session) = session_with(vec![task("x", TaskStatus::Open)]).await;
        store.fail_updates(true);

        session.request_move(mv("x", TaskStatus::Open, TaskStatus::S0));
        session.request_move(mv("x", TaskStatus::S0, TaskStatus::Completed));

        let reports = session.settle().await;

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| matches!(r, MoveReport::Failed { .. })));
        assert_eq!(session.pending(), 0);
        assert_eq!(session.board().status_of("x"), Some(&TaskStatus::Open));
    }

    #[tokio::test]
    async fn test_success_after_resync_triggers_another_resync() {
        let store = Arc::new(HeldStore::new(vec![task("x", TaskStatus::Open)]));
        let mut session = BoardSession::new(Arc::clone(&store), "p1", short());
        session.load().await.unwrap();
        assert_eq!(store.lists.load(Ordering::SeqCst), 1);

        session.request_move(mv("x", TaskStatus::Open, TaskStatus::S0));

        // The update is still held, so this read sees the old status.
        session.resync().await.unwrap();
        assert_eq!(store.lists.load(Ordering::SeqCst), 2);
        assert_eq!(session.board().status_of("x"), Some(&TaskStatus::Open));

        store.release.notify_one();
        let reports = session.settle().await;

        assert!(matches!(reports.as_slice(), [MoveReport::Confirmed(_)]));
        assert_eq!(store.lists.load(Ordering::SeqCst), 3);
        assert_eq!(store.inner.get("x").unwrap().status, TaskStatus::S0);
        assert_eq!(session.board().status_of("x"), Some(&TaskStatus::S0));
    }

    #[tokio::test]
    async fn test_delete_of_task_already_gone_from_store() {
        let (store, mut session) = session_with(vec![task("x", TaskStatus::Open)]).await;

        store.delete_task("x").await.unwrap();
        session.delete_task("x").await.unwrap();

        assert_eq!(session.board().total(), 0);
        assert!(session.board().find("x").is_none());
    }
}
