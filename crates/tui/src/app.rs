use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::Event;
use kanban::{
    BoardSession, DragController, DragOutcome, MoveReport, NewTask, NoOpReason, StatusSequence,
    StepDirection, TaskStore,
};
use ratatui::layout::{Constraint, Direction, Layout};

use crate::editor::{self, TaskDraft};
use crate::input::{Action, EventStream, extract_key_event, key_to_action};
use crate::state::{AppState, Modal, View};
use crate::terminal::Terminal;
use crate::ui::{
    BoardInfo, render_delete_modal, render_footer, render_header, render_help_modal,
    render_kanban_board, render_project_list,
};

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct App<S> {
    state: AppState,
    store: Arc<S>,
    sequence: StatusSequence,
    session: Option<BoardSession<S>>,
    drag: DragController,
    events: EventStream,
    tick: usize,
}

impl<S: TaskStore + 'static> App<S> {
    pub async fn new(store: Arc<S>, sequence: StatusSequence, project_id: Option<String>) -> Self {
        let mut app = Self {
            state: AppState::new(),
            store,
            sequence,
            session: None,
            drag: DragController::new(),
            events: EventStream::new(),
            tick: 0,
        };

        app.load_projects().await;
        if let Some(project_id) = project_id {
            app.open_board(project_id).await;
        }
        app
    }

    pub async fn run(&mut self, terminal: &mut Terminal) -> Result<()> {
        loop {
            self.drain_confirmations().await;

            self.render(terminal)?;
            self.tick = self.tick.wrapping_add(1);

            if let Some(event) = self.events.next().await? {
                self.handle_event(event, terminal).await?;
            }

            if self.state.should_quit {
                break;
            }
        }

        self.close_board().await;
        Ok(())
    }

    async fn drain_confirmations(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let reports = session.process_confirmations().await;
        for report in reports {
            self.apply_report(report);
        }
        self.clamp_view();
    }

    fn apply_report(&mut self, report: MoveReport) {
        match report {
            MoveReport::Confirmed(_) => {
                self.state.backend_connected = true;
            }
            MoveReport::Failed { mv, error } => {
                self.state.error(format!(
                    "Could not move task to {}: {}. Board reloaded from the store.",
                    mv.to.label(),
                    error
                ));
            }
            MoveReport::ResyncFailed(error) => {
                self.state.backend_connected = false;
                self.state.error(format!("Reload failed, board may be stale: {}", error));
            }
        }
    }

    fn clamp_view(&mut self) {
        if let Some(session) = &self.session {
            self.state.board.clamp(session.board());
        }
    }

    fn render(&self, terminal: &mut Terminal) -> Result<()> {
        terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(2), // Header
                    Constraint::Min(0),    // Board or project list
                    Constraint::Length(2), // Footer
                ])
                .split(frame.area());

            let pending = self.session.as_ref().map_or(0, |s| s.pending());
            let spinner = if pending > 0 {
                SPINNER[self.tick % SPINNER.len()]
            } else {
                ' '
            };
            render_header(frame, chunks[0], &self.state, spinner);

            let mut info = BoardInfo::default();
            match (self.state.view, &self.session) {
                (View::Kanban, Some(session)) => {
                    let today = chrono::Local::now().date_naive();
                    render_kanban_board(
                        frame,
                        chunks[1],
                        session.board(),
                        &self.state.board,
                        self.drag.dragging(),
                        today,
                    );
                    info = BoardInfo {
                        pending,
                        hidden: session.board().excluded().len(),
                        dragging: self.drag.is_dragging(),
                    };
                }
                _ => render_project_list(frame, chunks[1], &self.state.projects),
            }

            render_footer(frame, chunks[2], &self.state, info);

            match &self.state.modal {
                Some(Modal::Help) => render_help_modal(frame, frame.area()),
                Some(Modal::DeleteConfirm(task_id)) => {
                    let label = self
                        .session
                        .as_ref()
                        .and_then(|s| s.board().find(task_id))
                        .map(|t| format!("{} {}", t.code, t.title))
                        .unwrap_or_else(|| task_id.clone());
                    render_delete_modal(frame, frame.area(), &label);
                }
                None => {}
            }
        })?;

        Ok(())
    }

    async fn handle_event(&mut self, event: Event, terminal: &mut Terminal) -> Result<()> {
        let Some(key) = extract_key_event(event) else {
            return Ok(());
        };

        let Some(action) = key_to_action(
            key,
            self.state.view,
            self.state.modal.as_ref(),
            self.drag.is_dragging(),
        ) else {
            return Ok(());
        };

        self.state.notice = None;

        if action == Action::CreateTask {
            return self.create_task(terminal).await;
        }

        self.handle_action(action).await;
        Ok(())
    }

    async fn handle_action(&mut self, action: Action) {
        if self.state.modal.is_some() {
            self.handle_modal_action(action).await;
            return;
        }

        if self.drag.is_dragging() {
            self.handle_drag_action(action);
            return;
        }

        match action {
            Action::Quit => {
                self.state.should_quit = true;
            }
            Action::Back => {
                self.close_board().await;
                self.state.back();
            }
            Action::ShowHelp => {
                self.state.modal = Some(Modal::Help);
            }
            Action::Up => match self.state.view {
                View::Projects => self.state.projects.select_prev(),
                View::Kanban => self.state.board.select_prev_card(),
            },
            Action::Down => match (self.state.view, &self.session) {
                (View::Projects, _) => self.state.projects.select_next(),
                (View::Kanban, Some(session)) => self.state.board.select_next_card(session.board()),
                _ => {}
            },
            Action::Left => {
                if let Some(session) = &self.session {
                    self.state.board.select_prev_column(session.board());
                }
            }
            Action::Right => {
                if let Some(session) = &self.session {
                    self.state.board.select_next_column(session.board());
                }
            }
            Action::Select => {
                if self.state.view == View::Projects {
                    if let Some(project) = self.state.projects.selected() {
                        let project_id = project.id.clone();
                        self.open_board(project_id).await;
                    }
                }
            }
            Action::Refresh => match self.state.view {
                View::Projects => self.load_projects().await,
                View::Kanban => self.resync().await,
            },
            Action::PickUp => self.pick_up(),
            Action::StepForward => self.step(StepDirection::Forward),
            Action::StepBackward => self.step(StepDirection::Backward),
            Action::DeleteTask => {
                if let Some(session) = &self.session {
                    if let Some(task) = self.state.board.selected_task(session.board()) {
                        self.state.modal = Some(Modal::DeleteConfirm(task.id.clone()));
                    }
                }
            }
            Action::CreateTask | Action::Confirm | Action::Drop | Action::CancelDrag => {}
        }
    }

    async fn handle_modal_action(&mut self, action: Action) {
        match action {
            Action::Back => {
                self.state.modal = None;
            }
            Action::Confirm => {
                if let Some(Modal::DeleteConfirm(task_id)) = self.state.modal.take() {
                    self.delete_task(&task_id).await;
                }
            }
            _ => {}
        }
    }

    fn handle_drag_action(&mut self, action: Action) {
        let Some(session) = &self.session else {
            self.drag.cancel();
            self.state.board.end_hover();
            return;
        };
        let board = session.board();

        match action {
            Action::Up => self.state.board.hover_up(),
            Action::Down => self.state.board.hover_down(board),
            Action::Left => self.state.board.hover_prev_column(),
            Action::Right => self.state.board.hover_next_column(board),
            Action::Drop => self.drop_card(),
            Action::CancelDrag => {
                self.drag.cancel();
                self.state.board.end_hover();
            }
            _ => {}
        }
    }

    async fn load_projects(&mut self) {
        match self.store.list_projects().await {
            Ok(projects) => {
                self.state.backend_connected = true;
                self.state.projects.set_projects(projects);
            }
            Err(error) => {
                tracing::error!(error = %error, "failed to load projects");
                self.state.backend_connected = false;
                self.state.error(format!("Could not load projects: {}", error));
            }
        }
    }

    async fn open_board(&mut self, project_id: String) {
        let mut session =
            BoardSession::new(Arc::clone(&self.store), project_id.clone(), self.sequence.clone());

        if let Err(error) = session.load().await {
            tracing::error!(project_id = %project_id, error = %error, "failed to load board");
            self.state.backend_connected = false;
            self.state.error(format!("Could not load tasks: {}", error));
            return;
        }

        self.state.backend_connected = true;
        self.state.board.reset(session.board());
        self.drag = DragController::new();
        self.session = Some(session);
        self.state.select_project(project_id);
    }

    /// Drop the board session once its in-flight moves are answered, so a
    /// late failure still reaches the footer.
    async fn close_board(&mut self) {
        self.drag.cancel();
        let Some(mut session) = self.session.take() else {
            return;
        };
        if session.pending() == 0 {
            return;
        }

        tracing::info!(pending = session.pending(), "waiting for in-flight moves");
        match tokio::time::timeout(SETTLE_TIMEOUT, session.settle()).await {
            Ok(reports) => {
                for report in reports {
                    self.apply_report(report);
                }
            }
            Err(_) => {
                tracing::warn!(pending = session.pending(), "gave up waiting for the store");
                self.state
                    .error("Some moves were still saving when the board closed");
            }
        }
    }

    async fn resync(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.resync().await {
            Ok(()) => {
                self.state.backend_connected = true;
                self.state.info("Board reloaded");
            }
            Err(error) => {
                self.state.backend_connected = false;
                self.state.error(format!("Reload failed: {}", error));
            }
        }
        self.clamp_view();
    }

    fn pick_up(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let Some(task) = self.state.board.selected_task(session.board()) else {
            return;
        };

        match self.drag.begin(task.id.clone()) {
            Ok(()) => self.state.board.start_hover(),
            Err(error) => self.state.error(error.to_string()),
        }
    }

    fn drop_card(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let target = self.state.board.drop_target(session.board());
        self.state.board.end_hover();

        let outcome = self.drag.end(target, session.board(), |_, to| {
            self.state.info(format!("Moved to {}", to.label()));
        });

        match outcome {
            DragOutcome::Moved(mv) => {
                let task_id = mv.task_id.clone();
                session.request_move(mv);
                self.state.board.select_task(session.board(), &task_id);
            }
            DragOutcome::NoOp(NoOpReason::TaskNotOnBoard) => {
                self.state.error("That task is no longer on the board");
            }
            DragOutcome::NoOp(_) | DragOutcome::Cancelled => {}
        }
    }

    fn step(&mut self, direction: StepDirection) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(task) = self.state.board.selected_task(session.board()) else {
            return;
        };
        let task_id = task.id.clone();

        let stepped = DragController::step(direction, &task_id, session.board(), |_, to| {
            self.state.info(format!("Moved to {}", to.label()));
        });

        match stepped {
            Some(mv) => {
                session.request_move(mv);
                self.state.board.select_task(session.board(), &task_id);
            }
            None => {
                let edge = match direction {
                    StepDirection::Forward => "last",
                    StepDirection::Backward => "first",
                };
                self.state.info(format!("Already at the {} status", edge));
            }
        }
    }

    async fn create_task(&mut self, terminal: &mut Terminal) -> Result<()> {
        if self.session.is_none() {
            return Ok(());
        }

        terminal.suspend()?;
        let draft = editor::draft_task();
        terminal.resume()?;

        match draft {
            Ok(Some(draft)) => self.create_from_draft(draft).await,
            Ok(None) => self.state.info("Nothing saved, no task created"),
            Err(error) => self.state.error(format!("Editor failed: {:#}", error)),
        }
        Ok(())
    }

    async fn create_from_draft(&mut self, draft: TaskDraft) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let mut new = NewTask::new(session.project_id(), draft.title);
        new.description = draft.description;

        match session.create_task(new).await {
            Ok(task) => {
                self.state.board.select_task(session.board(), &task.id);
                self.state.info(format!("Created {}", task.code));
            }
            Err(error) => self.state.error(format!("Could not create task: {}", error)),
        }
    }

    async fn delete_task(&mut self, task_id: &str) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match session.delete_task(task_id).await {
            Ok(()) => self.state.info("Task deleted"),
            Err(error) => self.state.error(format!("Could not delete task: {}", error)),
        }
        self.clamp_view();
    }
}

#[cfg(test)]
mod tests {
    use kanban::{MemoryTaskStore, Task, TaskStatus};

    use super::*;
    use crate::demo::{PROJECT_ID, demo_store};
    use crate::state::NoticeKind;

    async fn demo_app() -> (App<MemoryTaskStore>, Arc<MemoryTaskStore>) {
        let store = Arc::new(demo_store(StatusSequence::standard()));
        let app = App::new(
            Arc::clone(&store),
            StatusSequence::standard(),
            Some(PROJECT_ID.to_string()),
        )
        .await;
        (app, store)
    }

    fn session(app: &App<MemoryTaskStore>) -> &BoardSession<MemoryTaskStore> {
        app.session.as_ref().unwrap()
    }

    fn select_code(app: &mut App<MemoryTaskStore>, code: &str) -> String {
        let session = app.session.as_ref().unwrap();
        let task = session
            .board()
            .sequence()
            .iter()
            .flat_map(|s| session.board().bucket(s).iter())
            .find(|t| t.code == code)
            .unwrap();
        let id = task.id.clone();
        app.state.board.select_task(session.board(), &id);
        id
    }

    #[tokio::test]
    async fn test_opens_configured_project() {
        let (app, _) = demo_app().await;
        assert_eq!(app.state.view, View::Kanban);
        assert_eq!(app.state.projects.projects.len(), 2);
        assert_eq!(session(&app).board().total(), 7);
        assert_eq!(session(&app).board().excluded().len(), 1);
    }

    #[tokio::test]
    async fn test_drag_to_next_column_persists() {
        let (mut app, store) = demo_app().await;
        let id = select_code(&mut app, "T006"); // Open

        app.handle_action(Action::PickUp).await;
        assert_eq!(app.drag.dragging(), Some(id.as_str()));

        app.handle_action(Action::Right).await;
        app.handle_action(Action::Drop).await;

        assert!(!app.drag.is_dragging());
        assert_eq!(session(&app).board().status_of(&id), Some(&TaskStatus::S0));
        assert_eq!(app.state.board.selected_task(session(&app).board()).unwrap().id, id);

        app.session.as_mut().unwrap().settle().await;
        assert_eq!(store.get(&id).unwrap().status, TaskStatus::S0);
    }

    #[tokio::test]
    async fn test_cancel_leaves_task_in_place() {
        let (mut app, store) = demo_app().await;
        let id = select_code(&mut app, "T003"); // S1

        app.handle_action(Action::PickUp).await;
        app.handle_action(Action::Right).await;
        app.handle_action(Action::CancelDrag).await;

        assert!(!app.drag.is_dragging());
        assert_eq!(app.state.board.hover, None);
        assert_eq!(session(&app).pending(), 0);
        assert_eq!(store.get(&id).unwrap().status, TaskStatus::S1);
    }

    #[tokio::test]
    async fn test_step_forward_and_disabled_at_end() {
        let (mut app, _) = demo_app().await;
        let id = select_code(&mut app, "T001"); // Completed

        app.handle_action(Action::StepForward).await;
        assert_eq!(session(&app).pending(), 0);
        assert_eq!(session(&app).board().status_of(&id), Some(&TaskStatus::Completed));

        app.handle_action(Action::StepBackward).await;
        assert_eq!(session(&app).board().status_of(&id), Some(&TaskStatus::S4));
        assert_eq!(session(&app).pending(), 1);
    }

    #[tokio::test]
    async fn test_failed_move_reverts_and_reports() {
        let (mut app, store) = demo_app().await;
        store.fail_updates(true);
        let id = select_code(&mut app, "T002"); // S0

        app.handle_action(Action::StepForward).await;
        assert_eq!(session(&app).board().status_of(&id), Some(&TaskStatus::S1));

        let reports = app.session.as_mut().unwrap().settle().await;
        for report in reports {
            app.apply_report(report);
        }

        assert_eq!(session(&app).board().status_of(&id), Some(&TaskStatus::S0));
        assert_eq!(app.state.notice.as_ref().unwrap().kind, NoticeKind::Error);
    }

    #[tokio::test]
    async fn test_delete_goes_through_confirmation() {
        let (mut app, store) = demo_app().await;
        let id = select_code(&mut app, "T004");

        app.handle_action(Action::DeleteTask).await;
        assert_eq!(app.state.modal, Some(Modal::DeleteConfirm(id.clone())));

        app.handle_action(Action::Confirm).await;
        assert_eq!(app.state.modal, None);
        assert!(store.get(&id).is_none());
        assert!(session(&app).board().find(&id).is_none());
    }

    #[tokio::test]
    async fn test_created_task_lands_in_first_column() {
        let (mut app, _) = demo_app().await;
        app.create_from_draft(TaskDraft {
            title: "Coordinate crane base".to_string(),
            description: None,
        })
        .await;

        let board = session(&app).board();
        let created = app.state.board.selected_task(board).unwrap();
        assert_eq!(created.title, "Coordinate crane base");
        assert_eq!(created.status, TaskStatus::Open);
        assert_eq!(app.state.board.selected_column, 0);
    }

    #[tokio::test]
    async fn test_leaving_board_reports_failed_move() {
        let (mut app, store) = demo_app().await;
        store.fail_updates(true);
        let id = select_code(&mut app, "T002"); // S0

        app.handle_action(Action::StepForward).await;
        app.handle_action(Action::Back).await;

        assert_eq!(app.state.view, View::Projects);
        assert!(app.session.is_none());
        assert_eq!(app.state.notice.as_ref().unwrap().kind, NoticeKind::Error);
        assert_eq!(store.get(&id).unwrap().status, TaskStatus::S0);
    }

    #[tokio::test]
    async fn test_back_closes_board() {
        let (mut app, _) = demo_app().await;
        app.handle_action(Action::Back).await;
        assert_eq!(app.state.view, View::Projects);
        assert!(app.session.is_none());

        app.handle_action(Action::Select).await;
        assert_eq!(app.state.view, View::Kanban);
    }

    #[tokio::test]
    async fn test_project_without_tasks_shows_empty_board() {
        let store = Arc::new(MemoryTaskStore::with_tasks(
            StatusSequence::standard(),
            Vec::new(),
            vec![Task::new("x", "T001", "orphan", TaskStatus::Open)],
        ));
        let app = App::new(store, StatusSequence::standard(), Some("missing".to_string())).await;
        assert_eq!(session(&app).board().total(), 0);
    }
}
