use super::{BoardViewState, ProjectsState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Projects,
    Kanban,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    Help,
    DeleteConfirm(String), // task_id
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// One-line message shown in the footer until the next key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

pub struct AppState {
    pub view: View,
    pub modal: Option<Modal>,

    pub projects: ProjectsState,
    pub board: BoardViewState,

    pub selected_project_id: Option<String>,

    pub notice: Option<Notice>,
    pub backend_connected: bool,
    pub should_quit: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            view: View::Projects,
            modal: None,

            projects: ProjectsState::new(),
            board: BoardViewState::new(),

            selected_project_id: None,

            notice: None,
            backend_connected: false,
            should_quit: false,
        }
    }

    pub fn select_project(&mut self, project_id: String) {
        self.selected_project_id = Some(project_id);
        self.view = View::Kanban;
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            kind: NoticeKind::Info,
            text: text.into(),
        });
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            kind: NoticeKind::Error,
            text: text.into(),
        });
    }

    pub fn back(&mut self) {
        match self.view {
            View::Projects => {
                self.should_quit = true;
            }
            View::Kanban => {
                self.selected_project_id = None;
                self.board.end_hover();
                self.view = View::Projects;
            }
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
