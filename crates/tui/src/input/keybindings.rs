use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::Action;
use crate::state::{Modal, View};

pub fn key_to_action(
    key: KeyEvent,
    view: View,
    modal: Option<&Modal>,
    dragging: bool,
) -> Option<Action> {
    // Modal-specific bindings
    if let Some(modal) = modal {
        return match (modal, key.code) {
            (_, KeyCode::Esc) => Some(Action::Back),
            (Modal::DeleteConfirm(_), KeyCode::Char('y') | KeyCode::Enter) => Some(Action::Confirm),
            (Modal::DeleteConfirm(_), KeyCode::Char('n')) => Some(Action::Back),
            _ => None,
        };
    }

    // While a card is lifted only hover movement, drop and cancel apply
    if dragging {
        return drag_bindings(key);
    }

    // Global bindings
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return Some(Action::Quit),
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => return Some(Action::Quit),
        (KeyCode::Char('?'), _) => return Some(Action::ShowHelp),
        (KeyCode::Esc, _) => return Some(Action::Back),
        _ => {}
    }

    // View-specific bindings
    match view {
        View::Projects => project_list_bindings(key),
        View::Kanban => kanban_bindings(key),
    }
}

fn project_list_bindings(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::Up),
        KeyCode::Enter => Some(Action::Select),
        KeyCode::Char('r') => Some(Action::Refresh),
        _ => None,
    }
}

fn kanban_bindings(key: KeyEvent) -> Option<Action> {
    match key.code {
        // Navigation
        KeyCode::Char('j') | KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::Up),
        KeyCode::Char('h') | KeyCode::Left => Some(Action::Left),
        KeyCode::Char('l') | KeyCode::Right => Some(Action::Right),

        // Drag and drop
        KeyCode::Char(' ') => Some(Action::PickUp),

        // Stepper controls
        KeyCode::Char('>') | KeyCode::Char('.') => Some(Action::StepForward),
        KeyCode::Char('<') | KeyCode::Char(',') => Some(Action::StepBackward),

        // Task operations
        KeyCode::Char('c') => Some(Action::CreateTask),
        KeyCode::Char('d') => Some(Action::DeleteTask),

        // Resync
        KeyCode::Char('r') => Some(Action::Refresh),

        _ => None,
    }
}

fn drag_bindings(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::Up),
        KeyCode::Char('h') | KeyCode::Left => Some(Action::Left),
        KeyCode::Char('l') | KeyCode::Right => Some(Action::Right),
        KeyCode::Enter | KeyCode::Char(' ') => Some(Action::Drop),
        KeyCode::Esc | KeyCode::Char('q') => Some(Action::CancelDrag),
        _ => None,
    }
}
