use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::state::{AppState, NoticeKind, View};

/// Board facts the footer needs but the view state does not own.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoardInfo {
    pub pending: usize,
    pub hidden: usize,
    pub dragging: bool,
}

pub fn render_header(frame: &mut Frame, area: Rect, state: &AppState, spinner_char: char) {
    let title = match &state.selected_project_id {
        Some(id) => {
            let project_name = state.projects.name_of(id).unwrap_or("Unknown");
            format!(" bimboard - {} ", project_name)
        }
        None => " bimboard ".to_string(),
    };

    let status = if state.backend_connected {
        Span::styled(" Connected ", Style::default().fg(Color::Green))
    } else {
        Span::styled(" Disconnected ", Style::default().fg(Color::Red))
    };

    let mut spans = vec![
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" | "),
        status,
    ];
    if spinner_char != ' ' {
        spans.push(Span::styled(
            format!(" [{}] saving", spinner_char),
            Style::default().fg(Color::Yellow),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM));

    frame.render_widget(header, area);
}

pub fn render_footer(frame: &mut Frame, area: Rect, state: &AppState, info: BoardInfo) {
    if let Some(notice) = &state.notice {
        let color = match notice.kind {
            NoticeKind::Info => Color::Green,
            NoticeKind::Error => Color::Red,
        };
        let footer = Paragraph::new(notice.text.as_str())
            .style(Style::default().fg(color))
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(footer, area);
        return;
    }

    let hints = match state.view {
        View::Projects => "j/k: navigate | Enter: open board | r: refresh | q: quit | ?: help".to_string(),
        View::Kanban if info.dragging => {
            "h/j/k/l: choose drop target | Enter/Space: drop | Esc: cancel".to_string()
        }
        View::Kanban => {
            let mut hints =
                "h/j/k/l: nav | Space: lift | </>: step | c: create | d: delete | r: resync | Esc: back"
                    .to_string();
            if info.hidden > 0 {
                hints = format!("{} hidden (unknown status) | {}", info.hidden, hints);
            }
            if info.pending > 0 {
                hints = format!("{} unsaved | {}", info.pending, hints);
            }
            hints
        }
    };

    let footer = Paragraph::new(hints)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP));

    frame.render_widget(footer, area);
}

pub fn render_help_modal(frame: &mut Frame, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(title, Style::default().add_modifier(Modifier::BOLD))])
    };

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Yellow),
        )]),
        Line::from(""),
        section("Navigation"),
        Line::from("  h/j/k/l or arrows  Move around"),
        Line::from("  Enter              Open project"),
        Line::from("  Esc / q            Back / Quit"),
        Line::from(""),
        section("Moving tasks"),
        Line::from("  Space              Lift the selected card"),
        Line::from("  h/j/k/l            Choose card or column to drop on"),
        Line::from("  Enter / Space      Drop"),
        Line::from("  Esc                Cancel the drag"),
        Line::from("  > / <              Step to next / previous status"),
        Line::from(""),
        section("Tasks"),
        Line::from("  c                  Create task ($EDITOR)"),
        Line::from("  d                  Delete task"),
        Line::from("  r                  Resync from the store"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press Esc to close",
            Style::default().fg(Color::DarkGray),
        )]),
    ];

    render_modal(frame, area, " Help ", help_text, 56);
}

pub fn render_delete_modal(frame: &mut Frame, area: Rect, task_label: &str) {
    let lines = vec![
        Line::from(vec![
            Span::raw("Delete "),
            Span::styled(task_label.to_string(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("?"),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "y: delete | n/Esc: keep",
            Style::default().fg(Color::DarkGray),
        )]),
    ];

    render_modal(frame, area, " Delete task ", lines, 60);
}

fn render_modal(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>, width: u16) {
    let modal_width = width.min(area.width);
    let modal_height = (lines.len() as u16 + 2).min(area.height);
    let x = area.x + (area.width.saturating_sub(modal_width)) / 2;
    let y = area.y + (area.height.saturating_sub(modal_height)) / 2;
    let modal_area = Rect::new(x, y, modal_width, modal_height);

    frame.render_widget(Clear, modal_area);

    let modal = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title.to_string())
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(modal, modal_area);
}
