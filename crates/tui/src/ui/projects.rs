use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::state::ProjectsState;

pub fn render_project_list(frame: &mut Frame, area: Rect, state: &ProjectsState) {
    let items: Vec<ListItem> = state
        .projects
        .iter()
        .map(|project| {
            let mut spans = Vec::new();
            if let Some(code) = &project.code {
                spans.push(Span::styled(format!("{} ", code), Style::default().fg(Color::Cyan)));
            }
            spans.push(Span::styled(
                &project.name,
                Style::default().add_modifier(Modifier::BOLD),
            ));
            if let Some(client) = &project.client {
                spans.push(Span::styled(
                    format!(" ({})", client),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Projects ")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    if !state.projects.is_empty() {
        list_state.select(Some(state.selected_index));
    }

    frame.render_stateful_widget(list, area, &mut list_state);
}
