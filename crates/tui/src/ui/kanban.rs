use chrono::NaiveDate;
use kanban::{Priority, Task, TaskBoard, TaskStatus};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::state::BoardViewState;

pub fn render_kanban_board(
    frame: &mut Frame,
    area: Rect,
    board: &TaskBoard,
    view: &BoardViewState,
    dragging: Option<&str>,
    today: NaiveDate,
) {
    let columns = board.sequence().len().max(1) as u32;
    let constraints: Vec<Constraint> = (0..columns).map(|_| Constraint::Ratio(1, columns)).collect();
    let areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (i, status) in board.sequence().iter().enumerate() {
        let column = ColumnRender {
            index: i,
            status,
            tasks: board.bucket_at(i),
            view,
            dragging,
            today,
        };
        column.render(frame, areas[i]);
    }
}

struct ColumnRender<'a> {
    index: usize,
    status: &'a TaskStatus,
    tasks: &'a [Task],
    view: &'a BoardViewState,
    dragging: Option<&'a str>,
    today: NaiveDate,
}

impl ColumnRender<'_> {
    fn render(&self, frame: &mut Frame, area: Rect) {
        let hover = self.view.hover.filter(|h| h.column == self.index);
        let is_selected = self.view.hover.is_none() && self.view.selected_column == self.index;

        let border_color = if hover.is_some() {
            Color::Yellow
        } else if is_selected {
            Color::Cyan
        } else {
            Color::DarkGray
        };

        let mut title_style = Style::default().add_modifier(Modifier::BOLD);
        if matches!(hover, Some(h) if h.card.is_none()) {
            // Dropping here targets the column itself
            title_style = title_style.bg(Color::Yellow).fg(Color::Black);
        }
        let title = Span::styled(
            format!(" {} ({}) ", self.status.label(), self.tasks.len()),
            title_style,
        );

        let items: Vec<ListItem> = self.tasks.iter().map(|task| self.card(task)).collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(Line::from(title))
                    .border_style(Style::default().fg(border_color)),
            )
            .highlight_style(
                Style::default()
                    .bg(if hover.is_some() { Color::Yellow } else { Color::DarkGray })
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut list_state = ListState::default();
        if let Some(h) = hover {
            list_state.select(h.card);
        } else if is_selected && !self.tasks.is_empty() {
            list_state.select(Some(self.view.selected_card()));
        }

        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn card(&self, task: &Task) -> ListItem<'static> {
        let lifted = self.dragging == Some(task.id.as_str());

        let (priority_icon, priority_color) = match task.priority {
            Priority::High => ("!", Color::Red),
            Priority::Medium => ("-", Color::Yellow),
            Priority::Low => (".", Color::DarkGray),
        };

        let mut head = vec![
            Span::styled(
                format!("{} ", priority_icon),
                Style::default().fg(priority_color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("{} ", task.code), Style::default().fg(Color::Cyan)),
            Span::raw(truncate(&task.title, 40)),
        ];
        if lifted {
            head.insert(0, Span::styled("[lifted] ", Style::default().fg(Color::Yellow)));
        }

        let mut detail = vec![Span::styled(
            format!("  {:>3}%", task.progress),
            Style::default().fg(progress_color(task.progress)),
        )];
        if let Some(assignee) = &task.assignee {
            detail.push(Span::styled(
                format!(" {}", assignee.initials()),
                Style::default().fg(Color::Blue),
            ));
        }
        if let Some(due) = task.due_date {
            let style = if task.is_overdue(self.today) {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            detail.push(Span::styled(format!(" due {}", due.format("%d %b")), style));
        }
        for tag in task.tags.iter().take(3) {
            detail.push(Span::styled(format!(" #{}", tag), Style::default().fg(Color::Magenta)));
        }

        let mut item = ListItem::new(vec![Line::from(head), Line::from(detail)]);
        if lifted {
            item = item.style(Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC));
        }
        item
    }
}

fn progress_color(progress: u8) -> Color {
    match progress {
        100 => Color::Green,
        50..=99 => Color::Yellow,
        _ => Color::Gray,
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
