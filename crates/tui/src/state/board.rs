use kanban::{DropTarget, Task, TaskBoard};

/// Where the lifted card currently hovers. `card: None` is the column header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hover {
    pub column: usize,
    pub card: Option<usize>,
}

/// Cursor over the board columns, plus the hover position during a drag.
pub struct BoardViewState {
    pub selected_column: usize,
    pub selected_card_per_column: Vec<usize>,
    pub hover: Option<Hover>,
}

impl BoardViewState {
    pub fn new() -> Self {
        Self {
            selected_column: 0,
            selected_card_per_column: Vec::new(),
            hover: None,
        }
    }

    pub fn reset(&mut self, board: &TaskBoard) {
        self.selected_column = 0;
        self.selected_card_per_column = vec![0; board.sequence().len()];
        self.hover = None;
    }

    /// Keep the cursor inside the board after the task list changed.
    pub fn clamp(&mut self, board: &TaskBoard) {
        let columns = board.sequence().len();
        self.selected_card_per_column.resize(columns, 0);
        self.selected_column = self.selected_column.min(columns.saturating_sub(1));

        for (column, card) in self.selected_card_per_column.iter_mut().enumerate() {
            let count = board.bucket_at(column).len();
            *card = (*card).min(count.saturating_sub(1));
        }

        if let Some(hover) = self.hover.as_mut() {
            hover.column = hover.column.min(columns.saturating_sub(1));
            let count = board.bucket_at(hover.column).len();
            hover.card = hover.card.filter(|_| count > 0).map(|c| c.min(count - 1));
        }
    }

    pub fn selected_card(&self) -> usize {
        self.selected_card_per_column
            .get(self.selected_column)
            .copied()
            .unwrap_or(0)
    }

    pub fn selected_task<'a>(&self, board: &'a TaskBoard) -> Option<&'a Task> {
        board.bucket_at(self.selected_column).get(self.selected_card())
    }

    /// Put the cursor on a task, wherever it sits now.
    pub fn select_task(&mut self, board: &TaskBoard, task_id: &str) {
        if let Some((column, row)) = board.position_of(task_id) {
            self.selected_card_per_column.resize(board.sequence().len(), 0);
            self.selected_column = column;
            self.selected_card_per_column[column] = row;
        }
    }

    pub fn select_next_card(&mut self, board: &TaskBoard) {
        let count = board.bucket_at(self.selected_column).len();
        if let Some(card) = self.selected_card_per_column.get_mut(self.selected_column) {
            if *card + 1 < count {
                *card += 1;
            }
        }
    }

    pub fn select_prev_card(&mut self) {
        if let Some(card) = self.selected_card_per_column.get_mut(self.selected_column) {
            *card = card.saturating_sub(1);
        }
    }

    pub fn select_next_column(&mut self, board: &TaskBoard) {
        let columns = board.sequence().len();
        if columns > 0 {
            self.selected_column = (self.selected_column + 1) % columns;
        }
    }

    pub fn select_prev_column(&mut self, board: &TaskBoard) {
        let columns = board.sequence().len();
        self.selected_column = if self.selected_column == 0 {
            columns.saturating_sub(1)
        } else {
            self.selected_column - 1
        };
    }

    /// Start hovering from the card under the cursor.
    pub fn start_hover(&mut self) {
        self.hover = Some(Hover {
            column: self.selected_column,
            card: Some(self.selected_card()),
        });
    }

    pub fn end_hover(&mut self) {
        self.hover = None;
    }

    /// Moving sideways lands on the column header.
    pub fn hover_next_column(&mut self, board: &TaskBoard) {
        let columns = board.sequence().len();
        if let Some(hover) = self.hover.as_mut() {
            if hover.column + 1 < columns {
                hover.column += 1;
                hover.card = None;
            }
        }
    }

    pub fn hover_prev_column(&mut self) {
        if let Some(hover) = self.hover.as_mut() {
            if hover.column > 0 {
                hover.column -= 1;
                hover.card = None;
            }
        }
    }

    pub fn hover_down(&mut self, board: &TaskBoard) {
        if let Some(hover) = self.hover.as_mut() {
            let count = board.bucket_at(hover.column).len();
            hover.card = match hover.card {
                None if count > 0 => Some(0),
                Some(card) if card + 1 < count => Some(card + 1),
                other => other,
            };
        }
    }

    pub fn hover_up(&mut self) {
        if let Some(hover) = self.hover.as_mut() {
            hover.card = match hover.card {
                Some(0) | None => None,
                Some(card) => Some(card - 1),
            };
        }
    }

    /// What a drop right now would land on.
    pub fn drop_target(&self, board: &TaskBoard) -> DropTarget {
        let Some(hover) = self.hover else {
            return DropTarget::Empty;
        };

        let Some(status) = board.sequence().get(hover.column) else {
            return DropTarget::Empty;
        };

        match hover.card.and_then(|card| board.bucket_at(hover.column).get(card)) {
            Some(task) => DropTarget::Task(task.id.clone()),
            None => DropTarget::Column(status.clone()),
        }
    }
}

impl Default for BoardViewState {
    fn default() -> Self {
        Self::new()
    }
}
