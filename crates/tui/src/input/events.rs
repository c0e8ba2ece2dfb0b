use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

/// Polls the terminal with a short timeout so the app loop can also
/// drain store confirmations between key presses.
pub struct EventStream {
    tick: Duration,
}

impl EventStream {
    pub fn new() -> Self {
        Self {
            tick: Duration::from_millis(100),
        }
    }

    pub async fn next(&mut self) -> Result<Option<Event>> {
        if event::poll(self.tick)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }
}

impl Default for EventStream {
    fn default() -> Self {
        Self::new()
    }
}

pub fn extract_key_event(event: Event) -> Option<KeyEvent> {
    match event {
        // Windows reports releases too
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(key),
        _ => None,
    }
}
