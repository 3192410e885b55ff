use std::time::Duration;
use tracing::trace;

use crate::domain::{DVConfig, DVError, Message};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &DVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, DVError> {
        if !event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(None);
        }
        Ok(self.map_event(model, event::read()?))
    }

    fn map_event(&self, model: &Model, event: Event) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                if model.raw_keyevents() {
                    Some(Message::RawKey(key))
                } else {
                    self.handle_key(key)
                }
            }
            Event::Resize(width, height) => {
                trace!("Resize to {width}x{height}");
                Some(Message::Resize)
            }
            _ => None,
        }
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Esc => Some(Message::Exit),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
            KeyCode::Char('x') => Some(Message::NextX),
            KeyCode::Char('X') => Some(Message::PrevX),
            KeyCode::Char('y') => Some(Message::NextY),
            KeyCode::Char('Y') => Some(Message::PrevY),
            KeyCode::Char('c') => Some(Message::NextChartKind),
            KeyCode::Char('a') | KeyCode::Enter => Some(Message::Analyze),
            KeyCode::Char('o') => Some(Message::Open),
            KeyCode::Char('i') => Some(Message::CopyInsights),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
