use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};

use crate::input::KeyInput;

/// Filters raw key reports down to one event per physical press.
///
/// Windows consoles report releases and auto-repeat for every key; a held
/// Escape would otherwise close popups opened while it is still down.
#[derive(Debug, Default)]
pub struct KeyboardNormalizer {
    esc_down: bool,
}

impl KeyboardNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(&mut self, evt: Event) -> Option<Event> {
        let Event::Key(key) = evt else {
            return Some(evt);
        };
        match key.kind {
            KeyEventKind::Release => {
                if key.code == KeyCode::Esc {
                    self.esc_down = false;
                }
                return None;
            }
            KeyEventKind::Repeat if key.code == KeyCode::Esc => return None,
            _ => {}
        }
        if key.code == KeyCode::Esc {
            if self.esc_down && cfg!(windows) {
                return None;
            }
            self.esc_down = true;
        } else {
            self.esc_down = false;
        }
        Some(Event::Key(key))
    }
}

/// The manager-level meaning of a key press.
pub fn key_input(key: &KeyEvent) -> KeyInput {
    match key.code {
        KeyCode::Esc => KeyInput::Escape,
        _ => KeyInput::Other,
    }
}
