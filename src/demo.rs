//! The terminal playground behind the `popup-demo` binary, kept in the
//! library so its input routing can be exercised without a terminal.

use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use indoc::indoc;
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::config::DemoConfig;
use crate::dom::{Document, PopupTemplate};
use crate::drivers::keyboard::key_input;
use crate::event_loop::ControlFlow;
use crate::geometry::Size;
use crate::input::PointerTranslator;
use crate::log_buffer::LogHandle;
use crate::render::Renderer;
use crate::window::{PopupId, PopupManager, PopupOptions};

pub const BLANK_POPUP: &str = "blankPopup";
pub const FORM_POPUP: &str = "formPopup";
pub const LIST_POPUP: &str = "listPopup";
pub const SIDE_POPUP: &str = "sidePopup";

const LIST_MARKUP: &str = indoc! {"
    <ul>
    <li>Alpha</li><br>
    <li>Beta</li><br>
    <li>Gamma</li>
    </ul>
"};

/// Builds the demo page with its four popup templates.
pub fn build_document(viewport: Size) -> Document {
    let mut doc = Document::new(viewport);
    PopupTemplate::new(BLANK_POPUP)
        .title("Blank popup")
        .content("<p>Nothing here yet.</p>")
        .build(&mut doc);
    PopupTemplate::new(FORM_POPUP)
        .title("Form popup")
        .field("name", "Name")
        .field("email", "Email")
        .size(500, 360)
        .build(&mut doc);
    PopupTemplate::new(LIST_POPUP)
        .title("List popup")
        .content(LIST_MARKUP)
        .size(420, 320)
        .build(&mut doc);
    PopupTemplate::new(SIDE_POPUP)
        .title("Side panel")
        .content("<p>Docked to the right edge.</p>")
        .side()
        .size(360, 400)
        .build(&mut doc);
    doc
}

pub struct DemoApp {
    manager: PopupManager,
    renderer: Renderer,
    translator: PointerTranslator,
    log: Option<LogHandle>,
    spawned: usize,
}

impl DemoApp {
    pub fn new(config: &DemoConfig, terminal_area: Rect, log: Option<LogHandle>) -> Self {
        let renderer = Renderer::new(config.scale);
        let doc = build_document(renderer.viewport_for(terminal_area));
        let mut manager = PopupManager::with_config(doc, config.manager);
        for id in [BLANK_POPUP, FORM_POPUP, LIST_POPUP, SIDE_POPUP] {
            let options = match id {
                FORM_POPUP => PopupOptions::new().resizable(true),
                LIST_POPUP => PopupOptions::new().close_on_backdrop_click(true),
                _ => PopupOptions::new(),
            };
            manager.register(id, options);
            let confirmed = id.to_string();
            manager.on_confirm(id, move || tracing::info!(popup = %confirmed, "confirmed"));
            let cancelled = id.to_string();
            manager.on_cancel(id, move || tracing::info!(popup = %cancelled, "cancelled"));
        }
        manager.on_event(|event| tracing::debug!(event = event.name(), popup = %event.popup_id()));
        Self {
            manager,
            renderer,
            translator: PointerTranslator::new(config.scale),
            log,
            spawned: 0,
        }
    }

    pub fn manager(&self) -> &PopupManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut PopupManager {
        &mut self.manager
    }

    pub fn tick(&mut self, elapsed: Duration) {
        self.manager.tick(elapsed);
    }

    pub fn draw(&self, frame: &mut Frame<'_>) {
        let tail = self.log.as_ref().and_then(|log| log.tail(1).pop());
        self.renderer.draw(frame, &self.manager, tail.as_deref());
    }

    /// Opens another floating window cloned from the blank popup.
    pub fn spawn_window(&mut self) -> Option<PopupId> {
        let id = self.manager.open_multi(BLANK_POPUP, None, None)?;
        self.spawned += 1;
        self.manager
            .set_title(id.as_str(), &format!("Window {}", self.spawned));
        Some(id)
    }

    pub fn handle_event(&mut self, event: Event) -> ControlFlow {
        match event {
            Event::Key(key) => return self.handle_key(key),
            Event::Mouse(mouse) => {
                let manager = &self.manager;
                let pointer_events =
                    self.translator
                        .translate(&mouse, manager.now(), |p| manager.hit_test(p));
                for pointer in pointer_events {
                    self.manager.handle_pointer(pointer);
                }
            }
            Event::Resize(cols, rows) => {
                let viewport = self.renderer.viewport_for(Rect::new(0, 0, cols, rows));
                self.manager.set_viewport(viewport);
            }
            _ => {}
        }
        ControlFlow::Continue
    }

    fn handle_key(&mut self, key: KeyEvent) -> ControlFlow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return ControlFlow::Quit;
        }
        match key.code {
            KeyCode::Char('q') => return ControlFlow::Quit,
            KeyCode::Char('o') => self.manager.open(BLANK_POPUP, None, None),
            KeyCode::Char('b') => self.manager.open(FORM_POPUP, None, None),
            KeyCode::Char('l') => self.manager.open(LIST_POPUP, None, None),
            KeyCode::Char('n') => {
                self.spawn_window();
            }
            KeyCode::Char('s') => {
                if self.manager.is_open(SIDE_POPUP) {
                    self.manager.close(SIDE_POPUP);
                } else {
                    self.manager.open(SIDE_POPUP, None, None);
                }
            }
            _ => {
                self.manager.handle_key(key_input(&key));
            }
        }
        ControlFlow::Continue
    }
}
