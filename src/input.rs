//! Pointer and keyboard input as the manager understands it, plus the
//! translation from terminal mouse reports.

use std::time::Duration;

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::constants::DOUBLE_CLICK_WINDOW;
use crate::dom::NodeId;
use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Click,
    DoubleClick,
}

/// A pointer event in viewport pixels. `target` is the element under the
/// pointer, `None` when nothing managed is hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub position: Point,
    pub target: Option<NodeId>,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, target: Option<NodeId>, x: i32, y: i32) -> Self {
        Self {
            kind,
            position: Point::new(x, y),
            target,
        }
    }

    pub fn down(target: NodeId, x: i32, y: i32) -> Self {
        Self::new(PointerKind::Down, Some(target), x, y)
    }

    pub fn moved(x: i32, y: i32) -> Self {
        Self::new(PointerKind::Move, None, x, y)
    }

    pub fn up(x: i32, y: i32) -> Self {
        Self::new(PointerKind::Up, None, x, y)
    }

    pub fn click(target: NodeId) -> Self {
        Self::new(PointerKind::Click, Some(target), 0, 0)
    }

    pub fn double_click(target: NodeId) -> Self {
        Self::new(PointerKind::DoubleClick, Some(target), 0, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Escape,
    Other,
}

/// Synthesizes double clicks from single clicks on the same target.
#[derive(Debug, Clone, Default)]
pub struct ClickTracker {
    last: Option<(NodeId, Duration)>,
}

impl ClickTracker {
    /// Records a click at `at`; returns true when it completes a double click.
    pub fn register(&mut self, target: NodeId, at: Duration) -> bool {
        if let Some((prev, prev_at)) = self.last
            && prev == target
            && at.saturating_sub(prev_at) <= DOUBLE_CLICK_WINDOW
        {
            self.last = None;
            return true;
        }
        self.last = Some((target, at));
        false
    }
}

/// Pixel size of one terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellScale {
    pub width: i32,
    pub height: i32,
}

impl CellScale {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Centre of the cell at `column`/`row`, in pixels.
    pub fn cell_center(&self, column: u16, row: u16) -> Point {
        Point::new(
            column as i32 * self.width + self.width / 2,
            row as i32 * self.height + self.height / 2,
        )
    }
}

/// Turns terminal mouse reports into browser-like pointer sequences:
/// press → `Down`, drag → `Move`, release → `Up` followed by `Click` when
/// the release lands on the pressed target, and `DoubleClick` on the second
/// such click in quick succession.
#[derive(Debug, Clone)]
pub struct PointerTranslator {
    scale: CellScale,
    pressed: Option<Option<NodeId>>,
    clicks: ClickTracker,
}

impl PointerTranslator {
    pub fn new(scale: CellScale) -> Self {
        Self {
            scale,
            pressed: None,
            clicks: ClickTracker::default(),
        }
    }

    pub fn scale(&self) -> CellScale {
        self.scale
    }

    pub fn translate<F>(&mut self, mouse: &MouseEvent, now: Duration, hit_test: F) -> Vec<PointerEvent>
    where
        F: Fn(Point) -> Option<NodeId>,
    {
        let pos = self.scale.cell_center(mouse.column, mouse.row);
        let mut out = Vec::new();
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let target = hit_test(pos);
                self.pressed = Some(target);
                out.push(PointerEvent::new(PointerKind::Down, target, pos.x, pos.y));
            }
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                out.push(PointerEvent::new(PointerKind::Move, None, pos.x, pos.y));
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let target = hit_test(pos);
                out.push(PointerEvent::new(PointerKind::Up, target, pos.x, pos.y));
                if let Some(pressed) = self.pressed.take()
                    && pressed == target
                    && let Some(node) = target
                {
                    out.push(PointerEvent::new(PointerKind::Click, target, pos.x, pos.y));
                    if self.clicks.register(node, now) {
                        out.push(PointerEvent::new(
                            PointerKind::DoubleClick,
                            target,
                            pos.x,
                            pos.y,
                        ));
                    }
                }
            }
            _ => {}
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::geometry::Size;
    use crossterm::event::KeyModifiers;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn double_click_requires_same_target_within_window() {
        let mut doc = Document::new(Size::new(10, 10));
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let mut t = ClickTracker::default();
        assert!(!t.register(a, Duration::from_millis(0)));
        assert!(!t.register(b, Duration::from_millis(100)));
        assert!(t.register(b, Duration::from_millis(300)));
        assert!(!t.register(b, Duration::from_millis(2000)));
        assert!(!t.register(b, Duration::from_millis(2600)));
    }

    #[test]
    fn release_on_pressed_target_emits_click() {
        let mut doc = Document::new(Size::new(10, 10));
        let node = doc.create_element("button");
        let mut tr = PointerTranslator::new(CellScale::new(10, 20));
        let down = tr.translate(
            &mouse(MouseEventKind::Down(MouseButton::Left), 2, 1),
            Duration::ZERO,
            |_| Some(node),
        );
        assert_eq!(down.len(), 1);
        assert_eq!(down[0].position, Point::new(25, 30));
        let up = tr.translate(
            &mouse(MouseEventKind::Up(MouseButton::Left), 2, 1),
            Duration::from_millis(10),
            |_| Some(node),
        );
        let kinds: Vec<_> = up.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![PointerKind::Up, PointerKind::Click]);
    }

    #[test]
    fn release_elsewhere_is_not_a_click() {
        let mut doc = Document::new(Size::new(10, 10));
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let mut tr = PointerTranslator::new(CellScale::new(10, 20));
        tr.translate(
            &mouse(MouseEventKind::Down(MouseButton::Left), 0, 0),
            Duration::ZERO,
            |_| Some(a),
        );
        let up = tr.translate(
            &mouse(MouseEventKind::Up(MouseButton::Left), 5, 5),
            Duration::ZERO,
            |_| Some(b),
        );
        assert_eq!(up.len(), 1);
        assert_eq!(up[0].kind, PointerKind::Up);
    }
}
