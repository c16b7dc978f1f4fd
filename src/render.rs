//! Draws the popup document onto a ratatui buffer, one cell per
//! [`CellScale`] block of viewport pixels.

use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Clear, Paragraph, Widget, Wrap};

use crate::constants::{attrs, classes};
use crate::dom::{Document, NodeId};
use crate::geometry::{PixelRect, Size};
use crate::input::CellScale;
use crate::theme;
use crate::window::{PopupId, PopupManager};

const RESIZE_GLYPH: &str = "◢";
const HELP: &[&str] = &[
    "popup-wm demo",
    "",
    "  o  open the blank popup        b  open the form popup",
    "  l  open the list popup         n  spawn a window instance",
    "  s  toggle the side panel",
    "  Esc  close every popup         q  quit",
    "",
    "Drag headers to move, drag the corner to resize,",
    "double-click a minimized header to restore it.",
];

/// Smallest cell rectangle covering `rect`, clipped to `area`.
pub fn pixel_to_cells(rect: PixelRect, scale: CellScale, area: Rect) -> Option<Rect> {
    let x0 = rect.x.div_euclid(scale.width);
    let y0 = rect.y.div_euclid(scale.height);
    let x1 = (rect.right() + scale.width - 1).div_euclid(scale.width);
    let y1 = (rect.bottom() + scale.height - 1).div_euclid(scale.height);
    let left = x0.max(area.x as i32);
    let top = y0.max(area.y as i32);
    let right = x1.min(area.right() as i32);
    let bottom = y1.min(area.bottom() as i32);
    if left >= right || top >= bottom {
        return None;
    }
    Some(Rect::new(
        left as u16,
        top as u16,
        (right - left) as u16,
        (bottom - top) as u16,
    ))
}

/// Text content of opaque markup, one entry per paragraph or line break.
pub fn strip_tags(markup: &str) -> String {
    let mut out = String::new();
    let mut tag: Option<String> = None;
    for c in markup.chars() {
        match (&mut tag, c) {
            (None, '<') => tag = Some(String::new()),
            (None, _) => out.push(c),
            (Some(name), '>') => {
                let name = name.trim_start_matches('/').to_ascii_lowercase();
                if (name.starts_with('p') || name.starts_with("br") || name.starts_with("div"))
                    && !out.ends_with('\n')
                    && !out.is_empty()
                {
                    out.push('\n');
                }
                tag = None;
            }
            (Some(name), _) => name.push(c),
        }
    }
    out.trim().to_string()
}

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    scale: CellScale,
}

impl Renderer {
    pub fn new(scale: CellScale) -> Self {
        Self { scale }
    }

    pub fn scale(&self) -> CellScale {
        self.scale
    }

    /// The part of the terminal popups live in; the last row is the status line.
    pub fn popup_area(area: Rect) -> Rect {
        Rect::new(area.x, area.y, area.width, area.height.saturating_sub(1))
    }

    /// Pixel viewport matching `area`.
    pub fn viewport_for(&self, area: Rect) -> Size {
        let popups = Self::popup_area(area);
        Size::new(
            popups.width as i32 * self.scale.width,
            popups.height as i32 * self.scale.height,
        )
    }

    pub fn draw(&self, frame: &mut Frame<'_>, manager: &PopupManager, log_line: Option<&str>) {
        let area = frame.area();
        self.render(frame.buffer_mut(), area, manager, log_line);
    }

    pub fn render(
        &self,
        buf: &mut Buffer,
        area: Rect,
        manager: &PopupManager,
        log_line: Option<&str>,
    ) {
        let popups = Self::popup_area(area);
        Paragraph::new(HELP.iter().map(|l| Line::from(*l)).collect::<Vec<_>>())
            .style(Style::default().fg(theme::page_fg()))
            .render(popups, buf);
        for id in manager.paint_order() {
            self.render_popup(buf, popups, manager, &id);
        }
        let status = Rect::new(area.x, popups.bottom(), area.width, area.height - popups.height);
        render_status(buf, status, manager, log_line);
    }

    fn render_popup(&self, buf: &mut Buffer, area: Rect, manager: &PopupManager, id: &PopupId) {
        let doc = manager.document();
        let Some(overlay) = doc.get_element_by_id(id.as_str()) else {
            return;
        };
        let Some(container) = doc.query_class(overlay, classes::CONTAINER) else {
            return;
        };
        if doc.attribute(overlay, attrs::ALLOW_BACKGROUND) != Some("true") {
            buf.set_style(area, theme::backdrop());
        }
        let Some(layout) = manager.chrome_layout(id.as_str()) else {
            return;
        };
        let Some(body) = pixel_to_cells(layout.container, self.scale, area) else {
            return;
        };

        let mut base = Style::default().bg(theme::popup_bg()).fg(theme::popup_fg());
        if doc.has_class(overlay, classes::EXITING) {
            base = base.add_modifier(Modifier::DIM);
        }
        Clear.render(body, buf);
        Block::bordered()
            .border_style(Style::default().fg(theme::popup_border()))
            .style(base)
            .render(body, buf);

        let visible = |class: &str| {
            doc.query_class(container, class)
                .filter(|node| doc.is_displayed(*node))
        };

        if let Some(header) = pixel_to_cells(layout.header, self.scale, area) {
            let style = base.bg(theme::header_bg()).fg(theme::header_fg());
            buf.set_style(header, style);
            let title = visible(classes::TITLE)
                .and_then(|node| doc.text(node))
                .unwrap_or_default();
            buf.set_stringn(
                header.x + 1,
                header.y,
                title,
                header.width.saturating_sub(2) as usize,
                style.add_modifier(Modifier::BOLD),
            );
            for (class, rect) in [
                (classes::MINIMIZE, layout.minimize),
                (classes::MAXIMIZE, layout.maximize),
                (classes::CLOSE, layout.close),
            ] {
                if let Some(node) = visible(class)
                    && let Some(cell) = pixel_to_cells(rect, self.scale, header)
                {
                    let glyph = doc.text(node).unwrap_or_default();
                    buf.set_string(cell.x + cell.width / 2, cell.y, glyph, style);
                }
            }
        }

        if let Some(content) = visible(classes::CONTENT)
            && let Some(cells) = pixel_to_cells(layout.content, self.scale, body)
        {
            let inner = Rect::new(
                cells.x + 1,
                cells.y,
                cells.width.saturating_sub(2),
                cells.height,
            );
            Paragraph::new(content_lines(doc, content))
                .style(base)
                .wrap(Wrap { trim: true })
                .render(inner, buf);
        }

        if visible(classes::FOOTER).is_some() {
            for (class, rect, bg) in [
                (classes::CANCEL, layout.cancel, theme::cancel_bg()),
                (classes::CONFIRM, layout.confirm, theme::confirm_bg()),
            ] {
                let Some(node) = visible(class) else {
                    continue;
                };
                let Some(cell) = pixel_to_cells(rect, self.scale, body) else {
                    continue;
                };
                let style = Style::default().bg(bg).fg(theme::button_fg());
                let label = doc.text(node).unwrap_or_default();
                let row = cell.y + cell.height / 2;
                let row_rect = Rect::new(cell.x, row, cell.width, 1);
                buf.set_style(row_rect, style);
                let pad = cell.width.saturating_sub(label.chars().count() as u16) / 2;
                buf.set_stringn(cell.x + pad, row, label, cell.width as usize, style);
            }
        }

        if visible(classes::RESIZE_HANDLE).is_some() && body.width > 0 && body.height > 0 {
            buf.set_string(
                body.right() - 1,
                body.bottom() - 1,
                RESIZE_GLYPH,
                Style::default().fg(theme::resize_handle()),
            );
        }
    }
}

fn content_lines(doc: &Document, content: NodeId) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    if let Some(markup) = doc.markup(content) {
        lines.extend(strip_tags(markup).lines().map(|l| Line::from(l.to_string())));
    }
    let children = doc
        .element(content)
        .map(|el| el.children().to_vec())
        .unwrap_or_default();
    for child in children {
        let Some(el) = doc.element(child) else {
            continue;
        };
        match el.tag() {
            "input" => lines.push(Line::from("[____________________]")),
            _ => {
                let text = el.text();
                if !text.is_empty() {
                    lines.push(Line::from(text.to_string()));
                }
            }
        }
    }
    lines
}

fn render_status(buf: &mut Buffer, area: Rect, manager: &PopupManager, log_line: Option<&str>) {
    if area.height == 0 {
        return;
    }
    let open = manager
        .registered_ids()
        .iter()
        .filter(|id| manager.is_open(id.as_str()))
        .count();
    let minimized = manager
        .registered_ids()
        .iter()
        .filter(|id| {
            manager
                .window_state(id.as_str())
                .is_some_and(|s| s.is_minimized())
        })
        .count();
    let mut text = format!(" open {open} · minimized {minimized}");
    if let Some(session) = manager.session() {
        text.push_str(&format!(" · {:?} {}", kind_of(session), session.popup()));
    }
    if manager.scroll_locked() {
        text.push_str(" · scroll locked");
    }
    if let Some(line) = log_line {
        text.push_str(" │ ");
        text.push_str(line);
    }
    let style = Style::default().bg(theme::status_bg()).fg(theme::status_fg());
    buf.set_style(area, style);
    buf.set_stringn(area.x, area.y, text, area.width as usize, style);
}

#[derive(Debug)]
enum SessionKind {
    Drag,
    Resize,
}

fn kind_of(session: &crate::layout::PointerSession) -> SessionKind {
    match session {
        crate::layout::PointerSession::Drag(_) => SessionKind::Drag,
        crate::layout::PointerSession::Resize(_) => SessionKind::Resize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::PopupTemplate;
    use crate::window::PopupOptions;

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        let mut out = String::new();
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn pixels_map_to_covering_cells() {
        let scale = CellScale::new(10, 20);
        let area = Rect::new(0, 0, 120, 40);
        assert_eq!(
            pixel_to_cells(PixelRect::new(300, 200, 600, 400), scale, area),
            Some(Rect::new(30, 10, 60, 20))
        );
        assert_eq!(
            pixel_to_cells(PixelRect::new(5, 5, 10, 10), scale, area),
            Some(Rect::new(0, 0, 2, 1))
        );
        assert_eq!(
            pixel_to_cells(PixelRect::new(-50, 0, 100, 20), scale, area),
            Some(Rect::new(0, 0, 5, 1))
        );
        assert_eq!(
            pixel_to_cells(PixelRect::new(5000, 0, 10, 10), scale, area),
            None
        );
    }

    #[test]
    fn tags_are_stripped() {
        assert_eq!(strip_tags("<p>Hello <b>there</b></p><p>Bye</p>"), "Hello there\nBye");
        assert_eq!(strip_tags("plain"), "plain");
    }

    #[test]
    fn open_popup_is_drawn_with_title_and_buttons() {
        let mut doc = Document::new(Size::new(1200, 780));
        PopupTemplate::new("p1")
            .title("Greetings")
            .content("<p>Hello</p>")
            .build(&mut doc);
        let mut wm = PopupManager::new(doc);
        wm.register("p1", PopupOptions::new());
        wm.open("p1", None, Some(PopupOptions::new().resizable(true)));

        let area = Rect::new(0, 0, 120, 40);
        let mut buf = Buffer::empty(area);
        Renderer::new(CellScale::new(10, 20)).render(&mut buf, area, &wm, Some("last log"));
        let text = buffer_text(&buf);
        assert!(text.contains("Greetings"));
        assert!(text.contains("Hello"));
        assert!(text.contains("Confirm"));
        assert!(text.contains("Cancel"));
        assert!(text.contains(RESIZE_GLYPH));
        assert!(text.contains("open 1"));
        assert!(text.contains("last log"));
    }

    #[test]
    fn viewport_excludes_status_row() {
        let renderer = Renderer::new(CellScale::new(10, 20));
        assert_eq!(
            renderer.viewport_for(Rect::new(0, 0, 120, 40)),
            Size::new(1200, 780)
        );
    }
}
