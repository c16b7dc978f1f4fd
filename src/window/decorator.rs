use crate::constants::{attrs, classes};
use crate::dom::style::StyleProp;
use crate::dom::{Document, NodeId};
use crate::window::WindowState;

/// What a pointer interaction on a given element means to the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromeAction {
    Close,
    Cancel,
    Confirm,
    Minimize,
    Maximize,
    Resize,
    /// Header area outside any button.
    Drag,
    /// Inside the container but not on chrome.
    Body,
    /// The overlay itself, outside the container.
    Backdrop,
    None,
}

/// Adds, removes and restyles the window chrome of resizable popups.
pub trait WindowDecorator: std::fmt::Debug {
    /// Adds the resize handle and minimize/maximize buttons. Calling it again
    /// on a decorated container changes nothing.
    fn attach_controls(&self, document: &mut Document, container: NodeId);

    fn detach_controls(&self, document: &mut Document, container: NodeId);

    /// Projects `state` onto classes, button visibility and icons.
    fn project_state(&self, document: &mut Document, container: NodeId, state: WindowState);
}

#[derive(Debug, Default)]
pub struct DefaultDecorator;

const MINIMIZE_GLYPH: &str = "–";
const MAXIMIZE_GLYPH: &str = "□";
const RESTORE_GLYPH: &str = "❐";

impl WindowDecorator for DefaultDecorator {
    fn attach_controls(&self, document: &mut Document, container: NodeId) {
        if let Some(header) = document.query_class(container, classes::HEADER)
            && document.query_class(header, classes::CONTROLS).is_none()
        {
            let controls = document.create_element("div");
            document.add_class(controls, classes::CONTROLS);
            let minimize = document.create_element("button");
            document.add_class(minimize, classes::MINIMIZE);
            document.set_text(minimize, MINIMIZE_GLYPH);
            document.set_attribute(minimize, "title", "Minimize");
            let maximize = document.create_element("button");
            document.add_class(maximize, classes::MAXIMIZE);
            document.set_text(maximize, MAXIMIZE_GLYPH);
            document.set_attribute(maximize, attrs::ICON, "maximize");
            document.set_attribute(maximize, "title", "Maximize");
            document.append_child(controls, minimize);
            document.append_child(controls, maximize);
            match document.query_class(header, classes::CLOSE) {
                Some(close) => document.insert_before(header, controls, close),
                None => document.append_child(header, controls),
            }
        }
        if document
            .query_class(container, classes::RESIZE_HANDLE)
            .is_none()
        {
            let handle = document.create_element("div");
            document.add_class(handle, classes::RESIZE_HANDLE);
            document.append_child(container, handle);
        }
    }

    fn detach_controls(&self, document: &mut Document, container: NodeId) {
        for class in [classes::CONTROLS, classes::RESIZE_HANDLE] {
            for node in document.query_class_all(container, class) {
                document.remove(node);
            }
        }
    }

    fn project_state(&self, document: &mut Document, container: NodeId, state: WindowState) {
        set_class(document, container, classes::MINIMIZED, state.is_minimized());
        set_class(document, container, classes::MAXIMIZED, state.is_maximized());

        let minimized = state.is_minimized();
        let content = document.query_class(container, classes::CONTENT);
        let footer = document.query_class(container, classes::FOOTER);
        let handle = document.query_class(container, classes::RESIZE_HANDLE);
        let minimize = document.query_class(container, classes::MINIMIZE);
        set_visible(document, content, !minimized);
        set_visible(document, footer, !minimized);
        set_visible(document, handle, state == WindowState::Normal);
        set_visible(document, minimize, !minimized);

        if let Some(maximize) = document.query_class(container, classes::MAXIMIZE) {
            let (icon, glyph, title) = match state {
                WindowState::Normal => ("maximize", MAXIMIZE_GLYPH, "Maximize"),
                WindowState::Maximized | WindowState::Minimized { .. } => {
                    ("restore", RESTORE_GLYPH, "Restore")
                }
            };
            document.set_attribute(maximize, attrs::ICON, icon);
            document.set_text(maximize, glyph);
            document.set_attribute(maximize, "title", title);
        }
    }
}

fn set_class(document: &mut Document, node: NodeId, class: &str, on: bool) {
    if on {
        document.add_class(node, class);
    } else {
        document.remove_class(node, class);
    }
}

fn set_visible(document: &mut Document, node: Option<NodeId>, visible: bool) {
    if let Some(node) = node {
        document.set_style(node, StyleProp::Display, if visible { "" } else { "none" });
    }
}

/// Classifies `target` by the chrome element it belongs to.
pub fn classify_target(document: &Document, target: NodeId) -> ChromeAction {
    if document.has_class(target, classes::OVERLAY) {
        return ChromeAction::Backdrop;
    }
    for (class, action) in [
        (classes::CLOSE, ChromeAction::Close),
        (classes::CANCEL, ChromeAction::Cancel),
        (classes::CONFIRM, ChromeAction::Confirm),
        (classes::MINIMIZE, ChromeAction::Minimize),
        (classes::MAXIMIZE, ChromeAction::Maximize),
        (classes::RESIZE_HANDLE, ChromeAction::Resize),
    ] {
        if document.closest_class(target, class).is_some() {
            return action;
        }
    }
    if let Some(header) = document.closest_class(target, classes::HEADER) {
        if within_button(document, target, header) {
            return ChromeAction::None;
        }
        return ChromeAction::Drag;
    }
    if document.closest_class(target, classes::CONTAINER).is_some() {
        return ChromeAction::Body;
    }
    ChromeAction::None
}

fn within_button(document: &Document, target: NodeId, stop: NodeId) -> bool {
    let mut cursor = Some(target);
    while let Some(node) = cursor {
        if node == stop {
            return false;
        }
        let Some(el) = document.element(node) else {
            return false;
        };
        if el.tag() == "button" {
            return true;
        }
        cursor = el.parent();
    }
    false
}
