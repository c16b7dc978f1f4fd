use super::style::StyleProp;
use super::{Document, NodeId};
use crate::constants::classes;
use crate::geometry::Size;

/// Builds the markup skeleton a popup must provide:
///
/// ```text
/// overlay#id.popup-overlay
/// └── .popup-container
///     ├── .popup-header
///     │   ├── .popup-title
///     │   └── button.popup-close
///     ├── .popup-content
///     └── .popup-footer            (optional)
///         ├── button.popup-cancel-btn
///         └── button.popup-confirm-btn
/// ```
#[derive(Debug, Clone)]
pub struct PopupTemplate {
    id: String,
    title: String,
    content: Option<String>,
    fields: Vec<(String, String)>,
    footer: bool,
    side: bool,
    size: Size,
}

impl PopupTemplate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            content: None,
            fields: Vec::new(),
            footer: true,
            side: false,
            size: Size::new(600, 400),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn content(mut self, markup: impl Into<String>) -> Self {
        self.content = Some(markup.into());
        self
    }

    /// Adds a labelled input; the label's `for` points at the input id.
    pub fn field(mut self, id: impl Into<String>, label: impl Into<String>) -> Self {
        self.fields.push((id.into(), label.into()));
        self
    }

    pub fn footer(mut self, footer: bool) -> Self {
        self.footer = footer;
        self
    }

    /// Marks the popup as the docked side-panel variant.
    pub fn side(mut self) -> Self {
        self.side = true;
        self
    }

    pub fn size(mut self, width: i32, height: i32) -> Self {
        self.size = Size::new(width, height);
        self
    }

    /// Creates the elements under `document.body()` and returns the overlay.
    pub fn build(&self, document: &mut Document) -> NodeId {
        let overlay = element(document, "div", &[classes::OVERLAY]);
        document.set_attribute(overlay, "id", self.id.clone());
        if self.side {
            document.add_class(overlay, classes::SIDE);
        }
        document.set_style(overlay, StyleProp::Display, "none");

        let container = element(document, "div", &[classes::CONTAINER]);
        document.set_natural_size(container, self.size);
        document.append_child(overlay, container);

        let header = element(document, "div", &[classes::HEADER]);
        let title = element(document, "h3", &[classes::TITLE]);
        document.set_text(title, self.title.clone());
        let close = element(document, "button", &[classes::CLOSE]);
        document.set_text(close, "×");
        document.append_child(header, title);
        document.append_child(header, close);
        document.append_child(container, header);

        let content = element(document, "div", &[classes::CONTENT]);
        if let Some(markup) = &self.content {
            document.set_markup(content, markup.clone());
        }
        for (id, text) in &self.fields {
            let label = element(document, "label", &[]);
            document.set_attribute(label, "for", id.clone());
            document.set_text(label, text.clone());
            let input = element(document, "input", &[]);
            document.set_attribute(input, "id", id.clone());
            document.append_child(content, label);
            document.append_child(content, input);
        }
        document.append_child(container, content);

        if self.footer {
            let footer = element(document, "div", &[classes::FOOTER]);
            let cancel = element(document, "button", &[classes::CANCEL]);
            document.set_text(cancel, "Cancel");
            let confirm = element(document, "button", &[classes::CONFIRM]);
            document.set_text(confirm, "Confirm");
            document.append_child(footer, cancel);
            document.append_child(footer, confirm);
            document.append_child(container, footer);
        }

        let body = document.body();
        document.append_child(body, overlay);
        overlay
    }
}

fn element(document: &mut Document, tag: &str, class_list: &[&str]) -> NodeId {
    let node = document.create_element(tag);
    for class in class_list {
        document.add_class(node, class);
    }
    node
}
