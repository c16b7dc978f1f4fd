pub mod decorator;

mod popup_manager;

use std::fmt;
use std::rc::Rc;

use crate::dom::style::{GEOMETRY_PROPS, StyleProp};
use crate::dom::{Document, NodeId};

pub use popup_manager::PopupManager;

/// Id of a popup's overlay element.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PopupId(String);

impl PopupId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PopupId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PopupId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for PopupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for PopupId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

pub type Callback = Rc<dyn Fn()>;

/// Per-popup options. Unset fields fall through to whatever they are merged
/// over, and finally to their defaults.
#[derive(Clone, Default)]
pub struct PopupOptions {
    pub close_on_backdrop_click: Option<bool>,
    pub allow_background_interaction: Option<bool>,
    pub resizable: Option<bool>,
    pub on_confirm: Option<Callback>,
    pub on_cancel: Option<Callback>,
}

impl PopupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close_on_backdrop_click(mut self, value: bool) -> Self {
        self.close_on_backdrop_click = Some(value);
        self
    }

    pub fn allow_background_interaction(mut self, value: bool) -> Self {
        self.allow_background_interaction = Some(value);
        self
    }

    pub fn resizable(mut self, value: bool) -> Self {
        self.resizable = Some(value);
        self
    }

    pub fn on_confirm(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_confirm = Some(Rc::new(callback));
        self
    }

    pub fn on_cancel(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_cancel = Some(Rc::new(callback));
        self
    }

    /// `self` layered over `base`: fields set here win.
    pub fn merged_over(&self, base: &PopupOptions) -> PopupOptions {
        PopupOptions {
            close_on_backdrop_click: self.close_on_backdrop_click.or(base.close_on_backdrop_click),
            allow_background_interaction: self
                .allow_background_interaction
                .or(base.allow_background_interaction),
            resizable: self.resizable.or(base.resizable),
            on_confirm: self.on_confirm.clone().or_else(|| base.on_confirm.clone()),
            on_cancel: self.on_cancel.clone().or_else(|| base.on_cancel.clone()),
        }
    }

    pub fn closes_on_backdrop(&self) -> bool {
        self.close_on_backdrop_click.unwrap_or(false)
    }

    pub fn allows_background(&self) -> bool {
        self.allow_background_interaction.unwrap_or(false)
    }

    pub fn is_resizable(&self) -> bool {
        self.resizable.unwrap_or(false)
    }
}

impl fmt::Debug for PopupOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupOptions")
            .field("close_on_backdrop_click", &self.close_on_backdrop_click)
            .field(
                "allow_background_interaction",
                &self.allow_background_interaction,
            )
            .field("resizable", &self.resizable)
            .field("on_confirm", &self.on_confirm.is_some())
            .field("on_cancel", &self.on_cancel.is_some())
            .finish()
    }
}

/// Window state of an open popup. The `minimized`/`maximized` classes on the
/// container are derived from this, never read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowState {
    #[default]
    Normal,
    Minimized {
        was_maximized: bool,
    },
    Maximized,
}

impl WindowState {
    pub fn is_minimized(self) -> bool {
        matches!(self, WindowState::Minimized { .. })
    }

    pub fn is_maximized(self) -> bool {
        matches!(self, WindowState::Maximized)
    }

    pub fn was_maximized(self) -> bool {
        matches!(
            self,
            WindowState::Minimized {
                was_maximized: true
            }
        )
    }
}

/// Inline geometry of a container in its normal state, including the
/// `transform` a drag leaves behind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeometrySnapshot {
    values: Vec<(StyleProp, Option<String>)>,
}

impl GeometrySnapshot {
    pub fn capture(document: &Document, node: NodeId) -> Self {
        Self {
            values: GEOMETRY_PROPS
                .iter()
                .chain(std::iter::once(&StyleProp::Transform))
                .map(|prop| (*prop, document.style(node, *prop).map(str::to_string)))
                .collect(),
        }
    }

    /// Writes every captured field back verbatim, clearing the ones that
    /// were unset.
    pub fn apply(&self, document: &mut Document, node: NodeId) {
        for (prop, value) in &self.values {
            match value {
                Some(v) => document.set_style(node, *prop, v.clone()),
                None => document.remove_style(node, *prop),
            }
        }
    }

    pub fn get(&self, prop: StyleProp) -> Option<&str> {
        self.values
            .iter()
            .find(|(p, _)| *p == prop)
            .and_then(|(_, v)| v.as_deref())
    }
}

/// State the manager keeps for one open container.
#[derive(Debug, Clone)]
pub(crate) struct PopupInstance {
    pub popup: PopupId,
    pub state: WindowState,
    pub original: Option<GeometrySnapshot>,
}

impl PopupInstance {
    fn new(popup: PopupId) -> Self {
        Self {
            popup,
            state: WindowState::Normal,
            original: None,
        }
    }
}

/// Hook run after the manager inserts new markup into a popup, so widgets
/// living in that markup (dropdowns and the like) can bind themselves.
pub trait ContentBinder {
    fn bind(&mut self, document: &mut Document, popup: &PopupId, content: NodeId);
}

impl<F> ContentBinder for F
where
    F: FnMut(&mut Document, &PopupId, NodeId),
{
    fn bind(&mut self, document: &mut Document, popup: &PopupId, content: NodeId) {
        self(document, popup, content)
    }
}
