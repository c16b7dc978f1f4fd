//! In-memory document the popup manager queries and mutates.
//!
//! Elements live in an arena addressed by [`NodeId`]. Ids are never reused:
//! once a node is removed its slot stays empty, so a stale id can be detected
//! and can never alias a newer element. The manager relies on this to key
//! per-container state by node identity.

pub mod style;
pub mod template;

use std::collections::BTreeMap;

use crate::constants::{DEFAULT_NATURAL_HEIGHT, DEFAULT_NATURAL_WIDTH};
use crate::geometry::{PixelRect, Size};
use style::{Axis, Length, StyleProp};

pub use template::PopupTemplate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    style: BTreeMap<StyleProp, String>,
    text: String,
    markup: Option<String>,
    natural_size: Option<Size>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            style: BTreeMap::new(),
            text: String::new(),
            markup: None,
            natural_size: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn style(&self, prop: StyleProp) -> Option<&str> {
        self.style.get(&prop).map(String::as_str)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn markup(&self) -> Option<&str> {
        self.markup.as_deref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn natural_size(&self) -> Option<Size> {
        self.natural_size
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Option<Element>>,
    body: NodeId,
    viewport: Size,
}

impl Document {
    pub fn new(viewport: Size) -> Self {
        Self {
            nodes: vec![Some(Element::new("body"))],
            body: NodeId(0),
            viewport,
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        self.nodes.get(node.0).and_then(Option::as_ref)
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        self.nodes.get_mut(node.0).and_then(Option::as_mut)
    }

    pub fn exists(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.push(Some(Element::new(tag)));
        NodeId(self.nodes.len() - 1)
    }

    /// Appends `child` to `parent`, detaching it from any previous parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.exists(parent) || !self.exists(child) || self.contains(child, parent) {
            return;
        }
        self.detach(child);
        if let Some(el) = self.element_mut(parent) {
            el.children.push(child);
        }
        if let Some(el) = self.element_mut(child) {
            el.parent = Some(parent);
        }
    }

    /// Inserts `child` into `parent` before `reference`, or appends when the
    /// reference is not one of `parent`'s children.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        if !self.exists(parent) || !self.exists(child) || self.contains(child, parent) {
            return;
        }
        self.detach(child);
        if let Some(el) = self.element_mut(parent) {
            let idx = el
                .children
                .iter()
                .position(|c| *c == reference)
                .unwrap_or(el.children.len());
            el.children.insert(idx, child);
        }
        if let Some(el) = self.element_mut(child) {
            el.parent = Some(parent);
        }
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.element(node).and_then(|el| el.parent) else {
            return;
        };
        if let Some(el) = self.element_mut(parent) {
            el.children.retain(|c| *c != node);
        }
        if let Some(el) = self.element_mut(node) {
            el.parent = None;
        }
    }

    /// Removes `node` and its whole subtree from the document.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.body {
            return;
        }
        self.detach(node);
        for id in self.subtree(node) {
            if let Some(slot) = self.nodes.get_mut(id.0) {
                *slot = None;
            }
        }
    }

    /// `node` and all its descendants in document order.
    pub fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let Some(el) = self.element(id) else {
                continue;
            };
            out.push(id);
            stack.extend(el.children.iter().rev().copied());
        }
        out
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == self.body {
                return true;
            }
            cursor = self.element(id).and_then(|el| el.parent);
        }
        false
    }

    /// True when `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.element(id).and_then(|el| el.parent);
        }
        false
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.subtree(self.body)
            .into_iter()
            .find(|node| self.element(*node).and_then(Element::id) == Some(id))
    }

    /// First descendant of `scope` (excluding `scope`) carrying `class`.
    pub fn query_class(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.subtree(scope)
            .into_iter()
            .skip(1)
            .find(|node| self.has_class(*node, class))
    }

    pub fn query_class_all(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.subtree(scope)
            .into_iter()
            .skip(1)
            .filter(|node| self.has_class(*node, class))
            .collect()
    }

    /// Nearest inclusive ancestor of `node` carrying `class`.
    pub fn closest_class(&self, node: NodeId, class: &str) -> Option<NodeId> {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            let el = self.element(id)?;
            if el.has_class(class) {
                return Some(id);
            }
            cursor = el.parent;
        }
        None
    }

    /// Copies `node`'s subtree into new detached elements and returns the
    /// copy's root.
    pub fn deep_clone(&mut self, node: NodeId) -> Option<NodeId> {
        let mut source = self.element(node)?.clone();
        let children = std::mem::take(&mut source.children);
        source.parent = None;
        self.nodes.push(Some(source));
        let copy = NodeId(self.nodes.len() - 1);
        for child in children {
            if let Some(child_copy) = self.deep_clone(child) {
                self.append_child(copy, child_copy);
            }
        }
        Some(copy)
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attribute(name)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(node) {
            el.attributes.insert(name.to_string(), value.into());
        }
    }

    pub fn id_of(&self, node: NodeId) -> Option<&str> {
        self.element(node)?.id()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).is_some_and(|el| el.has_class(class))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element_mut(node)
            && !el.has_class(class)
        {
            el.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element_mut(node) {
            el.classes.retain(|c| c != class);
        }
    }

    pub fn style(&self, node: NodeId, prop: StyleProp) -> Option<&str> {
        self.element(node)?.style(prop)
    }

    /// Sets an inline style; an empty value removes the property, as
    /// assigning `""` does in a browser.
    pub fn set_style(&mut self, node: NodeId, prop: StyleProp, value: impl Into<String>) {
        let value = value.into();
        if let Some(el) = self.element_mut(node) {
            if value.is_empty() {
                el.style.remove(&prop);
            } else {
                el.style.insert(prop, value);
            }
        }
    }

    pub fn remove_style(&mut self, node: NodeId, prop: StyleProp) {
        if let Some(el) = self.element_mut(node) {
            el.style.remove(&prop);
        }
    }

    pub fn is_displayed(&self, node: NodeId) -> bool {
        self.exists(node) && self.style(node, StyleProp::Display) != Some("none")
    }

    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) {
        if let Some(el) = self.element_mut(node) {
            el.text = text.into();
        }
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        Some(self.element(node)?.text())
    }

    /// Replaces the children of `node` with opaque markup. The markup is
    /// stored verbatim and never interpreted.
    pub fn set_markup(&mut self, node: NodeId, markup: impl Into<String>) {
        let Some(children) = self.element(node).map(|el| el.children.clone()) else {
            return;
        };
        for child in children {
            self.remove(child);
        }
        if let Some(el) = self.element_mut(node) {
            el.markup = Some(markup.into());
        }
    }

    pub fn markup(&self, node: NodeId) -> Option<&str> {
        self.element(node)?.markup()
    }

    pub fn set_natural_size(&mut self, node: NodeId, size: Size) {
        if let Some(el) = self.element_mut(node) {
            el.natural_size = Some(size);
        }
    }

    fn length(&self, node: NodeId, prop: StyleProp, axis: Axis) -> Option<i32> {
        self.style(node, prop)
            .and_then(Length::parse)
            .map(|len| len.resolve(self.viewport, axis))
    }

    /// Resolves the viewport-relative box of a top-level box such as a popup
    /// container.
    ///
    /// Width and height come from inline styles, falling back to the natural
    /// size. `position: fixed` boxes are placed by `left`/`top` or anchored by
    /// `right`/`bottom`; other boxes are centred, shifted by `left`/`top` when
    /// `position: relative`.
    pub fn bounding_rect(&self, node: NodeId) -> Option<PixelRect> {
        let el = self.element(node)?;
        let vp = self.viewport;
        let natural = el
            .natural_size
            .unwrap_or(Size::new(DEFAULT_NATURAL_WIDTH, DEFAULT_NATURAL_HEIGHT));
        let width = self
            .length(node, StyleProp::Width, Axis::Horizontal)
            .unwrap_or(natural.width);
        let height = self
            .length(node, StyleProp::Height, Axis::Vertical)
            .unwrap_or(natural.height);
        let centred_x = (vp.width - width) / 2;
        let centred_y = (vp.height - height) / 2;
        let left = self.length(node, StyleProp::Left, Axis::Horizontal);
        let top = self.length(node, StyleProp::Top, Axis::Vertical);
        let (x, y) = match el.style(StyleProp::Position) {
            Some("fixed") => {
                let x = left
                    .or_else(|| {
                        self.length(node, StyleProp::Right, Axis::Horizontal)
                            .map(|r| vp.width - r - width)
                    })
                    .unwrap_or(centred_x);
                let y = top
                    .or_else(|| {
                        self.length(node, StyleProp::Bottom, Axis::Vertical)
                            .map(|b| vp.height - b - height)
                    })
                    .unwrap_or(centred_y);
                (x, y)
            }
            Some("relative") => (centred_x + left.unwrap_or(0), centred_y + top.unwrap_or(0)),
            _ => (centred_x, centred_y),
        };
        Some(PixelRect::new(x, y, width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::new(Size::new(1000, 800))
    }

    #[test]
    fn removed_ids_are_not_reused() {
        let mut d = doc();
        let a = d.create_element("div");
        d.append_child(d.body(), a);
        d.remove(a);
        let b = d.create_element("div");
        assert_ne!(a, b);
        assert!(!d.exists(a));
    }

    #[test]
    fn lookup_by_id_ignores_detached_nodes() {
        let mut d = doc();
        let a = d.create_element("div");
        d.set_attribute(a, "id", "a");
        assert_eq!(d.get_element_by_id("a"), None);
        d.append_child(d.body(), a);
        assert_eq!(d.get_element_by_id("a"), Some(a));
    }

    #[test]
    fn query_and_closest() {
        let mut d = doc();
        let outer = d.create_element("div");
        let inner = d.create_element("span");
        d.add_class(outer, "box");
        d.add_class(inner, "box");
        d.append_child(d.body(), outer);
        d.append_child(outer, inner);
        assert_eq!(d.query_class(outer, "box"), Some(inner));
        assert_eq!(d.closest_class(inner, "box"), Some(inner));
        d.remove_class(inner, "box");
        assert_eq!(d.closest_class(inner, "box"), Some(outer));
        assert!(d.contains(outer, inner));
        assert!(!d.contains(inner, outer));
    }

    #[test]
    fn remove_frees_subtree() {
        let mut d = doc();
        let outer = d.create_element("div");
        let inner = d.create_element("div");
        d.append_child(d.body(), outer);
        d.append_child(outer, inner);
        d.remove(outer);
        assert!(!d.exists(inner));
        assert!(d.element(d.body()).unwrap().children().is_empty());
    }

    #[test]
    fn deep_clone_copies_attributes_detached() {
        let mut d = doc();
        let outer = d.create_element("div");
        let inner = d.create_element("label");
        d.set_attribute(inner, "for", "x");
        d.append_child(d.body(), outer);
        d.append_child(outer, inner);
        let copy = d.deep_clone(outer).unwrap();
        assert!(!d.is_attached(copy));
        let copied_inner = d.element(copy).unwrap().children()[0];
        assert_ne!(copied_inner, inner);
        assert_eq!(d.attribute(copied_inner, "for"), Some("x"));
    }

    #[test]
    fn empty_style_value_removes_property() {
        let mut d = doc();
        let a = d.create_element("div");
        d.set_style(a, StyleProp::Width, "10px");
        assert_eq!(d.style(a, StyleProp::Width), Some("10px"));
        d.set_style(a, StyleProp::Width, "");
        assert_eq!(d.style(a, StyleProp::Width), None);
    }

    #[test]
    fn bounding_rect_centres_by_default() {
        let mut d = doc();
        let a = d.create_element("div");
        d.set_natural_size(a, Size::new(400, 200));
        assert_eq!(d.bounding_rect(a), Some(PixelRect::new(300, 300, 400, 200)));
    }

    #[test]
    fn bounding_rect_fixed_anchors() {
        let mut d = doc();
        let a = d.create_element("div");
        d.set_style(a, StyleProp::Position, "fixed");
        d.set_style(a, StyleProp::Width, "300px");
        d.set_style(a, StyleProp::Height, "60px");
        d.set_style(a, StyleProp::Right, "20px");
        d.set_style(a, StyleProp::Bottom, "90px");
        assert_eq!(d.bounding_rect(a), Some(PixelRect::new(680, 650, 300, 60)));

        d.set_style(a, StyleProp::Left, "0");
        d.set_style(a, StyleProp::Top, "0");
        d.set_style(a, StyleProp::Width, "100vw");
        d.set_style(a, StyleProp::Height, "100vh");
        assert_eq!(d.bounding_rect(a), Some(PixelRect::new(0, 0, 1000, 800)));
    }

    #[test]
    fn markup_replaces_children() {
        let mut d = doc();
        let a = d.create_element("div");
        let child = d.create_element("p");
        d.append_child(a, child);
        d.set_markup(a, "<p>hi</p>");
        assert!(!d.exists(child));
        assert_eq!(d.markup(a), Some("<p>hi</p>"));
    }
}
