use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;
use rand::distr::Alphanumeric;

use super::decorator::{ChromeAction, DefaultDecorator, WindowDecorator, classify_target};
use super::{
    Callback, ContentBinder, GeometrySnapshot, PopupId, PopupInstance, PopupOptions, WindowState,
};
use crate::config::ManagerConfig;
use crate::constants::{attrs, classes};
use crate::dom::style::{GEOMETRY_PROPS, StyleProp, parse_px, px};
use crate::dom::{Document, NodeId};
use crate::error::PopupError;
use crate::events::{EventBus, PopupEvent};
use crate::geometry::{PixelRect, Point, Size};
use crate::input::{KeyInput, PointerEvent, PointerKind};
use crate::layout::{
    ChromeLayout, DragSession, PointerSession, ResizeSession, apply_resize, clamp_drag_position,
    minimized_offset, repack_minimized,
};
use crate::scheduler::Scheduler;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Task {
    /// Entrance transition, applied on the second frame after open.
    Enter {
        popup: PopupId,
        generation: u64,
        frame: u8,
    },
    /// Hide and reset a popup once its exit transition has run.
    Teardown { popup: PopupId, generation: u64 },
}

#[derive(Debug, Clone, Default)]
struct Registration {
    options: PopupOptions,
    spawned: bool,
}

/// Owns every popup's lifecycle, window state, pointer session and stacking
/// order on top of a [`Document`].
///
/// All mutation happens synchronously inside the public calls; deferred work
/// (entrance frames, teardown after the exit transition) is queued on an
/// internal [`Scheduler`] and runs from [`PopupManager::tick`].
pub struct PopupManager {
    document: Document,
    config: ManagerConfig,
    registry: BTreeMap<PopupId, Registration>,
    // keyed by container node; entries are dropped on teardown and on reopen
    instances: BTreeMap<NodeId, PopupInstance>,
    // bumped on every open/close so stale scheduled tasks can be recognized
    generations: BTreeMap<PopupId, u64>,
    session: Option<PointerSession>,
    scroll_locks: BTreeSet<PopupId>,
    // bottom to top, side panels excluded
    z_order: Vec<PopupId>,
    scheduler: Scheduler<Task>,
    events: EventBus,
    binders: Vec<Box<dyn ContentBinder>>,
    decorator: Arc<dyn WindowDecorator>,
}

impl PopupManager {
    pub fn new(document: Document) -> Self {
        Self::with_config(document, ManagerConfig::default())
    }

    pub fn with_config(document: Document, config: ManagerConfig) -> Self {
        Self {
            document,
            config,
            registry: BTreeMap::new(),
            instances: BTreeMap::new(),
            generations: BTreeMap::new(),
            session: None,
            scroll_locks: BTreeSet::new(),
            z_order: Vec::new(),
            scheduler: Scheduler::new(),
            events: EventBus::with_capacity(config.event_queue_capacity),
            binders: Vec::new(),
            decorator: Arc::new(DefaultDecorator),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.document.set_viewport(viewport);
    }

    /// Virtual time elapsed through [`PopupManager::tick`].
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn on_event(&mut self, listener: impl FnMut(&PopupEvent) + 'static) {
        self.events.subscribe(Box::new(listener));
    }

    /// Drains the queued lifecycle events. Only the newest
    /// `event_queue_capacity` are kept between calls.
    pub fn take_events(&mut self) -> Vec<PopupEvent> {
        self.events.take()
    }

    pub fn add_content_binder(&mut self, binder: impl ContentBinder + 'static) {
        self.binders.push(Box::new(binder));
    }

    /// Advances the clock and runs due teardowns and animation frames.
    pub fn tick(&mut self, elapsed: Duration) {
        for task in self.scheduler.advance(elapsed) {
            self.run_task(task);
        }
    }

    pub fn has_pending_work(&self) -> bool {
        self.scheduler.has_pending()
    }

    // ----- registry ---------------------------------------------------------

    /// Stores `options` for `id`, replacing whatever was registered before.
    pub fn register(&mut self, id: &str, options: PopupOptions) {
        self.registry.entry(PopupId::from(id)).or_default().options = options;
        tracing::debug!(popup = id, "registered popup");
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.registry.contains_key(&PopupId::from(id))
    }

    pub fn registered_ids(&self) -> Vec<PopupId> {
        self.registry.keys().cloned().collect()
    }

    pub fn options(&self, id: &str) -> Option<&PopupOptions> {
        self.registry.get(&PopupId::from(id)).map(|r| &r.options)
    }

    fn is_spawned(&self, id: &PopupId) -> bool {
        self.registry.get(id).is_some_and(|r| r.spawned)
    }

    // ----- lifecycle --------------------------------------------------------

    pub fn open(&mut self, id: &str, content: Option<&str>, options: Option<PopupOptions>) {
        if let Err(err) = self.try_open(&PopupId::from(id), content, options) {
            tracing::error!(error = %err, "open failed");
        }
    }

    pub fn close(&mut self, id: &str) {
        if let Err(err) = self.try_close(&PopupId::from(id)) {
            tracing::error!(error = %err, "close failed");
        }
    }

    /// Closes every registered popup; each one runs its own teardown timer.
    pub fn close_all(&mut self) {
        for id in self.registered_ids() {
            self.close(id.as_str());
        }
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.document
            .get_element_by_id(id)
            .is_some_and(|overlay| self.overlay_open(overlay))
    }

    pub fn set_title(&mut self, id: &str, title: &str) {
        let overlay = match self.overlay(&PopupId::from(id)) {
            Ok(overlay) => overlay,
            Err(err) => {
                tracing::error!(error = %err, "set_title failed");
                return;
            }
        };
        if let Some(node) = self.document.query_class(overlay, classes::TITLE) {
            self.document.set_text(node, title);
        }
    }

    /// Runs `callback` when the confirm button is pressed, then closes.
    pub fn on_confirm(&mut self, id: &str, callback: impl Fn() + 'static) {
        let popup = PopupId::from(id);
        if let Err(err) = self.overlay(&popup) {
            tracing::error!(error = %err, "on_confirm failed");
            return;
        }
        let callback: Callback = Rc::new(callback);
        self.registry.entry(popup).or_default().options.on_confirm = Some(callback);
    }

    /// Runs `callback` when the cancel or close button is pressed, then
    /// closes.
    pub fn on_cancel(&mut self, id: &str, callback: impl Fn() + 'static) {
        self.bind_cancel(id, Some(Rc::new(callback)));
    }

    /// Drops the cancel callback; cancel and close then only close.
    pub fn clear_on_cancel(&mut self, id: &str) {
        self.bind_cancel(id, None);
    }

    fn bind_cancel(&mut self, id: &str, callback: Option<Callback>) {
        let popup = PopupId::from(id);
        if let Err(err) = self.overlay(&popup) {
            tracing::error!(error = %err, "on_cancel failed");
            return;
        }
        self.registry.entry(popup).or_default().options.on_cancel = callback;
    }

    /// Clones the `template_id` popup into a new instance, opens it and
    /// returns the instance id.
    pub fn open_multi(
        &mut self,
        template_id: &str,
        content: Option<&str>,
        options: Option<PopupOptions>,
    ) -> Option<PopupId> {
        match self.try_open_multi(template_id, content, options) {
            Ok(id) => Some(id),
            Err(err) => {
                tracing::error!(error = %err, "open_multi failed");
                None
            }
        }
    }

    fn overlay(&self, id: &PopupId) -> Result<NodeId, PopupError> {
        self.document
            .get_element_by_id(id.as_str())
            .ok_or_else(|| PopupError::PopupNotFound(id.to_string()))
    }

    fn resolve(&self, id: &PopupId) -> Result<(NodeId, NodeId), PopupError> {
        let overlay = self.overlay(id)?;
        let container = self
            .document
            .query_class(overlay, classes::CONTAINER)
            .ok_or_else(|| PopupError::MissingContainer(id.to_string()))?;
        Ok((overlay, container))
    }

    fn is_side(&self, overlay: NodeId) -> bool {
        self.document.has_class(overlay, classes::SIDE)
    }

    fn overlay_open(&self, overlay: NodeId) -> bool {
        self.document.has_class(overlay, classes::ACTIVE)
            && !self.document.has_class(overlay, classes::EXITING)
    }

    fn bump_generation(&mut self, id: &PopupId) -> u64 {
        let generation = self.generations.entry(id.clone()).or_insert(0);
        *generation = generation.wrapping_add(1);
        *generation
    }

    fn is_current(&self, id: &PopupId, generation: u64) -> bool {
        self.generations.get(id) == Some(&generation)
    }

    fn try_open(
        &mut self,
        id: &PopupId,
        content: Option<&str>,
        options: Option<PopupOptions>,
    ) -> Result<(), PopupError> {
        let (overlay, container) = self.resolve(id)?;
        let side = self.is_side(overlay);

        self.cancel_session_for(container);
        let was_minimized = self
            .instances
            .get(&container)
            .is_some_and(|instance| instance.state.is_minimized());
        self.reset_container(container);
        if was_minimized && self.is_spawned(id) {
            self.repack_minimized_siblings();
        }

        if let Some(markup) = content
            && let Some(area) = self.document.query_class(container, classes::CONTENT)
        {
            self.document.set_markup(area, markup);
            self.bind_content(id, area);
        }

        let registration = self.registry.entry(id.clone()).or_default();
        if let Some(options) = options {
            registration.options = options.merged_over(&registration.options);
        }
        let effective = registration.options.clone();
        self.document.set_attribute(
            overlay,
            attrs::CLOSE_ON_BACKDROP,
            effective.closes_on_backdrop().to_string(),
        );
        self.document.set_attribute(
            overlay,
            attrs::ALLOW_BACKGROUND,
            effective.allows_background().to_string(),
        );
        if effective.allows_background() {
            self.scroll_locks.remove(id);
        } else {
            self.scroll_locks.insert(id.clone());
        }
        self.sync_scroll_lock();

        let generation = self.bump_generation(id);
        self.document.set_style(overlay, StyleProp::Display, "flex");
        self.document.remove_class(overlay, classes::EXITING);
        self.document.remove_class(overlay, classes::ENTERING);
        self.document.add_class(overlay, classes::ACTIVE);

        if !side {
            self.scheduler.request_animation_frame(Task::Enter {
                popup: id.clone(),
                generation,
                frame: 1,
            });
            self.bring_to_front(id);
            if let Some(header) = self.document.query_class(container, classes::HEADER) {
                self.document.set_style(header, StyleProp::Cursor, "move");
            }
        }

        self.instances
            .insert(container, PopupInstance::new(id.clone()));
        if effective.is_resizable() {
            self.decorator.attach_controls(&mut self.document, container);
        } else {
            self.decorator.detach_controls(&mut self.document, container);
        }
        self.decorator
            .project_state(&mut self.document, container, WindowState::Normal);

        tracing::debug!(popup = %id, side, resizable = effective.is_resizable(), "opened popup");
        self.events.dispatch(PopupEvent::Opened(id.clone()));
        Ok(())
    }

    fn try_close(&mut self, id: &PopupId) -> Result<(), PopupError> {
        let (overlay, container) = self.resolve(id)?;
        if !self.overlay_open(overlay) {
            tracing::debug!(popup = %id, "close ignored: popup not open");
            return Ok(());
        }
        self.cancel_session_for(container);

        let generation = self.bump_generation(id);
        self.document.remove_class(overlay, classes::ENTERING);
        self.document.add_class(overlay, classes::EXITING);
        if self.is_side(overlay) {
            self.document.remove_class(overlay, classes::ACTIVE);
        }
        self.scheduler.set_timeout(
            self.config.transition,
            Task::Teardown {
                popup: id.clone(),
                generation,
            },
        );
        tracing::debug!(popup = %id, "closing popup");
        Ok(())
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::Enter {
                popup,
                generation,
                frame,
            } => {
                if !self.is_current(&popup, generation) {
                    return;
                }
                if frame < 2 {
                    self.scheduler.request_animation_frame(Task::Enter {
                        popup,
                        generation,
                        frame: frame + 1,
                    });
                } else if let Ok(overlay) = self.overlay(&popup) {
                    self.document.add_class(overlay, classes::ENTERING);
                }
            }
            Task::Teardown { popup, generation } => {
                if self.is_current(&popup, generation) {
                    self.teardown(&popup);
                } else {
                    tracing::debug!(popup = %popup, "teardown superseded by reopen");
                }
            }
        }
    }

    fn teardown(&mut self, id: &PopupId) {
        let (overlay, container) = match self.resolve(id) {
            Ok(nodes) => nodes,
            Err(err) => {
                tracing::debug!(error = %err, "teardown skipped");
                return;
            }
        };
        let was_minimized = self
            .instances
            .get(&container)
            .is_some_and(|instance| instance.state.is_minimized());

        for class in [classes::ACTIVE, classes::EXITING, classes::ENTERING] {
            self.document.remove_class(overlay, class);
        }
        self.document.set_style(overlay, StyleProp::Display, "none");
        self.document.remove_style(overlay, StyleProp::ZIndex);
        self.reset_container(container);
        self.decorator.detach_controls(&mut self.document, container);
        if let Some(header) = self.document.query_class(container, classes::HEADER) {
            self.document.remove_style(header, StyleProp::Cursor);
            self.document.remove_style(header, StyleProp::UserSelect);
        }

        self.scroll_locks.remove(id);
        self.sync_scroll_lock();
        self.z_order.retain(|z| z != id);
        self.sync_z_order();

        if self.is_spawned(id) {
            self.document.remove(overlay);
            self.registry.remove(id);
            self.generations.remove(id);
            if was_minimized {
                self.repack_minimized_siblings();
            }
        }
        tracing::debug!(popup = %id, "closed popup");
        self.events.dispatch(PopupEvent::Closed(id.clone()));
    }

    /// Puts the container back to its stylesheet geometry and forgets its
    /// window state.
    fn reset_container(&mut self, container: NodeId) {
        for prop in GEOMETRY_PROPS {
            self.document.remove_style(container, prop);
        }
        self.document.remove_style(container, StyleProp::Transform);
        self.document.remove_style(container, StyleProp::Transition);
        self.document.remove_class(container, classes::MINIMIZED);
        self.document.remove_class(container, classes::MAXIMIZED);
        self.instances.remove(&container);
    }

    fn bind_content(&mut self, id: &PopupId, area: NodeId) {
        for binder in self.binders.iter_mut() {
            binder.bind(&mut self.document, id, area);
        }
    }

    fn sync_scroll_lock(&mut self) {
        let body = self.document.body();
        if self.scroll_locks.is_empty() {
            self.document.remove_style(body, StyleProp::Overflow);
        } else {
            self.document.set_style(body, StyleProp::Overflow, "hidden");
        }
    }

    /// True while at least one open popup blocks page scrolling.
    pub fn scroll_locked(&self) -> bool {
        !self.scroll_locks.is_empty()
    }

    // ----- multi-instance ---------------------------------------------------

    fn try_open_multi(
        &mut self,
        template_id: &str,
        content: Option<&str>,
        options: Option<PopupOptions>,
    ) -> Result<PopupId, PopupError> {
        let template = PopupId::from(template_id);
        let source = self
            .document
            .get_element_by_id(template_id)
            .ok_or_else(|| PopupError::TemplateNotFound(template_id.to_string()))?;
        let instance = self.generate_instance_id(&template);
        let clone = self
            .document
            .deep_clone(source)
            .ok_or_else(|| PopupError::TemplateNotFound(template_id.to_string()))?;
        if self.document.query_class(clone, classes::CONTAINER).is_none() {
            self.document.remove(clone);
            return Err(PopupError::MissingContainer(template_id.to_string()));
        }
        self.namespace_ids(clone, &instance);
        self.scrub_clone(clone);
        let parent = self
            .document
            .element(source)
            .and_then(|el| el.parent())
            .unwrap_or(self.document.body());
        self.document.append_child(parent, clone);

        let inherited = self
            .registry
            .get(&template)
            .map(|r| r.options.clone())
            .unwrap_or_default();
        let base = PopupOptions {
            on_confirm: inherited.on_confirm,
            on_cancel: inherited.on_cancel,
            ..PopupOptions::new()
                .resizable(true)
                .allow_background_interaction(true)
        };
        let options = options.unwrap_or_default().merged_over(&base);
        self.registry.insert(
            instance.clone(),
            Registration {
                options,
                spawned: true,
            },
        );
        if content.is_none()
            && let Some(area) = self.document.query_class(clone, classes::CONTENT)
        {
            self.bind_content(&instance, area);
        }

        if let Err(err) = self.try_open(&instance, content, None) {
            self.document.remove(clone);
            self.registry.remove(&instance);
            self.generations.remove(&instance);
            return Err(err);
        }
        tracing::debug!(template = template_id, popup = %instance, "spawned popup instance");
        Ok(instance)
    }

    fn generate_instance_id(&self, template: &PopupId) -> PopupId {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        loop {
            let suffix: String = rand::rng()
                .sample_iter(Alphanumeric)
                .take(6)
                .map(|b| char::from(b).to_ascii_lowercase())
                .collect();
            let id = PopupId::from(format!("{template}-{millis}-{suffix}"));
            if !self.registry.contains_key(&id)
                && self.document.get_element_by_id(id.as_str()).is_none()
            {
                return id;
            }
        }
    }

    /// Gives the clone root the instance id and namespaces every other id
    /// under it, repointing `label[for]` references to match.
    fn namespace_ids(&mut self, clone: NodeId, instance: &PopupId) {
        let nodes = self.document.subtree(clone);
        let mut renamed = BTreeMap::new();
        for node in &nodes {
            let Some(old) = self.document.id_of(*node).map(str::to_string) else {
                continue;
            };
            let new = if *node == clone {
                instance.to_string()
            } else {
                format!("{instance}-{old}")
            };
            self.document.set_attribute(*node, "id", new.clone());
            renamed.insert(old, new);
        }
        for node in &nodes {
            let target = self
                .document
                .attribute(*node, "for")
                .and_then(|old| renamed.get(old))
                .cloned();
            if let Some(target) = target {
                self.document.set_attribute(*node, "for", target);
            }
        }
    }

    /// Strips open-state leftovers copied from a template that was visible.
    fn scrub_clone(&mut self, clone: NodeId) {
        for class in [classes::ACTIVE, classes::EXITING, classes::ENTERING] {
            self.document.remove_class(clone, class);
        }
        self.document.set_style(clone, StyleProp::Display, "none");
        self.document.remove_style(clone, StyleProp::ZIndex);
        if let Some(container) = self.document.query_class(clone, classes::CONTAINER) {
            for prop in GEOMETRY_PROPS {
                self.document.remove_style(container, prop);
            }
            self.document.remove_class(container, classes::MINIMIZED);
            self.document.remove_class(container, classes::MAXIMIZED);
            self.decorator.detach_controls(&mut self.document, container);
        }
    }

    // ----- stacking ---------------------------------------------------------

    fn bring_to_front(&mut self, id: &PopupId) {
        if self.z_order.last() == Some(id) {
            return;
        }
        self.z_order.retain(|z| z != id);
        self.z_order.push(id.clone());
        self.sync_z_order();
    }

    fn sync_z_order(&mut self) {
        for (idx, id) in self.z_order.iter().enumerate() {
            if let Some(overlay) = self.document.get_element_by_id(id.as_str()) {
                let z = self.config.base_z_index + idx as i32;
                self.document
                    .set_style(overlay, StyleProp::ZIndex, z.to_string());
            }
        }
    }

    /// Stacked popups, bottom to top.
    pub fn stacking_order(&self) -> &[PopupId] {
        &self.z_order
    }

    pub fn z_index(&self, id: &str) -> Option<i32> {
        let overlay = self.document.get_element_by_id(id)?;
        self.document
            .style(overlay, StyleProp::ZIndex)
            .and_then(|z| z.parse().ok())
    }

    /// Visible popups in paint order: side panels first, then the stack.
    pub fn paint_order(&self) -> Vec<PopupId> {
        let displayed = |id: &PopupId| {
            self.document
                .get_element_by_id(id.as_str())
                .is_some_and(|overlay| self.document.is_displayed(overlay))
        };
        let mut order: Vec<PopupId> = self
            .registry
            .keys()
            .filter(|id| !self.z_order.contains(*id) && displayed(*id))
            .cloned()
            .collect();
        order.extend(self.z_order.iter().filter(|id| displayed(*id)).cloned());
        order
    }

    // ----- window state -----------------------------------------------------

    pub fn window_state(&self, id: &str) -> Option<WindowState> {
        let (_, container) = self.resolve(&PopupId::from(id)).ok()?;
        self.instances.get(&container).map(|instance| instance.state)
    }

    pub fn minimize(&mut self, id: &str) {
        match self.resolve(&PopupId::from(id)) {
            Ok((_, container)) => self.minimize_container(container),
            Err(err) => tracing::error!(error = %err, "minimize failed"),
        }
    }

    pub fn toggle_maximize(&mut self, id: &str) {
        match self.resolve(&PopupId::from(id)) {
            Ok((_, container)) => self.toggle_maximize_container(container),
            Err(err) => tracing::error!(error = %err, "toggle_maximize failed"),
        }
    }

    pub fn restore(&mut self, id: &str) {
        match self.resolve(&PopupId::from(id)) {
            Ok((_, container)) => self.restore_container(container),
            Err(err) => tracing::error!(error = %err, "restore failed"),
        }
    }

    fn minimize_container(&mut self, container: NodeId) {
        let rank = self
            .instances
            .iter()
            .filter(|(node, instance)| {
                **node != container
                    && instance.state.is_minimized()
                    && self.is_spawned(&instance.popup)
            })
            .count();
        let Some(instance) = self.instances.get_mut(&container) else {
            tracing::debug!("minimize ignored: popup not open");
            return;
        };
        let was_maximized = match instance.state {
            WindowState::Minimized { .. } => return,
            WindowState::Normal => false,
            WindowState::Maximized => true,
        };
        instance
            .original
            .get_or_insert_with(|| GeometrySnapshot::capture(&self.document, container));
        instance.state = WindowState::Minimized { was_maximized };
        let popup = instance.popup.clone();
        let rank = if self.is_spawned(&popup) { rank } else { 0 };

        self.cancel_session_for(container);
        let size = self.config.minimized_size;
        let doc = &mut self.document;
        doc.set_style(container, StyleProp::Position, "fixed");
        doc.set_style(container, StyleProp::Width, px(size.width));
        doc.set_style(container, StyleProp::Height, px(size.height));
        doc.remove_style(container, StyleProp::Left);
        doc.remove_style(container, StyleProp::Top);
        doc.set_style(container, StyleProp::Right, px(self.config.stack_base));
        doc.set_style(
            container,
            StyleProp::Bottom,
            px(minimized_offset(rank, &self.config)),
        );
        doc.set_style(container, StyleProp::Margin, "0");
        doc.set_style(container, StyleProp::Transform, "none");
        self.decorator.project_state(
            &mut self.document,
            container,
            WindowState::Minimized { was_maximized },
        );
        tracing::debug!(popup = %popup, rank, was_maximized, "minimized popup");
    }

    fn restore_container(&mut self, container: NodeId) {
        let Some(instance) = self.instances.get_mut(&container) else {
            return;
        };
        if !instance.state.is_minimized() {
            return;
        }
        let snapshot = instance.original.take();
        instance.state = WindowState::Normal;
        let popup = instance.popup.clone();
        self.apply_snapshot(container, snapshot);
        self.decorator
            .project_state(&mut self.document, container, WindowState::Normal);
        if self.is_spawned(&popup) {
            self.repack_minimized_siblings();
        }
        tracing::debug!(popup = %popup, "restored popup");
    }

    fn toggle_maximize_container(&mut self, container: NodeId) {
        let Some(instance) = self.instances.get_mut(&container) else {
            tracing::debug!("maximize ignored: popup not open");
            return;
        };
        let state = instance.state;
        match state {
            WindowState::Minimized { .. } => self.restore_container(container),
            WindowState::Normal => {
                instance
                    .original
                    .get_or_insert_with(|| GeometrySnapshot::capture(&self.document, container));
                instance.state = WindowState::Maximized;
                let popup = instance.popup.clone();
                self.cancel_session_for(container);
                let doc = &mut self.document;
                doc.set_style(container, StyleProp::Position, "fixed");
                doc.set_style(container, StyleProp::Left, "0");
                doc.set_style(container, StyleProp::Top, "0");
                doc.remove_style(container, StyleProp::Right);
                doc.remove_style(container, StyleProp::Bottom);
                doc.set_style(container, StyleProp::Width, "100vw");
                doc.set_style(container, StyleProp::Height, "100vh");
                doc.set_style(container, StyleProp::Margin, "0");
                doc.set_style(container, StyleProp::Transform, "none");
                self.decorator
                    .project_state(&mut self.document, container, WindowState::Maximized);
                tracing::debug!(popup = %popup, "maximized popup");
            }
            WindowState::Maximized => {
                let snapshot = instance.original.take();
                instance.state = WindowState::Normal;
                let popup = instance.popup.clone();
                self.apply_snapshot(container, snapshot);
                self.decorator
                    .project_state(&mut self.document, container, WindowState::Normal);
                tracing::debug!(popup = %popup, "unmaximized popup");
            }
        }
    }

    fn apply_snapshot(&mut self, container: NodeId, snapshot: Option<GeometrySnapshot>) {
        match snapshot {
            Some(snapshot) => snapshot.apply(&mut self.document, container),
            None => {
                for prop in GEOMETRY_PROPS {
                    self.document.remove_style(container, prop);
                }
                self.document.remove_style(container, StyleProp::Transform);
            }
        }
    }

    fn repack_minimized_siblings(&mut self) {
        let entries: Vec<(NodeId, i32)> = self
            .instances
            .iter()
            .filter(|(_, instance)| {
                instance.state.is_minimized() && self.is_spawned(&instance.popup)
            })
            .map(|(node, _)| {
                let bottom = self
                    .document
                    .style(*node, StyleProp::Bottom)
                    .and_then(parse_px)
                    .unwrap_or(0);
                (*node, bottom)
            })
            .collect();
        for (node, bottom) in repack_minimized(&entries, &self.config) {
            self.document.set_style(node, StyleProp::Bottom, px(bottom));
        }
    }

    // ----- pointer sessions -------------------------------------------------

    pub fn session(&self) -> Option<&PointerSession> {
        self.session.as_ref()
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        match event.kind {
            PointerKind::Down => event
                .target
                .is_some_and(|target| self.pointer_down(target, event.position)),
            PointerKind::Move => self.pointer_move(event.position),
            PointerKind::Up => self.end_session(),
            PointerKind::Click => event.target.is_some_and(|target| self.click(target)),
            PointerKind::DoubleClick => event
                .target
                .is_some_and(|target| self.double_click(target)),
        }
    }

    pub fn handle_key(&mut self, key: KeyInput) -> bool {
        match key {
            KeyInput::Escape => {
                self.close_all();
                true
            }
            KeyInput::Other => false,
        }
    }

    /// Overlay, popup id and container of the open popup `target` belongs to.
    fn open_popup_of(&self, target: NodeId) -> Option<(NodeId, PopupId, Option<NodeId>)> {
        let overlay = self.document.closest_class(target, classes::OVERLAY)?;
        if !self.overlay_open(overlay) {
            return None;
        }
        let id = PopupId::from(self.document.id_of(overlay)?);
        let container = self.document.closest_class(target, classes::CONTAINER);
        Some((overlay, id, container))
    }

    fn pointer_down(&mut self, target: NodeId, position: Point) -> bool {
        let Some((overlay, id, Some(container))) = self.open_popup_of(target) else {
            return false;
        };
        let side = self.is_side(overlay);
        if !side {
            self.bring_to_front(&id);
        }
        match classify_target(&self.document, target) {
            ChromeAction::Resize => self.begin_resize(id, container, position),
            ChromeAction::Drag if !side => self.begin_drag(id, container, position),
            _ => {}
        }
        true
    }

    fn state_of(&self, container: NodeId) -> Option<WindowState> {
        self.instances.get(&container).map(|instance| instance.state)
    }

    fn begin_drag(&mut self, popup: PopupId, container: NodeId, pointer: Point) {
        if self.state_of(container) != Some(WindowState::Normal) {
            return;
        }
        let Some(rect) = self.document.bounding_rect(container) else {
            return;
        };
        self.end_session();
        let doc = &mut self.document;
        doc.set_style(container, StyleProp::Position, "fixed");
        doc.set_style(container, StyleProp::Margin, "0");
        doc.set_style(container, StyleProp::Left, px(rect.x));
        doc.set_style(container, StyleProp::Top, px(rect.y));
        doc.set_style(container, StyleProp::Transform, "none");
        doc.set_style(container, StyleProp::Transition, "none");
        if let Some(header) = doc.query_class(container, classes::HEADER) {
            doc.set_style(header, StyleProp::UserSelect, "none");
        }
        tracing::debug!(popup = %popup, x = rect.x, y = rect.y, "drag started");
        self.session = Some(PointerSession::Drag(DragSession {
            popup,
            target: container,
            pointer_offset: pointer - rect.origin(),
        }));
    }

    fn begin_resize(&mut self, popup: PopupId, container: NodeId, pointer: Point) {
        if self.state_of(container) != Some(WindowState::Normal) {
            return;
        }
        let Some(rect) = self.document.bounding_rect(container) else {
            return;
        };
        self.end_session();
        let doc = &mut self.document;
        if doc.style(container, StyleProp::Position) != Some("fixed") {
            doc.set_style(container, StyleProp::Position, "fixed");
            doc.set_style(container, StyleProp::Margin, "0");
            doc.set_style(container, StyleProp::Left, px(rect.x));
            doc.set_style(container, StyleProp::Top, px(rect.y));
            doc.set_style(container, StyleProp::Transform, "none");
        }
        doc.set_style(container, StyleProp::Transition, "none");
        tracing::debug!(popup = %popup, width = rect.width, height = rect.height, "resize started");
        self.session = Some(PointerSession::Resize(ResizeSession {
            popup,
            target: container,
            start_size: rect.size(),
            start_pointer: pointer,
        }));
    }

    fn pointer_move(&mut self, pointer: Point) -> bool {
        match self.session.clone() {
            Some(PointerSession::Drag(drag)) => {
                let Some(rect) = self.document.bounding_rect(drag.target) else {
                    self.session = None;
                    return false;
                };
                let pos = clamp_drag_position(
                    pointer,
                    drag.pointer_offset,
                    rect.size(),
                    self.document.viewport(),
                );
                self.document
                    .set_style(drag.target, StyleProp::Left, px(pos.x));
                self.document
                    .set_style(drag.target, StyleProp::Top, px(pos.y));
                true
            }
            Some(PointerSession::Resize(resize)) => {
                let size = apply_resize(
                    resize.start_size,
                    resize.start_pointer,
                    pointer,
                    self.config.min_size,
                );
                self.document
                    .set_style(resize.target, StyleProp::Width, px(size.width));
                self.document
                    .set_style(resize.target, StyleProp::Height, px(size.height));
                true
            }
            None => false,
        }
    }

    /// Ends the active drag or resize, if any.
    fn end_session(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        let target = session.target();
        self.document.remove_style(target, StyleProp::Transition);
        if let PointerSession::Drag(_) = session
            && let Some(header) = self.document.query_class(target, classes::HEADER)
        {
            self.document.remove_style(header, StyleProp::UserSelect);
        }
        tracing::debug!(popup = %session.popup(), "pointer session ended");
        true
    }

    fn cancel_session_for(&mut self, container: NodeId) {
        if self
            .session
            .as_ref()
            .is_some_and(|session| session.target() == container)
        {
            self.end_session();
        }
    }

    fn click(&mut self, target: NodeId) -> bool {
        if self.document.has_class(target, classes::OVERLAY) {
            let Some(id) = self.document.id_of(target).map(PopupId::from) else {
                return false;
            };
            if self.overlay_open(target)
                && self.document.attribute(target, attrs::CLOSE_ON_BACKDROP) == Some("true")
            {
                self.close(id.as_str());
                return true;
            }
            return false;
        }
        let Some((_, id, container)) = self.open_popup_of(target) else {
            return false;
        };
        match classify_target(&self.document, target) {
            ChromeAction::Close | ChromeAction::Cancel => {
                let callback = self
                    .registry
                    .get(&id)
                    .and_then(|r| r.options.on_cancel.clone());
                if let Some(callback) = callback {
                    callback();
                }
                self.close(id.as_str());
                true
            }
            ChromeAction::Confirm => {
                let callback = self
                    .registry
                    .get(&id)
                    .and_then(|r| r.options.on_confirm.clone());
                if let Some(callback) = callback {
                    callback();
                }
                self.close(id.as_str());
                true
            }
            ChromeAction::Minimize => {
                if let Some(container) = container {
                    self.minimize_container(container);
                }
                true
            }
            ChromeAction::Maximize => {
                if let Some(container) = container {
                    self.toggle_maximize_container(container);
                }
                true
            }
            _ => false,
        }
    }

    fn double_click(&mut self, target: NodeId) -> bool {
        let Some((_, _, Some(container))) = self.open_popup_of(target) else {
            return false;
        };
        if classify_target(&self.document, target) != ChromeAction::Drag {
            return false;
        }
        if !self
            .state_of(container)
            .is_some_and(|state| state.is_minimized())
        {
            return false;
        }
        self.restore_container(container);
        true
    }

    // ----- hit testing ------------------------------------------------------

    /// Viewport box of a popup's container. Side panels without inline
    /// geometry are docked to the right edge at full height.
    pub fn container_rect(&self, id: &str) -> Option<PixelRect> {
        let (overlay, container) = self.resolve(&PopupId::from(id)).ok()?;
        self.container_box(overlay, container)
    }

    fn container_box(&self, overlay: NodeId, container: NodeId) -> Option<PixelRect> {
        if self.is_side(overlay)
            && self
                .document
                .style(container, StyleProp::Position)
                .is_none()
        {
            let vp = self.document.viewport();
            let rect = self.document.bounding_rect(container)?;
            return Some(PixelRect::new(vp.width - rect.width, 0, rect.width, vp.height));
        }
        self.document.bounding_rect(container)
    }

    /// Chrome layout of the popup's container as currently displayed.
    pub fn chrome_layout(&self, id: &str) -> Option<ChromeLayout> {
        let (overlay, container) = self.resolve(&PopupId::from(id)).ok()?;
        let rect = self.container_box(overlay, container)?;
        let has_footer = self
            .document
            .query_class(container, classes::FOOTER)
            .is_some_and(|footer| self.document.is_displayed(footer));
        Some(ChromeLayout::for_container(
            rect,
            &self.config.chrome,
            has_footer,
        ))
    }

    /// Element under `point`, searching visible popups from the top down.
    ///
    /// Overlays that allow background interaction let the pointer through;
    /// `None` means the page beneath every popup was hit.
    pub fn hit_test(&self, point: Point) -> Option<NodeId> {
        for id in self.paint_order().iter().rev() {
            let Ok((overlay, container)) = self.resolve(id) else {
                continue;
            };
            if let Some(layout) = self.chrome_layout(id.as_str())
                && layout.container.contains(point)
            {
                return Some(self.chrome_target(container, &layout, point));
            }
            if self.document.attribute(overlay, attrs::ALLOW_BACKGROUND) != Some("true") {
                return Some(overlay);
            }
        }
        None
    }

    fn chrome_target(&self, container: NodeId, layout: &ChromeLayout, point: Point) -> NodeId {
        let visible = |class: &str| {
            self.document
                .query_class(container, class)
                .filter(|node| self.document.is_displayed(*node))
        };
        let hit = |class: &str, rect: PixelRect| visible(class).filter(|_| rect.contains(point));

        if let Some(node) = hit(classes::RESIZE_HANDLE, layout.resize_handle) {
            return node;
        }
        if layout.header.contains(point) {
            return hit(classes::CLOSE, layout.close)
                .or_else(|| hit(classes::MAXIMIZE, layout.maximize))
                .or_else(|| hit(classes::MINIMIZE, layout.minimize))
                .or_else(|| visible(classes::HEADER))
                .unwrap_or(container);
        }
        if layout.footer.contains(point) {
            return hit(classes::CONFIRM, layout.confirm)
                .or_else(|| hit(classes::CANCEL, layout.cancel))
                .or_else(|| visible(classes::FOOTER))
                .unwrap_or(container);
        }
        hit(classes::CONTENT, layout.content).unwrap_or(container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::PopupTemplate;

    fn manager() -> PopupManager {
        let mut doc = Document::new(Size::new(1200, 800));
        PopupTemplate::new("p1").title("One").build(&mut doc);
        PopupTemplate::new("tmpl")
            .field("email", "Email")
            .size(500, 400)
            .build(&mut doc);
        PopupTemplate::new("sidePopup").side().build(&mut doc);
        let mut wm = PopupManager::new(doc);
        wm.register("p1", PopupOptions::new());
        wm.register("tmpl", PopupOptions::new());
        wm.register("sidePopup", PopupOptions::new());
        wm
    }

    #[test]
    fn entrance_class_waits_two_frames() {
        let mut wm = manager();
        wm.open("p1", None, None);
        let overlay = wm.document().get_element_by_id("p1").unwrap();
        assert!(wm.document().has_class(overlay, classes::ACTIVE));
        assert!(!wm.document().has_class(overlay, classes::ENTERING));
        wm.tick(Duration::from_millis(16));
        assert!(!wm.document().has_class(overlay, classes::ENTERING));
        wm.tick(Duration::from_millis(16));
        assert!(wm.document().has_class(overlay, classes::ENTERING));
    }

    #[test]
    fn side_panel_skips_entrance_and_stacking() {
        let mut wm = manager();
        wm.open("sidePopup", None, None);
        wm.tick(Duration::from_millis(16));
        wm.tick(Duration::from_millis(16));
        let overlay = wm.document().get_element_by_id("sidePopup").unwrap();
        assert!(!wm.document().has_class(overlay, classes::ENTERING));
        assert!(wm.stacking_order().is_empty());
        wm.close("sidePopup");
        // active drops immediately for the slide-out
        assert!(!wm.document().has_class(overlay, classes::ACTIVE));
        assert!(wm.document().has_class(overlay, classes::EXITING));
    }

    #[test]
    fn close_before_entrance_frames_skips_entering() {
        let mut wm = manager();
        wm.open("p1", None, None);
        wm.close("p1");
        wm.tick(Duration::from_millis(16));
        wm.tick(Duration::from_millis(16));
        let overlay = wm.document().get_element_by_id("p1").unwrap();
        assert!(!wm.document().has_class(overlay, classes::ENTERING));
    }

    #[test]
    fn reopen_cancels_pending_teardown() {
        let mut wm = manager();
        wm.open("p1", None, None);
        wm.close("p1");
        wm.tick(Duration::from_millis(100));
        wm.open("p1", None, None);
        wm.tick(Duration::from_millis(300));
        assert!(wm.is_open("p1"));
        let overlay = wm.document().get_element_by_id("p1").unwrap();
        assert!(wm.document().is_displayed(overlay));
        assert!(wm.scroll_locked());
    }

    #[test]
    fn instance_ids_are_namespaced_and_labels_follow() {
        let mut wm = manager();
        let id = wm.open_multi("tmpl", None, None).unwrap();
        let input_id = format!("{id}-email");
        let input = wm.document().get_element_by_id(&input_id);
        assert!(input.is_some());
        let overlay = wm.document().get_element_by_id(id.as_str()).unwrap();
        let label = wm
            .document()
            .subtree(overlay)
            .into_iter()
            .find(|n| wm.document().element(*n).unwrap().tag() == "label")
            .unwrap();
        assert_eq!(
            wm.document().attribute(label, "for"),
            Some(input_id.as_str())
        );
        assert!(id.as_str().starts_with("tmpl-"));
    }

    #[test]
    fn spawned_instances_default_to_resizable_and_non_blocking() {
        let mut wm = manager();
        let id = wm.open_multi("tmpl", None, None).unwrap();
        let opts = wm.options(id.as_str()).unwrap();
        assert!(opts.is_resizable());
        assert!(opts.allows_background());
        assert!(!wm.scroll_locked());
        let overlay = wm.document().get_element_by_id(id.as_str()).unwrap();
        assert!(
            wm.document()
                .query_class(overlay, classes::RESIZE_HANDLE)
                .is_some()
        );

        let blocking = wm
            .open_multi(
                "tmpl",
                None,
                Some(PopupOptions::new().allow_background_interaction(false)),
            )
            .unwrap();
        assert!(!wm.options(blocking.as_str()).unwrap().allows_background());
        assert!(wm.scroll_locked());
    }

    #[test]
    fn spawned_registration_is_pruned_after_close() {
        let mut wm = manager();
        let id = wm.open_multi("tmpl", None, None).unwrap();
        wm.close(id.as_str());
        assert!(wm.is_registered(id.as_str()));
        wm.tick(Duration::from_millis(300));
        assert!(!wm.is_registered(id.as_str()));
        assert!(wm.document().get_element_by_id(id.as_str()).is_none());
        assert!(wm.instances.is_empty());
    }

    #[test]
    fn missing_template_yields_none() {
        let mut wm = manager();
        assert_eq!(wm.open_multi("nope", None, None), None);
    }

    #[test]
    fn close_during_resize_ends_session() {
        let mut wm = manager();
        wm.open("p1", None, Some(PopupOptions::new().resizable(true)));
        let overlay = wm.document().get_element_by_id("p1").unwrap();
        let handle = wm
            .document()
            .query_class(overlay, classes::RESIZE_HANDLE)
            .unwrap();
        assert!(wm.handle_pointer(PointerEvent::down(handle, 890, 590)));
        assert!(matches!(wm.session(), Some(PointerSession::Resize(_))));
        wm.close("p1");
        assert!(wm.session().is_none());
        assert!(!wm.handle_pointer(PointerEvent::moved(1000, 700)));
    }

    #[test]
    fn new_session_replaces_old_one() {
        let mut wm = manager();
        wm.open("p1", None, None);
        let id = wm.open_multi("tmpl", None, None).unwrap();
        let header_of = |wm: &PopupManager, id: &str| {
            let overlay = wm.document().get_element_by_id(id).unwrap();
            wm.document().query_class(overlay, classes::HEADER).unwrap()
        };
        let first = header_of(&wm, "p1");
        let second = header_of(&wm, id.as_str());
        wm.handle_pointer(PointerEvent::down(first, 310, 210));
        wm.handle_pointer(PointerEvent::down(second, 360, 210));
        let Some(PointerSession::Drag(drag)) = wm.session() else {
            panic!("expected drag session");
        };
        assert_eq!(drag.popup, id);
        let first_container = wm.document().closest_class(first, classes::CONTAINER).unwrap();
        assert_eq!(
            wm.document().style(first_container, StyleProp::Transition),
            None
        );
    }
}
