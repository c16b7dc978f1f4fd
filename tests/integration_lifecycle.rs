use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use popup_wm::constants::{attrs, classes};
use popup_wm::dom::style::{GEOMETRY_PROPS, StyleProp};
use popup_wm::input::{KeyInput, PointerEvent};
use popup_wm::{Document, NodeId, PopupEvent, PopupId, PopupManager, PopupOptions, PopupTemplate};

const TRANSITION: Duration = Duration::from_millis(300);

fn manager() -> PopupManager {
    let mut doc = Document::new(popup_wm::geometry::Size::new(1200, 800));
    PopupTemplate::new("p1").title("First").build(&mut doc);
    PopupTemplate::new("p2").title("Second").build(&mut doc);
    let mut wm = PopupManager::new(doc);
    wm.register("p1", PopupOptions::new());
    wm.register("p2", PopupOptions::new());
    wm
}

fn overlay(wm: &PopupManager, id: &str) -> NodeId {
    wm.document().get_element_by_id(id).expect("overlay")
}

fn part(wm: &PopupManager, id: &str, class: &str) -> NodeId {
    wm.document()
        .query_class(overlay(wm, id), class)
        .expect("chrome element")
}

fn geometry(wm: &PopupManager, id: &str) -> Vec<Option<String>> {
    let container = part(wm, id, classes::CONTAINER);
    GEOMETRY_PROPS
        .iter()
        .map(|prop| wm.document().style(container, *prop).map(str::to_string))
        .collect()
}

#[test]
fn open_then_close_scenario() {
    let mut wm = manager();
    let before = geometry(&wm, "p1");
    let ov = overlay(&wm, "p1");
    let body = wm.document().body();

    wm.open("p1", None, None);
    assert!(wm.document().is_displayed(ov));
    assert!(wm.document().has_class(ov, classes::ACTIVE));
    assert_eq!(wm.document().style(body, StyleProp::Overflow), Some("hidden"));

    wm.close("p1");
    assert_eq!(geometry(&wm, "p1"), before);
    wm.tick(Duration::from_millis(299));
    assert!(wm.document().has_class(ov, classes::EXITING));
    wm.tick(Duration::from_millis(1));
    assert!(!wm.document().is_displayed(ov));
    assert!(!wm.document().has_class(ov, classes::ACTIVE));
    assert!(!wm.document().has_class(ov, classes::EXITING));
    assert_eq!(wm.document().style(body, StyleProp::Overflow), None);
    assert!(geometry(&wm, "p1").iter().all(Option::is_none));
    assert_eq!(wm.window_state("p1"), None);
}

#[test]
fn lifecycle_events_are_published_in_order() {
    let mut wm = manager();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    wm.on_event(move |event| sink.borrow_mut().push(event.name()));
    wm.open("p1", None, None);
    wm.close("p1");
    wm.tick(TRANSITION);
    assert_eq!(*seen.borrow(), vec!["popup:opened", "popup:closed"]);
    assert_eq!(
        wm.take_events(),
        vec![
            PopupEvent::Opened(PopupId::from("p1")),
            PopupEvent::Closed(PopupId::from("p1"))
        ]
    );
    assert!(wm.take_events().is_empty());
}

#[test]
fn unknown_popup_is_a_silent_no_op() {
    let mut wm = manager();
    wm.open("missing", None, None);
    wm.close("missing");
    wm.set_title("missing", "nope");
    wm.minimize("missing");
    wm.toggle_maximize("missing");
    wm.on_confirm("missing", || {});
    assert!(wm.take_events().is_empty());
    assert!(!wm.scroll_locked());
    assert!(!wm.is_registered("missing"));
}

#[test]
fn backdrop_click_closes_only_when_enabled() {
    let mut wm = manager();
    wm.open("p1", None, None);
    let ov = overlay(&wm, "p1");
    assert!(!wm.handle_pointer(PointerEvent::click(ov)));
    assert!(wm.is_open("p1"));
    assert_eq!(
        wm.document().attribute(ov, attrs::CLOSE_ON_BACKDROP),
        Some("false")
    );

    wm.open("p1", None, Some(PopupOptions::new().close_on_backdrop_click(true)));
    let content = part(&wm, "p1", classes::CONTENT);
    assert!(!wm.handle_pointer(PointerEvent::click(content)));
    assert!(wm.is_open("p1"));
    assert!(wm.handle_pointer(PointerEvent::click(ov)));
    assert!(!wm.is_open("p1"));
}

#[test]
fn footer_buttons_run_callbacks_then_close() {
    let mut wm = manager();
    let confirmed = Rc::new(Cell::new(0));
    let cancelled = Rc::new(Cell::new(0));
    let c = Rc::clone(&confirmed);
    wm.on_confirm("p1", move || c.set(c.get() + 1));
    let c = Rc::clone(&cancelled);
    wm.on_cancel("p1", move || c.set(c.get() + 1));

    wm.open("p1", None, None);
    let confirm = part(&wm, "p1", classes::CONFIRM);
    wm.handle_pointer(PointerEvent::click(confirm));
    assert_eq!(confirmed.get(), 1);
    assert!(!wm.is_open("p1"));
    wm.tick(TRANSITION);

    wm.open("p1", None, None);
    let close = part(&wm, "p1", classes::CLOSE);
    wm.handle_pointer(PointerEvent::click(close));
    assert_eq!(cancelled.get(), 1);
    assert!(!wm.is_open("p1"));

    // a closing popup ignores further clicks
    wm.handle_pointer(PointerEvent::click(close));
    assert_eq!(cancelled.get(), 1);
}

#[test]
fn cancel_without_callback_still_closes() {
    let mut wm = manager();
    let cancelled = Rc::new(Cell::new(0));
    let c = Rc::clone(&cancelled);
    wm.on_cancel("p2", move || c.set(c.get() + 1));
    wm.clear_on_cancel("p2");
    wm.open("p2", None, None);
    let cancel = part(&wm, "p2", classes::CANCEL);
    assert!(wm.handle_pointer(PointerEvent::click(cancel)));
    assert!(!wm.is_open("p2"));
    assert_eq!(cancelled.get(), 0);
}

#[test]
fn escape_closes_every_popup() {
    let mut wm = manager();
    wm.open("p1", None, None);
    wm.open("p2", None, None);
    assert!(wm.handle_key(KeyInput::Escape));
    assert!(!wm.is_open("p1"));
    assert!(!wm.is_open("p2"));
    assert!(!wm.handle_key(KeyInput::Other));
}

#[test]
fn scroll_lock_is_held_until_last_blocking_popup_closes() {
    let mut wm = manager();
    wm.open("p1", None, None);
    wm.open("p2", None, None);
    wm.close("p1");
    wm.tick(TRANSITION);
    assert!(wm.scroll_locked());
    wm.close("p2");
    wm.tick(TRANSITION);
    assert!(!wm.scroll_locked());

    wm.open("p1", None, Some(PopupOptions::new().allow_background_interaction(true)));
    assert!(!wm.scroll_locked());
}

#[test]
fn content_replacement_runs_binders() {
    let mut wm = manager();
    let bound = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&bound);
    wm.add_content_binder(move |doc: &mut Document, popup: &PopupId, content: NodeId| {
        sink.borrow_mut()
            .push((popup.to_string(), doc.markup(content).map(str::to_string)));
    });
    wm.open("p1", Some("<p>fresh</p>"), None);
    wm.open("p2", None, None);
    assert_eq!(
        *bound.borrow(),
        vec![("p1".to_string(), Some("<p>fresh</p>".to_string()))]
    );
    let content = part(&wm, "p1", classes::CONTENT);
    assert_eq!(wm.document().markup(content), Some("<p>fresh</p>"));
}

#[test]
fn set_title_rewrites_header_text() {
    let mut wm = manager();
    wm.set_title("p1", "Renamed");
    let title = part(&wm, "p1", classes::TITLE);
    assert_eq!(wm.document().text(title), Some("Renamed"));
}

#[test]
fn stacking_follows_open_order_and_pointer_focus() {
    let mut wm = manager();
    wm.open("p1", None, None);
    wm.open("p2", None, None);
    assert!(wm.z_index("p1").unwrap() < wm.z_index("p2").unwrap());
    let content = part(&wm, "p1", classes::CONTENT);
    wm.handle_pointer(PointerEvent::down(content, 600, 400));
    assert!(wm.z_index("p1").unwrap() > wm.z_index("p2").unwrap());
    assert_eq!(
        wm.stacking_order(),
        &[PopupId::from("p2"), PopupId::from("p1")]
    );
}

#[test]
fn hit_test_finds_chrome_and_blocks_background() {
    let mut wm = manager();
    let page = popup_wm::geometry::Point::new(10, 10);
    assert_eq!(wm.hit_test(page), None);
    wm.open("p1", None, None);
    // p1 is 600x400 centred in 1200x800
    let close = part(&wm, "p1", classes::CLOSE);
    let header = part(&wm, "p1", classes::HEADER);
    let confirm = part(&wm, "p1", classes::CONFIRM);
    use popup_wm::geometry::Point;
    assert_eq!(wm.hit_test(Point::new(880, 210)), Some(close));
    assert_eq!(wm.hit_test(Point::new(400, 210)), Some(header));
    assert_eq!(wm.hit_test(Point::new(850, 580)), Some(confirm));
    assert_eq!(wm.hit_test(page), Some(overlay(&wm, "p1")));

    wm.open("p1", None, Some(PopupOptions::new().allow_background_interaction(true)));
    assert_eq!(wm.hit_test(page), None);
}

#[test]
fn subscribed_host_does_not_accumulate_events() {
    let mut wm = manager();
    let seen = Rc::new(Cell::new(0usize));
    let sink = Rc::clone(&seen);
    wm.on_event(move |_| sink.set(sink.get() + 1));
    for _ in 0..10_000 {
        wm.open("p1", None, None);
        wm.close("p1");
        wm.tick(TRANSITION);
    }
    assert_eq!(seen.get(), 20_000);
    let retained = wm.take_events();
    assert_eq!(retained.len(), wm.config().event_queue_capacity);
    assert_eq!(
        retained.last(),
        Some(&PopupEvent::Closed(PopupId::from("p1")))
    );
}
