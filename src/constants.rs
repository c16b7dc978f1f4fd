//! Shared crate-wide constants.

use std::time::Duration;

/// Delay between starting a close and tearing the popup down.
///
/// Matches the duration of the exit transition so the popup is hidden only
/// after it has visually faded out.
pub const TRANSITION_DURATION: Duration = Duration::from_millis(300);

/// Smallest size (in pixels) a resize drag may shrink a popup to.
pub const MIN_RESIZE_WIDTH: i32 = 400;
pub const MIN_RESIZE_HEIGHT: i32 = 300;

/// Size of a minimized popup, anchored to the bottom-right viewport corner.
pub const MINIMIZED_WIDTH: i32 = 300;
pub const MINIMIZED_HEIGHT: i32 = 60;

/// Distance from the viewport bottom of the lowest minimized popup.
///
/// Minimized spawned instances stack upwards from here, each slot being
/// `MINIMIZED_HEIGHT + MINIMIZED_STACK_GAP` pixels tall.
pub const MINIMIZED_STACK_BASE: i32 = 20;
pub const MINIMIZED_STACK_GAP: i32 = 10;

/// Stacking value assigned to the bottom-most active popup.
pub const BASE_Z_INDEX: i32 = 1000;

/// Lifecycle events retained for hosts that drain the queue.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Size used for a container that has neither inline nor natural size.
pub const DEFAULT_NATURAL_WIDTH: i32 = 600;
pub const DEFAULT_NATURAL_HEIGHT: i32 = 400;

/// Chrome metrics used by hit testing and rendering (pixels).
pub const HEADER_HEIGHT: i32 = 40;
pub const HEADER_BUTTON_WIDTH: i32 = 40;
pub const FOOTER_HEIGHT: i32 = 40;
pub const FOOTER_BUTTON_WIDTH: i32 = 100;
pub const RESIZE_HANDLE_SIZE: i32 = 20;

/// Two clicks on the same target within this window count as a double click.
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(500);

/// Class names forming the DOM contract between markup and the manager.
pub mod classes {
    pub const OVERLAY: &str = "popup-overlay";
    pub const SIDE: &str = "popup-side";
    pub const CONTAINER: &str = "popup-container";
    pub const HEADER: &str = "popup-header";
    pub const TITLE: &str = "popup-title";
    pub const CLOSE: &str = "popup-close";
    pub const CONTENT: &str = "popup-content";
    pub const FOOTER: &str = "popup-footer";
    pub const CONFIRM: &str = "popup-confirm-btn";
    pub const CANCEL: &str = "popup-cancel-btn";
    pub const CONTROLS: &str = "popup-window-controls";
    pub const MINIMIZE: &str = "popup-minimize-btn";
    pub const MAXIMIZE: &str = "popup-maximize-btn";
    pub const RESIZE_HANDLE: &str = "popup-resize-handle";

    pub const ACTIVE: &str = "active";
    pub const ENTERING: &str = "entering";
    pub const EXITING: &str = "exiting";
    pub const MINIMIZED: &str = "minimized";
    pub const MAXIMIZED: &str = "maximized";
}

/// Overlay attributes that mirror per-open options.
pub mod attrs {
    pub const CLOSE_ON_BACKDROP: &str = "data-close-on-backdrop";
    pub const ALLOW_BACKGROUND: &str = "data-allow-background";
    pub const ICON: &str = "data-icon";
}
