pub mod config;
pub mod constants;
pub mod demo;
pub mod dom;
pub mod drivers;
pub mod error;
pub mod event_loop;
pub mod events;
pub mod geometry;
pub mod input;
pub mod layout;
pub mod log_buffer;
pub mod render;
pub mod scheduler;
pub mod theme;
pub mod tracing_sub;
pub mod window;

pub use dom::{Document, NodeId, PopupTemplate};
pub use error::PopupError;
pub use events::PopupEvent;
pub use window::{PopupId, PopupManager, PopupOptions, WindowState};
