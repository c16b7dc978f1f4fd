pub mod chrome;
pub mod floating;

pub use chrome::ChromeLayout;
pub use floating::{
    DragSession, PointerSession, ResizeSession, apply_resize, clamp_drag_position,
    minimized_offset, repack_minimized,
};
