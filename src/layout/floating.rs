use crate::config::ManagerConfig;
use crate::dom::NodeId;
use crate::geometry::{Point, Size};
use crate::window::PopupId;

/// A header drag in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub popup: PopupId,
    pub target: NodeId,
    pub pointer_offset: Point,
}

/// A corner-handle resize in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeSession {
    pub popup: PopupId,
    pub target: NodeId,
    pub start_size: Size,
    pub start_pointer: Point,
}

/// The single pointer interaction the manager may be tracking. Drag and
/// resize share one slot, so they can never run at the same time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerSession {
    Drag(DragSession),
    Resize(ResizeSession),
}

impl PointerSession {
    pub fn target(&self) -> NodeId {
        match self {
            PointerSession::Drag(drag) => drag.target,
            PointerSession::Resize(resize) => resize.target,
        }
    }

    pub fn popup(&self) -> &PopupId {
        match self {
            PointerSession::Drag(drag) => &drag.popup,
            PointerSession::Resize(resize) => &resize.popup,
        }
    }
}

/// New top-left for a dragged box, kept fully inside the viewport.
///
/// A box larger than the viewport pins to the top-left edge.
pub fn clamp_drag_position(pointer: Point, offset: Point, size: Size, viewport: Size) -> Point {
    let wanted = pointer - offset;
    let max_x = viewport.width - size.width;
    let max_y = viewport.height - size.height;
    Point::new(wanted.x.min(max_x).max(0), wanted.y.min(max_y).max(0))
}

/// Size after dragging the resize handle from `start_pointer` to `pointer`.
/// Floored at `min`; there is no upper bound.
pub fn apply_resize(start: Size, start_pointer: Point, pointer: Point, min: Size) -> Size {
    let delta = pointer - start_pointer;
    Size::new(
        (start.width + delta.x).max(min.width),
        (start.height + delta.y).max(min.height),
    )
}

/// Bottom offset of the minimized slot at `rank` (0 = lowest).
pub fn minimized_offset(rank: usize, config: &ManagerConfig) -> i32 {
    config.stack_base + rank as i32 * config.stack_step()
}

/// Reassigns contiguous slots to minimized boxes, keeping their current
/// bottom-to-top order. Ties are broken by key so the result is stable.
pub fn repack_minimized<K: Copy + Ord>(entries: &[(K, i32)], config: &ManagerConfig) -> Vec<(K, i32)> {
    let mut ordered = entries.to_vec();
    ordered.sort_by_key(|(key, bottom)| (*bottom, *key));
    ordered
        .into_iter()
        .enumerate()
        .map(|(rank, (key, _))| (key, minimized_offset(rank, config)))
        .collect()
}
