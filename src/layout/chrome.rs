use crate::config::ChromeMetrics;
use crate::geometry::PixelRect;

/// Rectangles of a popup's chrome, derived from its container box.
///
/// Header buttons are laid out right to left: close, maximize, minimize.
/// The footer buttons sit at the right edge: cancel, then confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromeLayout {
    pub container: PixelRect,
    pub header: PixelRect,
    pub close: PixelRect,
    pub maximize: PixelRect,
    pub minimize: PixelRect,
    pub content: PixelRect,
    pub footer: PixelRect,
    pub cancel: PixelRect,
    pub confirm: PixelRect,
    pub resize_handle: PixelRect,
}

impl ChromeLayout {
    pub fn for_container(container: PixelRect, metrics: &ChromeMetrics, has_footer: bool) -> Self {
        let header_h = metrics.header_height.min(container.height);
        let header = PixelRect::new(container.x, container.y, container.width, header_h);
        let button = |slot: i32| {
            PixelRect::new(
                container.right() - metrics.header_button_width * (slot + 1),
                container.y,
                metrics.header_button_width,
                header_h,
            )
        };
        let footer_h = if has_footer {
            metrics
                .footer_height
                .min(container.height - header_h)
                .max(0)
        } else {
            0
        };
        let footer = PixelRect::new(
            container.x,
            container.bottom() - footer_h,
            container.width,
            footer_h,
        );
        let footer_button = |slot: i32| {
            PixelRect::new(
                container.right() - metrics.footer_button_width * (slot + 1),
                footer.y,
                metrics.footer_button_width,
                footer_h,
            )
        };
        let content = PixelRect::new(
            container.x,
            container.y + header_h,
            container.width,
            (container.height - header_h - footer_h).max(0),
        );
        let handle = metrics.resize_handle;
        Self {
            container,
            header,
            close: button(0),
            maximize: button(1),
            minimize: button(2),
            content,
            footer,
            cancel: footer_button(1),
            confirm: footer_button(0),
            resize_handle: PixelRect::new(
                container.right() - handle,
                container.bottom() - handle,
                handle,
                handle,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn header_buttons_stack_from_the_right() {
        let layout = ChromeLayout::for_container(
            PixelRect::new(100, 100, 500, 300),
            &ChromeMetrics::default(),
            true,
        );
        assert_eq!(layout.close, PixelRect::new(560, 100, 40, 40));
        assert_eq!(layout.maximize.right(), layout.close.x);
        assert_eq!(layout.minimize.right(), layout.maximize.x);
        assert!(layout.resize_handle.contains(Point::new(599, 399)));
        assert_eq!(layout.footer.bottom(), 400);
        assert_eq!(layout.content.y, 140);
        assert_eq!(layout.content.bottom(), layout.footer.y);
    }

    #[test]
    fn collapsed_container_has_no_footer_space() {
        let layout = ChromeLayout::for_container(
            PixelRect::new(0, 0, 300, 40),
            &ChromeMetrics::default(),
            true,
        );
        assert_eq!(layout.footer.height, 0);
        assert_eq!(layout.content.height, 0);
    }
}
