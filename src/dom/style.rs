use crate::geometry::Size;

/// Inline style properties the manager reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleProp {
    Width,
    Height,
    Left,
    Top,
    Right,
    Bottom,
    Position,
    Margin,
    Transform,
    Transition,
    Display,
    ZIndex,
    Overflow,
    Cursor,
    UserSelect,
}

impl StyleProp {
    pub fn name(self) -> &'static str {
        match self {
            StyleProp::Width => "width",
            StyleProp::Height => "height",
            StyleProp::Left => "left",
            StyleProp::Top => "top",
            StyleProp::Right => "right",
            StyleProp::Bottom => "bottom",
            StyleProp::Position => "position",
            StyleProp::Margin => "margin",
            StyleProp::Transform => "transform",
            StyleProp::Transition => "transition",
            StyleProp::Display => "display",
            StyleProp::ZIndex => "z-index",
            StyleProp::Overflow => "overflow",
            StyleProp::Cursor => "cursor",
            StyleProp::UserSelect => "user-select",
        }
    }
}

/// The geometry fields captured before minimizing or maximizing.
pub const GEOMETRY_PROPS: [StyleProp; 8] = [
    StyleProp::Width,
    StyleProp::Height,
    StyleProp::Left,
    StyleProp::Top,
    StyleProp::Position,
    StyleProp::Bottom,
    StyleProp::Right,
    StyleProp::Margin,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// A CSS length as written in an inline style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f64),
    Vw(f64),
    Vh(f64),
    Percent(f64),
}

impl Length {
    /// Parses `12px`, `100vw`, `100vh`, `50%` or a bare `0`.
    pub fn parse(raw: &str) -> Option<Length> {
        let raw = raw.trim();
        let split = |suffix: &str| {
            raw.strip_suffix(suffix)
                .and_then(|n| n.trim().parse::<f64>().ok())
        };
        if let Some(v) = split("px") {
            return Some(Length::Px(v));
        }
        if let Some(v) = split("vw") {
            return Some(Length::Vw(v));
        }
        if let Some(v) = split("vh") {
            return Some(Length::Vh(v));
        }
        if let Some(v) = split("%") {
            return Some(Length::Percent(v));
        }
        match raw.parse::<f64>() {
            Ok(v) if v == 0.0 => Some(Length::Px(0.0)),
            _ => None,
        }
    }

    /// Resolves to whole pixels; percentages are relative to the viewport
    /// along `axis` since popup containers live in a full-viewport overlay.
    pub fn resolve(self, viewport: Size, axis: Axis) -> i32 {
        let along = match axis {
            Axis::Horizontal => viewport.width,
            Axis::Vertical => viewport.height,
        } as f64;
        let px = match self {
            Length::Px(v) => v,
            Length::Vw(v) => viewport.width as f64 * v / 100.0,
            Length::Vh(v) => viewport.height as f64 * v / 100.0,
            Length::Percent(v) => along * v / 100.0,
        };
        px.round() as i32
    }
}

/// Formats a pixel length the way it is stored in inline styles.
pub fn px(value: i32) -> String {
    format!("{value}px")
}

/// Parses a `px` length; other units yield `None`.
pub fn parse_px(raw: &str) -> Option<i32> {
    match Length::parse(raw)? {
        Length::Px(v) => Some(v.round() as i32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_units() {
        assert_eq!(Length::parse("12px"), Some(Length::Px(12.0)));
        assert_eq!(Length::parse("100vw"), Some(Length::Vw(100.0)));
        assert_eq!(Length::parse(" 50% "), Some(Length::Percent(50.0)));
        assert_eq!(Length::parse("0"), Some(Length::Px(0.0)));
        assert_eq!(Length::parse("auto"), None);
        assert_eq!(Length::parse(""), None);
    }

    #[test]
    fn resolves_viewport_units() {
        let vp = Size::new(1200, 800);
        assert_eq!(Length::Vw(100.0).resolve(vp, Axis::Vertical), 1200);
        assert_eq!(Length::Vh(100.0).resolve(vp, Axis::Horizontal), 800);
        assert_eq!(Length::Percent(50.0).resolve(vp, Axis::Vertical), 400);
    }

    #[test]
    fn px_helpers() {
        assert_eq!(px(-4), "-4px");
        assert_eq!(parse_px("90px"), Some(90));
        assert_eq!(parse_px("100vh"), None);
    }
}
