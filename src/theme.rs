use ratatui::style::{Color, Modifier, Style};

// Centralized colors for the popup renderer.

pub const ACCENT_RGB: (u8, u8, u8) = (200, 100, 0);

pub fn accent() -> Color {
    Color::Rgb(ACCENT_RGB.0, ACCENT_RGB.1, ACCENT_RGB.2)
}

// Page behind the popups
pub fn page_fg() -> Color {
    Color::Gray
}

/// Applied over the page while a blocking overlay is shown.
pub fn backdrop() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

// Popup body
pub fn popup_bg() -> Color {
    Color::Black
}
pub fn popup_fg() -> Color {
    Color::White
}
pub fn popup_border() -> Color {
    Color::DarkGray
}
pub fn popup_border_top() -> Color {
    accent()
}

// Header
pub fn header_bg() -> Color {
    Color::Blue
}
pub fn header_fg() -> Color {
    Color::White
}

// Footer buttons
pub fn confirm_bg() -> Color {
    Color::Green
}
pub fn cancel_bg() -> Color {
    Color::DarkGray
}
pub fn button_fg() -> Color {
    Color::Black
}

pub fn resize_handle() -> Color {
    accent()
}

// Status line
pub fn status_bg() -> Color {
    Color::DarkGray
}
pub fn status_fg() -> Color {
    Color::White
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accent_is_rgb() {
        assert!(matches!(accent(), Color::Rgb(200, 100, 0)));
    }
}
