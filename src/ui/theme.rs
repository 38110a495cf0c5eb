use std::sync::atomic::{AtomicU8, Ordering};

use ratatui::style::{Color, Modifier, Style};

/// Color mode: 0 = NO_COLOR, 1 = ANSI 16, 2 = truecolor.
static COLOR_MODE: AtomicU8 = AtomicU8::new(1);

/// Initialize theme settings. Call once at startup.
pub fn init() {
    if std::env::var_os("NO_COLOR").is_some() {
        COLOR_MODE.store(0, Ordering::Release);
    } else if std::env::var("COLORTERM")
        .map(|v| v == "truecolor" || v == "24bit")
        .unwrap_or(false)
    {
        COLOR_MODE.store(2, Ordering::Release);
    }
}

/// Brand badge: blue background with white text. The single splash of color.
/// Truecolor: #2496ED bg. ANSI 16: Blue bg. NO_COLOR: REVERSED.
pub fn brand_badge() -> Style {
    match COLOR_MODE.load(Ordering::Acquire) {
        0 => Style::default()
            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            .remove_modifier(Modifier::DIM),
        2 => Style::default()
            .fg(Color::White)
            .bg(Color::Rgb(36, 150, 237))
            .add_modifier(Modifier::BOLD)
            .remove_modifier(Modifier::DIM),
        _ => Style::default()
            .fg(Color::White)
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD)
            .remove_modifier(Modifier::DIM),
    }
}

/// Keybinding keys in the footer.
pub fn accent_bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

/// Muted/secondary text (footers, spinners, image/status columns).
pub fn muted() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

/// Selected item in a list.
pub fn selected() -> Style {
    Style::default().add_modifier(Modifier::REVERSED)
}

/// Error message.
pub fn error() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

/// Success/notice message.
pub fn success() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

/// Bold text (labels, emphasis).
pub fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}
