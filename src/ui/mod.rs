mod container_list;
mod host_list;
pub mod theme;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::{App, State};

const MIN_WIDTH: u16 = 40;
const MIN_HEIGHT: u16 = 8;

/// Top-level render dispatcher.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Terminal too small guard
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg =
            Paragraph::new("Terminal too small. Need at least 40x8.").style(theme::error());
        frame.render_widget(msg, area);
        return;
    }

    match app.state() {
        State::Init | State::LoadingConfig => render_wait(frame, area, "Loading hosts..."),
        State::Connecting => render_wait(frame, area, "Connecting..."),
        State::SelectingHost => host_list::render(frame, app),
        State::ListingContainers => container_list::render(frame, app),
        State::Failed => render_failed(frame, area, app),
        // The terminal belongs to the remote process in these states; the
        // next draw happens after the hand-off returns.
        State::ShellActive | State::ExecActive => {}
    }
}

fn render_wait(frame: &mut Frame, area: Rect, text: &str) {
    let line = Line::from(vec![
        Span::styled(" dockside ", theme::brand_badge()),
        Span::raw(" "),
        Span::styled(text, theme::muted()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_failed(frame: &mut Frame, area: Rect, app: &App) {
    let detail = app
        .machine
        .error()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "unknown error".to_string());

    let lines = vec![
        Line::from(Span::styled(" dockside ", theme::brand_badge())),
        Line::raw(""),
        Line::from(Span::styled(format!("Error: {detail}"), theme::error())),
        Line::raw(""),
        Line::from(Span::styled("Press q to quit.", theme::muted())),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

/// Render the status bar at the bottom.
pub fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    if let Some(ref status) = app.status {
        let line = if status.is_error {
            Line::from(vec![
                Span::styled("! ", theme::error()),
                Span::styled(status.text.as_str(), theme::error()),
            ])
        } else {
            Line::from(Span::styled(status.text.as_str(), theme::success()))
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}
