use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, Paragraph};

use super::theme;
use crate::app::App;

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(1), // Title
        Constraint::Min(3),    // Container list
        Constraint::Length(1), // Footer or status
    ])
    .split(area);

    render_title(frame, chunks[0], app);
    render_list(frame, chunks[1], app);
    if app.status.is_some() {
        super::render_status_bar(frame, chunks[2], app);
    } else {
        render_footer(frame, chunks[2]);
    }
}

fn render_title(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(" dockside ", theme::brand_badge())];
    if let Some(host) = app.selected_host() {
        spans.push(Span::raw(format!(" containers on {} ", host.name)));
        spans.push(Span::styled(format!("({})", host.host), theme::muted()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_list(frame: &mut Frame, area: Rect, app: &mut App) {
    if app.containers.is_empty() {
        let msg = Paragraph::new("No containers running.").style(theme::muted());
        frame.render_widget(msg, area);
        return;
    }

    let items: Vec<ListItem> = app
        .containers
        .iter()
        .map(|c| {
            ListItem::new(Line::from(vec![
                Span::styled(c.name.clone(), theme::bold()),
                Span::styled(format!("  [{}]", c.image), theme::muted()),
                Span::styled(format!("  {}", c.status), theme::muted()),
            ]))
        })
        .collect();

    let list = List::new(items)
        .highlight_style(theme::selected())
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, area, &mut app.container_list);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled("↑/↓", theme::accent_bold()),
        Span::styled(" navigate  ", theme::muted()),
        Span::styled("enter", theme::accent_bold()),
        Span::styled(" exec  ", theme::muted()),
        Span::styled("s", theme::accent_bold()),
        Span::styled(" host shell  ", theme::muted()),
        Span::styled("esc", theme::accent_bold()),
        Span::styled(" back  ", theme::muted()),
        Span::styled("q", theme::accent_bold()),
        Span::styled(" quit", theme::muted()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
