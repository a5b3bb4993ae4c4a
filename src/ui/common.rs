//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::duration::format_age;

/// Render the header bar with the chain overview.
///
/// Displays: status dot, tier, block number, block age and the live pulse.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let status = app.status();
    let status_style = app.theme.status_style(status);
    let pulse = if app.pulse_on { "◉" } else { "○" };

    let mut spans = vec![
        Span::styled(" ● ", status_style),
        Span::styled("CHAINWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
    ];

    match app.state.health {
        None => spans.push(Span::raw("Waiting for first health check...")),
        Some(ref report) => {
            spans.push(Span::styled(
                report.status.label(),
                status_style.add_modifier(Modifier::BOLD),
            ));
            match report.sample {
                Some(ref sample) => {
                    spans.push(Span::raw(" │ block "));
                    spans.push(Span::styled(
                        format!("#{}", sample.block_number),
                        Style::default().add_modifier(Modifier::BOLD),
                    ));
                    spans.push(Span::raw(format!(" │ age {}", format_age(sample.block_age))));
                }
                None => spans.push(Span::raw(" │ node unreachable")),
            }
        }
    }

    if let Some(avg) = app.state.latency.as_ref().and_then(|l| l.average_ms()) {
        spans.push(Span::raw(format!(" │ rpc {:.0}ms", avg)));
    }
    spans.push(Span::raw(" │ "));
    spans.push(Span::styled(pulse, Style::default().fg(app.theme.highlight)));
    spans.push(Span::raw(" live"));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = vec![
        Line::from(" 1:Health "),
        Line::from(" 2:Latency "),
        Line::from(format!(" 3:Deployments ({}) ", app.deployments.len())),
    ];

    let selected = match app.current_view {
        View::Health => 0,
        View::Latency => 1,
        View::Deployments => 2,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows: source, time since last update, available controls.
/// Also displays temporary status messages and errors.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.current_view {
        _ if app.filter_active => "Type to search | Enter:apply Esc:cancel",
        View::Health => "Tab:switch r:refresh e:export ?:help q:quit",
        View::Latency => "↑↓:select Tab:switch r:refresh ?:help q:quit",
        View::Deployments => "/:search s:sort S:reverse Enter:detail ?:help q:quit",
    };

    let status = if let Some(ref err) = app.load_error {
        format!(" Error: {} | {}", err, controls)
    } else if let Some(updated) = app.state.last_updated {
        format!(
            " {} | Updated {:.1}s ago | {}",
            app.source_description(),
            updated.elapsed().as_secs_f64(),
            controls,
        )
    } else {
        format!(" {} | Connecting... | q:quit", app.source_description())
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  Tab/1-3     Switch views"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  Enter       Deployment detail"),
        Line::from("  Esc         Go back"),
        Line::from(""),
        section(" Deployments"),
        Line::from("  /         Start filter/search"),
        Line::from("  c         Clear filter"),
        Line::from("  s         Cycle sort column"),
        Line::from("  S         Toggle sort direction"),
        Line::from(""),
        section(" General"),
        Line::from("  r         Refresh now"),
        Line::from("  e         Export to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 24u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
