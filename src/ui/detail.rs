//! Detail overlay rendering.
//!
//! Displays a modal overlay with every field of the selected deployment.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::duration::format_age;
use crate::source::rpc::unix_now;

/// Minimum width required for the detail overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 50;
/// Minimum height required for the detail overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 12;

/// Render the deployment detail as a modal overlay.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }
    let Some(record) = app.selected_deployment() else {
        return;
    };

    let overlay_width = (area.width * 90 / 100).clamp(MIN_OVERLAY_WIDTH, 96);
    let overlay_height = MIN_OVERLAY_HEIGHT;
    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

    frame.render_widget(Clear, overlay_area);

    let chunks = Layout::vertical([Constraint::Min(8), Constraint::Length(1)]).split(overlay_area);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let field = |label: &'static str, value: String| {
        Line::from(vec![
            Span::raw(format!(" {:<10}", label)),
            Span::styled(value, bold),
        ])
    };

    let age = format_age(unix_now() as i64 - record.timestamp as i64);
    let label = if record.label.is_empty() {
        "(none)".to_string()
    } else {
        record.label.clone()
    };
    let lines = vec![
        Line::from(""),
        field("Label", label),
        field("Address", record.address.clone()),
        field("Tx hash", record.tx_hash.clone()),
        field("Deployer", record.deployer.clone()),
        field("Recorded", format!("{} ({} ago)", record.timestamp, age)),
    ];

    let block = Block::default()
        .title(" Deployment ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));
    frame.render_widget(Paragraph::new(lines).block(block), chunks[0]);

    let footer = Paragraph::new(Line::from(vec![Span::styled(
        " j/k: next/previous  Esc: close ",
        Style::default().add_modifier(Modifier::DIM),
    )]));
    frame.render_widget(footer, chunks[1]);
}
