//! Health view rendering.
//!
//! Shows the most recent health sample, every reason that fired on the last
//! tick, and the block-age trend.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::data::duration::format_age;
use crate::data::{HealthSample, SyncState};
use crate::ui::render_sparkline;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(9), // Sample
        Constraint::Min(3),    // Reasons
        Constraint::Length(4), // Trend
    ])
    .split(area);

    render_sample(frame, app, chunks[0]);
    render_reasons(frame, app, chunks[1]);
    render_trend(frame, app, chunks[2]);
}

fn bordered(app: &App, title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
}

fn field(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!(" {:<16}", label)),
        Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
    ])
}

fn sample_lines(sample: &HealthSample) -> Vec<Line<'static>> {
    let sync = match sample.sync_state {
        SyncState::Synced => "synced".to_string(),
        SyncState::Syncing { current, highest } => format!("syncing {}/{}", current, highest),
    };
    vec![
        field("Block", format!("#{}", sample.block_number)),
        field("Block age", format_age(sample.block_age)),
        field(
            "Block time",
            sample
                .block_time
                .map(|t| format!("{}s", t))
                .unwrap_or_else(|| "-".to_string()),
        ),
        field("Nonce gap", sample.sequencer_nonce_gap.to_string()),
        field("Mempool backlog", sample.mempool_stuck_count.to_string()),
        field("Sync", sync),
    ]
}

fn render_sample(frame: &mut Frame, app: &App, area: Rect) {
    let (title, lines) = match app.state.health {
        None => (
            " Chain ".to_string(),
            vec![Line::from(Span::styled(
                " Waiting for the first health check...",
                Style::default().add_modifier(Modifier::DIM),
            ))],
        ),
        Some(ref report) => {
            let title = format!(" Chain: {} {} ", report.status.symbol(), report.status.label());
            let lines = match report.sample {
                Some(ref sample) => sample_lines(sample),
                None => vec![Line::from(Span::styled(
                    " Node unreachable: the last RPC batch failed",
                    app.theme.status_style(Some(report.status)),
                ))],
            };
            (title, lines)
        }
    };

    let block = bordered(app, title).border_style(app.theme.status_style(app.status()));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_reasons(frame: &mut Frame, app: &App, area: Rect) {
    let reasons = app
        .state
        .health
        .as_ref()
        .map(|h| h.reasons.as_slice())
        .unwrap_or_default();

    let lines: Vec<Line> = if reasons.is_empty() {
        vec![Line::from(Span::styled(
            " No issues",
            Style::default().add_modifier(Modifier::DIM),
        ))]
    } else {
        let style = app.theme.status_style(app.status());
        reasons
            .iter()
            .map(|r| Line::from(vec![Span::styled(" ▸ ", style), Span::raw(r.clone())]))
            .collect()
    };

    let title = format!(" Reasons ({}) ", reasons.len());
    frame.render_widget(
        Paragraph::new(lines)
            .block(bordered(app, title))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn render_trend(frame: &mut Frame, app: &App, area: Rect) {
    let history = &app.state.block_age_history;
    let width = area.width.saturating_sub(4) as usize;
    let summary = match (history.latest(), history.mean()) {
        (Some(&latest), Some(mean)) => format!(
            " latest {} │ mean {} │ {}/{} samples",
            format_age(latest),
            format_age(mean.round() as i64),
            history.len(),
            history.capacity()
        ),
        _ => " no samples yet".to_string(),
    };

    let lines = vec![
        Line::from(Span::styled(
            format!(" {}", render_sparkline(&history.sparkline(), width.min(history.capacity()))),
            Style::default().fg(app.theme.highlight),
        )),
        Line::from(Span::styled(summary, Style::default().add_modifier(Modifier::DIM))),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(bordered(app, " Block age ".to_string())),
        area,
    );
}
