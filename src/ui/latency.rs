//! Latency view rendering.
//!
//! A row per probe method from the most recent sample, plus the trend of the
//! mean latency across samples.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::ChainStatus;
use crate::ui::render_sparkline;

/// Probes slower than this are highlighted.
const SLOW_PROBE_MS: f64 = 1_000.0;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([Constraint::Min(5), Constraint::Length(4)]).split(area);
    render_probes(frame, app, chunks[0]);
    render_trend(frame, app, chunks[1]);
}

fn render_probes(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let Some(ref sample) = app.state.latency else {
        let empty = Paragraph::new(Line::from(Span::styled(
            " Waiting for the first latency probe...",
            Style::default().add_modifier(Modifier::DIM),
        )))
        .block(block.title(" Probes "));
        frame.render_widget(empty, area);
        return;
    };

    let header = Row::new(vec![
        Cell::from("Method"),
        Cell::from("Latency"),
        Cell::from("Result"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = sample
        .probes
        .iter()
        .map(|p| match (p.latency_ms, &p.error) {
            (Some(ms), _) => {
                let style = if ms >= SLOW_PROBE_MS {
                    app.theme.status_style(Some(ChainStatus::Degraded))
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(p.method.clone()),
                    Cell::from(format!("{:.1} ms", ms)).style(style),
                    Cell::from("ok").style(app.theme.status_style(Some(ChainStatus::Operational))),
                ])
            }
            (None, error) => Row::new(vec![
                Cell::from(p.method.clone()),
                Cell::from("-"),
                Cell::from(error.clone().unwrap_or_else(|| "failed".to_string()))
                    .style(app.theme.status_style(Some(ChainStatus::Down))),
            ]),
        })
        .collect();

    let widths = [
        Constraint::Length(18),
        Constraint::Length(12),
        Constraint::Fill(1),
    ];

    let mean = sample
        .average_ms()
        .map(|ms| format!("mean {:.1} ms", ms))
        .unwrap_or_else(|| "all probes failed".to_string());
    let title = format!(
        " Probes ({}/{} ok, {}) ",
        sample.probes.len() - sample.failures(),
        sample.probes.len(),
        mean
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(block.title(title))
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(
        app.selected_probe_index
            .min(sample.probes.len().saturating_sub(1)),
    ));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_trend(frame: &mut Frame, app: &App, area: Rect) {
    let history = &app.state.latency_history;
    let width = (area.width.saturating_sub(4) as usize).min(history.capacity());
    let summary = match (history.latest(), history.mean()) {
        (Some(latest), Some(mean)) => format!(
            " latest {:.1} ms │ window mean {:.1} ms │ {}/{} samples",
            latest,
            mean,
            history.len(),
            history.capacity()
        ),
        _ => " no samples yet".to_string(),
    };

    let lines = vec![
        Line::from(Span::styled(
            format!(" {}", render_sparkline(&history.sparkline(), width)),
            Style::default().fg(app.theme.highlight),
        )),
        Line::from(Span::styled(summary, Style::default().add_modifier(Modifier::DIM))),
    ];
    let block = Block::default()
        .title(" Mean latency ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
