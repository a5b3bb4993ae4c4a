//! Deployments view rendering.
//!
//! Displays the local deployment log as a filterable, sortable table.

use std::cmp::Ordering;

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::duration::format_age;
use crate::server::DeploymentRecord;
use crate::source::rpc::unix_now;

/// Column to sort by in the Deployments view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentSort {
    /// Sort by record timestamp.
    #[default]
    Time,
    /// Sort by label alphabetically.
    Label,
    /// Sort by contract address.
    Address,
}

impl DeploymentSort {
    pub fn next(self) -> Self {
        match self {
            DeploymentSort::Time => DeploymentSort::Label,
            DeploymentSort::Label => DeploymentSort::Address,
            DeploymentSort::Address => DeploymentSort::Time,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeploymentSort::Time => "time",
            DeploymentSort::Label => "label",
            DeploymentSort::Address => "address",
        }
    }
}

/// Sort records by the given column and direction, ties broken by timestamp.
pub fn sort_deployments(records: &mut [&DeploymentRecord], column: DeploymentSort, ascending: bool) {
    records.sort_by(|a, b| {
        let primary = match column {
            DeploymentSort::Time => a.timestamp.cmp(&b.timestamp),
            DeploymentSort::Label => a.label.to_lowercase().cmp(&b.label.to_lowercase()),
            DeploymentSort::Address => a.address.to_lowercase().cmp(&b.address.to_lowercase()),
        };
        let primary = if ascending { primary } else { primary.reverse() };
        if primary == Ordering::Equal {
            b.timestamp.cmp(&a.timestamp)
        } else {
            primary
        }
    });
}

/// Shorten a hex string to `0x1234…abcd`.
pub fn abbreviate(hex: &str) -> String {
    if hex.len() <= 14 || !hex.is_ascii() {
        return hex.to_string();
    }
    format!("{}…{}", &hex[..6], &hex[hex.len() - 4..])
}

/// Render the Deployments view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let records = app.visible_deployments();
    let now = unix_now() as i64;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if app.deployments.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  No deployments recorded. POST /api/deployments to add one.",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ])
        .block(block.title(" Deployments (0) "));
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from(header_label("Recorded", DeploymentSort::Time, app)),
        Cell::from(header_label("Label", DeploymentSort::Label, app)),
        Cell::from(header_label("Address", DeploymentSort::Address, app)),
        Cell::from("Deployer"),
        Cell::from("Tx"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = records
        .iter()
        .map(|d| {
            let label = if d.label.is_empty() {
                Cell::from("-").style(Style::default().add_modifier(Modifier::DIM))
            } else {
                Cell::from(d.label.clone())
            };
            Row::new(vec![
                Cell::from(format!("{} ago", format_age(now - d.timestamp as i64))),
                label,
                Cell::from(d.address.clone()),
                Cell::from(abbreviate(&d.deployer)),
                Cell::from(abbreviate(&d.tx_hash)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Fill(2),
        Constraint::Length(42),
        Constraint::Length(13),
        Constraint::Length(13),
    ];

    let selected = app
        .selected_deployment_index
        .min(records.len().saturating_sub(1));
    let sort_dir = if app.sort_ascending { "↑" } else { "↓" };

    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    };
    let position_info = if records.is_empty() {
        String::new()
    } else {
        format!(" [{}/{}]", selected + 1, records.len())
    };

    let title = format!(
        " Deployments ({}/{}) [s:sort {}{}]{}{} ",
        records.len(),
        app.deployments.len(),
        app.sort_column.label(),
        sort_dir,
        filter_info,
        position_info
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(block.title(title))
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected));
    frame.render_stateful_widget(table, area, &mut state);
}

fn header_label(name: &str, col: DeploymentSort, app: &App) -> Span<'static> {
    if app.sort_column == col {
        let arrow = if app.sort_ascending { "↑" } else { "↓" };
        Span::raw(format!("{}{}", name, arrow))
    } else {
        Span::raw(name.to_string())
    }
}
