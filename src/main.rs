use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Terminal,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use chainwatch::app::{App, View};
use chainwatch::data::duration::format_age;
use chainwatch::inspect::{inspect_address, inspect_transaction};
use chainwatch::source::{check_health, probe_latency};
use chainwatch::{events, server, ui, ChainStatus, RpcClient, RpcSource, Settings};

/// How often the dashboard drains the poll loops.
const REFRESH_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Parser, Debug)]
#[command(name = "chainwatch", version)]
#[command(about = "Chain health dashboard, contract compiler proxy and deployment log")]
struct Args {
    /// Settings file (defaults to ./chainwatch.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint, overriding the settings file
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Write logs to this file. The dashboard logs nowhere without it.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Live health dashboard (default)
    Monitor,

    /// Run the local API server
    Serve {
        /// Listen address, overriding the settings file
        #[arg(long)]
        bind: Option<String>,
    },

    /// Check chain health once and exit (0 operational, 1 degraded, 2 down)
    Check {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Look up an address or transaction
    Inspect {
        #[command(subcommand)]
        target: InspectTarget,
    },
}

#[derive(Subcommand, Debug)]
enum InspectTarget {
    /// Code size, balance and optional storage slots of an address
    Address {
        address: String,

        /// Storage slot to print raw
        #[arg(long)]
        slot: Option<u64>,

        /// Storage slot holding the contract lifecycle state
        #[arg(long)]
        state_slot: Option<u64>,

        #[arg(long)]
        json: bool,
    },

    /// Transaction and receipt summary
    Tx {
        hash: String,

        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(url) = args.rpc_url {
        settings.rpc.url = url;
    }

    let command = args.command.unwrap_or(Command::Monitor);
    let interactive = matches!(command, Command::Monitor);
    init_logging(args.log_file.as_deref(), interactive)?;

    let rt = tokio::runtime::Runtime::new()?;

    match command {
        Command::Monitor => {
            run_monitor(&rt, &settings)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                settings.server.bind = bind;
            }
            rt.block_on(server::serve(&settings))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { json } => rt.block_on(run_check(&settings, json)),
        Command::Inspect { target } => {
            rt.block_on(run_inspect(&settings, target))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Route logs to `log_file`, or to stderr for non-interactive commands.
///
/// The dashboard owns the terminal, so without a file it logs nowhere.
fn init_logging(log_file: Option<&Path>, interactive: bool) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chainwatch=info"));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if interactive => {}
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

fn rpc_client(settings: &Settings) -> Result<RpcClient> {
    RpcClient::new(&settings.rpc.url, settings.rpc.timeout)
        .with_context(|| format!("failed to create RPC client for {}", settings.rpc.url))
}

/// Run the dashboard with the poll loops on `rt`.
fn run_monitor(rt: &tokio::runtime::Runtime, settings: &Settings) -> Result<()> {
    let client = Arc::new(rpc_client(settings)?);
    let poll = settings.poll_config();

    // Spawn inside the runtime; the TUI runs on this thread meanwhile
    let source = rt.block_on(async move { RpcSource::spawn(client, poll) });

    let app = App::new(Box::new(source), settings.monitor.history_size)
        .with_deployment_log(&settings.deployments.log_path);

    // Dropping the app drops the source, which stops both loops
    run_tui(app)
}

async fn run_check(settings: &Settings, json_output: bool) -> Result<ExitCode> {
    let client = rpc_client(settings)?;
    let thresholds = settings.thresholds();
    let (report, latency) = tokio::join!(check_health(&client, &thresholds), probe_latency(&client));

    if json_output {
        let output = json!({
            "rpc_url": client.url(),
            "status": report.status,
            "average_latency_ms": latency.average_ms(),
            "health": &report,
            "latency": &latency,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Node:     {}", client.url());
        println!("Status:   {} {}", report.status.symbol(), report.status.label());
        match report.sample {
            Some(ref sample) => println!(
                "Block:    #{} ({} old)",
                sample.block_number,
                format_age(sample.block_age)
            ),
            None => println!("Block:    unavailable (node unreachable)"),
        }
        for reason in &report.reasons {
            println!("Reason:   {}", reason);
        }
        match latency.average_ms() {
            Some(avg) => println!(
                "Latency:  {:.1} ms mean ({}/{} probes failed)",
                avg,
                latency.failures(),
                latency.probes.len()
            ),
            None => println!("Latency:  every probe failed"),
        }
    }

    Ok(match report.status {
        ChainStatus::Operational => ExitCode::SUCCESS,
        ChainStatus::Degraded => ExitCode::from(1),
        ChainStatus::Down => ExitCode::from(2),
    })
}

async fn run_inspect(settings: &Settings, target: InspectTarget) -> Result<()> {
    let client = rpc_client(settings)?;
    match target {
        InspectTarget::Address {
            address,
            slot,
            state_slot,
            json,
        } => {
            let report = inspect_address(&client, &address, slot, state_slot).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report);
            }
        }
        InspectTarget::Tx { hash, json } => {
            let report = inspect_transaction(&client, &hash).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report);
            }
        }
    }
    Ok(())
}

/// Run the TUI until the user quits
fn run_tui(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Restore the terminal before printing a panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    app.reload_data();
    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let mut last_refresh = Instant::now();

    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 16;

    while app.running {
        app.tick();

        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = Paragraph::new(msg)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::Yellow));
                let centered = Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5)
                    .intersection(area);
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);

            match app.current_view {
                View::Health => ui::health::render(frame, app, chunks[2]),
                View::Latency => ui::latency::render(frame, app, chunks[2]),
                View::Deployments => ui::deployments::render(frame, app, chunks[2]),
            }

            ui::common::render_status_bar(frame, app, chunks[3]);

            if app.show_detail_overlay {
                ui::detail::render_overlay(frame, app, area);
            }
            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                // Header (1) + tabs (1) + table border (1), then the column header row
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse, 3),
                _ => {}
            }
        }

        if last_refresh.elapsed() >= REFRESH_INTERVAL {
            app.reload_data();
            last_refresh = Instant::now();
        }
    }

    Ok(())
}
