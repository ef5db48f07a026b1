//! inventory-suggest: interactive picker demo
//!
//! Drives one picker from stdin so the typeahead can be exercised against
//! a live inventory API.

use anyhow::Result;
use inventory_suggest::{
    autocomplete::{build_source, Key, PickerHost, PickerSnapshot, SelectionChange},
    config,
    metrics::LookupMetrics,
    network::HttpClient,
    AlertBox, Picker, PickerHandle, Settings,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Prints the committed value the way a parent form would receive it
struct ConsoleHost;

impl PickerHost for ConsoleHost {
    fn selection_changed(&self, change: &SelectionChange) {
        match change {
            SelectionChange::Selected(candidate) => {
                println!("selected: {} ({})", candidate.label, candidate.id)
            }
            SelectionChange::Cleared => println!("selection cleared"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let entity = match std::env::args().nth(1) {
        Some(arg) if arg == "-h" || arg == "--help" => {
            print_usage();
            return Ok(());
        }
        Some(arg) if arg == "-V" || arg == "--version" => {
            println!("inventory-suggest {}", inventory_suggest::VERSION);
            return Ok(());
        }
        other => other,
    };

    let settings = config::load()?;
    init_logging(&settings);
    info!(
        "Starting inventory-suggest v{} for {}",
        inventory_suggest::VERSION,
        settings.general.instance_name
    );

    let entity = entity.unwrap_or_else(|| settings.suggest.default_source.clone());
    let client = HttpClient::with_settings(&settings.outgoing)?;
    let source = build_source(&entity, &settings, client)?;
    info!("Picking {} from {}", source.name(), settings.api.base_url);

    let alerts = Arc::new(AlertBox::default());
    let metrics = Arc::new(LookupMetrics::new());
    let (handle, task) = Picker::new(source, settings.suggest.controller_options())
        .with_host(Arc::new(ConsoleHost))
        .with_reporter(alerts.clone())
        .with_metrics(metrics.clone())
        .spawn();

    let mut watcher = handle.clone();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if !dispatch_line(&handle, &line) {
                        break;
                    }
                }
                None => break,
            },
            snapshot = watcher.changed() => match snapshot {
                Some(snapshot) => print_snapshot(&snapshot),
                None => break,
            },
        }

        for alert in alerts.alerts() {
            eprintln!("[{:?}] {}: {}", alert.level, alert.source, alert.message);
            alerts.dismiss(alert.id);
        }
    }

    handle.shutdown();
    task.await?;

    for (source, stats) in metrics.get_source_stats() {
        info!(
            "{}: {} lookups, {} stale, {} failed, avg {:?} ms",
            source, stats.lookups, stats.stale, stats.failures, stats.avg_response_time
        );
    }

    Ok(())
}

fn init_logging(settings: &Settings) {
    let default_level = if settings.general.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Translate one input line into a picker event; false means quit
fn dispatch_line(handle: &PickerHandle, line: &str) -> bool {
    match line.trim_end() {
        ":quit" | ":q" => false,
        ":up" => handle.key(Key::Up),
        ":down" => handle.key(Key::Down),
        ":enter" => handle.key(Key::Enter),
        ":esc" => handle.key(Key::Escape),
        ":clear" => handle.clear(),
        cmd if cmd.starts_with(":pick ") => match cmd[6..].trim().parse() {
            Ok(index) => handle.select(index),
            Err(_) => {
                eprintln!("usage: :pick <index>");
                true
            }
        },
        text => handle.input(text),
    }
}

fn print_snapshot(snapshot: &PickerSnapshot) {
    if snapshot.committed.is_some() {
        return;
    }
    if snapshot.loading {
        println!("  searching \"{}\"...", snapshot.query);
        return;
    }
    for (i, candidate) in snapshot.candidates.iter().enumerate() {
        let marker = if snapshot.highlighted == Some(i) { '>' } else { ' ' };
        println!("{} {} {}", marker, i, candidate.label);
    }
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
inventory-suggest v{}
Interactive typeahead picker for the inventory console

USAGE:
    inventory-suggest [ENTITY]

ENTITY:
    datacenters (default), projects, groups, hosts

INPUT:
    <text>        Replace the query text
    :up / :down   Move the highlight
    :enter        Commit the highlighted candidate
    :pick <N>     Commit candidate N
    :esc, :clear  Clear the selection
    :quit         Exit

ENVIRONMENT VARIABLES:
    INVENTORY_SETTINGS_PATH    Path to settings.yml
    INVENTORY_API_URL          Inventory API base URL
    INVENTORY_DEBUG            Enable debug logging (true/false)
    INVENTORY_DEBOUNCE_MS      Debounce delay in milliseconds
    INVENTORY_SUGGEST_LIMIT    Candidates per lookup
    INVENTORY_REQUEST_TIMEOUT  Request timeout in seconds
"#,
        inventory_suggest::VERSION
    );
}
