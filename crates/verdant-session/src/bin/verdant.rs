//! Verdant allocation CLI
//!
//! Load a hierarchy, replay an event script against it and print the
//! resulting snapshot as JSON.

use std::env;
use std::process;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use verdant_session::{
    load_events, AllocationSession, SessionConfig, SessionSeed, DEFAULT_LOG_FILTER,
};

fn print_usage() {
    eprintln!("Usage: verdant <tree.json> [events.json]");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  VERDANT_CLAMP_INPUTS  clamp inputs to their control ranges (default true)");
    eprintln!("  VERDANT_LEVELS        comma-separated enabled levels");
    eprintln!("                        (default region,country,facility,resource)");
    eprintln!("  VERDANT_LOG           log filter (default {DEFAULT_LOG_FILTER})");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let Some(tree_path) = args.get(1) else {
        print_usage();
        process::exit(2);
    };

    let config = SessionConfig::from_env()?;

    // Logs go to stderr; stdout carries the snapshot.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let seed = SessionSeed::load(tree_path)?;
    let mut session = AllocationSession::from_seed(seed, config)?;

    if let Some(events_path) = args.get(2) {
        let events = load_events(events_path)?;
        tracing::info!(count = events.len(), path = %events_path, "replaying events");
        session.replay(events);
    }

    session.report_mismatches();
    println!("{}", serde_json::to_string_pretty(&session.snapshot())?);

    Ok(())
}
