//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `landing_url` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;

use landing_url::initialization::init_logger_with;
use landing_url::{run_resolve, Config, Resolution};

#[tokio::main]
async fn main() -> Result<()> {
    // Proxy settings may come from a .env file (LANDING_PROXY, LANDING_PAC_URL)
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    let show_stats = config.show_stats;
    let report = match run_resolve(config).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("landing_url error: {:#}", e);
            process::exit(1);
        }
    };

    for (start, resolution) in &report.resolutions {
        match resolution {
            Resolution::Resolved(url) => println!("{} -> {}", start, url.as_str().green()),
            Resolution::Fallback { url, cause } => println!(
                "{} -> {} ({})",
                start,
                url.as_str().yellow(),
                cause.to_string().red()
            ),
        }
    }
    for raw in &report.invalid {
        println!("{} -> {}", raw, "invalid URL".red());
    }

    if show_stats {
        println!(
            "\nResolved {} URL{} in {:.1}s ({} fell back)",
            report.resolutions.len(),
            if report.resolutions.len() == 1 { "" } else { "s" },
            report.elapsed_seconds,
            report.fallbacks()
        );
        for (event, count) in report.stats.snapshot() {
            println!("  {:<40} {}", event.as_str(), count);
        }
    }

    if !report.invalid.is_empty() {
        process::exit(2);
    }
    Ok(())
}
