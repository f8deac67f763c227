//! Premium signals CLI
//!
//! Usage:
//! ```bash
//! # Validate a configuration file and print the resolved thresholds
//! premium-signals check-config --config config/default.toml
//!
//! # Evaluate one market snapshot
//! premium-signals evaluate --config config/default.toml --snapshot snapshot.json
//!
//! # Same, as JSON for the dashboard
//! premium-signals evaluate --snapshot snapshot.json --json
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use premium_signals::pipeline::{run_refresh, RefreshInput, RefreshReport};
use premium_signals::SignalConfig;

#[derive(Parser)]
#[command(name = "premium-signals")]
#[command(about = "Traffic-light signals for short premium on inverse ETF options")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a configuration file
    CheckConfig {
        /// Path to configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Run one refresh over a JSON market snapshot
    Evaluate {
        /// Path to configuration file (built-in defaults when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Path to the market snapshot
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<SignalConfig> {
    match path {
        Some(path) => SignalConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(SignalConfig::default()),
    }
}

fn print_report(report: &RefreshReport) {
    println!("As of {}", report.as_of);
    println!(
        "VIX {:.2}: {:?} ({})",
        report.vix_level,
        report.vix_regime,
        report.vix_regime.label()
    );

    for card in &report.indices {
        println!(
            "  {} {:.2}  RSI {}  calls {}  puts {}",
            card.state.symbol,
            card.state.price,
            card
                .rsi_label
                .map_or_else(|| "n/a".to_string(), |label| format!("{:?}", label)),
            card.call_sell,
            card.put_sell
        );
    }
    println!();

    for underlying in &report.underlyings {
        println!(
            "{} @ {:.2} (technicals from {}: calls {:?}, puts {:?})",
            underlying.symbol,
            underlying.spot,
            underlying.governing.symbol,
            underlying.call_regime,
            underlying.put_regime
        );
        for eval in &underlying.contracts {
            println!(
                "  {:<6} {} {:>8} {}  mid {:>6.2}  delta {:>6.2}  ret {:>7.2}%  OI {:>6}  vol {:>5}",
                eval.signal.color,
                eval.key.expiration,
                eval.key.strike,
                eval.key.right.as_str(),
                eval.mid,
                eval.delta,
                eval.annualized_return,
                eval.signal.open_interest,
                eval.signal.volume
            );
            for finding in &eval.signal.findings {
                println!("           - {}", finding.detail);
            }
        }
        println!();
    }

    println!("Summary:");
    for summary in &report.summary.underlyings {
        println!("  {:<6} {:<6} {}", summary.symbol, summary.best, summary.status_text());
    }
    println!(
        "  {} green, {} yellow, {} red",
        report.summary.green, report.summary.yellow, report.summary.red
    );
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("premium_signals=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::CheckConfig { config } => {
            let config = load_config(Some(&config))?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Evaluate {
            config,
            snapshot,
            json,
        } => {
            let config = load_config(config.as_ref())?;
            let raw = fs::read_to_string(&snapshot)
                .with_context(|| format!("Failed to read snapshot {}", snapshot.display()))?;
            let input: RefreshInput = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid snapshot {}", snapshot.display()))?;

            let report = run_refresh(&input, &config).context("Refresh failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
    }

    Ok(())
}
