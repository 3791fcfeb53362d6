//! BirdWeather Digest CLI
//!
//! Builds a species report for the last N hours of a BirdWeather station.

use anyhow::{bail, Context, Result};
use birdweather_digest::{
    config::{Config, WebhookConfig},
    fetcher::{BlockingDetectionSource, StationEndpoint},
    notify::{FileNotifier, Notifier, SmtpNotifier, StdoutNotifier, WebhookNotifier},
    pipeline::generate_summary,
    report::{self, ReportFormat},
    VERSION,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "birdweather-digest")]
#[command(version = VERSION)]
#[command(about = "Species digest for a BirdWeather station", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the per-user config path)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, aggregate and deliver a report
    Report {
        /// Number of hours to include in the report
        #[arg(long)]
        hours: Option<u32>,

        /// Station token (overrides the config file)
        #[arg(long)]
        station: Option<String>,

        /// Zone for hour-of-day buckets, "UTC" or an IANA name
        #[arg(long)]
        zone: Option<String>,

        /// Output format (html or json)
        #[arg(long, default_value = "html")]
        format: String,

        /// Directory to write the report into
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Print the report to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,

        /// Also post the report to this webhook URL
        #[arg(long)]
        webhook: Option<String>,

        /// Also email the report through the configured SMTP relay
        #[arg(long)]
        email: bool,
    },

    /// Show configuration
    Config,

    /// Write a default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "birdweather_digest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(Config::config_path);

    let result = match cli.command {
        Commands::Report {
            hours,
            station,
            zone,
            format,
            output,
            stdout,
            webhook,
            email,
        } => cmd_report(
            &config_path,
            ReportArgs {
                hours,
                station,
                zone,
                format,
                output,
                stdout,
                webhook,
                email,
            },
        ),
        Commands::Config => cmd_config(&config_path),
        Commands::InitConfig { force } => cmd_init_config(&config_path, force),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

struct ReportArgs {
    hours: Option<u32>,
    station: Option<String>,
    zone: Option<String>,
    format: String,
    output: Option<PathBuf>,
    stdout: bool,
    webhook: Option<String>,
    email: bool,
}

fn cmd_report(config_path: &Path, args: ReportArgs) -> Result<()> {
    let mut config = Config::load_from(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    if let Some(hours) = args.hours {
        config.hours = hours;
    }
    if let Some(station) = args.station {
        config.station_token = station;
    }
    if let Some(zone) = args.zone {
        config.hour_zone = zone;
    }
    if let Some(url) = args.webhook {
        config.webhook = Some(WebhookConfig { url, token: None });
    }
    let format: ReportFormat = args.format.parse().map_err(anyhow::Error::msg)?;
    config.validate()?;
    if args.email && config.smtp.is_none() {
        bail!("--email needs an \"smtp\" section in {}", config_path.display());
    }

    tracing::info!(hours = config.hours, "Starting report generation");

    let endpoint = StationEndpoint::new(
        config.api_base.clone(),
        config.station_token.clone(),
        config.request_timeout,
    );
    let source = BlockingDetectionSource::new(endpoint)?;
    let run = generate_summary(&config, &source, Utc::now())?;

    tracing::info!(
        species = run.summary.total_species,
        detections = run.summary.total_detections,
        stop_reason = ?run.fetch_stats.stop_reason,
        "Report summary ready"
    );

    let document = report::render(&run.summary, format).context("Failed to render report")?;

    let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();
    if args.stdout {
        notifiers.push(Box::new(StdoutNotifier));
    } else {
        let dir = args.output.unwrap_or_else(|| config.export_path.clone());
        notifiers.push(Box::new(FileNotifier::new(dir)));
    }
    if let Some(webhook) = config.webhook.clone() {
        notifiers.push(Box::new(WebhookNotifier::new(
            webhook,
            config.request_timeout,
        )?));
    }
    if args.email {
        if let Some(smtp) = config.smtp.clone() {
            notifiers.push(Box::new(SmtpNotifier::new(smtp, config.request_timeout)?));
        }
    }

    for notifier in &notifiers {
        notifier
            .deliver(&document)
            .with_context(|| format!("Delivery via {} failed", notifier.name()))?;
    }

    tracing::info!(report_id = %run.summary.meta.report_id, "Report delivered");
    Ok(())
}

fn cmd_config(config_path: &Path) -> Result<()> {
    let config = Config::load_from(config_path)?;
    let mut shown = config.clone();
    if let Some(smtp) = shown.smtp.as_mut() {
        smtp.password = "********".to_string();
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {config_path:?}");
    println!();
    println!("{}", serde_json::to_string_pretty(&shown)?);

    if let Err(e) = config.validate() {
        println!();
        println!("Warning: {e}");
    }
    Ok(())
}

fn cmd_init_config(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }

    Config::default().save_to(config_path)?;
    println!("Wrote default configuration to {config_path:?}");
    println!("Set \"station_token\" before running `birdweather-digest report`.");
    Ok(())
}
