use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Select, Text};
use wxbar_core::{
    Config, Formatter, HttpFetcher, Placeholder, Poller, Source, StationConfig, Surface,
    TracingDiagnostics, acquire, acquire::NOAA_DECODED_BASE_URL, api, report, try_acquire,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxbar", version, about = "Station weather as a one-line label")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Per-invocation overrides of the stored configuration.
#[derive(Debug, clap::Args)]
pub struct Overrides {
    /// Station code, e.g. "KSFO".
    #[arg(long)]
    station: Option<String>,

    /// Display template, e.g. "$tempC$°C $skyCondition$".
    #[arg(long)]
    template: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively write the configuration file.
    Configure,

    /// Fetch once and print the label.
    Show {
        #[command(flatten)]
        overrides: Overrides,

        /// Fail with the underlying error instead of printing "N/A".
        #[arg(long)]
        strict: bool,
    },

    /// Keep printing the label, refreshing on a fixed period, until Ctrl-C.
    Watch {
        #[command(flatten)]
        overrides: Overrides,

        /// Refresh period in minutes.
        #[arg(long)]
        every: Option<u64>,
    },

    /// Render a report (or JSON payload) stored in a local file.
    Render {
        /// File to read.
        #[arg(long, required_unless_present = "list_placeholders")]
        file: Option<PathBuf>,

        /// Treat the file as a JSON conditions payload.
        #[arg(long)]
        json: bool,

        /// Display template; defaults to the configured one.
        #[arg(long)]
        template: Option<String>,

        /// Print the template vocabulary and exit.
        #[arg(long)]
        list_placeholders: bool,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { overrides, strict } => show(overrides, strict).await,
            Command::Watch { overrides, every } => watch(overrides, every).await,
            Command::Render {
                file,
                json,
                template,
                list_placeholders,
            } => {
                if list_placeholders {
                    for p in Placeholder::ALL {
                        println!("${p}$");
                    }
                    return Ok(());
                }
                match file {
                    Some(file) => render_file(file, json, template),
                    None => Ok(()),
                }
            }
        }
    }
}

fn station_config(cfg: &Config, overrides: Overrides) -> Result<StationConfig> {
    let mut cfg = cfg.clone();
    if let Some(station) = overrides.station {
        cfg.station = Some(station);
    }
    if let Some(template) = overrides.template {
        cfg.template = template;
    }
    cfg.station_config()
}

async fn show(overrides: Overrides, strict: bool) -> Result<()> {
    let cfg = Config::load()?;
    let station = station_config(&cfg, overrides)?;
    let fetcher = HttpFetcher::new()?;

    let text = if strict {
        try_acquire(&fetcher, &station)
            .await
            .with_context(|| format!("Failed to acquire weather from {}", station.url()))?
    } else {
        acquire(&fetcher, &station, &TracingDiagnostics).await
    };

    println!("{text}");
    Ok(())
}

/// Prints every refreshed label on its own line.
struct StdoutSurface;

impl Surface for StdoutSurface {
    fn show(&mut self, text: &str) {
        println!("{text}");
    }
}

async fn watch(overrides: Overrides, every: Option<u64>) -> Result<()> {
    let cfg = Config::load()?;
    let station = station_config(&cfg, overrides)?;
    let minutes = every.unwrap_or(cfg.period_minutes).max(1);
    let fetcher = HttpFetcher::new()?;

    tracing::info!(station = %station.station, url = %station.url(), minutes, "watching");

    let poller = Poller::from_minutes(station, minutes);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
        }
    };

    poller
        .run_until(&fetcher, &mut StdoutSurface, &TracingDiagnostics, shutdown)
        .await;
    Ok(())
}

fn render_file(file: PathBuf, json: bool, template: Option<String>) -> Result<()> {
    let contents = fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let record = if json {
        api::decode_record(contents.as_bytes())
            .with_context(|| format!("Failed to decode {}", file.display()))?
    } else {
        report::parse(&contents).with_context(|| format!("Failed to parse {}", file.display()))?
    };

    let template = match template {
        Some(t) => t,
        None => Config::load()?.template,
    };

    println!("{}", Formatter::Template(template).format(&record));
    Ok(())
}

fn configure() -> Result<()> {
    let mut cfg = Config::load()?;

    let station = Text::new("Station code:")
        .with_help_message("ICAO identifier, e.g. KSFO")
        .with_initial_value(cfg.station.as_deref().unwrap_or_default())
        .prompt()?;
    cfg.station = Some(station.trim().to_uppercase());

    let kinds = vec!["report", "api"];
    let start = match cfg.source {
        Source::Report { .. } => 0,
        Source::Api { .. } => 1,
    };
    let kind = Select::new("Source:", kinds)
        .with_starting_cursor(start)
        .prompt()?;

    cfg.source = if kind == "api" {
        let current = match &cfg.source {
            Source::Api { url } => url.clone(),
            Source::Report { .. } => String::new(),
        };
        let url = Text::new("Conditions API URL:")
            .with_help_message("full endpoint, including the API key")
            .with_initial_value(&current)
            .prompt()?;
        Source::Api { url }
    } else {
        let current = match &cfg.source {
            Source::Report { base_url } => base_url.clone(),
            Source::Api { .. } => NOAA_DECODED_BASE_URL.to_string(),
        };
        let base_url = Text::new("Decoded report base URL:")
            .with_initial_value(&current)
            .prompt()?;
        Source::Report { base_url }
    };

    let template = Text::new("Template:")
        .with_help_message("see `wxbar render --list-placeholders`")
        .with_initial_value(&cfg.template)
        .prompt()?;
    cfg.template = template;

    cfg.period_minutes = CustomType::<u64>::new("Refresh period (minutes):")
        .with_default(cfg.period_minutes)
        .with_error_message("Please type a whole number of minutes")
        .prompt()?;

    let path = cfg.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}
