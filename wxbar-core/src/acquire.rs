//! One acquisition cycle: fetch, parse or decode, render.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    api::{self, DecodeError},
    fetch::{Fetch, FetchError},
    model::{NOT_AVAILABLE, WeatherRecord},
    render::Formatter,
    report::{self, ParseError},
};

/// Default location of NOAA's decoded METAR bulletins.
pub const NOAA_DECODED_BASE_URL: &str = "https://tgftp.nws.noaa.gov/data/observations/metar/decoded";

/// Where observations come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Source {
    /// Decoded reports served as `{base_url}/{STATION}.TXT`.
    Report { base_url: String },
    /// JSON conditions endpoint; the URL is used as-is.
    Api { url: String },
}

impl Default for Source {
    fn default() -> Self {
        Source::Report {
            base_url: NOAA_DECODED_BASE_URL.to_string(),
        }
    }
}

impl Source {
    pub fn url_for(&self, station: &str) -> String {
        match self {
            Source::Report { base_url } => format!(
                "{}/{}.TXT",
                base_url.trim_end_matches('/'),
                station.to_uppercase()
            ),
            Source::Api { url } => url.clone(),
        }
    }

    pub fn read(&self, body: &str) -> Result<WeatherRecord, AcquireError> {
        match self {
            Source::Report { .. } => Ok(report::parse(body)?),
            Source::Api { .. } => Ok(api::decode_record(body.as_bytes())?),
        }
    }
}

/// Everything one cycle needs. Immutable once built.
#[derive(Debug, Clone)]
pub struct StationConfig {
    pub station: String,
    pub source: Source,
    pub formatter: Formatter,
}

impl StationConfig {
    pub fn new(station: impl Into<String>, source: Source) -> Self {
        Self {
            station: station.into(),
            source,
            formatter: Formatter::default(),
        }
    }

    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn url(&self) -> String {
        self.source.url_for(&self.station)
    }
}

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Unreadable report: {0}")]
    Parse(#[from] ParseError),

    #[error("Unreadable API payload: {0}")]
    Decode(#[from] DecodeError),
}

/// Receives one message per failed cycle.
pub trait Diagnostics: Send + Sync {
    fn report(&self, message: &str);
}

/// Sends diagnostics to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, message: &str) {
        tracing::warn!(%message, "weather acquisition failed");
    }
}

/// Run one cycle, surfacing the failure cause.
pub async fn try_acquire<F>(fetcher: &F, config: &StationConfig) -> Result<String, AcquireError>
where
    F: Fetch + ?Sized,
{
    let url = config.url();
    tracing::debug!(station = %config.station, %url, "starting acquisition");

    let body = fetcher.fetch(&url).await?;
    let record = config.source.read(&body)?;
    let text = config.formatter.format(&record);

    tracing::debug!(station = %config.station, %text, "acquisition succeeded");
    Ok(text)
}

/// Run one cycle. Any failure is reported once to `diagnostics` and shown as `N/A`.
pub async fn acquire<F, D>(fetcher: &F, config: &StationConfig, diagnostics: &D) -> String
where
    F: Fetch + ?Sized,
    D: Diagnostics + ?Sized,
{
    match try_acquire(fetcher, config).await {
        Ok(text) => text,
        Err(e) => {
            diagnostics.report(&format!("{}: {e}", config.url()));
            NOT_AVAILABLE.to_string()
        }
    }
}
