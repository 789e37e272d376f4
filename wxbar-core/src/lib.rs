//! Core library for the `wxbar` status label.
//!
//! This crate defines:
//! - The tolerant decoded-METAR parser and the strict JSON conditions decoder
//! - `$name$` template rendering of the resulting record
//! - The fetch / acquire / poll pipeline and its collaborator traits
//! - Configuration handling
//!
//! It is used by `wxbar-cli`, but any host that can display a string can drive a [`Poller`].

pub mod acquire;
pub mod api;
pub mod config;
pub mod fetch;
pub mod model;
pub mod poll;
pub mod render;
pub mod report;

pub use acquire::{
    AcquireError, Diagnostics, Source, StationConfig, TracingDiagnostics, acquire, try_acquire,
};
pub use api::{ApiPayload, DecodeError};
pub use config::Config;
pub use fetch::{Fetch, FetchError, HttpFetcher};
pub use model::{NOT_AVAILABLE, WeatherRecord};
pub use poll::{Poller, Surface};
pub use render::{Formatter, Placeholder, render};
pub use report::ParseError;
