use std::{future::Future, time::Duration};

use tokio::time::{self, MissedTickBehavior};

use crate::{
    acquire::{Diagnostics, StationConfig, acquire},
    fetch::Fetch,
    model::NOT_AVAILABLE,
};

/// Host surface that owns the displayed text.
pub trait Surface {
    fn show(&mut self, text: &str);
}

/// Periodically acquires and displays a station's weather.
///
/// Cycles never overlap: a tick that comes due while a cycle is still running
/// is skipped.
#[derive(Debug, Clone)]
pub struct Poller {
    config: StationConfig,
    period: Duration,
}

impl Poller {
    pub fn new(config: StationConfig, period: Duration) -> Self {
        Self { config, period }
    }

    pub fn from_minutes(config: StationConfig, minutes: u64) -> Self {
        Self::new(config, Duration::from_secs(minutes.saturating_mul(60)))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Show `N/A`, then run a cycle now and on every period until `shutdown` resolves.
    pub async fn run_until<F, S, D>(
        &self,
        fetcher: &F,
        surface: &mut S,
        diagnostics: &D,
        shutdown: impl Future<Output = ()>,
    ) where
        F: Fetch + ?Sized,
        S: Surface + ?Sized,
        D: Diagnostics + ?Sized,
    {
        surface.show(NOT_AVAILABLE);

        // interval panics on a zero period
        let mut ticks = time::interval(self.period.max(Duration::from_millis(1)));
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticks.tick() => {}
            }

            tokio::select! {
                _ = &mut shutdown => break,
                text = acquire(fetcher, &self.config, diagnostics) => surface.show(&text),
            }
        }

        tracing::debug!(station = %self.config.station, "poller stopped");
    }
}
