//! Background credential refresh.
//!
//! Access tokens expire after about an hour, so the `set-*` commands can stay
//! running and rewrite their config file on a fixed interval.

use crate::duration::format_duration;
use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

/// Shortest refresh interval accepted from the command line.
pub const MIN_INTERVAL: Duration = Duration::from_secs(2 * 60);

/// How long a background refresh runs when no duration is given.
pub const DEFAULT_DURATION: Duration = Duration::from_secs(12 * 60 * 60);

/// Longest refresh interval or duration accepted from the command line.
pub const MAX_PERIOD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// When to repeat an update after the first run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    interval: Option<Duration>,
    duration: Duration,
}

impl RefreshPolicy {
    /// Run once and stop.
    pub fn once() -> Self {
        RefreshPolicy {
            interval: None,
            duration: Duration::ZERO,
        }
    }

    /// Repeat every `interval` for `duration`. A zero interval means run once.
    pub fn every(interval: Duration, duration: Duration) -> Self {
        RefreshPolicy {
            interval: Some(interval).filter(|i| !i.is_zero()),
            duration,
        }
    }

    /// Build a policy from command line values, enforcing [`MIN_INTERVAL`]
    /// and [`MAX_PERIOD`].
    pub fn from_flags(interval: Option<Duration>, duration: Duration) -> Result<Self> {
        let mut problems = Vec::new();
        match interval {
            Some(i) if !i.is_zero() && i < MIN_INTERVAL => problems.push(format!(
                "background refresh interval must be at least {}",
                format_duration(MIN_INTERVAL)
            )),
            Some(i) if i > MAX_PERIOD => problems.push(format!(
                "background refresh interval must be at most {}",
                format_duration(MAX_PERIOD)
            )),
            _ => {}
        }
        if interval.is_some_and(|i| !i.is_zero()) && duration > MAX_PERIOD {
            problems.push(format!(
                "background refresh duration must be at most {}",
                format_duration(MAX_PERIOD)
            ));
        }
        if !problems.is_empty() {
            return Err(Error::Invalid(problems));
        }

        Ok(match interval {
            Some(i) => Self::every(i, duration),
            None => Self::once(),
        })
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Run `tick` now, then on every interval of `policy`.
///
/// Returns `Ok` once the policy's duration has elapsed or `shutdown`
/// completes, and the first error any tick returns. A tick that is running
/// when the deadline passes is allowed to finish.
pub async fn run<S, F, Fut>(policy: RefreshPolicy, shutdown: S, mut tick: F) -> Result<()>
where
    S: Future,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    tick().await?;

    let Some(period) = policy.interval else {
        return Ok(());
    };
    tracing::info!(
        interval = %format_duration(period),
        duration = %format_duration(policy.duration),
        "refreshing credentials in the background"
    );

    let deadline = sleep(policy.duration);
    tokio::pin!(deadline);
    tokio::pin!(shutdown);

    let first = Instant::now().checked_add(period).ok_or_else(|| {
        Error::invalid(format!(
            "background refresh interval {} is too long",
            format_duration(period)
        ))
    })?;
    let mut ticker = interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut count: u64 = 1;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                count += 1;
                if let Err(e) = tick().await {
                    tracing::error!(refresh = count, error = %e, "failed to refresh credential");
                    return Err(e);
                }
                tracing::info!(refresh = count, "refreshed credentials");
            }
            _ = &mut deadline => {
                tracing::info!(refreshes = count, "background refresh duration elapsed");
                return Ok(());
            }
            _ = &mut shutdown => {
                tracing::info!(refreshes = count, "background refresh cancelled");
                return Ok(());
            }
        }
    }
}
