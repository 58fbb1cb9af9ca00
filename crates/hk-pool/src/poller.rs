//! Background loop that polls the pool sensor and appends to the status log.
//!
//! The loop never exits on its own: fetch failures and log write failures are
//! logged and the next tick happens after the configured delay. The only way
//! out is the cancellation token, which aborts an in-flight fetch or sleep.
//! A snapshot that was already fetched is always appended and counted before
//! the loop exits.

use std::sync::Arc;
use std::time::Duration;

use hk_core::{StampZone, StatusSnapshot};
use serde_json::{Map, Value};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::RemoteFetchError;
use crate::source::StatusSource;
use crate::status_log::StatusLog;

const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
/// Caps the backoff exponent so the multiplier cannot overflow.
const MAX_BACKOFF_SHIFT: u32 = 16;

/// Delay between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// Always wait the base interval.
    #[default]
    Fixed,
    /// Double the interval per consecutive failure, capped at `max_delay`.
    /// Resets after a successful tick.
    Backoff { max_delay: Duration },
}

impl RetryPolicy {
    pub fn delay(&self, interval: Duration, consecutive_failures: u32) -> Duration {
        match self {
            Self::Fixed => interval,
            Self::Backoff { max_delay } => {
                let factor = 1u32 << consecutive_failures.min(MAX_BACKOFF_SHIFT);
                interval
                    .saturating_mul(factor)
                    .min((*max_delay).max(interval))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    /// Upper bound for a single fetch.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::Fixed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Between ticks.
    Idle,
    /// Request in flight.
    Polling,
    /// Loop exited after cancellation.
    Stopped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollerStats {
    pub ticks: u64,
    pub successes: u64,
    pub failures: u64,
    pub consecutive_failures: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A snapshot was appended.
    Logged,
    /// The device could not be read; nothing was appended.
    FetchFailed,
    /// The device answered but the log write failed.
    AppendFailed,
}

pub struct DevicePoller {
    source: Box<dyn StatusSource>,
    log: Arc<StatusLog>,
    config: PollerConfig,
    zone: StampZone,
    stats: PollerStats,
    state: watch::Sender<PollerState>,
}

impl DevicePoller {
    /// `zone` is the zone snapshots are stamped in.
    pub fn new(
        source: Box<dyn StatusSource>,
        log: Arc<StatusLog>,
        config: PollerConfig,
        zone: StampZone,
    ) -> Self {
        let (state, _) = watch::channel(PollerState::Idle);
        Self {
            source,
            log,
            config,
            zone,
            stats: PollerStats::default(),
            state,
        }
    }

    pub fn stats(&self) -> PollerStats {
        self.stats
    }

    pub fn state(&self) -> PollerState {
        *self.state.borrow()
    }

    /// Delay before the next tick given the current failure streak.
    pub fn next_delay(&self) -> Duration {
        self.config
            .retry
            .delay(self.config.interval, self.stats.consecutive_failures)
    }

    /// Run a single poll: fetch, then append on success.
    pub async fn tick(&mut self) -> TickOutcome {
        let fetched = self.fetch().await;
        self.complete(fetched).await
    }

    /// Bounded by the fetch timeout. Dropping this future abandons the request.
    async fn fetch(&self) -> Result<Map<String, Value>, RemoteFetchError> {
        self.state.send_replace(PollerState::Polling);
        let fetched = match tokio::time::timeout(self.config.timeout, self.source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(RemoteFetchError::Timeout),
        };
        self.state.send_replace(PollerState::Idle);
        fetched
    }

    /// Append a fetched payload (or report the failure) and update the counters.
    async fn complete(
        &mut self,
        fetched: Result<Map<String, Value>, RemoteFetchError>,
    ) -> TickOutcome {
        let outcome = match fetched {
            Ok(payload) => {
                let snapshot = StatusSnapshot::new(payload, self.zone.now());
                self.append(snapshot).await
            }
            Err(error) => {
                warn!(
                    endpoint = %self.source.endpoint(),
                    error = %error,
                    consecutive_failures = self.stats.consecutive_failures + 1,
                    "pool status poll failed"
                );
                TickOutcome::FetchFailed
            }
        };
        self.record(outcome);
        outcome
    }

    /// Poll until `cancel` fires. Returns the final counters.
    pub async fn run(mut self, cancel: CancellationToken) -> PollerStats {
        info!(
            endpoint = %self.source.endpoint(),
            interval_secs = self.config.interval.as_secs_f64(),
            timeout_secs = self.config.timeout.as_secs_f64(),
            retry = ?self.config.retry,
            "pool poller started"
        );

        loop {
            let fetched = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                fetched = self.fetch() => fetched,
            };
            // Not raced against `cancel`: a fetched snapshot is always written.
            let outcome = self.complete(fetched).await;

            let delay = self.next_delay();
            debug!(
                ?outcome,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "pool poller sleeping"
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }

        self.state.send_replace(PollerState::Stopped);
        info!(
            ticks = self.stats.ticks,
            successes = self.stats.successes,
            failures = self.stats.failures,
            "pool poller stopped"
        );
        self.stats
    }

    /// Run on a tokio task until `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> PollerHandle {
        let state = self.state.subscribe();
        let join_handle = tokio::spawn(self.run(cancel.clone()));
        PollerHandle {
            cancel,
            state,
            join_handle,
        }
    }

    async fn append(&self, snapshot: StatusSnapshot) -> TickOutcome {
        let log = Arc::clone(&self.log);
        match tokio::task::spawn_blocking(move || log.append(&snapshot)).await {
            Ok(Ok(())) => {
                info!(path = %self.log.path().display(), "pool status logged");
                TickOutcome::Logged
            }
            Ok(Err(error)) => {
                warn!(
                    path = %self.log.path().display(),
                    error = %error,
                    "failed to append pool status"
                );
                TickOutcome::AppendFailed
            }
            Err(error) => {
                warn!(error = %error, "pool status append task failed");
                TickOutcome::AppendFailed
            }
        }
    }

    fn record(&mut self, outcome: TickOutcome) {
        self.stats.ticks += 1;
        match outcome {
            TickOutcome::Logged => {
                self.stats.successes += 1;
                self.stats.consecutive_failures = 0;
            }
            TickOutcome::FetchFailed | TickOutcome::AppendFailed => {
                self.stats.failures += 1;
                self.stats.consecutive_failures = self.stats.consecutive_failures.saturating_add(1);
            }
        }
    }
}

/// Handle to a spawned [`DevicePoller`].
#[derive(Debug)]
pub struct PollerHandle {
    cancel: CancellationToken,
    state: watch::Receiver<PollerState>,
    join_handle: JoinHandle<PollerStats>,
}

impl PollerHandle {
    pub fn state(&self) -> PollerState {
        *self.state.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }

    /// Cancel the loop and wait for it to exit.
    pub async fn shutdown(self) -> PollerStats {
        self.cancel.cancel();
        match self.join_handle.await {
            Ok(stats) => stats,
            Err(error) => {
                warn!(error = %error, "pool poller task join failed");
                PollerStats::default()
            }
        }
    }
}
