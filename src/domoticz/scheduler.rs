//! # Debounced Transmission Scheduler
//!
//! One [`SensorJob`] per Domoticz device. Updates are coalesced so that:
//!
//! - at most one transmission is pending per job, and the latest value wins;
//! - at most one push is in flight; a timer firing meanwhile waits for it;
//! - two transmissions are never closer than `min_interval`;
//! - with `max_interval > 0`, the last value is sent again `max_interval`
//!   after every successful transmission (heartbeat).
//!
//! ```text
//!            send / refresh(new)
//!   Idle ─────────────────────────▶ Scheduled ──┐ send / refresh(new):
//!    ▲                                 │  ▲     │ cancel + re-arm
//!    │ push failed, or ok without      │  └─────┘
//!    │ heartbeat                       │ timer fires: push
//!    └─────────────────────────────────┘ ok + heartbeat: re-arm max_interval
//! ```
//!
//! Timers run on the tokio runtime the job was created in. All state is
//! guarded by the job's mutex; the push itself happens outside the lock.
//! All interval math uses the monotonic tokio clock.

use crate::domoticz::sensor::{SensorKind, SensorValues};
use crate::domoticz::sink::PushSink;
use crate::error::TeleinfoError;
use log::{debug, trace, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

/// Construction parameters of a sensor job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub kind: SensorKind,
    /// Domoticz device index.
    pub idx: u32,
    /// Minimum spacing between two transmissions.
    pub min_interval: Duration,
    /// Heartbeat period; zero disables the heartbeat.
    pub max_interval: Duration,
}

impl JobConfig {
    pub fn new(kind: SensorKind, idx: u32, min_interval: Duration) -> Self {
        JobConfig {
            kind,
            idx,
            min_interval,
            max_interval: Duration::ZERO,
        }
    }

    pub fn with_heartbeat(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval;
        self
    }
}

/// Whether a transmission is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Idle,
    Scheduled,
}

struct Pending {
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct JobState {
    values: Option<SensorValues>,
    last_sent: Option<Instant>,
    pending: Option<Pending>,
    /// Bumped every time a timer is armed; a timer only fires if it is current.
    generation: u64,
    /// A push is running outside the lock.
    in_flight: bool,
    /// A timer fired during the push; send again once it completes.
    deferred: bool,
    stopped: bool,
    sent: u64,
    failed: u64,
}

struct JobInner {
    config: JobConfig,
    sink: Arc<dyn PushSink>,
    runtime: Handle,
    state: Mutex<JobState>,
}

impl Drop for JobInner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(pending) = state.pending.take() {
            pending.handle.abort();
        }
    }
}

/// Transmission counters of a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobStats {
    pub sent: u64,
    pub failed: u64,
}

/// Rate-limited, deduplicated delivery of one sensor's values.
///
/// Cloning yields another handle to the same job.
#[derive(Clone)]
pub struct SensorJob {
    inner: Arc<JobInner>,
}

impl SensorJob {
    /// Creates an idle job. Must be called from within a tokio runtime.
    pub fn new(config: JobConfig, sink: Arc<dyn PushSink>) -> Result<Self, TeleinfoError> {
        let runtime = Handle::try_current()
            .map_err(|e| TeleinfoError::Other(format!("sensor job needs a tokio runtime: {e}")))?;
        Ok(SensorJob {
            inner: Arc::new(JobInner {
                config,
                sink,
                runtime,
                state: Mutex::new(JobState::default()),
            }),
        })
    }

    pub fn config(&self) -> &JobConfig {
        &self.inner.config
    }

    fn lock(&self) -> MutexGuard<'_, JobState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Like [`send`](Self::send), but a no-op when `values` equal the stored ones.
    pub fn refresh(&self, values: impl Into<SensorValues>) {
        let values = values.into();
        let mut state = self.lock();
        if state.values.as_ref() == Some(&values) {
            trace!("idx {}: refresh {values} unchanged", self.inner.config.idx);
            return;
        }
        self.schedule(&mut state, values);
    }

    /// Stores `values` and arms a transmission as soon as `min_interval` allows.
    pub fn send(&self, values: impl Into<SensorValues>) {
        let values = values.into();
        let mut state = self.lock();
        self.schedule(&mut state, values);
    }

    fn schedule(&self, state: &mut JobState, values: SensorValues) {
        if state.stopped {
            debug!("idx {}: stopped, ignoring {values}", self.inner.config.idx);
            return;
        }
        let wait = self.wait_time(state);
        debug!("idx {}: {values} scheduled in {wait:?}", self.inner.config.idx);
        state.values = Some(values);
        self.arm(state, wait);
    }

    /// Time left before `min_interval` has elapsed since the last transmission.
    fn wait_time(&self, state: &JobState) -> Duration {
        match state.last_sent {
            Some(last) => (last + self.inner.config.min_interval)
                .saturating_duration_since(Instant::now()),
            None => Duration::ZERO,
        }
    }

    /// Cancels any pending timer and arms a new one firing after `delay`.
    fn arm(&self, state: &mut JobState, delay: Duration) {
        if let Some(pending) = state.pending.take() {
            pending.handle.abort();
        }
        state.generation += 1;
        let generation = state.generation;
        let job = Arc::downgrade(&self.inner);
        let handle = self.inner.runtime.spawn(async move {
            sleep(delay).await;
            Self::fire(job, generation).await;
        });
        state.pending = Some(Pending { handle });
    }

    async fn fire(job: Weak<JobInner>, generation: u64) {
        let Some(inner) = job.upgrade() else {
            return;
        };
        let job = SensorJob { inner };
        let config = &job.inner.config;

        let payload = {
            let mut state = job.lock();
            if state.stopped || state.generation != generation {
                return;
            }
            // Detach: a send arriving during the push must not abort it.
            state.pending = None;
            if state.in_flight {
                state.deferred = true;
                return;
            }
            let Some(values) = state.values.clone() else {
                return;
            };
            match config.kind.format(config.idx, &values) {
                Ok(payload) => {
                    state.in_flight = true;
                    payload
                }
                Err(e) => {
                    warn!("idx {}: cannot format {values}: {e}", config.idx);
                    return;
                }
            }
        };

        trace!("idx {}: pushing {payload}", config.idx);
        let result = job.inner.sink.push(&payload).await;

        let mut state = job.lock();
        state.in_flight = false;
        match &result {
            Ok(()) => {
                state.last_sent = Some(Instant::now());
                state.sent += 1;
            }
            Err(e) => {
                state.failed += 1;
                warn!("idx {}: transmission failed: {e}", config.idx);
            }
        }
        if state.stopped {
            return;
        }
        if std::mem::take(&mut state.deferred) {
            let wait = job.wait_time(&state);
            job.arm(&mut state, wait);
        } else if result.is_ok() && !config.max_interval.is_zero() && state.pending.is_none() {
            job.arm(&mut state, config.max_interval);
        }
    }

    /// Cancels any pending transmission; the job ignores updates afterwards.
    pub fn stop(&self) {
        let mut state = self.lock();
        state.stopped = true;
        if let Some(pending) = state.pending.take() {
            debug!("idx {}: pending transmission cancelled", self.inner.config.idx);
            pending.handle.abort();
        }
    }

    pub fn phase(&self) -> JobPhase {
        if self.lock().pending.is_some() {
            JobPhase::Scheduled
        } else {
            JobPhase::Idle
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// The values the next transmission will carry.
    pub fn values(&self) -> Option<SensorValues> {
        self.lock().values.clone()
    }

    pub fn last_sent(&self) -> Option<Instant> {
        self.lock().last_sent
    }

    pub fn stats(&self) -> JobStats {
        let state = self.lock();
        JobStats {
            sent: state.sent,
            failed: state.failed,
        }
    }
}

impl std::fmt::Debug for SensorJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorJob")
            .field("config", &self.inner.config)
            .field("phase", &self.phase())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NullSink;

    #[async_trait]
    impl PushSink for NullSink {
        async fn push(&self, _payload: &str) -> Result<(), TeleinfoError> {
            Ok(())
        }
    }

    fn job(min: u64, max: u64) -> SensorJob {
        let config = JobConfig::new(SensorKind::Current, 1, Duration::from_secs(min))
            .with_heartbeat(Duration::from_secs(max));
        SensorJob::new(config, Arc::new(NullSink)).unwrap()
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let config = JobConfig::new(SensorKind::Current, 1, Duration::ZERO);
        assert!(SensorJob::new(config, Arc::new(NullSink)).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_transitions() {
        let job = job(5, 0);
        assert_eq!(job.phase(), JobPhase::Idle);

        job.send(3u64);
        assert_eq!(job.phase(), JobPhase::Scheduled);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(job.phase(), JobPhase::Idle);
        assert_eq!(job.stats().sent, 1);
        assert!(job.last_sent().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_keeps_job_scheduled() {
        let job = job(5, 60);
        job.send(3u64);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(job.phase(), JobPhase::Scheduled);
        job.stop();
        assert_eq!(job.phase(), JobPhase::Idle);
        assert!(job.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_after_stop_is_ignored() {
        let job = job(0, 0);
        job.stop();
        job.send(3u64);
        assert_eq!(job.phase(), JobPhase::Idle);
        assert_eq!(job.values(), None);
    }
}
