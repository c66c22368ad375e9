//! # Teleinfo Session
//!
//! A [`Teleinfo`] session owns the decode loop: one task that reads the meter
//! output, decodes records and applies them to the shared
//! [`MeasurementState`]. Readings can be queried at any time from other tasks.
//!
//! ```rust,no_run
//! use teleinfo_rs::teleinfo::reader::{Teleinfo, TeleinfoOptions};
//!
//! # async fn run() -> Result<(), teleinfo_rs::TeleinfoError> {
//! let session = Teleinfo::open("/dev/ttyAMA0", TeleinfoOptions::default())?;
//! tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//! println!("current: {} A", session.current());
//! session.stop();
//! session.join().await
//! # }
//! ```

use crate::config::SensorsConfig;
use crate::domoticz::scheduler::{JobConfig, SensorJob};
use crate::domoticz::sensor::SensorKind;
use crate::domoticz::sink::PushSink;
use crate::error::TeleinfoError;
use crate::log_warn_throttled;
use crate::teleinfo::frame::{DecoderStats, FrameDecoder};
use crate::teleinfo::measurement::{CurrentCallback, MeasurementSnapshot, MeasurementState};
use crate::teleinfo::serial::{open_port, SerialConfig};
use crate::util::logging::LogThrottle;
use log::{debug, info};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// What the decode loop feeds besides the readings.
#[derive(Default)]
pub struct TeleinfoOptions {
    /// Electric counter device receiving `(power, index)`.
    pub counter_job: Option<SensorJob>,
    /// Current sensor device receiving `(current,)`.
    pub current_job: Option<SensorJob>,
    /// Called from the decode task with every current reading; must not block.
    pub on_current: Option<CurrentCallback>,
}

impl TeleinfoOptions {
    /// Creates the sensor jobs configured in `sensors`, delivering through `sink`.
    ///
    /// A device index of zero means the sensor is not configured.
    pub fn from_config(
        sensors: &SensorsConfig,
        sink: Arc<dyn PushSink>,
    ) -> Result<Self, TeleinfoError> {
        let min = Duration::from_secs(sensors.update_period_secs);
        let max = Duration::from_secs(sensors.heartbeat_secs);
        let job = |kind, idx: u32| -> Result<Option<SensorJob>, TeleinfoError> {
            if idx == 0 {
                return Ok(None);
            }
            let config = JobConfig::new(kind, idx, min).with_heartbeat(max);
            SensorJob::new(config, sink.clone()).map(Some)
        };
        Ok(TeleinfoOptions {
            counter_job: job(SensorKind::ElectricCounter, sensors.counter_idx)?,
            current_job: job(SensorKind::Current, sensors.current_idx)?,
            on_current: None,
        })
    }

    pub fn with_callback(mut self, callback: CurrentCallback) -> Self {
        self.on_current = Some(callback);
        self
    }
}

/// A running decode session.
pub struct Teleinfo {
    state: Arc<MeasurementState>,
    stats: Arc<Mutex<DecoderStats>>,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<Result<(), TeleinfoError>>,
}

impl Teleinfo {
    /// Opens the serial device at 1200 baud and starts decoding.
    pub fn open(device: &str, options: TeleinfoOptions) -> Result<Self, TeleinfoError> {
        Self::open_with_config(device, &SerialConfig::default(), options)
    }

    /// Opens the serial device with explicit line settings and starts decoding.
    pub fn open_with_config(
        device: &str,
        config: &SerialConfig,
        options: TeleinfoOptions,
    ) -> Result<Self, TeleinfoError> {
        let port = open_port(device, config)?;
        Ok(Self::start(port, options))
    }

    /// Starts decoding `source` on the current tokio runtime.
    pub fn start<R>(source: R, options: TeleinfoOptions) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let mut state = MeasurementState::new();
        if let Some(job) = options.counter_job {
            state = state.with_counter_job(job);
        }
        if let Some(job) = options.current_job {
            state = state.with_current_job(job);
        }
        if let Some(callback) = options.on_current {
            state = state.with_callback(callback);
        }
        let state = Arc::new(state);
        let stats = Arc::new(Mutex::new(DecoderStats::default()));
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(decode_loop(
            FrameDecoder::new(source),
            state.clone(),
            stats.clone(),
            stop_rx,
        ));

        Teleinfo {
            state,
            stats,
            stop_tx,
            task,
        }
    }

    /// Instantaneous current in A, -1 if not received yet.
    pub fn current(&self) -> i64 {
        self.state.current()
    }

    /// Apparent power in VA, -1 if not received yet.
    pub fn power(&self) -> i64 {
        self.state.power()
    }

    /// Base index in Wh, -1 if not received yet.
    pub fn index(&self) -> i64 {
        self.state.index()
    }

    pub fn snapshot(&self) -> MeasurementSnapshot {
        self.state.snapshot()
    }

    pub fn stats(&self) -> DecoderStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stops decoding and cancels pending sensor transmissions.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
        self.state.stop_jobs();
    }

    /// Waits for the decode loop to end.
    ///
    /// `Ok` after [`stop`](Self::stop); otherwise the byte source error that
    /// ended the loop.
    pub async fn join(self) -> Result<(), TeleinfoError> {
        self.task
            .await
            .map_err(|e| TeleinfoError::Other(format!("decode task failed: {e}")))?
    }
}

async fn decode_loop<R: AsyncRead + Unpin>(
    mut decoder: FrameDecoder<R>,
    state: Arc<MeasurementState>,
    stats: Arc<Mutex<DecoderStats>>,
    mut stop_rx: watch::Receiver<bool>,
) -> Result<(), TeleinfoError> {
    let mut value_throttle = LogThrottle::new(60_000, 5);
    info!("Teleinfo decode loop started");

    let result = loop {
        if *stop_rx.borrow() {
            break Ok(());
        }
        let record = tokio::select! {
            biased;
            changed = stop_rx.changed() => {
                // A dropped session handle counts as a stop request
                if changed.is_err() {
                    break Ok(());
                }
                continue;
            }
            record = decoder.next_record() => record,
        };
        *stats.lock().unwrap_or_else(PoisonError::into_inner) = decoder.stats();

        match record {
            Ok(record) => match state.on_record(&record) {
                Ok(Some(reading)) => debug!("{} {} -> {reading:?}", record.label, record.value),
                Ok(None) => {}
                Err(e) => log_warn_throttled!(value_throttle, "Skipping record: {e}"),
            },
            Err(e) => break Err(e),
        }
    };

    match &result {
        Ok(()) => info!("Teleinfo decode loop stopped"),
        Err(e) => log::error!("Teleinfo decode loop ended: {e}"),
    }
    state.stop_jobs();
    result
}
