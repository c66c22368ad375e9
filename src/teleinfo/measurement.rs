//! # Measurement State
//!
//! Latest meter readings, updated from decoded records and read from any task.
//! Writes and the paired `(power, index)` read happen under one lock, so a
//! reader never sees a half-updated snapshot.

use crate::constants::{LABEL_BASE, LABEL_IINST, LABEL_PAPP};
use crate::domoticz::scheduler::SensorJob;
use crate::error::TeleinfoError;
use crate::teleinfo::frame::Record;
use crate::teleinfo::value::parse_reading;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Hook called with every valid current reading, from the decode task.
///
/// It runs inline with decoding: it must return quickly and never block,
/// otherwise the serial input backs up.
pub type CurrentCallback = Box<dyn Fn(u64) + Send + Sync>;

/// Latest known readings; `None` until first received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeasurementSnapshot {
    /// Instantaneous current, in A.
    pub current: Option<u64>,
    /// Apparent power, in VA.
    pub power: Option<u64>,
    /// Base index, in Wh.
    pub index: Option<u64>,
}

/// A reading accepted by [`MeasurementState::on_record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    Current(u64),
    Index(u64),
    Power(u64),
}

/// Shared meter readings plus the sinks they feed.
#[derive(Default)]
pub struct MeasurementState {
    readings: Mutex<MeasurementSnapshot>,
    on_current: Option<CurrentCallback>,
    current_job: Option<SensorJob>,
    counter_job: Option<SensorJob>,
}

impl MeasurementState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(mut self, callback: CurrentCallback) -> Self {
        self.on_current = Some(callback);
        self
    }

    /// Job receiving `(current,)` updates.
    pub fn with_current_job(mut self, job: SensorJob) -> Self {
        self.current_job = Some(job);
        self
    }

    /// Job receiving `(power, index)` updates.
    pub fn with_counter_job(mut self, job: SensorJob) -> Self {
        self.counter_job = Some(job);
        self
    }

    fn lock(&self) -> MutexGuard<'_, MeasurementSnapshot> {
        self.readings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies one decoded record.
    ///
    /// Returns `Ok(None)` for labels this bridge does not track, and
    /// `InvalidValue` (with the state untouched) for a non-numeric reading.
    pub fn on_record(&self, record: &Record) -> Result<Option<Reading>, TeleinfoError> {
        let label = record.label.as_str();
        if ![LABEL_IINST, LABEL_BASE, LABEL_PAPP].contains(&label) {
            return Ok(None);
        }
        let value = parse_reading(label, &record.value)?;

        let reading = match label {
            LABEL_IINST => {
                self.lock().current = Some(value);
                if let Some(callback) = &self.on_current {
                    callback(value);
                }
                if let Some(job) = &self.current_job {
                    job.refresh(value);
                }
                Reading::Current(value)
            }
            LABEL_BASE => {
                let power = {
                    let mut readings = self.lock();
                    readings.index = Some(value);
                    readings.power
                };
                if let (Some(job), Some(power)) = (&self.counter_job, power) {
                    job.refresh((power, value));
                }
                Reading::Index(value)
            }
            _ => {
                let index = {
                    let mut readings = self.lock();
                    readings.power = Some(value);
                    readings.index
                };
                if let (Some(job), Some(index)) = (&self.counter_job, index) {
                    job.refresh((value, index));
                }
                Reading::Power(value)
            }
        };
        Ok(Some(reading))
    }

    /// Instantaneous current in A, -1 if never received.
    pub fn current(&self) -> i64 {
        as_signed(self.lock().current)
    }

    /// Apparent power in VA, -1 if never received.
    pub fn power(&self) -> i64 {
        as_signed(self.lock().power)
    }

    /// Base index in Wh, -1 if never received.
    pub fn index(&self) -> i64 {
        as_signed(self.lock().index)
    }

    /// All three readings, taken atomically.
    pub fn snapshot(&self) -> MeasurementSnapshot {
        *self.lock()
    }

    /// Stops the attached jobs, cancelling pending transmissions.
    pub fn stop_jobs(&self) {
        for job in [&self.current_job, &self.counter_job].into_iter().flatten() {
            job.stop();
        }
    }
}

fn as_signed(value: Option<u64>) -> i64 {
    value.and_then(|v| i64::try_from(v).ok()).unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_readings() {
        let state = MeasurementState::new();
        assert_eq!(state.current(), -1);
        assert_eq!(state.power(), -1);
        assert_eq!(state.index(), -1);
        assert_eq!(state.snapshot(), MeasurementSnapshot::default());
    }

    #[test]
    fn test_records_update_readings() {
        let state = MeasurementState::new();
        assert_eq!(
            state.on_record(&Record::new("IINST", "003")).unwrap(),
            Some(Reading::Current(3))
        );
        assert_eq!(
            state.on_record(&Record::new("PAPP", "00750")).unwrap(),
            Some(Reading::Power(750))
        );
        assert_eq!(
            state.on_record(&Record::new("BASE", "007970353")).unwrap(),
            Some(Reading::Index(7_970_353))
        );
        assert_eq!(state.current(), 3);
        assert_eq!(state.power(), 750);
        assert_eq!(state.index(), 7_970_353);
    }

    #[test]
    fn test_unknown_labels_ignored() {
        let state = MeasurementState::new();
        assert_eq!(state.on_record(&Record::new("PTEC", "TH..")).unwrap(), None);
        assert_eq!(state.on_record(&Record::new("ADCO", "524563565245")).unwrap(), None);
        assert_eq!(state.snapshot(), MeasurementSnapshot::default());
    }

    #[test]
    fn test_non_numeric_value_leaves_state_untouched() {
        let state = MeasurementState::new();
        state.on_record(&Record::new("IINST", "004")).unwrap();
        let err = state.on_record(&Record::new("IINST", "0X4")).unwrap_err();
        assert!(matches!(err, TeleinfoError::InvalidValue { .. }));
        assert_eq!(state.current(), 4);
    }

    #[test]
    fn test_callback_receives_current() {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::sync::Arc;

        let seen = Arc::new(AtomicU64::new(0));
        let seen_cb = seen.clone();
        let state = MeasurementState::new()
            .with_callback(Box::new(move |v| seen_cb.store(v, Ordering::SeqCst)));
        state.on_record(&Record::new("IINST", "012")).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 12);

        // Not called for other labels
        state.on_record(&Record::new("PAPP", "00100")).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 12);
    }
}
