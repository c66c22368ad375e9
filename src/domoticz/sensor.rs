//! # Domoticz Sensor Kinds
//!
//! Each virtual device type of Domoticz is updated through its own request
//! template. A template carries an `IDX` placeholder for the device index and
//! one `{}` placeholder per value.

use crate::constants::{
    DOMOTICZ_IDX_PLACEHOLDER, DOMOTICZ_VALUE_PLACEHOLDER, PARAM_STRING_CURRENT,
    PARAM_STRING_ELECTRIC_COUNTER, PARAM_STRING_SELECTOR_SWITCH, PARAM_STRING_SWITCH,
    PARAM_STRING_TEXT,
};
use crate::error::TeleinfoError;
use std::fmt;

/// Domoticz device types the bridge can update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Switch,
    SelectorSwitch,
    /// Current sensor, one value in amperes.
    Current,
    /// Electric counter, power (VA) then energy index (Wh).
    ElectricCounter,
    Text,
}

impl SensorKind {
    pub fn template(&self) -> &'static str {
        match self {
            SensorKind::Switch => PARAM_STRING_SWITCH,
            SensorKind::SelectorSwitch => PARAM_STRING_SELECTOR_SWITCH,
            SensorKind::Current => PARAM_STRING_CURRENT,
            SensorKind::ElectricCounter => PARAM_STRING_ELECTRIC_COUNTER,
            SensorKind::Text => PARAM_STRING_TEXT,
        }
    }

    /// Number of values the template expects.
    pub fn arity(&self) -> usize {
        self.template().matches(DOMOTICZ_VALUE_PLACEHOLDER).count()
    }

    /// Builds the request for device `idx` carrying `values`.
    pub fn format(&self, idx: u32, values: &SensorValues) -> Result<String, TeleinfoError> {
        if values.len() != self.arity() {
            return Err(TeleinfoError::InvalidValue {
                label: format!("{self:?}"),
                value: values.to_string(),
            });
        }

        let template = self
            .template()
            .replace(DOMOTICZ_IDX_PLACEHOLDER, &idx.to_string());
        let mut out = String::with_capacity(template.len() + 16);
        let mut parts = template.split(DOMOTICZ_VALUE_PLACEHOLDER);
        if let Some(first) = parts.next() {
            out.push_str(first);
        }
        for (part, value) in parts.zip(values.iter()) {
            out.push_str(value);
            out.push_str(part);
        }
        Ok(out)
    }
}

/// The values of one sensor update, already rendered as text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SensorValues(Vec<String>);

impl SensorValues {
    pub fn new(values: Vec<String>) -> Self {
        SensorValues(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for SensorValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

impl From<u64> for SensorValues {
    fn from(v: u64) -> Self {
        SensorValues(vec![v.to_string()])
    }
}

impl From<(u64, u64)> for SensorValues {
    fn from((a, b): (u64, u64)) -> Self {
        SensorValues(vec![a.to_string(), b.to_string()])
    }
}

impl From<&str> for SensorValues {
    fn from(v: &str) -> Self {
        SensorValues(vec![v.to_string()])
    }
}

impl From<bool> for SensorValues {
    fn from(on: bool) -> Self {
        SensorValues(vec![if on { "On" } else { "Off" }.to_string()])
    }
}
