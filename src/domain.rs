//! ==============================================================================
//! domain.rs - monitored parameters and reading sets
//! ==============================================================================
//!
//! purpose:
//!     the static parameter registry (ids, units, valid and ideal bounds) and
//!     the reading set, one atomic snapshot of every parameter's value.
//!
//! relationships:
//!     - used by: every other module
//!     - serialized by: sync.rs (persisted snapshot, with alias keys)
//!
//! ==============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SentinelError;

// ==============================================================================
// parameter ids
// ==============================================================================

/// identity of one monitored water-quality parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterId {
    Ph,
    Tds,
    Turbidity,
    Temp,
    Do,
    Metal,
}

impl ParameterId {
    /// every parameter, in registry order (chart series and card order)
    pub const ALL: [ParameterId; 6] = [
        ParameterId::Ph,
        ParameterId::Tds,
        ParameterId::Turbidity,
        ParameterId::Temp,
        ParameterId::Do,
        ParameterId::Metal,
    ];

    /// canonical storage key
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterId::Ph => "ph",
            ParameterId::Tds => "tds",
            ParameterId::Turbidity => "turbidity",
            ParameterId::Temp => "temp",
            ParameterId::Do => "do",
            ParameterId::Metal => "metal",
        }
    }

    /// position in the registry table
    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterId {
    type Err = SentinelError;

    /// accepts canonical keys plus the `temperature` / `metals` aliases
    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match key {
            "ph" => Ok(ParameterId::Ph),
            "tds" => Ok(ParameterId::Tds),
            "turbidity" => Ok(ParameterId::Turbidity),
            "temp" | "temperature" => Ok(ParameterId::Temp),
            "do" => Ok(ParameterId::Do),
            "metal" | "metals" => Ok(ParameterId::Metal),
            other => Err(SentinelError::UnknownParameter(other.to_string())),
        }
    }
}

// ==============================================================================
// parameter registry
// ==============================================================================

/// static description of one parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub id: ParameterId,
    pub name: &'static str,
    /// display suffix, already carrying its leading space
    pub unit: &'static str,
    pub valid_min: f64,
    pub valid_max: f64,
    pub ideal_min: Option<f64>,
    pub ideal_max: Option<f64>,
    /// decimals used for generation and display
    pub precision: usize,
}

impl Parameter {
    /// value with fixed precision and unit suffix, e.g. `"412 ppm"`
    pub fn format(&self, value: f64) -> String {
        format!("{:.*}{}", self.precision, value, self.unit)
    }

    /// true when the value sits inside whichever ideal bounds are defined
    pub fn is_ideal(&self, value: f64) -> bool {
        let above_min = self.ideal_min.map_or(true, |min| value >= min);
        let below_max = self.ideal_max.map_or(true, |max| value <= max);
        above_min && below_max
    }
}

static PARAMETERS: [Parameter; 6] = [
    Parameter {
        id: ParameterId::Ph,
        name: "pH",
        unit: "",
        valid_min: 6.0,
        valid_max: 9.0,
        ideal_min: Some(6.5),
        ideal_max: Some(8.5),
        precision: 2,
    },
    Parameter {
        id: ParameterId::Tds,
        name: "TDS",
        unit: " ppm",
        valid_min: 0.0,
        valid_max: 1200.0,
        ideal_min: None,
        ideal_max: Some(500.0),
        precision: 0,
    },
    Parameter {
        id: ParameterId::Turbidity,
        name: "Turbidity",
        unit: " NTU",
        valid_min: 0.0,
        valid_max: 50.0,
        ideal_min: None,
        ideal_max: Some(5.0),
        precision: 2,
    },
    Parameter {
        id: ParameterId::Temp,
        name: "Temperature",
        unit: " °C",
        valid_min: 0.0,
        valid_max: 50.0,
        ideal_min: Some(20.0),
        ideal_max: Some(30.0),
        precision: 1,
    },
    Parameter {
        id: ParameterId::Do,
        name: "Dissolved O₂",
        unit: " mg/L",
        valid_min: 0.0,
        valid_max: 14.0,
        ideal_min: Some(5.0),
        ideal_max: None,
        precision: 2,
    },
    Parameter {
        id: ParameterId::Metal,
        name: "Heavy Metals",
        unit: " ppm",
        valid_min: 0.0,
        valid_max: 0.5,
        ideal_min: None,
        ideal_max: Some(0.01),
        precision: 3,
    },
];

/// registry entry for a known id
pub fn parameter(id: ParameterId) -> &'static Parameter {
    &PARAMETERS[id.index()]
}

/// registry entry for a string key; `None` for anything unregistered
pub fn lookup(key: &str) -> Option<&'static Parameter> {
    key.parse::<ParameterId>().ok().map(parameter)
}

/// all parameters in stable registry order
pub fn parameters() -> impl Iterator<Item = &'static Parameter> {
    PARAMETERS.iter()
}

/// round to a fixed number of decimals
pub fn round_to(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

// ==============================================================================
// severity
// ==============================================================================

/// ordered by increasing concern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Safe,
    Warning,
    Unsafe,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Safe => "Safe",
            Severity::Warning => "Warning",
            Severity::Unsafe => "Unsafe",
        }
    }
}

// ==============================================================================
// reading set
// ==============================================================================

/// one synthetic sensor snapshot across all parameters
///
/// serializes with the `temperature` and `metals` alias keys alongside the
/// canonical ones, and accepts either spelling when read back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireReadings", try_from = "WireReadings")]
pub struct ReadingSet {
    pub ph: f64,
    pub tds: f64,
    pub turbidity: f64,
    pub temp: f64,
    pub r#do: f64,
    pub metal: f64,
}

impl ReadingSet {
    pub fn get(&self, id: ParameterId) -> f64 {
        match id {
            ParameterId::Ph => self.ph,
            ParameterId::Tds => self.tds,
            ParameterId::Turbidity => self.turbidity,
            ParameterId::Temp => self.temp,
            ParameterId::Do => self.r#do,
            ParameterId::Metal => self.metal,
        }
    }

    /// lookup by string key, alias keys included
    pub fn get_key(&self, key: &str) -> Option<f64> {
        key.parse::<ParameterId>().ok().map(|id| self.get(id))
    }

    pub fn temperature(&self) -> f64 {
        self.temp
    }

    pub fn metals(&self) -> f64 {
        self.metal
    }

    /// (id, value) pairs in registry order
    pub fn iter(&self) -> impl Iterator<Item = (ParameterId, f64)> + '_ {
        ParameterId::ALL.into_iter().map(move |id| (id, self.get(id)))
    }

    /// build a set by asking for each parameter in registry order
    pub fn from_fn(mut f: impl FnMut(ParameterId) -> f64) -> Self {
        // field order matches ParameterId::ALL
        let ph = f(ParameterId::Ph);
        let tds = f(ParameterId::Tds);
        let turbidity = f(ParameterId::Turbidity);
        let temp = f(ParameterId::Temp);
        let r#do = f(ParameterId::Do);
        let metal = f(ParameterId::Metal);
        ReadingSet { ph, tds, turbidity, temp, r#do, metal }
    }
}

/// persisted shape: canonical keys plus two aliases
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireReadings {
    ph: f64,
    tds: f64,
    turbidity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    temp: Option<f64>,
    #[serde(rename = "do")]
    dissolved_oxygen: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metals: Option<f64>,
}

impl From<ReadingSet> for WireReadings {
    fn from(r: ReadingSet) -> Self {
        WireReadings {
            ph: r.ph,
            tds: r.tds,
            turbidity: r.turbidity,
            temp: Some(r.temp),
            dissolved_oxygen: r.r#do,
            metal: Some(r.metal),
            temperature: Some(r.temp),
            metals: Some(r.metal),
        }
    }
}

impl TryFrom<WireReadings> for ReadingSet {
    type Error = String;

    fn try_from(w: WireReadings) -> Result<Self, Self::Error> {
        let temp = w
            .temp
            .or(w.temperature)
            .ok_or_else(|| "missing field `temp` (or `temperature`)".to_string())?;
        let metal = w
            .metal
            .or(w.metals)
            .ok_or_else(|| "missing field `metal` (or `metals`)".to_string())?;
        Ok(ReadingSet {
            ph: w.ph,
            tds: w.tds,
            turbidity: w.turbidity,
            temp,
            r#do: w.dissolved_oxygen,
            metal,
        })
    }
}
