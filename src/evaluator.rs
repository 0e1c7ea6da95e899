//! ==============================================================================
//! evaluator.rs - per-parameter status classification
//! ==============================================================================
//!
//! purpose:
//!     classifies a single value as Unsafe / Warning / Safe against a rule
//!     table. rules are ordered, first match wins:
//!         1. hard danger thresholds (strict comparisons)
//!         2. deviation from the ideal range (tables that enable it)
//!         3. safe
//!
//! rule tables:
//!     DASHBOARD_RULES and DETAIL_RULES disagree (tds 800 vs 500, metal 0.1
//!     vs 0.01, ...). both are kept as separate named tables.
//!
//! relationships:
//!     - used by: controller.rs (every tick), insight.rs (aggregate severity)
//!     - uses: domain.rs (registry ideal bounds)
//!
//! ==============================================================================

use serde::Serialize;

use crate::domain::{parameter, ParameterId, Severity};

/// result of classifying one value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Status {
    /// `None` for the neutral unknown result
    pub severity: Option<Severity>,
    pub text: &'static str,
    pub color: &'static str,
}

impl Status {
    pub const UNKNOWN: Status = Status { severity: None, text: "Unknown", color: "#ffffff" };

    pub fn is(&self, severity: Severity) -> bool {
        self.severity == Some(severity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    Above(f64),
    Below(f64),
}

impl Comparison {
    fn matches(self, value: f64) -> bool {
        match self {
            Comparison::Above(limit) => value > limit,
            Comparison::Below(limit) => value < limit,
        }
    }
}

/// one hard danger threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HardRule {
    pub parameter: ParameterId,
    pub comparison: Comparison,
    pub text: &'static str,
}

/// display text and color for a non-hard outcome
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub text: &'static str,
    pub color: &'static str,
}

#[derive(Debug)]
pub struct RuleTable {
    pub name: &'static str,
    pub hard: &'static [HardRule],
    pub unsafe_color: &'static str,
    /// ideal-range deviation outcome; `None` disables the soft check
    pub deviation: Option<Outcome>,
    pub safe: Outcome,
}

const fn hard(parameter: ParameterId, comparison: Comparison, text: &'static str) -> HardRule {
    HardRule { parameter, comparison, text }
}

pub static DASHBOARD_RULES: RuleTable = RuleTable {
    name: "dashboard",
    hard: &[
        hard(ParameterId::Tds, Comparison::Above(800.0), "❌ Unsafe (Very High TDS)"),
        hard(ParameterId::Turbidity, Comparison::Above(7.0), "❌ Unsafe (High Turbidity)"),
        hard(ParameterId::Metal, Comparison::Above(0.1), "❌ Unsafe (Heavy Metals)"),
        hard(ParameterId::Do, Comparison::Below(5.0), "❌ Unsafe (Low DO)"),
    ],
    unsafe_color: "#ff6a6a",
    deviation: Some(Outcome { text: "⚠️ Warning (Deviation)", color: "#ffd60a" }),
    safe: Outcome { text: "✅ Safe", color: "#00ff88" },
};

pub static DETAIL_RULES: RuleTable = RuleTable {
    name: "detail",
    hard: &[
        hard(ParameterId::Ph, Comparison::Below(6.5), "Unsafe"),
        hard(ParameterId::Ph, Comparison::Above(8.5), "Unsafe"),
        hard(ParameterId::Tds, Comparison::Above(500.0), "Unsafe"),
        hard(ParameterId::Turbidity, Comparison::Above(5.0), "Unsafe"),
        hard(ParameterId::Temp, Comparison::Below(20.0), "Unsafe"),
        hard(ParameterId::Temp, Comparison::Above(30.0), "Unsafe"),
        hard(ParameterId::Do, Comparison::Below(5.0), "Unsafe"),
        hard(ParameterId::Metal, Comparison::Above(0.01), "Unsafe"),
    ],
    unsafe_color: "red",
    deviation: None,
    safe: Outcome { text: "Safe", color: "green" },
};

impl RuleTable {
    pub fn evaluate(&self, id: ParameterId, value: f64) -> Status {
        if let Some(rule) = self
            .hard
            .iter()
            .find(|r| r.parameter == id && r.comparison.matches(value))
        {
            return Status { severity: Some(Severity::Unsafe), text: rule.text, color: self.unsafe_color };
        }

        if let Some(warn) = self.deviation {
            if !parameter(id).is_ideal(value) {
                return Status { severity: Some(Severity::Warning), text: warn.text, color: warn.color };
            }
        }

        Status { severity: Some(Severity::Safe), text: self.safe.text, color: self.safe.color }
    }

    /// string-keyed variant; unregistered keys give [`Status::UNKNOWN`]
    pub fn evaluate_key(&self, key: &str, value: f64) -> Status {
        match key.parse::<ParameterId>() {
            Ok(id) => self.evaluate(id, value),
            Err(_) => Status::UNKNOWN,
        }
    }
}
