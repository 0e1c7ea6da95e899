//! ==============================================================================
//! insight.rs - whole-snapshot summaries
//! ==============================================================================
//!
//! purpose:
//!     two independent aggregates over the latest readings:
//!         - summarize(): one human-readable insight from its own ordered
//!           rules (metal > 0.05 is critical here even though the per-card
//!           evaluator only warns until 0.1)
//!         - overall(): worst severity across the per-parameter statuses
//!     the dashboard shows them in different places, so they are not merged.
//!
//! relationships:
//!     - used by: controller.rs
//!     - uses: evaluator.rs (Status), domain.rs (ReadingSet, Severity)
//!
//! ==============================================================================

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::domain::{ReadingSet, Severity};
use crate::evaluator::Status;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Insight {
    pub message: &'static str,
    pub severity: Severity,
    pub color: &'static str,
}

pub const CRITICAL_METAL: &str = "🚨 Heavy metal concentration critical — unsafe for use!";
pub const SEDIMENT: &str = "⚠️ High turbidity or TDS — possible sediment contamination.";
pub const PH_DEVIATION: &str = "⚠️ pH deviation detected — may affect taste and safety.";
pub const STABLE: &str = "✅ Water quality stable and safe.";

/// ordered insight rules, first match wins
pub fn summarize(r: &ReadingSet) -> Insight {
    if r.metal > 0.05 {
        Insight { message: CRITICAL_METAL, severity: Severity::Unsafe, color: "#ff6a6a" }
    } else if r.turbidity > 7.0 || r.tds > 800.0 {
        Insight { message: SEDIMENT, severity: Severity::Warning, color: "#ffd60a" }
    } else if r.ph < 6.5 || r.ph > 8.5 {
        Insight { message: PH_DEVIATION, severity: Severity::Warning, color: "#ffd60a" }
    } else {
        Insight { message: STABLE, severity: Severity::Safe, color: "#00ff88" }
    }
}

/// aggregate badge across per-parameter statuses
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Overall {
    pub severity: Severity,
    pub text: &'static str,
    pub color: &'static str,
    pub unsafe_count: usize,
    pub warning_count: usize,
}

/// unsafe dominates warning dominates safe; unknown statuses are ignored
pub fn overall<'a>(statuses: impl IntoIterator<Item = &'a Status>) -> Overall {
    let (mut unsafe_count, mut warning_count) = (0, 0);
    for status in statuses {
        match status.severity {
            Some(Severity::Unsafe) => unsafe_count += 1,
            Some(Severity::Warning) => warning_count += 1,
            _ => {}
        }
    }

    let (severity, text, color) = if unsafe_count > 0 {
        (Severity::Unsafe, "❌ Unsafe — action required", "#ff6a6a")
    } else if warning_count > 0 {
        (Severity::Warning, "⚠️ Moderate — check warnings", "#ffd60a")
    } else {
        (Severity::Safe, "✅ Safe & Stable", "#00ff88")
    };

    Overall { severity, text, color, unsafe_count, warning_count }
}

const DETAIL_SAFE: [&str; 3] = [
    "Water quality is excellent. Keep monitoring for consistency.",
    "All readings stable — system efficiency optimal.",
    "Perfect range maintained. Ecosystem remains healthy.",
];

const DETAIL_UNSAFE: [&str; 3] = [
    "Anomalies detected — water treatment required!",
    "Levels exceeding safe limits. Immediate inspection needed.",
    "Potential contamination risk. Review sensor data promptly.",
];

/// rotating detail-page insight; the detail rules never warn, so anything
/// short of unsafe draws from the safe pool
pub fn detail_insight<R: Rng + ?Sized>(severity: Severity, rng: &mut R) -> &'static str {
    let pool: &[&'static str] = match severity {
        Severity::Unsafe => &DETAIL_UNSAFE,
        _ => &DETAIL_SAFE,
    };
    pool.choose(rng).copied().unwrap_or(STABLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParameterId;
    use crate::evaluator::DASHBOARD_RULES;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn base() -> ReadingSet {
        ReadingSet { ph: 7.0, tds: 300.0, turbidity: 2.0, temp: 24.0, r#do: 7.0, metal: 0.01 }
    }

    #[test]
    fn rules_apply_in_order() {
        assert_eq!(summarize(&base()).message, STABLE);

        let metal_and_sediment = ReadingSet { metal: 0.06, turbidity: 9.0, ..base() };
        assert_eq!(summarize(&metal_and_sediment).severity, Severity::Unsafe);

        let sediment = ReadingSet { tds: 850.0, ph: 9.0, ..base() };
        assert_eq!(summarize(&sediment).message, SEDIMENT);

        let ph = ReadingSet { ph: 6.2, ..base() };
        let insight = summarize(&ph);
        assert_eq!((insight.message, insight.severity), (PH_DEVIATION, Severity::Warning));
    }

    #[test]
    fn insight_thresholds_are_strict() {
        assert_eq!(summarize(&ReadingSet { metal: 0.05, ..base() }).message, STABLE);
        assert_eq!(summarize(&ReadingSet { turbidity: 7.0, ..base() }).message, STABLE);
        assert_eq!(summarize(&ReadingSet { ph: 8.5, ..base() }).message, STABLE);
    }

    #[test]
    fn unsafe_dominates_warnings() {
        let statuses = [
            DASHBOARD_RULES.evaluate(ParameterId::Tds, 900.0),
            DASHBOARD_RULES.evaluate(ParameterId::Ph, 9.0),
            DASHBOARD_RULES.evaluate(ParameterId::Temp, 35.0),
            DASHBOARD_RULES.evaluate(ParameterId::Do, 8.0),
        ];
        let o = overall(&statuses);
        assert_eq!(o.severity, Severity::Unsafe);
        assert_eq!((o.unsafe_count, o.warning_count), (1, 2));
        assert_eq!(o.text, "❌ Unsafe — action required");
    }

    #[test]
    fn warnings_without_unsafe_are_moderate() {
        let statuses = [DASHBOARD_RULES.evaluate(ParameterId::Ph, 6.1), Status::UNKNOWN];
        assert_eq!(overall(&statuses).severity, Severity::Warning);
        assert_eq!(overall(&[Status::UNKNOWN]).severity, Severity::Safe);
        assert_eq!(overall(std::iter::empty()).text, "✅ Safe & Stable");
    }

    #[test]
    fn detail_insight_draws_from_matching_pool() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            assert!(DETAIL_UNSAFE.contains(&detail_insight(Severity::Unsafe, &mut rng)));
            assert!(DETAIL_SAFE.contains(&detail_insight(Severity::Safe, &mut rng)));
        }
    }
}
