//! ==============================================================================
//! generator.rs - synthetic reading generation
//! ==============================================================================
//!
//! purpose:
//!     fabricates sensor values. there is no hardware here: every value is a
//!     draw from a seedable rng shaped by one of two strategies.
//!
//! strategies:
//!     - UniformDraw: independent uniform draw per parameter from a fixed
//!       generation range (dashboard, and the dashboard's preloaded history)
//!     - BoundedWalk: mean-reverting walk around a fixed base that never
//!       leaves base +/- range/2 (parameter detail pages)
//!
//! ```text
//!     the two are not merged: the pages disagree on ranges, and each page
//!     owns its own rng.
//! ```
//!
//! relationships:
//!     - used by: controller.rs (one strategy per page)
//!     - uses: domain.rs (ParameterId, ReadingSet, round_to)
//!
//! ==============================================================================

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{round_to, ParameterId, ReadingSet};

/// one generation interface, selectable per page
pub trait GenerationStrategy: Send + Sync {
    /// short name for logs
    fn name(&self) -> &'static str;

    /// next value for one parameter; `previous` is that parameter's last value
    fn sample(&mut self, id: ParameterId, previous: Option<f64>) -> f64;

    /// one full reading set, every parameter drawn together
    fn generate(&mut self, previous: Option<&ReadingSet>) -> ReadingSet {
        ReadingSet::from_fn(|id| self.sample(id, previous.map(|p| p.get(id))))
    }
}

fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

// ==============================================================================
// uniform draw (dashboard)
// ==============================================================================

/// inclusive-low generation range plus rounding precision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationRange {
    pub min: f64,
    pub max: f64,
    pub decimals: usize,
}

const fn range(min: f64, max: f64, decimals: usize) -> GenerationRange {
    GenerationRange { min, max, decimals }
}

/// live dashboard ranges, indexed in registry order
pub const DASHBOARD_RANGES: [GenerationRange; 6] = [
    range(6.0, 8.5, 2),    // ph
    range(100.0, 700.0, 0), // tds
    range(0.0, 8.0, 2),    // turbidity
    range(18.0, 30.0, 1),  // temp
    range(4.0, 10.0, 2),   // do
    range(0.0, 0.12, 3),   // metal
];

/// narrower ranges used to seed the dashboard chart at startup
pub const PRELOAD_RANGES: [GenerationRange; 6] = [
    range(6.8, 7.6, 2),
    range(200.0, 450.0, 0),
    range(1.0, 4.0, 2),
    range(22.0, 28.0, 1),
    range(5.0, 9.0, 2),
    range(0.005, 0.06, 3),
];

pub struct UniformDraw {
    rng: StdRng,
    ranges: &'static [GenerationRange; 6],
    name: &'static str,
}

impl UniformDraw {
    pub fn dashboard(seed: Option<u64>) -> Self {
        Self { rng: seeded(seed), ranges: &DASHBOARD_RANGES, name: "uniform" }
    }

    pub fn preload(seed: Option<u64>) -> Self {
        Self { rng: seeded(seed), ranges: &PRELOAD_RANGES, name: "uniform-preload" }
    }

    pub fn range(&self, id: ParameterId) -> GenerationRange {
        self.ranges[id as usize]
    }
}

impl GenerationStrategy for UniformDraw {
    fn name(&self) -> &'static str {
        self.name
    }

    fn sample(&mut self, id: ParameterId, _previous: Option<f64>) -> f64 {
        let r = self.range(id);
        round_to(self.rng.gen_range(r.min..r.max), r.decimals)
    }
}

// ==============================================================================
// bounded walk (parameter detail pages)
// ==============================================================================

/// walk centre and full band width for one parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkProfile {
    pub base: f64,
    pub range: f64,
    pub decimals: usize,
}

impl WalkProfile {
    pub fn lower(&self) -> f64 {
        self.base - self.range / 2.0
    }

    pub fn upper(&self) -> f64 {
        self.base + self.range / 2.0
    }
}

const fn walk(base: f64, range: f64, decimals: usize) -> WalkProfile {
    WalkProfile { base, range, decimals }
}

/// detail page profiles, indexed in registry order
pub const DETAIL_PROFILES: [WalkProfile; 6] = [
    walk(7.2, 1.0, 2),
    walk(300.0, 150.0, 2),
    walk(3.0, 2.0, 2),
    walk(25.0, 6.0, 2),
    walk(6.0, 2.0, 2),
    // the browser page rounded every detail value to 2 decimals, which left
    // this band (0.0025..0.0075) showing only 0.00 / 0.01
    walk(0.005, 0.005, 3),
];

/// one bounded step around `base`
///
/// the first value (`previous == None`) is `base + (u - 0.5) * range`. later
/// values pull half-way back towards `base` and add half the jitter, which
/// keeps every result inside `base +/- range / 2`.
pub fn next_value<R: Rng + ?Sized>(rng: &mut R, previous: Option<f64>, base: f64, range: f64) -> f64 {
    let jitter = (rng.gen::<f64>() - 0.5) * range;
    let next = match previous {
        None => base + jitter,
        Some(prev) => base + (prev - base) * 0.5 + jitter * 0.5,
    };
    // a previous value from elsewhere may sit outside the band
    next.clamp(base - range / 2.0, base + range / 2.0)
}

pub struct BoundedWalk {
    rng: StdRng,
    profiles: &'static [WalkProfile; 6],
}

impl BoundedWalk {
    pub fn detail_page(seed: Option<u64>) -> Self {
        Self { rng: seeded(seed), profiles: &DETAIL_PROFILES }
    }

    pub fn profile(&self, id: ParameterId) -> WalkProfile {
        self.profiles[id as usize]
    }
}

impl GenerationStrategy for BoundedWalk {
    fn name(&self) -> &'static str {
        "bounded-walk"
    }

    fn sample(&mut self, id: ParameterId, previous: Option<f64>) -> f64 {
        let p = self.profile(id);
        round_to(next_value(&mut self.rng, previous, p.base, p.range), p.decimals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parameter;
    use proptest::prelude::*;

    fn assert_decimals(value: f64, decimals: usize) {
        assert!((round_to(value, decimals) - value).abs() < 1e-12, "{value} not at {decimals} decimals");
    }

    #[test]
    fn generation_ranges_sit_inside_valid_bounds() {
        for id in ParameterId::ALL {
            let p = parameter(id);
            for r in [DASHBOARD_RANGES[id as usize], PRELOAD_RANGES[id as usize]] {
                assert!(r.min >= p.valid_min && r.max <= p.valid_max, "{id}");
                assert_eq!(r.decimals, p.precision, "{id}");
            }
        }
    }

    #[test]
    fn same_seed_same_readings() {
        let a = UniformDraw::dashboard(Some(7)).generate(None);
        let b = UniformDraw::dashboard(Some(7)).generate(None);
        assert_eq!(a, b);
    }

    #[test]
    fn uniform_values_are_rounded_per_parameter() {
        let mut gen = UniformDraw::dashboard(Some(99));
        for _ in 0..50 {
            let r = gen.generate(None);
            for (id, v) in r.iter() {
                assert_decimals(v, parameter(id).precision);
            }
        }
    }

    #[test]
    fn walk_depends_on_previous() {
        let mut low = StdRng::seed_from_u64(3);
        let mut high = StdRng::seed_from_u64(3);
        let a = next_value(&mut low, Some(6.8), 7.2, 1.0);
        let b = next_value(&mut high, Some(7.6), 7.2, 1.0);
        assert!(a < b);
    }

    #[test]
    fn walk_clamps_foreign_previous() {
        let mut rng = StdRng::seed_from_u64(11);
        let v = next_value(&mut rng, Some(900.0), 300.0, 150.0);
        assert!(v <= 375.0);
    }

    proptest! {
        #[test]
        fn prop_uniform_within_generation_range(seed in any::<u64>()) {
            let mut gen = UniformDraw::dashboard(Some(seed));
            for _ in 0..20 {
                let r = gen.generate(None);
                for (id, v) in r.iter() {
                    let range = gen.range(id);
                    prop_assert!(v >= range.min && v <= range.max, "{} = {} outside {:?}", id, v, range);
                }
                prop_assert_eq!(r.temperature(), r.temp);
                prop_assert_eq!(r.metals(), r.metal);
            }
        }

        #[test]
        fn prop_preload_within_generation_range(seed in any::<u64>()) {
            let mut gen = UniformDraw::preload(Some(seed));
            let r = gen.generate(None);
            for (id, v) in r.iter() {
                let range = gen.range(id);
                prop_assert!(v >= range.min && v <= range.max);
            }
        }

        #[test]
        fn prop_walk_stays_in_band(seed in any::<u64>(), steps in 1usize..60) {
            let mut gen = BoundedWalk::detail_page(Some(seed));
            for id in ParameterId::ALL {
                let p = gen.profile(id);
                let half_step = 0.5 * 10f64.powi(-(p.decimals as i32));
                let mut prev = None;
                for _ in 0..steps {
                    let v = gen.sample(id, prev);
                    prop_assert!(v >= p.lower() - half_step && v <= p.upper() + half_step,
                        "{} = {} outside {}..{}", id, v, p.lower(), p.upper());
                    prev = Some(v);
                }
            }
        }
    }
}
