//! ==============================================================================
//! controller.rs - per-page tick owners
//! ==============================================================================
//!
//! purpose:
//!     one explicit owner per page holding everything a tick touches: the
//!     generator, the rule table, the rolling series, the live flag and (for
//!     the dashboard) the sync channel. no ambient globals.
//!
//! tick:
//!     live off -> nothing happens at all (no generation, publish or append)
//!     live on  -> generate -> evaluate -> append row -> publish -> summarize
//!
//! ```text
//!     the series append is a single call made after every value exists, so
//!     a tick either lands in the series completely or not at all. publish
//!     is best effort: a storage failure is logged and the tick carries on.
//! ```
//!
//! relationships:
//!     - used by: main.rs (timer loops), server.rs (views, live toggle)
//!     - uses: generator.rs, evaluator.rs, series.rs, sync.rs, insight.rs
//!
//! ==============================================================================

use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::time::Duration;

use crate::config::{DashboardConfig, ParameterPageConfig};
use crate::domain::{parameter, round_to, ParameterId, ReadingSet, Severity};
use crate::error::{Result, SentinelError};
use crate::evaluator::{RuleTable, Status, DASHBOARD_RULES, DETAIL_RULES};
use crate::generator::{BoundedWalk, GenerationStrategy, UniformDraw};
use crate::insight::{self, Insight, Overall};
use crate::series::SeriesStore;
use crate::sync::{SnapshotReader, SyncChannel};

// ==============================================================================
// view models handed to the render adapter
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    #[serde(rename = "yLeft")]
    Left,
    #[serde(rename = "yRight")]
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: &'static str,
    pub axis: Axis,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterCard {
    pub id: ParameterId,
    pub name: &'static str,
    pub value: f64,
    /// value with precision and unit, ready for display
    pub display: String,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub label: String,
    pub readings: ReadingSet,
    pub cards: Vec<ParameterCard>,
    pub overall: Overall,
    pub insight: Insight,
    pub chart: ChartData,
    pub live: bool,
}

impl DashboardView {
    pub fn card(&self, id: ParameterId) -> Option<&ParameterCard> {
        self.cards.iter().find(|c| c.id == id)
    }
}

/// "mm:ss", the same short clock label for every series point of a tick
fn tick_label(at: DateTime<Local>) -> String {
    at.format("%M:%S").to_string()
}

fn backdated(now: DateTime<Local>, interval: Duration, ticks_ago: usize) -> DateTime<Local> {
    let step = chrono::Duration::from_std(interval).unwrap_or_else(|_| chrono::Duration::zero());
    now - step * ticks_ago as i32
}

fn chart_series(id: ParameterId) -> (&'static str, Axis) {
    match id {
        ParameterId::Ph => ("pH Level", Axis::Left),
        ParameterId::Tds => ("TDS (ppm)", Axis::Right),
        ParameterId::Turbidity => ("Turbidity (NTU)", Axis::Left),
        ParameterId::Temp => ("Temperature (°C)", Axis::Left),
        ParameterId::Do => ("DO (mg/L)", Axis::Left),
        ParameterId::Metal => ("Heavy Metals (ppm)", Axis::Right),
    }
}

// ==============================================================================
// dashboard
// ==============================================================================

pub struct Dashboard {
    generator: Box<dyn GenerationStrategy>,
    rules: &'static RuleTable,
    series: SeriesStore<ParameterId>,
    channel: SyncChannel,
    interval: Duration,
    live: bool,
    last: Option<ReadingSet>,
}

impl Dashboard {
    /// uniform generator, dashboard rules, chart preloaded with history
    pub fn new(config: &DashboardConfig, channel: SyncChannel, now: DateTime<Local>) -> Self {
        let mut dashboard = Self::with_generator(
            config,
            channel,
            Box::new(UniformDraw::dashboard(config.seed)),
        );
        // distinct stream so the preload never shifts the live sequence
        let mut preload = UniformDraw::preload(config.seed.map(|s| s.wrapping_add(1)));
        dashboard.preload(&mut preload, config.preload_points, now);
        dashboard
    }

    /// no preload; the caller picks the strategy
    pub fn with_generator(
        config: &DashboardConfig,
        channel: SyncChannel,
        generator: Box<dyn GenerationStrategy>,
    ) -> Self {
        Self {
            generator,
            rules: &DASHBOARD_RULES,
            series: SeriesStore::new(config.capacity),
            channel,
            interval: config.interval(),
            live: true,
            last: None,
        }
    }

    /// fill the chart with `points` backdated ticks; nothing is published
    pub fn preload(&mut self, source: &mut dyn GenerationStrategy, points: usize, now: DateTime<Local>) {
        for i in 0..points {
            let readings = source.generate(None);
            let label = tick_label(backdated(now, self.interval, points - i));
            self.series.append_row(&label, readings.iter());
        }
        tracing::debug!("[DASHBOARD] preloaded {} points via {}", points, source.name());
    }

    pub fn set_live(&mut self, live: bool) {
        if self.live != live {
            tracing::info!("[DASHBOARD] Live Mode: {}", if live { "ON" } else { "OFF" });
        }
        self.live = live;
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn series(&self) -> &SeriesStore<ParameterId> {
        &self.series
    }

    pub fn channel(&self) -> &SyncChannel {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut SyncChannel {
        &mut self.channel
    }

    pub fn tick(&mut self) -> Option<DashboardView> {
        self.tick_at(Local::now())
    }

    /// one full tick, or nothing when live mode is off
    pub fn tick_at(&mut self, now: DateTime<Local>) -> Option<DashboardView> {
        if !self.live {
            tracing::debug!("[DASHBOARD] live mode off, tick skipped");
            return None;
        }

        let readings = self.generator.generate(self.last.as_ref());
        let statuses = self.evaluate(&readings);

        let label = tick_label(now);
        self.series.append_row(&label, readings.iter());

        if let Err(e) = self.channel.publish(&readings) {
            tracing::warn!("[DASHBOARD] ⚠ snapshot not published: {}", e);
        }
        self.last = Some(readings);

        Some(self.build_view(label, readings, statuses))
    }

    /// view of the latest tick, recomputed from the stored readings
    pub fn view(&self) -> Option<DashboardView> {
        let readings = self.last?;
        let label = self.series.labels().last().cloned().unwrap_or_default();
        Some(self.build_view(label, readings, self.evaluate(&readings)))
    }

    fn evaluate(&self, readings: &ReadingSet) -> Vec<Status> {
        readings.iter().map(|(id, v)| self.rules.evaluate(id, v)).collect()
    }

    fn build_view(&self, label: String, readings: ReadingSet, statuses: Vec<Status>) -> DashboardView {
        let overall = insight::overall(&statuses);
        let cards = readings
            .iter()
            .zip(statuses)
            .map(|((id, value), status)| {
                let p = parameter(id);
                ParameterCard { id, name: p.name, value, display: p.format(value), status }
            })
            .collect();

        DashboardView {
            label,
            readings,
            cards,
            overall,
            insight: insight::summarize(&readings),
            chart: self.chart(),
            live: self.live,
        }
    }

    pub fn chart(&self) -> ChartData {
        let datasets = self
            .series
            .keys()
            .map(|&id| {
                let (label, axis) = chart_series(id);
                Dataset { label, axis, values: self.series.values(&id) }
            })
            .collect();
        ChartData { labels: self.series.labels(), datasets }
    }
}

// ==============================================================================
// parameter detail pages
// ==============================================================================

/// display configuration for one detail page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    /// page key as it appears in urls and element ids
    pub key: &'static str,
    pub id: ParameterId,
    pub label: &'static str,
    pub axis_min: f64,
    pub axis_max: f64,
}

pub const PAGES: [PageLayout; 6] = [
    PageLayout { key: "ph", id: ParameterId::Ph, label: "pH Level", axis_min: 5.0, axis_max: 9.0 },
    PageLayout { key: "tds", id: ParameterId::Tds, label: "TDS (ppm)", axis_min: 0.0, axis_max: 700.0 },
    PageLayout {
        key: "turbidity",
        id: ParameterId::Turbidity,
        label: "Turbidity (NTU)",
        axis_min: 0.0,
        axis_max: 10.0,
    },
    PageLayout {
        key: "temperature",
        id: ParameterId::Temp,
        label: "Temperature (°C)",
        axis_min: 10.0,
        axis_max: 40.0,
    },
    PageLayout {
        key: "do",
        id: ParameterId::Do,
        label: "Dissolved Oxygen (mg/L)",
        axis_min: 0.0,
        axis_max: 12.0,
    },
    PageLayout {
        key: "metals",
        id: ParameterId::Metal,
        label: "Heavy Metals (ppm)",
        axis_min: 0.0,
        axis_max: 0.02,
    },
];

/// layout for a page key; canonical ids and aliases both resolve
pub fn page_layout(key: &str) -> Result<&'static PageLayout> {
    let id = key.parse::<ParameterId>()?;
    PAGES
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| SentinelError::UnknownParameter(key.to_string()))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailChart {
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    /// relative labels, `T-10` (oldest) .. `T-1` (newest)
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterView {
    pub key: &'static str,
    pub id: ParameterId,
    pub value: f64,
    pub display: String,
    pub average: f64,
    pub average_display: String,
    pub status: Status,
    pub insight: &'static str,
    /// what the dashboard last published for this parameter
    pub dashboard_value: Option<f64>,
    pub chart: DetailChart,
    pub live: bool,
}

pub struct ParameterPage {
    layout: &'static PageLayout,
    generator: Box<dyn GenerationStrategy>,
    rules: &'static RuleTable,
    series: SeriesStore<ParameterId>,
    insight_rng: StdRng,
    shared: Option<SnapshotReader>,
    interval: Duration,
    live: bool,
    /// display decimals, taken from the walk profile
    decimals: usize,
    insight: &'static str,
}

impl ParameterPage {
    /// bounded-walk page with its series pre-filled to capacity
    pub fn new(
        key: &str,
        config: &ParameterPageConfig,
        shared: Option<SnapshotReader>,
        now: DateTime<Local>,
    ) -> Result<Self> {
        let layout = page_layout(key)?;
        let insight_rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        let generator = BoundedWalk::detail_page(config.seed);
        let decimals = generator.profile(layout.id).decimals;
        let mut page = Self {
            layout,
            generator: Box::new(generator),
            rules: &DETAIL_RULES,
            series: SeriesStore::new(config.capacity),
            insight_rng,
            shared,
            interval: config.interval(),
            live: true,
            decimals,
            insight: insight::STABLE,
        };
        page.fill(now);
        Ok(page)
    }

    fn fill(&mut self, now: DateTime<Local>) {
        let id = self.layout.id;
        let points = self.series.capacity();
        for i in 0..points {
            let previous = self.series.latest(&id).map(|p| p.value);
            let value = self.generator.sample(id, previous);
            let label = tick_label(backdated(now, self.interval, points - i));
            self.series.append(id, label, value);
        }
        if let Some(latest) = self.series.latest(&id) {
            let status = self.rules.evaluate(id, latest.value);
            self.insight = insight::detail_insight(
                status.severity.unwrap_or(Severity::Safe),
                &mut self.insight_rng,
            );
        }
        tracing::debug!("[PAGE {}] filled {} points via {}", self.layout.key, points, self.generator.name());
    }

    pub fn layout(&self) -> &'static PageLayout {
        self.layout
    }

    pub fn key(&self) -> &'static str {
        self.layout.key
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_live(&mut self, live: bool) {
        if self.live != live {
            tracing::info!("[PAGE {}] Live Mode: {}", self.layout.key, if live { "ON" } else { "OFF" });
        }
        self.live = live;
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn series(&self) -> &SeriesStore<ParameterId> {
        &self.series
    }

    pub fn tick(&mut self) -> Option<ParameterView> {
        self.tick_at(Local::now())
    }

    pub fn tick_at(&mut self, now: DateTime<Local>) -> Option<ParameterView> {
        if !self.live {
            tracing::debug!("[PAGE {}] live mode off, tick skipped", self.layout.key);
            return None;
        }

        let id = self.layout.id;
        let previous = self.series.latest(&id).map(|p| p.value);
        let value = self.generator.sample(id, previous);
        let status = self.rules.evaluate(id, value);
        self.series.append(id, tick_label(now), value);

        // the detail rules have no warning tier
        let severity = status.severity.unwrap_or(Severity::Safe);
        self.insight = insight::detail_insight(severity, &mut self.insight_rng);

        self.view()
    }

    /// current page state; status is re-derived from the newest point
    pub fn view(&self) -> Option<ParameterView> {
        let id = self.layout.id;
        let value = self.series.latest(&id)?.value;
        let unit = parameter(id).unit;
        let decimals = self.decimals;
        let average = round_to(self.series.average(&id)?, decimals);

        let values = self.series.values(&id);
        let n = values.len();
        let labels = (0..n).map(|i| format!("T-{}", n - i)).collect();

        Some(ParameterView {
            key: self.layout.key,
            id,
            value,
            display: format!("{:.*}{}", decimals, value, unit),
            average,
            average_display: format!("{:.*}{}", decimals, average, unit),
            status: self.rules.evaluate(id, value),
            insight: self.insight,
            dashboard_value: self.dashboard_value(),
            chart: DetailChart {
                label: self.layout.label,
                min: self.layout.axis_min,
                max: self.layout.axis_max,
                labels,
                values,
            },
            live: self.live,
        })
    }

    fn dashboard_value(&self) -> Option<f64> {
        let reader = self.shared.as_ref()?;
        match reader.latest() {
            Ok(snapshot) => snapshot.map(|r| r.get(self.layout.id)),
            Err(e) => {
                tracing::warn!("[PAGE {}] ⚠ shared snapshot unreadable: {}", self.layout.key, e);
                None
            }
        }
    }
}
