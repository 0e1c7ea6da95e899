use std::sync::Arc;

use aqua_sentinel::config::{DashboardConfig, ParameterPageConfig};
use aqua_sentinel::controller::{page_layout, Dashboard, ParameterPage};
use aqua_sentinel::domain::{ParameterId, Severity};
use aqua_sentinel::render::{self, ElementMap, DEFAULT_IDS};
use aqua_sentinel::sync::{MemoryStore, SyncChannel};
use aqua_sentinel::SentinelError;
use chrono::Local;

fn config(seed: u64) -> ParameterPageConfig {
    ParameterPageConfig { seed: Some(seed), ..ParameterPageConfig::default() }
}

#[test]
fn page_starts_full_with_relative_labels() {
    let page = ParameterPage::new("tds", &config(1), None, Local::now()).unwrap();
    let view = page.view().unwrap();
    assert_eq!(view.chart.values.len(), 10);
    assert_eq!(view.chart.labels.first().map(String::as_str), Some("T-10"));
    assert_eq!(view.chart.labels.last().map(String::as_str), Some("T-1"));
    assert_eq!(view.chart.max, 700.0);
}

#[test]
fn ticks_keep_ten_points_and_stay_in_band() {
    let mut page = ParameterPage::new("temperature", &config(9), None, Local::now()).unwrap();
    for _ in 0..40 {
        let view = page.tick_at(Local::now()).unwrap();
        assert_eq!(view.chart.values.len(), 10);
        assert!(view.value >= 22.0 - 0.005 && view.value <= 28.0 + 0.005, "{}", view.value);
        assert!(view.display.ends_with(" °C"));
    }
}

#[test]
fn status_uses_detail_rules() {
    let mut page = ParameterPage::new("tds", &config(4), None, Local::now()).unwrap();
    for _ in 0..50 {
        let view = page.tick_at(Local::now()).unwrap();
        // the band is 225..375, always under the 500 detail limit
        assert_eq!(view.status.severity, Some(Severity::Safe));
        assert_eq!(view.status.color, "green");
    }
}

#[test]
fn average_matches_window() {
    let mut page = ParameterPage::new("ph", &config(12), None, Local::now()).unwrap();
    let view = page.tick_at(Local::now()).unwrap();
    let mean = view.chart.values.iter().sum::<f64>() / view.chart.values.len() as f64;
    assert!((view.average - mean).abs() < 0.006);
}

#[test]
fn live_off_freezes_page() {
    let mut page = ParameterPage::new("do", &config(2), None, Local::now()).unwrap();
    let before = page.view().unwrap().chart.values;
    page.set_live(false);
    assert!(page.tick_at(Local::now()).is_none());
    assert_eq!(page.view().unwrap().chart.values, before);
}

#[test]
fn live_toggle_round_trips_on_page() {
    let mut page = ParameterPage::new("ph", &config(6), None, Local::now()).unwrap();
    page.set_live(false);
    page.set_live(false);
    assert!(!page.is_live());
    assert!(page.tick_at(Local::now()).is_none());

    page.set_live(true);
    assert!(page.is_live());
    let view = page.tick_at(Local::now()).unwrap();
    assert!(view.live);
    assert_eq!(view.chart.values.len(), 10);
}

#[test]
fn unknown_page_key_is_an_error() {
    let err = ParameterPage::new("chlorine", &config(1), None, Local::now()).err().unwrap();
    assert!(matches!(err, SentinelError::UnknownParameter(k) if k == "chlorine"));
    assert_eq!(page_layout("temp").unwrap().key, "temperature");
    assert_eq!(page_layout("metals").unwrap().id, ParameterId::Metal);
}

#[test]
fn page_reads_dashboard_snapshot_through_alias() {
    let channel = SyncChannel::new(Arc::new(MemoryStore::new()));
    let reader = channel.reader();
    let dash_config = DashboardConfig { seed: Some(8), ..DashboardConfig::default() };
    let mut dashboard = Dashboard::new(&dash_config, channel, Local::now());
    let page = ParameterPage::new("metals", &config(8), Some(reader), Local::now()).unwrap();

    assert_eq!(page.view().unwrap().dashboard_value, None);
    let published = dashboard.tick_at(Local::now()).unwrap();
    assert_eq!(page.view().unwrap().dashboard_value, Some(published.readings.metal));
}

#[test]
fn render_adapter_fills_detail_markup() {
    let mut page = ParameterPage::new("turbidity", &config(5), None, Local::now()).unwrap();
    let view = page.tick_at(Local::now()).unwrap();
    let mut surface = ElementMap::parameter_markup(&DEFAULT_IDS, "turbidity");
    assert_eq!(render::render_parameter(&mut surface, &DEFAULT_IDS, &view), 5);
    assert_eq!(surface.get("turbidity-current").unwrap().text, view.display);
    assert_eq!(surface.get("turbidity-status").unwrap().color.as_deref(), Some(view.status.color));
    assert!(surface.get("turbidityChart").unwrap().chart.is_some());
}
