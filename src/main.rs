//! ==============================================================================
//! main.rs - aqua sentinel entry point
//! ==============================================================================
//!
//! purpose:
//!     runs the simulated monitor: one dashboard and a set of parameter
//!     detail pages, each ticking on its own timer, plus the web surface.
//!
//! responsibilities:
//!     - load configuration and start logging
//!     - open the shared snapshot store
//!     - build the page controllers (dashboard preloads its chart)
//!     - run one periodic tick loop per page
//!     - serve the dashboard html and json api
//!
//! architecture:
//!
//!     ┌──────────────────────────────────────────────────────────────┐
//!     │                          host                                │
//!     │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────┐  │
//!     │  │ dashboard    │  │ detail pages │  │ web server         │  │
//!     │  │ (4s ticks)   │  │ (5s ticks)   │  │ (html + json)      │  │
//!     │  └──────┬───────┘  └──────┬───────┘  └─────────┬──────────┘  │
//!     │         │ publish         │ read back          │ views       │
//!     │         ▼                 ▼                    │             │
//!     │     ┌─────────────────────────┐                │             │
//!     │     │ snapshot slot           │ <──────────────┘             │
//!     │     │ "aquaReadings"          │                              │
//!     │     └─────────────────────────┘                              │
//!     └──────────────────────────────────────────────────────────────┘
//!
//! ==============================================================================

use anyhow::Result;
use chrono::Local;
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tracing_subscriber::EnvFilter;

use aqua_sentinel::config::{LoggingConfig, SentinelConfig};
use aqua_sentinel::controller::{Dashboard, ParameterPage};
use aqua_sentinel::server::{self, Shared};
use aqua_sentinel::sync::SyncChannel;

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("aqua_sentinel={}", logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // step 1: load configuration, then logging
    let (config, warnings) = SentinelConfig::load_or_default();
    init_tracing(&config.logging);

    tracing::info!("===========================================================");
    tracing::info!("  Aqua Sentinel - simulated water quality monitor");
    tracing::info!("===========================================================");
    for warning in &warnings {
        tracing::warn!("[CONFIG] Warning: {}", warning);
    }
    config.log_summary();

    // step 2: shared snapshot slot
    let store = config.storage.open()?;
    let mut channel = SyncChannel::with_key(store, config.storage.key.clone());
    channel.subscribe(|r| {
        tracing::debug!("[SYNC] snapshot updated: ph={:.2} tds={:.0} metal={:.3}", r.ph, r.tds, r.metal);
    });
    let reader = channel.reader();

    // step 3: page controllers
    let now = Local::now();
    let mut dashboard = Dashboard::new(&config.dashboard, channel, now);
    dashboard.set_live(config.live.enabled);

    let mut pages = Vec::new();
    for key in &config.parameter_page.pages {
        match ParameterPage::new(key, &config.parameter_page, Some(reader.clone()), now) {
            Ok(mut page) => {
                page.set_live(config.live.enabled);
                tracing::info!("[STARTUP] ✓ parameter page {}", page.key());
                pages.push(page);
            }
            Err(e) => tracing::warn!("[STARTUP] ⚠ skipping page {:?}: {}", key, e),
        }
    }
    let state = Arc::new(Shared::new(dashboard, pages));

    // step 4: tick loops
    let show_readings = config.logging.show_readings;
    let dashboard_state = state.clone();
    let dashboard_every = config.dashboard.interval();
    tokio::spawn(async move {
        let mut ticker = interval(dashboard_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let mut dashboard = dashboard_state.dashboard.write().await;
            if let Some(view) = dashboard.tick() {
                if show_readings {
                    tracing::info!(
                        "[DASHBOARD] {} | {} | {}",
                        view.label,
                        view.overall.text,
                        view.insight.message
                    );
                }
            }
        }
    });

    let page_every = config.parameter_page.interval();
    for index in 0..state.pages.len() {
        let page_state = state.clone();
        tokio::spawn(async move {
            let mut ticker = interval(page_every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // the first tick fires at once; the page is already filled
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let mut page = page_state.pages[index].page.write().await;
                if let Some(view) = page.tick() {
                    if show_readings {
                        tracing::info!(
                            "[PAGE {}] {} (avg {}) {}",
                            view.key,
                            view.display,
                            view.average_display,
                            view.status.text
                        );
                    }
                }
            }
        });
    }

    // step 5: web surface (runs until shutdown)
    server::run(state, &config.server.bind).await
}
