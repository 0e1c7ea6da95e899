//! ==============================================================================
//! server.rs - dashboard web surface
//! ==============================================================================
//!
//! purpose:
//!     serves what the page controllers computed: an html page built through
//!     the render adapter, plus json views for programmatic access.
//!
//! routes:
//!     GET  /                      dashboard html (render adapter output)
//!     GET  /parameter/:key        detail page html
//!     GET  /api                   latest dashboard view
//!     GET  /api/parameter/:key    latest detail page view
//!     GET  /api/snapshot          raw persisted reading set
//!     POST /api/live?enabled=..   toggle live mode on every page
//!
//! relationships:
//!     - used by: main.rs
//!     - reads: controller.rs (views), sync.rs (snapshot), render.rs (html)
//!
//! ==============================================================================

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

use crate::controller::{page_layout, Dashboard, DashboardView, PageLayout, ParameterPage, ParameterView};
use crate::render::{self, ElementIds, ElementMap, DEFAULT_IDS};

// ==============================================================================
// shared state
// ==============================================================================
// each controller is written only by its own tick loop and read here.
// rwlock: many readers OR the one ticking writer.

/// one detail page and the layout it was built for
pub struct PageSlot {
    pub layout: &'static PageLayout,
    pub page: RwLock<ParameterPage>,
}

pub struct Shared {
    pub dashboard: RwLock<Dashboard>,
    pub pages: Vec<PageSlot>,
    pub ids: &'static ElementIds,
}

impl Shared {
    pub fn new(dashboard: Dashboard, pages: Vec<ParameterPage>) -> Self {
        Self {
            dashboard: RwLock::new(dashboard),
            pages: pages
                .into_iter()
                .map(|page| PageSlot { layout: page.layout(), page: RwLock::new(page) })
                .collect(),
            ids: &DEFAULT_IDS,
        }
    }

    /// page whose parameter matches `key` (aliases accepted); takes no lock
    pub fn page(&self, key: &str) -> Option<&RwLock<ParameterPage>> {
        let layout = page_layout(key).ok()?;
        self.pages
            .iter()
            .find(|slot| slot.layout.id == layout.id)
            .map(|slot| &slot.page)
    }

    pub async fn set_live(&self, enabled: bool) {
        self.dashboard.write().await.set_live(enabled);
        for slot in &self.pages {
            slot.page.write().await.set_live(enabled);
        }
    }
}

pub fn router(state: Arc<Shared>) -> Router {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/parameter/:key", get(parameter_page))
        .route("/api", get(dashboard_api))
        .route("/api/parameter/:key", get(parameter_api))
        .route("/api/snapshot", get(snapshot_api))
        .route("/api/live", post(live_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(state: Arc<Shared>, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("[SERVER] ✓ Dashboard live at http://{}", bind);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ==============================================================================
// handlers
// ==============================================================================

async fn dashboard_page(State(state): State<Arc<Shared>>) -> Html<String> {
    let dashboard = state.dashboard.read().await;
    let mut surface = ElementMap::dashboard_markup(state.ids);
    match dashboard.view() {
        Some(view) => {
            render::render_dashboard(&mut surface, state.ids, &view);
        }
        // no tick yet: still show the live indicator
        None => {
            render::render_live(&mut surface, state.ids, dashboard.is_live());
        }
    }
    Html(surface.to_html("Aqua Sentinel"))
}

async fn parameter_page(State(state): State<Arc<Shared>>, Path(key): Path<String>) -> Response {
    let Some(page) = state.page(&key) else {
        return not_found(&key);
    };
    let page = page.read().await;
    let mut surface = ElementMap::parameter_markup(state.ids, page.key());
    if let Some(view) = page.view() {
        render::render_parameter(&mut surface, state.ids, &view);
    }
    Html(surface.to_html(page.layout().label)).into_response()
}

async fn dashboard_api(State(state): State<Arc<Shared>>) -> Json<Option<DashboardView>> {
    Json(state.dashboard.read().await.view())
}

async fn parameter_api(State(state): State<Arc<Shared>>, Path(key): Path<String>) -> Response {
    let Some(page) = state.page(&key) else {
        return not_found(&key);
    };
    let view: Option<ParameterView> = page.read().await.view();
    Json(view).into_response()
}

async fn snapshot_api(State(state): State<Arc<Shared>>) -> Response {
    match state.dashboard.read().await.channel().latest() {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => {
            tracing::warn!("[SERVER] ⚠ snapshot read failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"status": "error", "message": e.to_string()})),
            )
                .into_response()
        }
    }
}

/// live toggle params
#[derive(Deserialize)]
struct LiveParams {
    enabled: bool,
}

/// POST /api/live?enabled=true|false
async fn live_handler(State(state): State<Arc<Shared>>, Query(params): Query<LiveParams>) -> Json<serde_json::Value> {
    state.set_live(params.enabled).await;
    Json(serde_json::json!({
        "status": "ok",
        "live": params.enabled,
        "label": if params.enabled { "Live Mode: ON" } else { "Live Mode: OFF" },
    }))
}

fn not_found(key: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"status": "error", "message": format!("no page for {:?}", key)})),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DashboardConfig, ParameterPageConfig};
    use crate::sync::{MemoryStore, SyncChannel};
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Local;
    use tower::ServiceExt;

    /// dashboard with no preload and no tick, plus ph and temperature pages
    fn state() -> Arc<Shared> {
        let channel = SyncChannel::new(Arc::new(MemoryStore::new()));
        let reader = channel.reader();
        let dash_config = DashboardConfig { seed: Some(5), ..DashboardConfig::default() };
        let dashboard = Dashboard::with_generator(
            &dash_config,
            channel,
            Box::new(crate::generator::UniformDraw::dashboard(Some(5))),
        );
        let page_config = ParameterPageConfig { seed: Some(5), ..ParameterPageConfig::default() };
        let pages = ["ph", "temperature"]
            .iter()
            .map(|key| ParameterPage::new(key, &page_config, Some(reader.clone()), Local::now()).unwrap())
            .collect();
        Arc::new(Shared::new(dashboard, pages))
    }

    async fn send(state: &Arc<Shared>, method: &str, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn page_lookup_accepts_aliases() {
        let state = state();
        assert!(state.page("temp").is_some());
        assert!(state.page("temperature").is_some());
        // known parameter, but no page was started for it
        assert!(state.page("metals").is_none());
        assert!(state.page("chlorine").is_none());
    }

    #[tokio::test]
    async fn parameter_api_resolves_alias() {
        let state = state();
        let (status, body) = send(&state, "GET", "/api/parameter/temp").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["key"], "temperature");
        assert_eq!(json["chart"]["values"].as_array().map(Vec::len), Some(10));
    }

    #[tokio::test]
    async fn missing_page_is_json_404() {
        let state = state();
        for uri in ["/api/parameter/metals", "/api/parameter/chlorine", "/parameter/tds"] {
            let (status, body) = send(&state, "GET", uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            let json: serde_json::Value = serde_json::from_str(&body).unwrap();
            assert_eq!(json["status"], "error", "{uri}");
        }
    }

    #[tokio::test]
    async fn live_toggle_reaches_every_page() {
        let state = state();
        let (status, body) = send(&state, "POST", "/api/live?enabled=false").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["live"], false);
        assert_eq!(json["label"], "Live Mode: OFF");

        assert!(!state.dashboard.read().await.is_live());
        for slot in &state.pages {
            assert!(!slot.page.read().await.is_live(), "{}", slot.layout.key);
        }
        assert!(state.dashboard.write().await.tick().is_none());

        send(&state, "POST", "/api/live?enabled=true").await;
        assert!(state.dashboard.read().await.is_live());
    }

    #[tokio::test]
    async fn snapshot_api_returns_persisted_readings() {
        let state = state();
        let (status, body) = send(&state, "GET", "/api/snapshot").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "null");

        let published = state.dashboard.write().await.tick().unwrap();
        let (_, body) = send(&state, "GET", "/api/snapshot").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 8);
        assert_eq!(json["metals"], json["metal"]);
        assert_eq!(json["temperature"].as_f64(), Some(published.readings.temp));
    }

    #[tokio::test]
    async fn dashboard_html_before_and_after_first_tick() {
        let state = state();
        let (status, html) = send(&state, "GET", "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Live Mode: ON"));
        assert!(!html.contains("yRight"));

        let view = state.dashboard.write().await.tick().unwrap();
        let (_, html) = send(&state, "GET", "/").await;
        assert!(html.contains("yRight"));
        assert!(html.contains(&render::html_escape(&view.overall.text)));
    }

    #[tokio::test]
    async fn parameter_html_uses_page_label() {
        let state = state();
        let (status, html) = send(&state, "GET", "/parameter/ph").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<title>pH Level</title>"));
        assert!(html.contains("id=\"phChart\""));
    }
}
