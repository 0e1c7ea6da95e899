//! ==============================================================================
//! render.rs - render adapter
//! ==============================================================================
//!
//! purpose:
//!     pushes computed views into a surface of id-addressed elements. markup
//!     drifts, so each field has an ordered list of candidate ids; the first
//!     one present wins and a field with none present is skipped. nothing
//!     here feeds back into the core.
//!
//! relationships:
//!     - used by: server.rs (html page)
//!     - reads: controller.rs views
//!     - ElementMap: the in-memory surface served as html
//!
//! ==============================================================================

use std::collections::BTreeMap;

use crate::controller::{ChartData, DashboardView, ParameterView};
use crate::domain::{ParameterId, Severity};

/// id-addressed output elements
pub trait RenderSurface {
    fn contains(&self, id: &str) -> bool;

    /// returns false when no element has this id
    fn set_text(&mut self, id: &str, text: &str, color: Option<&str>) -> bool;

    fn set_style(&mut self, id: &str, border: &str, shadow: &str) -> bool;

    fn set_chart(&mut self, id: &str, chart: &str) -> bool;
}

// ==============================================================================
// candidate ids
// ==============================================================================

/// ordered candidate ids per field; `{id}` is replaced by the parameter key
#[derive(Debug, Clone)]
pub struct ElementIds {
    pub values: [(ParameterId, &'static [&'static str]); 6],
    pub card: &'static [&'static str],
    pub status: &'static [&'static str],
    pub overall: &'static [&'static str],
    pub insight: &'static [&'static str],
    pub live_status: &'static [&'static str],
    pub chart: &'static [&'static str],
    /// detail pages; `{page}` is replaced by the page key
    pub page_current: &'static [&'static str],
    pub page_average: &'static [&'static str],
    pub page_status: &'static [&'static str],
    pub page_insight: &'static [&'static str],
    pub page_chart: &'static [&'static str],
}

pub static DEFAULT_IDS: ElementIds = ElementIds {
    values: [
        (ParameterId::Ph, &["ph-value", "ph-value-text", "ph-value-display"]),
        (ParameterId::Tds, &["tds-value", "tds-value-text"]),
        (ParameterId::Turbidity, &["turbidity-value", "turbidity-value-text"]),
        (
            ParameterId::Temp,
            &["temperature-value", "temp-value", "temp-value-text", "temp-value-display"],
        ),
        (ParameterId::Do, &["do-value", "do-value-text"]),
        (ParameterId::Metal, &["metals-value", "metal-value", "metal-value-text"]),
    ],
    card: &["{id}-card", "{id}Card"],
    status: &["{id}-status", "{id}Status"],
    overall: &["overall-status", "quality-summary"],
    insight: &["insight-text"],
    live_status: &["live-status"],
    chart: &["liveChart"],
    page_current: &["{page}-current"],
    page_average: &["{page}-average"],
    page_status: &["{page}-status"],
    page_insight: &["{page}-insight"],
    page_chart: &["{page}Chart"],
};

impl ElementIds {
    pub fn value_ids(&self, id: ParameterId) -> &'static [&'static str] {
        self.values
            .iter()
            .find(|(p, _)| *p == id)
            .map(|(_, ids)| *ids)
            .unwrap_or(&[])
    }
}

fn expand(templates: &[&str], placeholder: &str, key: &str) -> Vec<String> {
    templates.iter().map(|t| t.replace(placeholder, key)).collect()
}

fn owned(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

/// first candidate present on the surface
pub fn first_present<'a, S, I>(surface: &S, candidates: I) -> Option<String>
where
    S: RenderSurface + ?Sized,
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .find(|id| surface.contains(id))
        .map(str::to_string)
}

fn set_first<S: RenderSurface + ?Sized>(surface: &mut S, candidates: &[String], text: &str, color: Option<&str>) -> bool {
    match first_present(surface, candidates.iter().map(String::as_str)) {
        Some(id) => surface.set_text(&id, text, color),
        None => false,
    }
}

/// border and shadow for a card at the given severity
pub fn card_style(severity: Option<Severity>) -> (&'static str, &'static str) {
    match severity {
        Some(Severity::Unsafe) => ("1px solid rgba(255,80,80,0.12)", "0 8px 20px rgba(255,80,80,0.06)"),
        Some(Severity::Warning) => ("1px solid rgba(255,215,64,0.12)", "0 8px 20px rgba(255,215,64,0.04)"),
        _ => ("1px solid rgba(0,255,136,0.12)", "0 8px 20px rgba(0,255,136,0.05)"),
    }
}

// ==============================================================================
// renderers
// ==============================================================================

/// write a dashboard view; returns how many fields found a target
pub fn render_dashboard<S: RenderSurface + ?Sized>(surface: &mut S, ids: &ElementIds, view: &DashboardView) -> usize {
    let mut written = 0;

    for card in &view.cards {
        let values = owned(ids.value_ids(card.id));
        written += usize::from(set_first(surface, &values, &card.display, None));

        let key = card.id.as_str();
        let status = expand(ids.status, "{id}", key);
        written += usize::from(set_first(surface, &status, card.status.text, Some(card.status.color)));

        if let Some(card_id) = first_present(surface, expand(ids.card, "{id}", key).iter().map(String::as_str)) {
            let (border, shadow) = card_style(card.status.severity);
            written += usize::from(surface.set_style(&card_id, border, shadow));
        }
    }

    let overall = owned(ids.overall);
    written += usize::from(set_first(surface, &overall, view.overall.text, Some(view.overall.color)));

    let insight = owned(ids.insight);
    written += usize::from(set_first(surface, &insight, view.insight.message, Some(view.insight.color)));

    written += usize::from(render_chart(surface, &owned(ids.chart), &view.chart));
    written += usize::from(render_live(surface, ids, view.live));
    written
}

/// write a detail page view; returns how many fields found a target
pub fn render_parameter<S: RenderSurface + ?Sized>(surface: &mut S, ids: &ElementIds, view: &ParameterView) -> usize {
    let key = view.key;
    let mut written = 0;
    written += usize::from(set_first(surface, &expand(ids.page_current, "{page}", key), &view.display, None));
    written += usize::from(set_first(
        surface,
        &expand(ids.page_average, "{page}", key),
        &view.average_display,
        None,
    ));
    written += usize::from(set_first(
        surface,
        &expand(ids.page_status, "{page}", key),
        view.status.text,
        Some(view.status.color),
    ));
    written += usize::from(set_first(surface, &expand(ids.page_insight, "{page}", key), view.insight, None));

    if let Some(chart_id) = first_present(surface, expand(ids.page_chart, "{page}", key).iter().map(String::as_str)) {
        if let Ok(json) = serde_json::to_string(&view.chart) {
            written += usize::from(surface.set_chart(&chart_id, &json));
        }
    }
    written
}

fn render_chart<S: RenderSurface + ?Sized>(surface: &mut S, candidates: &[String], chart: &ChartData) -> bool {
    let Some(id) = first_present(surface, candidates.iter().map(String::as_str)) else {
        return false;
    };
    match serde_json::to_string(chart) {
        Ok(json) => surface.set_chart(&id, &json),
        Err(e) => {
            tracing::warn!("[RENDER] ⚠ chart not encoded: {}", e);
            false
        }
    }
}

/// header text next to the clock
pub fn render_live<S: RenderSurface + ?Sized>(surface: &mut S, ids: &ElementIds, live: bool) -> bool {
    let (text, color) = if live { ("Live Mode: ON", "#00ff88") } else { ("Live Mode: OFF", "#ff4d4d") };
    set_first(surface, &owned(ids.live_status), text, Some(color))
}

// ==============================================================================
// in-memory surface
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub text: String,
    pub color: Option<String>,
    pub border: Option<String>,
    pub shadow: Option<String>,
    /// chart payload as json
    pub chart: Option<String>,
}

/// flat id -> element map standing in for page markup
#[derive(Debug, Clone, Default)]
pub struct ElementMap {
    elements: BTreeMap<String, Element>,
}

impl ElementMap {
    pub fn with_ids<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self { elements: ids.into_iter().map(|id| (id.into(), Element::default())).collect() }
    }

    /// markup used by the served dashboard: first candidate of every field
    pub fn dashboard_markup(ids: &ElementIds) -> Self {
        let mut markup: Vec<String> = Vec::new();
        for (id, values) in &ids.values {
            markup.extend(values.first().map(|s| s.to_string()));
            markup.extend(expand(ids.card, "{id}", id.as_str()).into_iter().take(1));
            markup.extend(expand(ids.status, "{id}", id.as_str()).into_iter().take(1));
        }
        for field in [ids.overall, ids.insight, ids.live_status, ids.chart] {
            markup.extend(field.first().map(|s| s.to_string()));
        }
        Self::with_ids(markup)
    }

    /// markup for one detail page
    pub fn parameter_markup(ids: &ElementIds, page: &str) -> Self {
        let fields = [ids.page_current, ids.page_average, ids.page_status, ids.page_insight, ids.page_chart];
        Self::with_ids(
            fields
                .iter()
                .filter_map(|f| expand(f, "{page}", page).into_iter().next()),
        )
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn to_html(&self, title: &str) -> String {
        let mut body = String::new();
        for (id, el) in &self.elements {
            let mut style = String::new();
            if let Some(color) = &el.color {
                style.push_str(&format!("color: {};", color));
            }
            if let Some(border) = &el.border {
                style.push_str(&format!("border: {};", border));
            }
            if let Some(shadow) = &el.shadow {
                style.push_str(&format!("box-shadow: {};", shadow));
            }
            match &el.chart {
                Some(chart) => body.push_str(&format!(
                    "<script type=\"application/json\" id=\"{}\">{}</script>\n",
                    html_escape(id),
                    chart.replace("</", "<\\/")
                )),
                None => body.push_str(&format!(
                    "<div id=\"{}\" style=\"{}\">{}</div>\n",
                    html_escape(id),
                    html_escape(&style),
                    html_escape(&el.text)
                )),
            }
        }
        format!(
            "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}</body>\n</html>\n",
            html_escape(title),
            body
        )
    }
}

impl RenderSurface for ElementMap {
    fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    fn set_text(&mut self, id: &str, text: &str, color: Option<&str>) -> bool {
        let Some(el) = self.elements.get_mut(id) else {
            return false;
        };
        el.text = text.to_string();
        if let Some(color) = color {
            el.color = Some(color.to_string());
        }
        true
    }

    fn set_style(&mut self, id: &str, border: &str, shadow: &str) -> bool {
        let Some(el) = self.elements.get_mut(id) else {
            return false;
        };
        el.border = Some(border.to_string());
        el.shadow = Some(shadow.to_string());
        true
    }

    fn set_chart(&mut self, id: &str, chart: &str) -> bool {
        let Some(el) = self.elements.get_mut(id) else {
            return false;
        };
        el.chart = Some(chart.to_string());
        true
    }
}

/// escape html special characters to prevent xss
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
