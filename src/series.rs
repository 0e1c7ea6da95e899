//! ==============================================================================
//! series.rs - fixed-capacity rolling time series
//! ==============================================================================
//!
//! purpose:
//!     keeps the last N (label, value) points per series for chart output.
//!     appending past capacity evicts exactly the single oldest point, so
//!     every window stays in chronological order.
//!
//! usage:
//!     - dashboard: six series, capacity 12, advanced together by append_row
//!     - detail page: one series, capacity 10
//!
//! ==============================================================================

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::VecDeque;
use std::hash::Hash;

/// one chart point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub label: String,
    pub value: f64,
}

/// one queue per series, all sharing the same capacity
#[derive(Debug, Clone)]
pub struct SeriesStore<K> {
    capacity: usize,
    series: IndexMap<K, VecDeque<Point>>,
}

impl<K: Eq + Hash + Clone> SeriesStore<K> {
    /// `capacity` is clamped to at least one point
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), series: IndexMap::new() }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// append to one series, creating it on first use
    pub fn append(&mut self, series: K, label: impl Into<String>, value: f64) {
        let capacity = self.capacity;
        let queue = self
            .series
            .entry(series)
            .or_insert_with(|| VecDeque::with_capacity(capacity + 1));
        queue.push_back(Point { label: label.into(), value });
        if queue.len() > capacity {
            queue.pop_front();
        }
    }

    /// lock-step append: every listed series gets a point with the same label
    pub fn append_row<I>(&mut self, label: &str, values: I)
    where
        I: IntoIterator<Item = (K, f64)>,
    {
        for (series, value) in values {
            self.append(series, label, value);
        }
    }

    /// ordered window for one series (empty if never appended)
    pub fn window(&self, series: &K) -> Vec<Point> {
        self.series
            .get(series)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn values(&self, series: &K) -> Vec<f64> {
        self.series
            .get(series)
            .map(|q| q.iter().map(|p| p.value).collect())
            .unwrap_or_default()
    }

    pub fn len(&self, series: &K) -> usize {
        self.series.get(series).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.series.values().all(VecDeque::is_empty)
    }

    pub fn latest(&self, series: &K) -> Option<&Point> {
        self.series.get(series).and_then(VecDeque::back)
    }

    /// labels of the first series; lock-step series share them
    pub fn labels(&self) -> Vec<String> {
        self.series
            .values()
            .next()
            .map(|q| q.iter().map(|p| p.label.clone()).collect())
            .unwrap_or_default()
    }

    /// mean of the current window
    pub fn average(&self, series: &K) -> Option<f64> {
        let q = self.series.get(series)?;
        if q.is_empty() {
            return None;
        }
        Some(q.iter().map(|p| p.value).sum::<f64>() / q.len() as f64)
    }

    /// series keys in first-append order
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.series.keys()
    }
}
