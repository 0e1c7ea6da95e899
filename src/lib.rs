//! ==============================================================================
//! aqua-sentinel - simulated water-quality monitor
//! ==============================================================================
//!
//! fabricates sensor readings on a timer, classifies them, keeps rolling
//! chart windows and publishes the newest snapshot to a shared slot.
//!
//! module map (leaf first):
//!
//! ```text
//!     domain ──► generator ──┐
//!        │                   ├──► controller ──► render ──► server
//!        ├────► evaluator ───┤        ▲
//!        │         │         │        │
//!        │         ▼         │      config
//!        └────► insight ─────┘
//!     series, sync ──────────► controller
//! ```
//!
//! ==============================================================================

pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod evaluator;
pub mod generator;
pub mod insight;
pub mod render;
pub mod series;
pub mod server;
pub mod sync;

pub use controller::{Dashboard, DashboardView, ParameterPage, ParameterView};
pub use domain::{ParameterId, ReadingSet, Severity};
pub use error::{Result, SentinelError};
