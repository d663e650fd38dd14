#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Campaign planner logic.
//!
//! [`Selection`] tracks the campaign, city, and area picked from the fetched
//! catalogs. [`PredictionOrchestrator`] loads those catalogs, requests
//! predictions for the selection, and keeps the latest result. The
//! [`metrics`] module turns a prediction into display values, filling gaps
//! from an injected [`FallbackConfig`].

pub mod fallbacks;
pub mod format;
pub mod metrics;
pub mod orchestrator;
pub mod selection;

pub use fallbacks::{FallbackConfig, FallbackError};
pub use metrics::{DataSource, DerivedMetrics, Sourced, TrendPoint, derive_metrics};
pub use orchestrator::{
    AnalysisOutcome, PlannerState, PredictionOrchestrator, PredictionStatus, StoredPrediction,
};
pub use selection::{Selection, SelectionError, SelectionKey};
