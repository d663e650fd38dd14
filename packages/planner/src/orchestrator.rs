//! Drives the planner page: catalog bootstrap, selection changes, and
//! prediction requests.
//!
//! State lives behind a [`std::sync::Mutex`] that is never held across an
//! `.await`. Every prediction request takes the next sequence number, and a
//! response is applied only if no newer request was issued meanwhile, so
//! the last request issued wins regardless of the order responses arrive.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use britmetrics_api::{ApiError, BritMetricsApi};
use britmetrics_api_models::{PredictRequest, Prediction};
use chrono::{DateTime, Utc};
use strum_macros::{AsRefStr, Display};

use crate::fallbacks::FallbackConfig;
use crate::metrics::{DerivedMetrics, derive_metrics};
use crate::selection::{Selection, SelectionError, SelectionKey};

/// Shown when bootstrap fails without a message.
pub const BOOTSTRAP_FAILED: &str = "Failed to load campaign configuration.";

/// Shown when an analysis is requested without a city and area.
pub const SELECT_LOCATION_FIRST: &str = "Select a city and area before running the analysis.";

/// Shown when a prediction fails without a message.
pub const PREDICT_FAILED: &str = "Failed to fetch prediction. Check the API server logs.";

/// A prediction and the selection it was requested for.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPrediction {
    pub prediction: Prediction,
    pub key: SelectionKey,
    pub received_at: DateTime<Utc>,
}

/// Whether the stored prediction matches the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum PredictionStatus {
    /// No prediction yet.
    Empty,
    /// The prediction was requested for the current selection.
    Current,
    /// The selection changed after the prediction was requested.
    Stale,
}

/// How a call to [`PredictionOrchestrator::run_analysis`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AnalysisOutcome {
    /// The new prediction replaced the stored one.
    Applied,
    /// The request failed; the previous prediction is kept.
    Failed,
    /// No city or area was selected; nothing was sent.
    Incomplete,
    /// A newer request was issued before this one settled.
    Superseded,
}

/// Everything the planner page renders.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerState {
    pub selection: Selection,
    pub prediction: Option<StoredPrediction>,
    /// Single error banner; replaced, never accumulated.
    pub error: Option<String>,
    pub is_bootstrapping: bool,
    pub is_loading: bool,
    issued: u64,
}

impl Default for PlannerState {
    fn default() -> Self {
        Self {
            selection: Selection::default(),
            prediction: None,
            error: None,
            is_bootstrapping: true,
            is_loading: false,
            issued: 0,
        }
    }
}

impl PlannerState {
    #[must_use]
    pub fn prediction_status(&self) -> PredictionStatus {
        match &self.prediction {
            None => PredictionStatus::Empty,
            Some(stored) if stored.key == self.selection.key() => PredictionStatus::Current,
            Some(_) => PredictionStatus::Stale,
        }
    }

    /// Derived display values for the stored prediction.
    #[must_use]
    pub fn metrics(&self, fallbacks: &FallbackConfig) -> Option<DerivedMetrics> {
        self.prediction
            .as_ref()
            .map(|stored| derive_metrics(&stored.prediction, &self.selection, fallbacks))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn message_or(err: &ApiError, fallback: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// Owns planner state and talks to the backend on its behalf.
pub struct PredictionOrchestrator {
    api: Arc<dyn BritMetricsApi>,
    fallbacks: Arc<FallbackConfig>,
    state: Mutex<PlannerState>,
}

impl std::fmt::Debug for PredictionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionOrchestrator")
            .field("state", &*lock(&self.state))
            .finish_non_exhaustive()
    }
}

impl PredictionOrchestrator {
    #[must_use]
    pub fn new(api: Arc<dyn BritMetricsApi>, fallbacks: Arc<FallbackConfig>) -> Self {
        Self {
            api,
            fallbacks,
            state: Mutex::new(PlannerState::default()),
        }
    }

    #[must_use]
    pub fn fallbacks(&self) -> &FallbackConfig {
        &self.fallbacks
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> PlannerState {
        lock(&self.state).clone()
    }

    /// Derived metrics for the stored prediction.
    #[must_use]
    pub fn metrics(&self) -> Option<DerivedMetrics> {
        lock(&self.state).metrics(&self.fallbacks)
    }

    /// Loads the catalogs, applies default selections, and requests the
    /// first prediction when a city and area could be chosen.
    ///
    /// Failures land in [`PlannerState::error`]; bootstrapping always ends.
    pub async fn bootstrap(&self) {
        {
            let mut state = lock(&self.state);
            state.is_bootstrapping = true;
            state.error = None;
        }

        let catalogs = tokio::try_join!(self.api.fetch_campaigns(), self.api.fetch_cities());

        let request = match catalogs {
            Ok((campaigns, cities)) => {
                log::info!(
                    "Loaded {} campaigns and {} cities",
                    campaigns.campaigns.len(),
                    cities.cities.len()
                );
                let mut state = lock(&self.state);
                state.selection = Selection::new(campaigns, cities);
                state.selection.request()
            }
            Err(e) => {
                log::error!("Failed to load catalogs: {e}");
                let mut state = lock(&self.state);
                state.error = Some(message_or(&e, BOOTSTRAP_FAILED));
                state.is_bootstrapping = false;
                return;
            }
        };

        if let Some(request) = request {
            let seq = self.issue();
            let result = self.api.predict(&request).await;
            self.settle(seq, &request, result, BOOTSTRAP_FAILED);
        }

        lock(&self.state).is_bootstrapping = false;
    }

    /// Changes the campaign. Does not request a prediction.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError`] if the campaign is unknown.
    pub fn select_campaign(&self, id: &str) -> Result<(), SelectionError> {
        lock(&self.state).selection.select_campaign(id)
    }

    /// Changes the city and resets the area. Does not request a prediction.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError`] if the city is unknown.
    pub fn select_city(&self, id: &str) -> Result<(), SelectionError> {
        lock(&self.state).selection.select_city(id)
    }

    /// Changes the area. Does not request a prediction.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError`] if the area is not in the selected city.
    pub fn select_area(&self, id: &str) -> Result<(), SelectionError> {
        lock(&self.state).selection.select_area(id)
    }

    /// Requests a prediction for the current selection.
    pub async fn run_analysis(&self) -> AnalysisOutcome {
        let (seq, request) = {
            let mut state = lock(&self.state);
            let Some(request) = state.selection.request() else {
                state.error = Some(SELECT_LOCATION_FIRST.to_string());
                return AnalysisOutcome::Incomplete;
            };
            state.error = None;
            state.issued += 1;
            state.is_loading = true;
            (state.issued, request)
        };

        log::debug!(
            "Prediction #{seq} for {}/{} ({:?})",
            request.city_id,
            request.area_id,
            request.campaign_id
        );

        let result = self.api.predict(&request).await;
        self.settle(seq, &request, result, PREDICT_FAILED)
    }

    fn issue(&self) -> u64 {
        let mut state = lock(&self.state);
        state.issued += 1;
        state.is_loading = true;
        state.issued
    }

    fn settle(
        &self,
        seq: u64,
        request: &PredictRequest,
        result: Result<Prediction, ApiError>,
        fallback_message: &str,
    ) -> AnalysisOutcome {
        let mut state = lock(&self.state);

        if seq != state.issued {
            log::warn!(
                "Discarding prediction #{seq}; #{} is the latest request",
                state.issued
            );
            return AnalysisOutcome::Superseded;
        }

        state.is_loading = false;

        match result {
            Ok(prediction) => {
                state.prediction = Some(StoredPrediction {
                    prediction,
                    key: SelectionKey::from(request),
                    received_at: Utc::now(),
                });
                AnalysisOutcome::Applied
            }
            Err(e) => {
                log::error!("Prediction #{seq} failed: {e}");
                state.error = Some(message_or(&e, fallback_message));
                AnalysisOutcome::Failed
            }
        }
    }
}
