#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Typed REST client for the `BritMetrics` backend.
//!
//! Every backend operation is a method on the [`BritMetricsApi`] trait so
//! that callers (the planner, the session guard, the analytics poller) can
//! be driven by either the real [`HttpApiClient`] or, with the `stub`
//! feature, an in-memory [`stub::StubApi`].
//!
//! Failures are normalized into a single human-readable message: the
//! `detail` or `message` field of a JSON error body if there is one,
//! otherwise the HTTP status text. Nothing is retried.

pub mod client;
pub mod config;
#[cfg(feature = "stub")]
pub mod stub;

use async_trait::async_trait;
use britmetrics_api_models::{
    Account, AnalyticsSummary, ApiHealth, CampaignCatalog, CheckoutRequest, CheckoutSession,
    CityCatalog, CreateAccountRequest, PaymentVerification, PredictRequest, Prediction,
    TokenCheck,
};
use thiserror::Error;

pub use client::HttpApiClient;
pub use config::ApiConfig;

/// Errors returned by backend calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error text extracted from the body, or the status text.
        message: String,
    },

    /// The backend answered `204 No Content` where a body was required.
    #[error("Empty response from {path}")]
    EmptyResponse {
        /// Request path.
        path: String,
    },

    /// The client is misconfigured.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}

impl ApiError {
    /// HTTP status code, if the backend answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Json(_) | Self::EmptyResponse { .. } | Self::Config { .. } => None,
        }
    }
}

/// The backend operations used by the planner front-end.
///
/// All operations are asynchronous and may fail; callers must not assume
/// success.
#[async_trait]
pub trait BritMetricsApi: Send + Sync {
    /// `GET /api/campaigns`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    async fn fetch_campaigns(&self) -> Result<CampaignCatalog, ApiError>;

    /// `GET /api/cities`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    async fn fetch_cities(&self) -> Result<CityCatalog, ApiError>;

    /// `POST /api/predict`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    async fn predict(&self, request: &PredictRequest) -> Result<Prediction, ApiError>;

    /// `GET /api/analytics`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    async fn fetch_analytics(&self) -> Result<AnalyticsSummary, ApiError>;

    /// `DELETE /api/analytics`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    async fn clear_analytics(&self) -> Result<(), ApiError>;

    /// `POST /api/auth/create-account`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    async fn create_account(&self, request: &CreateAccountRequest) -> Result<Account, ApiError>;

    /// `POST /api/auth/create-checkout`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, ApiError>;

    /// `GET /api/auth/verify-session?session_id=...`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    async fn verify_session(&self, session_id: &str) -> Result<PaymentVerification, ApiError>;

    /// Validates a stored session token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails or the token is rejected
    /// with a non-success status.
    async fn check_token(&self, token: &str) -> Result<TokenCheck, ApiError>;

    /// `GET /api/health`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    async fn health(&self) -> Result<ApiHealth, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_displays_only_the_message() {
        let err = ApiError::Status {
            status: 404,
            message: "Unknown city id 'paris'".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown city id 'paris'");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn config_error_has_no_status() {
        let err = ApiError::Config {
            message: "missing base URL".to_string(),
        };
        assert_eq!(err.status(), None);
    }
}
