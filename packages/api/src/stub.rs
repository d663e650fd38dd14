//! In-memory [`BritMetricsApi`] with canned responses.
//!
//! Every endpoint answers from a settable slot and counts its calls, so
//! consumers can assert both what they rendered and whether they hit the
//! network at all. Failures are configured as plain strings and surface as
//! [`ApiError::Status`] with status 500.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use britmetrics_api_models::{
    Account, AnalyticsSummary, ApiHealth, CampaignCatalog, CheckoutRequest, CheckoutSession,
    CityCatalog, CreateAccountRequest, PaymentVerification, PredictRequest, Prediction,
    TokenCheck,
};
use strum_macros::{AsRefStr, Display};
use tokio::sync::oneshot;

use crate::{ApiError, BritMetricsApi};

/// Canned outcome for one endpoint.
pub type StubResult<T> = Result<T, String>;

/// Identifies a backend endpoint for call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Endpoint {
    /// `GET /api/campaigns`
    Campaigns,
    /// `GET /api/cities`
    Cities,
    /// `POST /api/predict`
    Predict,
    /// `GET /api/analytics`
    Analytics,
    /// `DELETE /api/analytics`
    ClearAnalytics,
    /// `POST /api/auth/create-account`
    CreateAccount,
    /// `POST /api/auth/create-checkout`
    CreateCheckout,
    /// `GET /api/auth/verify-session`
    VerifySession,
    /// Token validation.
    CheckToken,
    /// `GET /api/health`
    Health,
}

/// In-memory backend.
pub struct StubApi {
    campaigns: Mutex<StubResult<CampaignCatalog>>,
    cities: Mutex<StubResult<CityCatalog>>,
    prediction: Mutex<StubResult<Prediction>>,
    queued_predictions: Mutex<VecDeque<StubResult<Prediction>>>,
    held_predictions: Mutex<VecDeque<oneshot::Receiver<()>>>,
    analytics: Mutex<StubResult<AnalyticsSummary>>,
    clear_analytics: Mutex<StubResult<()>>,
    account: Mutex<StubResult<Account>>,
    checkout: Mutex<StubResult<CheckoutSession>>,
    payment: Mutex<StubResult<PaymentVerification>>,
    token_check: Mutex<StubResult<TokenCheck>>,
    calls: Mutex<BTreeMap<Endpoint, usize>>,
    predict_requests: Mutex<Vec<PredictRequest>>,
    checked_tokens: Mutex<Vec<String>>,
}

impl Default for StubApi {
    fn default() -> Self {
        Self {
            campaigns: Mutex::new(Ok(CampaignCatalog::default())),
            cities: Mutex::new(Ok(CityCatalog::default())),
            prediction: Mutex::new(Ok(Prediction::default())),
            queued_predictions: Mutex::new(VecDeque::new()),
            held_predictions: Mutex::new(VecDeque::new()),
            analytics: Mutex::new(Ok(AnalyticsSummary::default())),
            clear_analytics: Mutex::new(Ok(())),
            account: Mutex::new(Err("no account configured".to_string())),
            checkout: Mutex::new(Err("no checkout configured".to_string())),
            payment: Mutex::new(Ok(PaymentVerification::default())),
            token_check: Mutex::new(Ok(TokenCheck::default())),
            calls: Mutex::new(BTreeMap::new()),
            predict_requests: Mutex::new(Vec::new()),
            checked_tokens: Mutex::new(Vec::new()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn answer<T: Clone>(slot: &Mutex<StubResult<T>>) -> Result<T, ApiError> {
    lock(slot).clone().map_err(failure)
}

fn failure(message: String) -> ApiError {
    ApiError::Status {
        status: 500,
        message,
    }
}

impl StubApi {
    /// Creates a stub with empty catalogs and a default prediction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `GET /api/campaigns` outcome.
    pub fn set_campaigns(&self, result: StubResult<CampaignCatalog>) {
        *lock(&self.campaigns) = result;
    }

    /// Sets the `GET /api/cities` outcome.
    pub fn set_cities(&self, result: StubResult<CityCatalog>) {
        *lock(&self.cities) = result;
    }

    /// Sets the outcome of every `predict` call not covered by the queue.
    pub fn set_prediction(&self, result: StubResult<Prediction>) {
        *lock(&self.prediction) = result;
    }

    /// Queues a one-off `predict` outcome, consumed in call order.
    pub fn push_prediction(&self, result: StubResult<Prediction>) {
        lock(&self.queued_predictions).push_back(result);
    }

    /// Makes the next `predict` call wait until the returned sender fires
    /// (or is dropped).
    #[must_use]
    pub fn hold_next_prediction(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        lock(&self.held_predictions).push_back(rx);
        tx
    }

    /// Sets the `GET /api/analytics` outcome.
    pub fn set_analytics(&self, result: StubResult<AnalyticsSummary>) {
        *lock(&self.analytics) = result;
    }

    /// Sets the `DELETE /api/analytics` outcome.
    pub fn set_clear_analytics(&self, result: StubResult<()>) {
        *lock(&self.clear_analytics) = result;
    }

    /// Sets the `create_account` outcome.
    pub fn set_account(&self, result: StubResult<Account>) {
        *lock(&self.account) = result;
    }

    /// Sets the `create_checkout` outcome.
    pub fn set_checkout(&self, result: StubResult<CheckoutSession>) {
        *lock(&self.checkout) = result;
    }

    /// Sets the `verify_session` outcome.
    pub fn set_payment(&self, result: StubResult<PaymentVerification>) {
        *lock(&self.payment) = result;
    }

    /// Sets the `check_token` outcome.
    pub fn set_token_check(&self, result: StubResult<TokenCheck>) {
        *lock(&self.token_check) = result;
    }

    /// Number of calls made to `endpoint`.
    #[must_use]
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        lock(&self.calls).get(&endpoint).copied().unwrap_or(0)
    }

    /// Every prediction request received, in call order.
    #[must_use]
    pub fn predict_requests(&self) -> Vec<PredictRequest> {
        lock(&self.predict_requests).clone()
    }

    /// Every token passed to `check_token`, in call order.
    #[must_use]
    pub fn checked_tokens(&self) -> Vec<String> {
        lock(&self.checked_tokens).clone()
    }

    fn record(&self, endpoint: Endpoint) {
        *lock(&self.calls).entry(endpoint).or_insert(0) += 1;
    }
}

#[async_trait]
impl BritMetricsApi for StubApi {
    async fn fetch_campaigns(&self) -> Result<CampaignCatalog, ApiError> {
        self.record(Endpoint::Campaigns);
        answer(&self.campaigns)
    }

    async fn fetch_cities(&self) -> Result<CityCatalog, ApiError> {
        self.record(Endpoint::Cities);
        answer(&self.cities)
    }

    async fn predict(&self, request: &PredictRequest) -> Result<Prediction, ApiError> {
        self.record(Endpoint::Predict);
        lock(&self.predict_requests).push(request.clone());

        let queued = lock(&self.queued_predictions).pop_front();
        let result = queued.unwrap_or_else(|| lock(&self.prediction).clone());

        let hold = lock(&self.held_predictions).pop_front();
        if let Some(rx) = hold {
            let _ = rx.await;
        }

        result.map_err(failure)
    }

    async fn fetch_analytics(&self) -> Result<AnalyticsSummary, ApiError> {
        self.record(Endpoint::Analytics);
        answer(&self.analytics)
    }

    async fn clear_analytics(&self) -> Result<(), ApiError> {
        self.record(Endpoint::ClearAnalytics);
        answer(&self.clear_analytics)
    }

    async fn create_account(&self, _request: &CreateAccountRequest) -> Result<Account, ApiError> {
        self.record(Endpoint::CreateAccount);
        answer(&self.account)
    }

    async fn create_checkout(
        &self,
        _request: &CheckoutRequest,
    ) -> Result<CheckoutSession, ApiError> {
        self.record(Endpoint::CreateCheckout);
        answer(&self.checkout)
    }

    async fn verify_session(&self, _session_id: &str) -> Result<PaymentVerification, ApiError> {
        self.record(Endpoint::VerifySession);
        answer(&self.payment)
    }

    async fn check_token(&self, token: &str) -> Result<TokenCheck, ApiError> {
        self.record(Endpoint::CheckToken);
        lock(&self.checked_tokens).push(token.to_string());
        answer(&self.token_check)
    }

    async fn health(&self) -> Result<ApiHealth, ApiError> {
        self.record(Endpoint::Health);
        Ok(ApiHealth {
            status: "ok".to_string(),
            timestamp: None,
        })
    }
}
