//! Trial sign-up, paid checkout, and payment verification.

use std::sync::Arc;

use britmetrics_api::{ApiError, BritMetricsApi};
use britmetrics_api_models::{CheckoutRequest, CreateAccountRequest};
use thiserror::Error;

use crate::{Session, SessionContext, SessionError};

/// Errors raised by [`AuthFlow`].
#[derive(Debug, Error)]
pub enum AuthError {
    /// The email failed local validation; nothing was sent.
    #[error("Please enter a valid email address")]
    InvalidEmail,

    /// The backend rejected the request.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The session could not be persisted.
    #[error(transparent)]
    Storage(#[from] SessionError),
}

/// Account flows that end with a stored session.
pub struct AuthFlow {
    api: Arc<dyn BritMetricsApi>,
    session: SessionContext,
}

impl std::fmt::Debug for AuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthFlow").finish_non_exhaustive()
    }
}

fn validate_email(email: &str) -> Result<&str, AuthError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::InvalidEmail);
    }
    Ok(email)
}

impl AuthFlow {
    #[must_use]
    pub fn new(api: Arc<dyn BritMetricsApi>, session: SessionContext) -> Self {
        Self { api, session }
    }

    /// Creates a trial account and stores its session.
    ///
    /// # Errors
    ///
    /// * [`AuthError::InvalidEmail`] before any request if `email` is invalid
    /// * [`AuthError::Api`] if account creation fails
    /// * [`AuthError::Storage`] if the session cannot be stored
    pub async fn start_trial(&self, email: &str) -> Result<Session, AuthError> {
        let email = validate_email(email)?;

        let account = self
            .api
            .create_account(&CreateAccountRequest {
                email: email.to_string(),
                trial: true,
            })
            .await?;

        let session = Session {
            token: account.token,
            email: Some(email.to_string()),
            trial: true,
        };
        self.session.store(&session)?;
        log::info!("Started trial for {email}");

        Ok(session)
    }

    /// Opens a paid checkout and returns the hosted checkout URL.
    ///
    /// # Errors
    ///
    /// * [`AuthError::InvalidEmail`] before any request if `email` is invalid
    /// * [`AuthError::Api`] if the checkout cannot be created
    pub async fn start_checkout(&self, email: &str) -> Result<String, AuthError> {
        let email = validate_email(email)?;

        let checkout = self
            .api
            .create_checkout(&CheckoutRequest {
                email: email.to_string(),
            })
            .await?;

        log::info!("Created checkout session {:?}", checkout.session_id);
        Ok(checkout.checkout_url)
    }

    /// Verifies a returned checkout session and stores the paid session.
    ///
    /// Failures are logged and reported as `None`; the user is not shown an
    /// error for a verification that did not go through.
    pub async fn verify_payment(&self, session_id: &str) -> Option<Session> {
        let verification = match self.api.verify_session(session_id).await {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Payment verification failed: {e}");
                return None;
            }
        };

        if !verification.paid {
            log::warn!("Checkout session {session_id} is not paid");
            return None;
        }

        let Some(token) = verification.token.filter(|t| !t.is_empty()) else {
            log::warn!("Paid checkout session {session_id} returned no token");
            return None;
        };

        let session = Session {
            token,
            email: verification.email,
            trial: false,
        };

        if let Err(e) = self.session.store(&session) {
            log::warn!("Failed to store paid session: {e}");
            return None;
        }

        log::info!("Payment verified for {:?}", session.email);
        Some(session)
    }
}
