//! Process-wide context built once at startup and passed to every command.

use std::sync::Arc;

use britmetrics_api::{BritMetricsApi, HttpApiClient};
use britmetrics_cli_utils::{MultiProgress, waiting_indicator};
use britmetrics_planner::FallbackConfig;
use britmetrics_session::{
    AuthFlow, FileStorage, GuardView, RouteGuard, SessionContext, SessionStorage,
};

/// Environment variable naming an override fallback table.
pub const FALLBACKS_ENV: &str = "BRITMETRICS_FALLBACKS";

/// Shared handles for one CLI run.
pub struct App {
    pub api: Arc<dyn BritMetricsApi>,
    pub session: SessionContext,
    pub fallbacks: Arc<FallbackConfig>,
    pub multi: MultiProgress,
}

impl App {
    /// Builds the context from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be built or the fallback
    /// override file cannot be loaded.
    pub fn from_env(multi: MultiProgress) -> Result<Self, Box<dyn std::error::Error>> {
        let api = HttpApiClient::from_env()?;
        log::debug!("Using backend at {}", api.base_url());

        let storage = FileStorage::from_env();
        log::debug!("Session file: {}", storage.path().display());

        let fallbacks = match std::env::var(FALLBACKS_ENV) {
            Ok(path) if !path.trim().is_empty() => FallbackConfig::load(path.trim())?,
            _ => FallbackConfig::embedded(),
        };

        Ok(Self::new(Arc::new(api), Arc::new(storage), fallbacks, multi))
    }

    #[must_use]
    pub fn new(
        api: Arc<dyn BritMetricsApi>,
        storage: Arc<dyn SessionStorage>,
        fallbacks: FallbackConfig,
        multi: MultiProgress,
    ) -> Self {
        Self {
            api,
            session: SessionContext::new(storage),
            fallbacks: Arc::new(fallbacks),
            multi,
        }
    }

    #[must_use]
    pub fn auth(&self) -> AuthFlow {
        AuthFlow::new(self.api.clone(), self.session.clone())
    }

    /// Mounts a fresh route guard, showing a spinner until it settles.
    ///
    /// Returns the guard's view; a protected page renders only on
    /// [`GuardView::Render`].
    ///
    /// # Errors
    ///
    /// Returns an error only if session storage fails.
    pub async fn guard(&self) -> Result<GuardView, Box<dyn std::error::Error>> {
        let mut guard = RouteGuard::new(self.api.clone(), self.session.clone());

        let spinner = waiting_indicator(&self.multi, "Checking session...");
        let result = guard.mount().await;
        spinner.finish_and_clear();
        result?;

        Ok(guard.view())
    }

    /// Runs the guard and prints the login hint when it redirects.
    ///
    /// # Errors
    ///
    /// See [`Self::guard`].
    pub async fn require_session(&self) -> Result<bool, Box<dyn std::error::Error>> {
        match self.guard().await? {
            GuardView::Render => Ok(true),
            GuardView::Redirect(route) => {
                println!("Not signed in (redirect to {route}).");
                println!("Start a trial with `britmetrics login --email <you@example.com>`.");
                Ok(false)
            }
            GuardView::Waiting => Ok(false),
        }
    }
}
