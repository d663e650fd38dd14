//! Route guard: revalidates the stored token before protected pages render.

use std::sync::Arc;

use britmetrics_api::BritMetricsApi;
use strum_macros::{AsRefStr, Display};

use crate::{LOGIN_ROUTE, SessionContext, SessionError};

/// Authentication state of a mounted guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum GuardState {
    /// The token check has not finished.
    Unknown,
    /// The stored token was accepted by the backend.
    Authenticated,
    /// No token, or the backend rejected it.
    Unauthenticated,
}

/// What a protected page should show for the current [`GuardState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardView {
    /// Block children and show a waiting indicator.
    Waiting,
    /// Render the protected children.
    Render,
    /// Navigate away.
    Redirect(&'static str),
}

/// One guard instance per protected page mount.
///
/// The token is checked at most once per instance; a token revoked while
/// the page stays mounted is only noticed by the next guard.
pub struct RouteGuard {
    api: Arc<dyn BritMetricsApi>,
    session: SessionContext,
    state: GuardState,
}

impl std::fmt::Debug for RouteGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteGuard")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl RouteGuard {
    /// Creates an unmounted guard in the [`GuardState::Unknown`] state.
    #[must_use]
    pub fn new(api: Arc<dyn BritMetricsApi>, session: SessionContext) -> Self {
        Self {
            api,
            session,
            state: GuardState::Unknown,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> GuardState {
        self.state
    }

    /// What the protected page should show.
    #[must_use]
    pub const fn view(&self) -> GuardView {
        match self.state {
            GuardState::Unknown => GuardView::Waiting,
            GuardState::Authenticated => GuardView::Render,
            GuardState::Unauthenticated => GuardView::Redirect(LOGIN_ROUTE),
        }
    }

    /// Runs the token check. Later calls return the settled state without
    /// touching storage or the network.
    ///
    /// Rejected tokens and failed checks are not errors: the session is
    /// cleared and the guard settles on [`GuardState::Unauthenticated`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] only if session storage itself fails.
    pub async fn mount(&mut self) -> Result<GuardState, SessionError> {
        if self.state != GuardState::Unknown {
            return Ok(self.state);
        }

        let Some(token) = self.session.token()? else {
            log::debug!("No stored session token");
            self.state = GuardState::Unauthenticated;
            return Ok(self.state);
        };

        self.state = match self.api.check_token(&token).await {
            Ok(check) if check.valid => {
                self.session.refresh(check.email.as_deref(), check.trial)?;
                log::debug!("Session token accepted for {:?}", check.email);
                GuardState::Authenticated
            }
            Ok(_) => {
                log::debug!("Session token rejected, clearing session");
                self.session.clear()?;
                GuardState::Unauthenticated
            }
            Err(e) => {
                log::debug!("Session token check failed: {e}");
                self.session.clear()?;
                GuardState::Unauthenticated
            }
        };

        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use britmetrics_api::stub::{Endpoint, StubApi};
    use britmetrics_api_models::TokenCheck;

    use super::*;
    use crate::storage::{MemoryStorage, SessionStorage};
    use crate::{EMAIL_KEY, TOKEN_KEY, TRIAL_KEY};

    fn setup(token: Option<&str>) -> (Arc<StubApi>, Arc<MemoryStorage>, RouteGuard) {
        let api = Arc::new(StubApi::new());
        let storage = Arc::new(MemoryStorage::new());
        if let Some(token) = token {
            storage.set(TOKEN_KEY, token).unwrap();
            storage.set(EMAIL_KEY, "old@b.com").unwrap();
            storage.set(TRIAL_KEY, "true").unwrap();
        }
        let guard = RouteGuard::new(api.clone(), SessionContext::new(storage.clone()));
        (api, storage, guard)
    }

    #[test]
    fn starts_unknown_and_waits() {
        let (_, _, guard) = setup(None);
        assert_eq!(guard.state(), GuardState::Unknown);
        assert_eq!(guard.view(), GuardView::Waiting);
    }

    #[tokio::test]
    async fn no_token_redirects_without_network_call() {
        let (api, _, mut guard) = setup(None);

        let state = guard.mount().await.unwrap();

        assert_eq!(state, GuardState::Unauthenticated);
        assert_eq!(guard.view(), GuardView::Redirect(LOGIN_ROUTE));
        assert_eq!(api.calls(Endpoint::CheckToken), 0);
    }

    #[tokio::test]
    async fn valid_token_renders_and_refreshes_session() {
        let (api, storage, mut guard) = setup(Some("tok-1"));
        api.set_token_check(Ok(TokenCheck {
            valid: true,
            email: Some("new@b.com".to_string()),
            trial: Some(false),
        }));

        assert_eq!(guard.mount().await.unwrap(), GuardState::Authenticated);
        assert_eq!(guard.view(), GuardView::Render);
        assert_eq!(api.checked_tokens(), vec!["tok-1".to_string()]);
        assert_eq!(storage.get(EMAIL_KEY).unwrap().as_deref(), Some("new@b.com"));
        assert_eq!(storage.get(TRIAL_KEY).unwrap().as_deref(), Some("false"));
    }

    #[tokio::test]
    async fn rejected_token_clears_session() {
        let (api, storage, mut guard) = setup(Some("tok-1"));
        api.set_token_check(Ok(TokenCheck::default()));

        assert_eq!(guard.mount().await.unwrap(), GuardState::Unauthenticated);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn failed_check_clears_session() {
        let (api, storage, mut guard) = setup(Some("tok-1"));
        api.set_token_check(Err("connection refused".to_string()));

        assert_eq!(guard.mount().await.unwrap(), GuardState::Unauthenticated);
        assert_eq!(guard.view(), GuardView::Redirect(LOGIN_ROUTE));
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn checks_once_per_instance() {
        let (api, _, mut guard) = setup(Some("tok-1"));
        api.set_token_check(Ok(TokenCheck {
            valid: true,
            ..TokenCheck::default()
        }));

        guard.mount().await.unwrap();
        api.set_token_check(Ok(TokenCheck::default()));
        assert_eq!(guard.mount().await.unwrap(), GuardState::Authenticated);
        assert_eq!(api.calls(Endpoint::CheckToken), 1);
    }

    #[test]
    fn state_names() {
        assert_eq!(GuardState::Unauthenticated.to_string(), "unauthenticated");
        assert_eq!(GuardState::Authenticated.as_ref(), "authenticated");
    }
}
