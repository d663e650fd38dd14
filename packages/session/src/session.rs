//! The stored session and the context object that owns it.

use std::sync::Arc;

use crate::storage::SessionStorage;
use crate::{EMAIL_KEY, HOME_ROUTE, LOGIN_ROUTE, SessionError, TOKEN_KEY, TRIAL_KEY};

/// An authenticated session as persisted in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque session token issued by the backend.
    pub token: String,
    /// Account email.
    pub email: Option<String>,
    /// Whether the account is on the trial tier.
    pub trial: bool,
}

/// Instruction to navigate to another route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect {
    /// Target route.
    pub route: &'static str,
}

impl Redirect {
    /// Redirect to the login route.
    #[must_use]
    pub const fn login() -> Self {
        Self { route: LOGIN_ROUTE }
    }

    /// Redirect to the home route after signing in.
    #[must_use]
    pub const fn home() -> Self {
        Self { route: HOME_ROUTE }
    }
}

/// Explicit handle on the session store.
///
/// Cheap to clone; all clones share the same storage backend.
#[derive(Clone)]
pub struct SessionContext {
    storage: Arc<dyn SessionStorage>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext").finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Wraps a storage backend.
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    /// The stored token, ignoring empty values.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if storage cannot be read.
    pub fn token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.storage.get(TOKEN_KEY)?.filter(|t| !t.trim().is_empty()))
    }

    /// Loads the stored session. Without a token there is no session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if storage cannot be read.
    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        let Some(token) = self.token()? else {
            return Ok(None);
        };

        let email = self.storage.get(EMAIL_KEY)?.filter(|e| !e.is_empty());
        let trial = self.storage.get(TRIAL_KEY)?.as_deref() == Some("true");

        Ok(Some(Session {
            token,
            email,
            trial,
        }))
    }

    /// Persists all three session fields.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if storage cannot be written.
    pub fn store(&self, session: &Session) -> Result<(), SessionError> {
        self.storage.set(TOKEN_KEY, &session.token)?;
        match &session.email {
            Some(email) => self.storage.set(EMAIL_KEY, email)?,
            None => self.storage.remove(EMAIL_KEY)?,
        }
        self.storage.set(TRIAL_KEY, trial_value(session.trial))?;
        log::debug!("Stored session for {:?}", session.email);
        Ok(())
    }

    /// Updates the email and trial flag after a successful revalidation.
    /// Fields the backend did not return are left as they are.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if storage cannot be written.
    pub fn refresh(&self, email: Option<&str>, trial: Option<bool>) -> Result<(), SessionError> {
        if let Some(email) = email.filter(|e| !e.is_empty()) {
            self.storage.set(EMAIL_KEY, email)?;
        }
        if let Some(trial) = trial {
            self.storage.set(TRIAL_KEY, trial_value(trial))?;
        }
        Ok(())
    }

    /// Removes all three session fields.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if storage cannot be written.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(EMAIL_KEY)?;
        self.storage.remove(TRIAL_KEY)?;
        Ok(())
    }

    /// Clears the session and sends the user to the login route.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if storage cannot be written.
    pub fn logout(&self) -> Result<Redirect, SessionError> {
        self.clear()?;
        log::info!("Logged out");
        Ok(Redirect::login())
    }
}

const fn trial_value(trial: bool) -> &'static str {
    if trial { "true" } else { "false" }
}
