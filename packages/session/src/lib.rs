#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Session persistence, route guard, and account flows.
//!
//! A session is three string values (token, email, trial flag) kept in a
//! [`SessionStorage`] backend. Nothing here is global: a
//! [`SessionContext`] is built once at startup around an injected storage
//! adapter and handed to whatever needs it.
//!
//! [`RouteGuard`] revalidates the stored token once per mount and decides
//! whether protected pages may render. [`AuthFlow`] covers trial sign-up,
//! paid checkout, and payment verification.

pub mod auth;
pub mod guard;
pub mod session;
pub mod storage;

use thiserror::Error;

pub use auth::{AuthError, AuthFlow};
pub use guard::{GuardState, GuardView, RouteGuard};
pub use session::{Redirect, Session, SessionContext};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};

/// Route protected pages redirect to when there is no valid session.
pub const LOGIN_ROUTE: &str = "/login";

/// Route shown after a successful login.
pub const HOME_ROUTE: &str = "/";

/// Storage key for the session token.
pub const TOKEN_KEY: &str = "britmetrics_auth";

/// Storage key for the account email.
pub const EMAIL_KEY: &str = "britmetrics_email";

/// Storage key for the trial flag (`"true"` / `"false"`).
pub const TRIAL_KEY: &str = "britmetrics_trial";

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backing file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a JSON object of strings.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
