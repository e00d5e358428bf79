//! Login and logout orchestration.
//!
//! `AuthService::login` runs three phases in order for each call:
//! 1. start: a loading toast is shown and the status becomes `Pending`
//! 2. success: the toast is swapped for a success toast, the token is
//!    stored, the current-user query is invalidated, and the app navigates
//!    to the dashboard
//! 3. failure: the toast is swapped for an error toast and the stored token
//!    is left alone
//!
//! Only one login may be pending per service. A second call made while one
//! is in flight fails with `AuthError::InProgress` without touching the
//! network. In-flight logins cannot be cancelled; dropping the future only
//! resets the status so a new attempt can start.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::credentials::ValidCredentials;
use super::session::Session;
use crate::api::{get_current_user_query_key, ApiError, AuthApi, LoginRequest, MeResponse};
use crate::cache::QueryCache;
use crate::notify::{Notifier, ToastId};
use crate::router::{Navigator, Route};

const LOADING_MESSAGE: &str = "Logging in...";
const SUCCESS_MESSAGE: &str = "Login successful!";

/// Route entered after a successful login.
pub const LOGIN_DESTINATION: Route = Route::Dashboard;

/// Route entered after logout.
pub const LOGOUT_DESTINATION: Route = Route::Root;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No response was received.
    #[error("{0}")]
    Network(String),

    /// The server answered with an error status.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The server answered successfully but the body was unusable.
    #[error("{0}")]
    InvalidResponse(String),

    #[error("A login is already in progress")]
    InProgress,

    #[error("Not logged in")]
    NotAuthenticated,
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        let message = err.user_message();
        match err {
            ApiError::Network(_) => AuthError::Network(message),
            ApiError::Server { status, .. } => AuthError::Server {
                status: status.as_u16(),
                message,
            },
            ApiError::InvalidResponse(_) => AuthError::InvalidResponse(message),
        }
    }
}

/// Status of the login mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

#[derive(Debug, Default)]
struct MutationState {
    status: MutationStatus,
    last_error: Option<AuthError>,
}

/// Resets a pending login if its future is dropped before finishing.
struct InFlight<'a> {
    state: &'a Mutex<MutationState>,
    notifier: &'a dyn Notifier,
    toast: ToastId,
    finished: bool,
}

impl InFlight<'_> {
    fn finish(mut self, result: Result<(), AuthError>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match result {
            Ok(()) => {
                state.status = MutationStatus::Success;
                state.last_error = None;
            }
            Err(e) => {
                state.status = MutationStatus::Error;
                state.last_error = Some(e);
            }
        }
        self.finished = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        debug!("Login dropped before completion");
        self.notifier.dismiss(self.toast);
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.status == MutationStatus::Pending {
            state.status = MutationStatus::Idle;
        }
    }
}

pub struct AuthService<A: AuthApi> {
    api: A,
    session: Arc<Session>,
    cache: Arc<QueryCache>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    state: Mutex<MutationState>,
}

impl<A: AuthApi> AuthService<A> {
    pub fn new(
        api: A,
        session: Arc<Session>,
        cache: Arc<QueryCache>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            api,
            session,
            cache,
            notifier,
            navigator,
            state: Mutex::new(MutationState::default()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Submit validated credentials and return the issued token.
    pub async fn login(&self, credentials: ValidCredentials) -> Result<String, AuthError> {
        let in_flight = self.begin()?;

        info!(email = %credentials.email(), "Logging in");
        let request = LoginRequest::from(credentials);

        let result = match self.api.login(&request).await {
            Ok(response) if response.token.is_empty() => Err(AuthError::InvalidResponse(
                "Login response did not include a token".to_string(),
            )),
            Ok(response) => Ok(response),
            Err(e) => Err(AuthError::from(e)),
        };

        match result {
            Ok(response) => {
                self.notifier.dismiss(in_flight.toast);
                self.notifier.success(SUCCESS_MESSAGE);
                self.session.set_token(&response.token);
                self.cache.invalidate(&get_current_user_query_key());
                self.navigator.navigate(LOGIN_DESTINATION);

                info!(user = %response.user.email, role = %response.user.role, "Login successful");
                in_flight.finish(Ok(()));
                Ok(response.token)
            }
            Err(err) => {
                warn!(error = %err, "Login failed");

                self.notifier.dismiss(in_flight.toast);
                self.notifier.error(&format!("Login failed: {}", err));
                in_flight.finish(Err(err.clone()));
                Err(err)
            }
        }
    }

    fn begin(&self) -> Result<InFlight<'_>, AuthError> {
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.status == MutationStatus::Pending {
                debug!("Rejecting login while another is pending");
                return Err(AuthError::InProgress);
            }
            state.status = MutationStatus::Pending;
            state.last_error = None;
        }

        let toast = self.notifier.loading(LOADING_MESSAGE);
        Ok(InFlight {
            state: &self.state,
            notifier: self.notifier.as_ref(),
            toast,
            finished: false,
        })
    }

    /// Forget the session and every cached query, then go back to the root.
    /// Safe to call when already logged out.
    pub fn logout(&self) {
        self.session.clear();
        self.cache.clear();
        self.navigator.navigate(LOGOUT_DESTINATION);
        info!("Logged out");
    }

    /// Current user, from cache when fresh, otherwise fetched and cached.
    pub async fn current_user(&self) -> Result<MeResponse, AuthError> {
        let token = self.session.token().ok_or(AuthError::NotAuthenticated)?;
        let key = get_current_user_query_key();

        match self.cache.get_fresh::<MeResponse>(&key) {
            Ok(Some(cached)) => {
                debug!(age = %cached.age_display(), "Current user served from cache");
                return Ok(cached.data);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Discarding unreadable cached user"),
        }

        let me = self.api.current_user(&token).await?;

        // The session may have changed while the request was out
        if self.session.token().as_deref() != Some(token.as_str()) {
            debug!("Session changed during fetch, not caching current user");
            return Ok(me);
        }
        if let Err(e) = self.cache.set(key, &me) {
            warn!(error = %e, "Failed to cache current user");
        }
        Ok(me)
    }

    pub fn status(&self) -> MutationStatus {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).status
    }

    pub fn is_logging_in(&self) -> bool {
        self.status() == MutationStatus::Pending
    }

    pub fn last_error(&self) -> Option<AuthError> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last_error
            .clone()
    }

    /// Return to `Idle` after a finished login. A pending login is left alone.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.status != MutationStatus::Pending {
            state.status = MutationStatus::Idle;
            state.last_error = None;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
