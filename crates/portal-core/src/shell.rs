//! Application shell.
//!
//! `Shell` is built once at startup and owns the shared instances every
//! component works with: the query cache, the session, the toaster, and the
//! router. There is no teardown; the shell lives until the process exits.

use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info};

use crate::api::{ApiClient, AuthApi, MeResponse};
use crate::auth::{validate, AuthError, AuthService, FieldErrors, LoginCredentials, Session};
use crate::cache::QueryCache;
use crate::config::AppConfig;
use crate::notify::Toaster;
use crate::router::{Route, Router};

/// Why a login form submission did not produce a token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Rejected before any request was sent.
    #[error("{0}")]
    Invalid(FieldErrors),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

pub struct Shell<A: AuthApi = ApiClient> {
    config: AppConfig,
    cache: Arc<QueryCache>,
    session: Arc<Session>,
    toaster: Arc<Toaster>,
    router: Arc<Router>,
    auth: AuthService<A>,
}

impl Shell<ApiClient> {
    /// Build the shell around the real HTTP client.
    pub fn new(config: AppConfig) -> Result<Self> {
        let api = ApiClient::new(config.base_url.clone()).context("Failed to create API client")?;
        Ok(Self::with_api(config, api))
    }
}

impl<A: AuthApi> Shell<A> {
    pub fn with_api(config: AppConfig, api: A) -> Self {
        let cache = Arc::new(QueryCache::new());
        let session = Arc::new(Session::in_memory());
        let toaster = Arc::new(Toaster::new());
        let router = Arc::new(Router::new(Route::Root));

        let auth = AuthService::new(
            api,
            session.clone(),
            cache.clone(),
            toaster.clone(),
            router.clone(),
        );

        info!(
            environment = %config.environment,
            base_url = %config.base_url,
            locale = %config.locale,
            "Shell initialized"
        );

        Self {
            config,
            cache,
            session,
            toaster,
            router,
            auth,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn toaster(&self) -> &Arc<Toaster> {
        &self.toaster
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn auth(&self) -> &AuthService<A> {
        &self.auth
    }

    /// Validate a login form and, if it passes, log in.
    pub async fn submit_login(&self, form: &LoginCredentials) -> Result<String, SubmitError> {
        let credentials = validate(form, self.config.locale).map_err(|errors| {
            debug!(fields = errors.len(), "Login form rejected");
            SubmitError::Invalid(errors)
        })?;
        Ok(self.auth.login(credentials).await?)
    }

    pub fn logout(&self) {
        self.auth.logout();
    }

    pub async fn current_user(&self) -> Result<MeResponse, AuthError> {
        self.auth.current_user().await
    }

    /// Navigate through the session guard; returns the route entered.
    pub fn go(&self, to: Route) -> Route {
        self.router.visit(to, &self.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Field, TOKEN_KEY};
    use crate::api::get_current_user_query_key;
    use crate::config::Locale;
    use crate::notify::ToastKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> AppConfig {
        AppConfig {
            base_url: base_url.to_string(),
            environment: "test".to_string(),
            locale: Locale::En,
        }
    }

    fn auth_body(token: &str) -> serde_json::Value {
        serde_json::json!({
            "token": token,
            "user": {
                "id": "1",
                "name": "User",
                "email": "user@example.com",
                "role": "user",
                "is_active": true
            }
        })
    }

    #[tokio::test]
    async fn test_login_scenario_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("abc123")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "user_id": "1",
                "email": "user@example.com",
                "role": "user"
            })))
            .mount(&server)
            .await;

        let shell = Shell::new(config(&server.uri())).unwrap();
        shell
            .cache()
            .set(get_current_user_query_key(), &MeResponse::default())
            .unwrap();

        let form = LoginCredentials::new("user@example.com", "secret1");
        let token = shell.submit_login(&form).await.unwrap();

        assert_eq!(token, "abc123");
        assert_eq!(shell.session().token().as_deref(), Some("abc123"));
        assert!(shell.cache().is_stale(&get_current_user_query_key()));
        assert_eq!(shell.router().current(), Route::Dashboard);

        let me = shell.current_user().await.unwrap();
        assert_eq!(me.email.as_deref(), Some("user@example.com"));
        assert!(!shell.cache().is_stale(&get_current_user_query_key()));
    }

    #[tokio::test]
    async fn test_invalid_email_never_sends_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("abc123")))
            .expect(0)
            .mount(&server)
            .await;

        let shell = Shell::new(config(&server.uri())).unwrap();
        let form = LoginCredentials::new("not-an-email", "secret1");

        match shell.submit_login(&form).await {
            Err(SubmitError::Invalid(errors)) => {
                assert_eq!(errors.get(Field::Email), Some("invalid email"));
                assert_eq!(errors.get(Field::Password), None);
            }
            other => panic!("expected field errors, got {:?}", other),
        }
        assert!(shell.toaster().active().is_empty());
        assert_eq!(shell.router().current(), Route::Root);
    }

    #[tokio::test]
    async fn test_login_scenario_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({ "message": "Invalid credentials" })),
            )
            .mount(&server)
            .await;

        let shell = Shell::new(config(&server.uri())).unwrap();
        let form = LoginCredentials::new("user@example.com", "secret1");
        let err = shell.submit_login(&form).await.unwrap_err();

        assert!(matches!(err, SubmitError::Auth(AuthError::Server { status: 401, .. })));
        let toasts = shell.toaster().drain();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].kind, ToastKind::Error);
        assert_eq!(toasts[0].message, "Login failed: Invalid credentials");
        assert!(shell.session().token().is_none());
    }

    #[tokio::test]
    async fn test_network_failure_uses_transport_message() {
        let shell = Shell::new(config("http://127.0.0.1:9")).unwrap();
        let form = LoginCredentials::new("user@example.com", "secret1");

        let text = match shell.submit_login(&form).await {
            Err(SubmitError::Auth(AuthError::Network(text))) => text,
            other => panic!("expected network error, got {:?}", other),
        };

        let toasts = shell.toaster().drain();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].message, format!("Login failed: {}", text));
    }

    #[tokio::test]
    async fn test_logout_scenario() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("abc123")))
            .mount(&server)
            .await;

        let shell = Shell::new(config(&server.uri())).unwrap();
        shell
            .submit_login(&LoginCredentials::new("user@example.com", "secret1"))
            .await
            .unwrap();
        shell
            .cache()
            .set(get_current_user_query_key(), &MeResponse::default())
            .unwrap();

        shell.logout();
        assert!(shell.session().token().is_none());
        assert!(shell.cache().is_empty());
        assert_eq!(shell.router().current(), Route::Root);

        // Second logout ends in the same state without error
        shell.logout();
        assert!(shell.session().token().is_none());
        assert!(shell.cache().is_empty());
        assert_eq!(shell.router().current(), Route::Root);
    }

    #[tokio::test]
    async fn test_go_respects_session_guard() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("abc123")))
            .mount(&server)
            .await;

        let shell = Shell::new(config(&server.uri())).unwrap();
        assert_eq!(shell.go(Route::Dashboard), Route::Root);

        shell
            .submit_login(&LoginCredentials::new("user@example.com", "secret1"))
            .await
            .unwrap();
        assert_eq!(shell.go(Route::Cek), Route::Cek);
        assert_eq!(shell.go(Route::Dashboard), Route::Dashboard);
        assert_eq!(TOKEN_KEY, "authToken");
    }
}
