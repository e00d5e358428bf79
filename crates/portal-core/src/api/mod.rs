//! REST API client module for the backend auth endpoints.
//!
//! This module provides the `ApiClient` and the `AuthApi` trait it
//! implements. The request and response types mirror the backend's
//! OpenAPI contract for login and current-user lookups.
//!
//! Authenticated requests carry the session token as a bearer token.

pub mod client;
pub mod error;
pub mod types;

pub use client::{get_current_user_query_key, ApiClient, AuthApi};
pub use error::ApiError;
pub use types::{AuthResponse, ErrorBody, LoginRequest, MeResponse, UserData};
