//! Authentication module for credentials, the session token and login.
//!
//! This module provides:
//! - `credentials`: login form validation producing `ValidCredentials`
//! - `Session`: owner of the session token stored under `"authToken"`
//! - `AuthService`: login/logout orchestration over an `AuthApi`
//!
//! The token lives in process-scoped storage and has no expiry handling.

pub mod credentials;
pub mod service;
pub mod session;

pub use credentials::{validate, Field, FieldErrors, LoginCredentials, ValidCredentials};
pub use service::{AuthError, AuthService, MutationStatus};
pub use session::{KeyValueStorage, MemoryStorage, Session, TOKEN_KEY};
