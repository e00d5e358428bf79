//! Core library for portal.
//!
//! This crate contains everything the front-end needs that is not rendering:
//! - `config`: environment resolution and persisted preferences
//! - `api`: typed client for the backend auth endpoints
//! - `auth`: credential validation, session token, authentication service
//! - `cache`: process-wide query cache with invalidation
//! - `notify`: notification surface (toasts)
//! - `router`: route model and navigation
//! - `shell`: application wiring, constructed once at startup

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod notify;
pub mod router;
pub mod shell;

pub use config::{AppConfig, ConfigError, Locale};
pub use shell::{Shell, SubmitError};
