//! Shared client core for the portal applications.
//!
//! - `auth`: token storage, session state, route guards
//! - `api`: identity API client and the bearer-token interceptor
//! - `app_config`: remote application configuration with defaults
//! - `config`: local client configuration
//! - `models`: wire types
//! - `signal`: observable values with synchronous delivery

pub mod api;
pub mod app_config;
pub mod auth;
pub mod clock;
pub mod config;
pub mod models;
pub mod signal;

pub use api::{ApiClient, ApiError, AuthInterceptor};
pub use app_config::ConfigService;
pub use auth::{LogoutReason, SessionManager, SessionState, TokenStore};
pub use config::Config;
