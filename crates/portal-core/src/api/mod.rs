//! HTTP data-access layer for the portal backend.
//!
//! This module provides the `ApiClient` for the identity endpoints
//! (login, refresh, current user) and the `AuthInterceptor` that every
//! application request goes through to pick up a bearer token and recover
//! from an expired one.

pub mod client;
pub mod error;
pub mod interceptor;

pub use client::ApiClient;
pub use error::ApiError;
pub use interceptor::{bypasses_auth, AuthInterceptor};
