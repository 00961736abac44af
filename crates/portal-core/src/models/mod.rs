//! Data models shared by the portal applications.
//!
//! - `User`: identity profile returned by the auth backend
//! - Auth payloads: `LoginCredentials`, `LoginResponse`, `RefreshTokenResponse`
//! - `TokenRecord`: the persisted access/refresh token pair
//! - App configuration: `AppConfig`, `ThemeConfig`, `NavItem`

pub mod auth;
pub mod config;
pub mod user;

pub use auth::{LoginCredentials, LoginResponse, RefreshRequest, RefreshTokenResponse, TokenRecord};
pub use config::{
    visible_navigation, AppConfig, ContentWidth, NavItem, ThemeConfig, ThemeLayout, ThemeMode,
    ThemePatch,
};
pub use user::User;
