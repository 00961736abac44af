//! Authentication state and the login / refresh / logout flows.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::TokenStore;
use crate::api::{ApiClient, ApiError};
use crate::models::{LoginCredentials, RefreshTokenResponse, User};
use crate::signal::{Signal, Subscribers, SubscriptionId};

/// Why a session was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    UserRequested,
    LoginFailed,
    RefreshFailed,
    ProfileFailed,
    /// A request was rejected and there was nothing to refresh with.
    Unauthorized,
}

/// Snapshot of the session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub authenticated: bool,
    pub current_user: Option<User>,
}

/// Owns the session state and mediates every change to it.
///
/// Construct once and share behind an `Arc`. State changes are published
/// synchronously to subscribers; logout listeners are where the caller
/// reacts with navigation (e.g. back to a login screen).
pub struct SessionManager {
    api: ApiClient,
    tokens: TokenStore,
    authenticated: Signal<bool>,
    current_user: Signal<Option<User>>,
    logouts: Subscribers<LogoutReason>,
}

impl SessionManager {
    /// A stored, unexpired token makes the new session authenticated. The
    /// user profile stays unknown until `fetch_current_user`.
    pub fn new(api: ApiClient, tokens: TokenStore) -> Self {
        let restored = !tokens.is_expired();
        debug!(restored, "Session initialized");

        Self {
            api,
            tokens,
            authenticated: Signal::new(restored),
            current_user: Signal::new(None),
            logouts: Subscribers::new(),
        }
    }

    pub fn shared(api: ApiClient, tokens: TokenStore) -> Arc<Self> {
        Arc::new(Self::new(api, tokens))
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.get()
    }

    pub fn current_user(&self) -> Option<User> {
        self.current_user.get()
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            authenticated: self.is_authenticated(),
            current_user: self.current_user(),
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.tokens.access_token()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.tokens.refresh_token()
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User, ApiError> {
        match self.api.login(credentials).await {
            Ok(response) => {
                self.tokens.save(
                    &response.access_token,
                    response.refresh_token.as_deref(),
                    response.expires_in,
                    credentials.remember_me.unwrap_or(false),
                );
                self.current_user.set(Some(response.user.clone()));
                self.authenticated.set(true);
                info!(user_id = %response.user.id, "Login successful");
                Ok(response.user)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.logout_with(LogoutReason::LoginFailed);
                Err(e)
            }
        }
    }

    /// Mint a new access token. Without a stored refresh token this fails
    /// and leaves the session alone; a rejected refresh logs out.
    ///
    /// Concurrent calls are not coalesced: each one hits the backend.
    pub async fn refresh(&self) -> Result<RefreshTokenResponse, ApiError> {
        let Some(refresh_token) = self.tokens.refresh_token() else {
            debug!("No refresh token available");
            return Err(ApiError::NoRefreshToken);
        };

        match self.api.refresh(&refresh_token).await {
            Ok(response) => {
                self.tokens
                    .update_access_token(&response.access_token, response.expires_in);
                debug!(expires_in = response.expires_in, "Access token refreshed");
                Ok(response)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                self.logout_with(LogoutReason::RefreshFailed);
                Err(e)
            }
        }
    }

    pub fn logout(&self) {
        self.logout_with(LogoutReason::UserRequested);
    }

    /// Clear tokens and reset state. Safe to call repeatedly.
    pub fn logout_with(&self, reason: LogoutReason) {
        self.tokens.clear();
        self.authenticated.set(false);
        self.current_user.set(None);
        info!(?reason, "Logged out");
        self.logouts.notify(&reason);
    }

    /// Load the profile for the stored token. Any failure logs out.
    pub async fn fetch_current_user(&self) -> Result<User, ApiError> {
        let token = self.tokens.access_token();
        match self.api.current_user(token.as_deref()).await {
            Ok(user) => {
                self.current_user.set(Some(user.clone()));
                self.authenticated.set(true);
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch current user");
                self.logout_with(LogoutReason::ProfileFailed);
                Err(e)
            }
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.current_user
            .get()
            .map(|user| user.has_role(role))
            .unwrap_or(false)
    }

    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        self.current_user
            .get()
            .map(|user| user.has_any_role(roles))
            .unwrap_or(false)
    }

    pub fn subscribe_authenticated<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.authenticated.subscribe(listener)
    }

    pub fn unsubscribe_authenticated(&self, id: SubscriptionId) -> bool {
        self.authenticated.unsubscribe(id)
    }

    pub fn subscribe_user<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Option<User>) + Send + Sync + 'static,
    {
        self.current_user.subscribe(listener)
    }

    pub fn unsubscribe_user(&self, id: SubscriptionId) -> bool {
        self.current_user.unsubscribe(id)
    }

    pub fn on_logout<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&LogoutReason) + Send + Sync + 'static,
    {
        self.logouts.subscribe(listener)
    }

    pub fn unsubscribe_logout(&self, id: SubscriptionId) -> bool {
        self.logouts.unsubscribe(id)
    }
}
