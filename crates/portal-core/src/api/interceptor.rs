//! Bearer-token attachment with a single refresh-and-retry on 401.
//!
//! Every application request goes through `AuthInterceptor::execute`:
//!
//! 1. Auth endpoints (login, refresh, register) are sent untouched.
//! 2. Otherwise the current access token, if any, is attached as
//!    `Authorization: Bearer <token>`.
//! 3. A 401 with a stored refresh token triggers `SessionManager::refresh`
//!    and the original request is replayed once with the token current
//!    after the refresh. A 401 on the replay is returned as-is.
//! 4. A 401 with nothing to refresh with logs out and returns the 401.
//! 5. A 403 is returned without touching the session.

use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::{ApiClient, ApiError};
use crate::auth::{LogoutReason, SessionManager};

/// URL fragments that never carry a bearer token or trigger a refresh.
const BYPASS_PATHS: [&str; 3] = ["/auth/login", "/auth/refresh", "/auth/register"];

pub fn bypasses_auth(url: &str) -> bool {
    BYPASS_PATHS.iter().any(|fragment| url.contains(fragment))
}

/// Clone is cheap - shares the connection pool and the session.
#[derive(Clone)]
pub struct AuthInterceptor {
    api: ApiClient,
    session: Arc<SessionManager>,
}

impl AuthInterceptor {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            api: session.api().clone(),
            session,
        }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Start a request against `path`, resolved on the base URL.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.api.http().request(method, self.api.url(path))
    }

    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let request = builder.build()?;
        self.execute(request).await
    }

    pub async fn execute(&self, request: Request) -> Result<Response, ApiError> {
        if bypasses_auth(request.url().as_str()) {
            return self.dispatch(request).await;
        }

        // Taken before any header is attached so a replay starts clean
        let replay = request.try_clone();

        let mut request = request;
        if let Some(token) = self.session.access_token() {
            Self::attach_bearer(&mut request, &token)?;
        }

        let url = request.url().to_string();
        let error = match self.dispatch(request).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };

        match error {
            ApiError::Unauthorized(_) => self.recover(replay, error, &url).await,
            ApiError::AccessDenied(_) => {
                warn!(url = %url, "Access forbidden");
                Err(error)
            }
            _ => Err(error),
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::GET, path)).await?;
        ApiClient::parse_json(response).await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::POST, path).json(body)).await?;
        ApiClient::parse_json(response).await
    }

    /// Refresh, then replay once. The original 401 is what callers see when
    /// recovery is impossible.
    async fn recover(
        &self,
        replay: Option<Request>,
        original: ApiError,
        url: &str,
    ) -> Result<Response, ApiError> {
        if self.session.refresh_token().is_none() {
            debug!(url = %url, "Unauthorized with no refresh token, logging out");
            self.session.logout_with(LogoutReason::Unauthorized);
            return Err(original);
        }

        match self.session.refresh().await {
            Ok(_) => {}
            // The token vanished between the check and the refresh
            Err(ApiError::NoRefreshToken) => {
                self.session.logout_with(LogoutReason::Unauthorized);
                return Err(original);
            }
            // Already logged out by the session
            Err(e) => {
                debug!(url = %url, error = %e, "Refresh failed, returning original error");
                return Err(original);
            }
        }

        let Some(mut retry) = replay else {
            warn!(url = %url, "Request body cannot be replayed after refresh");
            return Err(original);
        };

        // Read now, not before the refresh, so the replay carries the new token
        if let Some(token) = self.session.access_token() {
            Self::attach_bearer(&mut retry, &token)?;
        }

        debug!(url = %url, "Retrying request after token refresh");
        self.dispatch(retry).await
    }

    async fn dispatch(&self, request: Request) -> Result<Response, ApiError> {
        let response = self.api.http().execute(request).await?;
        ApiClient::check_response(response).await
    }

    fn attach_bearer(request: &mut Request, token: &str) -> Result<(), ApiError> {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid access token header: {}", e)))?;
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bypasses_auth() {
        assert!(bypasses_auth("https://portal.example.com/api/auth/login"));
        assert!(bypasses_auth("https://portal.example.com/api/auth/refresh"));
        assert!(bypasses_auth("https://portal.example.com/api/auth/register?invite=1"));

        assert!(!bypasses_auth("https://portal.example.com/api/auth/me"));
        assert!(!bypasses_auth("https://portal.example.com/api/users"));
        assert!(!bypasses_auth("https://portal.example.com/api/auth/logout"));
    }

    #[test]
    fn test_attach_bearer_replaces_existing_header() {
        let client = reqwest::Client::new();
        let mut request = client
            .get("https://portal.example.com/api/users")
            .bearer_auth("stale")
            .build()
            .unwrap();

        AuthInterceptor::attach_bearer(&mut request, "A2").unwrap();

        let values: Vec<_> = request.headers().get_all(AUTHORIZATION).iter().collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0], "Bearer A2");
    }

    #[test]
    fn test_attach_bearer_rejects_invalid_token() {
        let client = reqwest::Client::new();
        let mut request = client.get("https://portal.example.com/").build().unwrap();
        let result = AuthInterceptor::attach_bearer(&mut request, "bad\ntoken");
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }
}
