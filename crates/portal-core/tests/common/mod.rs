// Not every test binary uses every helper
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use portal_core::auth::{LogoutReason, MemoryStorage, SessionManager, TokenStore};
use portal_core::{ApiClient, AuthInterceptor};
use serde_json::{json, Value};
use wiremock::MockServer;

pub struct Harness {
    pub session: Arc<SessionManager>,
    pub http: AuthInterceptor,
    pub durable: Arc<MemoryStorage>,
    pub ephemeral: Arc<MemoryStorage>,
    pub logouts: Arc<Mutex<Vec<LogoutReason>>>,
}

impl Harness {
    /// A session pointed at `server`, optionally starting from a stored token.
    pub fn new(server: &MockServer, seed: Option<(&str, Option<&str>)>) -> Self {
        let durable = Arc::new(MemoryStorage::new());
        let ephemeral = Arc::new(MemoryStorage::new());
        let tokens = TokenStore::new(
            Box::new(Arc::clone(&durable)),
            Box::new(Arc::clone(&ephemeral)),
        );
        if let Some((access, refresh)) = seed {
            tokens.save(access, refresh, 3600, true);
        }

        let api = ApiClient::new(server.uri()).expect("Failed to build API client");
        let session = SessionManager::shared(api, tokens);
        let http = AuthInterceptor::new(Arc::clone(&session));

        let logouts = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&logouts);
        session.on_logout(move |reason| seen.lock().unwrap().push(*reason));

        Self {
            session,
            http,
            durable,
            ephemeral,
            logouts,
        }
    }

    pub fn logout_reasons(&self) -> Vec<LogoutReason> {
        self.logouts.lock().unwrap().clone()
    }
}

pub fn user_json(id: &str, role: &str) -> Value {
    json!({
        "id": id,
        "email": format!("{}@example.com", id),
        "firstName": "Test",
        "lastName": "User",
        "role": role,
        "isActive": true
    })
}

/// Authorization header values of every request the server saw for `path`.
pub async fn auth_headers_for(server: &MockServer, path: &str) -> Vec<Option<String>> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == path)
        .map(|r| {
            r.headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .collect()
}
