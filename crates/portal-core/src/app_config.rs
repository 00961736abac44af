//! Remote application configuration (branding, theme, navigation, flags).
//!
//! Loaded once at start-up through the auth interceptor. Loading never
//! fails: if the backend is unreachable or returns garbage the built-in
//! defaults for the app are published instead, so the app can still start.

use reqwest::Method;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError, AuthInterceptor};
use crate::models::{visible_navigation, AppConfig, NavItem, ThemeConfig, ThemePatch, User};
use crate::signal::{Signal, SubscriptionId};

pub const CONFIG_PATH: &str = "/api/config";

pub struct ConfigService {
    http: AuthInterceptor,
    config: Signal<Option<AppConfig>>,
    loading: Signal<bool>,
}

impl ConfigService {
    pub fn new(http: AuthInterceptor) -> Self {
        Self {
            http,
            config: Signal::new(None),
            loading: Signal::new(false),
        }
    }

    pub async fn load(&self, app_id: &str) -> AppConfig {
        self.loading.set(true);

        let config = match self.fetch(app_id).await {
            Ok(config) => {
                info!(app_id, "Configuration loaded");
                config
            }
            Err(e) => {
                warn!(app_id, error = %e, "Failed to load configuration, using defaults");
                AppConfig::fallback(app_id)
            }
        };

        self.config.set(Some(config.clone()));
        self.loading.set(false);
        config
    }

    async fn fetch(&self, app_id: &str) -> Result<AppConfig, ApiError> {
        let request = self
            .http
            .request(Method::GET, CONFIG_PATH)
            .query(&[("app", app_id)]);
        let response = self.http.send(request).await?;
        ApiClient::parse_json(response).await
    }

    pub fn config(&self) -> Option<AppConfig> {
        self.config.get()
    }

    pub fn theme(&self) -> Option<ThemeConfig> {
        self.config.get().map(|c| c.theme)
    }

    pub fn nav_items(&self) -> Vec<NavItem> {
        self.config.get().map(|c| c.navigation).unwrap_or_default()
    }

    pub fn visible_nav_items(&self, user: Option<&User>) -> Vec<NavItem> {
        visible_navigation(&self.nav_items(), user)
    }

    pub fn page_size(&self) -> Option<u32> {
        self.config.get().map(|c| c.page_size)
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn is_feature_enabled(&self, name: &str) -> bool {
        self.config
            .get()
            .map(|c| c.is_feature_enabled(name))
            .unwrap_or(false)
    }

    /// Merge `patch` into the current theme. Does nothing before `load`.
    pub fn update_theme(&self, patch: ThemePatch) {
        if self.config.get().is_none() {
            return;
        }
        self.config.update(|config| {
            if let Some(config) = config.as_mut() {
                config.theme.apply(patch);
            }
        });
    }

    pub fn subscribe_config<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Option<AppConfig>) + Send + Sync + 'static,
    {
        self.config.subscribe(listener)
    }

    pub fn subscribe_loading<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.loading.subscribe(listener)
    }
}
