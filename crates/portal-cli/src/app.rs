//! Command handlers wired to the shared session services.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use portal_core::auth::{auth_guard, public_guard, GuardOutcome, LogoutReason};
use portal_core::models::LoginCredentials;
use portal_core::{ApiClient, AuthInterceptor, Config, ConfigService, SessionManager};

/// Maximum length for email input.
const MAX_EMAIL_LENGTH: usize = 254;

pub struct App {
    config: Config,
    session: Arc<SessionManager>,
    http: AuthInterceptor,
}

impl App {
    pub fn new(api_url: Option<String>) -> Result<Self> {
        let config = Config::load()?.with_overrides(api_url, None);
        debug!(
            api_base_url = %config.api_base_url,
            storage = ?config.token_storage,
            "Config loaded"
        );

        let tokens = config.token_store()?;
        let api = ApiClient::with_timeout(
            config.api_base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
        .context("Failed to create HTTP client")?;

        let session = SessionManager::shared(api, tokens);
        session.on_logout(|reason| {
            if let Some(notice) = logout_notice(*reason) {
                eprintln!("{}", notice);
            }
        });
        let http = AuthInterceptor::new(Arc::clone(&session));

        Ok(Self {
            config,
            session,
            http,
        })
    }

    pub async fn login(&self, email: Option<String>, remember: bool) -> Result<()> {
        if let GuardOutcome::Redirect(_) = public_guard(&self.session) {
            println!("Already signed in. Run `portal logout` first to switch accounts.");
            return Ok(());
        }

        let email = match email.or_else(|| self.config.last_email.clone()) {
            Some(email) => email,
            None => prompt("Email: ")?,
        };
        if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
            bail!("Invalid email address");
        }
        let password = rpassword::prompt_password(format!("Password for {}: ", email))
            .context("Failed to read password")?;

        let credentials = LoginCredentials::new(email.clone(), password).remember(remember);
        let user = self.session.login(&credentials).await?;
        println!("Signed in as {} <{}>", user.display_name(), user.email);

        if self.config.last_email.as_deref() != Some(email.as_str()) {
            let mut config = self.config.clone();
            config.last_email = Some(email);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to remember email");
            }
        }
        Ok(())
    }

    pub fn logout(&self) {
        self.session.logout();
        println!("Signed out.");
    }

    pub fn status(&self) {
        let tokens = self.session.tokens();
        let Some(record) = tokens.read() else {
            println!("Not signed in.");
            return;
        };

        let state = if record.is_expired_at(tokens.now()) {
            "expired"
        } else {
            "active"
        };
        let tier = if record.persistent {
            "remembered"
        } else {
            "this session only"
        };
        println!("Session:       {}", state);
        println!("Expires:       {}", record.expires_at.to_rfc3339());
        println!("Stored:        {}", tier);
        let refreshable = record.refresh_token.as_ref().map_or("no", |_| "yes");
        println!("Refreshable:   {}", refreshable);
        println!("API:           {}", self.config.api_base_url);
    }

    pub async fn whoami(&self) -> Result<()> {
        self.require_session()?;

        let user = self.session.fetch_current_user().await?;
        println!("{} <{}>", user.display_name(), user.email);
        println!("id:    {}", user.id);
        if let Some(role) = &user.role {
            println!("role:  {}", role);
        }
        if !user.is_active {
            println!("(account inactive)");
        }
        Ok(())
    }

    pub async fn refresh(&self) -> Result<()> {
        if self.session.refresh_token().is_none() {
            bail!("No refresh token stored. Run `portal login` to sign in.");
        }
        let response = self.session.refresh().await?;
        println!("Access token refreshed; valid for {}s.", response.expires_in);
        Ok(())
    }

    pub async fn get(&self, path: &str) -> Result<()> {
        let value: Value = self.http.get_json(path).await?;
        println!("{}", serde_json::to_string_pretty(&value)?);
        Ok(())
    }

    /// Never fails: the service falls back to built-in defaults.
    pub async fn show_config(&self, app_id: Option<String>) {
        let app_id = app_id.unwrap_or_else(|| self.config.app_id.clone());
        let service = ConfigService::new(self.http.clone());
        let config = service.load(&app_id).await;

        let visible = service.visible_nav_items(self.session.current_user().as_ref());
        println!("{} ({})", config.app_name, config.app_id);
        println!(
            "theme:     {:?} / {:?} / {}",
            config.theme.mode, config.theme.layout, config.theme.primary_color
        );
        println!("page size: {}", config.page_size);
        println!("navigation:");
        for item in &visible {
            println!("  {:<12} {}", item.id, item.route.as_deref().unwrap_or("-"));
        }
        let mut flags: Vec<_> = config.feature_flags.iter().collect();
        flags.sort();
        for (name, enabled) in flags {
            println!("flag {}: {}", name, if *enabled { "on" } else { "off" });
        }
    }

    fn require_session(&self) -> Result<()> {
        match auth_guard::<&str>(&self.session, &[]) {
            GuardOutcome::Allow => Ok(()),
            _ => bail!("Not signed in. Run `portal login` first."),
        }
    }
}

/// Message for a session that ended without the user asking. A failed
/// login already reports its own error.
fn logout_notice(reason: LogoutReason) -> Option<String> {
    match reason {
        LogoutReason::UserRequested | LogoutReason::LoginFailed => None,
        other => Some(format!(
            "Session ended ({:?}). Run `portal login` to sign in again.",
            other
        )),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line).context("Failed to read input")?;
    Ok(line.trim().to_string())
}
