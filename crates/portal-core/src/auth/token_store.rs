//! Persistence of the single access/refresh token record.
//!
//! The record lives in one of two storage tiers: durable ("remember me") or
//! ephemeral (this run only). Lookups walk the tiers in priority order,
//! durable first. Nothing here returns an error: unreadable, unwritable or
//! corrupt storage degrades to "no token" and is logged.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::storage::{MemoryStorage, StorageBackend};
use crate::clock::{Clock, SystemClock};
use crate::models::TokenRecord;

/// Fixed key the record is stored under in every tier.
pub const TOKEN_KEY: &str = "auth_tokens";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Durable,
    Ephemeral,
}

impl Tier {
    pub fn for_persistent(persistent: bool) -> Self {
        if persistent {
            Tier::Durable
        } else {
            Tier::Ephemeral
        }
    }
}

pub struct TokenStore {
    /// Checked in order on every lookup.
    tiers: Vec<(Tier, Box<dyn StorageBackend>)>,
    clock: Arc<dyn Clock>,
}

impl TokenStore {
    pub fn new(durable: Box<dyn StorageBackend>, ephemeral: Box<dyn StorageBackend>) -> Self {
        Self {
            tiers: vec![(Tier::Durable, durable), (Tier::Ephemeral, ephemeral)],
            clock: Arc::new(SystemClock),
        }
    }

    /// Both tiers in memory; nothing survives the process.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()), Box::new(MemoryStorage::new()))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Store a fresh record, replacing whatever was stored before in either tier.
    pub fn save(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_in_secs: i64,
        persistent: bool,
    ) {
        let record = TokenRecord {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.map(str::to_string),
            expires_at: self.expiry_from_now(expires_in_secs),
            persistent,
        };

        let target = Tier::for_persistent(persistent);
        self.write(target, &record);

        // Only one record may be active
        for (tier, backend) in &self.tiers {
            if *tier != target {
                Self::remove(backend.as_ref());
            }
        }

        debug!(tier = ?target, expires_at = %record.expires_at, "Token record saved");
    }

    /// First record that parses, durable tier first.
    pub fn read(&self) -> Option<TokenRecord> {
        self.tiers
            .iter()
            .find_map(|(tier, backend)| Self::read_tier(*tier, backend.as_ref()))
    }

    /// The access token while it is still valid. An expired record is wiped
    /// from every tier.
    pub fn access_token(&self) -> Option<String> {
        let record = self.read()?;
        if record.is_expired_at(self.now()) {
            debug!(expires_at = %record.expires_at, "Access token expired, clearing tokens");
            self.clear();
            return None;
        }
        Some(record.access_token)
    }

    /// Refresh tokens are returned without an expiry check.
    pub fn refresh_token(&self) -> Option<String> {
        self.read().and_then(|record| record.refresh_token)
    }

    /// True when there is no record or it has expired. Never evicts.
    pub fn is_expired(&self) -> bool {
        match self.read() {
            Some(record) => record.is_expired_at(self.now()),
            None => true,
        }
    }

    /// Swap in a new access token, keeping the refresh token and tier.
    pub fn update_access_token(&self, access_token: &str, expires_in_secs: i64) {
        let Some(mut record) = self.read() else {
            debug!("No token record to update");
            return;
        };

        record.access_token = access_token.to_string();
        record.expires_at = self.expiry_from_now(expires_in_secs);
        self.write(Tier::for_persistent(record.persistent), &record);
    }

    pub fn clear(&self) {
        for (_, backend) in &self.tiers {
            Self::remove(backend.as_ref());
        }
    }

    /// Negative lifetimes expire immediately; lifetimes past the end of the
    /// representable range saturate at `latest_expiry()`.
    fn expiry_from_now(&self, expires_in_secs: i64) -> DateTime<Utc> {
        let millis = self
            .now()
            .timestamp_millis()
            .saturating_add(expires_in_secs.max(0).saturating_mul(1000))
            .min(DateTime::<Utc>::MAX_UTC.timestamp_millis());
        // Stored with millisecond precision, so compute it that way too
        DateTime::from_timestamp_millis(millis).unwrap_or_else(latest_expiry)
    }

    fn backend(&self, tier: Tier) -> Option<&dyn StorageBackend> {
        self.tiers
            .iter()
            .find(|(t, _)| *t == tier)
            .map(|(_, backend)| backend.as_ref())
    }

    fn write(&self, tier: Tier, record: &TokenRecord) {
        let Some(backend) = self.backend(tier) else {
            return;
        };
        let contents = match serde_json::to_string(record) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(error = %e, "Failed to serialize token record");
                return;
            }
        };
        if let Err(e) = backend.set_item(TOKEN_KEY, &contents) {
            warn!(backend = backend.name(), error = %e, "Failed to write token record");
        }
    }

    fn remove(backend: &dyn StorageBackend) {
        if let Err(e) = backend.remove_item(TOKEN_KEY) {
            warn!(backend = backend.name(), error = %e, "Failed to remove token record");
        }
    }

    fn read_tier(tier: Tier, backend: &dyn StorageBackend) -> Option<TokenRecord> {
        let contents = match backend.get_item(TOKEN_KEY) {
            Ok(Some(contents)) => contents,
            Ok(None) => return None,
            Err(e) => {
                warn!(backend = backend.name(), error = %e, "Failed to read token record");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(?tier, error = %e, "Ignoring corrupt token record");
                None
            }
        }
    }
}

/// Latest expiry a record can hold, truncated to whole milliseconds so it
/// survives the stored format unchanged.
pub fn latest_expiry() -> DateTime<Utc> {
    let max = DateTime::<Utc>::MAX_UTC;
    DateTime::from_timestamp_millis(max.timestamp_millis()).unwrap_or(max)
}
