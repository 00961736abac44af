//! Authentication module for managing user sessions and tokens.
//!
//! This module provides:
//! - `TokenStore`: persistence of the access/refresh token record across a
//!   durable and an ephemeral storage tier, with lazy expiry
//! - Storage backends: `MemoryStorage`, `FileStorage`, `KeyringStorage`
//! - `SessionManager`: login, refresh, logout and the observable session state
//! - Guards: route decisions derived from the session

pub mod guard;
pub mod session;
pub mod storage;
pub mod token_store;

pub use guard::{auth_guard, public_guard, GuardOutcome};
pub use session::{LogoutReason, SessionManager, SessionState};
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, StorageBackend};
pub use token_store::{Tier, TokenStore, TOKEN_KEY};
