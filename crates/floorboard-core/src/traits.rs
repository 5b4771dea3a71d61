//! Core traits for Floorboard
//!
//! These traits are the seams to the two managed services Floorboard is a
//! client of. Production code binds them to the hosted document store and
//! identity provider; tests bind them to [`crate::MemoryBackend`] or to
//! purpose-built mocks.
//!
//! ## Key Traits
//!
//! - [`MessageStore`]: the message collection
//! - [`ProfileStore`]: the resident profile collection
//! - [`SettingsStore`]: building-wide settings
//! - [`IdentityProvider`]: authentication
//! - [`Clock`]: time abstraction for testability

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{ProviderError, StoreError};
use crate::message::{FloorQuery, Message, MessageId, NewMessage};
use crate::principal::{Principal, PrincipalId, Profile};
use crate::subscription::Subscription;

/// The message collection of the document store
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Open a standing query for one floor.
    ///
    /// The returned subscription first delivers the full matching set and
    /// then a new full set after every change, until cancelled. Failure to
    /// establish the query is reported as an error event, not as a return
    /// value. `capacity` bounds undelivered snapshots.
    fn subscribe(&self, query: FloorQuery, capacity: usize) -> Subscription<Vec<Message>>;

    /// Insert a single message; the store assigns id and timestamp.
    async fn insert(&self, message: NewMessage) -> Result<MessageId, StoreError>;

    /// Fetch one message by id.
    async fn get_by_id(&self, id: &MessageId) -> Result<Option<Message>, StoreError>;
}

/// The resident profile collection
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a resident's profile by principal id.
    async fn profile(&self, id: &PrincipalId) -> Result<Option<Profile>, StoreError>;

    /// One-shot query for profiles whose lowercased username equals `username_lower`.
    async fn find_by_username(&self, username_lower: &str) -> Result<Vec<Profile>, StoreError>;

    /// Create or replace a profile.
    async fn put_profile(&self, profile: Profile) -> Result<(), StoreError>;

    /// Remove a profile. Removing a missing profile is not an error.
    async fn delete_profile(&self, id: &PrincipalId) -> Result<(), StoreError>;
}

/// Building-wide settings documents
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// The shared building passcode, if one has been configured.
    async fn building_passcode(&self) -> Result<Option<String>, StoreError>;
}

/// The external identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in principal, if any.
    fn current_principal(&self) -> Option<Principal>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, ProviderError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Principal, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Send an address-verification email to `principal`.
    async fn send_verification(&self, principal: &Principal) -> Result<(), ProviderError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError>;

    /// Change the current principal's password.
    async fn update_password(&self, new_password: &str) -> Result<(), ProviderError>;

    /// Delete the current principal and sign out.
    async fn delete_current(&self) -> Result<(), ProviderError>;
}

/// Time abstraction for testability
pub trait Clock: Send + Sync {
    /// Get the current UTC datetime
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Real clock implementation using system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: parking_lot::Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: parking_lot::Mutex::new(start),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now_utc(), start);

        clock.advance(chrono::Duration::minutes(5));
        assert_eq!(clock.now_utc(), start + chrono::Duration::minutes(5));
    }
}
