//! In-memory backend for testing and local sessions
//!
//! Implements every backend trait against process-local state so the client
//! layer can be exercised without the hosted services. Live subscriptions are
//! served by background tasks that re-query on every change, so a tokio
//! runtime must be running when [`MessageStore::subscribe`] is called.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use floorboard_core::{Floor, FloorQuery, MemoryBackend, MessageStore, NewMessage};
//!
//! let backend = MemoryBackend::new();
//! let alice = backend.add_resident("alice@tower.example", "hunter22", Some("Alice"), true);
//!
//! let mut sub = backend.subscribe(FloorQuery::newest_first(Floor::new(3)), 16);
//! backend.insert(NewMessage::new(Floor::new(3), "Hi!", &alice)).await?;
//! ```
//!
//! Failures can be injected with [`MemoryBackend::set_subscriptions_failing`],
//! [`MemoryBackend::set_writes_failing`] and
//! [`MemoryBackend::interrupt_subscriptions`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Duration;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::error::{ProviderError, StoreError, SubscriptionError};
use crate::floor::Floor;
use crate::message::{FloorQuery, Message, MessageId, NewMessage, Order};
use crate::principal::{Principal, PrincipalId, Profile};
use crate::subscription::{self, SnapshotSink, Subscription};
use crate::traits::{Clock, IdentityProvider, MessageStore, ProfileStore, SettingsStore, SystemClock};

/// Minimum password length accepted on sign-up and password change
pub const MIN_PASSWORD_LEN: usize = 6;

/// Change notifications fanned out to live subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Inserted(Floor),
    Outage,
}

#[derive(Debug, Clone)]
struct Account {
    principal: Principal,
    password: String,
}

struct Inner {
    clock: Arc<dyn Clock>,
    /// Messages in insertion order
    messages: RwLock<Vec<Message>>,
    changes: broadcast::Sender<Change>,
    profiles: DashMap<PrincipalId, Profile>,
    /// Accounts keyed by lowercased email
    accounts: DashMap<String, Account>,
    current: RwLock<Option<String>>,
    passcode: RwLock<Option<String>>,
    subscriptions_failing: AtomicBool,
    writes_failing: AtomicBool,
    profiles_failing: AtomicBool,
    insert_calls: AtomicUsize,
    next_id: AtomicU64,
    verification_outbox: Mutex<Vec<String>>,
    reset_outbox: Mutex<Vec<String>>,
}

/// Process-local stand-in for the hosted document store and identity provider.
///
/// Cloning shares state.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("messages", &self.inner.messages.read().len())
            .field("accounts", &self.inner.accounts.len())
            .finish_non_exhaustive()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty backend using the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty backend that stamps messages from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let (changes, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(Inner {
                clock,
                messages: RwLock::new(Vec::new()),
                changes,
                profiles: DashMap::new(),
                accounts: DashMap::new(),
                current: RwLock::new(None),
                passcode: RwLock::new(None),
                subscriptions_failing: AtomicBool::new(false),
                writes_failing: AtomicBool::new(false),
                profiles_failing: AtomicBool::new(false),
                insert_calls: AtomicUsize::new(0),
                next_id: AtomicU64::new(1),
                verification_outbox: Mutex::new(Vec::new()),
                reset_outbox: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Register an account directly, bypassing sign-up.
    pub fn add_resident(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
        verified: bool,
    ) -> Principal {
        let principal = Principal {
            id: self.next_principal_id(),
            email: Some(email.to_string()),
            display_name: display_name.map(str::to_string),
            verified,
        };
        self.inner.accounts.insert(
            email.to_lowercase(),
            Account {
                principal: principal.clone(),
                password: password.to_string(),
            },
        );
        principal
    }

    /// Mark an account's email as verified, as if the link had been followed.
    pub fn verify_email(&self, email: &str) -> bool {
        match self.inner.accounts.get_mut(&email.to_lowercase()) {
            Some(mut account) => {
                account.principal.verified = true;
                true
            }
            None => false,
        }
    }

    /// Store a fully-formed message as-is (fixed id and timestamp).
    pub fn seed_message(&self, message: Message) {
        let floor = message.floor;
        self.inner.messages.write().push(message);
        let _ = self.inner.changes.send(Change::Inserted(floor));
    }

    pub fn set_building_passcode(&self, passcode: Option<&str>) {
        *self.inner.passcode.write() = passcode.map(str::to_string);
    }

    /// New subscriptions report an error instead of a snapshot.
    pub fn set_subscriptions_failing(&self, failing: bool) {
        self.inner.subscriptions_failing.store(failing, Ordering::SeqCst);
    }

    /// Inserts fail with [`StoreError::Unavailable`].
    pub fn set_writes_failing(&self, failing: bool) {
        self.inner.writes_failing.store(failing, Ordering::SeqCst);
    }

    /// Profile reads and writes fail with [`StoreError::Unavailable`].
    pub fn set_profiles_failing(&self, failing: bool) {
        self.inner.profiles_failing.store(failing, Ordering::SeqCst);
    }

    /// Break every open subscription with an error event.
    pub fn interrupt_subscriptions(&self) {
        let _ = self.inner.changes.send(Change::Outage);
    }

    /// Number of insert attempts, including failed ones
    pub fn insert_calls(&self) -> usize {
        self.inner.insert_calls.load(Ordering::SeqCst)
    }

    pub fn message_count(&self) -> usize {
        self.inner.messages.read().len()
    }

    /// Emails a verification link was sent to
    pub fn sent_verifications(&self) -> Vec<String> {
        self.inner.verification_outbox.lock().clone()
    }

    /// Emails a password reset was sent to
    pub fn sent_password_resets(&self) -> Vec<String> {
        self.inner.reset_outbox.lock().clone()
    }

    fn next_principal_id(&self) -> PrincipalId {
        PrincipalId::new(format!("uid-{}", self.inner.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    fn require_current(&self) -> Result<String, ProviderError> {
        self.inner.current.read().clone().ok_or(ProviderError::NoCurrentUser)
    }

    fn profiles_guard(&self) -> Result<(), StoreError> {
        if self.inner.profiles_failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("profiles offline".to_string()));
        }
        Ok(())
    }
}

impl Inner {
    fn snapshot(&self, query: &FloorQuery) -> Vec<Message> {
        let messages = self.messages.read();
        let mut matching: Vec<Message> = messages
            .iter()
            .rev()
            .filter(|m| m.floor == query.floor)
            .cloned()
            .collect();
        // Stable: ties keep newest-inserted first.
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if query.order == Order::CreatedAtAsc {
            matching.reverse();
        }
        matching
    }

    async fn serve(
        self: Arc<Self>,
        query: FloorQuery,
        sink: SnapshotSink<Vec<Message>>,
        mut changes: broadcast::Receiver<Change>,
    ) {
        if !sink.snapshot(self.snapshot(&query)).await {
            return;
        }

        loop {
            tokio::select! {
                _ = sink.cancelled() => break,
                change = changes.recv() => match change {
                    Ok(Change::Inserted(floor)) if floor == query.floor => {
                        if !sink.snapshot(self.snapshot(&query)).await {
                            break;
                        }
                    }
                    Ok(Change::Inserted(_)) => {}
                    Ok(Change::Outage) => {
                        sink.error(SubscriptionError::Unavailable("connection lost".to_string())).await;
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        trace!(skipped, "subscription lagged, resending snapshot");
                        if !sink.snapshot(self.snapshot(&query)).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        sink.error(SubscriptionError::Closed).await;
                        break;
                    }
                },
            }
        }

        debug!(floor = %query.floor, "memory subscription closed");
    }
}

#[async_trait]
impl MessageStore for MemoryBackend {
    fn subscribe(&self, query: FloorQuery, capacity: usize) -> Subscription<Vec<Message>> {
        let (sink, subscription) = subscription::channel(query.floor, capacity);

        if self.inner.subscriptions_failing.load(Ordering::SeqCst) {
            sink.try_error(SubscriptionError::PermissionDenied(
                "missing or insufficient permissions".to_string(),
            ));
            return subscription;
        }

        // Subscribe to changes before the first snapshot so none are missed.
        let changes = self.inner.changes.subscribe();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(self.inner.clone().serve(query, sink, changes));
            }
            Err(_) => {
                warn!(floor = %query.floor, "no async runtime, live query unavailable");
                sink.try_error(SubscriptionError::Unavailable("no async runtime".to_string()));
            }
        }

        subscription
    }

    async fn insert(&self, message: NewMessage) -> Result<MessageId, StoreError> {
        self.inner.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.writes_failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write rejected".to_string()));
        }

        let id = MessageId::new(uuid::Uuid::new_v4().simple().to_string());
        let floor = message.floor;
        {
            let mut messages = self.inner.messages.write();
            let mut created_at = self.inner.clock.now_utc();
            // Timestamps are strictly increasing within a floor.
            if let Some(last) = messages.iter().filter(|m| m.floor == floor).map(|m| m.created_at).max()
                && created_at <= last
            {
                created_at = last + Duration::milliseconds(1);
            }
            messages.push(message.into_message(id.clone(), created_at));
        }

        debug!(%floor, id = %id, "message inserted");
        let _ = self.inner.changes.send(Change::Inserted(floor));
        Ok(id)
    }

    async fn get_by_id(&self, id: &MessageId) -> Result<Option<Message>, StoreError> {
        Ok(self.inner.messages.read().iter().find(|m| &m.id == id).cloned())
    }
}

#[async_trait]
impl ProfileStore for MemoryBackend {
    async fn profile(&self, id: &PrincipalId) -> Result<Option<Profile>, StoreError> {
        self.profiles_guard()?;
        Ok(self.inner.profiles.get(id).map(|p| p.clone()))
    }

    async fn find_by_username(&self, username_lower: &str) -> Result<Vec<Profile>, StoreError> {
        self.profiles_guard()?;
        Ok(self
            .inner
            .profiles
            .iter()
            .filter(|p| p.username_lower == username_lower)
            .map(|p| p.clone())
            .collect())
    }

    async fn put_profile(&self, profile: Profile) -> Result<(), StoreError> {
        self.profiles_guard()?;
        self.inner.profiles.insert(profile.principal_id.clone(), profile);
        Ok(())
    }

    async fn delete_profile(&self, id: &PrincipalId) -> Result<(), StoreError> {
        self.profiles_guard()?;
        self.inner.profiles.remove(id);
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemoryBackend {
    async fn building_passcode(&self) -> Result<Option<String>, StoreError> {
        Ok(self.inner.passcode.read().clone())
    }
}

#[async_trait]
impl IdentityProvider for MemoryBackend {
    fn current_principal(&self) -> Option<Principal> {
        let key = self.inner.current.read().clone()?;
        self.inner.accounts.get(&key).map(|a| a.principal.clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, ProviderError> {
        let key = email.trim().to_lowercase();
        let account = self
            .inner
            .accounts
            .get(&key)
            .map(|a| a.clone())
            .ok_or(ProviderError::UserNotFound)?;
        if account.password != password {
            return Err(ProviderError::WrongPassword);
        }
        *self.inner.current.write() = Some(key);
        Ok(account.principal)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Principal, ProviderError> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(ProviderError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ProviderError::WeakPassword);
        }
        let key = email.to_lowercase();
        if self.inner.accounts.contains_key(&key) {
            return Err(ProviderError::EmailAlreadyInUse);
        }
        let principal = self.add_resident(email, password, None, false);
        *self.inner.current.write() = Some(key);
        Ok(principal)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        *self.inner.current.write() = None;
        Ok(())
    }

    async fn send_verification(&self, principal: &Principal) -> Result<(), ProviderError> {
        let email = principal.email.clone().ok_or(ProviderError::InvalidEmail)?;
        self.inner.verification_outbox.lock().push(email);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        if !self.inner.accounts.contains_key(&email.trim().to_lowercase()) {
            return Err(ProviderError::UserNotFound);
        }
        self.inner.reset_outbox.lock().push(email.trim().to_string());
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<(), ProviderError> {
        let key = self.require_current()?;
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ProviderError::WeakPassword);
        }
        let mut account = self
            .inner
            .accounts
            .get_mut(&key)
            .ok_or(ProviderError::NoCurrentUser)?;
        account.password = new_password.to_string();
        Ok(())
    }

    async fn delete_current(&self) -> Result<(), ProviderError> {
        let key = self.require_current()?;
        self.inner.accounts.remove(&key);
        *self.inner.current.write() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::SubscriptionEvent;
    use crate::traits::ManualClock;
    use chrono::{TimeZone, Utc};

    fn backend_at_fixed_time() -> MemoryBackend {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        MemoryBackend::with_clock(Arc::new(ManualClock::new(start)))
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_timestamps() {
        let backend = backend_at_fixed_time();
        let alice = backend.add_resident("alice@tower.example", "secret1", Some("Alice"), true);

        let a = backend.insert(NewMessage::new(Floor::new(2), "one", &alice)).await.unwrap();
        let b = backend.insert(NewMessage::new(Floor::new(2), "two", &alice)).await.unwrap();

        let a = backend.get_by_id(&a).await.unwrap().unwrap();
        let b = backend.get_by_id(&b).await.unwrap().unwrap();
        assert!(a.created_at < b.created_at);
        assert_ne!(a.id, b.id);
        assert_eq!(backend.insert_calls(), 2);
    }

    #[tokio::test]
    async fn test_subscription_delivers_newest_first() {
        let backend = backend_at_fixed_time();
        let alice = backend.add_resident("alice@tower.example", "secret1", None, true);
        backend.insert(NewMessage::new(Floor::new(2), "first", &alice)).await.unwrap();
        backend.insert(NewMessage::new(Floor::new(9), "elsewhere", &alice)).await.unwrap();

        let mut sub = backend.subscribe(FloorQuery::newest_first(Floor::new(2)), 4);
        match sub.next().await {
            Some(SubscriptionEvent::Snapshot(messages)) => {
                assert_eq!(messages.len(), 1);
                assert_eq!(messages[0].text, "first");
            }
            other => panic!("unexpected event: {:?}", other),
        }

        backend.insert(NewMessage::new(Floor::new(2), "second", &alice)).await.unwrap();
        match sub.next().await {
            Some(SubscriptionEvent::Snapshot(messages)) => {
                let texts: Vec<_> = messages.iter().map(|m| m.text.as_str()).collect();
                assert_eq!(texts, vec!["second", "first"]);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failing_subscription_reports_error() {
        let backend = MemoryBackend::new();
        backend.set_subscriptions_failing(true);

        let mut sub = backend.subscribe(FloorQuery::newest_first(Floor::new(3)), 4);
        assert!(matches!(
            sub.next().await,
            Some(SubscriptionEvent::Error(SubscriptionError::PermissionDenied(_)))
        ));
    }

    #[tokio::test]
    async fn test_outage_breaks_open_subscriptions() {
        let backend = MemoryBackend::new();
        let mut sub = backend.subscribe(FloorQuery::newest_first(Floor::new(3)), 4);
        assert!(matches!(sub.next().await, Some(SubscriptionEvent::Snapshot(_))));

        backend.interrupt_subscriptions();
        assert!(matches!(
            sub.next().await,
            Some(SubscriptionEvent::Error(SubscriptionError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn test_failing_writes() {
        let backend = MemoryBackend::new();
        let alice = backend.add_resident("alice@tower.example", "secret1", None, true);
        backend.set_writes_failing(true);

        let result = backend.insert(NewMessage::new(Floor::new(1), "hi", &alice)).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(backend.message_count(), 0);
        assert_eq!(backend.insert_calls(), 1);
    }

    #[tokio::test]
    async fn test_identity_round_trip() {
        let backend = MemoryBackend::new();
        let principal = backend.sign_up("New@Tower.example", "longenough").await.unwrap();
        assert!(!principal.verified);
        assert_eq!(backend.current_principal().unwrap().id, principal.id);

        backend.sign_out().await.unwrap();
        assert!(backend.current_principal().is_none());

        assert_eq!(
            backend.sign_in("new@tower.example", "wrong").await,
            Err(ProviderError::WrongPassword)
        );
        assert!(backend.verify_email("new@tower.example"));
        let signed_in = backend.sign_in("new@tower.example", "longenough").await.unwrap();
        assert!(signed_in.verified);

        assert_eq!(
            backend.sign_up("new@tower.example", "longenough").await,
            Err(ProviderError::EmailAlreadyInUse)
        );
    }

    #[tokio::test]
    async fn test_username_query_matches_lowercase_field() {
        let backend = MemoryBackend::new();
        backend
            .put_profile(Profile::new(PrincipalId::new("uid-1"), "Alice", None))
            .await
            .unwrap();

        assert_eq!(backend.find_by_username("alice").await.unwrap().len(), 1);
        assert!(backend.find_by_username("bob").await.unwrap().is_empty());
    }
}
