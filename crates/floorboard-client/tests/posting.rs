//! Composer, session and scroll integration tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use floorboard_client::{
    AuthService, ClientConfig, ComposeError, Composer, NavAction, Navigation, Page,
    ScrollController, ScrollViewport, SessionError, SubmitOutcome, VirtualViewport,
};
use floorboard_core::{
    Floor, FloorQuery, MemoryBackend, Message, MessageId, MessageStore, NewMessage, PrincipalId,
    Profile, ProfileStore, StoreError, Subscription, ValidationError, subscription,
};
use tokio::sync::Notify;

/// Counts inserts and optionally holds each one until released
#[derive(Default)]
struct CountingStore {
    inserts: AtomicUsize,
    gate: Option<Notify>,
}

impl CountingStore {
    fn gated() -> Self {
        Self {
            inserts: AtomicUsize::new(0),
            gate: Some(Notify::new()),
        }
    }

    fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageStore for CountingStore {
    fn subscribe(&self, query: FloorQuery, capacity: usize) -> Subscription<Vec<Message>> {
        let (_sink, subscription) = subscription::channel(query.floor, capacity);
        subscription
    }

    async fn insert(&self, _message: NewMessage) -> Result<MessageId, StoreError> {
        let n = self.inserts.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(MessageId::new(format!("m{}", n)))
    }

    async fn get_by_id(&self, _id: &MessageId) -> Result<Option<Message>, StoreError> {
        Ok(None)
    }
}

async fn signed_in_identity() -> Arc<MemoryBackend> {
    let identity = Arc::new(MemoryBackend::new());
    identity.add_resident("ana@tower.example", "secret1", Some("Ana"), true);
    floorboard_core::IdentityProvider::sign_in(identity.as_ref(), "ana@tower.example", "secret1")
        .await
        .unwrap();
    identity
}

#[tokio::test]
async fn test_whitespace_only_never_reaches_store() {
    let store = Arc::new(CountingStore::default());
    let composer = Composer::new(
        store.clone(),
        signed_in_identity().await,
        Floor::new(4),
        &ClientConfig::default(),
    );

    for draft in ["", " ", "\n\t  \n"] {
        composer.set_draft(draft);
        let err = composer.submit().await.unwrap_err();
        assert_eq!(err, ComposeError::Validation(ValidationError::EmptyMessage));
        assert_eq!(err.user_message(), "Please enter a comment");
    }
    assert_eq!(store.inserts(), 0);
}

#[tokio::test]
async fn test_rapid_double_submit_inserts_once() {
    let store = Arc::new(CountingStore::gated());
    let composer = Composer::new(
        store.clone(),
        signed_in_identity().await,
        Floor::new(4),
        &ClientConfig::default(),
    );
    composer.set_draft("Lost keys in the lobby");

    let (first, second) = tokio::join!(composer.submit(), async {
        tokio::task::yield_now().await;
        let outcome = composer.submit().await;
        store.release();
        outcome
    });

    assert!(matches!(first, Ok(SubmitOutcome::Posted { floor, .. }) if floor == Floor::new(4)));
    assert_eq!(second, Ok(SubmitOutcome::AlreadySubmitting));
    assert_eq!(store.inserts(), 1);
    assert_eq!(composer.draft(), "");
}

#[tokio::test]
async fn test_submission_disabled_while_in_flight() {
    use tokio_test::{assert_pending, assert_ready, task};

    let store = Arc::new(CountingStore::gated());
    let composer = Composer::new(
        store.clone(),
        signed_in_identity().await,
        Floor::new(9),
        &ClientConfig::default(),
    );
    composer.set_draft("Who left the stroller on 9?");

    let mut first = task::spawn(composer.submit());
    assert_pending!(first.poll());
    assert!(composer.is_submitting());
    assert!(!composer.can_submit());

    let mut second = task::spawn(composer.submit());
    assert_eq!(assert_ready!(second.poll()), Ok(SubmitOutcome::AlreadySubmitting));

    store.release();
    assert!(assert_ready!(first.poll()).is_ok());
    assert!(!composer.is_submitting());
    assert_eq!(store.inserts(), 1);
}

#[tokio::test]
async fn test_post_returns_to_floor_feed() {
    let store = Arc::new(CountingStore::default());
    let composer = Composer::new(
        store,
        signed_in_identity().await,
        Floor::new(11),
        &ClientConfig::default(),
    );
    let mut nav = Navigation::signed_in();
    nav.dispatch(NavAction::Compose(Floor::new(11)));

    composer.set_draft("Elevator B is fixed");
    if let Ok(SubmitOutcome::Posted { floor, .. }) = composer.submit().await {
        nav.dispatch(NavAction::Posted(floor));
    }
    assert_eq!(nav.page(), &Page::Floor(Floor::new(11)));
}

#[tokio::test]
async fn test_username_taken_case_insensitively() {
    let backend = Arc::new(MemoryBackend::new());
    backend
        .put_profile(Profile::new(PrincipalId::new("uid-77"), "alice", None))
        .await
        .unwrap();
    let auth = AuthService::new(backend.clone(), backend.clone(), ClientConfig::default());

    assert_eq!(
        auth.ensure_username_available("Alice").await,
        Err(SessionError::Validation(ValidationError::UsernameTaken("Alice".into())))
    );

    let err = auth
        .sign_up("alice2@tower.example", "secret1", "ALICE")
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "That username is already taken");
    assert!(backend.sent_verifications().is_empty());

    assert!(auth.ensure_username_available("alicia").await.is_ok());
}

#[test]
fn test_no_jump_affordance_without_overflow() {
    for (content, client) in [(0.0, 0.0), (0.0, 400.0), (250.0, 400.0), (400.0, 400.0)] {
        let mut scroll = ScrollController::new(20.0);
        scroll.mount(VirtualViewport::new(content, client));
        for offset in [-50.0, 0.0, 10.0, 1_000.0] {
            scroll.viewport_mut().unwrap().set_scroll_top(offset);
            scroll.on_scroll();
            scroll.on_frame();
            assert!(!scroll.show_jump_to_bottom(), "content {content}, offset {offset}");
        }
    }
}

#[test]
fn test_jump_affordance_follows_scroll_position() {
    let mut scroll = ScrollController::new(20.0);
    scroll.mount(VirtualViewport::new(2_000.0, 500.0));
    scroll.scroll_to_bottom();
    scroll.on_scroll();
    scroll.on_frame();
    assert!(!scroll.show_jump_to_bottom());

    // Within the threshold still counts as the bottom.
    scroll.viewport_mut().unwrap().scroll_by(-15.0);
    scroll.on_scroll();
    scroll.on_frame();
    assert!(!scroll.show_jump_to_bottom());

    scroll.viewport_mut().unwrap().scroll_by(-100.0);
    scroll.on_scroll();
    scroll.on_frame();
    assert!(scroll.show_jump_to_bottom());
    assert!(!scroll.is_pinned_to_bottom());

    scroll.jump_to_bottom();
    assert!(!scroll.show_jump_to_bottom());
    assert!(scroll.is_pinned_to_bottom());
    assert_eq!(scroll.viewport().unwrap().measure().unwrap().scroll_top, 1_500.0);
}
