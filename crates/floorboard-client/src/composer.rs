//! Message composer
//!
//! Collects a draft for one floor and posts it with a single insert. While an
//! insert is in flight further submits are refused, so a rapid double click
//! posts once. A failed insert keeps the draft for retry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use floorboard_core::{
    Floor, IdentityProvider, MessageId, MessageStore, NewMessage, ValidationError, WriteError,
};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::ClientConfig;
use crate::format::character_counter;
use crate::validate::validate_message_text;

/// Composer status shown by the view
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ComposerStatus {
    #[default]
    Editing,
    Submitting,
    /// Retryable; the draft is still there
    Failed(WriteError),
    Posted(MessageId),
}

/// Successful submit results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Inserted; navigate back to this floor's feed
    Posted { id: MessageId, floor: Floor },
    /// Another submit is still in flight; nothing was sent
    AlreadySubmitting,
}

/// Submit failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ComposeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl ComposeError {
    pub fn user_message(&self) -> String {
        match self {
            ComposeError::Validation(e) => e.user_message(),
            ComposeError::Write(e) => e.user_message().to_string(),
        }
    }
}

/// Clears the in-flight flag however the submit ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Draft and submit logic for one floor
pub struct Composer<S: ?Sized, P: ?Sized> {
    store: Arc<S>,
    identity: Arc<P>,
    floor: Floor,
    soft_cap: usize,
    warn_len: usize,
    draft: Mutex<String>,
    status: Mutex<ComposerStatus>,
    in_flight: AtomicBool,
}

impl<S, P> Composer<S, P>
where
    S: MessageStore + ?Sized,
    P: IdentityProvider + ?Sized,
{
    pub fn new(store: Arc<S>, identity: Arc<P>, floor: Floor, config: &ClientConfig) -> Self {
        Self {
            store,
            identity,
            floor,
            soft_cap: config.message_soft_cap,
            warn_len: config.message_warn_len,
            draft: Mutex::new(String::new()),
            status: Mutex::new(ComposerStatus::Editing),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn floor(&self) -> Floor {
        self.floor
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        *self.draft.lock() = text.into();
        let mut status = self.status.lock();
        if matches!(*status, ComposerStatus::Posted(_)) {
            *status = ComposerStatus::Editing;
        }
    }

    pub fn draft(&self) -> String {
        self.draft.lock().clone()
    }

    pub fn status(&self) -> ComposerStatus {
        self.status.lock().clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Whether the submit control should be enabled
    pub fn can_submit(&self) -> bool {
        !self.is_submitting() && !self.draft.lock().trim().is_empty()
    }

    /// Character counter text, e.g. "12/1000"
    pub fn counter_label(&self) -> String {
        character_counter(self.draft.lock().chars().count(), self.soft_cap)
    }

    /// Whether the counter should be highlighted
    pub fn over_warn_len(&self) -> bool {
        self.draft.lock().chars().count() > self.warn_len
    }

    /// Post the current draft.
    ///
    /// Whitespace-only drafts are rejected without contacting the store.
    #[instrument(skip(self), fields(floor = %self.floor))]
    pub async fn submit(&self) -> Result<SubmitOutcome, ComposeError> {
        let text = validate_message_text(&self.draft.lock())?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(SubmitOutcome::AlreadySubmitting);
        }
        let _guard = InFlightGuard(&self.in_flight);
        *self.status.lock() = ComposerStatus::Submitting;

        let Some(author) = self.identity.current_principal() else {
            return Err(self.fail(WriteError::NotSignedIn).into());
        };

        match self.store.insert(NewMessage::new(self.floor, text, &author)).await {
            Ok(id) => {
                info!(id = %id, author = %author.id, "message posted");
                self.draft.lock().clear();
                *self.status.lock() = ComposerStatus::Posted(id.clone());
                Ok(SubmitOutcome::Posted {
                    id,
                    floor: self.floor,
                })
            }
            Err(e) => Err(self.fail(WriteError::Rejected(e)).into()),
        }
    }

    fn fail(&self, error: WriteError) -> WriteError {
        warn!(error = %error, "submit failed, draft kept");
        *self.status.lock() = ComposerStatus::Failed(error.clone());
        error
    }
}
