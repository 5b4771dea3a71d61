//! Feed state machine
//!
//! Owns the in-memory message list for the floor being viewed.
//!
//! ```text
//! select_floor ──► Loading ──snapshot──► Ready(list) ──snapshot──► Ready(list') ...
//!                     │                     │
//!                     └──────error──────────┴──► Error ──fallback snapshot──► Ready(degraded)
//! ```
//!
//! [`FeedMachine`] is the pure transition logic. [`FeedController`] drives it:
//! it opens subscriptions, pumps their events into a single bounded channel,
//! and swaps to the fallback source when the live one fails.
//!
//! Every event is tagged with the floor and the epoch it was opened under.
//! Selecting a floor bumps the epoch, so events from a torn-down subscription
//! that are still in flight are ignored.

use std::sync::Arc;

use floorboard_core::{CancelHandle, Floor, Message, SubscriptionError, SubscriptionEvent};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::source::FeedSource;

/// Where the current list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The live subscription
    Live,
    /// Local placeholder data after the live feed failed
    Fallback,
}

/// Feed states
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FeedState {
    /// No floor selected
    #[default]
    Idle,
    /// Waiting for the first snapshot
    Loading,
    /// A list is available, oldest first
    Ready {
        messages: Vec<Message>,
        freshness: Freshness,
    },
    /// The live feed failed; fallback pending or unavailable
    Error(SubscriptionError),
}

impl FeedState {
    /// Messages in display order; empty unless `Ready`
    pub fn messages(&self) -> &[Message] {
        match self {
            FeedState::Ready { messages, .. } => messages,
            _ => &[],
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, FeedState::Ready { .. })
    }
}

/// An event delivered to the feed
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEvent {
    pub floor: Floor,
    pub epoch: u64,
    pub kind: FeedEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEventKind {
    /// A complete newest-first snapshot
    Snapshot {
        messages: Vec<Message>,
        freshness: Freshness,
    },
    /// The live subscription failed
    Failed(SubscriptionError),
    /// The fallback source failed too
    FallbackFailed(SubscriptionError),
}

/// Result of applying an event
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The event belonged to a floor or epoch that is no longer active
    Ignored,
    /// Entered (or re-entered) `Ready`; the view should scroll to the newest message
    Ready,
    /// The live feed failed; the fallback source should be opened
    FallbackRequested(SubscriptionError),
    /// Both sources failed; the feed stays in `Error`
    Failed(SubscriptionError),
}

/// Pure feed state transitions
#[derive(Debug, Default)]
pub struct FeedMachine {
    floor: Option<Floor>,
    epoch: u64,
    state: FeedState,
}

impl FeedMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn floor(&self) -> Option<Floor> {
        self.floor
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    /// Enter `Loading` for `floor`, discarding the previous list.
    ///
    /// Returns the new epoch events must carry to be accepted.
    pub fn select_floor(&mut self, floor: Floor) -> u64 {
        self.epoch += 1;
        self.floor = Some(floor);
        self.state = FeedState::Loading;
        self.epoch
    }

    /// Leave the feed, discarding the list.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.floor = None;
        self.state = FeedState::Idle;
    }

    /// Apply an event, ignoring it if it is stale.
    pub fn apply(&mut self, event: FeedEvent) -> Transition {
        let Some(active) = self.floor else {
            return Transition::Ignored;
        };
        if event.floor != active || event.epoch != self.epoch {
            debug!(
                floor = %event.floor,
                epoch = event.epoch,
                active_epoch = self.epoch,
                "dropping stale feed event"
            );
            return Transition::Ignored;
        }

        match event.kind {
            FeedEventKind::Snapshot {
                mut messages,
                freshness,
            } => {
                messages.reverse();
                let before = messages.len();
                messages.retain(|m| m.floor == active);
                if messages.len() != before {
                    warn!(floor = %active, dropped = before - messages.len(), "snapshot contained other floors");
                }
                self.state = FeedState::Ready {
                    messages,
                    freshness,
                };
                Transition::Ready
            }
            FeedEventKind::Failed(error) => {
                self.state = FeedState::Error(error.clone());
                Transition::FallbackRequested(error)
            }
            FeedEventKind::FallbackFailed(error) => {
                self.state = FeedState::Error(error.clone());
                Transition::Failed(error)
            }
        }
    }
}

/// The subscription currently feeding the controller
struct ActiveFeed {
    source: &'static str,
    cancel: CancelHandle,
}

/// Drives a [`FeedMachine`] from live and fallback sources
///
/// Subscriptions are pumped by spawned tasks, so a tokio runtime must be
/// running. Dropping the controller cancels the active subscription.
pub struct FeedController {
    primary: Arc<dyn FeedSource>,
    fallback: Arc<dyn FeedSource>,
    capacity: usize,
    machine: FeedMachine,
    events_tx: mpsc::Sender<FeedEvent>,
    events_rx: mpsc::Receiver<FeedEvent>,
    active: Option<ActiveFeed>,
}

impl FeedController {
    pub fn new(
        primary: Arc<dyn FeedSource>,
        fallback: Arc<dyn FeedSource>,
        config: &ClientConfig,
    ) -> Self {
        let capacity = config.subscription_buffer.max(1);
        let (events_tx, events_rx) = mpsc::channel(capacity);
        Self {
            primary,
            fallback,
            capacity,
            machine: FeedMachine::new(),
            events_tx,
            events_rx,
            active: None,
        }
    }

    pub fn floor(&self) -> Option<Floor> {
        self.machine.floor()
    }

    pub fn state(&self) -> &FeedState {
        self.machine.state()
    }

    /// Messages for the active floor, oldest first
    pub fn messages(&self) -> &[Message] {
        self.machine.state().messages()
    }

    /// Name of the source feeding the current list, if any
    pub fn active_source(&self) -> Option<&'static str> {
        self.active.as_ref().map(|a| a.source)
    }

    /// Switch to `floor`: tear down the previous subscription, enter
    /// `Loading`, and subscribe to the live source.
    pub fn select_floor(&mut self, floor: Floor) {
        self.teardown();
        let epoch = self.machine.select_floor(floor);
        info!(%floor, epoch, "feed loading");
        self.attach(self.primary.clone(), floor, epoch, Freshness::Live);
    }

    /// Tear down the subscription and return to `Idle`.
    pub fn close(&mut self) {
        self.teardown();
        self.machine.reset();
    }

    /// Wait for the next event and apply it.
    ///
    /// Stale events are consumed and reported as [`Transition::Ignored`].
    /// A live failure switches to the fallback source before returning.
    pub async fn next_transition(&mut self) -> Transition {
        // The controller holds a sender, so the channel never closes.
        let Some(event) = self.events_rx.recv().await else {
            return Transition::Ignored;
        };
        self.apply(event)
    }

    /// Apply one event and perform any follow-up it requires.
    pub fn apply(&mut self, event: FeedEvent) -> Transition {
        let transition = self.machine.apply(event);
        match &transition {
            Transition::Ready => {
                debug!(count = self.messages().len(), "feed ready");
            }
            Transition::FallbackRequested(error) => {
                if let Some(floor) = self.machine.floor() {
                    warn!(%floor, %error, "live feed failed, serving fallback data");
                    self.teardown();
                    let epoch = self.machine.epoch();
                    self.attach(self.fallback.clone(), floor, epoch, Freshness::Fallback);
                }
            }
            Transition::Failed(error) => {
                warn!(%error, "fallback feed failed");
                self.teardown();
            }
            Transition::Ignored => {}
        }
        transition
    }

    fn attach(&mut self, source: Arc<dyn FeedSource>, floor: Floor, epoch: u64, freshness: Freshness) {
        let mut subscription = source.open(floor, self.capacity);
        let cancel = subscription.cancel_handle();
        let tx = self.events_tx.clone();

        tokio::spawn(async move {
            while let Some(event) = subscription.next().await {
                let kind = match event {
                    SubscriptionEvent::Snapshot(messages) => FeedEventKind::Snapshot {
                        messages,
                        freshness,
                    },
                    SubscriptionEvent::Error(error) => match freshness {
                        Freshness::Live => FeedEventKind::Failed(error),
                        Freshness::Fallback => FeedEventKind::FallbackFailed(error),
                    },
                };
                let terminal = !matches!(kind, FeedEventKind::Snapshot { .. });
                if tx.send(FeedEvent { floor, epoch, kind }).await.is_err() || terminal {
                    break;
                }
            }
        });

        self.active = Some(ActiveFeed {
            source: source.name(),
            cancel,
        });
    }

    fn teardown(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(source = active.source, "cancelling feed subscription");
            active.cancel.cancel();
        }
    }
}

impl Drop for FeedController {
    fn drop(&mut self) {
        self.teardown();
    }
}
