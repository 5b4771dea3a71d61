//! Cancellable live-query subscriptions
//!
//! A [`Subscription`] is the consumer end of a bounded channel fed by the
//! store. Each event is either a complete snapshot of the matching records
//! (never a diff) or an error signal. Cancelling the subscription, explicitly
//! or by dropping it, releases the producer side.
//!
//! ```rust,ignore
//! let mut sub = store.subscribe(FloorQuery::newest_first(floor), 16);
//! while let Some(event) = sub.next().await {
//!     match event {
//!         SubscriptionEvent::Snapshot(messages) => render(messages),
//!         SubscriptionEvent::Error(e) => fall_back(e),
//!     }
//! }
//! ```

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::SubscriptionError;
use crate::floor::Floor;

/// One delivery from a live query
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionEvent<T> {
    /// The complete current result set
    Snapshot(T),
    /// The subscription could not be established or broke down
    Error(SubscriptionError),
}

/// Create a connected producer/consumer pair for `floor`.
///
/// `capacity` bounds the number of undelivered events; it is raised to 1
/// if zero.
pub fn channel<T>(floor: Floor, capacity: usize) -> (SnapshotSink<T>, Subscription<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let cancel = CancellationToken::new();
    (
        SnapshotSink {
            floor,
            tx,
            cancel: cancel.clone(),
        },
        Subscription { floor, rx, cancel },
    )
}

/// Consumer end of a live query.
///
/// Dropping the subscription cancels it.
#[derive(Debug)]
pub struct Subscription<T> {
    floor: Floor,
    rx: mpsc::Receiver<SubscriptionEvent<T>>,
    cancel: CancellationToken,
}

impl<T> Subscription<T> {
    /// The floor this subscription was opened for
    pub fn floor(&self) -> Floor {
        self.floor
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once cancelled or once the producer has finished.
    pub async fn next(&mut self) -> Option<SubscriptionEvent<T>> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            event = self.rx.recv() => event,
        }
    }

    /// Detach from the producer. Idempotent.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.rx.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A handle that can cancel this subscription from elsewhere
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.cancel.clone())
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Detached cancellation for a [`Subscription`].
#[derive(Debug, Clone)]
pub struct CancelHandle(CancellationToken);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// Producer end of a live query, held by the store.
#[derive(Debug)]
pub struct SnapshotSink<T> {
    floor: Floor,
    tx: mpsc::Sender<SubscriptionEvent<T>>,
    cancel: CancellationToken,
}

impl<T> SnapshotSink<T> {
    pub fn floor(&self) -> Floor {
        self.floor
    }

    /// Push a snapshot. Returns `false` if the consumer has gone away.
    pub async fn snapshot(&self, value: T) -> bool {
        self.send(SubscriptionEvent::Snapshot(value)).await
    }

    /// Push a snapshot without waiting. Returns `false` if the channel is
    /// full or the consumer has gone away.
    pub fn try_snapshot(&self, value: T) -> bool {
        !self.is_cancelled() && self.tx.try_send(SubscriptionEvent::Snapshot(value)).is_ok()
    }

    /// Signal a failure. Returns `false` if the consumer has gone away.
    pub async fn error(&self, error: SubscriptionError) -> bool {
        self.send(SubscriptionEvent::Error(error)).await
    }

    /// Signal a failure without waiting.
    pub fn try_error(&self, error: SubscriptionError) -> bool {
        !self.is_cancelled() && self.tx.try_send(SubscriptionEvent::Error(error)).is_ok()
    }

    /// Whether the consumer cancelled or dropped its end.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }

    /// Resolves once the consumer cancels or drops its end.
    pub async fn cancelled(&self) {
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = self.tx.closed() => {}
        }
    }

    async fn send(&self, event: SubscriptionEvent<T>) -> bool {
        if self.is_cancelled() {
            return false;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.tx.send(event) => sent.is_ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshots_arrive_in_order() {
        let (sink, mut sub) = channel::<u32>(Floor::new(3), 4);
        assert!(sink.snapshot(1).await);
        assert!(sink.snapshot(2).await);
        drop(sink);

        assert_eq!(sub.next().await, Some(SubscriptionEvent::Snapshot(1)));
        assert_eq!(sub.next().await, Some(SubscriptionEvent::Snapshot(2)));
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_cancel_stops_delivery_and_releases_producer() {
        let (sink, mut sub) = channel::<u32>(Floor::new(3), 4);
        assert!(sink.snapshot(1).await);

        sub.cancel();
        sub.cancel();
        assert!(sub.is_cancelled());
        assert_eq!(sub.next().await, None);
        assert!(sink.is_cancelled());
        assert!(!sink.snapshot(2).await);
    }

    #[tokio::test]
    async fn test_drop_cancels() {
        let (sink, sub) = channel::<u32>(Floor::new(5), 1);
        let handle = sub.cancel_handle();
        drop(sub);
        assert!(handle.is_cancelled());
        sink.cancelled().await;
        assert!(!sink.try_snapshot(9));
    }

    #[tokio::test]
    async fn test_handle_cancels_from_elsewhere() {
        let (sink, mut sub) = channel::<u32>(Floor::new(5), 1);
        sub.cancel_handle().cancel();
        assert_eq!(sub.next().await, None);
        assert!(!sink.error(SubscriptionError::Closed).await);
    }

    #[tokio::test]
    async fn test_zero_capacity_is_raised() {
        let (sink, mut sub) = channel::<u32>(Floor::GENERAL, 0);
        assert!(sink.try_snapshot(7));
        assert_eq!(sub.next().await, Some(SubscriptionEvent::Snapshot(7)));
        assert_eq!(sub.floor(), Floor::GENERAL);
    }

    #[test]
    fn test_next_wakes_on_snapshot() {
        use tokio_test::{assert_pending, assert_ready_eq, task};

        let (sink, mut sub) = channel::<u32>(Floor::new(8), 2);
        let mut next = task::spawn(sub.next());
        assert_pending!(next.poll());

        assert!(sink.try_snapshot(4));
        assert!(next.is_woken());
        assert_ready_eq!(next.poll(), Some(SubscriptionEvent::Snapshot(4)));
    }
}
