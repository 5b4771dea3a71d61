//! Feed data sources
//!
//! The feed reads from a [`FeedSource`]. Two implementations exist: the live
//! source backed by the document store, and a static source holding a fixed
//! data set that stands in when the live feed is unavailable. Both follow the
//! same contract: snapshots arrive newest first.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use floorboard_core::{
    ANONYMOUS_LABEL, Floor, FloorQuery, Message, MessageId, MessageStore, PrincipalId, Subscription,
    subscription,
};
use tracing::debug;

/// Somewhere the feed can get per-floor snapshots from
pub trait FeedSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Open a subscription delivering newest-first snapshots for `floor`.
    fn open(&self, floor: Floor, capacity: usize) -> Subscription<Vec<Message>>;
}

/// Live snapshots from the document store
pub struct LiveSource<S: MessageStore + ?Sized> {
    store: Arc<S>,
}

impl<S: MessageStore + ?Sized> LiveSource<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: MessageStore + ?Sized> FeedSource for LiveSource<S> {
    fn name(&self) -> &'static str {
        "live"
    }

    fn open(&self, floor: Floor, capacity: usize) -> Subscription<Vec<Message>> {
        self.store.subscribe(FloorQuery::newest_first(floor), capacity)
    }
}

/// A fixed, locally-held data set
///
/// Delivers exactly one snapshot per subscription, filtered to the requested
/// floor and ordered newest first by (`created_at`, `id`).
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    messages: Vec<Message>,
}

impl StaticSource {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// The placeholder conversation shipped with the app
    pub fn building_fallback() -> Self {
        Self::new(building_fallback_messages())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn snapshot(&self, floor: Floor) -> Vec<Message> {
        let mut matching: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| m.floor == floor)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
        matching
    }
}

impl FeedSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    fn open(&self, floor: Floor, capacity: usize) -> Subscription<Vec<Message>> {
        let (sink, subscription) = subscription::channel(floor, capacity);
        let snapshot = self.snapshot(floor);
        debug!(%floor, count = snapshot.len(), "serving static snapshot");
        sink.try_snapshot(snapshot);
        subscription
    }
}

fn fallback_message(id: &str, text: &str, created_at: DateTime<Utc>) -> Message {
    Message {
        id: MessageId::new(id),
        floor: Floor::new(3),
        text: text.to_string(),
        author_id: PrincipalId::new("placeholder"),
        author_label: ANONYMOUS_LABEL.to_string(),
        created_at,
    }
}

fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Placeholder comments for floor 3
pub fn building_fallback_messages() -> Vec<Message> {
    vec![
        fallback_message(
            "1",
            "Hi guys, anyone else hear any loud noises? Is there construction going on?",
            day(2025, 8, 8),
        ),
        fallback_message(
            "2",
            "What is going on with all of the fire alarm today?",
            day(2025, 1, 1),
        ),
        fallback_message(
            "3",
            "Yeah, I have been hearing the fire alarms all day as well. I dont know... Has anyone reached out to management yet?",
            day(2025, 1, 1),
        ),
        fallback_message(
            "4",
            "Hi everyone, I just moved in! Looking forward to meeting everyone.",
            day(2025, 7, 30),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorboard_core::SubscriptionEvent;

    #[tokio::test]
    async fn test_static_source_orders_newest_first() {
        let source = StaticSource::building_fallback();
        let mut sub = source.open(Floor::new(3), 4);

        match sub.next().await {
            Some(SubscriptionEvent::Snapshot(messages)) => {
                let ids: Vec<_> = messages.iter().map(|m| m.id.as_str()).collect();
                assert_eq!(ids, vec!["1", "4", "3", "2"]);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_static_source_filters_floor() {
        let source = StaticSource::building_fallback();
        let mut sub = source.open(Floor::new(8), 4);
        assert_eq!(sub.next().await, Some(SubscriptionEvent::Snapshot(Vec::new())));
    }

    #[test]
    fn test_fallback_data_is_floor_three() {
        let messages = building_fallback_messages();
        assert_eq!(messages.len(), 4);
        assert!(messages.iter().all(|m| m.floor == Floor::new(3)));
    }
}
