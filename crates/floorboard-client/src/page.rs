//! Floor page
//!
//! Glues a [`FeedController`] to a [`ScrollController`]: once a snapshot has
//! been rendered the page snaps to the newest message.
//!
//! The front-end drives it in three steps per update:
//!
//! 1. `next_transition().await` applies the next feed event
//! 2. the front-end renders [`FloorPage::view`]
//! 3. `rendered()` tells the scroll controller the list is on screen

use floorboard_core::{Floor, Message, SubscriptionError};

use crate::config::ClientConfig;
use crate::feed::{FeedController, FeedState, Freshness, Transition};
use crate::format::message_count_label;
use crate::scroll::{FrameRequest, ScrollController, ScrollViewport};

/// What the feed area should show
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeedView<'a> {
    Loading,
    Empty,
    Populated(&'a [Message]),
    /// Neither the live feed nor the fallback could be opened
    Unavailable(&'a SubscriptionError),
}

/// A floor's feed and its scroll container
pub struct FloorPage<V> {
    feed: FeedController,
    scroll: ScrollController<V>,
    render_pending: bool,
}

impl<V: ScrollViewport> FloorPage<V> {
    pub fn new(feed: FeedController, config: &ClientConfig) -> Self {
        Self {
            feed,
            scroll: ScrollController::new(config.scroll_threshold),
            render_pending: false,
        }
    }

    /// Show `floor`, replacing whatever was shown before
    pub fn open(&mut self, floor: Floor) {
        self.render_pending = false;
        self.feed.select_floor(floor);
    }

    pub fn close(&mut self) {
        self.render_pending = false;
        self.feed.close();
    }

    pub fn floor(&self) -> Option<Floor> {
        self.feed.floor()
    }

    /// Wait for and apply the next feed event
    pub async fn next_transition(&mut self) -> Transition {
        let transition = self.feed.next_transition().await;
        if transition == Transition::Ready {
            self.render_pending = true;
        }
        transition
    }

    /// Whether a new list is waiting to be rendered
    pub fn render_pending(&self) -> bool {
        self.render_pending
    }

    /// The front-end finished rendering the current view
    pub fn rendered(&mut self) -> FrameRequest {
        if !std::mem::take(&mut self.render_pending) {
            return FrameRequest::None;
        }
        self.scroll.on_data_arrived()
    }

    pub fn view(&self) -> FeedView<'_> {
        match self.feed.state() {
            FeedState::Idle | FeedState::Loading => FeedView::Loading,
            FeedState::Ready { messages, .. } if messages.is_empty() => FeedView::Empty,
            FeedState::Ready { messages, .. } => FeedView::Populated(messages),
            FeedState::Error(error) => FeedView::Unavailable(error),
        }
    }

    pub fn freshness(&self) -> Option<Freshness> {
        match self.feed.state() {
            FeedState::Ready { freshness, .. } => Some(*freshness),
            _ => None,
        }
    }

    /// Page heading, e.g. "Floor 3 Community"
    pub fn title(&self) -> Option<String> {
        self.floor().map(|f| f.title())
    }

    /// e.g. "4 messages"
    pub fn count_label(&self) -> String {
        message_count_label(self.feed.messages().len())
    }

    pub fn feed(&self) -> &FeedController {
        &self.feed
    }

    pub fn scroll(&self) -> &ScrollController<V> {
        &self.scroll
    }

    pub fn scroll_mut(&mut self) -> &mut ScrollController<V> {
        &mut self.scroll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::scroll::VirtualViewport;
    use crate::source::{LiveSource, StaticSource};
    use floorboard_core::MemoryBackend;

    fn page(backend: &Arc<MemoryBackend>) -> FloorPage<VirtualViewport> {
        let config = ClientConfig::default();
        let feed = FeedController::new(
            Arc::new(LiveSource::new(backend.clone())),
            Arc::new(StaticSource::building_fallback()),
            &config,
        );
        FloorPage::new(feed, &config)
    }

    #[tokio::test]
    async fn test_empty_floor_then_render() {
        let backend = Arc::new(MemoryBackend::new());
        let mut page = page(&backend);
        page.scroll_mut().mount(VirtualViewport::new(0.0, 400.0));

        page.open(Floor::new(9));
        assert_eq!(page.view(), FeedView::Loading);
        assert_eq!(page.title().as_deref(), Some("Floor 9 Community"));

        assert_eq!(page.next_transition().await, Transition::Ready);
        assert_eq!(page.view(), FeedView::Empty);
        assert_eq!(page.count_label(), "0 messages");
        assert_eq!(page.freshness(), Some(Freshness::Live));

        assert_eq!(page.rendered(), FrameRequest::Schedule);
        assert_eq!(page.rendered(), FrameRequest::None);
        page.scroll_mut().on_frame();
        assert!(!page.scroll().show_jump_to_bottom());
    }

    #[tokio::test]
    async fn test_failed_live_feed_serves_fallback() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_subscriptions_failing(true);
        let mut page = page(&backend);

        page.open(Floor::new(3));
        assert!(matches!(page.next_transition().await, Transition::FallbackRequested(_)));
        assert!(matches!(page.view(), FeedView::Unavailable(_)));

        assert_eq!(page.next_transition().await, Transition::Ready);
        assert_eq!(page.freshness(), Some(Freshness::Fallback));
        assert_eq!(page.count_label(), "4 messages");
    }
}
