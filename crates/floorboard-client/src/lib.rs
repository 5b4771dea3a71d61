//! # Floorboard Client
//!
//! Client-side orchestration for the Floorboard resident message board.
//!
//! The hosted backend owns storage, authentication and real-time delivery.
//! This crate owns what happens on the resident's device:
//!
//! - **Feed**: per-floor live subscription, reversed into chronological order,
//!   with a static fallback when the live feed cannot be established
//! - **Scroll**: chat-style bottom anchoring and the "jump to newest" affordance
//! - **Composer**: validated single-insert posting with double-submit protection
//! - **Navigation**: an explicit page state with a pure transition function
//! - **Session**: sign-in, sign-up, username checks and the building passcode
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use floorboard_client::{ClientConfig, FeedController, LiveSource, StaticSource};
//! use floorboard_core::{Floor, MemoryBackend};
//!
//! let backend = Arc::new(MemoryBackend::new());
//! let config = ClientConfig::default();
//! let mut feed = FeedController::new(
//!     Arc::new(LiveSource::new(backend.clone())),
//!     Arc::new(StaticSource::building_fallback()),
//!     &config,
//! );
//!
//! feed.select_floor(Floor::new(3));
//! loop {
//!     let transition = feed.next_transition().await;
//!     println!("{:?}: {} messages", transition, feed.messages().len());
//! }
//! ```

pub mod composer;
pub mod config;
pub mod feed;
pub mod format;
pub mod navigation;
pub mod page;
pub mod scroll;
pub mod session;
pub mod source;
pub mod validate;

// Re-exports
pub use composer::{ComposeError, Composer, ComposerStatus, SubmitOutcome};
pub use config::{ClientConfig, ClientConfigBuilder, ConfigError};
pub use feed::{FeedController, FeedEvent, FeedEventKind, FeedMachine, FeedState, Freshness, Transition};
pub use navigation::{NavAction, Navigation, Page};
pub use page::{FeedView, FloorPage};
pub use scroll::{FrameRequest, PinState, ScrollController, ScrollMetrics, ScrollViewport, VirtualViewport};
pub use session::{AuthService, PasscodeGate, SessionError};
pub use source::{FeedSource, LiveSource, StaticSource};
