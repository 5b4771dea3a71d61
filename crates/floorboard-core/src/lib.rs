//! # Floorboard Core
//!
//! Core types, traits, and errors for the Floorboard resident message board.
//!
//! Floorboard is a pure client of two managed services: an identity provider
//! and a document store. This crate defines the seams to those services so
//! the same client logic runs against a real backend or the in-memory
//! [`MemoryBackend`] used by tests and the terminal front-end.
//!
//! ## Key Traits
//!
//! - [`MessageStore`]: live per-floor subscriptions plus single inserts
//! - [`ProfileStore`]: resident profiles and username lookups
//! - [`IdentityProvider`]: credential checks and the current principal
//! - [`SettingsStore`]: building-wide settings such as the shared passcode
//! - [`Clock`]: time abstraction for testability
//!
//! ## Key Types
//!
//! - [`Floor`]: partition key for messages ([`Floor::GENERAL`] is building-wide)
//! - [`Message`]: a posted message with its denormalized author label
//! - [`Subscription`]: cancellable stream of snapshots for one floor

pub mod error;
pub mod floor;
pub mod memory;
pub mod message;
pub mod principal;
pub mod subscription;
pub mod traits;

// Re-export main types
pub use error::*;
pub use floor::*;
pub use memory::MemoryBackend;
pub use message::*;
pub use principal::*;
pub use subscription::*;
pub use traits::*;
