//! The message entity and its insert payload

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::floor::Floor;
use crate::principal::{Principal, PrincipalId};

/// Opaque backend-assigned message identifier, unique across all floors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A posted message.
///
/// Messages are created once through a single insert and never updated.
/// `author_label` is resolved at write time and stored as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub floor: Floor,
    pub text: String,
    pub author_id: PrincipalId,
    pub author_label: String,
    /// Server-assigned; the feed's ordering key.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Key used when a total order is needed: creation time, then id.
    pub fn sort_key(&self) -> (DateTime<Utc>, &str) {
        (self.created_at, self.id.as_str())
    }
}

/// Record handed to the store on insert.
///
/// The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub floor: Floor,
    pub text: String,
    pub author_id: PrincipalId,
    pub author_label: String,
}

impl NewMessage {
    /// Attribute `text` to `author` on `floor`.
    pub fn new(floor: Floor, text: impl Into<String>, author: &Principal) -> Self {
        Self {
            floor,
            text: text.into(),
            author_id: author.id.clone(),
            author_label: author.author_label(),
        }
    }

    /// Materialize the stored form once the backend has assigned identity and time.
    pub fn into_message(self, id: MessageId, created_at: DateTime<Utc>) -> Message {
        Message {
            id,
            floor: self.floor,
            text: self.text,
            author_id: self.author_id,
            author_label: self.author_label,
            created_at,
        }
    }
}

/// Sort order for floor queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Newest first, the order live subscriptions deliver.
    #[default]
    CreatedAtDesc,
    CreatedAtAsc,
}

/// A standing query over one floor's messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloorQuery {
    pub floor: Floor,
    pub order: Order,
}

impl FloorQuery {
    /// `floor == <floor>` ordered by `created_at` descending.
    pub fn newest_first(floor: Floor) -> Self {
        Self {
            floor,
            order: Order::CreatedAtDesc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn author() -> Principal {
        Principal {
            id: PrincipalId::new("uid-7"),
            email: Some("sam@tower.example".to_string()),
            display_name: None,
            verified: true,
        }
    }

    #[test]
    fn test_new_message_denormalizes_author() {
        let msg = NewMessage::new(Floor::new(7), "Package room is open", &author());
        assert_eq!(msg.author_id, PrincipalId::new("uid-7"));
        assert_eq!(msg.author_label, "sam");
    }

    #[test]
    fn test_into_message_keeps_payload() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let msg = NewMessage::new(Floor::new(7), "hello", &author())
            .into_message(MessageId::new("m-1"), at);
        assert_eq!(msg.id.as_str(), "m-1");
        assert_eq!(msg.created_at, at);
        assert_eq!(msg.floor, Floor::new(7));
    }

    #[test]
    fn test_document_field_names() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let msg = NewMessage::new(Floor::GENERAL, "hi", &author())
            .into_message(MessageId::new("m-2"), at);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["floor"], 999);
        assert_eq!(json["authorId"], "uid-7");
        assert_eq!(json["authorLabel"], "sam");
        assert!(json.get("createdAt").is_some());
    }
}
