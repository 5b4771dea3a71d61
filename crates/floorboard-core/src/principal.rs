//! Authenticated residents and their profiles

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Label used when a resident has neither a display name nor an email.
pub const ANONYMOUS_LABEL: &str = "Anonymous";

/// Identifier of an authenticated principal, as vended by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: PrincipalId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub verified: bool,
}

impl Principal {
    /// Label stored on messages this principal writes.
    ///
    /// Display name, else the local part of the email, else "Anonymous".
    pub fn author_label(&self) -> String {
        if let Some(name) = self.display_name.as_deref().map(str::trim)
            && !name.is_empty()
        {
            return name.to_string();
        }
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| ANONYMOUS_LABEL.to_string())
    }
}

/// Per-resident profile document (the `users` collection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub principal_id: PrincipalId,
    pub username: String,
    /// Lowercased copy of `username`, the field uniqueness queries match on.
    pub username_lower: String,
    pub email: Option<String>,
}

impl Profile {
    pub fn new(principal_id: PrincipalId, username: impl Into<String>, email: Option<String>) -> Self {
        let username = username.into();
        Self {
            principal_id,
            username_lower: username.to_lowercase(),
            username,
            email,
        }
    }
}
