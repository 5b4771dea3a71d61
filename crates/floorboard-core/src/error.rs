//! Error types for Floorboard
//!
//! Every backend failure is converted at the point of call into one of the
//! user-facing families below. None of them is fatal: each maps to a fixed
//! message and a retryable state in the view layer.

use thiserror::Error;

/// Top-level error type for Floorboard
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FloorboardError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Subscription error: {0}")]
    Subscription(#[from] SubscriptionError),

    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for Floorboard operations
pub type Result<T> = std::result::Result<T, FloorboardError>;

/// Raw failures reported by the document store
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store connection closed")]
    Closed,
}

/// Local validation failures, reported inline and never sent to the backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("message text is empty")]
    EmptyMessage,

    #[error("password is empty")]
    EmptyPassword,

    #[error("malformed email address")]
    MalformedEmail,

    #[error("username must be {min}-{max} characters")]
    UsernameLength { min: usize, max: usize },

    #[error("username contains invalid characters")]
    UsernameCharacters,

    #[error("username '{0}' is already taken")]
    UsernameTaken(String),
}

impl ValidationError {
    /// Text shown next to the offending field
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::EmptyMessage => "Please enter a comment".to_string(),
            ValidationError::EmptyPassword => "Please enter a password".to_string(),
            ValidationError::MalformedEmail => "Please enter a valid email address".to_string(),
            ValidationError::UsernameLength { min, max } => {
                format!("Username must be between {} and {} characters", min, max)
            }
            ValidationError::UsernameCharacters => {
                "Username may only contain letters, numbers, '_' and '.'".to_string()
            }
            ValidationError::UsernameTaken(_) => "That username is already taken".to_string(),
        }
    }
}

/// Failure codes reported by the identity provider
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("wrong password")]
    WrongPassword,

    #[error("user not found")]
    UserNotFound,

    #[error("invalid email")]
    InvalidEmail,

    #[error("email already in use")]
    EmailAlreadyInUse,

    #[error("weak password")]
    WeakPassword,

    #[error("too many requests")]
    TooManyRequests,

    #[error("requires recent login")]
    RequiresRecentLogin,

    #[error("no signed-in user")]
    NoCurrentUser,

    #[error("network failure: {0}")]
    Network(String),

    #[error("provider failure: {0}")]
    Other(String),
}

/// Authentication failures, always recoverable by retrying the form
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email address not verified")]
    EmailNotVerified,

    #[error("rate limited")]
    TooManyRequests,

    #[error("email already registered")]
    EmailInUse,

    #[error("password too weak")]
    WeakPassword,

    #[error("recent sign-in required")]
    RequiresRecentLogin,

    #[error("not signed in")]
    NotSignedIn,

    #[error("building passcode not configured")]
    PasscodeNotConfigured,

    #[error("incorrect building passcode")]
    IncorrectPasscode,

    #[error("identity provider unreachable: {0}")]
    Unavailable(String),

    #[error("identity provider failure: {0}")]
    Other(String),
}

impl AuthError {
    /// Fixed user-facing text for this failure
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Incorrect email or password",
            AuthError::EmailNotVerified => "Please verify your email before signing in",
            AuthError::TooManyRequests => "Too many attempts. Please try again later",
            AuthError::EmailInUse => "An account with this email already exists",
            AuthError::WeakPassword => "Password should be at least 6 characters",
            AuthError::RequiresRecentLogin => "Please sign in again to continue",
            AuthError::NotSignedIn => "You must be logged in",
            AuthError::PasscodeNotConfigured => "Password not configured",
            AuthError::IncorrectPasscode => "Incorrect password",
            AuthError::Unavailable(_) => "Unable to reach the server. Please try again",
            AuthError::Other(_) => "Something went wrong. Please try again",
        }
    }
}

impl From<ProviderError> for AuthError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::WrongPassword | ProviderError::UserNotFound => {
                AuthError::InvalidCredentials
            }
            ProviderError::InvalidEmail => AuthError::InvalidCredentials,
            ProviderError::EmailAlreadyInUse => AuthError::EmailInUse,
            ProviderError::WeakPassword => AuthError::WeakPassword,
            ProviderError::TooManyRequests => AuthError::TooManyRequests,
            ProviderError::RequiresRecentLogin => AuthError::RequiresRecentLogin,
            ProviderError::NoCurrentUser => AuthError::NotSignedIn,
            ProviderError::Network(s) => AuthError::Unavailable(s),
            ProviderError::Other(s) => AuthError::Other(s),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(s) => AuthError::Unavailable(s),
            other => AuthError::Other(other.to_string()),
        }
    }
}

/// The live feed could not be established or broke down
///
/// Recovered locally by substituting static fallback content.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("live feed unavailable: {0}")]
    Unavailable(String),

    #[error("live feed permission denied: {0}")]
    PermissionDenied(String),

    #[error("live feed closed by backend")]
    Closed,
}

impl From<StoreError> for SubscriptionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::PermissionDenied(s) => SubscriptionError::PermissionDenied(s),
            StoreError::Closed => SubscriptionError::Closed,
            other => SubscriptionError::Unavailable(other.to_string()),
        }
    }
}

/// An insert failed; surfaced as a retryable banner with the draft preserved
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WriteError {
    #[error("no signed-in resident")]
    NotSignedIn,

    #[error("insert rejected: {0}")]
    Rejected(#[from] StoreError),
}

impl WriteError {
    /// Banner text shown above the composer
    pub fn user_message(&self) -> &'static str {
        match self {
            WriteError::NotSignedIn => "You must be logged in to post a comment",
            WriteError::Rejected(_) => "Failed to submit comment. Please try again.",
        }
    }
}
