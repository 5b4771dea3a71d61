//! Session and account flows
//!
//! [`AuthService`] wraps the identity provider and the profile store with the
//! local checks that run before either is called. [`PasscodeGate`] is the
//! building-wide shared passcode login.
//!
//! Every failure ends as a [`SessionError`] carrying a fixed user-facing
//! message.

use std::sync::Arc;

use floorboard_core::{
    AuthError, IdentityProvider, Principal, PrincipalId, Profile, ProfileStore, SettingsStore,
    ValidationError,
};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::validate::{validate_email, validate_password_present, validate_username};

/// Session flow failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl SessionError {
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Validation(e) => e.user_message(),
            SessionError::Auth(e) => e.user_message().to_string(),
        }
    }
}

/// Sign-in, sign-up and account management
pub struct AuthService<P: ?Sized, R: ?Sized> {
    identity: Arc<P>,
    profiles: Arc<R>,
    config: ClientConfig,
}

impl<P, R> AuthService<P, R>
where
    P: IdentityProvider + ?Sized,
    R: ProfileStore + ?Sized,
{
    pub fn new(identity: Arc<P>, profiles: Arc<R>, config: ClientConfig) -> Self {
        Self {
            identity,
            profiles,
            config,
        }
    }

    /// The signed-in principal, if any
    pub fn current(&self) -> Option<Principal> {
        self.identity.current_principal()
    }

    /// Sign in with email and password.
    ///
    /// Principals whose email is not verified are signed straight back out.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, SessionError> {
        let email = validate_email(email)?;
        validate_password_present(password)?;

        let principal = self
            .identity
            .sign_in(&email, password)
            .await
            .map_err(AuthError::from)?;

        if !principal.verified {
            if let Err(e) = self.identity.sign_out().await {
                warn!(error = %e, "failed to sign out unverified principal");
            }
            return Err(AuthError::EmailNotVerified.into());
        }

        info!(principal = %principal.id, "signed in");
        Ok(principal)
    }

    /// Create an account, write its profile, and send the verification email.
    ///
    /// The new principal is left signed out until the email is verified.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<Principal, SessionError> {
        let email = validate_email(email)?;
        validate_password_present(password)?;
        let username = validate_username(username, &self.config)?;
        self.ensure_username_available(&username).await?;

        let principal = self
            .identity
            .sign_up(&email, password)
            .await
            .map_err(AuthError::from)?;

        let profile = Profile::new(principal.id.clone(), username, principal.email.clone());
        self.profiles
            .put_profile(profile)
            .await
            .map_err(AuthError::from)?;

        if let Err(e) = self.identity.send_verification(&principal).await {
            warn!(error = %e, "failed to send verification email");
        }
        if let Err(e) = self.identity.sign_out().await {
            warn!(error = %e, "failed to sign out after sign-up");
        }

        info!(principal = %principal.id, "account created, awaiting verification");
        Ok(principal)
    }

    /// Case-insensitive availability check against existing profiles
    pub async fn ensure_username_available(&self, username: &str) -> Result<(), SessionError> {
        let existing = self
            .profiles
            .find_by_username(&username.to_lowercase())
            .await
            .map_err(AuthError::from)?;
        if !existing.is_empty() {
            debug!(username, "username taken");
            return Err(ValidationError::UsernameTaken(username.to_string()).into());
        }
        Ok(())
    }

    pub async fn sign_out(&self) -> Result<(), SessionError> {
        self.identity.sign_out().await.map_err(AuthError::from)?;
        info!("signed out");
        Ok(())
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<(), SessionError> {
        let email = validate_email(email)?;
        self.identity
            .send_password_reset(&email)
            .await
            .map_err(AuthError::from)?;
        Ok(())
    }

    pub async fn update_password(&self, new_password: &str) -> Result<(), SessionError> {
        validate_password_present(new_password)?;
        self.identity
            .update_password(new_password)
            .await
            .map_err(AuthError::from)?;
        info!("password updated");
        Ok(())
    }

    /// Delete the signed-in resident's profile and account.
    pub async fn delete_account(&self) -> Result<(), SessionError> {
        let principal = self.current().ok_or(AuthError::NotSignedIn)?;
        self.profiles
            .delete_profile(&principal.id)
            .await
            .map_err(AuthError::from)?;
        self.identity.delete_current().await.map_err(AuthError::from)?;
        info!(principal = %principal.id, "account deleted");
        Ok(())
    }

    /// Username from the resident's profile, for the account page
    pub async fn username_of(&self, id: &PrincipalId) -> Result<Option<String>, SessionError> {
        let profile = self.profiles.profile(id).await.map_err(AuthError::from)?;
        Ok(profile.map(|p| p.username))
    }
}

/// Shared building passcode login
pub struct PasscodeGate<S: ?Sized> {
    settings: Arc<S>,
}

impl<S: SettingsStore + ?Sized> PasscodeGate<S> {
    pub fn new(settings: Arc<S>) -> Self {
        Self { settings }
    }

    /// Check `input` against the configured passcode.
    ///
    /// A backend failure reads as a wrong passcode.
    pub async fn unlock(&self, input: &str) -> Result<(), SessionError> {
        if input.is_empty() {
            return Err(ValidationError::EmptyPassword.into());
        }
        match self.settings.building_passcode().await {
            Ok(Some(passcode)) if passcode == input => {
                info!("building passcode accepted");
                Ok(())
            }
            Ok(Some(_)) => Err(AuthError::IncorrectPasscode.into()),
            Ok(None) => Err(AuthError::PasscodeNotConfigured.into()),
            Err(e) => {
                warn!(error = %e, "passcode lookup failed");
                Err(AuthError::IncorrectPasscode.into())
            }
        }
    }
}
