//! Authentication state
//!
//! [`AuthContext`] is the single answer to "is someone signed in, and have they
//! finished onboarding?". Every command that needs an account asks it for a
//! [`RouteDecision`] before doing anything else.

use crate::api::types::{Profile, User};
use crate::api::{ApiClient, AuthEvent};
use crate::error::{find_vaani_error, Result, VaaniError};
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Where a protected command should go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Authentication state is still being resolved
    Wait,
    /// No valid session; sign in first
    Login,
    /// Signed in without a birth profile; onboard first
    Onboard,
    /// Signed in and onboarded
    Proceed,
}

/// Process-wide authentication state
pub struct AuthContext {
    client: ApiClient,
    events: broadcast::Receiver<AuthEvent>,
    loading: bool,
    user: Option<User>,
    profile: Option<Profile>,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("loading", &self.loading)
            .field("user", &self.user)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

impl AuthContext {
    /// Context over `client`, not yet initialized
    pub fn new(client: ApiClient) -> Self {
        let events = client.subscribe();
        Self {
            client,
            events,
            loading: true,
            user: None,
            profile: None,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn has_profile(&self) -> bool {
        self.profile.is_some()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Resolve state from the stored token
    ///
    /// # Errors
    ///
    /// Returns transport or server errors other than 401; state is left
    /// unauthenticated in that case.
    pub async fn initialize(&mut self) -> Result<()> {
        self.loading = true;
        let result = if self.client.token().is_some() {
            self.refresh_user().await
        } else {
            tracing::debug!("No stored token");
            self.reset();
            Ok(())
        };
        self.loading = false;
        result
    }

    /// Re-fetch the account and its profile
    ///
    /// A missing profile is not an error. A rejected token resets the context.
    pub async fn refresh_user(&mut self) -> Result<()> {
        let user = match self.client.me().await {
            Ok(user) => user,
            Err(e) if is_unauthorized(&e) => {
                self.reset();
                return Ok(());
            }
            Err(e) => {
                self.reset();
                return Err(e);
            }
        };

        let profile = match self.client.get_profile().await {
            Ok(profile) => Some(profile),
            Err(e) => match find_vaani_error(&e) {
                Some(VaaniError::NotFound(_)) => None,
                Some(VaaniError::Unauthorized(_)) => {
                    self.reset();
                    return Ok(());
                }
                _ => return Err(e),
            },
        };

        tracing::debug!(
            user = %user.email,
            has_profile = profile.is_some(),
            "Authentication state refreshed"
        );
        self.user = Some(user);
        self.profile = profile;
        // Expiry notices raised during this refresh are already reflected.
        self.drain_events();
        Ok(())
    }

    /// Sign in and load the account
    pub async fn login(&mut self, email: &str, password: &str) -> Result<()> {
        self.client.login(email, password).await?;
        self.refresh_user().await
    }

    /// Sign in with a Google identity credential and load the account
    pub async fn login_with_google(&mut self, credential: &str) -> Result<()> {
        self.client.google_auth(credential).await?;
        self.refresh_user().await
    }

    /// Sign out
    ///
    /// The backend is told best-effort; local state is always cleared.
    pub async fn logout(&mut self) {
        if let Err(e) = self.client.logout().await {
            tracing::debug!("Backend logout failed: {}", e);
        }
        self.reset();
    }

    /// Decide where a protected command should go
    pub fn route(&mut self) -> RouteDecision {
        if self.drain_events() {
            self.reset();
        }

        if self.loading {
            RouteDecision::Wait
        } else if !self.is_authenticated() {
            RouteDecision::Login
        } else if !self.has_profile() {
            RouteDecision::Onboard
        } else {
            RouteDecision::Proceed
        }
    }

    /// Mark that a profile now exists, after onboarding
    pub fn set_profile(&mut self, profile: Profile) {
        self.profile = Some(profile);
    }

    /// Consume pending auth events; true if the session expired
    fn drain_events(&mut self) -> bool {
        let mut expired = false;
        loop {
            match self.events.try_recv() {
                Ok(AuthEvent::SessionExpired) => expired = true,
                Err(TryRecvError::Lagged(_)) => expired = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if expired {
            tracing::info!("Session expired; signed out");
        }
        expired
    }

    fn reset(&mut self) {
        self.user = None;
        self.profile = None;
    }
}

fn is_unauthorized(err: &anyhow::Error) -> bool {
    matches!(find_vaani_error(err), Some(VaaniError::Unauthorized(_)))
}
