//! Advisory usage gate
//!
//! Tracks the remaining-question counters reported by the backend and decides
//! whether the chat should accept another question. The backend enforces the
//! real limits; this gate only keeps the UI from offering questions that will
//! be refused.

use crate::api::types::{Tier, UsageCheckResponse};
use crate::api::ApiClient;
use crate::error::Result;
use async_trait::async_trait;

/// Shown when the gate closes without a server-provided reason
pub const DEFAULT_LIMIT_MESSAGE: &str =
    "You've used all of your questions for now. Upgrade your plan to keep asking.";

/// Source of authoritative usage counters
#[async_trait]
pub trait UsageSource: Send + Sync {
    /// Fetch the current counters
    async fn check_usage(&self) -> Result<UsageCheckResponse>;
}

#[async_trait]
impl UsageSource for ApiClient {
    async fn check_usage(&self) -> Result<UsageCheckResponse> {
        ApiClient::check_usage(self).await
    }
}

/// Snapshot of the counters the gate decides on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageStatus {
    pub tier: Tier,
    pub daily_remaining: u32,
    pub monthly_remaining: u32,
    /// Only tracked on the free tier
    pub lifetime_remaining: Option<u32>,
    pub can_ask: bool,
    pub limit_message: Option<String>,
}

impl UsageStatus {
    /// Questions left before the binding limit is hit
    ///
    /// Free accounts are bound by their lifetime allowance alone; the backend
    /// reports zero daily and monthly counters for them.
    ///
    /// # Examples
    ///
    /// ```
    /// use astravaani::api::types::Tier;
    /// use astravaani::chat::UsageStatus;
    ///
    /// let status = UsageStatus {
    ///     tier: Tier::Free,
    ///     daily_remaining: 0,
    ///     monthly_remaining: 0,
    ///     lifetime_remaining: Some(2),
    ///     can_ask: true,
    ///     limit_message: None,
    /// };
    /// assert_eq!(status.remaining(), 2);
    /// ```
    pub fn remaining(&self) -> u32 {
        match (self.tier, self.lifetime_remaining) {
            (Tier::Free, Some(lifetime)) => lifetime,
            _ => self.daily_remaining.min(self.monthly_remaining),
        }
    }
}

impl From<UsageCheckResponse> for UsageStatus {
    fn from(response: UsageCheckResponse) -> Self {
        let usage = response.usage;
        let can_ask = response.allowed && usage.can_ask_question;
        Self {
            tier: usage.tier,
            daily_remaining: usage.daily_remaining,
            monthly_remaining: usage.monthly_remaining,
            lifetime_remaining: usage.lifetime_remaining,
            can_ask,
            limit_message: usage.limit_message.or(response.message),
        }
    }
}

/// Remaining-question bookkeeping for the chat
///
/// Starts out unknown, which permits asking, until the first successful
/// [`UsageGate::refresh`].
#[derive(Debug, Default)]
pub struct UsageGate {
    status: Option<UsageStatus>,
}

impl UsageGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest known counters, if any refresh has succeeded
    pub fn status(&self) -> Option<&UsageStatus> {
        self.status.as_ref()
    }

    /// Whether another question should be offered
    pub fn can_ask(&self) -> bool {
        self.status.as_ref().map(|s| s.can_ask).unwrap_or(true)
    }

    /// Reason the gate is closed
    pub fn limit_message(&self) -> Option<&str> {
        self.status
            .as_ref()
            .filter(|s| !s.can_ask)
            .map(|s| s.limit_message.as_deref().unwrap_or(DEFAULT_LIMIT_MESSAGE))
    }

    /// Replace all counters with the server's view
    ///
    /// # Errors
    ///
    /// Propagates the source's error; the previous state is kept.
    pub async fn refresh(&mut self, source: &dyn UsageSource) -> Result<()> {
        let response = source.check_usage().await?;
        let status = UsageStatus::from(response);
        tracing::debug!(
            tier = %status.tier,
            remaining = status.remaining(),
            can_ask = status.can_ask,
            "Usage refreshed"
        );
        self.status = Some(status);
        Ok(())
    }

    /// Local estimate after a question when the server could not be asked
    ///
    /// Decrements every counter by one (never below zero) and keeps one
    /// question of slack: the gate stays open only if more than one question
    /// was left before this one. A closed gate is never reopened here.
    pub fn optimistic_decrement(&mut self) {
        let Some(status) = self.status.as_mut() else {
            return;
        };

        let before = status.remaining();
        status.daily_remaining = status.daily_remaining.saturating_sub(1);
        status.monthly_remaining = status.monthly_remaining.saturating_sub(1);
        if status.tier == Tier::Free {
            status.lifetime_remaining = status.lifetime_remaining.map(|n| n.saturating_sub(1));
        }

        status.can_ask = status.can_ask && before > 1;
        if !status.can_ask && status.limit_message.is_none() {
            status.limit_message = Some(DEFAULT_LIMIT_MESSAGE.to_string());
        }

        tracing::debug!(
            remaining = status.remaining(),
            can_ask = status.can_ask,
            "Usage estimated locally"
        );
    }

    /// Re-evaluate after a question, successful or not
    pub async fn after_question(&mut self, source: &dyn UsageSource) {
        if let Err(e) = self.refresh(source).await {
            tracing::warn!("Usage refresh failed, estimating locally: {}", e);
            self.optimistic_decrement();
        }
    }

    /// Close the gate after the backend refused a question for quota reasons
    pub fn mark_exhausted(&mut self, message: impl Into<String>) {
        let message = message.into();
        match self.status.as_mut() {
            Some(status) => {
                status.can_ask = false;
                status.limit_message = Some(message);
            }
            None => {
                self.status = Some(UsageStatus {
                    tier: Tier::default(),
                    daily_remaining: 0,
                    monthly_remaining: 0,
                    lifetime_remaining: None,
                    can_ask: false,
                    limit_message: Some(message),
                });
            }
        }
    }
}
