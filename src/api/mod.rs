//! REST client for the AstraVaani backend
//!
//! [`ApiClient`] exposes one async method per backend operation. Every request
//! carries the bearer token found in the local store. A 401 from any endpoint
//! clears that token and broadcasts [`AuthEvent::SessionExpired`] so whichever
//! part of the program is listening can send the user back to login.

use crate::config::ApiConfig;
use crate::error::{Result, VaaniError};
use crate::storage::{keys, KeyValueStore};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use url::Url;

pub mod types;

use types::*;

/// Authentication state changes raised by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// The backend rejected the stored token; it has been removed
    SessionExpired,
}

/// HTTP client for the backend API
///
/// # Examples
///
/// ```no_run
/// use astravaani::api::ApiClient;
/// use astravaani::config::ApiConfig;
/// use astravaani::storage::MemoryStore;
/// use std::sync::Arc;
///
/// # async fn example() -> astravaani::error::Result<()> {
/// let client = ApiClient::new(&ApiConfig::default(), Arc::new(MemoryStore::new()))?;
/// let token = client.login("me@example.com", "secret-password").await?;
/// println!("logged in with {} token", token.token_type);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
    store: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<AuthEvent>,
}

impl ApiClient {
    /// Create a client for the configured backend
    ///
    /// # Errors
    ///
    /// Returns `VaaniError::Config` for an unusable base URL and
    /// `VaaniError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let base = Url::parse(&format!(
            "{}/api/v1/",
            config.base_url.trim_end_matches('/')
        ))
        .map_err(|e| VaaniError::Config(format!("Invalid API base URL: {}", e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("astravaani/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let (events, _) = broadcast::channel(16);

        tracing::debug!("Initialized API client for {}", base);

        Ok(Self {
            client,
            base,
            store,
            events,
        })
    }

    /// Subscribe to authentication events
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// The local store backing the token (and chat sessions)
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    /// Currently stored bearer token
    pub fn token(&self) -> Option<String> {
        match self.store.get(keys::TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read stored token: {}", e);
                None
            }
        }
    }

    /// Persist a bearer token for later requests
    pub fn set_token(&self, token: &str) -> Result<()> {
        self.store.set(keys::TOKEN, token)
    }

    /// Forget the stored bearer token
    pub fn clear_token(&self) {
        if let Err(e) = self.store.remove(keys::TOKEN) {
            tracing::warn!("Failed to clear stored token: {}", e);
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| VaaniError::Config(format!("Invalid endpoint {}: {}", path, e)).into())
    }

    /// `path` followed by caller-supplied `segments`
    ///
    /// Each segment is percent-encoded as a single path segment, so an id
    /// containing `/` or `?` cannot address a different endpoint.
    fn endpoint_with(&self, path: &str, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|_| VaaniError::Config(format!("Invalid endpoint {}", path)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        Ok(self.request_to(method, self.endpoint(path)?))
    }

    fn request_to(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response> {
        let response = builder.send().await.map_err(|e| {
            tracing::warn!("Backend request failed: {}", e);
            VaaniError::Http(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!("Backend returned {}: {}", status, body);
        Err(self.classify_failure(status, &body).into())
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        response.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to parse backend response: {}", e);
            VaaniError::Api {
                status: 200,
                message: format!("Unexpected response format: {}", e),
            }
            .into()
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(self.request(Method::GET, path)?).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(self.request(Method::POST, path)?.json(body)).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(self.request(Method::POST, path)?).await
    }

    async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(self.request(Method::PATCH, path)?.json(body)).await
    }

    fn classify_failure(&self, status: StatusCode, body: &str) -> VaaniError {
        let message = extract_error_message(body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

        match status {
            StatusCode::UNAUTHORIZED => {
                self.handle_unauthorized();
                VaaniError::Unauthorized(message)
            }
            StatusCode::TOO_MANY_REQUESTS | StatusCode::PAYMENT_REQUIRED => {
                VaaniError::QuotaExceeded(message)
            }
            StatusCode::BAD_REQUEST | StatusCode::FORBIDDEN
                if message.to_lowercase().contains("limit") =>
            {
                VaaniError::QuotaExceeded(message)
            }
            StatusCode::NOT_FOUND => VaaniError::NotFound(message),
            StatusCode::UNPROCESSABLE_ENTITY => VaaniError::Validation(message),
            _ => VaaniError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    fn handle_unauthorized(&self) {
        tracing::warn!("Backend rejected credentials; clearing stored token");
        self.clear_token();
        // No receivers is fine: nobody is waiting on auth changes.
        let _ = self.events.send(AuthEvent::SessionExpired);
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    /// Create an account
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        phone_number: Option<&str>,
    ) -> Result<User> {
        let body = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            phone_number: phone_number.map(str::to_string),
        };
        self.post("auth/register", &body).await
    }

    /// Ask the backend to send a one-time password
    pub async fn send_otp(
        &self,
        target: &str,
        channel: OtpChannel,
        purpose: OtpPurpose,
    ) -> Result<MessageResponse> {
        let body = SendOtpRequest {
            target: target.to_string(),
            channel,
            purpose,
        };
        self.post("auth/send-otp", &body).await
    }

    /// Confirm a one-time password
    pub async fn verify_otp(
        &self,
        target: &str,
        code: &str,
        channel: OtpChannel,
        purpose: OtpPurpose,
    ) -> Result<MessageResponse> {
        let body = VerifyOtpRequest {
            target: target.to_string(),
            code: code.to_string(),
            channel,
            purpose,
        };
        self.post("auth/verify-otp", &body).await
    }

    /// Exchange credentials for a bearer token and store it
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let token: TokenResponse = self.post("auth/login", &body).await?;
        self.set_token(&token.access_token)?;
        tracing::info!("Logged in as {}", email);
        Ok(token)
    }

    /// Sign in with a Google identity credential and store the token
    pub async fn google_auth(&self, credential: &str) -> Result<TokenResponse> {
        let body = serde_json::json!({ "credential": credential });
        let token: TokenResponse = self.post("auth/google", &body).await?;
        self.set_token(&token.access_token)?;
        Ok(token)
    }

    /// Tell the backend the session ended and drop the local token
    ///
    /// The token is removed even if the backend call fails.
    pub async fn logout(&self) -> Result<()> {
        let result: Result<MessageResponse> = self.post_empty("auth/logout").await;
        self.clear_token();
        result.map(|_| ())
    }

    /// Start a password reset
    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse> {
        let body = serde_json::json!({ "email": email });
        self.post("auth/forgot-password", &body).await
    }

    /// Complete a password reset with the emailed code
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<MessageResponse> {
        let body = ResetPasswordRequest {
            email: email.to_string(),
            code: code.to_string(),
            new_password: new_password.to_string(),
        };
        self.post("auth/reset-password", &body).await
    }

    // -----------------------------------------------------------------------
    // Users and profile
    // -----------------------------------------------------------------------

    /// The signed-in account
    pub async fn me(&self) -> Result<User> {
        self.get("users/me").await
    }

    /// Primary profile; `VaaniError::NotFound` before onboarding
    pub async fn get_profile(&self) -> Result<Profile> {
        self.get("users/profile").await
    }

    pub async fn create_profile(&self, profile: &ProfileCreate) -> Result<Profile> {
        self.post("users/profile", profile).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile> {
        self.patch("users/profile", update).await
    }

    // -----------------------------------------------------------------------
    // Guidance
    // -----------------------------------------------------------------------

    /// Ask a guidance question
    pub async fn ask(&self, request: &AskRequest) -> Result<GuidanceResponse> {
        tracing::debug!("Asking guidance question ({} chars)", request.question.len());
        self.post("guidance/ask", request).await
    }

    /// Pre-question usage check
    pub async fn check_usage(&self) -> Result<UsageCheckResponse> {
        self.get("guidance/check-usage").await
    }

    /// Past guidance conversations, newest first
    pub async fn guidance_history(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<serde_json::Value>> {
        let builder = self
            .request(Method::GET, "guidance/history")?
            .query(&[("limit", limit), ("offset", offset)]);
        self.send_json(builder).await
    }

    // -----------------------------------------------------------------------
    // Charts
    // -----------------------------------------------------------------------

    pub async fn current_chart(&self) -> Result<ChartSnapshot> {
        self.get("charts/current").await
    }

    pub async fn recompute_chart(&self, mode: GuidanceMode) -> Result<ChartSnapshot> {
        let builder = self
            .request(Method::POST, "charts/recompute")?
            .query(&[("mode", mode.as_str())]);
        self.send_json(builder).await
    }

    /// Prose explanation of one chart data point
    pub async fn explain_data_point(&self, data_point: &str) -> Result<serde_json::Value> {
        let url = self.endpoint_with("charts/explain", &[data_point])?;
        self.send_json(self.request_to(Method::GET, url)).await
    }

    pub async fn transits(&self) -> Result<serde_json::Value> {
        self.get("charts/transits").await
    }

    pub async fn planet_info(&self, planet: &str) -> Result<serde_json::Value> {
        let url = self.endpoint_with("charts/planet-info", &[&planet.to_lowercase()])?;
        self.send_json(self.request_to(Method::GET, url)).await
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    pub async fn current_subscription(&self) -> Result<Subscription> {
        self.get("subscriptions/current").await
    }

    pub async fn usage_status(&self) -> Result<UsageSnapshot> {
        self.get("subscriptions/usage").await
    }

    pub async fn plans(&self) -> Result<Vec<Plan>> {
        let response: PlansResponse = self.get("subscriptions/plans").await?;
        Ok(response.plans)
    }

    pub async fn can_ask(&self) -> Result<CanAskResponse> {
        self.get("subscriptions/can-ask").await
    }

    /// Create a payment order for `tier`
    pub async fn upgrade(&self, tier: Tier) -> Result<PaymentOrder> {
        if tier == Tier::Free {
            return Err(VaaniError::Validation("Cannot upgrade to the free tier".into()).into());
        }
        let url = self.endpoint_with("subscriptions/upgrade", &[&tier.to_string()])?;
        self.send_json(self.request_to(Method::POST, url)).await
    }

    /// Confirm a completed checkout
    pub async fn verify_payment(
        &self,
        verification: &PaymentVerification,
    ) -> Result<serde_json::Value> {
        self.post("subscriptions/verify-payment", verification).await
    }

    pub async fn cancel_subscription(&self) -> Result<serde_json::Value> {
        self.post_empty("subscriptions/cancel").await
    }

    // -----------------------------------------------------------------------
    // Person profiles
    // -----------------------------------------------------------------------

    pub async fn list_people(&self) -> Result<PersonProfileList> {
        self.get("person-profiles").await
    }

    pub async fn get_person(&self, id: &str) -> Result<PersonProfile> {
        let url = self.endpoint_with("person-profiles", &[id])?;
        self.send_json(self.request_to(Method::GET, url)).await
    }

    pub async fn create_person(&self, profile: &PersonProfileCreate) -> Result<PersonProfile> {
        self.post("person-profiles", profile).await
    }

    pub async fn update_person(
        &self,
        id: &str,
        update: &PersonProfileUpdate,
    ) -> Result<PersonProfile> {
        let url = self.endpoint_with("person-profiles", &[id])?;
        self.send_json(self.request_to(Method::PATCH, url).json(update)).await
    }

    pub async fn delete_person(&self, id: &str) -> Result<()> {
        let url = self.endpoint_with("person-profiles", &[id])?;
        self.send(self.request_to(Method::DELETE, url)).await?;
        Ok(())
    }

    pub async fn set_primary_person(&self, id: &str) -> Result<PersonProfile> {
        let url = self.endpoint_with("person-profiles", &[id, "set-primary"])?;
        self.send_json(self.request_to(Method::POST, url)).await
    }

    // -----------------------------------------------------------------------
    // Admin
    // -----------------------------------------------------------------------

    pub async fn admin_stats(&self) -> Result<AdminStats> {
        self.get("admin/stats").await
    }

    pub async fn admin_users(&self, query: &AdminUserQuery) -> Result<AdminUserList> {
        let mut params: Vec<(&str, String)> = vec![
            ("page", query.page.max(1).to_string()),
            ("page_size", query.page_size.clamp(1, 100).to_string()),
        ];
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        if let Some(tier) = query.tier {
            params.push(("tier", tier.to_string()));
        }
        let builder = self.request(Method::GET, "admin/users")?.query(&params);
        self.send_json(builder).await
    }

    pub async fn admin_change_tier(&self, user_id: &str, tier: Tier) -> Result<ChangeTierResponse> {
        let body = serde_json::json!({ "tier": tier });
        let url = self.endpoint_with("admin/users", &[user_id, "change-tier"])?;
        self.send_json(self.request_to(Method::POST, url).json(&body)).await
    }

    pub async fn admin_toggle_active(&self, user_id: &str) -> Result<ToggleActiveResponse> {
        let url = self.endpoint_with("admin/users", &[user_id, "toggle-active"])?;
        self.send_json(self.request_to(Method::POST, url)).await
    }

    pub async fn admin_subscriptions(
        &self,
        query: &AdminSubscriptionQuery,
    ) -> Result<AdminSubscriptionList> {
        let mut params: Vec<(&str, String)> = vec![
            ("page", query.page.max(1).to_string()),
            ("page_size", query.page_size.clamp(1, 100).to_string()),
        ];
        if let Some(status) = query.status {
            params.push(("status_filter", status.as_str().to_string()));
        }
        if let Some(tier) = query.tier {
            params.push(("tier_filter", tier.to_string()));
        }
        let builder = self
            .request(Method::GET, "admin/subscriptions")?
            .query(&params);
        self.send_json(builder).await
    }
}

/// Pull a human-readable message out of a backend error body
///
/// Understands `{"detail": "..."}`, the validation shape
/// `{"detail": [{"msg": "..."}, ...]}` (messages joined with `", "`), and
/// `{"message": "..."}`. Falls back to the raw body when it is short plain text.
pub fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let value: serde_json::Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(_) => {
            return if trimmed.len() <= 200 && !trimmed.starts_with('<') {
                Some(trimmed.to_string())
            } else {
                None
            };
        }
    };

    match value.get("detail") {
        Some(serde_json::Value::String(s)) => return Some(s.clone()),
        Some(serde_json::Value::Array(items)) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(s) => Some(s.clone()),
                    other => other
                        .get("msg")
                        .and_then(|m| m.as_str())
                        .map(str::to_string),
                })
                .collect();
            if !messages.is_empty() {
                return Some(messages.join(", "));
            }
        }
        _ => {}
    }

    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
}
