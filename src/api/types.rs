//! Request and response bodies exchanged with the backend
//!
//! Field names follow the backend's snake_case JSON. Response types default
//! every field the backend may omit so that older or newer servers still parse.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Starter,
    Pro,
    Max,
}

impl Tier {
    /// Wire name of the tier
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Starter => "starter",
            Tier::Pro => "pro",
            Tier::Max => "max",
        }
    }

    /// Parse a tier name (case-insensitive)
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "free" => Some(Tier::Free),
            "starter" => Some(Tier::Starter),
            "pro" => Some(Tier::Pro),
            "max" => Some(Tier::Max),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
    Paused,
}

impl SubscriptionStatus {
    /// Parse a status name (case-insensitive)
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "cancelled" => Some(Self::Cancelled),
            "expired" => Some(Self::Expired),
            "paused" => Some(Self::Paused),
            _ => None,
        }
    }

    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::Paused => "paused",
        }
    }
}

/// Which discipline the guidance draws on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GuidanceMode {
    Astrology,
    Numerology,
    #[default]
    Both,
}

impl GuidanceMode {
    /// Wire name of the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            GuidanceMode::Astrology => "astrology",
            GuidanceMode::Numerology => "numerology",
            GuidanceMode::Both => "both",
        }
    }
}

/// Response language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
    #[default]
    #[serde(rename = "hinglish")]
    Hinglish,
}

impl Language {
    /// Wire name of the language
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Hinglish => "hinglish",
        }
    }
}

/// Tone of the generated answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStyle {
    Supportive,
    #[default]
    Balanced,
    Direct,
}

impl ResponseStyle {
    /// Wire name of the style
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStyle::Supportive => "supportive",
            ResponseStyle::Balanced => "balanced",
            ResponseStyle::Direct => "direct",
        }
    }
}

/// Delivery channel of a one-time password
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpChannel {
    Email,
    Phone,
}

/// What a one-time password is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    #[default]
    Signup,
    Login,
    PasswordReset,
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::parse_str(s).ok_or_else(|| format!("unknown tier '{}' (free, starter, pro, max)", s))
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubscriptionStatus::parse_str(s).ok_or_else(|| {
            format!(
                "unknown subscription status '{}' (active, cancelled, expired, paused)",
                s
            )
        })
    }
}

impl FromStr for GuidanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "astrology" => Ok(Self::Astrology),
            "numerology" => Ok(Self::Numerology),
            "both" => Ok(Self::Both),
            other => Err(format!(
                "unknown guidance mode '{}' (astrology, numerology, both)",
                other
            )),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Self::English),
            "hi" | "hindi" => Ok(Self::Hindi),
            "hinglish" => Ok(Self::Hinglish),
            other => Err(format!("unknown language '{}' (en, hi, hinglish)", other)),
        }
    }
}

impl FromStr for ResponseStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "supportive" => Ok(Self::Supportive),
            "balanced" => Ok(Self::Balanced),
            "direct" => Ok(Self::Direct),
            other => Err(format!(
                "unknown response style '{}' (supportive, balanced, direct)",
                other
            )),
        }
    }
}

impl FromStr for OtpChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            other => Err(format!("unknown OTP channel '{}' (email, phone)", other)),
        }
    }
}

impl FromStr for OtpPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "signup" => Ok(Self::Signup),
            "login" => Ok(Self::Login),
            "password_reset" => Ok(Self::PasswordReset),
            other => Err(format!(
                "unknown OTP purpose '{}' (signup, login, password-reset)",
                other
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendOtpRequest {
    pub target: String,
    #[serde(rename = "type")]
    pub channel: OtpChannel,
    pub purpose: OtpPurpose,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpRequest {
    pub target: String,
    pub code: String,
    #[serde(rename = "type")]
    pub channel: OtpChannel,
    pub purpose: OtpPurpose,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

/// Bearer token issued by login
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Generic acknowledgement returned by several endpoints
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub expires_in_minutes: Option<u32>,
}

/// The signed-in account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_phone_verified: bool,
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Birth and preference profile of the account holder
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub time_of_birth: Option<NaiveTime>,
    #[serde(default)]
    pub place_of_birth: Option<String>,
    #[serde(default)]
    pub guidance_mode: GuidanceMode,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub response_style: ResponseStyle,
    #[serde(default)]
    pub has_birth_time: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileCreate {
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub date_of_birth: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_birth: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_of_birth: Option<String>,
    pub guidance_mode: GuidanceMode,
    pub language: Language,
    pub response_style: ResponseStyle,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_birth: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_mode: Option<GuidanceMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_style: Option<ResponseStyle>,
}

// ---------------------------------------------------------------------------
// Guidance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<GuidanceMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    pub include_context: bool,
}

impl AskRequest {
    /// Question for the primary profile with default mode and language
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            profile_id: None,
            mode: None,
            language: None,
            include_context: true,
        }
    }
}

/// Outcome of the backend's answer validation pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationResult {
    pub passed: bool,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub was_regenerated: bool,
}

/// Answer to a guidance question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidanceResponse {
    #[serde(default)]
    pub empathy_line: String,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub caution: Option<String>,
    #[serde(default)]
    pub data_points_used: Vec<String>,
    #[serde(default)]
    pub validation: Option<ValidationResult>,
    pub full_response: String,
}

impl GuidanceResponse {
    /// Whether the answer passed validation; absent validation counts as passed
    pub fn validation_passed(&self) -> bool {
        self.validation.as_ref().map(|v| v.passed).unwrap_or(true)
    }
}

/// Server-side usage counters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageSnapshot {
    pub tier: Tier,
    #[serde(default)]
    pub daily_limit: u32,
    #[serde(default)]
    pub daily_used: u32,
    pub daily_remaining: u32,
    #[serde(default)]
    pub monthly_limit: u32,
    #[serde(default)]
    pub monthly_used: u32,
    pub monthly_remaining: u32,
    #[serde(default)]
    pub lifetime_limit: Option<u32>,
    #[serde(default)]
    pub lifetime_used: Option<u32>,
    #[serde(default)]
    pub lifetime_remaining: Option<u32>,
    #[serde(default)]
    pub max_response_chars: u32,
    pub can_ask_question: bool,
    #[serde(default)]
    pub limit_message: Option<String>,
    #[serde(default)]
    pub use_validator: bool,
    #[serde(default)]
    pub use_memory: bool,
}

/// Response of the pre-question usage check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageCheckResponse {
    pub allowed: bool,
    pub usage: UsageSnapshot,
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

/// Computed chart data the guidance is based on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSnapshot {
    pub id: String,
    pub mode: GuidanceMode,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub numerology_data: Option<serde_json::Value>,
    #[serde(default)]
    pub astrology_data: Option<serde_json::Value>,
    #[serde(default)]
    pub transit_data: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: String,
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub tier: Tier,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub current_period_start: Option<NaiveDate>,
    #[serde(default)]
    pub current_period_end: Option<NaiveDate>,
    #[serde(default)]
    pub price_display: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlanLimits {
    #[serde(default)]
    pub lifetime_questions: Option<u32>,
    #[serde(default)]
    pub monthly_questions: Option<u32>,
    #[serde(default)]
    pub daily_limit: Option<u32>,
    #[serde(default)]
    pub max_chars: Option<u32>,
}

/// One entry of the pricing table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub tier: Tier,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price_paise: u64,
    #[serde(default)]
    pub price_display: String,
    #[serde(default)]
    pub limits: PlanLimits,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub restrictions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PlansResponse {
    pub plans: Vec<Plan>,
}

/// Quick ask-permission check with upgrade suggestions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanAskResponse {
    pub can_ask: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub tier: Tier,
    #[serde(default)]
    pub should_upgrade: bool,
    #[serde(default)]
    pub upgrade_tiers: Vec<UpgradeSuggestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeSuggestion {
    pub tier: Tier,
    #[serde(default)]
    pub price_display: String,
}

/// Payment order handed to the third-party checkout widget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub order_id: String,
    pub amount: u64,
    pub currency: String,
    #[serde(default)]
    pub key_id: Option<String>,
    pub tier: Tier,
    #[serde(default)]
    pub tier_name: Option<String>,
    #[serde(default)]
    pub price_display: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentVerification {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

// ---------------------------------------------------------------------------
// Person profiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonProfileSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub nickname: Option<String>,
    pub relation_type: String,
    pub is_primary: bool,
    #[serde(default)]
    pub avatar_color: Option<String>,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub has_birth_time: bool,
    #[serde(default)]
    pub conversation_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonProfileList {
    pub profiles: Vec<PersonProfileSummary>,
    pub total: u32,
    pub max_profiles: u32,
}

impl PersonProfileList {
    /// Whether the plan allows one more profile
    pub fn can_add(&self) -> bool {
        self.total < self.max_profiles
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub nickname: Option<String>,
    pub relation_type: String,
    pub is_primary: bool,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub time_of_birth: Option<NaiveTime>,
    #[serde(default)]
    pub place_of_birth: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub has_birth_time: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub avatar_color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub conversation_count: u32,
    #[serde(default)]
    pub last_conversation_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonProfileCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    pub relation_type: String,
    pub date_of_birth: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_birth: Option<NaiveTime>,
    pub place_of_birth: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct PersonProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_birth: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierBreakdown {
    pub tier: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_users: u64,
    pub active_users_30d: u64,
    pub total_subscriptions: u64,
    pub active_subscriptions: u64,
    pub revenue_this_month_paise: u64,
    pub revenue_total_paise: u64,
    pub questions_today: u64,
    pub questions_this_month: u64,
    #[serde(default)]
    pub tier_breakdown: Vec<TierBreakdown>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    pub tier: String,
    pub status: String,
    pub is_active: bool,
    #[serde(default)]
    pub questions_used_monthly: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserList {
    pub users: Vec<AdminUser>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSubscription {
    pub id: String,
    pub user_email: String,
    #[serde(default)]
    pub user_name: Option<String>,
    pub tier: String,
    pub status: String,
    pub amount_paise: u64,
    #[serde(default)]
    pub razorpay_payment_id: Option<String>,
    #[serde(default)]
    pub current_period_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSubscriptionList {
    pub subscriptions: Vec<AdminSubscription>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeTierResponse {
    pub success: bool,
    pub message: String,
    pub new_tier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleActiveResponse {
    pub success: bool,
    pub is_active: bool,
}

/// Filters for the admin user listing
#[derive(Debug, Clone, Default)]
pub struct AdminUserQuery {
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
    pub tier: Option<Tier>,
}

/// Filters for the admin subscription listing
#[derive(Debug, Clone, Default)]
pub struct AdminSubscriptionQuery {
    pub page: u32,
    pub page_size: u32,
    pub status: Option<SubscriptionStatus>,
    pub tier: Option<Tier>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parse_and_display() {
        assert_eq!(Tier::parse_str("PRO"), Some(Tier::Pro));
        assert_eq!(Tier::parse_str(" max "), Some(Tier::Max));
        assert_eq!(Tier::parse_str("gold"), None);
        assert_eq!(Tier::Starter.to_string(), "starter");
    }

    #[test]
    fn test_enums_parse_from_cli_strings() {
        assert_eq!("Hindi".parse::<Language>().unwrap(), Language::Hindi);
        assert_eq!("direct".parse::<ResponseStyle>().unwrap(), ResponseStyle::Direct);
        assert_eq!(
            "password-reset".parse::<OtpPurpose>().unwrap(),
            OtpPurpose::PasswordReset
        );
        assert!("tarot".parse::<GuidanceMode>().is_err());
        assert!("gold".parse::<Tier>().is_err());
    }

    #[test]
    fn test_language_wire_names() {
        assert_eq!(serde_json::to_string(&Language::English).unwrap(), "\"en\"");
        assert_eq!(
            serde_json::from_str::<Language>("\"hinglish\"").unwrap(),
            Language::Hinglish
        );
    }

    #[test]
    fn test_send_otp_request_uses_type_field() {
        let req = SendOtpRequest {
            target: "a@b.com".into(),
            channel: OtpChannel::Email,
            purpose: OtpPurpose::PasswordReset,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "email");
        assert_eq!(json["purpose"], "password_reset");
    }

    #[test]
    fn test_guidance_response_validation_defaults_to_passed() {
        let resp: GuidanceResponse = serde_json::from_str(
            r#"{"full_response": "Namaste", "data_points_used": ["sun_sign"]}"#,
        )
        .unwrap();
        assert!(resp.validation_passed());
        assert_eq!(resp.data_points_used, vec!["sun_sign".to_string()]);

        let failed: GuidanceResponse = serde_json::from_str(
            r#"{"full_response": "x", "validation": {"passed": false, "issues": ["made up"]}}"#,
        )
        .unwrap();
        assert!(!failed.validation_passed());
    }

    #[test]
    fn test_usage_check_response_parses_backend_shape() {
        let body = r#"{
            "allowed": false,
            "usage": {
                "tier": "free",
                "daily_limit": 3, "daily_used": 3, "daily_remaining": 0,
                "monthly_limit": 10, "monthly_used": 5, "monthly_remaining": 5,
                "lifetime_limit": 10, "lifetime_used": 5, "lifetime_remaining": 5,
                "max_response_chars": 400,
                "can_ask_question": false,
                "limit_message": "Daily limit reached, try again tomorrow"
            },
            "message": "Daily limit reached, try again tomorrow"
        }"#;
        let resp: UsageCheckResponse = serde_json::from_str(body).unwrap();
        assert!(!resp.allowed);
        assert_eq!(resp.usage.tier, Tier::Free);
        assert_eq!(resp.usage.lifetime_remaining, Some(5));
        assert!(!resp.usage.use_memory);
    }

    #[test]
    fn test_profile_update_skips_unset_fields() {
        let update = ProfileUpdate {
            language: Some(Language::Hindi),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"language": "hi"}));
    }

    #[test]
    fn test_person_profile_list_can_add() {
        let list = PersonProfileList {
            profiles: vec![],
            total: 3,
            max_profiles: 3,
        };
        assert!(!list.can_add());
    }
}
