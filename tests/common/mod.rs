use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use astravaani::api::ApiClient;
use astravaani::config::{ApiConfig, Config};
use astravaani::storage::{KeyValueStore, MemoryStore};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::MockServer;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

#[allow(dead_code)]
pub fn api_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        base_url: server.uri(),
        timeout_seconds: 5,
    }
}

#[allow(dead_code)]
pub fn config_for(server: &MockServer) -> Config {
    Config {
        api: api_config(server),
        ..Config::default()
    }
}

/// Client against the mock server over a fresh in-memory store
#[allow(dead_code)]
pub fn client_for(server: &MockServer) -> (ApiClient, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let client =
        ApiClient::new(&api_config(server), store.clone()).expect("failed to build api client");
    (client, store)
}

/// Client over an existing store
#[allow(dead_code)]
pub fn client_with_store(server: &MockServer, store: Arc<dyn KeyValueStore>) -> ApiClient {
    ApiClient::new(&api_config(server), store).expect("failed to build api client")
}

/// Backend path for an API endpoint
#[allow(dead_code)]
pub fn api_path(endpoint: &str) -> String {
    format!("/api/v1/{}", endpoint)
}

#[allow(dead_code)]
pub fn user_json(id: &str, email: &str) -> Value {
    json!({
        "id": id,
        "email": email,
        "is_active": true,
        "is_verified": true,
        "is_phone_verified": false
    })
}

#[allow(dead_code)]
pub fn profile_json(full_name: &str) -> Value {
    json!({
        "id": "profile-1",
        "full_name": full_name,
        "date_of_birth": "1992-08-14",
        "time_of_birth": "06:45:00",
        "place_of_birth": "Jaipur",
        "guidance_mode": "both",
        "language": "hinglish",
        "response_style": "balanced",
        "has_birth_time": true
    })
}

/// `guidance/check-usage` body for a paid tier
#[allow(dead_code)]
pub fn usage_json(tier: &str, daily: u32, monthly: u32, allowed: bool) -> Value {
    json!({
        "allowed": allowed,
        "usage": {
            "tier": tier,
            "daily_limit": 10,
            "daily_used": 10 - daily.min(10),
            "daily_remaining": daily,
            "monthly_limit": 100,
            "monthly_used": 100 - monthly.min(100),
            "monthly_remaining": monthly,
            "lifetime_limit": Value::Null,
            "lifetime_used": Value::Null,
            "lifetime_remaining": Value::Null,
            "max_response_chars": 800,
            "can_ask_question": allowed,
            "limit_message": if allowed { Value::Null } else { json!("Daily limit reached") }
        },
        "message": Value::Null
    })
}

/// `guidance/check-usage` body for a free account
///
/// Free accounts only have a lifetime allowance; the periodic counters are zero.
#[allow(dead_code)]
pub fn free_usage_json(lifetime: u32, allowed: bool) -> Value {
    json!({
        "allowed": allowed,
        "usage": {
            "tier": "free",
            "daily_limit": 0,
            "daily_used": 0,
            "daily_remaining": 0,
            "monthly_limit": 0,
            "monthly_used": 0,
            "monthly_remaining": 0,
            "lifetime_limit": 2,
            "lifetime_used": 2 - lifetime.min(2),
            "lifetime_remaining": lifetime,
            "max_response_chars": 500,
            "can_ask_question": allowed,
            "limit_message": if allowed {
                Value::Null
            } else {
                json!("You've used your free questions")
            }
        },
        "message": Value::Null
    })
}

#[allow(dead_code)]
pub fn guidance_json(full_response: &str) -> Value {
    json!({
        "empathy_line": "I can see why this is on your mind.",
        "reasons": ["Saturn is transiting your tenth house"],
        "direction": "Take the measured path this month.",
        "caution": null,
        "data_points_used": ["sun_sign", "current_dasha"],
        "validation": { "passed": true, "issues": [], "was_regenerated": false },
        "full_response": full_response
    })
}
