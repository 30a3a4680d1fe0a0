//! AstraVaani - guidance chat client library
//!
//! This library provides the client side of the AstraVaani astrology and
//! numerology guidance service: the REST API client, authentication state,
//! multi-session chat with per-user local persistence, and the advisory usage
//! gate.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `api`: REST client and wire types
//! - `auth`: Authentication state and routing decisions
//! - `chat`: Chat sessions, the session store, the usage gate, and submission
//! - `storage`: Local key-value persistence
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: Command handlers
//!
//! # Example
//!
//! ```no_run
//! use astravaani::chat::{ChatController, SessionStore};
//! use astravaani::{ApiClient, Config};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let storage = astravaani::commands::open_storage(&config);
//!     let client = ApiClient::new(&config.api, Arc::clone(&storage))?;
//!     let user = client.me().await?;
//!
//!     let mut sessions = SessionStore::new(storage);
//!     sessions.load(&user.id);
//!     let mut chat = ChatController::new(sessions, true);
//!     chat.submit("What does this week hold for me?", &client, &client).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod storage;

// Re-export commonly used types
pub use api::{ApiClient, AuthEvent};
pub use auth::{AuthContext, RouteDecision};
pub use chat::{ChatController, ChatSession, Message, SessionStore, UsageGate};
pub use config::Config;
pub use error::{Result, VaaniError};
