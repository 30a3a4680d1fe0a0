/*!
Command handlers for the CLI

This module provides the handlers invoked by the CLI entrypoint:

- `chat`    : Interactive multi-session guidance chat
- `account` : Sign-in, registration, and password recovery
- `sessions`: Locally saved chat sessions
- `plans`   : Usage, plans, upgrades, and guidance history
- `profile` : The account's birth profile and saved person profiles
- `chart`   : Computed chart data
- `admin`   : Admin console

Every handler receives an [`AppContext`] holding the configuration, the
local store, and the API client.
*/

use crate::api::ApiClient;
use crate::auth::{AuthContext, RouteDecision};
use crate::chat::SessionStore;
use crate::config::Config;
use crate::error::{find_vaani_error, Result, VaaniError};
use crate::storage::{KeyValueStore, MemoryStore, SledStore};
use colored::Colorize;
use std::sync::Arc;

pub mod account;
pub mod admin;
pub mod chart;
pub mod plans;
pub mod profile;
pub mod sessions;
pub mod special_commands;
pub mod validation;

/// Shared state for command handlers
pub struct AppContext {
    pub config: Config,
    pub storage: Arc<dyn KeyValueStore>,
    pub client: ApiClient,
}

impl AppContext {
    /// Open local storage and build the API client
    ///
    /// # Errors
    ///
    /// Returns error if the API client cannot be constructed
    pub fn new(config: Config) -> Result<Self> {
        let storage = open_storage(&config);
        Self::with_storage(config, storage)
    }

    /// Build a context over an already-open store
    pub fn with_storage(config: Config, storage: Arc<dyn KeyValueStore>) -> Result<Self> {
        let client = ApiClient::new(&config.api, Arc::clone(&storage))?;
        Ok(Self {
            config,
            storage,
            client,
        })
    }

    /// Resolve authentication and insist on a signed-in account
    ///
    /// With `need_profile`, also insist that onboarding is done.
    ///
    /// # Errors
    ///
    /// Returns `VaaniError::Unauthorized` when nobody is signed in and
    /// `VaaniError::Validation` when a required profile is missing.
    pub async fn require_account(&self, need_profile: bool) -> Result<AuthContext> {
        let mut auth = AuthContext::new(self.client.clone());
        auth.initialize().await?;

        match auth.route() {
            RouteDecision::Wait | RouteDecision::Login => Err(VaaniError::Unauthorized(
                "You are not signed in. Run `astravaani login` first.".to_string(),
            )
            .into()),
            RouteDecision::Onboard if need_profile => Err(VaaniError::Validation(
                "Finish onboarding first: `astravaani profile create --help`".to_string(),
            )
            .into()),
            RouteDecision::Onboard | RouteDecision::Proceed => Ok(auth),
        }
    }

    /// Session store loaded for the signed-in user
    pub fn session_store(&self, auth: &AuthContext) -> Result<SessionStore> {
        let user = auth.user().ok_or_else(|| {
            VaaniError::Unauthorized("You are not signed in. Run `astravaani login` first.".into())
        })?;
        let mut store = SessionStore::new(Arc::clone(&self.storage));
        store.load(&user.id);
        Ok(store)
    }
}

/// Open the on-disk store, falling back to memory
///
/// Chats then only last for this run.
pub fn open_storage(config: &Config) -> Arc<dyn KeyValueStore> {
    let opened = match &config.storage.path {
        Some(path) => SledStore::open(path),
        None => SledStore::open_default(),
    };

    match opened {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!("Local store unavailable, chats will not be saved: {}", e);
            Arc::new(MemoryStore::new())
        }
    }
}

/// Print a failed command for the user
///
/// Limit errors get an upgrade hint instead of a bare error line.
pub fn report_error(err: &anyhow::Error) {
    match find_vaani_error(err) {
        Some(VaaniError::QuotaExceeded(message)) => print_upgrade_hint(message),
        Some(VaaniError::Unauthorized(message)) => {
            eprintln!("{}", message.yellow());
        }
        _ => eprintln!("{} {}", "Error:".red().bold(), err),
    }
}

/// Call to action shown whenever a plan limit is hit
pub fn print_upgrade_hint(message: &str) {
    println!("{}", message.yellow());
    println!(
        "Run {} to compare plans and {} to upgrade.",
        "astravaani plans".cyan(),
        "astravaani upgrade <tier>".cyan()
    );
}

/// Read a line, for values that were not given as flags
pub(crate) fn prompt_line(prompt: &str) -> Result<String> {
    let mut rl = rustyline::DefaultEditor::new()
        .map_err(|e| VaaniError::Validation(format!("Cannot read input: {}", e)))?;
    let line = rl
        .readline(prompt)
        .map_err(|e| VaaniError::Validation(format!("No input: {}", e)))?;
    Ok(line.trim().to_string())
}

// Interactive chat handler
pub mod chat {
    //! Interactive chat handler.
    //!
    //! Loads the signed-in user's sessions, refreshes the usage gate, and runs
    //! a readline loop that either executes a special command or submits the
    //! line as a guidance question to the current session.

    use super::*;
    use crate::chat::{ChatController, MessageRole, SubmitOutcome};
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    const SESSION_EXPIRED: &str =
        "Your session has expired. Run `astravaani login` to sign in again.";

    /// Start the interactive chat
    ///
    /// # Arguments
    ///
    /// * `ctx` - Application context
    /// * `include_context` - Send earlier conversation context with questions
    pub async fn run_chat(ctx: &AppContext, include_context: bool) -> Result<()> {
        tracing::info!("Starting interactive chat");

        let auth = ctx.require_account(true).await?;
        let store = ctx.session_store(&auth)?;
        let mut chat = ChatController::new(store, include_context);

        if let Err(e) = chat.usage_mut().refresh(&ctx.client).await {
            tracing::warn!("Could not load usage: {}", e);
        }

        let mut rl = DefaultEditor::new()?;
        let name = auth
            .profile()
            .map(|p| p.display_name.clone().unwrap_or_else(|| p.full_name.clone()))
            .unwrap_or_default();
        print_welcome_banner(&name, &chat);

        loop {
            let prompt = format!("{} ", "vaani>".magenta().bold());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::None) => {}
                        Ok(SpecialCommand::Exit) => break,
                        Ok(SpecialCommand::ShowUsage) => {
                            if let Err(e) = chat.usage_mut().refresh(&ctx.client).await {
                                tracing::warn!("Could not refresh usage: {}", e);
                            }
                            super::plans::print_gate(chat.usage());
                            continue;
                        }
                        Ok(command) => {
                            handle_special(&mut chat, command);
                            continue;
                        }
                        Err(e) => {
                            eprintln!("{}", e.to_string().yellow());
                            continue;
                        }
                    }

                    rl.add_history_entry(trimmed)?;

                    println!("{}", "Consulting your chart...".dimmed());
                    match chat.submit(trimmed, &ctx.client, &ctx.client).await {
                        Ok(SubmitOutcome::Answered) => print_last_reply(&chat),
                        Ok(SubmitOutcome::Failed(_)) => print_last_reply(&chat),
                        Ok(SubmitOutcome::LimitReached(message)) => print_upgrade_hint(&message),
                        Err(e) => match find_vaani_error(&e) {
                            Some(VaaniError::Unauthorized(_)) => {
                                eprintln!("{}", SESSION_EXPIRED.yellow());
                                break;
                            }
                            Some(VaaniError::QuotaExceeded(message)) => print_upgrade_hint(message),
                            _ => eprintln!("{}", e.to_string().yellow()),
                        },
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Shubh ho! Goodbye.");
        Ok(())
    }

    fn handle_special(chat: &mut ChatController, command: SpecialCommand) {
        match command {
            SpecialCommand::NewSession => {
                chat.sessions_mut().create_session();
                println!("{}", "Started a new conversation.".green());
            }
            SpecialCommand::ListSessions => {
                super::sessions::print_session_table(chat.sessions());
            }
            SpecialCommand::SwitchSession(n) => match nth_session_id(chat, n) {
                Some(id) => {
                    chat.sessions_mut().set_current(&id);
                    // Resume here on the next `astravaani chat`.
                    chat.sessions().persist();
                    print_transcript(chat);
                }
                None => println!("{}", format!("No conversation number {}", n).yellow()),
            },
            SpecialCommand::DeleteSession(n) => match nth_session_id(chat, n) {
                Some(id) => {
                    chat.sessions_mut().delete_session(&id);
                    println!("{}", format!("Deleted conversation {}", n).green());
                }
                None => println!("{}", format!("No conversation number {}", n).yellow()),
            },
            SpecialCommand::ShowHistory => print_transcript(chat),
            SpecialCommand::Help => print_help(),
            SpecialCommand::ShowUsage | SpecialCommand::Exit | SpecialCommand::None => {}
        }
    }

    fn nth_session_id(chat: &ChatController, n: usize) -> Option<String> {
        chat.sessions()
            .sessions()
            .get(n.checked_sub(1)?)
            .map(|s| s.id.clone())
    }

    fn print_last_reply(chat: &ChatController) {
        let Some(session) = chat.sessions().current() else {
            return;
        };
        if let Some(message) = session.messages.last() {
            if message.role == MessageRole::Assistant {
                super::sessions::print_message(message);
            }
        }
        if !chat.usage().can_ask() {
            if let Some(message) = chat.usage().limit_message() {
                print_upgrade_hint(message);
            }
        }
    }

    fn print_transcript(chat: &ChatController) {
        match chat.sessions().current() {
            Some(session) => super::sessions::print_transcript(session),
            None => println!("{}", "No conversation yet.".yellow()),
        }
    }

    fn print_welcome_banner(name: &str, chat: &ChatController) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                AstraVaani Guidance Chat                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        if !name.is_empty() {
            println!("Namaste, {}!", name.bold());
        }
        println!(
            "Saved conversations: {}",
            chat.sessions().sessions().len()
        );
        super::plans::print_gate(chat.usage());
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }
}
