//! Command-line interface definition for AstraVaani
//!
//! This module defines the CLI structure using clap's derive API: account
//! commands, the interactive chat, plans and payments, profiles, charts, and
//! the admin console.

use crate::api::types::{
    GuidanceMode, Language, OtpChannel, OtpPurpose, ResponseStyle, SubscriptionStatus, Tier,
};
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};

/// AstraVaani - Vedic astrology and numerology guidance in your terminal
///
/// Ask questions about your chart, keep several conversations going, and
/// manage your plan and saved birth profiles.
#[derive(Parser, Debug, Clone)]
#[command(name = "astravaani")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Backend base URL, without the /api/v1 suffix
    #[arg(long)]
    pub api_url: Option<String>,

    /// Local database path
    #[arg(long)]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for AstraVaani
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sign in with email and password, or a Google credential
    Login {
        #[arg(short, long, required_unless_present = "google_credential")]
        email: Option<String>,

        /// Prompted for when omitted
        #[arg(short, long, env = "ASTRAVAANI_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Google ID token from the Google sign-in flow
        #[arg(long, conflicts_with = "email")]
        google_credential: Option<String>,
    },

    /// Sign out and forget the stored token
    Logout,

    /// Create an account
    Register {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// Must match --password
        #[arg(long)]
        confirm_password: String,

        #[arg(long)]
        phone: Option<String>,
    },

    /// Send a one-time password
    SendOtp {
        /// Email address or phone number
        target: String,

        #[arg(long, default_value = "email")]
        channel: OtpChannel,

        #[arg(long, default_value = "signup")]
        purpose: OtpPurpose,
    },

    /// Verify a one-time password
    VerifyOtp {
        /// Email address or phone number
        target: String,

        /// Six-digit code
        code: String,

        #[arg(long, default_value = "email")]
        channel: OtpChannel,

        #[arg(long, default_value = "signup")]
        purpose: OtpPurpose,
    },

    /// Email a password reset code
    ForgotPassword {
        #[arg(short, long)]
        email: String,
    },

    /// Set a new password with a reset code
    ResetPassword {
        #[arg(short, long)]
        email: String,

        /// Six-digit code from the reset email
        #[arg(long)]
        code: String,

        #[arg(long)]
        new_password: String,

        /// Must match --new-password
        #[arg(long)]
        confirm_password: String,
    },

    /// Show the signed-in account
    Whoami,

    /// Start an interactive guidance chat
    Chat {
        /// Do not send earlier conversation context with questions
        #[arg(long)]
        no_context: bool,
    },

    /// Manage saved chat sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Past guidance conversations stored by the backend
    History {
        #[arg(long)]
        limit: Option<u32>,

        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Show remaining questions
    Usage,

    /// List subscription plans
    Plans,

    /// Start an upgrade and print the payment order
    Upgrade {
        /// Target tier (starter, pro, max)
        tier: Tier,
    },

    /// Complete a purchase with the checkout's payment details
    VerifyPayment {
        #[arg(long)]
        order_id: String,

        #[arg(long)]
        payment_id: String,

        #[arg(long)]
        signature: String,
    },

    /// Show the current subscription
    Subscription {
        /// Cancel at the end of the current period
        #[arg(long)]
        cancel: bool,
    },

    /// Manage your birth profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },

    /// Manage saved profiles of family and friends
    People {
        #[command(subcommand)]
        command: PeopleCommand,
    },

    /// Inspect your computed chart
    Chart {
        #[command(subcommand)]
        command: ChartCommand,
    },

    /// Administration (admin accounts only)
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
}

/// Local chat session subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List sessions, newest first
    List,

    /// Print the messages of a session
    Show {
        /// Position in `sessions list` (1-based)
        index: usize,
    },

    /// Delete a session
    Delete {
        /// Position in `sessions list` (1-based)
        index: usize,
    },
}

/// Birth profile subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ProfileCommand {
    /// Show your profile
    Show,

    /// Create your profile (onboarding)
    Create {
        #[arg(long)]
        full_name: String,

        #[arg(long)]
        display_name: Option<String>,

        /// YYYY-MM-DD
        #[arg(long)]
        date_of_birth: NaiveDate,

        /// HH:MM, 24-hour
        #[arg(long, value_parser = parse_time)]
        time_of_birth: Option<NaiveTime>,

        #[arg(long)]
        place_of_birth: Option<String>,

        #[arg(long, default_value = "both")]
        mode: GuidanceMode,

        #[arg(long, default_value = "hinglish")]
        language: Language,

        #[arg(long, default_value = "balanced")]
        style: ResponseStyle,
    },

    /// Change profile fields
    Update {
        #[arg(long)]
        full_name: Option<String>,

        #[arg(long)]
        display_name: Option<String>,

        /// HH:MM, 24-hour
        #[arg(long, value_parser = parse_time)]
        time_of_birth: Option<NaiveTime>,

        #[arg(long)]
        place_of_birth: Option<String>,

        #[arg(long)]
        mode: Option<GuidanceMode>,

        #[arg(long)]
        language: Option<Language>,

        #[arg(long)]
        style: Option<ResponseStyle>,
    },
}

/// Person profile subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum PeopleCommand {
    /// List saved profiles
    List,

    /// Show one profile
    Show { id: String },

    /// Save a new profile
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        nickname: Option<String>,

        /// e.g. self, spouse, child, parent, friend
        #[arg(long, default_value = "self")]
        relation: String,

        /// YYYY-MM-DD
        #[arg(long)]
        date_of_birth: NaiveDate,

        /// HH:MM, 24-hour
        #[arg(long, value_parser = parse_time)]
        time_of_birth: Option<NaiveTime>,

        #[arg(long)]
        place_of_birth: String,

        #[arg(long)]
        notes: Option<String>,

        /// Make this the default profile for questions
        #[arg(long)]
        primary: bool,
    },

    /// Change fields of a saved profile
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        nickname: Option<String>,

        #[arg(long)]
        relation: Option<String>,

        #[arg(long)]
        date_of_birth: Option<NaiveDate>,

        #[arg(long, value_parser = parse_time)]
        time_of_birth: Option<NaiveTime>,

        #[arg(long)]
        place_of_birth: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a saved profile
    Delete { id: String },

    /// Make a saved profile the default
    SetPrimary { id: String },
}

/// Chart subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ChartCommand {
    /// Show the current chart snapshot
    Current,

    /// Recompute the chart
    Recompute {
        #[arg(long, default_value = "both")]
        mode: GuidanceMode,
    },

    /// Explain one data point, e.g. moon_sign
    Explain { data_point: String },

    /// Current planetary transits
    Transits,

    /// Background on one planet
    Planet { name: String },
}

/// Admin subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AdminCommand {
    /// Dashboard numbers
    Stats,

    /// List users
    Users {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 20)]
        page_size: u32,

        /// Match email or name
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        tier: Option<Tier>,
    },

    /// Move a user to another tier
    ChangeTier { user_id: String, tier: Tier },

    /// Enable or disable a user
    ToggleActive { user_id: String },

    /// List subscriptions
    Subscriptions {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 20)]
        page_size: u32,

        #[arg(long)]
        status: Option<SubscriptionStatus>,

        #[arg(long)]
        tier: Option<Tier>,
    },
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| format!("invalid time '{}', expected HH:MM", s))
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            api_url: None,
            storage_path: None,
            command: Commands::Whoami,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Whoami));
    }

    #[test]
    fn test_cli_parse_chat_command() {
        let cli = Cli::try_parse_from(["astravaani", "chat"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat { no_context: false }));
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "astravaani",
            "--verbose",
            "--json-logs",
            "--api-url",
            "https://api.example",
            "--storage-path",
            "/tmp/store",
            "usage",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(cli.json_logs);
        assert_eq!(cli.api_url.as_deref(), Some("https://api.example"));
        assert_eq!(cli.storage_path.as_deref(), Some("/tmp/store"));
        assert!(matches!(cli.command, Commands::Usage));
    }

    #[test]
    fn test_cli_parse_login() {
        let cli = Cli::try_parse_from([
            "astravaani",
            "login",
            "--email",
            "asha@example.com",
            "--password",
            "correct-horse",
        ])
        .unwrap();
        if let Commands::Login {
            email,
            password,
            google_credential,
        } = cli.command
        {
            assert_eq!(email.as_deref(), Some("asha@example.com"));
            assert_eq!(password.as_deref(), Some("correct-horse"));
            assert!(google_credential.is_none());
        } else {
            panic!("Expected Login command");
        }
    }

    #[test]
    fn test_cli_parse_login_with_google_credential() {
        let cli = Cli::try_parse_from(["astravaani", "login", "--google-credential", "id-token"])
            .unwrap();
        if let Commands::Login {
            email,
            google_credential,
            ..
        } = cli.command
        {
            assert!(email.is_none());
            assert_eq!(google_credential.as_deref(), Some("id-token"));
        } else {
            panic!("Expected Login command");
        }
    }

    #[test]
    fn test_cli_login_needs_email_or_google_credential() {
        assert!(Cli::try_parse_from(["astravaani", "login"]).is_err());
        assert!(Cli::try_parse_from([
            "astravaani",
            "login",
            "--email",
            "asha@example.com",
            "--google-credential",
            "id-token",
        ])
        .is_err());
    }

    #[test]
    fn test_cli_parse_send_otp_defaults() {
        let cli = Cli::try_parse_from(["astravaani", "send-otp", "asha@example.com"]).unwrap();
        if let Commands::SendOtp {
            target,
            channel,
            purpose,
        } = cli.command
        {
            assert_eq!(target, "asha@example.com");
            assert_eq!(channel, OtpChannel::Email);
            assert_eq!(purpose, OtpPurpose::Signup);
        } else {
            panic!("Expected SendOtp command");
        }
    }

    #[test]
    fn test_cli_parse_upgrade_tier() {
        let cli = Cli::try_parse_from(["astravaani", "upgrade", "pro"]).unwrap();
        assert!(matches!(cli.command, Commands::Upgrade { tier: Tier::Pro }));

        assert!(Cli::try_parse_from(["astravaani", "upgrade", "platinum"]).is_err());
    }

    #[test]
    fn test_cli_parse_sessions_delete() {
        let cli = Cli::try_parse_from(["astravaani", "sessions", "delete", "2"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Sessions {
                command: SessionCommand::Delete { index: 2 }
            }
        ));
    }

    #[test]
    fn test_cli_parse_profile_create() {
        let cli = Cli::try_parse_from([
            "astravaani",
            "profile",
            "create",
            "--full-name",
            "Asha Verma",
            "--date-of-birth",
            "1992-08-15",
            "--time-of-birth",
            "06:45",
            "--language",
            "hi",
        ])
        .unwrap();
        if let Commands::Profile {
            command:
                ProfileCommand::Create {
                    date_of_birth,
                    time_of_birth,
                    language,
                    mode,
                    ..
                },
        } = cli.command
        {
            assert_eq!(date_of_birth, NaiveDate::from_ymd_opt(1992, 8, 15).unwrap());
            assert_eq!(time_of_birth, NaiveTime::from_hms_opt(6, 45, 0));
            assert_eq!(language, Language::Hindi);
            assert_eq!(mode, GuidanceMode::Both);
        } else {
            panic!("Expected Profile Create command");
        }
    }

    #[test]
    fn test_cli_parse_admin_users_filters() {
        let cli = Cli::try_parse_from([
            "astravaani",
            "admin",
            "users",
            "--search",
            "asha",
            "--tier",
            "starter",
        ])
        .unwrap();
        if let Commands::Admin {
            command:
                AdminCommand::Users {
                    page,
                    page_size,
                    search,
                    tier,
                },
        } = cli.command
        {
            assert_eq!(page, 1);
            assert_eq!(page_size, 20);
            assert_eq!(search.as_deref(), Some("asha"));
            assert_eq!(tier, Some(Tier::Starter));
        } else {
            panic!("Expected Admin Users command");
        }
    }

    #[test]
    fn test_cli_parse_bad_time_rejected() {
        let result = Cli::try_parse_from([
            "astravaani",
            "people",
            "create",
            "--name",
            "Ravi",
            "--date-of-birth",
            "1990-01-01",
            "--time-of-birth",
            "25:99",
            "--place-of-birth",
            "Pune",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_missing_command() {
        assert!(Cli::try_parse_from(["astravaani"]).is_err());
    }
}
