//! AstraVaani - guidance chat client
//!
#![doc = "AstraVaani - guidance chat client"]
#![doc = "Main entry point for the AstraVaani command-line client."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use astravaani::cli::{Cli, Commands};
use astravaani::commands::{self, AppContext};
use astravaani::config::Config;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    if let Err(e) = run(cli).await {
        commands::report_error(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Login {
            email,
            password,
            google_credential,
        } => commands::account::login(&ctx, email, password, google_credential).await,
        Commands::Logout => commands::account::logout(&ctx).await,
        Commands::Register {
            email,
            password,
            confirm_password,
            phone,
        } => commands::account::register(&ctx, email, password, confirm_password, phone).await,
        Commands::SendOtp {
            target,
            channel,
            purpose,
        } => commands::account::send_otp(&ctx, target, channel, purpose).await,
        Commands::VerifyOtp {
            target,
            code,
            channel,
            purpose,
        } => commands::account::verify_otp(&ctx, target, code, channel, purpose).await,
        Commands::ForgotPassword { email } => {
            commands::account::forgot_password(&ctx, email).await
        }
        Commands::ResetPassword {
            email,
            code,
            new_password,
            confirm_password,
        } => {
            commands::account::reset_password(&ctx, email, code, new_password, confirm_password)
                .await
        }
        Commands::Whoami => commands::account::whoami(&ctx).await,
        Commands::Chat { no_context } => {
            tracing::info!("Starting interactive chat mode");
            let include_context = ctx.config.chat.include_context && !no_context;
            if !include_context {
                tracing::debug!("Conversation context disabled");
            }
            commands::chat::run_chat(&ctx, include_context).await
        }
        Commands::Sessions { command } => commands::sessions::handle_sessions(&ctx, command).await,
        Commands::History { limit, offset } => {
            commands::plans::history(&ctx, limit, offset).await
        }
        Commands::Usage => commands::plans::show_usage(&ctx).await,
        Commands::Plans => commands::plans::list_plans(&ctx).await,
        Commands::Upgrade { tier } => commands::plans::upgrade(&ctx, tier).await,
        Commands::VerifyPayment {
            order_id,
            payment_id,
            signature,
        } => commands::plans::verify_payment(&ctx, order_id, payment_id, signature).await,
        Commands::Subscription { cancel } => commands::plans::subscription(&ctx, cancel).await,
        Commands::Profile { command } => commands::profile::handle_profile(&ctx, command).await,
        Commands::People { command } => commands::profile::handle_people(&ctx, command).await,
        Commands::Chart { command } => commands::chart::handle_chart(&ctx, command).await,
        Commands::Admin { command } => {
            tracing::info!("Starting admin command");
            commands::admin::handle_admin(&ctx, command).await
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins; otherwise `--verbose` selects debug output.
fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "astravaani=debug"
    } else {
        "astravaani=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
