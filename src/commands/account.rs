//! Account commands: sign-in, registration, verification, and recovery

use crate::api::types::{OtpChannel, OtpPurpose};
use crate::auth::{AuthContext, RouteDecision};
use crate::commands::validation::{validate_email, validate_new_password, validate_otp};
use crate::commands::{prompt_line, AppContext};
use crate::error::{Result, VaaniError};
use colored::Colorize;

/// Sign in and report where the account stands
pub async fn login(
    ctx: &AppContext,
    email: Option<String>,
    password: Option<String>,
    google_credential: Option<String>,
) -> Result<()> {
    let mut auth = AuthContext::new(ctx.client.clone());

    match (google_credential, email) {
        (Some(credential), _) => {
            auth.login_with_google(credential.trim()).await?;
            tracing::info!("Signed in with Google");
        }
        (None, Some(email)) => {
            validate_email(&email)?;
            let password = match password {
                Some(p) => p,
                None => prompt_line("Password: ")?,
            };
            auth.login(email.trim(), &password).await?;
            tracing::info!("Signed in as {}", email);
        }
        (None, None) => {
            return Err(VaaniError::Validation(
                "Give --email or --google-credential to sign in".to_string(),
            )
            .into());
        }
    }

    match auth.route() {
        RouteDecision::Onboard => {
            println!("{}", "Signed in.".green());
            println!(
                "Create your birth profile next: {}",
                "astravaani profile create --help".cyan()
            );
        }
        RouteDecision::Proceed => {
            println!("{}", "Signed in.".green());
            println!("Start asking with {}", "astravaani chat".cyan());
        }
        RouteDecision::Wait | RouteDecision::Login => {
            println!("{}", "Sign-in did not complete; please try again.".yellow());
        }
    }
    Ok(())
}

/// Sign out
pub async fn logout(ctx: &AppContext) -> Result<()> {
    let mut auth = AuthContext::new(ctx.client.clone());
    auth.logout().await;
    println!("{}", "Signed out.".green());
    Ok(())
}

/// Create an account and send the email verification code
pub async fn register(
    ctx: &AppContext,
    email: String,
    password: String,
    confirm_password: String,
    phone: Option<String>,
) -> Result<()> {
    validate_email(&email)?;
    validate_new_password(&password, &confirm_password)?;

    let email = email.trim();
    let phone = phone.as_deref().map(str::trim).filter(|p| !p.is_empty());
    ctx.client.register(email, &password, phone).await?;
    println!("{}", "Account created.".green());

    match ctx
        .client
        .send_otp(email, OtpChannel::Email, OtpPurpose::Signup)
        .await
    {
        Ok(_) => println!(
            "We sent a code to {}. Confirm it with {}",
            email,
            format!("astravaani verify-otp {} <code>", email).cyan()
        ),
        Err(e) => {
            tracing::warn!("Could not send verification code: {}", e);
            println!(
                "Request a verification code with {}",
                format!("astravaani send-otp {}", email).cyan()
            );
        }
    }
    Ok(())
}

/// Send a one-time password
pub async fn send_otp(
    ctx: &AppContext,
    target: String,
    channel: OtpChannel,
    purpose: OtpPurpose,
) -> Result<()> {
    let response = ctx.client.send_otp(target.trim(), channel, purpose).await?;
    let mut message = if response.message.is_empty() {
        format!("Code sent to {}", target)
    } else {
        response.message
    };
    if let Some(minutes) = response.expires_in_minutes {
        message.push_str(&format!(" (valid for {} minutes)", minutes));
    }
    println!("{}", message.green());
    Ok(())
}

/// Verify a one-time password
pub async fn verify_otp(
    ctx: &AppContext,
    target: String,
    code: String,
    channel: OtpChannel,
    purpose: OtpPurpose,
) -> Result<()> {
    validate_otp(&code)?;
    let response = ctx
        .client
        .verify_otp(target.trim(), code.trim(), channel, purpose)
        .await?;

    if response.verified.unwrap_or(true) {
        println!("{}", "Verified.".green());
        if purpose == OtpPurpose::Signup {
            println!("You can now sign in with {}", "astravaani login".cyan());
        }
    } else {
        println!("{}", "That code was not accepted.".yellow());
    }
    Ok(())
}

/// Email a password reset code
pub async fn forgot_password(ctx: &AppContext, email: String) -> Result<()> {
    validate_email(&email)?;
    ctx.client.forgot_password(email.trim()).await?;
    println!(
        "If an account exists for {}, a reset code is on its way.",
        email.trim()
    );
    println!(
        "Then run {}",
        "astravaani reset-password --email .. --code .. --new-password .. --confirm-password .."
            .cyan()
    );
    Ok(())
}

/// Set a new password with a reset code
pub async fn reset_password(
    ctx: &AppContext,
    email: String,
    code: String,
    new_password: String,
    confirm_password: String,
) -> Result<()> {
    validate_email(&email)?;
    validate_otp(&code)?;
    validate_new_password(&new_password, &confirm_password)?;

    ctx.client
        .reset_password(email.trim(), code.trim(), &new_password)
        .await?;
    println!("{}", "Password updated. Sign in with your new password.".green());
    Ok(())
}

/// Show the signed-in account
pub async fn whoami(ctx: &AppContext) -> Result<()> {
    let auth = ctx.require_account(false).await?;
    let Some(user) = auth.user() else {
        return Ok(());
    };

    println!("Email:    {}", user.email.bold());
    if let Some(phone) = &user.phone_number {
        println!("Phone:    {}", phone);
    }
    println!(
        "Verified: {}",
        if user.is_verified { "yes".green() } else { "no".yellow() }
    );
    match auth.profile() {
        Some(profile) => println!("Profile:  {}", profile.full_name),
        None => println!(
            "Profile:  {} (run {})",
            "not created".yellow(),
            "astravaani profile create --help".cyan()
        ),
    }
    Ok(())
}
