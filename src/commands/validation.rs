//! Input checks run before anything is sent to the backend

use crate::error::{Result, VaaniError};

/// Shortest password the backend accepts
pub const MIN_PASSWORD_LEN: usize = 8;

/// Digits in a one-time password
pub const OTP_LEN: usize = 6;

/// Check a new password and its confirmation
///
/// # Errors
///
/// Returns `VaaniError::Validation` when the password is too short or the
/// confirmation differs.
///
/// # Examples
///
/// ```
/// use astravaani::commands::validation::validate_new_password;
///
/// assert!(validate_new_password("nakshatra27", "nakshatra27").is_ok());
/// assert!(validate_new_password("short", "short").is_err());
/// assert!(validate_new_password("nakshatra27", "nakshatra28").is_err());
/// ```
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(VaaniError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ))
        .into());
    }
    if password != confirmation {
        return Err(VaaniError::Validation("Passwords do not match".to_string()).into());
    }
    Ok(())
}

/// Check that `code` is a six-digit one-time password
pub fn validate_otp(code: &str) -> Result<()> {
    let code = code.trim();
    if code.len() != OTP_LEN || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(VaaniError::Validation(format!(
            "Verification code must be exactly {} digits",
            OTP_LEN
        ))
        .into());
    }
    Ok(())
}

/// Minimal sanity check of an email address
pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(VaaniError::Validation(format!("'{}' is not a valid email address", email)).into())
    }
}
