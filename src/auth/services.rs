use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::dto::{LoginRequest, RegisterRequest};
use crate::store::StoreError;

/// Symbols accepted by the password policy.
pub const PASSWORD_SYMBOLS: &str = r#"!@#$%^&*()_+-=[]{};':"\|,.<>/?"#;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Failures of the register and login flows. `Display` is the message shown
/// to the user.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("All fields are required.")]
    MissingFields,
    #[error("The email address is not valid.")]
    InvalidEmail,
    #[error(
        "The password must be at least 8 characters long and include uppercase, lowercase, numbers and symbols."
    )]
    WeakPassword,
    #[error("The email address is already registered.")]
    EmailTaken,
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error("Error registering user.")]
    RegistrationFailed(#[source] StoreError),
    #[error("Could not connect to the server.")]
    Connection(#[source] StoreError),
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_strong_password(password: &str) -> bool {
    lazy_static! {
        static ref LOWER_RE: Regex = Regex::new(r"[a-z]").unwrap();
        static ref UPPER_RE: Regex = Regex::new(r"[A-Z]").unwrap();
        static ref DIGIT_RE: Regex = Regex::new(r"[0-9]").unwrap();
        static ref SYMBOL_RE: Regex = Regex::new(r#"[!@#$%^&*()_+\-=\[\]{};':"\\|,.<>/?]"#).unwrap();
    }
    password.chars().count() >= MIN_PASSWORD_LEN
        && LOWER_RE.is_match(password)
        && UPPER_RE.is_match(password)
        && DIGIT_RE.is_match(password)
        && SYMBOL_RE.is_match(password)
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

pub fn validate_registration(req: &RegisterRequest) -> Result<(), AuthError> {
    if is_blank(&req.fullname) || is_blank(&req.email) || is_blank(&req.password) {
        return Err(AuthError::MissingFields);
    }
    if !is_valid_email(&req.email) {
        return Err(AuthError::InvalidEmail);
    }
    if !is_strong_password(&req.password) {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

pub fn validate_login(req: &LoginRequest) -> Result<(), AuthError> {
    if is_blank(&req.email) || is_blank(&req.password) {
        return Err(AuthError::MissingFields);
    }
    Ok(())
}
