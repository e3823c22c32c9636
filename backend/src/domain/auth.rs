//! Registration and login request payloads and their structural validation.
//!
//! Inbound adapters build these requests from raw strings; the domain
//! validates them before touching storage or credentials.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use zeroize::Zeroizing;

use crate::domain::UserFacing;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = concat!(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+",
            r"@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?",
            r"(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        );
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Structural problems found in registration or login input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValidationError {
    /// Email was empty.
    EmptyEmail,
    /// Registration email did not match the accepted address shape.
    InvalidEmail,
    /// Login email did not match the accepted address shape.
    MalformedLoginEmail,
    /// Password was empty.
    EmptyPassword,
    /// Password confirmation differs from the password.
    PasswordMismatch,
}

impl fmt::Display for FormValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "empty email"),
            Self::InvalidEmail => write!(f, "invalid email"),
            Self::MalformedLoginEmail => write!(f, "email is not valid"),
            Self::EmptyPassword => write!(f, "empty password"),
            Self::PasswordMismatch => write!(f, "passwords don't match"),
        }
    }
}

impl std::error::Error for FormValidationError {}

impl UserFacing for FormValidationError {
    fn is_user_facing(&self) -> bool {
        true
    }
}

/// Registration input: email plus password and its confirmation.
///
/// Passwords are kept in zeroizing buffers and are compared byte for byte.
///
/// # Examples
/// ```
/// use consumer_service::domain::{FormValidationError, RegistrationRequest};
///
/// let request = RegistrationRequest::new("test@test.com", "1234", "1235");
/// assert_eq!(request.validate(), Err(FormValidationError::PasswordMismatch));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    email: String,
    password: Zeroizing<String>,
    confirmation: Zeroizing<String>,
}

impl RegistrationRequest {
    /// Capture raw registration input without validating it.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        confirmation: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: Zeroizing::new(password.into()),
            confirmation: Zeroizing::new(confirmation.into()),
        }
    }

    /// Email as supplied by the caller.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password as supplied by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Report the first violated rule, if any.
    pub fn validate(&self) -> Result<(), FormValidationError> {
        if self.email.is_empty() {
            return Err(FormValidationError::EmptyEmail);
        }
        if !is_valid_email(&self.email) {
            return Err(FormValidationError::InvalidEmail);
        }
        if self.password.is_empty() {
            return Err(FormValidationError::EmptyPassword);
        }
        if self.password.as_bytes() != self.confirmation.as_bytes() {
            return Err(FormValidationError::PasswordMismatch);
        }
        Ok(())
    }
}

/// Login input: email and password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    email: String,
    password: Zeroizing<String>,
}

impl LoginRequest {
    /// Capture raw login input without validating it.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// Email used for the account lookup.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Report the first violated rule, if any.
    pub fn validate(&self) -> Result<(), FormValidationError> {
        if self.email.is_empty() {
            return Err(FormValidationError::EmptyEmail);
        }
        if !is_valid_email(&self.email) {
            return Err(FormValidationError::MalformedLoginEmail);
        }
        if self.password.is_empty() {
            return Err(FormValidationError::EmptyPassword);
        }
        Ok(())
    }
}
