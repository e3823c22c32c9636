//! Driving port for consumer registration, login and token validation.
//!
//! Inbound adapters call this port without knowing the storage or signing
//! infrastructure behind it, so handler tests can substitute a double.

use async_trait::async_trait;

use crate::domain::{ConsumerAccount, Error, LoginRequest, RegistrationRequest, TokenClaims};

/// Domain use-case port for consumer identity.
#[async_trait]
pub trait ConsumerIdentity: Send + Sync {
    /// Register a new consumer and return the stored account.
    async fn register(&self, request: RegistrationRequest) -> Result<ConsumerAccount, Error>;

    /// Authenticate credentials and return a signed bearer token.
    async fn login(&self, request: LoginRequest) -> Result<String, Error>;

    /// Validate a bearer token and return its claims.
    async fn validate_token(&self, token: &str) -> Result<TokenClaims, Error>;

    /// Look up a consumer by email.
    async fn consumer(&self, email: &str) -> Result<ConsumerAccount, Error>;
}
