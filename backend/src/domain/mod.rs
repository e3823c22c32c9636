//! Domain primitives, services and ports.
//!
//! Purpose: validate consumer input, derive and check password verifiers,
//! issue and validate bearer tokens, and orchestrate registration and login
//! against an injected storage port. Infrastructure stays behind the traits
//! in [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`) with user-facing classification.
//! - ConsumerAccount, ConsumerId, PasswordVerifier for stored identities.
//! - CredentialService for verifiers and tokens.
//! - ConsumerService implementing [`ports::ConsumerIdentity`].

pub mod auth;
pub mod consumer;
pub mod consumer_service;
pub mod credentials;
pub mod error;
pub mod ports;
pub mod token;

pub use self::auth::{FormValidationError, LoginRequest, RegistrationRequest};
pub use self::consumer::{ConsumerAccount, ConsumerId, PasswordVerifier};
pub use self::consumer_service::ConsumerService;
pub use self::credentials::{CredentialOptions, CredentialService, HasherParams, SigningKey};
pub use self::error::{Error, ErrorKind, INTERNAL_ERROR_MESSAGE, UserFacing};
pub use self::token::{
    ACCESS_SUBJECT, DEFAULT_ISSUER, DEFAULT_TOKEN_TTL_DAYS, TokenClaims, TokenPolicy, TokenState,
};
