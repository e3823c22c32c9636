//! Port abstraction for consumer account persistence adapters and their errors.
//!
//! The domain never checks uniqueness transactionally: the existence check
//! and the create call are separate, so adapters that need strict uniqueness
//! must enforce it on create and report [`ConsumerRepositoryError::Duplicate`].

use async_trait::async_trait;

use crate::domain::ConsumerAccount;

/// Persistence errors raised by consumer repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsumerRepositoryError {
    /// Repository connection could not be established.
    #[error("consumer repository connection failed: {message}")]
    Connection {
        /// Adapter-specific detail.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("consumer repository query failed: {message}")]
    Query {
        /// Adapter-specific detail.
        message: String,
    },
    /// No account is stored under the email.
    #[error("consumer not found: {email}")]
    NotFound {
        /// Email used for the lookup.
        email: String,
    },
    /// An account with the email already exists.
    #[error("consumer already stored: {email}")]
    Duplicate {
        /// Email of the rejected account.
        email: String,
    },
}

impl ConsumerRepositoryError {
    /// Build a [`ConsumerRepositoryError::Connection`].
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Build a [`ConsumerRepositoryError::Query`].
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Build a [`ConsumerRepositoryError::NotFound`].
    pub fn not_found(email: impl Into<String>) -> Self {
        Self::NotFound {
            email: email.into(),
        }
    }

    /// Build a [`ConsumerRepositoryError::Duplicate`].
    pub fn duplicate(email: impl Into<String>) -> Self {
        Self::Duplicate {
            email: email.into(),
        }
    }

    /// Return `true` when the failure means the account is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Storage contract consumed by the consumer domain service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConsumerRepository: Send + Sync {
    /// Persist a new account and return it with its assigned identifier.
    async fn create_consumer(
        &self,
        account: &ConsumerAccount,
    ) -> Result<ConsumerAccount, ConsumerRepositoryError>;

    /// Report whether an account is stored under `email`.
    async fn consumer_exists(&self, email: &str) -> Result<bool, ConsumerRepositoryError>;

    /// Fetch the account stored under `email`.
    ///
    /// Absence is reported as [`ConsumerRepositoryError::NotFound`].
    async fn consumer_by_email(&self, email: &str)
    -> Result<ConsumerAccount, ConsumerRepositoryError>;
}
