//! Consumer domain service implementing the identity driving port.
//!
//! Registration, login and token validation are sequential chains of calls
//! on the storage port and the credential service. Every failure is wrapped
//! so callers keep the cause while the classification decides what a client
//! may see.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::ports::{ConsumerIdentity, ConsumerRepository, ConsumerRepositoryError};
use crate::domain::{
    ConsumerAccount, CredentialService, Error, LoginRequest, RegistrationRequest, TokenClaims,
    TokenPolicy,
};

/// Consumer identity service backed by a storage port.
#[derive(Clone)]
pub struct ConsumerService<R> {
    repository: Arc<R>,
    credentials: Arc<CredentialService>,
    clock: Arc<dyn Clock>,
    policy: TokenPolicy,
}

impl<R> ConsumerService<R> {
    /// Create a service issuing tokens under the default [`TokenPolicy`].
    ///
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use consumer_service::domain::{ConsumerService, CredentialOptions, CredentialService, SigningKey};
    /// # use consumer_service::outbound::memory::InMemoryConsumerRepository;
    /// # use mockable::DefaultClock;
    /// # fn example() -> Result<(), consumer_service::domain::Error> {
    /// let credentials = CredentialService::new(CredentialOptions::new(SigningKey::new(*b"secret")?))?;
    /// let service = ConsumerService::new(
    ///     Arc::new(InMemoryConsumerRepository::default()),
    ///     Arc::new(credentials),
    ///     Arc::new(DefaultClock),
    /// );
    /// # let _ = service;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(
        repository: Arc<R>,
        credentials: Arc<CredentialService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            credentials,
            clock,
            policy: TokenPolicy::default(),
        }
    }

    /// Replace the issuer and lifetime applied to new tokens.
    #[must_use]
    pub fn with_token_policy(mut self, policy: TokenPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl<R> ConsumerService<R>
where
    R: ConsumerRepository,
{
    fn map_lookup_error(error: ConsumerRepositoryError) -> Error {
        if error.is_not_found() {
            debug!("consumer lookup found no account");
        } else {
            warn!(error = %error, "consumer lookup failed");
        }
        Error::storage("can't get user").with_cause(error)
    }

    fn map_create_error(error: ConsumerRepositoryError) -> Error {
        match error {
            ConsumerRepositoryError::Duplicate { .. } => {
                debug!("consumer create lost a race with a concurrent registration");
                Error::conflict("user is already exist").with_cause(error)
            }
            other => {
                warn!(error = %other, "consumer create failed");
                Error::storage("can't create user").with_cause(other)
            }
        }
    }
}

#[async_trait]
impl<R> ConsumerIdentity for ConsumerService<R>
where
    R: ConsumerRepository,
{
    async fn register(&self, request: RegistrationRequest) -> Result<ConsumerAccount, Error> {
        request.validate().map_err(|err| {
            Error::validation("can't register user").with_classified_cause(err)
        })?;

        let exists = self
            .repository
            .consumer_exists(request.email())
            .await
            .map_err(Self::map_lookup_error)?;
        if exists {
            debug!("registration rejected for an existing email");
            return Err(Error::conflict("user is already exist"));
        }

        let verifier = self
            .credentials
            .derive_verifier(request.email(), request.password())?;
        let account = ConsumerAccount::new(request.email(), verifier, self.clock.utc());
        let stored = self
            .repository
            .create_consumer(&account)
            .await
            .map_err(Self::map_create_error)?;

        info!(consumer_id = %stored.id(), "consumer registered");
        Ok(stored)
    }

    async fn login(&self, request: LoginRequest) -> Result<String, Error> {
        request.validate().map_err(|err| {
            Error::validation("can't authenticate user").with_classified_cause(err)
        })?;

        let account = match self.repository.consumer_by_email(request.email()).await {
            Ok(account) => account,
            Err(error) => {
                if error.is_not_found() {
                    // Unknown emails pay the same KDF cost as wrong passwords.
                    let _rejected = self
                        .credentials
                        .reject_missing_account(request.email(), request.password());
                }
                return Err(Self::map_lookup_error(error));
            }
        };

        self.credentials
            .verify(account.verifier(), request.email(), request.password())
            .map_err(|err| {
                debug!(consumer_id = %account.id(), "login rejected");
                Error::credential("can't authenticate user").with_cause(err)
            })?;

        let claims = TokenClaims::access(account.id(), &self.policy, self.clock.utc());
        let token = self.credentials.issue_token(&claims)?;
        info!(consumer_id = %account.id(), expires_at = claims.expires_at, "token issued");
        Ok(token)
    }

    async fn validate_token(&self, token: &str) -> Result<TokenClaims, Error> {
        self.credentials
            .validate_token_at(token, self.clock.utc())
            .inspect_err(|err| debug!(error = %err, "token rejected"))
    }

    async fn consumer(&self, email: &str) -> Result<ConsumerAccount, Error> {
        self.repository
            .consumer_by_email(email)
            .await
            .map_err(Self::map_lookup_error)
    }
}

#[cfg(test)]
#[path = "consumer_service_tests.rs"]
mod tests;
