//! Service settings loaded via OrthoConfig.

use chrono::Duration;
use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{
    CredentialOptions, DEFAULT_ISSUER, DEFAULT_TOKEN_TTL_DAYS, Error, HasherParams, SigningKey,
    TokenPolicy,
};

/// Token and password hashing settings.
///
/// Accessors fall back to the service defaults for unset fields. The token
/// lifetime carries a loader default so an empty environment still merges.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CONSUMER")]
pub struct ConsumerSettings {
    /// Issuer written into new tokens.
    pub issuer: Option<String>,
    /// Lifetime of new tokens in days.
    #[ortho_config(default = 365)]
    pub token_ttl_days: Option<i64>,
    /// Argon2 memory cost in KiB.
    pub argon2_memory_kib: Option<u32>,
    /// Argon2 iteration count.
    pub argon2_iterations: Option<u32>,
    /// Argon2 lane count.
    pub argon2_parallelism: Option<u32>,
}

impl ConsumerSettings {
    /// Return the configured issuer, falling back to the default.
    pub fn issuer(&self) -> &str {
        self.issuer.as_deref().unwrap_or(DEFAULT_ISSUER)
    }

    /// Return the configured token lifetime, falling back to the default.
    pub fn token_ttl_days(&self) -> i64 {
        self.token_ttl_days.unwrap_or(DEFAULT_TOKEN_TTL_DAYS)
    }

    /// Password hashing costs for new verifiers.
    pub fn hasher_params(&self) -> HasherParams {
        HasherParams {
            memory_kib: self
                .argon2_memory_kib
                .unwrap_or(HasherParams::DEFAULT_MEMORY_KIB),
            iterations: self
                .argon2_iterations
                .unwrap_or(HasherParams::DEFAULT_ITERATIONS),
            parallelism: self
                .argon2_parallelism
                .unwrap_or(HasherParams::DEFAULT_PARALLELISM),
        }
    }

    /// Build the token policy described by these settings.
    ///
    /// # Errors
    /// Returns a configuration error for an empty issuer or a lifetime that
    /// is not a positive number of days.
    pub fn token_policy(&self) -> Result<TokenPolicy, Error> {
        let days = self.token_ttl_days();
        let ttl = Duration::try_days(days).ok_or_else(|| {
            Error::configuration(format!("token lifetime of {days} days is out of range"))
        })?;
        TokenPolicy::new(self.issuer(), ttl)
    }

    /// Combine these settings with the signing key.
    pub fn credential_options(&self, signing_key: SigningKey) -> CredentialOptions {
        CredentialOptions::new(signing_key).with_hasher(self.hasher_params())
    }
}
