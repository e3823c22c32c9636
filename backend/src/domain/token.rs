//! Bearer token claims and their temporal validation.
//!
//! Claims are created fresh per login, encoded into the token string, and
//! decoded again when the token is presented. Validation is a pure function
//! of the claims and the current time; nothing is stored.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ConsumerId, Error};

/// Issuer embedded in tokens unless configuration overrides it.
pub const DEFAULT_ISSUER: &str = "consumer_service";
/// Subject type of login tokens.
pub const ACCESS_SUBJECT: &str = "access";
/// Default lifetime of a login token.
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 365;

/// Token payload.
///
/// Field names follow the registered JWT claim names, plus `id` for the
/// subject account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject type, `access` for login tokens.
    #[serde(rename = "sub", default)]
    pub subject_type: String,
    /// Issuing service name.
    #[serde(rename = "iss", default)]
    pub issuer: String,
    /// Issue time as Unix seconds.
    #[serde(rename = "iat", default)]
    pub issued_at: i64,
    /// Expiry time as Unix seconds.
    #[serde(rename = "exp")]
    pub expires_at: i64,
    /// Identifier of the subject account.
    #[serde(rename = "id", default)]
    pub subject_id: ConsumerId,
}

/// Outcome of validating claims at a point in time.
///
/// Decoded claims start out unvalidated; [`TokenClaims::state_at`] moves
/// them into exactly one of these states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Claims are usable.
    Valid,
    /// The current time is at or past the expiry.
    Expired,
    /// The subject identifier is unset.
    Malformed,
}

impl TokenClaims {
    /// Build access-token claims for `subject_id` issued at `now`.
    #[must_use]
    pub fn access(subject_id: ConsumerId, policy: &TokenPolicy, now: DateTime<Utc>) -> Self {
        Self {
            subject_type: ACCESS_SUBJECT.to_owned(),
            issuer: policy.issuer().to_owned(),
            issued_at: now.timestamp(),
            expires_at: now
                .checked_add_signed(policy.ttl())
                .map_or(i64::MAX, |expiry| expiry.timestamp()),
            subject_id,
        }
    }

    /// Validate the claims against `now`. Expiry is checked first.
    #[must_use]
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        if now.timestamp() >= self.expires_at {
            TokenState::Expired
        } else if self.subject_id.is_unset() {
            TokenState::Malformed
        } else {
            TokenState::Valid
        }
    }

    /// Expiry as a UTC timestamp, when representable.
    #[must_use]
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }
}

/// Issuer and lifetime applied to newly issued tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPolicy {
    issuer: String,
    ttl: Duration,
}

impl TokenPolicy {
    /// Build a policy, rejecting empty issuers and non-positive lifetimes.
    pub fn new(issuer: impl Into<String>, ttl: Duration) -> Result<Self, Error> {
        let issuer = issuer.into();
        if issuer.trim().is_empty() {
            return Err(Error::configuration("token issuer must not be empty"));
        }
        if ttl <= Duration::zero() {
            return Err(Error::configuration("token lifetime must be positive"));
        }
        Ok(Self { issuer, ttl })
    }

    /// Issuer claim value.
    pub fn issuer(&self) -> &str {
        self.issuer.as_str()
    }

    /// Token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            issuer: DEFAULT_ISSUER.to_owned(),
            ttl: Duration::days(DEFAULT_TOKEN_TTL_DAYS),
        }
    }
}
