//! Consumer account data model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage-assigned numeric account identifier.
///
/// `0` means the identifier has not been assigned yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsumerId(i64);

impl ConsumerId {
    /// Identifier of an account that storage has not persisted yet.
    pub const UNSET: Self = Self(0);

    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Return `true` for the zero value.
    #[must_use]
    pub const fn is_unset(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stored, derived representation of a password.
///
/// The value is opaque to everything except the credential service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordVerifier(String);

impl PasswordVerifier {
    /// Wrap a verifier string read from storage.
    pub fn new(verifier: impl Into<String>) -> Self {
        Self(verifier.into())
    }

    /// Borrow the encoded verifier.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordVerifier(..)")
    }
}

/// Persistent consumer identity record.
///
/// ## Invariants
/// - `email` is the unique storage key.
/// - `id` is [`ConsumerId::UNSET`] until storage assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerAccount {
    id: ConsumerId,
    email: String,
    registered_at: DateTime<Utc>,
    verifier: PasswordVerifier,
}

impl ConsumerAccount {
    /// Build an account that has not been persisted yet.
    pub fn new(
        email: impl Into<String>,
        verifier: PasswordVerifier,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ConsumerId::UNSET,
            email: email.into(),
            registered_at,
            verifier,
        }
    }

    /// Return a copy of the account carrying a storage-assigned identifier.
    #[must_use]
    pub fn assigned(self, id: ConsumerId) -> Self {
        Self { id, ..self }
    }

    /// Account identifier.
    pub fn id(&self) -> ConsumerId {
        self.id
    }

    /// Unique email address.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Registration timestamp.
    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Stored password verifier.
    pub fn verifier(&self) -> &PasswordVerifier {
        &self.verifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    fn new_accounts_are_unassigned() {
        let registered_at = Utc
            .timestamp_opt(0, 0)
            .single()
            .expect("valid fixture timestamp");
        let account = ConsumerAccount::new("a@b.com", PasswordVerifier::new("v"), registered_at);
        assert!(account.id().is_unset());

        let stored = account.clone().assigned(ConsumerId::new(42));
        assert_eq!(stored.id().get(), 42);
        assert_eq!(stored.email(), account.email());
        assert_eq!(stored.verifier(), account.verifier());
    }

    #[rstest]
    fn verifier_debug_is_redacted() {
        let verifier = PasswordVerifier::new("secret-hash");
        assert!(!format!("{verifier:?}").contains("secret-hash"));
    }

    #[rstest]
    fn consumer_id_serialises_as_number() {
        let json = serde_json::to_string(&ConsumerId::new(7)).expect("id serialises");
        assert_eq!(json, "7");
    }
}
