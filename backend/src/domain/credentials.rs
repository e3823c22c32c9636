//! Credential service: password verifiers and signed bearer tokens.
//!
//! Verifiers are Argon2id PHC strings. The salt is derived from the email so
//! that deriving a verifier is a pure function of `(email, password)` while
//! every account still gets its own salt. Tokens are compact JWTs signed with
//! HMAC-SHA-256 under a single key fixed at construction.

use std::collections::HashSet;
use std::fmt;

use argon2::password_hash::{PasswordHash, PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::domain::{Error, PasswordVerifier, TokenClaims, TokenState};

const SALT_CONTEXT: &[u8] = b"consumer-service/verifier-salt/v1\0";
const SALT_LEN: usize = 16;
const FINGERPRINT_BYTES: usize = 8;

/// Symmetric token signing key.
///
/// ## Invariants
/// - The key is never empty.
#[derive(Clone)]
pub struct SigningKey(Zeroizing<Vec<u8>>);

impl SigningKey {
    /// Wrap raw key bytes, rejecting an empty key.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, Error> {
        let bytes = Zeroizing::new(bytes.into());
        if bytes.is_empty() {
            return Err(Error::configuration("signing key must not be empty"));
        }
        Ok(Self(bytes))
    }

    /// Key length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with [`SigningKey::len`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Truncated SHA-256 of the key as 16 lowercase hex characters.
    ///
    /// Identifies the active key in logs without exposing its material.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.as_bytes());
        hex::encode(&digest[..FINGERPRINT_BYTES])
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// Argon2id cost parameters for new verifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl HasherParams {
    /// Default memory cost in KiB.
    pub const DEFAULT_MEMORY_KIB: u32 = Params::DEFAULT_M_COST;
    /// Default number of passes.
    pub const DEFAULT_ITERATIONS: u32 = Params::DEFAULT_T_COST;
    /// Default degree of parallelism.
    pub const DEFAULT_PARALLELISM: u32 = Params::DEFAULT_P_COST;
}

impl Default for HasherParams {
    fn default() -> Self {
        Self {
            memory_kib: Self::DEFAULT_MEMORY_KIB,
            iterations: Self::DEFAULT_ITERATIONS,
            parallelism: Self::DEFAULT_PARALLELISM,
        }
    }
}

/// Construction-time options for [`CredentialService`].
#[derive(Debug, Clone)]
pub struct CredentialOptions {
    /// Token signing key.
    pub signing_key: SigningKey,
    /// Cost parameters for newly derived verifiers.
    pub hasher: HasherParams,
}

impl CredentialOptions {
    /// Options with the given key and default hashing costs.
    #[must_use]
    pub fn new(signing_key: SigningKey) -> Self {
        Self {
            signing_key,
            hasher: HasherParams::default(),
        }
    }

    /// Replace the hashing costs.
    #[must_use]
    pub fn with_hasher(mut self, hasher: HasherParams) -> Self {
        self.hasher = hasher;
        self
    }
}

/// Password verifier and token logic.
///
/// Holds only immutable state, so one instance can be shared freely.
pub struct CredentialService {
    hasher: Argon2<'static>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialService").finish_non_exhaustive()
    }
}

impl CredentialService {
    /// Build the service from its options.
    ///
    /// # Errors
    /// Returns a configuration error when the hashing costs are out of range.
    pub fn new(options: CredentialOptions) -> Result<Self, Error> {
        let CredentialOptions {
            signing_key,
            hasher,
        } = options;
        let params = argon2_params(hasher)?;

        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.algorithms = vec![
            jsonwebtoken::Algorithm::HS256,
            jsonwebtoken::Algorithm::HS384,
            jsonwebtoken::Algorithm::HS512,
        ];
        // Temporal checks belong to `TokenClaims::state_at`.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from(["exp".to_owned()]);

        Ok(Self {
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            encoding_key: EncodingKey::from_secret(signing_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(signing_key.as_bytes()),
            validation,
        })
    }

    /// Derive the storable verifier for `email` and `password`.
    ///
    /// The result is deterministic for a given configuration.
    ///
    /// # Errors
    /// Returns a configuration error if the KDF rejects its input.
    pub fn derive_verifier(&self, email: &str, password: &str) -> Result<PasswordVerifier, Error> {
        hash_with(&self.hasher, email, password)
    }

    /// Check a login attempt against the stored verifier.
    ///
    /// The stored verifier's own cost parameters are reused, so verifiers
    /// survive a change of configured costs. Any mismatch, including a
    /// verifier that cannot be parsed, is a user-facing "invalid password".
    ///
    /// # Errors
    /// Returns a user-facing credential error on mismatch.
    pub fn verify(
        &self,
        stored: &PasswordVerifier,
        email: &str,
        password: &str,
    ) -> Result<(), Error> {
        let Some(hasher) = hasher_for(stored) else {
            return Err(Error::credential("invalid password"));
        };
        let candidate = hash_with(&hasher, email, password)?;
        if bool::from(candidate.as_str().as_bytes().ct_eq(stored.as_str().as_bytes())) {
            Ok(())
        } else {
            Err(Error::credential("invalid password"))
        }
    }

    /// Spend the cost of a verification for an account that does not exist.
    ///
    /// Keeps a login for an unknown email as slow as a wrong password. The
    /// returned error is what [`CredentialService::verify`] reports on a
    /// mismatch.
    pub fn reject_missing_account(&self, email: &str, password: &str) -> Error {
        if let Err(err) = hash_with(&self.hasher, email, password) {
            return err;
        }
        Error::credential("invalid password")
    }

    /// Sign `claims` into a compact HS256 token.
    ///
    /// # Errors
    /// Rejects an unset subject with a user-facing error; signing failures
    /// are internal configuration errors.
    pub fn issue_token(&self, claims: &TokenClaims) -> Result<String, Error> {
        if claims.subject_id.is_unset() {
            return Err(Error::credential("invalid uid"));
        }
        encode(
            &Header::new(jsonwebtoken::Algorithm::HS256),
            claims,
            &self.encoding_key,
        )
        .map_err(|err| Error::configuration("can't sign token").with_cause(err))
    }

    /// Verify the signature of `token` and decode its claims.
    ///
    /// Only the HMAC family is accepted. Expiry is not checked here.
    ///
    /// # Errors
    /// Any structural, algorithm or signature problem is an internal error.
    pub fn parse_token(&self, token: &str) -> Result<TokenClaims, Error> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                Error::credential("can't parse token")
                    .with_user_facing(false)
                    .with_cause(err)
            })
    }

    /// Parse `token` and validate its claims at `now`.
    ///
    /// # Errors
    /// Propagates parse failures; an expired token is user-facing, claims
    /// without a subject are internal.
    pub fn validate_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, Error> {
        let claims = self.parse_token(token)?;
        match claims.state_at(now) {
            TokenState::Valid => Ok(claims),
            TokenState::Expired => Err(Error::credential("token is expired")),
            TokenState::Malformed => Err(Error::credential("bad user id").with_user_facing(false)),
        }
    }
}

fn argon2_params(hasher: HasherParams) -> Result<Params, Error> {
    Params::new(hasher.memory_kib, hasher.iterations, hasher.parallelism, None).map_err(|err| {
        Error::configuration(format!("invalid password hashing parameters: {err}"))
    })
}

fn hasher_for(stored: &PasswordVerifier) -> Option<Argon2<'static>> {
    let hash = PasswordHash::new(stored.as_str()).ok()?;
    let algorithm = Algorithm::try_from(hash.algorithm).ok()?;
    let version = hash
        .version
        .map_or(Ok(Version::V0x13), Version::try_from)
        .ok()?;
    let params = Params::try_from(&hash).ok()?;
    Some(Argon2::new(algorithm, version, params))
}

fn salt_for(email: &str) -> Result<SaltString, Error> {
    let digest = Sha256::new()
        .chain_update(SALT_CONTEXT)
        .chain_update(email.as_bytes())
        .finalize();
    SaltString::encode_b64(&digest[..SALT_LEN])
        .map_err(|err| Error::configuration(format!("can't encode verifier salt: {err}")))
}

fn hash_with(hasher: &Argon2<'_>, email: &str, password: &str) -> Result<PasswordVerifier, Error> {
    let salt = salt_for(email)?;
    let hash = hasher
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| Error::configuration(format!("can't derive password verifier: {err}")))?;
    Ok(PasswordVerifier::new(hash.to_string()))
}
