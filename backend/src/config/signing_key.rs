//! Signing key loading and validation.
//!
//! The key is read from a secret file named by the environment. Release
//! builds insist on a real key of adequate length; debug builds tolerate
//! short keys and may opt into a random per-process key.

use std::path::PathBuf;

use mockable::Env;
use rand::RngCore;
use tracing::{info, warn};
use zeroize::Zeroize;

use crate::domain::SigningKey;

const SIGNING_KEY_DEFAULT_PATH: &str = "/var/run/secrets/consumer_signing_key";
const SIGNING_KEY_MIN_LEN: usize = 32;
const EPHEMERAL_KEY_LEN: usize = 64;
const KEY_FILE_ENV: &str = "CONSUMER_SIGNING_KEY_FILE";
const ALLOW_EPHEMERAL_ENV: &str = "CONSUMER_ALLOW_EPHEMERAL_KEY";
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";

/// Build mode for key validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate short keys and allow ephemeral keys on request.
    Debug,
    /// Release builds require a key file of at least the minimum length.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use consumer_service::config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Errors raised while loading the signing key.
#[derive(thiserror::Error, Debug)]
pub enum SigningKeyConfigError {
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// Reading the key file failed.
    #[error("failed to read signing key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The key file is empty.
    #[error("signing key at {path} is empty")]
    KeyEmpty { path: PathBuf },
    /// The key file is too short for release builds.
    #[error("signing key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// Release builds must not allow ephemeral keys.
    #[error("CONSUMER_ALLOW_EPHEMERAL_KEY must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Load the token signing key from the environment.
///
/// # Examples
///
/// ```rust
/// use consumer_service::config::{signing_key_from_env, BuildMode};
/// use mockable::MockEnv;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let key_path = std::env::temp_dir().join("consumer_signing_key_example");
/// std::fs::write(&key_path, vec![b'a'; 32])?;
///
/// let key_path = key_path.to_str().expect("valid path").to_string();
/// let mut env = MockEnv::new();
/// env.expect_string()
///     .returning(move |name| match name {
///         "CONSUMER_SIGNING_KEY_FILE" => Some(key_path.clone()),
///         _ => None,
///     });
///
/// let key = signing_key_from_env(&env, BuildMode::Release)?;
/// assert_eq!(key.len(), 32);
/// # Ok(())
/// # }
/// ```
pub fn signing_key_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SigningKey, SigningKeyConfigError> {
    let allow_ephemeral = allow_ephemeral_from_env(env, mode)?;
    let path = PathBuf::from(
        env.string(KEY_FILE_ENV)
            .unwrap_or_else(|| SIGNING_KEY_DEFAULT_PATH.to_string()),
    );

    let key = match std::fs::read(&path) {
        Ok(bytes) => key_from_bytes(bytes, path, mode)?,
        Err(error) if allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %error,
                "using ephemeral signing key (dev only)"
            );
            ephemeral_key(path)?
        }
        Err(error) => {
            return Err(SigningKeyConfigError::KeyRead {
                path,
                source: error,
            });
        }
    };

    info!(fingerprint = %key.fingerprint(), "signing key loaded");
    Ok(key)
}

fn key_from_bytes(
    mut bytes: Vec<u8>,
    path: PathBuf,
    mode: BuildMode,
) -> Result<SigningKey, SigningKeyConfigError> {
    let length = bytes.len();
    if length < SIGNING_KEY_MIN_LEN {
        if mode == BuildMode::Release {
            bytes.zeroize();
            return Err(SigningKeyConfigError::KeyTooShort {
                path,
                length,
                min_len: SIGNING_KEY_MIN_LEN,
            });
        }
        if length > 0 {
            warn!(
                path = %path.display(),
                length,
                "signing key shorter than {SIGNING_KEY_MIN_LEN} bytes (dev only)"
            );
        }
    }
    SigningKey::new(bytes).map_err(|_| SigningKeyConfigError::KeyEmpty { path })
}

fn ephemeral_key(path: PathBuf) -> Result<SigningKey, SigningKeyConfigError> {
    let mut bytes = vec![0_u8; EPHEMERAL_KEY_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    SigningKey::new(bytes).map_err(|_| SigningKeyConfigError::KeyEmpty { path })
}

fn allow_ephemeral_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<bool, SigningKeyConfigError> {
    let Some(value) = env.string(ALLOW_EPHEMERAL_ENV) else {
        return Ok(false);
    };
    match parse_bool(&value) {
        Some(true) if mode.is_debug() => Ok(true),
        Some(true) => Err(SigningKeyConfigError::EphemeralNotAllowed),
        Some(false) => Ok(false),
        None if mode.is_debug() => {
            warn!(
                value = %value,
                "invalid CONSUMER_ALLOW_EPHEMERAL_KEY; defaulting to disabled"
            );
            Ok(false)
        }
        None => Err(SigningKeyConfigError::InvalidEnv {
            name: ALLOW_EPHEMERAL_ENV,
            value,
            expected: BOOL_EXPECTED,
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests;
