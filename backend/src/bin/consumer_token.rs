//! Issue and inspect consumer bearer tokens with the configured signing key.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io;

use clap::{Parser, Subcommand};
use consumer_service::config::{BuildMode, ConsumerSettings, signing_key_from_env};
use consumer_service::domain::{ConsumerId, CredentialService, TokenClaims};
use mockable::{Clock, DefaultClock, DefaultEnv, Env};
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// `consumer-token` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "consumer-token",
    about = "Issue and validate consumer bearer tokens",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Issue an access token for a consumer id.
    Issue {
        /// Consumer id written into the token.
        #[arg(long, value_name = "id")]
        subject: i64,
    },
    /// Validate a token and print its subject and expiry.
    Validate {
        /// Compact token to check.
        #[arg(long, value_name = "token")]
        token: String,
    },
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    // Subcommand flags belong to clap, not to the settings loader.
    let settings = ConsumerSettings::load_from_iter([OsString::from("consumer-token")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    let output = run(
        args.command,
        &settings,
        &DefaultEnv::new(),
        BuildMode::from_debug_assertions(),
        &DefaultClock,
    )?;
    println!("{output}");
    Ok(())
}

fn run<E: Env>(
    command: Command,
    settings: &ConsumerSettings,
    env: &E,
    mode: BuildMode,
    clock: &dyn Clock,
) -> io::Result<String> {
    let signing_key = signing_key_from_env(env, mode).map_err(io::Error::other)?;
    let credentials = CredentialService::new(settings.credential_options(signing_key))
        .map_err(io::Error::other)?;

    match command {
        Command::Issue { subject } => {
            let policy = settings.token_policy().map_err(io::Error::other)?;
            let claims = TokenClaims::access(ConsumerId::new(subject), &policy, clock.utc());
            credentials
                .issue_token(&claims)
                .map_err(|error| io::Error::other(error.client_message().to_owned()))
        }
        Command::Validate { token } => {
            let claims = credentials
                .validate_token_at(&token, clock.utc())
                .map_err(|error| {
                    warn!(error = %error, "token rejected");
                    io::Error::other(error.client_message().to_owned())
                })?;
            let expiry = claims
                .expires_at_utc()
                .map_or_else(|| claims.expires_at.to_string(), |at| at.to_rfc3339());
            Ok(format!("subject={} expires_at={expiry}", claims.subject_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::MockEnv;
    use rstest::{fixture, rstest};
    use std::io::Write;
    use tempfile::NamedTempFile;

    struct KeyedEnv {
        env: MockEnv,
        _key_file: NamedTempFile,
    }

    #[fixture]
    fn keyed_env() -> KeyedEnv {
        let mut key_file = NamedTempFile::new().expect("temporary key file");
        key_file
            .write_all(&[b'k'; 32])
            .expect("write key bytes");
        let key_path = key_file
            .path()
            .to_str()
            .expect("temporary path should be valid UTF-8")
            .to_string();
        let mut env = MockEnv::new();
        env.expect_string()
            .times(0..)
            .returning(move |name| match name {
                "CONSUMER_SIGNING_KEY_FILE" => Some(key_path.clone()),
                _ => None,
            });
        KeyedEnv {
            env,
            _key_file: key_file,
        }
    }

    fn default_settings() -> ConsumerSettings {
        ConsumerSettings {
            issuer: None,
            token_ttl_days: None,
            argon2_memory_kib: None,
            argon2_iterations: None,
            argon2_parallelism: None,
        }
    }

    fn run_with(keyed: &KeyedEnv, command: Command) -> io::Result<String> {
        run(
            command,
            &default_settings(),
            &keyed.env,
            BuildMode::Release,
            &DefaultClock,
        )
    }

    #[rstest]
    fn issued_token_validates(keyed_env: KeyedEnv) {
        let token = run_with(&keyed_env, Command::Issue { subject: 7 }).expect("issue");
        assert_eq!(token.split('.').count(), 3);

        let report = run_with(&keyed_env, Command::Validate { token }).expect("validate");
        assert!(report.starts_with("subject=7 expires_at="), "{report}");
    }

    #[rstest]
    fn unset_subject_reports_client_message(keyed_env: KeyedEnv) {
        let err = run_with(&keyed_env, Command::Issue { subject: 0 }).expect_err("unset subject");
        assert_eq!(err.to_string(), "invalid uid");
    }

    #[rstest]
    fn garbage_token_reports_internal_error(keyed_env: KeyedEnv) {
        let err = run_with(
            &keyed_env,
            Command::Validate {
                token: "not a token".to_owned(),
            },
        )
        .expect_err("garbage token");
        assert_eq!(err.to_string(), "internal error");
    }

    #[rstest]
    fn missing_key_file_fails_before_any_command() {
        let mut env = MockEnv::new();
        env.expect_string()
            .times(0..)
            .returning(|name| match name {
                "CONSUMER_SIGNING_KEY_FILE" => Some("/nonexistent/consumer_signing_key".to_owned()),
                _ => None,
            });
        let result = run(
            Command::Issue { subject: 1 },
            &default_settings(),
            &env,
            BuildMode::Release,
            &DefaultClock,
        );
        assert!(result.is_err());
    }

    #[rstest]
    #[case(&["consumer-token", "issue", "--subject", "3"])]
    #[case(&["consumer-token", "validate", "--token", "a.b.c"])]
    fn subcommands_parse(#[case] argv: &[&str]) {
        assert!(CliArgs::try_parse_from(argv).is_ok());
    }
}
