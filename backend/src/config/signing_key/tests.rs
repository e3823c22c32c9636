//! Unit tests for signing key loading.

use super::*;
use mockable::MockEnv;
use rstest::rstest;
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn key_file(len: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temporary key file");
    file.write_all(&vec![b'k'; len]).expect("write key bytes");
    file
}

fn path_str(file: &NamedTempFile) -> String {
    file.path()
        .to_str()
        .expect("temporary path should be valid UTF-8")
        .to_string()
}

fn mock_env(vars: HashMap<String, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

fn env_with(pairs: &[(&str, String)]) -> MockEnv {
    mock_env(
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect(),
    )
}

fn missing_path() -> String {
    let dir = tempfile::tempdir().expect("temporary dir");
    dir.path()
        .join("absent-key")
        .to_str()
        .expect("valid UTF-8")
        .to_string()
}

#[rstest]
#[case(BuildMode::Release)]
#[case(BuildMode::Debug)]
fn key_file_of_minimum_length_is_accepted(#[case] mode: BuildMode) {
    let file = key_file(SIGNING_KEY_MIN_LEN);
    let env = env_with(&[(KEY_FILE_ENV, path_str(&file))]);

    let key = signing_key_from_env(&env, mode).expect("key should load");
    assert_eq!(key.len(), SIGNING_KEY_MIN_LEN);
}

#[rstest]
fn release_short_key_is_rejected() {
    let file = key_file(SIGNING_KEY_MIN_LEN - 1);
    let env = env_with(&[(KEY_FILE_ENV, path_str(&file))]);

    let err = signing_key_from_env(&env, BuildMode::Release).expect_err("short key must fail");
    assert!(matches!(
        err,
        SigningKeyConfigError::KeyTooShort {
            length,
            min_len: SIGNING_KEY_MIN_LEN,
            ..
        } if length == SIGNING_KEY_MIN_LEN - 1
    ));
}

#[rstest]
fn debug_short_key_is_tolerated() {
    let file = key_file(1);
    let env = env_with(&[(KEY_FILE_ENV, path_str(&file))]);

    let key = signing_key_from_env(&env, BuildMode::Debug).expect("debug accepts short key");
    assert_eq!(key.len(), 1);
}

#[rstest]
#[case(BuildMode::Release)]
#[case(BuildMode::Debug)]
fn empty_key_file_is_rejected(#[case] mode: BuildMode) {
    let file = key_file(0);
    let env = env_with(&[(KEY_FILE_ENV, path_str(&file))]);

    let err = signing_key_from_env(&env, mode).expect_err("empty key must fail");
    assert!(matches!(
        err,
        SigningKeyConfigError::KeyEmpty { .. } | SigningKeyConfigError::KeyTooShort { .. }
    ));
}

#[rstest]
#[case(BuildMode::Release)]
#[case(BuildMode::Debug)]
fn missing_key_file_without_ephemeral_is_rejected(#[case] mode: BuildMode) {
    let env = env_with(&[(KEY_FILE_ENV, missing_path())]);

    let err = signing_key_from_env(&env, mode).expect_err("missing key must fail");
    assert!(matches!(err, SigningKeyConfigError::KeyRead { .. }));
}

#[rstest]
#[case("1")]
#[case("true")]
#[case("YES")]
fn debug_ephemeral_key_is_generated(#[case] flag: &str) {
    let env = env_with(&[
        (KEY_FILE_ENV, missing_path()),
        (ALLOW_EPHEMERAL_ENV, flag.to_string()),
    ]);

    let first = signing_key_from_env(&env, BuildMode::Debug).expect("ephemeral key");
    let second = signing_key_from_env(&env, BuildMode::Debug).expect("ephemeral key");
    assert_eq!(first.len(), EPHEMERAL_KEY_LEN);
    assert_ne!(first.fingerprint(), second.fingerprint());
}

#[rstest]
fn debug_ephemeral_flag_does_not_replace_existing_key() {
    let file = key_file(SIGNING_KEY_MIN_LEN);
    let env = env_with(&[
        (KEY_FILE_ENV, path_str(&file)),
        (ALLOW_EPHEMERAL_ENV, "1".to_string()),
    ]);

    let loaded = signing_key_from_env(&env, BuildMode::Debug).expect("key should load");
    let expected = SigningKey::new(vec![b'k'; SIGNING_KEY_MIN_LEN]).expect("non-empty");
    assert_eq!(loaded.fingerprint(), expected.fingerprint());
}

#[rstest]
fn release_ephemeral_flag_is_rejected() {
    let file = key_file(SIGNING_KEY_MIN_LEN);
    let env = env_with(&[
        (KEY_FILE_ENV, path_str(&file)),
        (ALLOW_EPHEMERAL_ENV, "1".to_string()),
    ]);

    let err =
        signing_key_from_env(&env, BuildMode::Release).expect_err("ephemeral must be refused");
    assert!(matches!(err, SigningKeyConfigError::EphemeralNotAllowed));
}

#[rstest]
fn release_invalid_ephemeral_flag_is_rejected() {
    let env = env_with(&[(ALLOW_EPHEMERAL_ENV, "maybe".to_string())]);

    let err = signing_key_from_env(&env, BuildMode::Release).expect_err("invalid flag must fail");
    assert!(matches!(
        err,
        SigningKeyConfigError::InvalidEnv {
            name: ALLOW_EPHEMERAL_ENV,
            ..
        }
    ));
}

#[rstest]
fn debug_invalid_ephemeral_flag_defaults_to_disabled() {
    let env = env_with(&[
        (KEY_FILE_ENV, missing_path()),
        (ALLOW_EPHEMERAL_ENV, "maybe".to_string()),
    ]);

    let err = signing_key_from_env(&env, BuildMode::Debug).expect_err("no ephemeral fallback");
    assert!(matches!(err, SigningKeyConfigError::KeyRead { .. }));
}

#[rstest]
fn default_path_is_used_when_unset() {
    let env = mock_env(HashMap::new());

    // A real key may be provisioned on this host.
    if let Err(SigningKeyConfigError::KeyRead { path, .. }) =
        signing_key_from_env(&env, BuildMode::Release)
    {
        assert_eq!(path, PathBuf::from(SIGNING_KEY_DEFAULT_PATH));
    }
}
