//! Runtime configuration for the consumer service.
//!
//! The signing key comes from a secret file named by the environment;
//! tunable settings are layered through OrthoConfig.

mod settings;
mod signing_key;

pub use settings::ConsumerSettings;
pub use signing_key::{BuildMode, SigningKeyConfigError, signing_key_from_env};
