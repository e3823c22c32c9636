//! Consumer identity service: registration, login and bearer token
//! validation behind hexagonal ports.

pub mod config;
pub mod domain;
pub mod outbound;
