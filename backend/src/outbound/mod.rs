//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **memory**: process-local consumer storage for tools and tests
//!
//! Adapters are thin translators between domain types and storage
//! representations. They contain no business logic.

pub mod memory;
