//! Domain ports and supporting types for the hexagonal boundary.

mod consumer_identity;
mod consumer_repository;

pub use consumer_identity::ConsumerIdentity;
#[cfg(test)]
pub use consumer_repository::MockConsumerRepository;
pub use consumer_repository::{ConsumerRepository, ConsumerRepositoryError};
