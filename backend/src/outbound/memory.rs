//! Process-local consumer repository.
//!
//! Accounts live in a mutex-guarded map keyed by email. Identifiers are
//! assigned sequentially from 1 and a second account for the same email is
//! rejected on create, which closes the gap between the service's existence
//! check and its insert.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{ConsumerRepository, ConsumerRepositoryError};
use crate::domain::{ConsumerAccount, ConsumerId};

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    accounts: HashMap<String, ConsumerAccount>,
}

/// In-memory implementation of [`ConsumerRepository`].
#[derive(Debug, Default)]
pub struct InMemoryConsumerRepository {
    state: Mutex<State>,
}

impl InMemoryConsumerRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub fn len(&self) -> Result<usize, ConsumerRepositoryError> {
        Ok(self.lock()?.accounts.len())
    }

    /// Return `true` when no account is stored.
    pub fn is_empty(&self) -> Result<bool, ConsumerRepositoryError> {
        Ok(self.lock()?.accounts.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, ConsumerRepositoryError> {
        self.state
            .lock()
            .map_err(|_| ConsumerRepositoryError::connection("consumer store lock poisoned"))
    }
}

#[async_trait]
impl ConsumerRepository for InMemoryConsumerRepository {
    async fn create_consumer(
        &self,
        account: &ConsumerAccount,
    ) -> Result<ConsumerAccount, ConsumerRepositoryError> {
        let mut state = self.lock()?;
        if state.accounts.contains_key(account.email()) {
            return Err(ConsumerRepositoryError::duplicate(account.email()));
        }
        state.next_id += 1;
        let stored = account.clone().assigned(ConsumerId::new(state.next_id));
        state
            .accounts
            .insert(stored.email().to_owned(), stored.clone());
        debug!(consumer_id = %stored.id(), "consumer stored in memory");
        Ok(stored)
    }

    async fn consumer_exists(&self, email: &str) -> Result<bool, ConsumerRepositoryError> {
        Ok(self.lock()?.accounts.contains_key(email))
    }

    async fn consumer_by_email(
        &self,
        email: &str,
    ) -> Result<ConsumerAccount, ConsumerRepositoryError> {
        self.lock()?
            .accounts
            .get(email)
            .cloned()
            .ok_or_else(|| ConsumerRepositoryError::not_found(email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PasswordVerifier;
    use chrono::Utc;
    use rstest::{fixture, rstest};

    #[fixture]
    fn repository() -> InMemoryConsumerRepository {
        InMemoryConsumerRepository::new()
    }

    fn account(email: &str) -> ConsumerAccount {
        ConsumerAccount::new(email, PasswordVerifier::new("$argon2id$stub"), Utc::now())
    }

    #[rstest]
    #[tokio::test]
    async fn assigns_sequential_ids_from_one(repository: InMemoryConsumerRepository) {
        let first = repository
            .create_consumer(&account("a@test.com"))
            .await
            .expect("create first");
        let second = repository
            .create_consumer(&account("b@test.com"))
            .await
            .expect("create second");

        assert_eq!(first.id(), ConsumerId::new(1));
        assert_eq!(second.id(), ConsumerId::new(2));
        assert_eq!(repository.len().expect("len"), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn rejects_duplicate_email_on_create(repository: InMemoryConsumerRepository) {
        repository
            .create_consumer(&account("a@test.com"))
            .await
            .expect("create first");
        let err = repository
            .create_consumer(&account("a@test.com"))
            .await
            .expect_err("duplicate must fail");

        assert_eq!(err, ConsumerRepositoryError::duplicate("a@test.com"));
        assert_eq!(repository.len().expect("len"), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn lookups_reflect_stored_accounts(repository: InMemoryConsumerRepository) {
        assert!(repository.is_empty().expect("is_empty"));
        assert!(!repository.consumer_exists("a@test.com").await.expect("exists"));

        let stored = repository
            .create_consumer(&account("a@test.com"))
            .await
            .expect("create");

        assert!(repository.consumer_exists("a@test.com").await.expect("exists"));
        let found = repository
            .consumer_by_email("a@test.com")
            .await
            .expect("lookup");
        assert_eq!(found, stored);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_email_is_not_found(repository: InMemoryConsumerRepository) {
        let err = repository
            .consumer_by_email("nobody@test.com")
            .await
            .expect_err("missing account");
        assert!(err.is_not_found());
    }

    #[rstest]
    #[tokio::test]
    async fn emails_are_matched_exactly(repository: InMemoryConsumerRepository) {
        repository
            .create_consumer(&account("a@test.com"))
            .await
            .expect("create");
        assert!(!repository.consumer_exists("A@test.com").await.expect("exists"));
    }
}
