use async_trait::async_trait;
use futures::Stream;

use crate::domain::{Account, AccountNumber, Command, Error, Money, StoreError};

pub trait CommandStream {
    type CmdStream: Stream<Item = Result<Command, Error>> + Send + Unpin + 'static;
    fn stream(&mut self) -> Self::CmdStream;
}

pub trait DeadLetterQueue {
    fn report(&self, command: Option<&Command>, error: &Error);
}

/// Keyed account storage.
///
/// Each method is atomic on its own. Read-modify-write sequences are made
/// atomic by holding the guard returned from [`AccountStore::lock`] across
/// the read and the write.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Exclusive hold on one or more account numbers; released on drop.
    type Lock: Send;

    /// Fails with `DuplicateKey` if the number is taken.
    async fn create(&self, account: Account) -> Result<(), StoreError>;

    async fn get(&self, number: AccountNumber) -> Result<Option<Account>, StoreError>;

    async fn list(&self) -> Result<Vec<Account>, StoreError>;

    /// Replaces the balance field only.
    async fn update_balance(
        &self,
        number: AccountNumber,
        balance: Money,
    ) -> Result<(), StoreError> {
        self.update_balances(&[(number, balance)]).await
    }

    /// Applies every write or none of them.
    async fn update_balances(&self, writes: &[(AccountNumber, Money)]) -> Result<(), StoreError>;

    async fn delete(&self, number: AccountNumber) -> Result<(), StoreError>;

    /// Acquires the per-account locks for `numbers` in ascending order,
    /// waiting no longer than the store's configured timeout.
    async fn lock(&self, numbers: &[AccountNumber]) -> Result<Self::Lock, StoreError>;
}
