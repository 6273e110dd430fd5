use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex as KeyMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::domain::{Account, AccountNumber, AccountStore, Error, Money, StoreError};
use crate::ingestion;
use crate::output::CsvOutput;

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

type LockTable = Arc<Mutex<HashMap<AccountNumber, Arc<KeyMutex<()>>>>>;

/// Per-account locks held by one operation, released on drop.
///
/// Dropping the last holder of an account's lock also removes its entry from
/// the lock table, so the table only contains accounts someone is using.
#[derive(Debug)]
pub struct AccountLock {
    numbers: Vec<AccountNumber>,
    guards: Vec<OwnedMutexGuard<()>>,
    table: LockTable,
}

impl AccountLock {
    /// Locked account numbers in acquisition (ascending) order.
    pub fn numbers(&self) -> &[AccountNumber] {
        &self.numbers
    }
}

impl Drop for AccountLock {
    fn drop(&mut self) {
        self.guards.clear();

        // Entries are cloned only under the table mutex, so a count of 1 here
        // means nobody holds or waits on the lock.
        let Ok(mut table) = self.table.lock() else {
            return;
        };
        for number in &self.numbers {
            if let Entry::Occupied(e) = table.entry(*number) {
                if Arc::strong_count(e.get()) == 1 {
                    e.remove();
                }
            }
        }
    }
}

/// Account table kept in memory, optionally mirrored to a CSV snapshot.
///
/// The table itself sits behind a `RwLock` that is only held for the duration
/// of a single store call. Callers serialize read-modify-write sequences per
/// account through [`AccountStore::lock`].
#[derive(Debug)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<AccountNumber, Account>>,
    locks: LockTable,
    lock_timeout: Duration,
    snapshot: Option<PathBuf>,
    write_faults: Mutex<HashSet<AccountNumber>>,
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            locks: Arc::new(Mutex::new(HashMap::new())),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            snapshot: None,
            write_faults: Mutex::new(HashSet::new()),
        }
    }

    /// Opens a store backed by the snapshot at `path`, loading it if present.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let mut store = Self::new();

        if path.exists() {
            let accounts = ingestion::read_accounts(File::open(path)?)?;
            let table = store
                .accounts
                .get_mut()
                .map_err(|_| Error::StorageUnavailable("lock poisoned".to_string()))?;
            for account in accounts {
                match table.entry(account.account_number) {
                    Entry::Vacant(e) => {
                        e.insert(account);
                    }
                    Entry::Occupied(e) => {
                        return Err(Error::Ingestion(format!(
                            "Snapshot lists account {} twice",
                            e.key()
                        )));
                    }
                }
            }
            info!(path = %path.display(), accounts = table.len(), "loaded snapshot");
        }

        store.snapshot = Some(path.to_path_buf());
        Ok(store)
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Makes the next balance write to `number` fail with `Unavailable`.
    pub fn fail_next_write(&self, number: AccountNumber) {
        if let Ok(mut faults) = self.write_faults.lock() {
            faults.insert(number);
        }
    }

    fn table(&self) -> Result<RwLockWriteGuard<'_, HashMap<AccountNumber, Account>>, StoreError> {
        self.accounts
            .write()
            .map_err(|_| StoreError::Unavailable("account table lock poisoned".to_string()))
    }

    fn write_balance(
        &self,
        table: &mut HashMap<AccountNumber, Account>,
        number: AccountNumber,
        balance: Money,
    ) -> Result<Money, StoreError> {
        let armed = self
            .write_faults
            .lock()
            .map(|mut faults| faults.remove(&number))
            .unwrap_or(false);
        if armed {
            return Err(StoreError::Unavailable(format!(
                "write to account {number} failed"
            )));
        }

        let account = table.get_mut(&number).ok_or(StoreError::NotFound(number))?;
        Ok(std::mem::replace(&mut account.balance, balance))
    }

    /// Rewrites the snapshot file, if any. Runs with the table write lock held
    /// so snapshots are written in commit order and a failed write can be
    /// undone before anyone reads the change. The file I/O is blocking: with a
    /// snapshot configured, every mutation stalls table readers for one file
    /// rewrite, and the worker thread is blocked meanwhile.
    fn persist(&self, table: &HashMap<AccountNumber, Account>) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };

        let mut accounts: Vec<Account> = table.values().cloned().collect();
        accounts.sort_by_key(|a| a.account_number);

        let tmp = path.with_extension("tmp");
        let written = File::create(&tmp)
            .map_err(Error::from)
            .and_then(|file| CsvOutput::new(file).write_accounts(&accounts))
            .and_then(|()| fs::rename(&tmp, path).map_err(Error::from));

        written.map_err(|e| {
            warn!(path = %path.display(), error = %e, "snapshot write failed");
            StoreError::Unavailable(format!("snapshot write failed: {e}"))
        })
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    type Lock = AccountLock;

    async fn create(&self, account: Account) -> Result<(), StoreError> {
        let mut table = self.table()?;
        let number = account.account_number;

        match table.entry(number) {
            Entry::Vacant(e) => {
                e.insert(account);
            }
            Entry::Occupied(_) => return Err(StoreError::DuplicateKey(number)),
        }

        if let Err(e) = self.persist(&table) {
            table.remove(&number);
            return Err(e);
        }
        Ok(())
    }

    async fn get(&self, number: AccountNumber) -> Result<Option<Account>, StoreError> {
        let table = self
            .accounts
            .read()
            .map_err(|_| StoreError::Unavailable("account table lock poisoned".to_string()))?;
        Ok(table.get(&number).cloned())
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let table = self
            .accounts
            .read()
            .map_err(|_| StoreError::Unavailable("account table lock poisoned".to_string()))?;
        Ok(table.values().cloned().collect())
    }

    async fn update_balances(&self, writes: &[(AccountNumber, Money)]) -> Result<(), StoreError> {
        let mut table = self.table()?;

        if let Some((missing, _)) = writes.iter().find(|(n, _)| !table.contains_key(n)) {
            return Err(StoreError::NotFound(*missing));
        }

        let mut undo: Vec<(AccountNumber, Money)> = Vec::with_capacity(writes.len());
        let mut outcome = Ok(());
        for &(number, balance) in writes {
            match self.write_balance(&mut table, number, balance) {
                Ok(previous) => undo.push((number, previous)),
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        if outcome.is_ok() {
            outcome = self.persist(&table);
        }

        if outcome.is_err() {
            warn!(applied = undo.len(), "rolling back balance writes");
            for (number, previous) in undo.into_iter().rev() {
                if let Some(account) = table.get_mut(&number) {
                    account.balance = previous;
                }
            }
        }
        outcome
    }

    async fn delete(&self, number: AccountNumber) -> Result<(), StoreError> {
        let mut table = self.table()?;
        let removed = table.remove(&number).ok_or(StoreError::NotFound(number))?;

        if let Err(e) = self.persist(&table) {
            table.insert(number, removed);
            return Err(e);
        }
        Ok(())
    }

    async fn lock(&self, numbers: &[AccountNumber]) -> Result<AccountLock, StoreError> {
        let mut ordered = numbers.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let mutexes: Vec<Arc<KeyMutex<()>>> = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|_| StoreError::Unavailable("lock table poisoned".to_string()))?;
            ordered
                .iter()
                .map(|n| Arc::clone(locks.entry(*n).or_default()))
                .collect()
        };

        // Declared before the loop so that on timeout the loop's remaining
        // handles are released first and `held` can prune the table.
        let mut held = AccountLock {
            guards: Vec::with_capacity(ordered.len()),
            numbers: ordered,
            table: Arc::clone(&self.locks),
        };
        for mutex in mutexes {
            let number = held.numbers[held.guards.len()];
            match tokio::time::timeout(self.lock_timeout, mutex.lock_owned()).await {
                Ok(guard) => held.guards.push(guard),
                Err(_) => {
                    warn!(account = number, timeout = ?self.lock_timeout, "lock wait timed out");
                    return Err(StoreError::Unavailable(format!(
                        "timed out waiting for account {number}"
                    )));
                }
            }
        }

        debug!(accounts = ?held.numbers, "locked");
        Ok(held)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AccountType;

    fn account(number: AccountNumber, units: i64) -> Account {
        Account {
            account_number: number,
            holder_name: format!("holder {number}"),
            balance: Money::from_units(units),
            email: format!("h{number}@bank.com"),
            account_type: AccountType::Savings,
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_and_keeps_original() {
        let store = InMemoryAccountStore::new();
        store.create(account(1, 100)).await.unwrap();

        let err = store.create(account(1, 999)).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateKey(1));
        assert_eq!(store.get(1).await.unwrap(), Some(account(1, 100)));
    }

    #[tokio::test]
    async fn get_of_missing_account_is_none() {
        let store = InMemoryAccountStore::new();
        assert_eq!(store.get(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_balance_replaces_only_the_balance() {
        let store = InMemoryAccountStore::new();
        store.create(account(1, 100)).await.unwrap();
        store.update_balance(1, Money::from_units(7)).await.unwrap();

        let mut expected = account(1, 100);
        expected.balance = Money::from_units(7);
        assert_eq!(store.get(1).await.unwrap(), Some(expected));
        assert_eq!(
            store.update_balance(2, Money::zero()).await,
            Err(StoreError::NotFound(2))
        );
    }

    #[tokio::test]
    async fn batch_with_unknown_key_writes_nothing() {
        let store = InMemoryAccountStore::new();
        store.create(account(1, 100)).await.unwrap();

        let err = store
            .update_balances(&[(1, Money::zero()), (9, Money::zero())])
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound(9));
        assert_eq!(store.get(1).await.unwrap().unwrap().balance, Money::from_units(100));
    }

    #[tokio::test]
    async fn failed_second_write_rolls_back_the_first() {
        let store = InMemoryAccountStore::new();
        store.create(account(1, 100)).await.unwrap();
        store.create(account(2, 50)).await.unwrap();
        store.fail_next_write(2);

        let err = store
            .update_balances(&[(1, Money::from_units(70)), (2, Money::from_units(80))])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.get(1).await.unwrap().unwrap().balance, Money::from_units(100));
        assert_eq!(store.get(2).await.unwrap().unwrap().balance, Money::from_units(50));

        // the fault is one-shot
        store.update_balance(2, Money::from_units(80)).await.unwrap();
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = InMemoryAccountStore::new();
        store.create(account(1, 100)).await.unwrap();
        store.delete(1).await.unwrap();
        assert_eq!(store.get(1).await.unwrap(), None);
        assert_eq!(store.delete(1).await, Err(StoreError::NotFound(1)));
    }

    #[tokio::test]
    async fn locks_are_taken_in_ascending_order() {
        let store = InMemoryAccountStore::new();
        let lock = store.lock(&[9, 3, 9, 5]).await.unwrap();
        assert_eq!(lock.numbers(), &[3, 5, 9]);
    }

    #[tokio::test]
    async fn lock_wait_is_bounded() {
        let store = InMemoryAccountStore::new().with_lock_timeout(Duration::from_millis(20));
        let _held = store.lock(&[1]).await.unwrap();

        let err = store.lock(&[2, 1]).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        // 2 stays free after the timed-out attempt
        assert!(store.lock(&[2]).await.is_ok());
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.csv");

        let store = InMemoryAccountStore::open(&path).unwrap();
        store.create(account(1, 100)).await.unwrap();
        store.create(account(2, 5)).await.unwrap();
        store.update_balance(1, Money::from_units(60)).await.unwrap();
        store.delete(2).await.unwrap();
        drop(store);

        let reopened = InMemoryAccountStore::open(&path).unwrap();
        let accounts = reopened.list().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].balance, Money::from_units(60));
    }

    fn lock_entries(store: &InMemoryAccountStore) -> usize {
        store.locks.lock().unwrap().len()
    }

    #[tokio::test]
    async fn lock_table_is_pruned_after_use() {
        let store = Arc::new(InMemoryAccountStore::new());
        let ledger = crate::Ledger::new(Arc::clone(&store), Default::default());

        for number in 1..=1_000 {
            let err = ledger.deposit(number, Money::from_units(1)).await.unwrap_err();
            assert!(matches!(err, Error::AccountNotFound(_)));
        }
        assert!(ledger.transfer(5, 6, Money::from_units(1)).await.is_err());
        assert_eq!(lock_entries(&store), 0);

        let held = store.lock(&[1, 2]).await.unwrap();
        assert_eq!(lock_entries(&store), 2);
        drop(held);
        assert_eq!(lock_entries(&store), 0);
    }

    #[tokio::test]
    async fn timed_out_lock_leaves_no_entries() {
        let store = InMemoryAccountStore::new().with_lock_timeout(Duration::from_millis(20));
        let held = store.lock(&[1]).await.unwrap();

        assert!(store.lock(&[1, 2, 3]).await.is_err());
        assert_eq!(lock_entries(&store), 1);
        drop(held);
        assert_eq!(lock_entries(&store), 0);
    }

    #[tokio::test]
    async fn waiting_holder_keeps_entry_alive() {
        let store = Arc::new(InMemoryAccountStore::new());
        let first = store.lock(&[1]).await.unwrap();

        let waiter = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let _second = store.lock(&[1]).await.unwrap();
            })
        };
        tokio::task::yield_now().await;
        drop(first);
        waiter.await.unwrap();
        assert_eq!(lock_entries(&store), 0);
    }

    /// Opens a snapshot-backed store with account 1 at 5 units, then removes
    /// the snapshot directory so the next rewrite fails.
    async fn store_with_broken_snapshot() -> (InMemoryAccountStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let snapshot_dir = dir.path().join("data");
        fs::create_dir(&snapshot_dir).unwrap();

        let store = InMemoryAccountStore::open(snapshot_dir.join("accounts.csv")).unwrap();
        store.create(account(1, 5)).await.unwrap();
        fs::remove_dir_all(&snapshot_dir).unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn failed_snapshot_undoes_balance_write() {
        let (store, _dir) = store_with_broken_snapshot().await;

        let err = store.update_balance(1, Money::from_units(9)).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(ref msg) if msg.starts_with("snapshot write failed")));
        assert_eq!(store.get(1).await.unwrap(), Some(account(1, 5)));
    }

    #[tokio::test]
    async fn failed_snapshot_undoes_create() {
        let (store, _dir) = store_with_broken_snapshot().await;

        let err = store.create(account(2, 10)).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.get(2).await.unwrap(), None);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_snapshot_undoes_delete() {
        let (store, _dir) = store_with_broken_snapshot().await;

        let err = store.delete(1).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.get(1).await.unwrap(), Some(account(1, 5)));
    }
}
