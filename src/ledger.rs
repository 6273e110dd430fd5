//! The ledger service: one method per account intent.
//!
//! Every method validates its input before writing anything, and every
//! read-modify-write runs while holding the store's lock on the accounts it
//! touches, so concurrent callers never lose updates. Transfers lock both
//! accounts (lowest number first) and commit both balances in one store call.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::domain::policy::{self, AccountPolicy};
use crate::domain::validation;
use crate::domain::{
    Account, AccountNumber, AccountStore, Error, Interest, Money, NewAccount, PolicyConfig, Target,
};

/// Both sides of a completed transfer, with their new balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub source: Account,
    pub destination: Account,
    pub amount: Money,
}

#[derive(Debug)]
pub struct Ledger<S: AccountStore> {
    store: Arc<S>,
    policies: PolicyConfig,
}

impl<S: AccountStore> Clone for Ledger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policies: self.policies,
        }
    }
}

impl<S: AccountStore> Ledger<S> {
    pub fn new(store: Arc<S>, policies: PolicyConfig) -> Self {
        Self { store, policies }
    }

    fn policy(&self, account: &Account) -> AccountPolicy {
        self.policies.policy_for(account.account_type)
    }

    async fn load(&self, target: Target) -> Result<Account, Error> {
        let number = match target {
            Target::Account(n) | Target::Source(n) | Target::Destination(n) => n,
        };
        self.store
            .get(number)
            .await?
            .ok_or(Error::AccountNotFound(target))
    }

    #[instrument(skip(self, new), fields(account = new.account_number))]
    pub async fn create_account(&self, new: NewAccount) -> Result<Account, Error> {
        let number = new.account_number;
        validation::validate_account_number(number)?;

        let _lock = self.store.lock(&[number]).await?;
        if self.store.get(number).await?.is_some() {
            return Err(Error::DuplicateAccount(number));
        }

        let holder_name = validation::validate_holder_name(&new.holder_name)?;
        let email = validation::validate_email(&new.email)?;
        policy::validate_opening_balance(new.balance)?;

        let account = Account {
            holder_name,
            email,
            ..Account::from(new)
        };
        self.store.create(account.clone()).await?;

        info!(account_type = %account.account_type, balance = %account.balance, "account created");
        Ok(account)
    }

    #[instrument(skip(self))]
    pub async fn deposit(&self, number: AccountNumber, amount: Money) -> Result<Account, Error> {
        let _lock = self.store.lock(&[number]).await?;
        let mut account = self.load(Target::Account(number)).await?;

        account.balance = policy::validate_deposit(account.balance, amount)?;
        self.store.update_balance(number, account.balance).await?;

        info!(balance = %account.balance, "deposited");
        Ok(account)
    }

    #[instrument(skip(self))]
    pub async fn withdraw(&self, number: AccountNumber, amount: Money) -> Result<Account, Error> {
        let _lock = self.store.lock(&[number]).await?;
        let mut account = self.load(Target::Account(number)).await?;

        let rules = self.policy(&account);
        account.balance = policy::validate_withdraw(&rules, number, account.balance, amount)?;
        self.store.update_balance(number, account.balance).await?;

        info!(balance = %account.balance, "withdrawn");
        Ok(account)
    }

    #[instrument(skip(self))]
    pub async fn transfer(
        &self,
        from: AccountNumber,
        to: AccountNumber,
        amount: Money,
    ) -> Result<TransferReceipt, Error> {
        if from == to {
            return Err(Error::InvalidInput(format!(
                "Cannot transfer from account {from} to itself"
            )));
        }

        let _lock = self.store.lock(&[from, to]).await?;

        let mut source = self.load(Target::Source(from)).await?;
        let mut destination = self.load(Target::Destination(to)).await?;

        validation::validate_amount(amount)?;
        let rules = self.policy(&source);
        source.balance = policy::validate_withdraw(&rules, from, source.balance, amount)?;
        destination.balance = policy::validate_deposit(destination.balance, amount)?;

        self.store
            .update_balances(&[(from, source.balance), (to, destination.balance)])
            .await?;

        info!(
            source_balance = %source.balance,
            destination_balance = %destination.balance,
            "transferred"
        );
        Ok(TransferReceipt {
            source,
            destination,
            amount,
        })
    }

    #[instrument(skip(self))]
    pub async fn query(&self, number: AccountNumber) -> Result<Account, Error> {
        self.load(Target::Account(number)).await
    }

    /// Reports the interest the account would earn. The balance is untouched.
    #[instrument(skip(self))]
    pub async fn interest(&self, number: AccountNumber) -> Result<Interest, Error> {
        let account = self.load(Target::Account(number)).await?;
        policy::compute_interest(&self.policy(&account), account.balance)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, number: AccountNumber) -> Result<(), Error> {
        let _lock = self.store.lock(&[number]).await?;
        self.store.delete(number).await?;
        info!("account deleted");
        Ok(())
    }

    /// All accounts, ordered by account number.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, Error> {
        let mut accounts = self.store.list().await?;
        accounts.sort_by_key(|a| a.account_number);
        Ok(accounts)
    }
}
