use crate::domain::{AccountNumber, Money};

/// Which account an operation failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Account(AccountNumber),
    Source(AccountNumber),
    Destination(AccountNumber),
}

impl core::fmt::Display for Target {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Target::Account(n) => write!(f, "account {n}"),
            Target::Source(n) => write!(f, "source account {n}"),
            Target::Destination(n) => write!(f, "destination account {n}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Account number {0} already exists")]
    DuplicateAccount(AccountNumber),

    #[error("{0} not found")]
    AccountNotFound(Target),

    #[error("Insufficient balance in account {account}. Available: {available}")]
    InsufficientBalance {
        account: AccountNumber,
        available: Money,
    },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error("Ingestion failed with: {0}")]
    Ingestion(String),
}

impl Error {
    /// Only storage outages are worth retrying; every other kind is a
    /// deterministic rejection of the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StorageUnavailable(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate key {0}")]
    DuplicateKey(AccountNumber),

    #[error("key {0} not found")]
    NotFound(AccountNumber),

    #[error("{0}")]
    Unavailable(String),
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateKey(n) => Error::DuplicateAccount(n),
            StoreError::NotFound(n) => Error::AccountNotFound(Target::Account(n)),
            StoreError::Unavailable(msg) => Error::StorageUnavailable(msg),
        }
    }
}
