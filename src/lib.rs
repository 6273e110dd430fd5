pub mod config;
pub mod dlq;
pub mod domain;
pub mod engine;
pub mod ingestion;
pub mod ledger;
pub mod output;
pub mod store;
pub mod telemetry;

pub use domain::{Account, AccountNumber, AccountType, Error, Money, NewAccount};
pub use ledger::{Ledger, TransferReceipt};
pub use store::InMemoryAccountStore;
