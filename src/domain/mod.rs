pub mod account;
pub mod command;
pub mod error;
pub mod money;
pub mod policy;
pub mod traits;
pub mod validation;

pub use account::{Account, AccountNumber, AccountType, NewAccount};
pub use command::Command;
pub use error::{Error, StoreError, Target};
pub use money::Money;
pub use policy::{AccountPolicy, Interest, PolicyConfig};
pub use traits::{AccountStore, CommandStream, DeadLetterQueue};
