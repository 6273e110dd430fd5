use serde::{Deserialize, Serialize};

use crate::domain::Money;

/// Primary key of an account; immutable once the account exists.
pub type AccountNumber = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    #[serde(alias = "savings", alias = "SAVINGS")]
    Savings,
    #[serde(alias = "current", alias = "CURRENT")]
    Current,
}

impl core::fmt::Display for AccountType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AccountType::Savings => f.write_str("Savings"),
            AccountType::Current => f.write_str("Current"),
        }
    }
}

impl core::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "savings" => Ok(AccountType::Savings),
            "current" => Ok(AccountType::Current),
            other => Err(format!("unknown account type: {other}")),
        }
    }
}

/// A stored account record. Field order matches the snapshot CSV columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_number: AccountNumber,
    pub holder_name: String,
    pub balance: Money,
    pub email: String,
    pub account_type: AccountType,
}

/// Creation intent, validated by the ledger before it becomes an [`Account`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub account_number: AccountNumber,
    pub holder_name: String,
    pub balance: Money,
    pub email: String,
    pub account_type: AccountType,
}

impl From<NewAccount> for Account {
    fn from(new: NewAccount) -> Self {
        Self {
            account_number: new.account_number,
            holder_name: new.holder_name,
            balance: new.balance,
            email: new.email,
            account_type: new.account_type,
        }
    }
}

impl core::fmt::Display for Account {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "account={},holder={},type={},balance={},email={}",
            self.account_number, self.holder_name, self.account_type, self.balance, self.email
        )
    }
}
