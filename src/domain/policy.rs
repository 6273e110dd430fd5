//! Balance rules per account variant.
//!
//! Variants are a tagged enum carrying their own parameters; every rule is a
//! pure function of `(policy, balance, amount)` so the ledger can evaluate it
//! before touching storage.

use rust_decimal::Decimal;

use crate::domain::{AccountNumber, AccountType, Error, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountPolicy {
    Savings { interest_rate: Decimal },
    Current { overdraft_limit: Money },
}

/// Policy parameters shared by every account of a given type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyConfig {
    pub overdraft_limit: Money,
    /// Percent per period, e.g. `5.0`.
    pub interest_rate: Decimal,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            overdraft_limit: Money::from_units(10_000),
            interest_rate: Decimal::new(50, 1),
        }
    }
}

impl PolicyConfig {
    pub fn policy_for(&self, kind: AccountType) -> AccountPolicy {
        match kind {
            AccountType::Savings => AccountPolicy::Savings {
                interest_rate: self.interest_rate,
            },
            AccountType::Current => AccountPolicy::Current {
                overdraft_limit: self.overdraft_limit,
            },
        }
    }
}

/// Result of an interest calculation. Reported only, never applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    Accrued(Money),
    NotApplicable,
}

impl core::fmt::Display for Interest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Interest::Accrued(amount) => write!(f, "Interest: {amount}"),
            Interest::NotApplicable => f.write_str("No interest for this account type"),
        }
    }
}

/// Funds that may be withdrawn without breaking the variant's floor.
pub fn available_funds(policy: &AccountPolicy, balance: Money) -> Money {
    match policy {
        AccountPolicy::Savings { .. } => balance,
        AccountPolicy::Current { overdraft_limit } => {
            Money(balance.0.saturating_add(overdraft_limit.0))
        }
    }
}

pub fn validate_opening_balance(balance: Money) -> Result<(), Error> {
    if balance.is_negative() {
        return Err(Error::InvalidAmount(
            "Initial balance cannot be negative".to_string(),
        ));
    }
    Ok(())
}

/// Returns the balance after depositing `amount`.
pub fn validate_deposit(balance: Money, amount: Money) -> Result<Money, Error> {
    if !amount.is_positive() {
        return Err(Error::InvalidAmount(
            "Deposit amount must be positive".to_string(),
        ));
    }
    balance
        .checked_add(amount)
        .ok_or_else(|| Error::InvalidAmount(format!("Deposit of {amount} overflows balance")))
}

/// Returns the balance after withdrawing `amount` under `policy`.
pub fn validate_withdraw(
    policy: &AccountPolicy,
    account: AccountNumber,
    balance: Money,
    amount: Money,
) -> Result<Money, Error> {
    if !amount.is_positive() {
        return Err(Error::InvalidAmount(
            "Withdrawal amount must be positive".to_string(),
        ));
    }

    let available = available_funds(policy, balance);
    if amount > available {
        return Err(Error::InsufficientBalance { account, available });
    }

    balance
        .checked_sub(amount)
        .ok_or_else(|| Error::InvalidAmount(format!("Withdrawal of {amount} overflows balance")))
}

pub fn compute_interest(policy: &AccountPolicy, balance: Money) -> Result<Interest, Error> {
    match policy {
        AccountPolicy::Savings { interest_rate } => balance
            .to_decimal()
            .checked_mul(*interest_rate)
            .map(|v| v / Decimal::ONE_HUNDRED)
            .and_then(Money::from_decimal)
            .map(Interest::Accrued)
            .ok_or_else(|| Error::InvalidAmount("Interest out of range".to_string())),
        AccountPolicy::Current { .. } => Ok(Interest::NotApplicable),
    }
}
