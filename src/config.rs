use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rust_decimal::Decimal;

use crate::domain::{Money, PolicyConfig};

/// Apply a CSV of account commands to the ledger and print the resulting
/// account table as CSV.
#[derive(Debug, Clone, Parser)]
#[command(name = "bank_ledger", version, about)]
pub struct Config {
    /// Command file (`command,account,counterparty,amount,holder,email,type`).
    pub commands: PathBuf,

    /// Account snapshot to load at start and keep up to date.
    #[arg(long, env = "LEDGER_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    /// Longest wait for an account lock before the operation fails.
    #[arg(long, env = "LEDGER_LOCK_TIMEOUT_MS", default_value_t = 5_000)]
    pub lock_timeout_ms: u64,

    /// Lowest balance a Current account may reach, as a positive amount.
    #[arg(long, env = "LEDGER_OVERDRAFT_LIMIT", default_value = "10000", value_parser = non_negative_money)]
    pub overdraft_limit: Money,

    /// Savings interest rate in percent.
    #[arg(long, env = "LEDGER_INTEREST_RATE", default_value = "5.0", value_parser = non_negative_rate)]
    pub interest_rate: Decimal,
}

fn non_negative_money(s: &str) -> Result<Money, String> {
    let amount: Money = s.parse()?;
    if amount.is_negative() {
        return Err(format!("must not be negative: {s}"));
    }
    Ok(amount)
}

fn non_negative_rate(s: &str) -> Result<Decimal, String> {
    let rate: Decimal = s.parse().map_err(|e| format!("{e}"))?;
    if rate < Decimal::ZERO {
        return Err(format!("must not be negative: {s}"));
    }
    Ok(rate)
}

impl Config {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn policy(&self) -> PolicyConfig {
        PolicyConfig {
            overdraft_limit: self.overdraft_limit,
            interest_rate: self.interest_rate,
        }
    }
}
