use crate::domain::{AccountNumber, Money, NewAccount};

/// One ledger intent as received from an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create(NewAccount),
    Deposit {
        account: AccountNumber,
        amount: Money,
    },
    Withdraw {
        account: AccountNumber,
        amount: Money,
    },
    Transfer {
        from: AccountNumber,
        to: AccountNumber,
        amount: Money,
    },
    Query {
        account: AccountNumber,
    },
    Interest {
        account: AccountNumber,
    },
    Delete {
        account: AccountNumber,
    },
}

impl core::fmt::Display for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Command::Create(new) => write!(
                f,
                "create,account={},type={},balance={}",
                new.account_number, new.account_type, new.balance
            ),
            Command::Deposit { account, amount } => {
                write!(f, "deposit,account={account},amount={amount}")
            }
            Command::Withdraw { account, amount } => {
                write!(f, "withdraw,account={account},amount={amount}")
            }
            Command::Transfer { from, to, amount } => {
                write!(f, "transfer,from={from},to={to},amount={amount}")
            }
            Command::Query { account } => write!(f, "query,account={account}"),
            Command::Interest { account } => write!(f, "interest,account={account}"),
            Command::Delete { account } => write!(f, "delete,account={account}"),
        }
    }
}
