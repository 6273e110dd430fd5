use crate::domain::{
    Account, AccountNumber, Command, Error, Interest,
    traits::{AccountStore, CommandStream, DeadLetterQueue},
};
use crate::ledger::{Ledger, TransferReceipt};

use futures::StreamExt;
use tracing::info;

/// What a successfully applied command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created(Account),
    Updated(Account),
    Transferred(TransferReceipt),
    Found(Account),
    Interest {
        account: AccountNumber,
        interest: Interest,
    },
    Deleted(AccountNumber),
}

impl core::fmt::Display for Outcome {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Outcome::Created(account) => write!(f, "created {}", account),
            Outcome::Updated(account) => write!(
                f,
                "account={},balance={}",
                account.account_number, account.balance
            ),
            Outcome::Transferred(receipt) => write!(
                f,
                "transferred {} from {} (balance {}) to {} (balance {})",
                receipt.amount,
                receipt.source.account_number,
                receipt.source.balance,
                receipt.destination.account_number,
                receipt.destination.balance
            ),
            Outcome::Found(account) => write!(f, "{}", account),
            Outcome::Interest { account, interest } => {
                write!(f, "account={},{}", account, interest)
            }
            Outcome::Deleted(account) => write!(f, "deleted account={}", account),
        }
    }
}

/// Counts of commands applied and rejected by one `process` run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub applied: usize,
    pub rejected: usize,
}

#[derive(Debug)]
pub struct Engine<I, S, D>
where
    I: CommandStream,
    S: AccountStore,
    D: DeadLetterQueue,
{
    ingestion: I,
    ledger: Ledger<S>,
    dlq: D,
}

impl<I, S, D> Engine<I, S, D>
where
    I: CommandStream,
    S: AccountStore,
    D: DeadLetterQueue,
{
    pub fn new(ingestion: I, ledger: Ledger<S>, dlq: D) -> Self {
        Self {
            ingestion,
            ledger,
            dlq,
        }
    }

    pub async fn process(&mut self) -> Result<Summary, Error> {
        let mut res = self.ingestion.stream();
        let mut summary = Summary::default();

        while let Some(cmd) = res.next().await {
            match cmd {
                Ok(cmd) => match self.apply(&cmd).await {
                    Ok(outcome) => {
                        info!(%outcome, "applied");
                        summary.applied += 1;
                    }
                    Err(e) => {
                        self.dlq.report(Some(&cmd), &e);
                        summary.rejected += 1;
                    }
                },
                Err(e) => {
                    self.dlq.report(None, &e);
                    summary.rejected += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Routes one command to the matching ledger operation.
    pub async fn apply(&self, cmd: &Command) -> Result<Outcome, Error> {
        match cmd {
            Command::Create(new) => self
                .ledger
                .create_account(new.clone())
                .await
                .map(Outcome::Created),
            Command::Deposit { account, amount } => self
                .ledger
                .deposit(*account, *amount)
                .await
                .map(Outcome::Updated),
            Command::Withdraw { account, amount } => self
                .ledger
                .withdraw(*account, *amount)
                .await
                .map(Outcome::Updated),
            Command::Transfer { from, to, amount } => self
                .ledger
                .transfer(*from, *to, *amount)
                .await
                .map(Outcome::Transferred),
            Command::Query { account } => self.ledger.query(*account).await.map(Outcome::Found),
            Command::Interest { account } => {
                let interest = self.ledger.interest(*account).await?;
                Ok(Outcome::Interest {
                    account: *account,
                    interest,
                })
            }
            Command::Delete { account } => {
                self.ledger.delete(*account).await?;
                Ok(Outcome::Deleted(*account))
            }
        }
    }

    /// Final account table, ordered by account number.
    pub async fn accounts(&self) -> Result<Vec<Account>, Error> {
        self.ledger.list_accounts().await
    }
}
