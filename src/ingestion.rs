use std::io::Read;
use std::pin::Pin;

use futures::stream::{self, Stream};
use serde::Deserialize;

use crate::domain::traits::CommandStream;
use crate::domain::{Account, AccountNumber, AccountType, Command, Error, Money, NewAccount};

pub struct CsvCommandReader<R: Read> {
    reader: Option<csv::Reader<R>>,
}

impl<R: Read> CsvCommandReader<R> {
    pub fn new(reader: R) -> Self {
        let rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        Self { reader: Some(rdr) }
    }
}

/// Internal shape used only for CSV deserialization.
#[derive(Debug, Deserialize)]
struct CommandRow {
    command: String,
    account: AccountNumber,
    counterparty: Option<AccountNumber>,
    amount: Option<Money>,
    holder: Option<String>,
    email: Option<String>,
    #[serde(rename = "type")]
    account_type: Option<String>,
}

fn required<T>(value: Option<T>, command: &str, field: &str) -> Result<T, Error> {
    value.ok_or_else(|| Error::InvalidInput(format!("{command} requires a {field}")))
}

impl TryFrom<CommandRow> for Command {
    type Error = Error;

    fn try_from(row: CommandRow) -> Result<Self, Self::Error> {
        let name = row.command.to_ascii_lowercase();
        let account = row.account;

        let command = match name.as_str() {
            "create" => {
                let account_type: AccountType = required(row.account_type, &name, "type")?
                    .parse()
                    .map_err(Error::InvalidInput)?;
                Command::Create(NewAccount {
                    account_number: account,
                    holder_name: row.holder.unwrap_or_default(),
                    balance: required(row.amount, &name, "amount")?,
                    email: row.email.unwrap_or_default(),
                    account_type,
                })
            }
            "deposit" => Command::Deposit {
                account,
                amount: required(row.amount, &name, "amount")?,
            },
            "withdraw" | "withdrawal" => Command::Withdraw {
                account,
                amount: required(row.amount, &name, "amount")?,
            },
            "transfer" => Command::Transfer {
                from: account,
                to: required(row.counterparty, &name, "counterparty")?,
                amount: required(row.amount, &name, "amount")?,
            },
            "query" => Command::Query { account },
            "interest" => Command::Interest { account },
            "delete" => Command::Delete { account },
            other => {
                return Err(Error::Ingestion(format!("Invalid command: {}", other)));
            }
        };

        Ok(command)
    }
}

impl<R: Read + Send + 'static> CommandStream for CsvCommandReader<R> {
    type CmdStream = Pin<Box<dyn Stream<Item = Result<Command, Error>> + Send>>;

    fn stream(&mut self) -> Self::CmdStream {
        // Take ownership of the reader so the stream owns all data and is 'static.
        let Some(reader) = self.reader.take() else {
            return Box::pin(stream::empty::<Result<Command, Error>>());
        };

        let iter = reader
            .into_deserialize::<CommandRow>()
            .map(|row_res| match row_res {
                Ok(row) => Command::try_from(row),
                Err(e) => Err(Error::Ingestion(format!(
                    "CSV deserialization error: {}",
                    e
                ))),
            });

        Box::pin(stream::iter(iter))
    }
}

/// Reads an account snapshot (`account_number,holder_name,balance,email,account_type`).
pub fn read_accounts<R: Read>(reader: R) -> Result<Vec<Account>, Error> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .into_deserialize::<Account>()
        .map(|row| row.map_err(|e| Error::Ingestion(format!("Snapshot error: {}", e))))
        .collect()
}
