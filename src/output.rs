use std::io::Write;

use crate::domain::{Account, Error};

/// Writes the account table as CSV, one row per account in the order given.
#[derive(Debug)]
pub struct CsvOutput<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvOutput<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    pub fn write_accounts(mut self, accounts: &[Account]) -> Result<(), Error> {
        if accounts.is_empty() {
            // serialize() emits the header with the first record only
            self.writer
                .write_record([
                    "account_number",
                    "holder_name",
                    "balance",
                    "email",
                    "account_type",
                ])
                .map_err(csv_error)?;
        }
        for account in accounts {
            self.writer.serialize(account).map_err(csv_error)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

fn csv_error(e: csv::Error) -> Error {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => Error::IO(io),
        other => Error::Ingestion(format!("CSV write error: {:?}", other)),
    }
}
