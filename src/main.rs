use std::{fs::File, io, sync::Arc};

use clap::Parser;
use tracing::info;

use bank_ledger::{
    config::Config, dlq::StdErrDLQ, engine::Engine, ingestion::CsvCommandReader,
    output::CsvOutput, store::InMemoryAccountStore, telemetry, Ledger,
};

#[tokio::main] // using Tokio runtime for async
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();
    let config = Config::parse();

    // Set up the components
    let store = match &config.snapshot {
        Some(path) => InMemoryAccountStore::open(path)?,
        None => InMemoryAccountStore::new(),
    }
    .with_lock_timeout(config.lock_timeout());
    let ledger = Ledger::new(Arc::new(store), config.policy());

    let ingestion = CsvCommandReader::new(File::open(&config.commands)?);
    let mut engine = Engine::new(ingestion, ledger, StdErrDLQ::default());

    let summary = engine.process().await?;
    info!(applied = summary.applied, rejected = summary.rejected, "done");

    CsvOutput::new(io::stdout().lock()).write_accounts(&engine.accounts().await?)?;

    Ok(())
}
