use std::io::Write;

use assert_cmd::Command;
use predicates as pred;
use tempfile::NamedTempFile;

fn commands(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    writeln!(file, "command,account,counterparty,amount,holder,email,type\n{body}").unwrap();
    file
}

#[test]
fn end_to_end_outputs_expected_balances() {
    // 1001: 500 + 200 - 300 transferred = 400, the 900 withdrawal is rejected
    // 2002: 0 - 9000 + 300 = -8700, the 1500 withdrawal breaks the overdraft floor
    let file = commands(
        "create,1001,,500.0,Asha,a@x.com,savings\n\
         deposit,1001,,200,,,\n\
         withdraw,1001,,900,,,\n\
         create,2002,,0,Ravi,r@x.com,current\n\
         withdraw,2002,,9000,,,\n\
         withdraw,2002,,1500,,,\n\
         transfer,1001,2002,300,,,\n\
         interest,1001,,,,,\n\
         bogus,1,,,,,",
    );

    let exe = env!("CARGO_BIN_EXE_bank_ledger");
    let mut cmd = Command::new(exe);
    cmd.arg(file.path()).env("RUST_LOG", "off");

    cmd.assert()
        .success()
        .stdout(pred::str::contains(
            "account_number,holder_name,balance,email,account_type",
        ))
        .stdout(pred::str::contains("1001,Asha,400.0000,a@x.com,Savings"))
        .stdout(pred::str::contains("2002,Ravi,-8700.0000,r@x.com,Current"))
        .stderr(pred::str::contains("Insufficient balance in account 1001"))
        .stderr(pred::str::contains("Insufficient balance in account 2002"))
        .stderr(pred::str::contains("Invalid command: bogus"));
}

#[test]
fn validation_failures_are_reported_individually() {
    let file = commands(
        "create,1,,10,,n@x.com,savings\n\
         create,2,,10,Name,not-an-email,savings\n\
         create,3,,-10,Name,n@x.com,savings\n\
         create,4,,10,Name,n@x.com,checking\n\
         deposit,99,,10,,,\n\
         transfer,5,6,1,,,",
    );

    Command::new(env!("CARGO_BIN_EXE_bank_ledger"))
        .arg(file.path())
        .env("RUST_LOG", "off")
        .assert()
        .success()
        .stderr(pred::str::contains("Invalid input: Name cannot be empty"))
        .stderr(pred::str::contains("Invalid email"))
        .stderr(pred::str::contains("Initial balance cannot be negative"))
        .stderr(pred::str::contains("unknown account type: checking"))
        .stderr(pred::str::contains("account 99 not found"))
        .stderr(pred::str::contains("source account 5 not found"));
}

#[test]
fn snapshot_carries_balances_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("accounts.csv");

    let first = commands("create,7,,100,Mina,m@x.com,current\nwithdraw,7,,150,,,");
    Command::new(env!("CARGO_BIN_EXE_bank_ledger"))
        .arg(first.path())
        .arg("--snapshot")
        .arg(&snapshot)
        .env("RUST_LOG", "off")
        .assert()
        .success();

    let second = commands("deposit,7,,25.5,,,");
    Command::new(env!("CARGO_BIN_EXE_bank_ledger"))
        .arg(second.path())
        .arg("--snapshot")
        .arg(&snapshot)
        .env("RUST_LOG", "off")
        .assert()
        .success()
        .stdout(pred::str::contains("7,Mina,-24.5000,m@x.com,Current"));
}

#[test]
fn missing_command_file_fails() {
    Command::new(env!("CARGO_BIN_EXE_bank_ledger"))
        .arg("/nonexistent/commands.csv")
        .env("RUST_LOG", "off")
        .assert()
        .failure();
}
