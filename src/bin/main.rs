// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use transfer_ledger_rs::{
    Account, AccountId, Ledger, LogNotifier, TransferCoordinator, TransferRequest,
};

/// Transfer Ledger - Replay account commands from a CSV file
///
/// Opens accounts and runs transfers between them, then prints the final
/// balances to stdout.
#[derive(Parser, Debug)]
#[command(name = "transfer-ledger-rs")]
#[command(about = "Runs account transfers from a command CSV", long_about = None)]
struct Args {
    /// Path to CSV file with commands
    ///
    /// Expected format: type,account,to,amount
    /// Example: cargo run -- commands.csv > balances.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Number of threads running transfers concurrently
    #[arg(long, default_value_t = 1)]
    workers: usize,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() {
    let args = Args::parse();
    init_logging(&args);

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let coordinator = match process_commands(BufReader::new(file), args.workers) {
        Ok(coordinator) => coordinator,
        Err(e) => {
            eprintln!("Error processing commands: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_accounts(coordinator.ledger(), std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` takes precedence over
/// `--log-level`.
fn init_logging(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = if args.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("Error installing logger: {}", e);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `type, account, to, amount`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "type")]
    command: String,
    account: String,
    #[serde(default)]
    to: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
}

#[derive(Debug)]
enum Command {
    Open(Account),
    Transfer(TransferRequest),
}

impl CsvRecord {
    /// Returns `None` for unknown command types or missing fields.
    fn into_command(self) -> Option<Command> {
        let amount = self.amount?;

        match self.command.to_lowercase().as_str() {
            "open" => Some(Command::Open(Account::new(
                AccountId::from(self.account),
                amount,
            ))),
            "transfer" => {
                let to = self.to.filter(|to| !to.is_empty())?;
                Some(Command::Transfer(TransferRequest::new(self.account, to, amount)))
            }
            _ => None,
        }
    }
}

/// Process commands from a CSV reader.
///
/// All `open` rows are applied in file order first. Transfers then run on
/// `workers` threads pulling from a shared queue; with one worker they run in
/// file order. Malformed rows and rejected commands are logged and skipped.
///
/// # CSV Format
///
/// Expected columns: `type, account, to, amount`
/// - `type`: `open` or `transfer`
/// - `account`: Account to open, or transfer sender
/// - `to`: Transfer receiver (empty for `open`)
/// - `amount`: Initial balance or transfer amount
///
/// # Example
///
/// ```csv
/// type,account,to,amount
/// open,Id-1,,123.45
/// open,Id-2,,253.33
/// transfer,Id-1,Id-2,100
/// ```
///
/// # Errors
///
/// Returns a CSV error if the header row cannot be read or the underlying
/// reader fails. Errors confined to a single row are skipped.
fn process_commands<R: Read>(reader: R, workers: usize) -> Result<TransferCoordinator, csv::Error> {
    let coordinator = TransferCoordinator::new(Arc::new(Ledger::new()), Arc::new(LogNotifier));
    let mut transfers = Vec::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);
    rdr.headers()?;

    for result in rdr.deserialize::<CsvRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => {
                warn!("skipping malformed row: {}", e);
                continue;
            }
        };

        match record.into_command() {
            Some(Command::Open(account)) => {
                if let Err(e) = coordinator.ledger().create_account(account) {
                    warn!("skipping open: {}", e);
                }
            }
            Some(Command::Transfer(request)) => transfers.push(request),
            None => warn!("skipping invalid command record"),
        }
    }

    run_transfers(&coordinator, transfers, workers);
    Ok(coordinator)
}

fn run_transfers(coordinator: &TransferCoordinator, transfers: Vec<TransferRequest>, workers: usize) {
    let (tx, rx) = crossbeam::channel::unbounded();
    for request in transfers {
        // Receiver is alive until the end of this function.
        let _ = tx.send(request);
    }
    drop(tx);

    let result = crossbeam::scope(|scope| {
        for _ in 0..workers.max(1) {
            let rx = rx.clone();
            scope.spawn(move |_| {
                for request in rx.iter() {
                    let (from, to) = (request.from.clone(), request.to.clone());
                    if let Err(e) = coordinator.transfer(request) {
                        warn!(%from, %to, "skipping transfer: {}", e);
                    }
                }
            });
        }
    });
    if result.is_err() {
        error!("transfer worker panicked");
    }
}

/// Write account balances to a CSV writer, sorted by account id.
///
/// # CSV Format
///
/// Columns: `accountId, balance`
///
/// # Errors
///
/// Returns a CSV error if writing fails.
fn write_accounts<W: Write>(ledger: &Ledger, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for account in ledger.snapshot() {
        wtr.serialize(&account)?;
    }

    wtr.flush()?;
    Ok(())
}
