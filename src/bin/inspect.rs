//! qjournal inspection tool
//!
//! Reports on the log files of a journal directory.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use qjournal::log::LogRecovery;
use qjournal::storage::Side;
use qjournal::{JournalConfig, RawBytes, TransactionJournal, TransactionKey, Xid};
use tracing_subscriber::{fmt, EnvFilter};

/// qjournal inspector
#[derive(Parser, Debug)]
#[command(name = "qjournal-inspect")]
#[command(about = "Inspect the log files of a transactional queue journal")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan both log files read-only and report their integrity
    Verify {
        /// Journal directory
        dir: PathBuf,

        /// The journal is keyed by XA branch ids
        #[arg(long)]
        xa: bool,
    },

    /// Open the journal and list pending transactions
    ///
    /// Opening runs recovery, which cuts off a corrupt tail.
    Pending {
        /// Journal directory
        dir: PathBuf,

        /// The journal is keyed by XA branch ids
        #[arg(long)]
        xa: bool,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,qjournal=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();
    tracing::debug!("qjournal-inspect v{}", qjournal::VERSION);

    let outcome = match args.command {
        Command::Verify { dir, xa: false } => verify::<u32>(&dir),
        Command::Verify { dir, xa: true } => verify::<Xid>(&dir),
        Command::Pending { dir, xa: false } => pending::<u32>(dir),
        Command::Pending { dir, xa: true } => pending::<Xid>(dir),
    };

    if let Err(e) = outcome {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn verify<K: TransactionKey>(dir: &Path) -> qjournal::Result<()> {
    for side in [Side::A, Side::B] {
        let path = dir.join(side.file_name());
        if !path.exists() {
            println!("{}: missing", side);
            continue;
        }

        let report = LogRecovery::verify::<K>(&path)?;
        println!(
            "{}: {} records, last lsn {}, {} valid bytes",
            side, report.records_recovered, report.last_lsn, report.valid_len
        );
        if report.was_truncated {
            println!(
                "  corrupt tail: {} bytes ({})",
                report.truncated_bytes,
                report.corruption.as_deref().unwrap_or("unknown")
            );
        }
    }
    Ok(())
}

fn pending<K: TransactionKey + Display>(dir: PathBuf) -> qjournal::Result<()> {
    let config = JournalConfig::builder().journal_dir(dir).build();
    let journal = TransactionJournal::<K, RawBytes>::open(config, RawBytes)?;

    let snapshot = journal.all_log_entries();
    println!("{} pending transactions", snapshot.len());

    for (tx, entries) in &snapshot {
        println!("tx {}:", tx);
        for entry in entries {
            match entry.queue_name() {
                Some(queue) => println!(
                    "  {} {} ({} bytes)",
                    entry.operation(),
                    queue,
                    entry.payload().map_or(0, <[u8]>::len)
                ),
                None => println!("  {}", entry.operation()),
            }
        }
    }

    journal.close()
}
