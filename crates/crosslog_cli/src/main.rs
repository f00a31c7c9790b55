//! CROSSLOG CLI
//!
//! Inspect, verify and generate raw entry log files.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use crosslog_core::{BlockId, ChainId, ExecutingMessage, Hash};
use crosslog_log::{
    DecodeEntry, Entry, EntryStore, InitMessage, LogContext, LogResult, MemEntryStore, Record,
    SealedBlock,
};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crosslog")]
#[command(about = "CROSSLOG - fixed-slot cross-chain entry log", long_about = None)]
struct Cli {
    /// Log cursor activity (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every entry of a log file
    Inspect {
        /// Path to log file
        #[arg(short, long)]
        file: String,
    },
    /// Replay a log file and report where it ends
    Verify {
        /// Path to log file
        #[arg(short, long)]
        file: String,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a synthetic log file
    Generate {
        /// Output path
        #[arg(short, long)]
        file: String,
        /// Number of blocks to seal after the starting block
        #[arg(long, default_value_t = 16)]
        blocks: u64,
        /// Logs per block
        #[arg(long, default_value_t = 4)]
        logs: u32,
        /// Attach an executing message to every n-th log (0 for none)
        #[arg(long, default_value_t = 3)]
        exec_every: u32,
    },
}

/// Where a replayed log stands
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct Summary {
    entries: u64,
    sealed_block: Option<SealedBlock>,
    last_log: Option<InitMessage>,
    last_exec: Option<ExecutingMessage>,
    logs_since: u32,
    need: String,
}

impl Summary {
    fn of(ctx: &LogContext) -> Self {
        Self {
            entries: ctx.next_index(),
            sealed_block: ctx.sealed_block(),
            last_log: ctx.init_message(),
            last_exec: ctx.exec_message().copied(),
            logs_since: ctx.logs_since(),
            need: ctx.need().to_string(),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "crosslog=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: &Path) -> Result<MemEntryStore> {
    let data =
        std::fs::read(path).wrap_err_with(|| format!("reading log file {}", path.display()))?;
    let store = MemEntryStore::from_bytes(&data)
        .wrap_err_with(|| format!("parsing log file {}", path.display()))?;
    debug!(path = %path.display(), entries = store.size(), "loaded log file");
    Ok(store)
}

/// One line per entry; undecodable entries are shown raw
fn describe(entry: &Entry) -> String {
    let detail = match Record::decode(entry) {
        Ok(Record::SearchCheckpoint(c)) => format!(
            "block={} logs_since={} timestamp={}",
            c.block_num, c.logs_since, c.timestamp
        ),
        Ok(Record::CanonicalHash(c)) => format!("hash={}", c.hash),
        Ok(Record::InitiatingEvent(e)) => {
            format!("hash={} exec={}", e.hash, e.has_exec_msg)
        }
        Ok(Record::ExecutingLink(l)) => format!(
            "chain={} block={} log={} timestamp={}",
            l.chain(),
            l.block_num(),
            l.log_idx(),
            l.timestamp()
        ),
        Ok(Record::ExecutingCheck(c)) => format!("hash={}", c.hash),
        Ok(Record::Padding(_)) => String::new(),
        Err(err) => format!("{} ({err})", entry.to_hex()),
    };
    format!("{:<16} {detail}", entry.type_name()).trim_end().to_string()
}

fn inspect(store: &MemEntryStore) -> Vec<String> {
    store
        .entries()
        .iter()
        .enumerate()
        .map(|(idx, entry)| format!("{idx:>8}  {}", describe(entry)))
        .collect()
}

fn block(n: u64) -> BlockId {
    BlockId::new(Hash::compute(format!("block-{n}").as_bytes()), n)
}

/// Build a log of `blocks` sealed blocks on top of block 0
fn generate(blocks: u64, logs: u32, exec_every: u32) -> LogResult<MemEntryStore> {
    let mut ctx = LogContext::new();
    let mut store = MemEntryStore::new();
    ctx.force_block(block(0), 0)?;
    for n in 1..=blocks {
        ctx.seal_block(block(n - 1).hash, block(n), n * 2)?;
        for i in 0..logs {
            let hash = Hash::compute(format!("log-{n}-{i}").as_bytes()).truncate();
            let exec = (exec_every != 0 && i % exec_every == exec_every - 1).then(|| {
                let origin = Hash::compute(format!("origin-{n}-{i}").as_bytes()).truncate();
                ExecutingMessage::new(ChainId::new(10), n, i, n * 2, origin)
            });
            ctx.apply_log(block(n), i, hash, exec)?;
        }
        ctx.flush_into(&mut store)?;
    }
    ctx.flush_into(&mut store)?;
    Ok(store)
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect { file } => {
            let store = load(Path::new(&file))?;
            for line in inspect(&store) {
                println!("{line}");
            }
            Ok(())
        }
        Commands::Verify { file, json } => {
            let store = load(Path::new(&file))?;
            let ctx = LogContext::replay(&store)
                .wrap_err_with(|| format!("verifying log file {file}"))?;
            let summary = Summary::of(&ctx);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("entries:    {}", summary.entries);
                match summary.sealed_block {
                    Some(b) => println!("block:      {} @{} ({})", b.number, b.timestamp, b.hash),
                    None => println!("block:      not sealed"),
                }
                if let Some(log) = summary.last_log {
                    println!("last log:   {} ({})", log.log_idx, log.hash);
                }
                if let Some(msg) = summary.last_exec {
                    println!("executes:   {msg}");
                }
                println!("pending:    {}", summary.need);
            }
            Ok(())
        }
        Commands::Generate {
            file,
            blocks,
            logs,
            exec_every,
        } => {
            let store = generate(blocks, logs, exec_every)?;
            std::fs::write(&file, store.to_bytes())
                .wrap_err_with(|| format!("writing log file {file}"))?;
            info!(file = %file, entries = store.size(), "generated log");
            println!("wrote {} entries to {file}", store.size());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosslog_log::{ENTRY_SIZE, EncodeEntry, EntryType, LogError, Padding};

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["crosslog", "-v", "verify", "--file", "x.log", "--json"])
            .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Verify { json: true, .. }));
    }

    #[test]
    fn test_generate_replays() {
        let store = generate(20, 5, 2).unwrap();
        let ctx = LogContext::replay(&store).unwrap();
        let summary = Summary::of(&ctx);
        assert_eq!(summary.entries, store.size());
        assert_eq!(summary.sealed_block.map(|b| b.number), Some(20));
        assert_eq!(summary.last_log.map(|l| l.log_idx), Some(4));
        assert_eq!(summary.logs_since, 5);
        assert_eq!(summary.need, "{}");
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.log");
        let store = generate(3, 2, 0).unwrap();
        std::fs::write(&path, store.to_bytes()).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded, store);
        let lines = inspect(&loaded);
        assert_eq!(lines.len() as u64, store.size());
        assert!(lines[0].contains("searchCheckpoint"));
        assert!(lines[0].contains("block=0"));
        assert!(lines[1].contains("canonicalHash"));
    }

    #[test]
    fn test_load_rejects_partial_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.log");
        std::fs::write(&path, [0u8; ENTRY_SIZE + 3]).unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LogError>(),
            Some(LogError::MalformedEntry { .. })
        ));
        assert!(load(&dir.path().join("missing.log")).is_err());
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(&Padding.encode()), "padding");
        let mut bytes = [0u8; ENTRY_SIZE];
        bytes[0] = 7;
        let line = describe(&Entry::from_bytes(bytes));
        assert!(line.starts_with("unknown(7)"));
        assert!(line.contains("Unsupported entry type"));
    }

    #[test]
    fn test_verify_reports_broken_log() {
        let mut store = generate(1, 1, 1).unwrap();
        store.append(&[Padding.encode()]).unwrap();
        // a canonical hash with no checkpoint before it
        let mut bytes = [0u8; ENTRY_SIZE];
        bytes[0] = EntryType::CanonicalHash.tag();
        store.append(&[Entry::from_bytes(bytes)]).unwrap();
        let err = LogContext::replay(&store).unwrap_err();
        assert!(matches!(err, LogError::Entry { .. }));
    }

    #[test]
    fn test_summary_json() {
        let ctx = LogContext::replay(&generate(2, 3, 3).unwrap()).unwrap();
        let json = serde_json::to_value(Summary::of(&ctx)).unwrap();
        assert_eq!(json["sealed_block"]["number"], 2);
        assert_eq!(json["last_log"]["log_idx"], 2);
        assert!(json["last_exec"].is_object());
    }
}
