use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use pvl_crypto::ContentHasher;
use pvl_ledger::{Ledger, LedgerReader, LedgerWriter, ValidationReport};
use pvl_provenance::{ProvenanceService, Verification};
use pvl_server::{PvlServer, ServerConfig, StorageConfig};
use pvl_store::{FileRecordStore, FileStoreConfig};
use pvl_types::Record;
use serde::Serialize;

use crate::cli::*;

type FileLedger = Ledger<FileRecordStore>;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    let path = cli.ledger.as_path();
    match cli.command {
        Command::Init => cmd_init(path, format),
        Command::Append(args) => cmd_append(path, format, args),
        Command::Show(args) => cmd_show(path, format, args),
        Command::Log(args) => cmd_log(path, format, args),
        Command::Validate => cmd_validate(path, format),
        Command::Audit => cmd_audit(path, format),
        Command::Search(args) => cmd_search(path, format, args),
        Command::Hash(args) => cmd_hash(format, args),
        Command::Attest(args) => cmd_attest(path, format, args),
        Command::Check(args) => cmd_check(path, format, args),
        Command::Serve(args) => cmd_serve(path, args),
    }
}

fn cmd_init(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let ledger = open_ledger(path)?;
    let genesis = ledger.ensure_genesis()?;
    match format {
        OutputFormat::Json => print_json(&genesis.to_view()),
        OutputFormat::Text => {
            println!(
                "{} Initialized ledger in {}",
                "✓".green().bold(),
                path.display().to_string().bold()
            );
            println!("  Genesis: {}", genesis.digest.as_str().yellow());
            println!("  Records: {}", ledger.len()?);
            Ok(())
        }
    }
}

fn cmd_append(path: &Path, format: OutputFormat, args: AppendArgs) -> anyhow::Result<()> {
    let payload: serde_json::Value =
        serde_json::from_str(&args.payload).context("payload is not valid JSON")?;
    let ledger = open_ledger(path)?;
    let record = ledger.append(&payload)?;
    match format {
        OutputFormat::Json => print_json(&record.to_view()),
        OutputFormat::Text => {
            println!("{} Appended {}", "✓".green().bold(), record_label(&record));
            Ok(())
        }
    }
}

fn cmd_show(path: &Path, format: OutputFormat, args: ShowArgs) -> anyhow::Result<()> {
    let ledger = open_existing(path)?;
    let record = ledger.get_by_position(args.position)?;
    match format {
        OutputFormat::Json => print_json(&record.to_view()),
        OutputFormat::Text => {
            print_record(&record);
            Ok(())
        }
    }
}

fn cmd_log(path: &Path, format: OutputFormat, args: LogArgs) -> anyhow::Result<()> {
    let ledger = open_existing(path)?;
    let limit = args.limit.unwrap_or(usize::MAX);
    let records: Vec<Record> = ledger.records()?.into_iter().rev().take(limit).collect();

    match format {
        OutputFormat::Json => {
            let views: Vec<_> = records.iter().map(Record::to_view).collect();
            print_json(&views)
        }
        OutputFormat::Text => {
            for record in &records {
                if args.oneline {
                    println!("{} {}", record_label(record), record.payload.dimmed());
                } else {
                    print_record(record);
                    println!();
                }
            }
            Ok(())
        }
    }
}

fn cmd_validate(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let ledger = open_existing(path)?;
    let valid = ledger.validate_chain()?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "valid": valid }))?,
        OutputFormat::Text if valid => println!(
            "{} Chain valid ({} records)",
            "✓".green().bold(),
            ledger.len()?
        ),
        OutputFormat::Text => println!("{} Chain invalid", "✗".red().bold()),
    }
    if !valid {
        bail!("chain validation failed; run `pvl audit` for details");
    }
    Ok(())
}

fn cmd_audit(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let ledger = open_existing(path)?;
    let report = ledger.audit()?;
    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => print_report(&report),
    }
    if !report.is_valid() {
        bail!("{} integrity violation(s) found", report.violations.len());
    }
    Ok(())
}

fn cmd_search(path: &Path, format: OutputFormat, args: SearchArgs) -> anyhow::Result<()> {
    let ledger = open_existing(path)?;
    let limit = args.limit.unwrap_or(usize::MAX);
    let mut found = Vec::new();
    for record in ledger
        .find_by_payload_field(&args.key, args.value.as_str())?
        .take(limit)
    {
        found.push(record?);
    }

    match format {
        OutputFormat::Json => {
            let views: Vec<_> = found.iter().map(Record::to_view).collect();
            print_json(&views)
        }
        OutputFormat::Text => {
            if found.is_empty() {
                println!("No records with {} = {}.", args.key.bold(), args.value.bold());
            }
            for record in &found {
                println!("{} {}", record_label(record), record.payload.dimmed());
            }
            Ok(())
        }
    }
}

fn cmd_hash(format: OutputFormat, args: HashArgs) -> anyhow::Result<()> {
    let digest = ContentHasher::hash_reader(open_file(&args.file)?)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "file": args.file,
            "filehash": digest,
        })),
        OutputFormat::Text => {
            println!("{}  {}", digest, args.file.display());
            Ok(())
        }
    }
}

fn cmd_attest(path: &Path, format: OutputFormat, args: AttestArgs) -> anyhow::Result<()> {
    let filename = match args.filename {
        Some(name) => name,
        None => args
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    let service = ProvenanceService::new(open_ledger(path)?);
    let attestation = service.register_reader(open_file(&args.file)?, &args.owner, &filename)?;

    match format {
        OutputFormat::Json => print_json(&attestation),
        OutputFormat::Text => {
            println!(
                "{} Registered {} at {}",
                "✓".green().bold(),
                filename.bold(),
                format!("#{}", attestation.block_index).yellow()
            );
            println!("  File hash: {}", attestation.entry.filehash());
            println!("  Record:    {}", attestation.digest);
            Ok(())
        }
    }
}

fn cmd_check(path: &Path, format: OutputFormat, args: CheckArgs) -> anyhow::Result<()> {
    let service = ProvenanceService::new(open_existing(path)?);
    let outcome = service.verify_reader(open_file(&args.file)?, args.position)?;

    match format {
        OutputFormat::Json => print_json(&outcome)?,
        OutputFormat::Text => match &outcome {
            Verification::Verified { position, filehash } => println!(
                "{} {} matches record #{position} ({})",
                "✓".green().bold(),
                args.file.display(),
                filehash.short()
            ),
            Verification::Tampered { expected, actual } => {
                println!("{} {} does not match", "✗".red().bold(), args.file.display());
                println!("  Recorded: {expected}");
                println!("  Actual:   {actual}");
            }
            Verification::BrokenReference { position, reason } => println!(
                "{} Record #{position} cannot be checked: {reason}",
                "✗".red().bold()
            ),
        },
    }
    if !outcome.is_verified() {
        bail!("verification failed");
    }
    Ok(())
}

fn cmd_serve(path: &Path, args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(file) => ServerConfig::load(file)?,
        None => ServerConfig {
            storage: StorageConfig::File {
                path: path.to_path_buf(),
                sync: Default::default(),
            },
            ..ServerConfig::default()
        },
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    let server = PvlServer::new(config)?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(server.serve())?;
    Ok(())
}

// ---- Helpers ----

fn open_ledger(path: &Path) -> anyhow::Result<Arc<FileLedger>> {
    let store = FileRecordStore::open(path, FileStoreConfig::default())
        .with_context(|| format!("failed to open ledger at {}", path.display()))?;
    let stats = store.recovery_stats();
    if stats.skipped > 0 || stats.truncated_bytes > 0 {
        tracing::warn!(
            skipped = stats.skipped,
            truncated_bytes = stats.truncated_bytes,
            "ledger log needed recovery"
        );
    }
    Ok(Arc::new(Ledger::new(store)))
}

/// Open a ledger that must already exist.
fn open_existing(path: &Path) -> anyhow::Result<Arc<FileLedger>> {
    if !path.exists() {
        bail!(
            "no ledger at {}; run `pvl init` first",
            path.display()
        );
    }
    open_ledger(path)
}

fn open_file(path: &Path) -> anyhow::Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn record_label(record: &Record) -> String {
    format!(
        "{} {}",
        format!("#{}", record.position).yellow().bold(),
        record.digest.short().dimmed()
    )
}

fn print_record(record: &Record) {
    println!("{}", record_label(record));
    println!("  Digest:   {}", record.digest);
    println!("  Previous: {}", record.previous_digest);
    println!("  Time:     {}", record.timestamp);
    println!("  Payload:  {}", record.payload);
}

fn print_report(report: &ValidationReport) {
    let mark = |ok: bool| if ok { "✓".green() } else { "✗".red() };
    println!("Audit of {} records", report.record_count.to_string().bold());
    println!("  {} genesis", mark(report.genesis_valid));
    println!("  {} sequence", mark(report.sequence_contiguous));
    println!("  {} links", mark(report.links_valid));
    println!("  {} digests", mark(report.digests_valid));
    for violation in &report.violations {
        println!(
            "  {} #{} {:?}: {}",
            "!".red().bold(),
            violation.position,
            violation.kind,
            violation.description
        );
    }
}
