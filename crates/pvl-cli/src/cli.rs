use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pvl",
    about = "Provenance Ledger: a hash-chained, append-only record of file provenance",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Ledger log file
    #[arg(long, global = true, default_value = "pvl.log")]
    pub ledger: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the ledger and its genesis record
    Init,
    /// Append a JSON payload
    Append(AppendArgs),
    /// Show the record at a position
    Show(ShowArgs),
    /// List records, most recent first
    Log(LogArgs),
    /// Check chain integrity
    Validate,
    /// Report every integrity violation
    Audit,
    /// Find records whose payload has key == value
    Search(SearchArgs),
    /// Print the SHA-256 of a file
    Hash(HashArgs),
    /// Register a file on the ledger
    Attest(AttestArgs),
    /// Verify a file against a recorded position
    Check(CheckArgs),
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct AppendArgs {
    /// Payload as JSON text
    pub payload: String,
}

#[derive(Args)]
pub struct ShowArgs {
    pub position: u64,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct SearchArgs {
    pub key: String,
    pub value: String,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct HashArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct AttestArgs {
    pub file: PathBuf,
    #[arg(long)]
    pub owner: String,
    /// Name to record; defaults to the file's name
    #[arg(long)]
    pub filename: Option<String>,
}

#[derive(Args)]
pub struct CheckArgs {
    pub file: PathBuf,
    #[arg(long)]
    pub position: u64,
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML config file; without one the server runs on `--ledger`
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<std::net::SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["pvl", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Init));
        assert_eq!(cli.ledger, PathBuf::from("pvl.log"));
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["pvl", "validate", "--ledger", "/tmp/l.log", "--format", "json"])
                .unwrap();
        assert_eq!(cli.ledger, PathBuf::from("/tmp/l.log"));
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn parse_append() {
        let cli = Cli::try_parse_from(["pvl", "append", r#"{"a":1}"#]).unwrap();
        if let Command::Append(args) = cli.command {
            assert_eq!(args.payload, r#"{"a":1}"#);
        } else {
            panic!("expected append");
        }
    }

    #[test]
    fn parse_log_oneline() {
        let cli = Cli::try_parse_from(["pvl", "log", "--oneline", "-n", "5"]).unwrap();
        if let Command::Log(args) = cli.command {
            assert!(args.oneline);
            assert_eq!(args.limit, Some(5));
        } else {
            panic!("expected log");
        }
    }

    #[test]
    fn parse_attest_requires_owner() {
        assert!(Cli::try_parse_from(["pvl", "attest", "a.pdf"]).is_err());
        let cli = Cli::try_parse_from(["pvl", "attest", "a.pdf", "--owner", "u1"]).unwrap();
        if let Command::Attest(args) = cli.command {
            assert_eq!(args.owner, "u1");
            assert!(args.filename.is_none());
        } else {
            panic!("expected attest");
        }
    }

    #[test]
    fn parse_check() {
        let cli = Cli::try_parse_from(["pvl", "check", "a.pdf", "--position", "4"]).unwrap();
        if let Command::Check(args) = cli.command {
            assert_eq!(args.position, 4);
        } else {
            panic!("expected check");
        }
    }

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["pvl", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind.unwrap().port(), 9000);
            assert!(args.config.is_none());
        } else {
            panic!("expected serve");
        }
    }

    #[test]
    fn show_rejects_negative_position() {
        assert!(Cli::try_parse_from(["pvl", "show", "-1"]).is_err());
    }
}
