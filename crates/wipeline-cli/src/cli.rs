//! CLI command definitions and argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Wipeline - pull erasure report exports into a database or files.
#[derive(Debug, Parser)]
#[command(name = "wipeline")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract pending windows and load them into the database
    Load(LoadArgs),

    /// Extract pending windows and write report documents to disk
    Export(ExportArgs),
}

/// Connection settings shared by every command.
#[derive(Debug, Args)]
pub struct ConnectionArgs {
    /// Report export endpoint URL
    #[arg(short, long)]
    pub url: String,

    /// API username
    #[arg(long)]
    pub username: String,

    /// API password
    #[arg(short, long, env = "BLANCCO_API_PW", hide_env_values = true)]
    pub password: String,

    /// Restrict extraction to reports tagged with this place
    #[arg(long)]
    pub place: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "180")]
    pub timeout_secs: u64,

    /// Accept self-signed TLS certificates
    #[arg(long)]
    pub accept_invalid_certs: bool,

    /// Path of the JSON checkpoint file
    #[arg(short, long, default_value = "blancco_api_control.json")]
    pub control_file: PathBuf,
}

/// Arguments for the load command.
#[derive(Debug, Parser)]
pub struct LoadArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// SQLite database path
    #[arg(short, long, default_value = "wipeline.db")]
    pub database: PathBuf,

    /// Rows per staging insert transaction
    #[arg(long, default_value = "1000")]
    pub batch_size: usize,
}

/// Arguments for the export command.
#[derive(Debug, Parser)]
pub struct ExportArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Directory receiving the exported documents
    #[arg(short, long, default_value = "exports")]
    pub output_dir: PathBuf,

    /// Write raw response bodies instead of per-record documents
    #[arg(long)]
    pub raw: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_load_command_parses() {
        let cli = Cli::parse_from([
            "wipeline",
            "load",
            "--url",
            "https://console.example.com/ws/report/export",
            "--username",
            "api-user",
            "--password",
            "secret",
            "--database",
            "out.db",
        ]);
        match cli.command {
            Command::Load(args) => {
                assert_eq!(args.connection.username, "api-user");
                assert_eq!(args.database, PathBuf::from("out.db"));
                assert_eq!(args.batch_size, 1000);
                assert_eq!(args.connection.timeout_secs, 180);
                assert_eq!(
                    args.connection.control_file,
                    PathBuf::from("blancco_api_control.json")
                );
            }
            _ => panic!("Expected Load command"),
        }
    }

    #[test]
    fn test_export_command_parses() {
        let cli = Cli::parse_from([
            "wipeline",
            "export",
            "--url",
            "https://console.example.com/ws/report/export",
            "--username",
            "api-user",
            "--password",
            "secret",
            "--output-dir",
            "/tmp/out",
            "--raw",
        ]);
        match cli.command {
            Command::Export(args) => {
                assert_eq!(args.output_dir, PathBuf::from("/tmp/out"));
                assert!(args.raw);
            }
            _ => panic!("Expected Export command"),
        }
    }

    #[test]
    fn test_place_filter_is_optional() {
        let cli = Cli::parse_from([
            "wipeline",
            "load",
            "--url",
            "https://console.example.com/ws/report/export",
            "--username",
            "api-user",
            "--password",
            "secret",
            "--place",
            "Warehouse 7",
        ]);
        match cli.command {
            Command::Load(args) => {
                assert_eq!(args.connection.place.as_deref(), Some("Warehouse 7"));
            }
            _ => panic!("Expected Load command"),
        }
    }
}
