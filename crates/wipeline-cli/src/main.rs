//! Wipeline CLI - windowed extraction of erasure reports into SQLite or files.

mod cli;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use wipeline_client::{ClientConfig, ExportClient};
use wipeline_runner::{ControlFile, ExportSink, Pipeline};
use wipeline_store::SqliteStore;

use cli::{Cli, Command, ConnectionArgs};

#[tokio::main]
async fn main() {
    // Log to stderr so piped output stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Load(args) => {
            let mut pipeline = build_pipeline(&args.connection)?;
            let mut store =
                SqliteStore::new(&args.database)?.with_batch_size(args.batch_size);
            let stats = pipeline.run_load(&mut store).await?;
            info!("{}", stats.summary());
        }
        Command::Export(args) => {
            let mut pipeline = build_pipeline(&args.connection)?;
            let sink = ExportSink::new(args.output_dir).with_raw(args.raw);
            let stats = pipeline.run_export(&sink).await?;
            info!("{}", stats.summary());
        }
    }

    Ok(())
}

fn build_pipeline(connection: &ConnectionArgs) -> anyhow::Result<Pipeline<ExportClient>> {
    let mut config =
        ClientConfig::new(&connection.url, &connection.username, &connection.password)
            .with_timeout_secs(connection.timeout_secs)
            .with_accept_invalid_certs(connection.accept_invalid_certs);
    if let Some(place) = &connection.place {
        config = config.with_place(place);
    }
    let client = ExportClient::new(config)?;
    let control = ControlFile::new(&connection.control_file);
    Ok(Pipeline::new(client, control))
}
