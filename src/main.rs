use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use msisdn_scrub::{
    config::Config,
    database::{Database, ResultArchive, SqlLookupStore},
    models::ScrubOptions,
    pipeline::ScrubPipeline,
};

#[derive(Parser)]
#[command(name = "msisdn-scrub")]
#[command(version)]
#[command(about = "MSISDN base scrubbing for outbound-call campaigns")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrub an MSISDN list against the reference sets
    Scrub {
        /// Input file, one MSISDN per line
        #[arg(short, long)]
        input: String,

        /// Keep only numbers in this operator's series
        #[arg(short, long)]
        operator: Option<String>,

        /// Service id for the subscription check
        #[arg(short, long)]
        service_id: Option<String>,

        /// Skip the do-not-disturb stage
        #[arg(long)]
        skip_dnd: bool,

        /// Skip the subscription stage
        #[arg(long)]
        skip_sub: bool,

        /// Skip the unsubscription stage
        #[arg(long)]
        skip_unsub: bool,

        /// Write survivors to this file instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<String>,

        /// Archive survivors in the database under this run label
        #[arg(long, value_name = "LABEL")]
        archive: Option<String>,
    },
    /// Show reference-set row counts
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("msisdn_scrub={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting msisdn-scrub v{}", env!("CARGO_PKG_VERSION"));

    std::env::set_var("CONFIG_FILE", &cli.config);
    let mut config = Config::load()?;
    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }
    info!("Using database: {}", config.database.url);

    let database = Database::new(&config.database).await?;
    database.migrate().await?;

    match cli.command {
        Command::Scrub {
            input,
            operator,
            service_id,
            skip_dnd,
            skip_sub,
            skip_unsub,
            output,
            archive,
        } => {
            let msisdns = read_msisdn_list(&input)?;
            info!("Loaded {} numbers from {}", msisdns.len(), input);

            let options = ScrubOptions {
                dnd: !skip_dnd,
                operator: operator.is_some(),
                sub: !skip_sub,
                unsub: !skip_unsub,
                service_id: service_id.unwrap_or(config.scrub.default_service_id.clone()),
                target_operator: operator,
            };

            let store = SqlLookupStore::new(database.pool());
            let pipeline = ScrubPipeline::new(store, &config.scrub);
            let (survivors, report) = pipeline.run(&msisdns, &options).await?;

            println!("{}", serde_json::to_string_pretty(&report)?);

            if let Some(path) = output {
                std::fs::write(&path, survivors.join("\n"))
                    .with_context(|| format!("writing survivors to {path}"))?;
                info!("Wrote {} survivors to {}", survivors.len(), path);
            }

            if let Some(label) = archive {
                let archive = ResultArchive::new(database.pool());
                archive.archive(&label, &survivors).await?;
            }
        }
        Command::Stats => {
            let stats = database.reference_set_stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

fn read_msisdn_list(path: &str) -> Result<Vec<String>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading MSISDN list {path}"))?;
    Ok(contents
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}
