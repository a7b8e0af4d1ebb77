use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "telemetry-aggregator")]
#[command(about = "Rate-limited device telemetry aggregator", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one aggregation and print the report
    Run,
    /// Serve the HTTP trigger endpoint
    Serve,
    /// Serve a local mock of the telemetry endpoint
    Mock,
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Init {
        #[arg(long)]
        stdout: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so `run` can print the report on stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "telemetry_aggregator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Commands::Run) | None => {
            telemetry_aggregator::cli::run::run(config_path).await?;
        }
        Some(Commands::Serve) => {
            telemetry_aggregator::cli::run::serve(config_path).await?;
        }
        Some(Commands::Mock) => {
            telemetry_aggregator::cli::run::mock(config_path).await?;
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { stdout } => {
                telemetry_aggregator::cli::config::init(stdout)?;
            }
        },
    }

    Ok(())
}
