//! fleetcycle: rolling maintenance for instances behind load balancers.
//!
//! # Usage
//!
//! ```text
//! fleetcycle init --region ap-northeast-1 --balancer web-clb --balancer web-alb
//! fleetcycle plan --config cycle.toml
//! fleetcycle run --config cycle.toml
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ConfigArgs, OutputFormat};

#[derive(Parser)]
#[command(
    name = "fleetcycle",
    about = "Drain, maintain, and restore instances behind load balancers, one at a time",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cycle every healthy instance behind the configured balancers.
    Run {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Resolve balancer membership and show what a run would do.
    Plan {
        #[command(flatten)]
        config: ConfigArgs,
        /// Output format.
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Write a cycle.toml scaffold.
    Init {
        /// Where to write the file.
        #[arg(short, long, default_value = "cycle.toml")]
        path: String,
        #[arg(long, default_value = "ap-northeast-1")]
        region: String,
        /// Balancer name; repeat for several.
        #[arg(long = "balancer")]
        balancers: Vec<String>,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

const DEFAULT_FILTER: &str = "info,fleetcycle=debug";

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Run { config } => commands::run::run(&config).await,
        Command::Plan { config, format } => commands::plan::plan(&config, format).await,
        Command::Init {
            path,
            region,
            balancers,
            force,
        } => commands::init::init(&path, &region, &balancers, force),
    }
}
