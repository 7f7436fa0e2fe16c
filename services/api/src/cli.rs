use crate::report::{run_history, run_query, QueryArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use housing_lens::config::AppConfig;
use housing_lens::error::AppError;
use housing_lens::telemetry;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Housing Lens",
    about = "Explore housing prices and mortgage affordability from the command line",
    version
)]
struct Cli {
    #[command(flatten)]
    data: DataArgs,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run one query and print the city report
    Query(QueryArgs),
    /// Print every recorded search
    History,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug, Default)]
struct DataArgs {
    /// Price table to load instead of APP_DATASET_PATH
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,
    /// Municipality boundaries to load instead of APP_GEO_PATH
    #[arg(long, global = true)]
    geojson: Option<PathBuf>,
    /// Search history file to use instead of APP_HISTORY_PATH
    #[arg(long, global = true)]
    history: Option<PathBuf>,
}

impl DataArgs {
    fn apply(self, config: &mut AppConfig) {
        if let Some(path) = self.dataset {
            config.data.dataset_path = path;
        }
        if let Some(path) = self.geojson {
            config.data.geo_path = path;
        }
        if let Some(path) = self.history {
            config.data.history_path = path;
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    cli.data.apply(&mut config);
    telemetry::init(&config.telemetry)?;

    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(config, args).await,
        Command::Query(args) => run_query(&config, args),
        Command::History => run_history(&config),
    }
}
