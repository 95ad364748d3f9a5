use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use commodity_tracker::core::log::init_logging;
use commodity_tracker::core::{ChartRange, Commodity};
use commodity_tracker::filter::Filter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for commodity_tracker::AppCommand {
    fn from(cmd: Commands) -> commodity_tracker::AppCommand {
        use commodity_tracker::AppCommand;
        match cmd {
            Commands::Quotes { offline } => AppCommand::Quotes { offline },
            Commands::History {
                commodity,
                range,
                force,
            } => AppCommand::History {
                commodity,
                range,
                force,
            },
            Commands::Favorite { commodity } => AppCommand::Favorite { commodity },
            Commands::Filter { filter } => AppCommand::Filter { filter },
            Commands::ClearCache => AppCommand::ClearCache,
            Commands::Watch => AppCommand::Watch,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display latest commodity prices
    Quotes {
        /// Show cached prices without fetching
        #[arg(long)]
        offline: bool,
    },
    /// Display price history for a commodity
    History {
        /// Commodity symbol, key or name (e.g. GC=F, gold)
        commodity: Commodity,
        /// Chart range: 1D, 1W, 1M, 6M, 1Y or 5Y
        #[arg(short, long, default_value = "1M")]
        range: ChartRange,
        /// Fetch again even if the history is cached
        #[arg(short, long)]
        force: bool,
    },
    /// Toggle a commodity as favorite
    Favorite { commodity: Commodity },
    /// Choose which commodities the quote table shows
    Filter { filter: Filter },
    /// Remove cached prices
    ClearCache,
    /// Refresh prices periodically until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => {
            commodity_tracker::cli::setup::setup(cli.config_path.as_deref()).map(|_| ())
        }
        Some(cmd) => commodity_tracker::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
