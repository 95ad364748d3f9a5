pub mod cli;
pub mod coordinator;
pub mod core;
pub mod favorites;
pub mod filter;
pub mod history;
pub mod providers;
pub mod scheduler;
pub mod store;

use crate::cli::ui;
use crate::coordinator::{CACHE_CLEARED_NOTICE, QuoteSyncCoordinator};
use crate::core::config::AppConfig;
use crate::core::{ChartRange, Commodity};
use crate::filter::Filter;
use crate::providers::YahooFinanceSource;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Show the quote table, refreshing first unless offline.
    Quotes { offline: bool },
    History {
        commodity: Commodity,
        range: ChartRange,
        force: bool,
    },
    Favorite { commodity: Commodity },
    Filter { filter: Filter },
    ClearCache,
    Watch,
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

fn build_coordinator(config: &AppConfig) -> Result<Arc<QuoteSyncCoordinator>> {
    let yahoo = &config.providers.yahoo;
    let source = YahooFinanceSource::new(&yahoo.base_url, yahoo.timeout())?;

    let data_path = config
        .default_data_path()
        .inspect_err(|e| warn!(error = %e, "Could not resolve data directory"))
        .ok();
    let store = store::open_store(data_path.as_deref());

    Ok(Arc::new(QuoteSyncCoordinator::new(Arc::new(source), store)))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Commodity tracker starting...");

    let config = load_config(config_path)?;
    let coordinator = build_coordinator(&config)?;

    match command {
        AppCommand::Quotes { offline } => {
            if !offline {
                let spinner = ui::new_spinner("Fetching latest prices...");
                coordinator.refresh().await;
                spinner.finish_and_clear();
            }
            println!("{}", coordinator.state().display_as_table());
        }
        AppCommand::History {
            commodity,
            range,
            force,
        } => {
            let spinner = ui::new_spinner(&format!("Loading {range} history..."));
            coordinator.load_history(commodity, range, force).await;
            spinner.finish_and_clear();
            println!("{}", coordinator.state().display_history());
        }
        AppCommand::Favorite { commodity } => {
            let message = if coordinator.toggle_favorite(commodity) {
                format!("{} added to favorites.", commodity.display_name())
            } else {
                format!("{} removed from favorites.", commodity.display_name())
            };
            println!("{}", ui::style_text(&message, ui::StyleType::Info));
        }
        AppCommand::Filter { filter } => {
            coordinator.set_filter(filter);
            println!(
                "{}",
                ui::style_text(&format!("Showing {filter} commodities."), ui::StyleType::Info)
            );
        }
        AppCommand::ClearCache => {
            coordinator.clear_cached_quotes();
            println!(
                "{}",
                ui::style_text(CACHE_CLEARED_NOTICE, ui::StyleType::Info)
            );
        }
        AppCommand::Watch => {
            cli::watch::run(Arc::clone(&coordinator), config.refresh_interval()).await?;
        }
    }

    Ok(())
}
