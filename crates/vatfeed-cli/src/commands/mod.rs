mod metar;
mod search;
mod status;
mod update;

use std::sync::Arc;

use serde_json::Value;
use vatfeed_core::{FeedClient, FeedConfig, HttpClient, OfflineHttpClient, ReqwestHttpClient, TracingLogger};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<Value, CliError> {
    let config = base_config(cli)?;
    match &cli.command {
        Command::Update(args) => update::run(args, config).await,
        Command::Status => status::run(config).await,
        Command::Search(args) => search::run(args, config).await,
        Command::Metar(args) => metar::run(args, config).await,
    }
}

/// Environment overrides first, then the global flags on top.
fn base_config(cli: &Cli) -> Result<FeedConfig, CliError> {
    let mut config = FeedConfig::from_env()?;
    if let Some(dir) = &cli.cache_dir {
        config.cache_dir = dir.clone();
    }
    if let Some(format) = cli.data_format {
        config.data_format = format.into();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.fetch_timeout_ms = timeout_ms;
    }
    config.cache_only |= cli.cache_only;
    Ok(config)
}

/// Facade over the network, or over a transport that refuses every fetch in
/// cache-only mode.
pub(crate) fn client(config: FeedConfig) -> Result<FeedClient, CliError> {
    let http: Arc<dyn HttpClient> = if config.cache_only {
        Arc::new(OfflineHttpClient)
    } else {
        Arc::new(ReqwestHttpClient::with_options(config.fetch_options())?)
    };
    Ok(FeedClient::new(config, http, Arc::new(TracingLogger))?)
}

/// Loads the data feed, turning a failed load into its recorded error.
pub(crate) async fn load_data(client: &mut FeedClient) -> Result<(), CliError> {
    if client.load_data().await {
        Ok(())
    } else {
        Err(last_failure(client))
    }
}

pub(crate) fn last_failure(client: &FeedClient) -> CliError {
    client
        .last_error()
        .cloned()
        .map(CliError::from)
        .unwrap_or_else(|| CliError::Command(String::from("sync failed without a recorded error")))
}
