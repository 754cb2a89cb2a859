use serde_json::{json, Value};
use vatfeed_core::FeedConfig;

use crate::error::CliError;

/// Reports the cached data feed without fetching anything.
pub async fn run(mut config: FeedConfig) -> Result<Value, CliError> {
    config.cache_only = true;
    let mut client = super::client(config)?;
    super::load_data(&mut client).await?;

    Ok(json!({
        "source": client.last_source().map(ToString::to_string),
        "general": client.general_info(),
        "clients": client.clients().len(),
        "pilots": client.pilots().len(),
        "controllers": client.controllers().len(),
        "servers": client.servers().len(),
        "prefile": client.prefile().len(),
    }))
}
