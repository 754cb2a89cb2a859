use serde_json::{json, Value};
use vatfeed_core::{normalize_icao, FeedConfig};

use crate::cli::MetarArgs;
use crate::error::CliError;

pub async fn run(args: &MetarArgs, config: FeedConfig) -> Result<Value, CliError> {
    let icao = normalize_icao(&args.icao)?;
    let mut client = super::client(config)?;

    if !client.load_metar(&icao).await {
        return Err(super::last_failure(&client));
    }
    let report = client.metar_report().unwrap_or_default();
    Ok(json!({ "airport": icao, "metar": report }))
}
