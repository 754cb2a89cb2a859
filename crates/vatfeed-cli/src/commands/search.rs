use serde::Serialize;
use serde_json::Value;
use vatfeed_core::{FeedConfig, RecordSet};

use crate::cli::SearchArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct SearchResponseData {
    kind: String,
    query: Vec<(String, String)>,
    count: usize,
    results: RecordSet,
}

pub async fn run(args: &SearchArgs, config: FeedConfig) -> Result<Value, CliError> {
    let query = args.query();
    if query.is_empty() {
        return Err(CliError::Command(String::from(
            "at least one of --callsign, --cid or --field is required",
        )));
    }

    let kind = args.kind.trim();
    if kind.is_empty() {
        return Err(CliError::Command(String::from("--kind must not be empty")));
    }

    let mut client = super::client(config)?;
    super::load_data(&mut client).await?;

    let results = client.search(kind, query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    Ok(serde_json::to_value(SearchResponseData {
        kind: kind.to_owned(),
        count: results.len(),
        query,
        results,
    })?)
}
