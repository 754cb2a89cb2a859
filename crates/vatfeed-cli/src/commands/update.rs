use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use vatfeed_core::timestamp::format_stamp;
use vatfeed_core::FeedConfig;

use crate::cli::UpdateArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct UpdateResponseData {
    source: Option<String>,
    update: Option<i64>,
    update_stamp: Option<String>,
    object_types: Vec<String>,
    failed_attempts: usize,
}

pub async fn run(args: &UpdateArgs, mut config: FeedConfig) -> Result<Value, CliError> {
    config.force_data_refresh |= args.force_refresh;
    let mut client = super::client(config)?;
    super::load_data(&mut client).await?;

    let update = client.update_timestamp();
    let data = UpdateResponseData {
        source: client.last_source().map(ToString::to_string),
        update,
        update_stamp: update
            .and_then(|epoch| OffsetDateTime::from_unix_timestamp(epoch).ok())
            .map(format_stamp),
        object_types: client
            .object_types()
            .into_iter()
            .map(str::to_owned)
            .collect(),
        failed_attempts: client.source_failures().len(),
    };
    tracing::info!("data feed updated");
    Ok(serde_json::to_value(data)?)
}
