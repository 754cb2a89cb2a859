//! High-level facade over the status, data and metar syncs.
//!
//! [`FeedClient`] never lets a failure escape as an error value: loads report
//! `bool` and push the reason onto [`FeedClient::errors`]. Queries read from
//! the last successfully loaded data and return empty sets before that.

use std::sync::Arc;

use crate::config::FeedConfig;
use crate::error::{ConfigError, SourceFailure, SyncError};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::log::Logger;
use crate::parser::{CLIENT_TYPE_ATC, CLIENT_TYPE_FIELD, CLIENT_TYPE_PILOT};
use crate::record::{Entry, Record, RecordSet};
use crate::result::ResultContainer;
use crate::sync::{Candidate, FeedSync};
use crate::{log_debug, log_error, log_info};

const DATA_URLS_KEY: &str = "dataUrls";
const METAR_URLS_KEY: &str = "metarUrls";

pub struct FeedClient {
    config: FeedConfig,
    logger: Arc<dyn Logger>,
    status: FeedSync,
    data_sync: FeedSync,
    metar_sync: FeedSync,
    data: ResultContainer,
    update: Option<i64>,
    metar: Option<String>,
    errors: Vec<SyncError>,
}

impl FeedClient {
    /// Builds the three syncs from `config`.
    ///
    /// Fails only when the configured status URL or data URLs are not http(s).
    pub fn new(
        config: FeedConfig,
        http: Arc<dyn HttpClient>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self, ConfigError> {
        let mut status = FeedSync::status(Arc::clone(&http), Arc::clone(&logger))
            .with_cache_dir(&config.cache_dir)
            .with_refresh_interval(config.status_refresh)
            .with_cache_only(config.cache_only)
            .with_timeout_ms(config.fetch_timeout_ms);
        status.register_url(config.effective_status_url(), true)?;

        let mut data_sync =
            FeedSync::data(Arc::clone(&http), Arc::clone(&logger), config.data_format)
                .with_cache_dir(&config.cache_dir)
                .with_refresh_interval(config.data_refresh)
                .with_force_refresh(config.force_data_refresh)
                .with_cache_only(config.cache_only)
                .with_data_expire(config.data_expire)
                .with_timeout_ms(config.fetch_timeout_ms);
        if !config.data_urls.is_empty() {
            data_sync.register_urls(&config.data_urls, true)?;
        }

        let metar_sync = FeedSync::metar(http, Arc::clone(&logger))
            .with_cache_dir(&config.cache_dir)
            .with_refresh_interval(config.metar_refresh)
            .with_force_refresh(config.force_metar_refresh)
            .with_cache_only(config.cache_only)
            .with_timeout_ms(config.fetch_timeout_ms);

        Ok(Self {
            config,
            logger,
            status,
            data_sync,
            metar_sync,
            data: ResultContainer::new(),
            update: None,
            metar: None,
            errors: Vec::new(),
        })
    }

    /// Same as [`FeedClient::new`] over a reqwest transport built from the config.
    pub fn from_config(config: FeedConfig, logger: Arc<dyn Logger>) -> Result<Self, ConfigError> {
        let http = Arc::new(ReqwestHttpClient::with_options(config.fetch_options())?);
        Self::new(config, http, logger)
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Syncs the network data feed. On failure the previous data is kept.
    pub async fn load_data(&mut self) -> bool {
        match self.sync_data().await {
            Ok(result) => {
                self.update = self
                    .data_sync
                    .parser()
                    .and_then(|parser| parser.update_timestamp());
                self.data = result;
                true
            }
            Err(error) => {
                log_error!(self.logger, "data sync failed: {error}");
                self.errors.push(error);
                false
            }
        }
    }

    async fn sync_data(&mut self) -> Result<ResultContainer, SyncError> {
        // Mirrors are irrelevant when only the cache may be read.
        if self.config.data_urls.is_empty() && !self.config.cache_only {
            self.data_sync
                .register_urls_from_status(&mut self.status, DATA_URLS_KEY)
                .await?;
        }
        self.data_sync.load_data().await
    }

    /// Syncs the weather report of one airport.
    pub async fn load_metar(&mut self, icao: &str) -> bool {
        match self.sync_metar(icao).await {
            Ok(result) => {
                let report = result.get("metar").values().next().map(str::to_owned);
                log_info!(self.logger, "metar loaded for {icao}");
                self.metar = report;
                true
            }
            Err(error) => {
                log_error!(self.logger, "metar sync failed for '{icao}': {error}");
                self.metar = None;
                self.errors.push(error);
                false
            }
        }
    }

    async fn sync_metar(&mut self, icao: &str) -> Result<ResultContainer, SyncError> {
        self.metar_sync.set_airport(icao)?;
        if !self.config.cache_only {
            self.metar_sync
                .register_urls_from_status(&mut self.status, METAR_URLS_KEY)
                .await?;
        }
        self.metar_sync.load_data().await
    }

    /// Weather report of `icao`, or an empty string when it cannot be loaded.
    pub async fn metar(&mut self, icao: &str) -> String {
        if self.load_metar(icao).await {
            self.metar.clone().unwrap_or_default()
        } else {
            String::new()
        }
    }

    /// Report of the last successful [`FeedClient::load_metar`].
    pub fn metar_report(&self) -> Option<&str> {
        self.metar.as_deref()
    }

    /// Records of `kind` matching any of the `(field, substring)` pairs.
    pub fn search<I, K, V>(&self, kind: &str, query: I) -> RecordSet
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        log_debug!(self.logger, "search in {kind}");
        self.data.search(kind, query)
    }

    pub fn search_callsign(&self, callsign: &str) -> RecordSet {
        self.search("clients", [("callsign", callsign)])
    }

    pub fn search_vatsim_id(&self, cid: &str) -> RecordSet {
        self.search("clients", [("cid", cid)])
    }

    pub fn pilots(&self) -> RecordSet {
        self.search("clients", [(CLIENT_TYPE_FIELD, CLIENT_TYPE_PILOT)])
    }

    pub fn controllers(&self) -> RecordSet {
        self.search("clients", [(CLIENT_TYPE_FIELD, CLIENT_TYPE_ATC)])
    }

    pub fn clients(&self) -> &RecordSet {
        self.data.get("clients")
    }

    pub fn servers(&self) -> &RecordSet {
        self.data.get("servers")
    }

    pub fn voice_servers(&self) -> &RecordSet {
        self.data.get("voice servers")
    }

    pub fn prefile(&self) -> &RecordSet {
        self.data.get("prefile")
    }

    pub fn general_info(&self) -> Option<&Record> {
        self.data.get("general").first().and_then(Entry::as_record)
    }

    /// Names of every set in the loaded data.
    pub fn object_types(&self) -> Vec<&str> {
        self.data.get_list()
    }

    pub fn get(&self, name: &str) -> &RecordSet {
        self.data.get(name)
    }

    pub fn data(&self) -> &ResultContainer {
        &self.data
    }

    /// Embedded update stamp of the loaded data feed, in epoch seconds.
    pub fn update_timestamp(&self) -> Option<i64> {
        self.update
    }

    pub fn last_source(&self) -> Option<&Candidate> {
        self.data_sync.last_source()
    }

    /// Candidates that failed during the last data cycle.
    pub fn source_failures(&self) -> &[SourceFailure] {
        self.data_sync.errors()
    }

    /// Every failure since construction or the last [`FeedClient::clear_errors`], oldest first.
    pub fn errors(&self) -> &[SyncError] {
        &self.errors
    }

    pub fn last_error(&self) -> Option<&SyncError> {
        self.errors.last()
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }
}
