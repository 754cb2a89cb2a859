//! Cache-or-mirror synchronization of one feed.
//!
//! A [`FeedSync`] owns the configuration of one logical feed (cache file,
//! mirror list, refresh policy, parser) and turns it into a validated
//! [`ResultContainer`]. Each call to [`FeedSync::load_data`] plans an ordered
//! list of candidates and walks it until one yields data the parser accepts:
//!
//! 1. the cache file, first, when it exists and the mode allows it;
//! 2. the registered mirrors, shuffled on every cycle.
//!
//! Failed candidates are collected as [`SourceFailure`]s instead of aborting
//! the walk. Only configuration problems and running out of candidates end
//! the cycle with an error.

use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{CacheFile, CacheMode};
use crate::error::{ConfigError, SourceFailure, SyncError};
use crate::feed::{normalize_icao, DataFormat, FeedKind, DEFAULT_STATUS_URL};
use crate::http_client::{HttpClient, HttpRequest};
use crate::log::Logger;
use crate::parser::{FeedParser, ParserKind};
use crate::result::ResultContainer;
use crate::{log_debug, log_info, log_warn};

const DEFAULT_CACHE_DIR: &str = ".";
const DEFAULT_REFRESH: u64 = 60;
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DATA_EXPIRE: u64 = 3_600;
const STATUS_CACHE_FILE: &str = "status.txt";

/// Locations starting with `http` (any case) are fetched; anything else is a file.
pub fn is_remote(location: &str) -> bool {
    location
        .get(..4)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("http"))
}

/// One place a cycle may take its data from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    Cache(PathBuf),
    Remote(String),
}

impl Candidate {
    pub fn is_cache(&self) -> bool {
        matches!(self, Self::Cache(_))
    }
}

impl Display for Candidate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cache(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => f.write_str(url),
        }
    }
}

/// Sync state of one feed, reused across cycles.
pub struct FeedSync {
    cache_dir: PathBuf,
    cache_file: String,
    urls: Vec<String>,
    refresh_interval: u64,
    force_refresh: bool,
    cache_only: bool,
    data_expire: u64,
    timeout_ms: u64,
    airport: Option<String>,
    parser: Option<Box<dyn FeedParser>>,
    http: Arc<dyn HttpClient>,
    logger: Arc<dyn Logger>,
    errors: Vec<SourceFailure>,
    last_source: Option<Candidate>,
}

impl FeedSync {
    /// Blank sync: no parser, no cache file name, no mirrors.
    pub fn new(http: Arc<dyn HttpClient>, logger: Arc<dyn Logger>) -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            cache_file: String::new(),
            urls: Vec::new(),
            refresh_interval: DEFAULT_REFRESH,
            force_refresh: false,
            cache_only: false,
            data_expire: 0,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            airport: None,
            parser: None,
            http,
            logger,
            errors: Vec::new(),
            last_source: None,
        }
    }

    /// Bootstrap status file, pointed at the public status URL.
    pub fn status(http: Arc<dyn HttpClient>, logger: Arc<dyn Logger>) -> Self {
        let parser = ParserKind::Status.build(Arc::clone(&logger));
        let mut sync = Self::new(http, logger)
            .with_parser(parser)
            .with_cache_file(STATUS_CACHE_FILE)
            .with_refresh_interval(FeedKind::Status.default_refresh());
        sync.urls.push(String::from(DEFAULT_STATUS_URL));
        sync
    }

    /// Network data feed in the given format; mirrors come from the status file.
    pub fn data(http: Arc<dyn HttpClient>, logger: Arc<dyn Logger>, format: DataFormat) -> Self {
        let parser = format.parser_kind().build(Arc::clone(&logger));
        Self::new(http, logger)
            .with_parser(parser)
            .with_cache_file(format.cache_file())
            .with_refresh_interval(FeedKind::Data.default_refresh())
            .with_data_expire(DATA_EXPIRE)
    }

    /// Per-airport weather; [`FeedSync::set_airport`] picks the cache file.
    pub fn metar(http: Arc<dyn HttpClient>, logger: Arc<dyn Logger>) -> Self {
        let parser = ParserKind::Metar.build(Arc::clone(&logger));
        Self::new(http, logger)
            .with_parser(parser)
            .with_refresh_interval(FeedKind::Metar.default_refresh())
    }

    pub fn with_parser(mut self, parser: Box<dyn FeedParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_cache_file(mut self, name: impl Into<String>) -> Self {
        self.cache_file = name.into();
        self
    }

    pub fn with_refresh_interval(mut self, seconds: u64) -> Self {
        self.refresh_interval = seconds;
        self
    }

    pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    pub fn with_cache_only(mut self, cache_only: bool) -> Self {
        self.cache_only = cache_only;
        self
    }

    pub fn with_data_expire(mut self, seconds: u64) -> Self {
        self.data_expire = seconds;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Binds a parser by registry name.
    pub fn set_parser(&mut self, name: &str) -> Result<(), ConfigError> {
        let kind = name.parse::<ParserKind>()?;
        self.parser = Some(kind.build(Arc::clone(&self.logger)));
        Ok(())
    }

    pub fn set_cache_dir(&mut self, dir: impl Into<PathBuf>) {
        self.cache_dir = dir.into();
    }

    pub fn set_refresh_interval(&mut self, seconds: u64) {
        self.refresh_interval = seconds;
    }

    pub fn set_force_refresh(&mut self, force_refresh: bool) {
        self.force_refresh = force_refresh;
    }

    pub fn set_cache_only(&mut self, cache_only: bool) {
        self.cache_only = cache_only;
    }

    pub fn set_data_expire(&mut self, seconds: u64) {
        self.data_expire = seconds;
    }

    pub fn set_timeout_ms(&mut self, timeout_ms: u64) {
        self.timeout_ms = timeout_ms;
    }

    /// Targets one airport: cache `metar-{ICAO}.txt`, requests `{url}?id={ICAO}`.
    pub fn set_airport(&mut self, code: &str) -> Result<(), ConfigError> {
        let icao = normalize_icao(code)?;
        self.cache_file = format!("metar-{icao}.txt");
        self.airport = Some(icao);
        Ok(())
    }

    pub fn airport(&self) -> Option<&str> {
        self.airport.as_deref()
    }

    /// Adds a mirror; `flush` drops the ones registered before.
    pub fn register_url(&mut self, url: &str, flush: bool) -> Result<(), ConfigError> {
        self.register_urls([url], flush)
    }

    /// Adds mirrors in order. Nothing is registered if any of them is invalid.
    pub fn register_urls<I, S>(&mut self, urls: I, flush: bool) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let urls = urls
            .into_iter()
            .map(|url| {
                let url = url.as_ref().trim();
                if is_remote(url) {
                    Ok(url.to_owned())
                } else {
                    Err(ConfigError::InvalidUrl {
                        url: url.to_owned(),
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if flush {
            self.urls.clear();
        }
        for url in urls {
            log_debug!(self.logger, "registered url -> {url}");
            self.urls.push(url);
        }
        Ok(())
    }

    /// Replaces the mirrors with the `key` list published by a status sync.
    pub async fn register_urls_from_status(
        &mut self,
        status: &mut FeedSync,
        key: &str,
    ) -> Result<(), SyncError> {
        let result = status.load_data().await?;
        let urls = result
            .get(key)
            .values()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        if urls.is_empty() {
            return Err(SyncError::MissingStatusUrls {
                key: key.to_owned(),
            });
        }
        self.register_urls(urls, true)?;
        Ok(())
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir.join(&self.cache_file)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn refresh_interval(&self) -> u64 {
        self.refresh_interval
    }

    pub fn force_refresh(&self) -> bool {
        self.force_refresh
    }

    pub fn cache_only(&self) -> bool {
        self.cache_only
    }

    pub fn cache_mode(&self) -> CacheMode {
        CacheMode::from_flags(self.cache_only, self.force_refresh)
    }

    pub fn parser(&self) -> Option<&dyn FeedParser> {
        self.parser.as_deref()
    }

    /// Failures of the last cycle, in the order the candidates were tried.
    pub fn errors(&self) -> &[SourceFailure] {
        &self.errors
    }

    /// Candidate that produced the data of the last successful cycle.
    pub fn last_source(&self) -> Option<&Candidate> {
        self.last_source.as_ref()
    }

    /// Candidates for a cycle, in the order they would be tried.
    ///
    /// Mirrors are shuffled on every call.
    pub fn candidates(&self) -> Result<Vec<Candidate>, ConfigError> {
        let cache = self.validate_config()?;
        Ok(self.plan_candidates(&cache).into())
    }

    /// Runs one cycle and returns the parsed result.
    ///
    /// In cache-only mode an existing cache file is accepted however old it
    /// is, and a missing one fails the cycle without touching the network.
    pub async fn load_data(&mut self) -> Result<ResultContainer, SyncError> {
        let cache = self.validate_config()?;
        self.errors.clear();
        self.last_source = None;

        let candidates = self.plan_candidates(&cache);
        if candidates.is_empty() {
            return Err(SyncError::NoLocations {
                failures: Vec::new(),
            });
        }

        let Some(mut parser) = self.parser.take() else {
            return Err(ConfigError::ParserMissing.into());
        };
        parser.set_data_expire(self.data_expire);
        let winner = self.try_candidates(parser.as_mut(), &cache, candidates).await;
        let valid = parser.is_valid();
        let result = parser.result().clone();
        self.parser = Some(parser);

        match winner {
            Some(source) if valid => {
                if !self.errors.is_empty() {
                    log_warn!(
                        self.logger,
                        "source fallback succeeded with '{}' after {} failed attempt(s)",
                        source,
                        self.errors.len()
                    );
                }
                log_info!(self.logger, "feed loaded from {source}");
                self.last_source = Some(source);
                Ok(result)
            }
            _ => Err(SyncError::Exhausted {
                failures: self.errors.clone(),
            }),
        }
    }

    fn validate_config(&self) -> Result<CacheFile, ConfigError> {
        let cache = CacheFile::new(&self.cache_dir, &self.cache_file)?;
        cache.check_writable()?;
        if self.parser.is_none() {
            return Err(ConfigError::ParserMissing);
        }
        Ok(cache)
    }

    fn plan_candidates(&self, cache: &CacheFile) -> VecDeque<Candidate> {
        let cached = Candidate::Cache(cache.path().to_path_buf());
        match self.cache_mode() {
            CacheMode::Only => {
                if cache.exists() {
                    VecDeque::from([cached])
                } else {
                    VecDeque::new()
                }
            }
            mode => {
                let mut urls = self.urls.clone();
                fastrand::shuffle(&mut urls);
                let mut candidates = urls.into_iter().map(Candidate::Remote).collect::<VecDeque<_>>();
                if mode == CacheMode::Use && cache.exists() {
                    candidates.push_front(cached);
                }
                candidates
            }
        }
    }

    async fn try_candidates(
        &mut self,
        parser: &mut dyn FeedParser,
        cache: &CacheFile,
        mut candidates: VecDeque<Candidate>,
    ) -> Option<Candidate> {
        while let Some(candidate) = candidates.pop_front() {
            let attempt = match &candidate {
                Candidate::Remote(url) => self.load_from_url(parser, url, cache).await,
                Candidate::Cache(_) => self.load_from_cache(parser, cache).await,
            };
            match attempt {
                Ok(()) => return Some(candidate),
                Err(failure) => {
                    log_debug!(self.logger, "candidate failed: {failure}");
                    self.errors.push(failure);
                }
            }
        }
        None
    }

    async fn load_from_url(
        &self,
        parser: &mut dyn FeedParser,
        url: &str,
        cache: &CacheFile,
    ) -> Result<(), SourceFailure> {
        let target = match &self.airport {
            Some(icao) => format!("{url}?id={}", urlencoding::encode(icao)),
            None => url.to_owned(),
        };
        log_debug!(self.logger, "load from url {target}");

        let request = HttpRequest::get(&target).with_timeout_ms(self.timeout_ms);
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|error| SourceFailure::network(&target, error.message()))?;
        if !response.is_success() {
            return Err(SourceFailure::network(
                &target,
                format!("unexpected http status {}", response.status),
            ));
        }

        if !is_data_valid(parser, &response.body) {
            return Err(SourceFailure::invalid(&target));
        }

        match cache.write(&response.body).await {
            Ok(()) => log_debug!(self.logger, "cache file {} saved", cache.path().display()),
            Err(error) => log_warn!(
                self.logger,
                "cache file {} could not be saved: {error}",
                cache.path().display()
            ),
        }
        Ok(())
    }

    async fn load_from_cache(
        &self,
        parser: &mut dyn FeedParser,
        cache: &CacheFile,
    ) -> Result<(), SourceFailure> {
        let source = cache.path().display().to_string();
        log_debug!(self.logger, "load from cache file {source}");

        let data = cache
            .read()
            .await
            .map_err(|error| SourceFailure::io(&source, error.to_string()))?;
        if !is_data_valid(parser, &data) {
            return Err(SourceFailure::invalid(&source));
        }

        if self.cache_only {
            return Ok(());
        }
        let expired = cache
            .is_expired(self.refresh_interval)
            .await
            .map_err(|error| SourceFailure::io(&source, error.to_string()))?;
        if expired {
            log_debug!(
                self.logger,
                "cache content {source} expired ({}s)",
                self.refresh_interval
            );
            return Err(SourceFailure::expired(&source));
        }
        Ok(())
    }
}

fn is_data_valid(parser: &mut dyn FeedParser, data: &[u8]) -> bool {
    parser.set_raw_input(data);
    parser.parse();
    parser.is_valid()
}
