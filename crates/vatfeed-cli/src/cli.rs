//! CLI argument definitions for vatfeed.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `update` | Refresh the data cache and report the feed's update time |
//! | `status` | Print the general section of the cached data feed |
//! | `search` | Search connected clients |
//! | `metar` | Fetch the weather report of one airport |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--cache-dir` | `VATFEED_CACHE_DIR` or `.` | Directory holding the cache files |
//! | `--data-format` | `legacy` | Data feed flavour (legacy, json) |
//! | `--cache-only` | `false` | Never touch the network |
//! | `--timeout-ms` | `10000` | Fetch timeout in ms |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--verbose` | `false` | Debug logging on stderr |
//!
//! # Examples
//!
//! ```bash
//! vatfeed update --force-refresh
//! vatfeed search --callsign SWA --pretty
//! vatfeed search --field realname=vink --field callsign=KLM
//! vatfeed metar KSFO
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use vatfeed_core::DataFormat;

#[derive(Debug, Parser)]
#[command(
    name = "vatfeed",
    author,
    version,
    about = "Fetch, cache and query the VATSIM network data feed"
)]
pub struct Cli {
    /// Directory holding the cache files.
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Data feed flavour to sync.
    #[arg(long, global = true, value_enum)]
    pub data_format: Option<DataFormatArg>,

    /// Use the cache files whatever their age and never fetch.
    #[arg(long, global = true, default_value_t = false)]
    pub cache_only: bool,

    /// Fetch timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Log debug output to stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DataFormatArg {
    /// Colon-delimited text feed.
    Legacy,
    /// JSON feed, exposed with the legacy field names.
    Json,
}

impl From<DataFormatArg> for DataFormat {
    fn from(value: DataFormatArg) -> Self {
        match value {
            DataFormatArg::Legacy => Self::Legacy,
            DataFormatArg::Json => Self::Json,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Refresh the data cache and print the feed's update time.
    ///
    /// # Examples
    ///
    ///   vatfeed update
    ///   vatfeed update --force-refresh
    Update(UpdateArgs),

    /// Print the general section of the cached data feed without fetching.
    Status,

    /// Search connected clients by substring.
    ///
    /// Several criteria match a record when any one of them matches.
    ///
    /// # Examples
    ///
    ///   vatfeed search --callsign SWA
    ///   vatfeed search --cid 123456
    ///   vatfeed search --kind servers --field location=europe
    Search(SearchArgs),

    /// Fetch the METAR report of an airport.
    ///
    /// # Examples
    ///
    ///   vatfeed metar KSFO
    Metar(MetarArgs),
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Skip a fresh cache file and go straight to the mirrors.
    #[arg(long, default_value_t = false)]
    pub force_refresh: bool,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Callsign substring.
    #[arg(long)]
    pub callsign: Option<String>,

    /// VATSIM id substring.
    #[arg(long)]
    pub cid: Option<String>,

    /// Arbitrary `name=value` criterion; repeatable.
    #[arg(long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// Record set to search.
    #[arg(long, default_value = "clients")]
    pub kind: String,
}

impl SearchArgs {
    /// Every criterion as `(field, substring)` pairs.
    pub fn query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(callsign) = &self.callsign {
            query.push((String::from("callsign"), callsign.clone()));
        }
        if let Some(cid) = &self.cid {
            query.push((String::from("cid"), cid.clone()));
        }
        query.extend(self.fields.iter().cloned());
        query
    }
}

#[derive(Debug, Args)]
pub struct MetarArgs {
    /// Four-letter ICAO airport code.
    pub icao: String,
}

fn parse_field(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((name, needle)) if !name.trim().is_empty() => {
            Ok((name.trim().to_owned(), needle.to_owned()))
        }
        _ => Err(format!("expected name=value, got '{value}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_collects_every_criterion() {
        let cli = Cli::try_parse_from([
            "vatfeed",
            "search",
            "--callsign",
            "SWA",
            "--field",
            "realname=vink",
        ])
        .expect("valid arguments");

        let Command::Search(args) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(
            args.query(),
            vec![
                (String::from("callsign"), String::from("SWA")),
                (String::from("realname"), String::from("vink")),
            ]
        );
        assert_eq!(args.kind, "clients");
    }

    #[test]
    fn malformed_field_is_rejected() {
        assert!(Cli::try_parse_from(["vatfeed", "search", "--field", "callsign"]).is_err());
        assert!(Cli::try_parse_from(["vatfeed", "search", "--field", "=x"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from(["vatfeed", "metar", "KSFO", "--cache-only", "--pretty"])
            .expect("valid arguments");
        assert!(cli.cache_only);
        assert!(cli.pretty);
        assert!(matches!(cli.command, Command::Metar(MetarArgs { ref icao }) if icao == "KSFO"));
    }
}
