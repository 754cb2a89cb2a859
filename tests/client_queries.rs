//! Behavior-driven tests for the query facade
//!
//! These tests verify HOW callers see loaded data: substring search
//! semantics, listing helpers, and the boolean load contract that keeps
//! failures on the error stack.

use std::path::Path;
use std::sync::Arc;

use vatfeed_core::{
    Candidate, DataFormat, FeedClient, FeedConfig, HttpResponse, NoOpLogger, OfflineHttpClient,
    Record, RecordSet, ResultContainer, SourceFailureKind, StaticHttpClient, SyncError,
};

const STATUS_URL: &str = "http://status.example/status.txt";
const DATA_URL: &str = "http://data.example/vatsim-data.txt";
const JSON_URL: &str = "http://data.example/vatsim-data.json";
const METAR_URL: &str = "http://metar.example/metar.php";

const LEGACY_FEED: &str = "\
!GENERAL:
VERSION = 8
RELOAD = 1
UPDATE = 20130601000000
ATIS ALLOW MIN = 5
CONNECTED CLIENTS = 3
; !CLIENTS section - callsign:cid:realname:clienttype:frequency:
!CLIENTS:
SWA3437:123456:Jelle Vink KSJC:PILOT::
KLM601:234567:Anna de Vries EHAM:PILOT::
EHAM_TWR:345678:Piet Tower:ATC:118.100:
; !SERVERS section - ident:hostname_or_IP:location:name:clients_connection_allowed:
!SERVERS:
EUROPE-C2:88.198.19.202:Europe:Europe Server:1:
; !VOICE SERVERS section - hostname_or_IP:location:name:clients_connection_allowed:type_of_voice_server:
!VOICE SERVERS:
voice2.vacc-sag.org:Nurnberg:Europe-CW:1::
; !PREFILE section - callsign:cid:realname:
!PREFILE:
DAL9:456789:Pre Filer:
";

fn status_body() -> String {
    format!("url0={DATA_URL}\nmetar0={METAR_URL}\n")
}

fn config_in(dir: &Path) -> FeedConfig {
    FeedConfig::default()
        .with_cache_dir(dir)
        .with_status_url(STATUS_URL)
        .with_data_expire(0)
}

async fn loaded_client(dir: &Path) -> FeedClient {
    let http = StaticHttpClient::new()
        .with_body(STATUS_URL, status_body())
        .with_body(DATA_URL, LEGACY_FEED);
    let mut client =
        FeedClient::new(config_in(dir), Arc::new(http), Arc::new(NoOpLogger)).expect("config");
    assert!(client.load_data().await, "errors: {:?}", client.errors());
    client
}

fn callsigns(set: &RecordSet) -> Vec<&str> {
    set.records()
        .filter_map(|record| record.get("callsign"))
        .collect()
}

// =============================================================================
// Search Semantics
// =============================================================================

#[test]
fn search_returns_records_once_per_matching_field() {
    // Given: Two records sharing `b` and differing on `a`
    let mut container = ResultContainer::new();
    container.append("things_header", vec![String::from("a"), String::from("b")]);
    let first: Record = [("a", "x"), ("b", "y")].into_iter().collect();
    let second: Record = [("a", "z"), ("b", "y")].into_iter().collect();
    container.append("things", RecordSet::from_iter([first.clone(), second.clone()]));

    // When: Querying on one field or on several
    let by_a = container.search("things", [("a", "x")]);
    let by_b = container.search("things", [("b", "y")]);
    let either = container.search("things", [("a", "x"), ("b", "y")]);

    // Then: Matching is OR across fields and a record matching on both
    // fields is returned once per matching field
    assert_eq!(by_a.records().collect::<Vec<_>>(), vec![&first]);
    assert_eq!(by_b.len(), 2);
    assert_eq!(
        either.records().collect::<Vec<_>>(),
        vec![&first, &first, &second]
    );
}

#[test]
fn search_is_case_insensitive_and_needs_a_header() {
    let mut container = ResultContainer::new();
    let record: Record = [("callsign", "KLM601")].into_iter().collect();
    container.append("clients", RecordSet::from(record));

    assert!(container.search("clients", [("callsign", "klm")]).is_empty());

    container.append("clients_header", vec![String::from("callsign")]);
    assert_eq!(container.search("clients", [("callsign", "klm")]).len(), 1);
    assert!(container.search("clients", [("realname", "klm")]).is_empty());
}

// =============================================================================
// Facade Queries
// =============================================================================

#[tokio::test]
async fn facade_lists_every_record_kind() {
    // Given: A client loaded from the legacy feed
    let dir = tempfile::tempdir().expect("tempdir");
    let client = loaded_client(dir.path()).await;

    // Then: Each listing reads its own set
    assert_eq!(client.clients().len(), 3);
    assert_eq!(callsigns(&client.pilots()), vec!["SWA3437", "KLM601"]);
    assert_eq!(callsigns(&client.controllers()), vec!["EHAM_TWR"]);
    assert_eq!(client.servers().len(), 1);
    assert_eq!(client.voice_servers().len(), 1);
    assert_eq!(callsigns(client.prefile()), vec!["DAL9"]);
    assert_eq!(
        client.general_info().and_then(|general| general.get("connected_clients")),
        Some("3")
    );
    assert_eq!(client.update_timestamp(), Some(1_370_044_800));
    assert!(client.object_types().contains(&"voice_servers"));
    assert_eq!(client.get("voice servers").len(), 1);
}

#[tokio::test]
async fn facade_searches_by_callsign_and_vatsim_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    let client = loaded_client(dir.path()).await;

    assert_eq!(callsigns(&client.search_callsign("eham")), vec!["EHAM_TWR"]);
    assert_eq!(callsigns(&client.search_vatsim_id("234567")), vec!["KLM601"]);
    assert_eq!(
        callsigns(&client.search("clients", [("realname", "vink"), ("callsign", "KLM")])),
        vec!["SWA3437", "KLM601"]
    );
    assert!(client.search("clients", [("realname", "nobody")]).is_empty());
}

// =============================================================================
// Load Contract
// =============================================================================

#[tokio::test]
async fn when_every_source_fails_load_returns_false_and_keeps_the_error() {
    // Given: A status file pointing at a mirror that serves garbage
    let dir = tempfile::tempdir().expect("tempdir");
    let http = StaticHttpClient::new()
        .with_body(STATUS_URL, status_body())
        .with_body(DATA_URL, "<html>503</html>");
    let mut client =
        FeedClient::new(config_in(dir.path()), Arc::new(http), Arc::new(NoOpLogger))
            .expect("config");

    // When: Data is loaded
    let loaded = client.load_data().await;

    // Then: Failure is a boolean, the cause is on the error stack, and
    // queries stay empty
    assert!(!loaded);
    let Some(SyncError::Exhausted { failures }) = client.last_error() else {
        panic!("expected exhaustion, got {:?}", client.errors());
    };
    assert_eq!(failures[0].kind, SourceFailureKind::Invalid);
    assert!(client.clients().is_empty());

    client.clear_errors();
    assert!(client.errors().is_empty());
}

#[tokio::test]
async fn failed_reload_keeps_previous_data() {
    // Given: A loaded client whose mirror then starts failing
    let dir = tempfile::tempdir().expect("tempdir");
    let http = Arc::new(
        StaticHttpClient::new()
            .with_body(STATUS_URL, status_body())
            .with_body(DATA_URL, LEGACY_FEED),
    );
    let config = config_in(dir.path()).with_force_data_refresh(true);
    let mut client = FeedClient::new(config, http.clone(), Arc::new(NoOpLogger)).expect("config");
    assert!(client.load_data().await);
    http.set_response(DATA_URL, Ok(HttpResponse::ok("garbage")));

    // When: Data is reloaded
    let reloaded = client.load_data().await;

    // Then: The reload fails but the earlier data stays queryable
    assert!(!reloaded);
    assert_eq!(client.clients().len(), 3);
    assert_eq!(client.errors().len(), 1);
}

#[tokio::test]
async fn cache_only_client_reads_existing_cache_without_status_bootstrap() {
    // Given: A data cache written by an earlier online run
    let dir = tempfile::tempdir().expect("tempdir");
    drop(loaded_client(dir.path()).await);

    // When: An offline client loads in cache-only mode
    let config = config_in(dir.path()).with_cache_only(true);
    let mut client =
        FeedClient::new(config, Arc::new(OfflineHttpClient), Arc::new(NoOpLogger))
            .expect("config");
    let loaded = client.load_data().await;

    // Then: The cache serves the data
    assert!(loaded, "errors: {:?}", client.errors());
    assert_eq!(
        client.last_source(),
        Some(&Candidate::Cache(dir.path().join("vatsim-data.txt")))
    );
    assert_eq!(client.pilots().len(), 2);
}

#[tokio::test]
async fn configured_data_urls_bypass_the_status_file() {
    // Given: An explicit JSON mirror and no status route at all
    let dir = tempfile::tempdir().expect("tempdir");
    let json = r#"{"general":{"update":"20130601000000"},
        "pilots":[{"cid":1,"name":"Jane","callsign":"UAL1"}],"controllers":[],"prefiles":[],"servers":[]}"#;
    let http = Arc::new(StaticHttpClient::new().with_body(JSON_URL, json));
    let config = config_in(dir.path())
        .with_data_format(DataFormat::Json)
        .with_data_urls([JSON_URL]);
    let mut client = FeedClient::new(config, http.clone(), Arc::new(NoOpLogger)).expect("config");

    // When: Data is loaded
    assert!(client.load_data().await, "errors: {:?}", client.errors());

    // Then: Only the JSON mirror was requested and the JSON cache file exists
    assert_eq!(http.requests(), vec![String::from(JSON_URL)]);
    assert_eq!(callsigns(&client.pilots()), vec!["UAL1"]);
    assert!(dir.path().join("vatsim-data.json").is_file());
}

#[tokio::test]
async fn metar_is_fetched_per_airport_and_empty_on_failure() {
    // Given: A status file listing a METAR mirror with one airport served
    let dir = tempfile::tempdir().expect("tempdir");
    let http = StaticHttpClient::new()
        .with_body(STATUS_URL, status_body())
        .with_body(format!("{METAR_URL}?id=EHAM"), "EHAM 011225Z 24012KT 9999 FEW020\n")
        .with_body(format!("{METAR_URL}?id=XXXX"), "No METAR available for XXXX\n");
    let mut client =
        FeedClient::new(config_in(dir.path()), Arc::new(http), Arc::new(NoOpLogger))
            .expect("config");

    // When / Then: A served airport yields its report, others yield nothing
    assert_eq!(client.metar("eham").await, "EHAM 011225Z 24012KT 9999 FEW020");
    assert!(dir.path().join("metar-EHAM.txt").is_file());
    assert_eq!(client.metar("XXXX").await, "");
    assert_eq!(client.metar("EHA").await, "");
    assert_eq!(client.errors().len(), 2);
}
