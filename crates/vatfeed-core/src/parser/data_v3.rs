//! JSON data feed mapped back onto the legacy record shape.
//!
//! Pilots and controllers are merged into one `clients` set tagged through
//! `clienttype`, so callers query both feed formats the same way. Every
//! record carries the full legacy column set; columns the JSON feed has no
//! counterpart for stay empty.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::log::Logger;
use crate::parser::data::{finish_general, update_is_valid};
use crate::parser::{FeedParser, ParserKind, RawInput};
use crate::record::{Record, RecordSet};
use crate::result::ResultContainer;
use crate::timestamp::iso_to_stamp;
use crate::{log_debug, log_trace};

const MAX_DEPTH: usize = 5;

pub const CLIENT_TYPE_FIELD: &str = "clienttype";
pub const CLIENT_TYPE_PILOT: &str = "PILOT";
pub const CLIENT_TYPE_ATC: &str = "ATC";

pub const CLIENTS_HEADER: [&str; 41] = [
    "callsign",
    "cid",
    "realname",
    "clienttype",
    "frequency",
    "latitude",
    "longitude",
    "altitude",
    "groundspeed",
    "planned_aircraft",
    "planned_tascruise",
    "planned_depairport",
    "planned_altitude",
    "planned_destairport",
    "server",
    "protrevision",
    "rating",
    "transponder",
    "facilitytype",
    "visualrange",
    "planned_revision",
    "planned_flighttype",
    "planned_deptime",
    "planned_actdeptime",
    "planned_hrsenroute",
    "planned_minenroute",
    "planned_hrsfuel",
    "planned_minfuel",
    "planned_altairport",
    "planned_remarks",
    "planned_route",
    "planned_depairport_lat",
    "planned_depairport_lon",
    "planned_destairport_lat",
    "planned_destairport_lon",
    "atis_message",
    "time_last_atis_received",
    "time_logon",
    "heading",
    "QNH_iHg",
    "QNH_Mb",
];

pub const SERVERS_HEADER: [&str; 5] = [
    "ident",
    "hostname_or_IP",
    "location",
    "name",
    "clients_connection_allowed",
];

const GENERAL_KEYS: [&str; 6] = [
    "version",
    "reload",
    "update",
    "connected_clients",
    "update_timestamp",
    "unique_users",
];

type FieldMap = [(&'static str, &'static str)];

// legacy column <- JSON field
const PILOT_MAP: &FieldMap = &[
    ("callsign", "callsign"),
    ("cid", "cid"),
    ("realname", "name"),
    ("latitude", "latitude"),
    ("longitude", "longitude"),
    ("altitude", "altitude"),
    ("groundspeed", "groundspeed"),
    ("server", "server"),
    ("rating", "pilot_rating"),
    ("transponder", "transponder"),
    ("time_logon", "logon_time"),
    ("heading", "heading"),
    ("QNH_iHg", "qnh_i_hg"),
    ("QNH_Mb", "qnh_mb"),
];

const FLIGHT_PLAN_MAP: &FieldMap = &[
    ("planned_aircraft", "aircraft"),
    ("planned_tascruise", "cruise_tas"),
    ("planned_depairport", "departure"),
    ("planned_altitude", "altitude"),
    ("planned_destairport", "arrival"),
    ("planned_flighttype", "flight_rules"),
    ("planned_deptime", "deptime"),
    ("planned_hrsenroute", "enroute_time"),
    ("planned_hrsfuel", "fuel_time"),
    ("planned_altairport", "alternate"),
    ("planned_remarks", "remarks"),
    ("planned_route", "route"),
];

const CONTROLLER_MAP: &FieldMap = &[
    ("callsign", "callsign"),
    ("cid", "cid"),
    ("realname", "name"),
    ("frequency", "frequency"),
    ("server", "server"),
    ("rating", "rating"),
    ("facilitytype", "facility"),
    ("visualrange", "visual_range"),
    ("atis_message", "text_atis"),
    ("time_logon", "logon_time"),
    ("time_last_atis_received", "last_updated"),
];

const PREFILE_MAP: &FieldMap = &[("callsign", "callsign"), ("cid", "cid"), ("realname", "name")];

const SERVER_MAP: &FieldMap = &[
    ("ident", "ident"),
    ("hostname_or_IP", "hostname_or_ip"),
    ("location", "location"),
    ("name", "name"),
    ("clients_connection_allowed", "clients_connection_allowed"),
];

const TIME_FIELDS: [&str; 2] = ["logon_time", "last_updated"];

/// Parser for the JSON data feed.
pub struct DataV3Parser {
    logger: Arc<dyn Logger>,
    input: RawInput,
    result: ResultContainer,
    valid: bool,
    data_expire: u64,
    update: Option<i64>,
}

impl DataV3Parser {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            logger,
            input: RawInput::default(),
            result: ResultContainer::new(),
            valid: false,
            data_expire: 0,
            update: None,
        }
    }

    pub fn with_data_expire(mut self, seconds: u64) -> Self {
        self.data_expire = seconds;
        self
    }

    fn decode(&self) -> Option<Map<String, Value>> {
        let value = match serde_json::from_str::<Value>(&self.input.text) {
            Ok(value) => value,
            Err(error) => {
                log_debug!(self.logger, "json feed could not be decoded: {error}");
                return None;
            }
        };
        if depth(&value) > MAX_DEPTH {
            log_debug!(self.logger, "json feed nests deeper than {MAX_DEPTH} levels");
            return None;
        }
        match value {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    fn parse_general(&self, json: &Map<String, Value>) -> Option<Record> {
        let Some(Value::Object(source)) = json.get("general") else {
            log_debug!(self.logger, "general section not found");
            return None;
        };

        let mut general = Record::blank(GENERAL_KEYS);
        for (key, value) in source {
            let rendered = match value {
                Value::Array(_) | Value::Object(_) => None,
                scalar => Some(stringify(scalar).unwrap_or_default()),
            };
            match rendered {
                Some(value) if general.contains(key) => {
                    log_trace!(self.logger, "general section: {key} -> {value}");
                    general.insert(key.as_str(), value);
                }
                _ => log_trace!(self.logger, "general section: skipping {key}"),
            }
        }
        Some(general)
    }
}

impl FeedParser for DataV3Parser {
    fn kind(&self) -> ParserKind {
        ParserKind::DataV3
    }

    fn set_raw_input(&mut self, raw: &[u8]) {
        self.input = RawInput::new(raw);
        self.valid = false;
        self.update = None;
    }

    fn parse(&mut self) {
        let json = self.decode().unwrap_or_default();
        let mut result = ResultContainer::new();

        result.append("clients_header", header(&CLIENTS_HEADER));
        result.append("clients", clients(&json));
        result.append("prefile_header", header(&CLIENTS_HEADER));
        result.append("prefile", prefiles(&json));
        result.append("servers_header", header(&SERVERS_HEADER));
        result.append("servers", servers(&json));

        self.update = None;
        if let Some(mut general) = self.parse_general(&json) {
            self.update = finish_general(&mut general);
            result.append("general", general);
        }
        result.append("raw", RecordSet::from(self.input.lines.clone()));

        self.valid = update_is_valid(self.logger.as_ref(), self.update, self.data_expire);
        self.result = result;
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn result(&self) -> &ResultContainer {
        &self.result
    }

    fn raw_lines(&self) -> &[String] {
        &self.input.lines
    }

    fn fingerprint(&self) -> &str {
        &self.input.fingerprint
    }

    fn set_data_expire(&mut self, seconds: u64) {
        self.data_expire = seconds;
    }

    fn update_timestamp(&self) -> Option<i64> {
        self.update
    }
}

fn header(names: &[&str]) -> RecordSet {
    names.iter().map(|name| (*name).to_owned()).collect::<Vec<_>>().into()
}

fn objects<'a>(json: &'a Map<String, Value>, key: &str) -> impl Iterator<Item = &'a Map<String, Value>> {
    json.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn with_flight_plan(mut record: Record, source: &Map<String, Value>) -> Record {
    if let Some(Value::Object(plan)) = source.get("flight_plan") {
        convert_to_legacy(plan, FLIGHT_PLAN_MAP, &mut record);
    }
    record
}

fn clients(json: &Map<String, Value>) -> RecordSet {
    let pilots = objects(json, "pilots").map(|pilot| {
        let mut record = Record::blank(CLIENTS_HEADER);
        convert_to_legacy(pilot, PILOT_MAP, &mut record);
        let mut record = with_flight_plan(record, pilot);
        record.insert(CLIENT_TYPE_FIELD, CLIENT_TYPE_PILOT);
        record
    });

    let controllers = objects(json, "controllers").map(|controller| {
        let mut record = Record::blank(CLIENTS_HEADER);
        convert_to_legacy(controller, CONTROLLER_MAP, &mut record);
        record.insert(CLIENT_TYPE_FIELD, CLIENT_TYPE_ATC);
        record
    });

    pilots.chain(controllers).collect()
}

fn prefiles(json: &Map<String, Value>) -> RecordSet {
    objects(json, "prefiles")
        .map(|prefile| {
            let mut record = Record::blank(CLIENTS_HEADER);
            convert_to_legacy(prefile, PREFILE_MAP, &mut record);
            with_flight_plan(record, prefile)
        })
        .collect()
}

fn servers(json: &Map<String, Value>) -> RecordSet {
    objects(json, "servers")
        .map(|server| {
            let mut record = Record::blank(SERVERS_HEADER);
            convert_to_legacy(server, SERVER_MAP, &mut record);
            record
        })
        .collect()
}

fn convert_to_legacy(source: &Map<String, Value>, map: &FieldMap, record: &mut Record) {
    for (legacy, field) in map {
        let Some(value) = source.get(*field).and_then(stringify) else {
            continue;
        };
        let value = if TIME_FIELDS.contains(field) {
            iso_to_stamp(&value)
        } else {
            value
        };
        record.insert(*legacy, value);
    }
}

/// Renders a JSON value the way the legacy feed would print it.
///
/// `null` has no rendering; arrays are joined with spaces.
fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(true) => Some(String::from("1")),
        Value::Bool(false) => Some(String::new()),
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| stringify(item).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(" "),
        ),
        Value::Object(_) => None,
    }
}

fn depth(value: &Value) -> usize {
    match value {
        Value::Array(items) => 1 + items.iter().map(depth).max().unwrap_or(0),
        Value::Object(map) => 1 + map.values().map(depth).max().unwrap_or(0),
        _ => 0,
    }
}
