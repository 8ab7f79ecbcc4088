//! Wire types of the Conan v2 REST API.

use std::collections::{BTreeMap, HashMap};

use chrono::DateTime;
use conan_lens_core::{BinaryConfiguration, ConfigurationMap, ReferenceRecord, Settings};
use serde::Deserialize;
use serde_json::Value;

/// Placeholder the REST paths use for an absent user or channel.
const ABSENT: &str = "_";

/// `GET /v2/conans/search?q=...`
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<String>,
}

/// One entry of a revision listing, or the body of a `/latest` request.
#[derive(Debug, Clone, Deserialize)]
pub struct RevisionEntry {
    pub revision: String,
    #[serde(default)]
    pub time: Option<String>,
}

impl RevisionEntry {
    pub fn created_at(&self) -> Option<f64> {
        self.time.as_deref().and_then(parse_timestamp)
    }
}

/// `GET .../revisions`
#[derive(Debug, Default, Deserialize)]
pub struct RevisionList {
    #[serde(default)]
    pub revisions: Vec<RevisionEntry>,
}

/// One binary in a package search: `GET .../revisions/{rrev}/search`.
#[derive(Debug, Default, Deserialize)]
pub struct PackageInfo {
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
    #[serde(default)]
    pub requires: Vec<Value>,
}

pub type PackageSearch = HashMap<String, PackageInfo>;

impl From<PackageInfo> for BinaryConfiguration {
    fn from(info: PackageInfo) -> Self {
        BinaryConfiguration {
            settings: stringify(info.settings),
            options: stringify(info.options),
            requires: info.requires.into_iter().map(value_to_string).collect(),
        }
    }
}

pub fn into_configurations(search: PackageSearch) -> ConfigurationMap {
    search
        .into_iter()
        .map(|(package_id, info)| (package_id, info.into()))
        .collect()
}

fn stringify(map: BTreeMap<String, Value>) -> Settings {
    map.into_iter()
        .map(|(key, value)| (key, value_to_string(value)))
        .collect()
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Seconds since the Unix epoch for a remote timestamp such as
/// `2023-07-20T10:20:30.123+0000`. RFC 3339 is accepted as well.
pub fn parse_timestamp(text: &str) -> Option<f64> {
    DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .ok()
        .map(|time| time.timestamp_millis() as f64 / 1000.0)
}

/// `[name, version, user, channel]` as they appear in REST paths.
pub fn recipe_segments(reference: &ReferenceRecord) -> [&str; 4] {
    [
        &reference.name,
        &reference.version,
        reference.user.as_deref().unwrap_or(ABSENT),
        reference.channel.as_deref().unwrap_or(ABSENT),
    ]
}
