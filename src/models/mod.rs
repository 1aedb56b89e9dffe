//! Core data models for advisory IOC lookups

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DatasetError;

pub mod ioc_utils;

use ioc_utils::strip_title_prefix;

/// Title shown when an indicator references an advisory the dataset lacks
pub const UNKNOWN_TITLE: &str = "Unknown";

/// URL shown when an indicator references an advisory the dataset lacks
pub const UNKNOWN_URL: &str = "#";

/// Error carried by a lookup whose input is not a dotted-quad address
pub const INVALID_IPV4: &str = "Invalid IPv4 address";

/// Treat an explicit `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Types of Indicators of Compromise, as tagged by the advisory STIX bundles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum IocType {
    #[serde(rename = "ipv4-addr")]
    Ipv4Addr,
    #[serde(rename = "domain-name")]
    DomainName,
    #[serde(rename = "url")]
    Url,
    #[serde(rename = "file:hashes")]
    FileHashes,
    /// Any tag this crate does not interpret, kept verbatim
    #[serde(untagged)]
    Other(String),
}

impl IocType {
    pub fn as_str(&self) -> &str {
        match self {
            IocType::Ipv4Addr => "ipv4-addr",
            IocType::DomainName => "domain-name",
            IocType::Url => "url",
            IocType::FileHashes => "file:hashes",
            IocType::Other(tag) => tag,
        }
    }
}

impl Default for IocType {
    fn default() -> Self {
        IocType::Other(String::new())
    }
}

impl std::fmt::Display for IocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single Indicator of Compromise extracted from an advisory
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IocRecord {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub ioc_type: IocType,
    #[serde(deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(deserialize_with = "null_as_default")]
    pub advisory_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub source: String, // "stix" or "pdf"
}

impl IocRecord {
    pub fn new(
        ioc_type: IocType,
        value: impl Into<String>,
        advisory_id: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            ioc_type,
            value: value.into(),
            advisory_id: advisory_id.into(),
            source: source.into(),
        }
    }
}

/// A CISA #StopRansomware advisory
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Advisory {
    pub title: Option<String>,
    pub url: Option<String>,
    pub published: Option<String>,
}

impl Advisory {
    pub fn new(title: impl Into<String>, url: impl Into<String>, published: Option<&str>) -> Self {
        Self {
            title: Some(title.into()),
            url: Some(url.into()),
            published: published.map(str::to_string),
        }
    }

    /// Campaign name: the title without its `#StopRansomware:` marker
    pub fn display_title(&self) -> &str {
        strip_title_prefix(self.title.as_deref().unwrap_or(UNKNOWN_TITLE))
    }

    pub fn display_url(&self) -> &str {
        self.url.as_deref().unwrap_or(UNKNOWN_URL)
    }
}

/// Bookkeeping counts shipped alongside the dataset
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatasetStats {
    #[serde(deserialize_with = "null_as_default")]
    pub advisory_count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub ioc_count: u64,
}

/// Immutable snapshot of advisories and their indicators.
///
/// Loaded once per process and shared read-only; every lookup, statistic
/// and listing is derived from it without mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Dataset {
    #[serde(deserialize_with = "null_as_default")]
    pub iocs: Vec<IocRecord>,
    #[serde(deserialize_with = "null_as_default")]
    pub advisories: BTreeMap<String, Advisory>,
    #[serde(deserialize_with = "null_as_default")]
    pub stats: DatasetStats,
}

impl Dataset {
    /// Assemble a snapshot, computing the bookkeeping counts from the collections
    pub fn build(advisories: BTreeMap<String, Advisory>, iocs: Vec<IocRecord>) -> Self {
        let stats = DatasetStats {
            advisory_count: advisories.len() as u64,
            ioc_count: iocs.len() as u64,
        };
        Self {
            iocs,
            advisories,
            stats,
        }
    }

    /// Parse the exported JSON form. Supplied stats are kept verbatim.
    pub fn from_json(raw: &str) -> Result<Self, DatasetError> {
        serde_json::from_str(raw).map_err(DatasetError::Parse)
    }

    pub fn from_slice(raw: &[u8]) -> Result<Self, DatasetError> {
        serde_json::from_slice(raw).map_err(DatasetError::Parse)
    }

    pub fn advisory(&self, advisory_id: &str) -> Option<&Advisory> {
        self.advisories.get(advisory_id)
    }
}

/// One advisory match for a searched IP
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchDetail {
    pub advisory_id: String,
    pub title: String,
    pub url: String,
    pub source: String,
    pub published: Option<String>,
}

impl MatchDetail {
    /// Join an indicator to its advisory, falling back to placeholders
    pub fn resolve(record: &IocRecord, advisory: Option<&Advisory>) -> Self {
        let (title, url, published) = match advisory {
            Some(adv) => (
                adv.display_title().to_string(),
                adv.display_url().to_string(),
                adv.published.clone(),
            ),
            None => (UNKNOWN_TITLE.to_string(), UNKNOWN_URL.to_string(), None),
        };

        Self {
            advisory_id: record.advisory_id.clone(),
            title,
            url,
            source: record.source.clone(),
            published,
        }
    }

    /// Key used to collapse repeated matches. Bare concatenation, no separator.
    pub fn dedup_key(&self) -> String {
        format!("{}{}", self.advisory_id, self.source)
    }

    /// Publication date formatted as `YYYY-MM-DD` when it parses
    pub fn published_date(&self) -> Option<String> {
        let raw = self.published.as_deref()?;
        let parsed = DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.date_naive())
            .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()));

        match parsed {
            Ok(date) => Some(date.format("%Y-%m-%d").to_string()),
            Err(_) => Some(raw.to_string()),
        }
    }
}

/// Either a rejected query or a resolved one, never both
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum LookupOutcome {
    Invalid {
        error: String,
    },
    Resolved {
        found: bool,
        matches: Vec<MatchDetail>,
    },
}

/// Result of looking up an IP in the dataset
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SearchResult {
    pub query: String,
    pub normalized: String,
    #[serde(flatten)]
    pub outcome: LookupOutcome,
}

impl SearchResult {
    pub fn invalid(query: &str, normalized: String) -> Self {
        Self {
            query: query.to_string(),
            normalized,
            outcome: LookupOutcome::Invalid {
                error: INVALID_IPV4.to_string(),
            },
        }
    }

    pub fn resolved(query: &str, normalized: String, matches: Vec<MatchDetail>) -> Self {
        Self {
            query: query.to_string(),
            normalized,
            outcome: LookupOutcome::Resolved {
                found: !matches.is_empty(),
                matches,
            },
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            LookupOutcome::Invalid { error } => Some(error),
            LookupOutcome::Resolved { .. } => None,
        }
    }

    pub fn found(&self) -> bool {
        matches!(self.outcome, LookupOutcome::Resolved { found: true, .. })
    }

    pub fn matches(&self) -> &[MatchDetail] {
        match &self.outcome {
            LookupOutcome::Resolved { matches, .. } => matches,
            LookupOutcome::Invalid { .. } => &[],
        }
    }
}

/// Dataset statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stats {
    pub advisory_count: u64,
    pub ioc_count: u64,
    pub ipv4_count: u64,
    pub group_count: u64,
    pub by_type: BTreeMap<String, u64>,
    pub by_source: BTreeMap<String, u64>,
}

impl Stats {
    /// Distinct campaign names across a set of titles
    pub fn count_groups<'a>(titles: impl Iterator<Item = &'a str>) -> u64 {
        titles.collect::<HashSet<_>>().len() as u64
    }
}

/// One row of the advisory listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupEntry {
    pub advisory_id: String,
    pub name: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ioc_type_tags() {
        let record: IocRecord = serde_json::from_str(
            r#"{"type":"ipv4-addr","value":"1.2.3.4","advisory_id":"aa23-061a","source":"stix"}"#,
        )
        .unwrap();
        assert_eq!(record.ioc_type, IocType::Ipv4Addr);

        let other: IocRecord = serde_json::from_str(r#"{"type":"IPv4-Addr","value":"1.2.3.4"}"#).unwrap();
        assert_eq!(other.ioc_type, IocType::Other("IPv4-Addr".to_string()));
        assert_eq!(other.advisory_id, "");

        let json = serde_json::to_value(&other).unwrap();
        assert_eq!(json["type"], "IPv4-Addr");
    }

    #[test]
    fn test_dataset_keeps_supplied_stats() {
        let dataset = Dataset::from_json(
            r#"{"advisories":{},"iocs":[],"stats":{"advisory_count":7,"ioc_count":42}}"#,
        )
        .unwrap();
        assert_eq!(dataset.stats.advisory_count, 7);
        assert_eq!(dataset.stats.ioc_count, 42);
        assert!(dataset.iocs.is_empty());
    }

    #[test]
    fn test_dataset_missing_fields_are_absent() {
        let dataset = Dataset::from_json(r#"{"advisories":{"aa1":{}}}"#).unwrap();
        let adv = dataset.advisory("aa1").unwrap();
        assert_eq!(adv.display_title(), UNKNOWN_TITLE);
        assert_eq!(adv.display_url(), UNKNOWN_URL);
        assert_eq!(adv.published, None);
        assert_eq!(dataset.stats, DatasetStats::default());
    }

    #[test]
    fn test_dataset_null_fields_are_absent() {
        let dataset = Dataset::from_json(
            r#"{"advisories":null,
                "iocs":[{"type":"ipv4-addr","value":"10.0.0.1","advisory_id":"aa1","source":null},
                        {"type":null,"value":null,"advisory_id":null,"source":"stix"}],
                "stats":{"advisory_count":null,"ioc_count":2}}"#,
        )
        .unwrap();

        assert!(dataset.advisories.is_empty());
        assert_eq!(dataset.iocs.len(), 2);
        assert_eq!(dataset.iocs[0].ioc_type, IocType::Ipv4Addr);
        assert_eq!(dataset.iocs[0].source, "");
        assert_eq!(dataset.iocs[1].ioc_type, IocType::default());
        assert_eq!(dataset.iocs[1].value, "");
        assert_eq!(dataset.iocs[1].advisory_id, "");
        assert_eq!(dataset.stats.advisory_count, 0);
        assert_eq!(dataset.stats.ioc_count, 2);

        let stats_null = Dataset::from_json(r#"{"stats":null}"#).unwrap();
        assert_eq!(stats_null.stats, DatasetStats::default());
    }

    #[test]
    fn test_dataset_build_counts() {
        let mut advisories = BTreeMap::new();
        advisories.insert("aa1".to_string(), Advisory::new("#StopRansomware: Foo", "http://x", None));
        let iocs = vec![
            IocRecord::new(IocType::Ipv4Addr, "10.0.0.1", "aa1", "stix"),
            IocRecord::new(IocType::DomainName, "evil.example.com", "aa1", "stix"),
        ];
        let dataset = Dataset::build(advisories, iocs);
        assert_eq!(dataset.stats.advisory_count, 1);
        assert_eq!(dataset.stats.ioc_count, 2);
    }

    #[test]
    fn test_search_result_json_shape() {
        let invalid = SearchResult::invalid(" 999.1.1.1 ", "999.1.1.1".to_string());
        let json = serde_json::to_value(&invalid).unwrap();
        assert_eq!(json["error"], INVALID_IPV4);
        assert!(json.get("found").is_none());
        assert!(json.get("matches").is_none());

        let resolved = SearchResult::resolved("8.8.8.8", "8.8.8.8".to_string(), vec![]);
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["found"], false);
        assert_eq!(json["matches"], serde_json::json!([]));
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_published_date_formats() {
        let mut detail = MatchDetail {
            advisory_id: "aa1".to_string(),
            title: "Foo".to_string(),
            url: "#".to_string(),
            source: "stix".to_string(),
            published: Some("2023-03-02T00:00:00+00:00".to_string()),
        };
        assert_eq!(detail.published_date().as_deref(), Some("2023-03-02"));

        detail.published = Some("2023-03-02".to_string());
        assert_eq!(detail.published_date().as_deref(), Some("2023-03-02"));

        detail.published = Some("March 2023".to_string());
        assert_eq!(detail.published_date().as_deref(), Some("March 2023"));

        detail.published = None;
        assert_eq!(detail.published_date(), None);
    }
}
