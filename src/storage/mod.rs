//! In-memory storage layer over an immutable advisory snapshot

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use icu_collator::{Collator, CollatorOptions, Strength};

use crate::models::ioc_utils::{extract_ips_from_text, is_valid_ipv4, refang_ip};
use crate::models::{
    Advisory, Dataset, GroupEntry, IocRecord, IocType, MatchDetail, SearchResult, Stats,
};

/// Indicator filter used by [`search_ip`]: records tagged exactly `ipv4-addr`
pub fn is_ipv4_indicator(record: &IocRecord) -> bool {
    record.ioc_type == IocType::Ipv4Addr
}

/// Look up an IP address, handling defanged input.
///
/// Accepts formats like `192.168.1.1`, `192[.]168[.]1[.]1` or
/// `192(dot)168(dot)1(dot)1`.
pub fn search_ip(dataset: &Dataset, raw_query: &str) -> SearchResult {
    search_ip_with(dataset, raw_query, is_ipv4_indicator)
}

/// [`search_ip`] with an explicit indicator filter.
///
/// Values are compared as exact strings: `192.168.01.1` does not match a
/// stored `192.168.1.1`.
pub fn search_ip_with<F>(dataset: &Dataset, raw_query: &str, predicate: F) -> SearchResult
where
    F: Fn(&IocRecord) -> bool,
{
    let normalized = refang_ip(raw_query.trim());

    if !is_valid_ipv4(&normalized) {
        tracing::debug!(query = %raw_query, normalized = %normalized, "Rejected lookup");
        return SearchResult::invalid(raw_query, normalized);
    }

    let mut seen = HashSet::new();
    let matches: Vec<MatchDetail> = dataset
        .iocs
        .iter()
        .filter(|&record| predicate(record) && record.value == normalized)
        .map(|record| MatchDetail::resolve(record, dataset.advisory(&record.advisory_id)))
        .filter(|detail| seen.insert(detail.dedup_key()))
        .collect();

    tracing::debug!(
        query = %raw_query,
        normalized = %normalized,
        matches = matches.len(),
        "Lookup complete"
    );

    SearchResult::resolved(raw_query, normalized, matches)
}

/// Aggregate counts over a snapshot.
///
/// `advisory_count` and `ioc_count` are the dataset's own bookkeeping, taken
/// verbatim even when they disagree with the collections.
pub fn compute_stats(dataset: &Dataset) -> Stats {
    let mut by_type: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_source: BTreeMap<String, u64> = BTreeMap::new();

    for record in &dataset.iocs {
        *by_type.entry(record.ioc_type.to_string()).or_default() += 1;
        *by_source.entry(record.source.clone()).or_default() += 1;
    }

    let ipv4_count = dataset.iocs.iter().filter(|r| is_ipv4_indicator(r)).count() as u64;
    let group_count = Stats::count_groups(dataset.advisories.values().map(Advisory::display_title));

    Stats {
        advisory_count: dataset.stats.advisory_count,
        ioc_count: dataset.stats.ioc_count,
        ipv4_count,
        group_count,
        by_type,
        by_source,
    }
}

/// Every advisory as (id, campaign name, url), sorted by campaign name.
///
/// Advisories sharing a name stay as separate rows.
pub fn list_groups(dataset: &Dataset) -> Vec<GroupEntry> {
    let mut groups: Vec<GroupEntry> = dataset
        .advisories
        .iter()
        .map(|(advisory_id, adv)| GroupEntry {
            advisory_id: advisory_id.clone(),
            name: adv.display_title().to_string(),
            url: adv.display_url().to_string(),
        })
        .collect();

    sort_by_collation(&mut groups);
    groups
}

/// Root-locale collation at tertiary strength: punctuation before letters,
/// accents secondary, lowercase before uppercase
fn sort_by_collation(groups: &mut [GroupEntry]) {
    let mut options = CollatorOptions::new();
    options.strength = Some(Strength::Tertiary);

    match Collator::try_new(&Default::default(), options) {
        Ok(collator) => groups.sort_by(|a, b| collator.compare(&a.name, &b.name)),
        Err(e) => {
            tracing::warn!(error = %e, "Collator unavailable, sorting by code point");
            groups.sort_by(|a, b| a.name.cmp(&b.name));
        }
    }
}

/// Read-only repository handle shared across lookups
#[derive(Clone)]
pub struct ThreatIntelRepo {
    dataset: Arc<Dataset>,
}

impl ThreatIntelRepo {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn search_ip(&self, raw_query: &str) -> SearchResult {
        search_ip(&self.dataset, raw_query)
    }

    /// Extract every address from free text and look each one up
    pub fn scan_text(&self, text: &str) -> Vec<SearchResult> {
        extract_ips_from_text(text)
            .iter()
            .map(|ip| self.search_ip(ip))
            .collect()
    }

    pub fn get_stats(&self) -> Stats {
        compute_stats(&self.dataset)
    }

    pub fn list_groups(&self) -> Vec<GroupEntry> {
        list_groups(&self.dataset)
    }

    pub fn get_advisory(&self, advisory_id: &str) -> Option<&Advisory> {
        self.dataset.advisory(advisory_id)
    }

    pub fn advisory_exists(&self, advisory_id: &str) -> bool {
        self.dataset.advisories.contains_key(advisory_id)
    }
}

impl From<Dataset> for ThreatIntelRepo {
    fn from(dataset: Dataset) -> Self {
        Self::new(dataset)
    }
}
