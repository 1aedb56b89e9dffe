//! ransomwatch
//!
//! Check IPv4 addresses, including defanged ones, against the indicators
//! published in CISA #StopRansomware advisories.

pub mod api;
pub mod error;
pub mod loaders;
pub mod models;
pub mod storage;

pub use error::DatasetError;
pub use models::ioc_utils::{extract_ips_from_text, is_valid_ipv4, refang_ip, strip_title_prefix};
pub use models::{Dataset, SearchResult};
pub use storage::{compute_stats, list_groups, search_ip, search_ip_with, ThreatIntelRepo};
