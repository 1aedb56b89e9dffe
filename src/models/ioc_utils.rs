// src/models/ioc_utils.rs

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

// [.] [dot] (dot) (.)
static DEFANGED_DOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[\.\]|\[dot\]|\(dot\)|\(\.\)").expect("valid defang pattern"));

static OCTET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{1,3}$").expect("valid octet pattern"));

static IPV4_IN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b",
    )
    .expect("valid ipv4 pattern")
});

static TITLE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^#?StopRansomware:\s*").expect("valid title prefix pattern"));

/// Replace defanged dot notations with literal dots.
///
/// Handles `[.]`, `[dot]`, `(dot)` and `(.)` in any case. Whitespace is left
/// alone; callers trim before refanging.
pub fn refang_ip(text: &str) -> String {
    DEFANGED_DOT.replace_all(text, ".").into_owned()
}

/// Check that a refanged string is a dotted quad.
///
/// Octets are 1-3 ASCII digits in 0..=255. Zero padding such as `01` or
/// `007` is accepted.
pub fn is_valid_ipv4(candidate: &str) -> bool {
    let parts: Vec<&str> = candidate.split('.').collect();
    if parts.len() != 4 {
        return false;
    }

    parts.iter().all(|part| {
        OCTET.is_match(part) && part.parse::<u16>().map(|n| n <= 255).unwrap_or(false)
    })
}

/// Extract all IPv4 addresses from free text, handling defanged forms.
///
/// Returns addresses deduplicated in first-seen order.
pub fn extract_ips_from_text(text: &str) -> Vec<String> {
    let cleaned = refang_ip(text);
    let mut seen = HashSet::new();
    let mut result = vec![];

    for m in IPV4_IN_TEXT.find_iter(&cleaned) {
        let ip = m.as_str();
        if seen.insert(ip.to_string()) {
            result.push(ip.to_string());
        }
    }

    result
}

/// Strip a leading `#StopRansomware:` marker (case-insensitive, `#` optional)
/// and the whitespace after it.
pub fn strip_title_prefix(title: &str) -> &str {
    match TITLE_PREFIX.find(title) {
        Some(m) => &title[m.end()..],
        None => title,
    }
}
