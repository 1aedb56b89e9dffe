//! Terminal rendering for the CLI subcommands

use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

use ransomwatch::models::{SearchResult, Stats};
use ransomwatch::storage::ThreatIntelRepo;

pub fn check(repo: &ThreatIntelRepo, ip: &str, as_json: bool) -> Result<()> {
    let result = repo.search_ip(ip);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print_result(&result);
    Ok(())
}

pub fn scan(repo: &ThreatIntelRepo, text: &str, as_json: bool) -> Result<()> {
    let results = repo.scan_text(text);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No IPv4 addresses found in input.");
        return Ok(());
    }

    for result in &results {
        print_result(result);
        println!();
    }

    let found = results.iter().filter(|r| r.found()).count();
    println!("{} of {} address(es) matched.", found, results.len());
    Ok(())
}

pub fn stats(repo: &ThreatIntelRepo) {
    let stats = repo.get_stats();

    if stats.advisory_count == 0 {
        println!("Dataset is empty. Export a fresh data.json first.");
        return;
    }

    let rows = stats_rows(&stats);

    println!("Dataset Statistics");
    print_table(&["Metric", "Value"], &rows);
}

pub fn list_groups(repo: &ThreatIntelRepo) {
    let groups = repo.list_groups();

    if groups.is_empty() {
        println!("No groups found. Export a fresh data.json first.");
        return;
    }

    let rows: Vec<Vec<String>> = groups
        .into_iter()
        .map(|g| vec![g.name, g.advisory_id, g.url])
        .collect();

    println!("Ransomware Groups");
    print_table(&["Group / Campaign", "Advisory ID", "URL"], &rows);
}

/// Read a whole file, or stdin when the path is `-`
pub async fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read stdin")?;
        return Ok(text);
    }

    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

fn print_result(result: &SearchResult) {
    if result.query.trim() != result.normalized {
        println!("Normalized: {} -> {}", result.query.trim(), result.normalized);
    }

    if let Some(error) = result.error() {
        println!("{}: {}", error, result.normalized);
        return;
    }

    if !result.found() {
        println!(
            "No matches found for {} in CISA #StopRansomware advisories.",
            result.normalized
        );
        return;
    }

    println!(
        "MATCH FOUND - {} appears in {} advisory(ies):",
        result.normalized,
        result.matches().len()
    );

    let rows = match_rows(result);

    print_table(&["Advisory ID", "Title", "Source", "Published", "URL"], &rows);
}

fn stats_rows(stats: &Stats) -> Vec<Vec<String>> {
    let mut rows = vec![
        vec!["Advisories".to_string(), stats.advisory_count.to_string()],
        vec!["Total IOCs".to_string(), stats.ioc_count.to_string()],
        vec!["IPv4 IOCs".to_string(), stats.ipv4_count.to_string()],
        vec!["Groups".to_string(), stats.group_count.to_string()],
    ];
    for (ioc_type, count) in &stats.by_type {
        rows.push(vec![format!("  {}", ioc_type), count.to_string()]);
    }
    for (source, count) in &stats.by_source {
        rows.push(vec![format!("  Source: {}", source), count.to_string()]);
    }
    rows
}

fn match_rows(result: &SearchResult) -> Vec<Vec<String>> {
    result
        .matches()
        .iter()
        .map(|m| {
            vec![
                m.advisory_id.clone(),
                m.title.clone(),
                m.source.clone(),
                m.published_date().unwrap_or_else(|| "-".to_string()),
                m.url.clone(),
            ]
        })
        .collect()
}

fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

/// Left-aligned columns sized to the widest cell, two spaces apart
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&render(headers.to_vec()));
    out.push('\n');
    out.push_str(&widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    out.push('\n');
    for row in rows {
        out.push_str(&render(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}
