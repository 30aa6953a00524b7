#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Baseline asset totals from the municipality findings spreadsheet.
//!
//! The findings file is a single CSV made of per-municipality sections. A
//! section starts with a row holding only the municipality's name, followed
//! by a `Public Asset,Total Count,...` header row, one row per asset type,
//! and an `Overall` summary row:
//!
//! ```text
//! Newark,,,,,,
//! Public Asset,Total Count,2025 Risk,% 2025,2050 Risk,% 2050,Findings
//! KNOWN CONTAMINATED SITE,510,212,41.6%,305,59.8%,"Most exposed, by far"
//! SCHOOL,121,14,11.6%,27,22.3%,
//! Overall,...
//! ```
//!
//! Only the total count column feeds the dashboard; the per-scenario
//! columns are recomputed from the map data.

use std::collections::BTreeMap;
use std::path::Path;

use flood_map_asset_models::{AssetType, Municipality};
use serde::Serialize;

/// First-column label of the per-section column header row.
const COLUMN_HEADER_LABEL: &str = "Public Asset";

/// First-column label of the per-section aggregate row.
const AGGREGATE_ROW_LABEL: &str = "Overall";

/// Number of leading columns inspected when detecting section headings.
const SECTION_COLUMNS: usize = 6;

/// Errors that can occur while loading the findings spreadsheet.
#[derive(Debug, thiserror::Error)]
pub enum TotalsError {
    /// Reading the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Baseline asset counts keyed by municipality, then asset type.
///
/// Every stored count is positive. A missing entry means "no known
/// baseline", which is not the same as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TotalsTable {
    by_municipality: BTreeMap<Municipality, BTreeMap<AssetType, u32>>,
}

impl TotalsTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            by_municipality: BTreeMap::new(),
        }
    }

    /// Returns the baseline entry for a municipality, if the spreadsheet had
    /// a section for it.
    #[must_use]
    pub fn get(&self, municipality: Municipality) -> Option<&BTreeMap<AssetType, u32>> {
        self.by_municipality.get(&municipality)
    }

    /// Returns the baseline count for one asset type in one municipality.
    #[must_use]
    pub fn baseline(&self, municipality: Municipality, asset: AssetType) -> Option<u32> {
        self.get(municipality)
            .and_then(|assets| assets.get(&asset).copied())
    }

    /// Whether no section was loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_municipality.is_empty()
    }

    /// Number of municipality sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_municipality.len()
    }

    /// Iterates over all sections.
    pub fn iter(&self) -> impl Iterator<Item = (Municipality, &BTreeMap<AssetType, u32>)> {
        self.by_municipality.iter().map(|(mun, assets)| (*mun, assets))
    }
}

/// Parses the findings spreadsheet text into a [`TotalsTable`].
///
/// Each line is one row. Quoting is honoured within a line but never
/// joins lines, so an unbalanced quote only affects its own row. Rows
/// that cannot be read are logged and skipped; parsing never fails.
#[must_use]
pub fn parse_totals(text: &str) -> TotalsTable {
    let mut table = TotalsTable::new();
    let mut current: Option<Municipality> = None;

    for (line, row) in text.lines().enumerate() {
        let record = match read_row(row) {
            Ok(Some(record)) => record,
            Ok(None) => continue,
            Err(e) => {
                log::warn!("Skipping unreadable findings row {}: {e}", line + 1);
                continue;
            }
        };
        let col = |i: usize| record.get(i).unwrap_or("");
        let label = col(0);

        if !label.is_empty() && (1..SECTION_COLUMNS).all(|i| col(i).is_empty()) {
            if label != AGGREGATE_ROW_LABEL
                && let Some(municipality) = Municipality::from_findings_label(label)
            {
                current = Some(municipality);
                table.by_municipality.insert(municipality, BTreeMap::new());
            }
            continue;
        }

        if label == COLUMN_HEADER_LABEL || label == AGGREGATE_ROW_LABEL {
            continue;
        }
        let Some(municipality) = current else {
            continue;
        };

        let total = parse_leading_int(col(1));
        if let Some(asset) = AssetType::from_findings_label(label)
            && total > 0
        {
            table
                .by_municipality
                .entry(municipality)
                .or_default()
                .insert(asset, total);
        }
    }

    table
}

/// Splits one line into fields. Blank lines give `None`.
fn read_row(line: &str) -> Result<Option<csv::StringRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());
    reader.records().next().transpose()
}

/// Parses the leading integer of a cell the way spreadsheet exports are
/// usually read: `"121"`, `"121 sites"` and `"121.0"` all give 121.
/// Cells without leading digits, and negative values, give 0. Counts too
/// large for `u32` saturate.
fn parse_leading_int(cell: &str) -> u32 {
    let digits = cell.strip_prefix('+').unwrap_or(cell);
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return 0;
    }
    digits[..end].parse().unwrap_or(u32::MAX)
}

/// Reads and parses a findings spreadsheet from disk.
///
/// # Errors
///
/// Returns [`TotalsError::Io`] if the file cannot be read.
pub fn load_file(path: &Path) -> Result<TotalsTable, TotalsError> {
    let text = std::fs::read_to_string(path)?;
    let table = parse_totals(&text);
    log::info!(
        "Loaded municipality totals for {} municipalities from {}",
        table.len(),
        path.display()
    );
    Ok(table)
}

/// Like [`load_file`], but logs failures and returns an empty table so the
/// dashboard can fall back to scenario counts.
#[must_use]
pub fn load_file_or_empty(path: &Path) -> TotalsTable {
    load_file(path).unwrap_or_else(|e| {
        log::warn!(
            "Could not load municipality totals from {}: {e}",
            path.display()
        );
        TotalsTable::new()
    })
}

/// Downloads and parses a findings spreadsheet.
///
/// # Errors
///
/// Returns [`TotalsError::Http`] if the request fails or returns a non-2xx
/// status.
pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<TotalsTable, TotalsError> {
    let text = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let table = parse_totals(&text);
    log::info!(
        "Loaded municipality totals for {} municipalities from {url}",
        table.len()
    );
    Ok(table)
}

/// Like [`fetch`], but logs failures and returns an empty table.
pub async fn fetch_or_empty(client: &reqwest::Client, url: &str) -> TotalsTable {
    fetch(client, url).await.unwrap_or_else(|e| {
        log::warn!("Could not load municipality totals from {url}: {e}");
        TotalsTable::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FINDINGS: &str = "\
Newark,,,,,,
Public Asset,Total Count,2025 Risk,% 2025,2050 Risk,% 2050,Findings
KNOWN CONTAMINATED SITE,510,212,41.6%,305,59.8%,\"Most exposed, by far\"
SCHOOL,121,14,11.6%,27,22.3%,
AIRPORT,0,0,0%,0,0%,
Overall,700,240,34%,350,50%,

Asbury Park City,,,,,,
Public Asset,Total Count,2025 Risk,% 2025,2050 Risk,% 2050,Findings
\"SOLID & HAZARD\",3,1,33%,2,66%,
PARK,n/a,,,,,
LIBRARY,2,0,0%,1,50%,
";

    #[test]
    fn parses_single_section() {
        let table = parse_totals("Newark,,,,,\nSCHOOL,10,...\n");
        assert_eq!(
            serde_json::to_value(&table).unwrap(),
            serde_json::json!({"NEWARK CITY": {"SCHOOL": 10}})
        );
    }

    #[test]
    fn parses_multiple_sections() {
        let table = parse_totals(FINDINGS);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.baseline(Municipality::Newark, AssetType::KnownContaminatedSite),
            Some(510)
        );
        assert_eq!(
            table.baseline(Municipality::Newark, AssetType::School),
            Some(121)
        );
        assert_eq!(
            table.baseline(Municipality::Newark, AssetType::Airport),
            None,
            "zero counts are not stored"
        );
        assert_eq!(
            table.baseline(Municipality::AsburyPark, AssetType::SolidHazard),
            Some(3)
        );
        assert_eq!(
            table.baseline(Municipality::AsburyPark, AssetType::Park),
            None
        );
        assert_eq!(
            table.baseline(Municipality::AsburyPark, AssetType::Library),
            Some(2)
        );
    }

    #[test]
    fn every_count_is_positive_and_parse_is_idempotent() {
        let first = parse_totals(FINDINGS);
        let second = parse_totals(FINDINGS);
        assert_eq!(first, second);
        for (mun, assets) in first.iter() {
            for (asset, count) in assets {
                assert!(*count > 0, "{mun:?}/{asset:?} has count {count}");
            }
        }
    }

    #[test]
    fn rows_before_any_section_are_ignored() {
        let table = parse_totals("SCHOOL,10,,,,\nCamden,,,,,\nPARK,4,,,,\n");
        assert_eq!(table.len(), 1);
        assert_eq!(table.baseline(Municipality::Camden, AssetType::School), None);
        assert_eq!(table.baseline(Municipality::Camden, AssetType::Park), Some(4));
    }

    #[test]
    fn unknown_heading_keeps_current_section() {
        let table = parse_totals("Trenton,,,,,\nHoboken,,,,,\nPARK,4,,,,\n");
        assert_eq!(table.baseline(Municipality::Trenton, AssetType::Park), Some(4));
    }

    #[test]
    fn repeated_section_resets_counts() {
        let table = parse_totals("Camden,,,,,\nPARK,4,,,,\nCamden,,,,,\nSCHOOL,2,,,,\n");
        assert_eq!(table.baseline(Municipality::Camden, AssetType::Park), None);
        assert_eq!(table.baseline(Municipality::Camden, AssetType::School), Some(2));
    }

    #[test]
    fn later_rows_overwrite_earlier_ones() {
        let table = parse_totals("Camden,,,,,\nPARK,4,,,,\nPARK,9,,,,\n");
        assert_eq!(table.baseline(Municipality::Camden, AssetType::Park), Some(9));
    }

    #[test]
    fn leading_int_parsing() {
        assert_eq!(parse_leading_int("121"), 121);
        assert_eq!(parse_leading_int("121 sites"), 121);
        assert_eq!(parse_leading_int("12.9"), 12);
        assert_eq!(parse_leading_int("+7"), 7);
        assert_eq!(parse_leading_int("-4"), 0);
        assert_eq!(parse_leading_int("n/a"), 0);
        assert_eq!(parse_leading_int(""), 0);
        assert_eq!(parse_leading_int("99999999999"), u32::MAX, "saturates");
    }

    #[test]
    fn unbalanced_quote_only_affects_its_row() {
        let table = parse_totals("Newark,,,,,\nSCHOOL,\"10,,,,\nPARK,4,,,,\nLIBRARY,3,,,,\n");
        assert_eq!(table.baseline(Municipality::Newark, AssetType::Park), Some(4));
        assert_eq!(
            table.baseline(Municipality::Newark, AssetType::Library),
            Some(3),
            "rows after a stray quote are still read"
        );
    }

    #[test]
    fn huge_counts_are_kept() {
        let table = parse_totals("Camden,,,,,\nPARK,5000000000,,,,\n");
        assert_eq!(table.baseline(Municipality::Camden, AssetType::Park), Some(u32::MAX));
    }

    #[test]
    fn crlf_rows_parse() {
        let table = parse_totals("Camden,,,,,\r\nPARK,4,,,,\r\n\r\nSCHOOL,2,,,,\r\n");
        assert_eq!(table.baseline(Municipality::Camden, AssetType::Park), Some(4));
        assert_eq!(table.baseline(Municipality::Camden, AssetType::School), Some(2));
    }

    #[test]
    fn missing_file_degrades_to_empty() {
        let table = load_file_or_empty(Path::new("/nonexistent/8_municipality_findings.csv"));
        assert!(table.is_empty());
    }
}
