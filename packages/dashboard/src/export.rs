//! CSV export of the exposed assets of one municipality.

use flood_map_asset_models::{AssetType, Municipality, ScenarioYear};
use flood_map_map_models::FeatureRecord;
use serde::Serialize;

/// Placeholder for missing text fields.
const UNKNOWN: &str = "Unknown";

/// Column names of the export.
pub const EXPORT_HEADER: [&str; 8] = [
    "Asset_Name",
    "Asset_Type",
    "County",
    "Municipality",
    "Unique_ID",
    "Flood_Scenario",
    "Longitude",
    "Latitude",
];

/// Errors that can occur while building an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Neither scenario matched any asset.
    #[error("No exposed assets found for this municipality")]
    NoAssets,

    /// Writing a CSV record failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Flushing the CSV writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The written bytes were not UTF-8.
    #[error("Encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// A finished export, ready to be saved or served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvExport {
    /// Suggested file name.
    pub filename: String,
    /// CSV text including the header row.
    pub contents: String,
    /// Number of data rows.
    pub row_count: usize,
}

/// File name for a municipality's export.
#[must_use]
pub fn export_filename(municipality: Municipality) -> String {
    let city = municipality
        .display_name()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    format!("{city}_2025_2050_flood_exposed_assets.csv")
}

/// Writes one row per feature, 2025 rows first.
///
/// Both lists must already be deduplicated by unique identifier.
///
/// # Errors
///
/// Returns [`ExportError::NoAssets`] if both lists are empty, or another
/// [`ExportError`] if the CSV cannot be written.
pub fn build_export(
    municipality: Municipality,
    features_2025: &[FeatureRecord],
    features_2050: &[FeatureRecord],
) -> Result<CsvExport, ExportError> {
    let row_count = features_2025.len() + features_2050.len();
    if row_count == 0 {
        return Err(ExportError::NoAssets);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;

    for (year, features) in [
        (ScenarioYear::Current, features_2025),
        (ScenarioYear::Projected, features_2050),
    ] {
        for feature in features {
            writer.write_record(export_row(feature, year))?;
        }
    }

    let bytes = writer.into_inner().map_err(csv::IntoInnerError::into_error)?;
    let contents = String::from_utf8(bytes)?;

    log::info!(
        "Exported {row_count} exposed assets for {}",
        municipality.display_name()
    );

    Ok(CsvExport {
        filename: export_filename(municipality),
        contents,
        row_count,
    })
}

fn export_row(feature: &FeatureRecord, year: ScenarioYear) -> [String; 8] {
    let asset_label = feature.asset.as_deref().map_or_else(
        || UNKNOWN.to_owned(),
        |tag| {
            tag.parse::<AssetType>()
                .map_or_else(|_| tag.to_owned(), |asset| asset.label().to_owned())
        },
    );
    let municipality = feature.municipality.as_deref().map_or_else(
        || UNKNOWN.to_owned(),
        |key| {
            Municipality::from_key(key)
                .map_or_else(|| key.to_owned(), |mun| mun.display_name().to_owned())
        },
    );

    [
        text_field(feature.name.as_deref()),
        asset_label,
        text_field(feature.county.as_deref()),
        municipality,
        feature.unique_id.clone().unwrap_or_else(|| UNKNOWN.to_owned()),
        year.to_string(),
        format!("{:.6}", feature.longitude),
        format!("{:.6}", feature.latitude),
    ]
}

/// Free text with commas swapped for semicolons.
fn text_field(value: Option<&str>) -> String {
    value.unwrap_or(UNKNOWN).replace(',', ";")
}
