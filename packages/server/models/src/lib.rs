#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API response types for the flood map server.
//!
//! These wrap the dashboard's own types where they already serialize the
//! way the frontend expects, and add the few shapes that only exist at the
//! HTTP boundary.

use flood_map_asset_models::{AssetType, Municipality, ScenarioYear};
use flood_map_dashboard::SelectionState;
use flood_map_engine::EngineSnapshot;
use flood_map_map_models::BoundingBox;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Whether baseline totals were loaded.
    pub totals_loaded: bool,
    /// Whether municipality bounds were loaded.
    pub bounds_loaded: bool,
}

/// A municipality as listed in the dropdown.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMunicipality {
    /// Canonical `MUN` key.
    pub key: Municipality,
    /// Human readable name.
    pub display_name: &'static str,
    /// Viewport bounds, if boundaries are loaded.
    pub bounds: Option<BoundingBox>,
    /// Acquired Blue Acres parcels.
    pub blue_acres_parcels: u32,
}

impl ApiMunicipality {
    /// Builds the entry for a municipality.
    #[must_use]
    pub const fn new(key: Municipality, bounds: Option<BoundingBox>) -> Self {
        Self {
            key,
            display_name: key.display_name(),
            bounds,
            blue_acres_parcels: key.blue_acres_parcels(),
        }
    }
}

/// An asset type legend entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAssetType {
    pub key: AssetType,
    pub label: &'static str,
    pub emoji: &'static str,
    pub color: &'static str,
}

impl From<AssetType> for ApiAssetType {
    fn from(asset: AssetType) -> Self {
        Self {
            key: asset,
            label: asset.label(),
            emoji: asset.emoji(),
            color: asset.color(),
        }
    }
}

/// Current selection together with the map layer state it produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiState {
    /// The user's selection.
    pub selection: SelectionState,
    /// Scenario whose assets are shown.
    pub active_year: ScenarioYear,
    /// Layer visibility, filters and viewport.
    pub map: EngineSnapshot,
}

/// Error body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Human readable message.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn municipality_serializes_with_key() {
        let value = serde_json::to_value(ApiMunicipality::new(Municipality::Paterson, None)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "key": "PATERSON CITY",
                "displayName": "Paterson",
                "bounds": null,
                "blueAcresParcels": 24,
            })
        );
    }

    #[test]
    fn asset_type_entry() {
        let value = serde_json::to_value(ApiAssetType::from(AssetType::KnownContaminatedSite)).unwrap();
        assert_eq!(value["key"], "KCS");
        assert_eq!(value["label"], "Contaminated Sites");
        assert_eq!(value["color"], "#FF8700");
    }
}
