//! Exposed-asset observations returned by feature queries.

use std::collections::BTreeMap;

use flood_map_asset_models::{AssetType, Municipality};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ASSET_PROPERTY, COUNTY_PROPERTY, MUN_PROPERTY, NAME_PROPERTY, UNIQUE_ID_PROPERTY};

/// One exposed-asset point matched by a map engine query.
///
/// Properties are kept as the raw strings the source data carries so that
/// unrecognized tags survive into the export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRecord {
    /// `UNIQUE_ID` property.
    pub unique_id: Option<String>,
    /// `ASSET` property.
    pub asset: Option<String>,
    /// `MUN` property.
    pub municipality: Option<String>,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// `NAME` property.
    pub name: Option<String>,
    /// `COUNTY` property.
    pub county: Option<String>,
}

impl FeatureRecord {
    /// Builds a record from a feature's property map and point coordinates.
    #[must_use]
    pub fn from_properties(properties: &Map<String, Value>, longitude: f64, latitude: f64) -> Self {
        Self {
            unique_id: string_property(properties, UNIQUE_ID_PROPERTY),
            asset: string_property(properties, ASSET_PROPERTY),
            municipality: string_property(properties, MUN_PROPERTY),
            longitude,
            latitude,
            name: string_property(properties, NAME_PROPERTY),
            county: string_property(properties, COUNTY_PROPERTY),
        }
    }

    /// Returns the parsed asset type, or `None` if the tag is missing or
    /// outside the taxonomy.
    #[must_use]
    pub fn asset_type(&self) -> Option<AssetType> {
        self.asset.as_deref().and_then(|tag| tag.parse().ok())
    }

    /// Returns the parsed municipality, or `None` if the key is missing or
    /// outside the fixed set.
    #[must_use]
    pub fn municipality(&self) -> Option<Municipality> {
        self.municipality.as_deref().and_then(Municipality::from_key)
    }
}

/// Reads a property as a string. Numbers are stringified; empty strings and
/// other JSON types are treated as missing.
fn string_property(properties: &Map<String, Value>, key: &str) -> Option<String> {
    match properties.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Collapses records that share a unique identifier.
///
/// Tiled sources return the same feature once per tile it touches, so one
/// asset can appear several times. Each identifier keeps the position of
/// its first occurrence and the value of its last. Records without an
/// identifier are dropped.
#[must_use]
pub fn dedupe_by_unique_id(records: Vec<FeatureRecord>) -> Vec<FeatureRecord> {
    let mut positions: BTreeMap<String, usize> = BTreeMap::new();
    let mut unique: Vec<FeatureRecord> = Vec::with_capacity(records.len());

    for record in records {
        let Some(id) = record.unique_id.clone() else {
            continue;
        };
        if let Some(&idx) = positions.get(&id) {
            unique[idx] = record;
        } else {
            positions.insert(id, unique.len());
            unique.push(record);
        }
    }

    unique
}
