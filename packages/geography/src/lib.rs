#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Municipality boundary loading and the viewport bounds index.
//!
//! Reads the municipality boundary `GeoJSON` once at startup and reduces
//! each municipality's polygons to a single bounding box that the
//! dashboard uses to frame the viewport.

use std::collections::BTreeMap;
use std::path::Path;

use flood_map_asset_models::Municipality;
use flood_map_map_models::{BoundingBox, MUN_PROPERTY};
use geo::{BoundingRect, MultiPolygon};
use geojson::{FeatureCollection, GeoJson};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while loading boundary data.
#[derive(Debug, Error)]
pub enum GeographyError {
    /// Reading the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The document is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] Box<geojson::Error>),

    /// The document is valid `GeoJSON` but not a `FeatureCollection`.
    #[error("Expected a GeoJSON FeatureCollection")]
    NotFeatureCollection,
}

/// Bounding box of every covered municipality that has boundary polygons.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BoundsIndex {
    bounds: BTreeMap<Municipality, BoundingBox>,
}

impl BoundsIndex {
    /// Builds the index from boundary features tagged with `MUN`.
    ///
    /// A municipality split across several features (or a `MultiPolygon`)
    /// gets the box covering every vertex of every ring. Features with an
    /// unknown `MUN`, no geometry, or non-polygonal geometry are skipped.
    #[must_use]
    pub fn from_feature_collection(collection: &FeatureCollection) -> Self {
        let mut bounds: BTreeMap<Municipality, BoundingBox> = BTreeMap::new();

        for feature in &collection.features {
            let Some(key) = feature
                .property(MUN_PROPERTY)
                .and_then(serde_json::Value::as_str)
            else {
                continue;
            };
            let Some(municipality) = Municipality::from_key(key) else {
                log::debug!("Ignoring boundary for unsupported municipality {key}");
                continue;
            };
            let Some(polygons) = feature.geometry.as_ref().and_then(to_multipolygon) else {
                log::warn!("Boundary feature for {key} has no polygon geometry");
                continue;
            };
            let Some(rect) = ring_bounds(&polygons) else {
                continue;
            };

            bounds
                .entry(municipality)
                .and_modify(|existing| existing.union(&rect))
                .or_insert(rect);
        }

        Self { bounds }
    }

    /// Parses a `GeoJSON` document and builds the index.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError`] if the text is not a `GeoJSON`
    /// `FeatureCollection`.
    pub fn from_geojson_str(text: &str) -> Result<Self, GeographyError> {
        match text.parse::<GeoJson>().map_err(Box::new)? {
            GeoJson::FeatureCollection(collection) => Ok(Self::from_feature_collection(&collection)),
            _ => Err(GeographyError::NotFeatureCollection),
        }
    }

    /// Returns the bounds of a municipality.
    #[must_use]
    pub fn get(&self, municipality: Municipality) -> Option<BoundingBox> {
        self.bounds.get(&municipality).copied()
    }

    /// Number of municipalities with bounds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Whether no municipality has bounds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Iterates over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (Municipality, BoundingBox)> + '_ {
        self.bounds.iter().map(|(mun, bbox)| (*mun, *bbox))
    }
}

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn to_multipolygon(geometry: &geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.clone().try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

/// Smallest box covering every ring, interior rings included.
///
/// `Polygon::bounding_rect` only looks at the exterior ring, so each ring
/// is measured on its own.
fn ring_bounds(polygons: &MultiPolygon<f64>) -> Option<BoundingBox> {
    polygons
        .iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
        .filter_map(|ring| ring.bounding_rect())
        .map(|rect| BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
        .reduce(|mut acc, rect| {
            acc.union(&rect);
            acc
        })
}

/// Reads the boundary file from disk and builds the index.
///
/// # Errors
///
/// Returns [`GeographyError`] if the file cannot be read or parsed.
pub fn load_file(path: &Path) -> Result<BoundsIndex, GeographyError> {
    let text = std::fs::read_to_string(path)?;
    let index = BoundsIndex::from_geojson_str(&text)?;
    log::info!(
        "Computed bounds for {} municipalities from {}",
        index.len(),
        path.display()
    );
    Ok(index)
}

/// Like [`load_file`], but logs failures and returns `None` so viewport
/// fits become no-ops.
#[must_use]
pub fn load_file_or_unavailable(path: &Path) -> Option<BoundsIndex> {
    load_file(path)
        .inspect_err(|e| {
            log::warn!("Could not load boundaries from {}: {e}", path.display());
        })
        .ok()
}

/// Downloads the boundary `GeoJSON` and builds the index.
///
/// # Errors
///
/// Returns [`GeographyError`] if the request fails or the response cannot
/// be parsed.
pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<BoundsIndex, GeographyError> {
    let text = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let index = BoundsIndex::from_geojson_str(&text)?;
    log::info!(
        "Computed bounds for {} municipalities from {url}",
        index.len()
    );
    Ok(index)
}

/// Like [`fetch`], but logs failures and returns `None`.
pub async fn fetch_or_unavailable(client: &reqwest::Client, url: &str) -> Option<BoundsIndex> {
    fetch(client, url)
        .await
        .inspect_err(|e| log::warn!("Could not load boundaries from {url}: {e}"))
        .ok()
}
