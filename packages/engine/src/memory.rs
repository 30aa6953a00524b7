//! In-memory map engine backed by the scenario `GeoJSON` files.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use flood_map_asset_models::ScenarioYear;
use flood_map_map_models::{
    BoundingBox, FeatureRecord, FilterExpr, FitOptions, Instruction, LayerId, Visibility,
};
use geojson::GeoJson;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{EngineError, MapEngine};

/// A point feature from an asset source.
#[derive(Debug, Clone)]
struct SourceFeature {
    properties: Map<String, Value>,
    longitude: f64,
    latitude: f64,
}

/// Current state of one layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerState {
    /// Layout visibility.
    pub visibility: Visibility,
    /// Attribute filter, if one has been set.
    pub filter: Option<FilterExpr>,
    /// Highlight expression, if one has been set.
    pub highlight: Option<FilterExpr>,
}

impl LayerState {
    const fn new(visibility: Visibility) -> Self {
        Self {
            visibility,
            filter: None,
            highlight: None,
        }
    }
}

/// Point-in-time copy of the engine's layer state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    /// Every layer, keyed by style id.
    pub layers: BTreeMap<LayerId, LayerState>,
    /// Last viewport fit request.
    pub viewport: Option<(BoundingBox, FitOptions)>,
    /// Number of batches applied so far.
    pub batches_applied: u64,
}

impl EngineSnapshot {
    /// Returns a layer's state.
    #[must_use]
    pub fn layer(&self, layer: LayerId) -> Option<&LayerState> {
        self.layers.get(&layer)
    }

    /// Whether a layer is currently visible.
    #[must_use]
    pub fn is_visible(&self, layer: LayerId) -> bool {
        self.layer(layer)
            .is_some_and(|state| state.visibility.is_visible())
    }
}

/// Map engine that keeps layer state in memory and answers feature
/// queries directly from the loaded asset sources.
///
/// Instructions take effect immediately, so [`MapEngine::settled`] always
/// resolves at once.
#[derive(Debug)]
pub struct InMemoryEngine {
    sources: BTreeMap<ScenarioYear, Vec<SourceFeature>>,
    state: Mutex<EngineSnapshot>,
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEngine {
    /// Creates an engine with empty sources and the dashboard's initial
    /// layer visibility: the 2025 floodplain and assets plus the boundary
    /// outline are shown, everything else is hidden.
    #[must_use]
    pub fn new() -> Self {
        let mut layers = BTreeMap::new();
        layers.insert(LayerId::Boundary, LayerState::new(Visibility::Visible));
        for year in ScenarioYear::all() {
            let initial = Visibility::from_bool(*year == ScenarioYear::Current);
            layers.insert(LayerId::floodplain(*year), LayerState::new(initial));
            layers.insert(LayerId::assets(*year), LayerState::new(initial));
        }
        for layer in LayerId::BLUE_ACRES {
            layers.insert(layer, LayerState::new(Visibility::None));
        }

        Self {
            sources: BTreeMap::new(),
            state: Mutex::new(EngineSnapshot {
                layers,
                viewport: None,
                batches_applied: 0,
            }),
        }
    }

    /// Replaces a scenario's asset source with the point features of a
    /// `GeoJSON` `FeatureCollection`. Returns the number of features
    /// loaded.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the text is not a `FeatureCollection`.
    pub fn insert_source_geojson(
        &mut self,
        year: ScenarioYear,
        text: &str,
    ) -> Result<usize, EngineError> {
        let GeoJson::FeatureCollection(collection) = text.parse::<GeoJson>().map_err(Box::new)?
        else {
            return Err(EngineError::NotFeatureCollection { year });
        };

        let features: Vec<SourceFeature> = collection
            .features
            .into_iter()
            .filter_map(|feature| {
                let geojson::Value::Point(coords) = feature.geometry?.value else {
                    return None;
                };
                Some(SourceFeature {
                    properties: feature.properties.unwrap_or_default(),
                    longitude: *coords.first()?,
                    latitude: *coords.get(1)?,
                })
            })
            .collect();

        let count = features.len();
        self.sources.insert(year, features);
        Ok(count)
    }

    /// Loads a scenario's asset source from a `GeoJSON` file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the file cannot be read or parsed.
    pub fn load_source_file(&mut self, year: ScenarioYear, path: &Path) -> Result<usize, EngineError> {
        let text = std::fs::read_to_string(path)?;
        let count = self.insert_source_geojson(year, &text)?;
        log::info!("Loaded {count} {year} asset features from {}", path.display());
        Ok(count)
    }

    /// Like [`Self::load_source_file`], but logs failures and leaves the
    /// scenario's source empty.
    pub fn load_source_file_or_empty(&mut self, year: ScenarioYear, path: &Path) {
        if let Err(e) = self.load_source_file(year, path) {
            log::warn!(
                "Could not load {year} asset features from {}: {e}",
                path.display()
            );
            self.sources.insert(year, Vec::new());
        }
    }

    /// Returns a copy of the current layer state.
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl MapEngine for InMemoryEngine {
    fn apply(&self, batch: &[Instruction]) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        for instruction in batch {
            match instruction {
                Instruction::SetVisibility { layer, visibility } => {
                    state
                        .layers
                        .entry(*layer)
                        .or_insert_with(|| LayerState::new(*visibility))
                        .visibility = *visibility;
                }
                Instruction::SetFilter { layer, filter } => {
                    if let Some(layer_state) = state.layers.get_mut(layer) {
                        layer_state.filter = Some(filter.clone());
                    } else {
                        log::warn!("Ignoring filter for unknown layer {layer}");
                    }
                }
                Instruction::SetHighlight { layer, filter } => {
                    if let Some(layer_state) = state.layers.get_mut(layer) {
                        layer_state.highlight = Some(filter.clone());
                    } else {
                        log::warn!("Ignoring highlight for unknown layer {layer}");
                    }
                }
                Instruction::FitViewport { bounds, options } => {
                    state.viewport = Some((*bounds, *options));
                }
            }
        }

        state.batches_applied += 1;
        log::trace!(
            "Applied batch of {} instructions ({} total batches)",
            batch.len(),
            state.batches_applied
        );
    }

    async fn settled(&self) {}

    async fn query_matched_features(
        &self,
        year: ScenarioYear,
        filter: &FilterExpr,
    ) -> Vec<FeatureRecord> {
        self.sources
            .get(&year)
            .map(|features| {
                features
                    .iter()
                    .filter(|feature| filter.matches(&feature.properties))
                    .map(|feature| {
                        FeatureRecord::from_properties(
                            &feature.properties,
                            feature.longitude,
                            feature.latitude,
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASSETS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-74.17, 40.73]},
             "properties": {"UNIQUE_ID": "A1", "ASSET": "SCHOOL", "MUN": "NEWARK CITY"}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-74.18, 40.74]},
             "properties": {"UNIQUE_ID": "A2", "ASSET": "PARK", "MUN": "NEWARK CITY"}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-74.21, 40.66]},
             "properties": {"UNIQUE_ID": "B1", "ASSET": "PARK", "MUN": "ELIZABETH CITY"}},
            {"type": "Feature", "geometry": null, "properties": {"UNIQUE_ID": "X"}}
        ]
    }"#;

    #[tokio::test]
    async fn queries_filter_by_properties() {
        let mut engine = InMemoryEngine::new();
        let loaded = engine
            .insert_source_geojson(ScenarioYear::Current, ASSETS)
            .unwrap();
        assert_eq!(loaded, 3, "features without point geometry are skipped");

        engine.settled().await;
        let newark = engine
            .query_matched_features(
                ScenarioYear::Current,
                &FilterExpr::equals("MUN", "NEWARK CITY"),
            )
            .await;
        assert_eq!(newark.len(), 2);
        assert_eq!(newark[0].unique_id.as_deref(), Some("A1"));
        assert!((newark[0].longitude - -74.17).abs() < f64::EPSILON);

        let empty = engine
            .query_matched_features(
                ScenarioYear::Projected,
                &FilterExpr::equals("MUN", "NEWARK CITY"),
            )
            .await;
        assert!(empty.is_empty());
    }

    #[test]
    fn applies_batches() {
        let engine = InMemoryEngine::new();
        let before = engine.snapshot();
        assert!(before.is_visible(LayerId::assets(ScenarioYear::Current)));
        assert!(!before.is_visible(LayerId::BlueAcresFill));

        engine.apply(&[
            Instruction::SetVisibility {
                layer: LayerId::assets(ScenarioYear::Current),
                visibility: Visibility::None,
            },
            Instruction::SetVisibility {
                layer: LayerId::BlueAcresFill,
                visibility: Visibility::Visible,
            },
            Instruction::SetFilter {
                layer: LayerId::Boundary,
                filter: FilterExpr::equals("MUN", "CAMDEN CITY"),
            },
        ]);

        let after = engine.snapshot();
        assert!(!after.is_visible(LayerId::assets(ScenarioYear::Current)));
        assert!(after.is_visible(LayerId::BlueAcresFill));
        assert_eq!(
            after.layer(LayerId::Boundary).unwrap().filter,
            Some(FilterExpr::equals("MUN", "CAMDEN CITY"))
        );
        assert_eq!(after.batches_applied, 1);
    }

    #[test]
    fn rejects_non_collection_sources() {
        let mut engine = InMemoryEngine::new();
        let result = engine.insert_source_geojson(
            ScenarioYear::Projected,
            r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#,
        );
        assert!(matches!(
            result,
            Err(EngineError::NotFeatureCollection {
                year: ScenarioYear::Projected
            })
        ));
    }
}
