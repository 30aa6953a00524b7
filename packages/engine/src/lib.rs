#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map engine interface and an in-memory implementation.
//!
//! The dashboard never talks to a rendering library directly. It hands
//! batches of [`Instruction`]s to a [`MapEngine`], waits for the engine to
//! settle, and then queries the features each scenario layer matches.
//! [`InMemoryEngine`] answers those queries from the scenario `GeoJSON`
//! files and records layer state so the server and tests can inspect it.

pub mod memory;

use async_trait::async_trait;
use flood_map_asset_models::ScenarioYear;
use flood_map_map_models::{FeatureRecord, FilterExpr, Instruction};

pub use memory::{EngineSnapshot, InMemoryEngine, LayerState};

/// Errors that can occur while loading engine sources.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Reading a source file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A source is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] Box<geojson::Error>),

    /// A source is valid `GeoJSON` but not a `FeatureCollection`.
    #[error("Expected a GeoJSON FeatureCollection for the {year} asset source")]
    NotFeatureCollection {
        /// Scenario the source was loaded for.
        year: ScenarioYear,
    },
}

/// A map renderer as seen by the dashboard.
#[async_trait]
pub trait MapEngine: Send + Sync {
    /// Applies a batch of instructions.
    ///
    /// Implementations must apply the whole batch before any rendering or
    /// query can observe it, so paired visibility changes never show an
    /// intermediate state.
    fn apply(&self, batch: &[Instruction]);

    /// Resolves once every previously applied batch has fully rendered and
    /// queries will be consistent with it.
    async fn settled(&self);

    /// Returns the features of a scenario's asset source that match
    /// `filter`, regardless of layer visibility.
    ///
    /// Results may contain the same feature more than once; callers
    /// deduplicate by unique identifier.
    async fn query_matched_features(
        &self,
        year: ScenarioYear,
        filter: &FilterExpr,
    ) -> Vec<FeatureRecord>;
}
