#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Flood exposure dashboard session.
//!
//! A [`Dashboard`] owns the user's [`SelectionState`], pushes the derived
//! layer instructions to a [`MapEngine`], and recomputes statistics from
//! the features the engine matches once it has settled. Baseline totals
//! and municipality bounds are loaded once and shared read-only.
//!
//! Selection changes are synchronous and reach the engine while the
//! selection lock is held, so the engine sees batches in selection order.
//! Statistics refreshes are async and
//! may race with later selection changes; a refresh whose municipality is
//! no longer active when its queries return is dropped instead of
//! published.

pub mod export;
pub mod presentation;
pub mod selection;
pub mod stats;
pub mod viewport;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use flood_map_asset_models::{AssetType, Municipality, ScenarioYear};
use flood_map_engine::MapEngine;
use flood_map_geography::BoundsIndex;
use flood_map_map_models::{
    FeatureRecord, FilterExpr, Instruction, MUN_PROPERTY, dedupe_by_unique_id,
};
use flood_map_totals::TotalsTable;
use serde::Serialize;

pub use export::{CsvExport, ExportError};
pub use presentation::LegendCard;
pub use selection::SelectionState;
pub use stats::{AssetKey, DerivedStatistics, TypeStatistics};
pub use viewport::Viewport;

/// Where a startup resource is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// A local file.
    File(PathBuf),
    /// An HTTP(S) URL.
    Url(String),
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Everything shown for the active municipality after a refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    /// Municipality key.
    pub municipality: Municipality,
    /// Human readable municipality name.
    pub display_name: &'static str,
    /// Selection the report was computed for.
    pub selection: SelectionState,
    /// Exposure statistics.
    pub statistics: DerivedStatistics,
    /// Legend cards in ranking order.
    pub legend: Vec<LegendCard>,
    /// Key finding sentence, empty when there is nothing to report.
    pub finding: String,
    /// Blue Acres summary, present while the overlay is on.
    pub blue_acres: Option<String>,
}

/// Outcome of [`Dashboard::refresh_statistics`].
#[derive(Debug, Clone, PartialEq)]
pub enum Refresh {
    /// The report was computed and published.
    Applied(Arc<DashboardReport>),
    /// The municipality changed while the queries ran; nothing was
    /// published.
    Stale,
}

/// One user's dashboard.
pub struct Dashboard {
    engine: Arc<dyn MapEngine>,
    selection: Mutex<SelectionState>,
    totals: OnceLock<TotalsTable>,
    bounds: OnceLock<BoundsIndex>,
    viewport: Viewport,
    report: Mutex<Option<Arc<DashboardReport>>>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("selection", &*self.lock_selection())
            .field("totals_loaded", &self.totals.get().is_some())
            .field("bounds_loaded", &self.bounds.get().is_some())
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    /// Creates a session focused on `municipality` and applies its initial
    /// layer instructions.
    pub fn new(engine: Arc<dyn MapEngine>, municipality: Municipality, viewport: Viewport) -> Self {
        let selection = SelectionState::new(municipality);
        engine.apply(&selection.instructions());

        Self {
            engine,
            selection: Mutex::new(selection),
            totals: OnceLock::new(),
            bounds: OnceLock::new(),
            viewport,
            report: Mutex::new(None),
        }
    }

    fn lock_selection(&self) -> MutexGuard<'_, SelectionState> {
        self.selection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of the current selection.
    #[must_use]
    pub fn selection(&self) -> SelectionState {
        self.lock_selection().clone()
    }

    /// Baseline totals, once loaded.
    #[must_use]
    pub fn totals(&self) -> Option<&TotalsTable> {
        self.totals.get()
    }

    /// Municipality bounds, once loaded.
    #[must_use]
    pub fn bounds(&self) -> Option<&BoundsIndex> {
        self.bounds.get()
    }

    /// The most recently published report.
    #[must_use]
    pub fn latest_report(&self) -> Option<Arc<DashboardReport>> {
        self.report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Loads baseline totals and boundaries concurrently. Failures are
    /// logged; the dashboard then runs without baselines or without
    /// viewport fits.
    pub async fn load(&self, totals: &Resource, boundaries: &Resource) {
        let client = reqwest::Client::new();

        let (table, bounds) = tokio::join!(
            async {
                match totals {
                    Resource::File(path) => flood_map_totals::load_file_or_empty(path),
                    Resource::Url(url) => flood_map_totals::fetch_or_empty(&client, url).await,
                }
            },
            async {
                match boundaries {
                    Resource::File(path) => flood_map_geography::load_file_or_unavailable(path),
                    Resource::Url(url) => {
                        flood_map_geography::fetch_or_unavailable(&client, url).await
                    }
                }
            },
        );

        self.set_totals(table);
        if let Some(bounds) = bounds {
            self.set_bounds(bounds);
        }
    }

    /// Installs the baseline totals. Only the first call has an effect.
    pub fn set_totals(&self, table: TotalsTable) {
        if self.totals.set(table).is_err() {
            log::warn!("Baseline totals already loaded, ignoring reload");
        }
    }

    /// Installs the municipality bounds and frames the active
    /// municipality. Only the first call has an effect.
    pub fn set_bounds(&self, bounds: BoundsIndex) {
        if self.bounds.set(bounds).is_err() {
            log::warn!("Boundaries already loaded, ignoring reload");
            return;
        }
        let selection = self.lock_selection();
        if let Some(fit) = self.fit_instruction(selection.municipality()) {
            self.engine.apply(&[fit]);
        }
    }

    fn fit_instruction(&self, municipality: Municipality) -> Option<Instruction> {
        let bounds = self.bounds.get()?.get(municipality)?;
        Some(Instruction::FitViewport {
            bounds,
            options: viewport::fit_options(municipality, self.viewport),
        })
    }

    /// Switches to the municipality with the given key and frames it.
    /// Unknown keys are ignored; returns whether the key was accepted.
    pub fn select_municipality(&self, key: &str) -> bool {
        let Some(municipality) = Municipality::from_key(key) else {
            log::debug!("Ignoring unknown municipality {key:?}");
            return false;
        };

        let mut selection = self.lock_selection();
        let mut batch = selection.set_active_municipality(municipality);
        batch.extend(self.fit_instruction(municipality));
        self.engine.apply(&batch);
        drop(selection);
        true
    }

    /// Flips the floodplain toggle for a year token (`"2025"` or `"2050"`).
    /// Unknown tokens are ignored; returns whether the token was accepted.
    pub fn toggle_scenario(&self, token: &str) -> bool {
        let Ok(year) = token.parse::<ScenarioYear>() else {
            log::debug!("Ignoring unknown scenario {token:?}");
            return false;
        };

        let mut selection = self.lock_selection();
        let batch = selection.toggle_scenario(year);
        self.engine.apply(&batch);
        drop(selection);
        true
    }

    /// Shows or hides an asset type by its `ASSET` tag. Unknown tags are
    /// ignored; returns whether the tag was accepted.
    pub fn toggle_asset_type(&self, tag: &str) -> bool {
        let Ok(asset) = tag.parse::<AssetType>() else {
            log::debug!("Ignoring unknown asset type {tag:?}");
            return false;
        };

        let mut selection = self.lock_selection();
        let batch = selection.toggle_asset_type(asset);
        self.engine.apply(&batch);
        drop(selection);
        true
    }

    /// Switches between asset points and the Blue Acres overlay.
    pub fn toggle_overlay(&self) {
        let mut selection = self.lock_selection();
        let batch = selection.toggle_overlay();
        self.engine.apply(&batch);
    }

    /// Queries both scenarios for the given municipality, deduplicated.
    async fn exposed_features(
        &self,
        municipality: Municipality,
    ) -> (Vec<FeatureRecord>, Vec<FeatureRecord>) {
        let filter = FilterExpr::equals(MUN_PROPERTY, municipality.key());
        let (raw_2025, raw_2050) = tokio::join!(
            self.engine
                .query_matched_features(ScenarioYear::Current, &filter),
            self.engine
                .query_matched_features(ScenarioYear::Projected, &filter),
        );

        (dedupe_by_unique_id(raw_2025), dedupe_by_unique_id(raw_2050))
    }

    /// Recomputes statistics for the active municipality and publishes
    /// the report.
    ///
    /// Selection changes made while this runs coalesce: the queries use
    /// the municipality active once the engine settles.
    pub async fn refresh_statistics(&self) -> Refresh {
        self.engine.settled().await;
        let municipality = self.lock_selection().municipality();

        let (features_2025, features_2050) = self.exposed_features(municipality).await;

        let selection = self.selection();
        if selection.municipality() != municipality {
            log::debug!(
                "Discarding statistics for {municipality}, {} is now active",
                selection.municipality()
            );
            return Refresh::Stale;
        }

        let baseline = self.totals().and_then(|t| t.get(municipality));
        let statistics =
            DerivedStatistics::aggregate(municipality, &features_2025, &features_2050, baseline);

        let report = Arc::new(DashboardReport {
            municipality,
            display_name: municipality.display_name(),
            legend: presentation::legend_cards(&statistics, selection.hidden_asset_types()),
            finding: presentation::finding_narrative(&statistics),
            blue_acres: presentation::blue_acres_summary(municipality, selection.overlay()),
            statistics,
            selection,
        });

        *self.report.lock().unwrap_or_else(PoisonError::into_inner) = Some(report.clone());
        Refresh::Applied(report)
    }

    /// Builds the CSV export of every exposed asset in the active
    /// municipality for both scenarios, regardless of hidden types.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NoAssets`] if nothing is exposed, or another
    /// [`ExportError`] if the CSV cannot be written.
    pub async fn export_csv(&self) -> Result<CsvExport, ExportError> {
        self.engine.settled().await;
        let municipality = self.lock_selection().municipality();
        let (features_2025, features_2050) = self.exposed_features(municipality).await;
        export::build_export(municipality, &features_2025, &features_2050)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use flood_map_engine::InMemoryEngine;
    use flood_map_map_models::{BoundingBox, LayerId};
    use tokio::sync::watch;

    use super::*;

    const ASSETS_2025: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-74.17, 40.73]},
             "properties": {"UNIQUE_ID": "A1", "ASSET": "SCHOOL", "MUN": "NEWARK CITY", "NAME": "Central HS"}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-74.17, 40.73]},
             "properties": {"UNIQUE_ID": "A1", "ASSET": "SCHOOL", "MUN": "NEWARK CITY", "NAME": "Central HS"}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-74.21, 40.66]},
             "properties": {"UNIQUE_ID": "E1", "ASSET": "PARK", "MUN": "ELIZABETH CITY"}}
        ]
    }"#;

    const ASSETS_2050: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-74.17, 40.73]},
             "properties": {"UNIQUE_ID": "A1", "ASSET": "SCHOOL", "MUN": "NEWARK CITY"}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-74.18, 40.74]},
             "properties": {"UNIQUE_ID": "A2", "ASSET": "HOSPITAL", "MUN": "NEWARK CITY"}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-74.21, 40.66]},
             "properties": {"UNIQUE_ID": "E1", "ASSET": "PARK", "MUN": "ELIZABETH CITY"}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-74.22, 40.67]},
             "properties": {"UNIQUE_ID": "E2", "ASSET": "PARK", "MUN": "ELIZABETH CITY"}}
        ]
    }"#;

    fn loaded_engine() -> InMemoryEngine {
        let mut engine = InMemoryEngine::new();
        engine
            .insert_source_geojson(ScenarioYear::Current, ASSETS_2025)
            .unwrap();
        engine
            .insert_source_geojson(ScenarioYear::Projected, ASSETS_2050)
            .unwrap();
        engine
    }

    fn dashboard() -> (Arc<InMemoryEngine>, Dashboard) {
        let engine = Arc::new(loaded_engine());
        let dashboard = Dashboard::new(engine.clone(), Municipality::Newark, Viewport::Desktop);
        (engine, dashboard)
    }

    fn bounds() -> BoundsIndex {
        BoundsIndex::from_geojson_str(
            &serde_json::json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": {"MUN": "ELIZABETH CITY"},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[-74.23, 40.63], [-74.15, 40.63], [-74.15, 40.69], [-74.23, 40.63]]]
                    }
                }]
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn new_applies_initial_filters() {
        let (engine, _dashboard) = dashboard();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.batches_applied, 1);
        assert_eq!(
            snapshot.layer(LayerId::Boundary).unwrap().filter,
            Some(FilterExpr::equals("MUN", "NEWARK CITY"))
        );
    }

    #[test]
    fn invalid_inputs_emit_nothing() {
        let (engine, dashboard) = dashboard();
        let before = dashboard.selection();

        assert!(!dashboard.select_municipality("HOBOKEN CITY"));
        assert!(!dashboard.toggle_scenario("2049"));
        assert!(!dashboard.toggle_asset_type("HELIPAD"));

        assert_eq!(dashboard.selection(), before);
        assert_eq!(engine.snapshot().batches_applied, 1);
    }

    #[test]
    fn selecting_frames_municipality_once_bounds_load() {
        let (engine, dashboard) = dashboard();
        assert!(dashboard.select_municipality("ELIZABETH CITY"));
        assert_eq!(engine.snapshot().viewport, None, "no fit before bounds load");

        dashboard.set_bounds(bounds());
        let (bbox, options) = engine.snapshot().viewport.unwrap();
        assert_eq!(bbox, BoundingBox::new(-74.23, 40.63, -74.15, 40.69));
        assert!((options.padding.right - 340.0).abs() < f64::EPSILON);
    }

    #[test]
    fn overlay_and_assets_swap_in_one_batch() {
        let (engine, dashboard) = dashboard();
        dashboard.toggle_overlay();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.batches_applied, 2);
        assert!(!snapshot.is_visible(LayerId::assets(ScenarioYear::Current)));
        assert!(snapshot.is_visible(LayerId::BlueAcresFill));
        assert_eq!(
            snapshot.layer(LayerId::BlueAcresFill).unwrap().highlight,
            Some(FilterExpr::equals("MUNICIPALI", "Newark City"))
        );
    }

    #[test]
    fn scenario_toggles_reach_engine() {
        let (engine, dashboard) = dashboard();
        assert!(dashboard.toggle_scenario("2050"));

        let snapshot = engine.snapshot();
        assert!(snapshot.is_visible(LayerId::floodplain(ScenarioYear::Projected)));
        assert!(snapshot.is_visible(LayerId::assets(ScenarioYear::Projected)));
        assert!(!snapshot.is_visible(LayerId::assets(ScenarioYear::Current)));
    }

    #[tokio::test]
    async fn refresh_deduplicates_and_uses_baseline() {
        let (_engine, dashboard) = dashboard();
        let mut newark = BTreeMap::new();
        newark.insert(AssetType::School, 4);
        let table = flood_map_totals::parse_totals("Newark,,,,,\nSCHOOL,4,,,,\n");
        assert_eq!(table.get(Municipality::Newark), Some(&newark));
        dashboard.set_totals(table);

        let Refresh::Applied(report) = dashboard.refresh_statistics().await else {
            panic!("refresh should not be stale");
        };
        let school = report.statistics.get(AssetType::School).unwrap();
        assert_eq!(school.count_2025, 1, "duplicate A1 collapses");
        assert_eq!(school.total, 4);
        let hospital = report.statistics.get(AssetType::Hospital).unwrap();
        assert_eq!(hospital.total, 1);
        assert_eq!(report.statistics.overall_total, 5);
        assert_eq!(report.legend.len(), 2);
        assert_eq!(
            report.finding,
            "Of 5 public assets in Newark, 1 are in the floodplain today \u{2014} rising to 2 by 2050 (40.0% of all assets)."
        );
        assert_eq!(dashboard.latest_report(), Some(report));
    }

    struct GatedEngine {
        inner: InMemoryEngine,
        open: watch::Receiver<bool>,
    }

    #[async_trait]
    impl MapEngine for GatedEngine {
        fn apply(&self, batch: &[Instruction]) {
            self.inner.apply(batch);
        }

        async fn settled(&self) {
            self.inner.settled().await;
        }

        async fn query_matched_features(
            &self,
            year: ScenarioYear,
            filter: &FilterExpr,
        ) -> Vec<FeatureRecord> {
            let mut open = self.open.clone();
            open.wait_for(|ready| *ready).await.unwrap();
            self.inner.query_matched_features(year, filter).await
        }
    }

    #[tokio::test]
    async fn stale_results_are_discarded() {
        let (gate, open) = watch::channel(false);
        let engine = Arc::new(GatedEngine {
            inner: loaded_engine(),
            open,
        });
        let dashboard = Dashboard::new(engine, Municipality::Newark, Viewport::Desktop);

        let (outcome, ()) = tokio::join!(dashboard.refresh_statistics(), async {
            assert!(dashboard.select_municipality("ELIZABETH CITY"));
            gate.send(true).unwrap();
        });

        assert_eq!(outcome, Refresh::Stale);
        assert_eq!(dashboard.latest_report(), None);

        let Refresh::Applied(report) = dashboard.refresh_statistics().await else {
            panic!("second refresh should apply");
        };
        assert_eq!(report.municipality, Municipality::Elizabeth);
        assert_eq!(report.statistics.overall_2050, 2);
    }

    /// Stalls the first selection change inside `apply`.
    struct SlowApplyEngine {
        inner: InMemoryEngine,
        applied: AtomicUsize,
    }

    #[async_trait]
    impl MapEngine for SlowApplyEngine {
        fn apply(&self, batch: &[Instruction]) {
            if self.applied.fetch_add(1, Ordering::SeqCst) == 1 {
                std::thread::sleep(Duration::from_millis(100));
            }
            self.inner.apply(batch);
        }

        async fn settled(&self) {
            self.inner.settled().await;
        }

        async fn query_matched_features(
            &self,
            year: ScenarioYear,
            filter: &FilterExpr,
        ) -> Vec<FeatureRecord> {
            self.inner.query_matched_features(year, filter).await
        }
    }

    #[test]
    fn concurrent_selections_reach_engine_in_selection_order() {
        let engine = Arc::new(SlowApplyEngine {
            inner: InMemoryEngine::new(),
            applied: AtomicUsize::new(0),
        });
        let dashboard = Dashboard::new(engine.clone(), Municipality::Newark, Viewport::Desktop);

        std::thread::scope(|scope| {
            scope.spawn(|| assert!(dashboard.select_municipality("CAMDEN CITY")));
            while engine.applied.load(Ordering::SeqCst) < 2 {
                std::thread::yield_now();
            }
            scope.spawn(|| assert!(dashboard.select_municipality("TRENTON CITY")));
        });

        let selected = dashboard.selection().municipality();
        assert_eq!(selected, Municipality::Trenton);
        assert_eq!(
            engine.inner.snapshot().layer(LayerId::Boundary).unwrap().filter,
            Some(FilterExpr::equals("MUN", selected.key())),
            "engine must end on the selected municipality"
        );
    }

    #[tokio::test]
    async fn export_covers_both_years() {
        let (_engine, dashboard) = dashboard();
        dashboard.toggle_asset_type("SCHOOL");

        let export = dashboard.export_csv().await.unwrap();
        assert_eq!(export.filename, "Newark_2025_2050_flood_exposed_assets.csv");
        assert_eq!(export.row_count, 3, "hidden types are still exported");
    }

    #[tokio::test]
    async fn empty_export_fails() {
        let (_engine, dashboard) = dashboard();
        dashboard.select_municipality("TRENTON CITY");
        assert!(matches!(
            dashboard.export_csv().await,
            Err(ExportError::NoAssets)
        ));
    }

    #[tokio::test]
    async fn missing_resources_degrade() {
        let (engine, dashboard) = dashboard();
        dashboard
            .load(
                &Resource::File(PathBuf::from("/nonexistent/findings.csv")),
                &Resource::File(PathBuf::from("/nonexistent/boundary.json")),
            )
            .await;

        assert!(dashboard.totals().is_some_and(TotalsTable::is_empty));
        assert!(dashboard.bounds().is_none());
        assert!(dashboard.select_municipality("CAMDEN CITY"));
        assert_eq!(engine.snapshot().viewport, None);
    }
}
