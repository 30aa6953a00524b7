#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map layer identifiers, filter expressions, and instruction types.
//!
//! These types describe what the dashboard asks of a map engine: which
//! layers are visible, which attribute filters apply to them, and where the
//! viewport should be framed. They are independent of any particular
//! rendering library; [`FilterExpr`] serializes to the `MapLibre`/Mapbox
//! expression array syntax.

mod feature;
mod filter;

use std::fmt;

use flood_map_asset_models::{AssetType, MAP_FALLBACK_COLOR, ScenarioYear};
use serde::{Deserialize, Serialize, Serializer};

pub use feature::{FeatureRecord, dedupe_by_unique_id};
pub use filter::FilterExpr;

/// Feature property holding the canonical municipality key.
pub const MUN_PROPERTY: &str = "MUN";
/// Feature property holding the asset type tag.
pub const ASSET_PROPERTY: &str = "ASSET";
/// Feature property holding the asset's unique identifier.
pub const UNIQUE_ID_PROPERTY: &str = "UNIQUE_ID";
/// Feature property holding the asset name.
pub const NAME_PROPERTY: &str = "NAME";
/// Feature property holding the county name.
pub const COUNTY_PROPERTY: &str = "COUNTY";
/// Blue Acres parcel property holding the parcel's municipality name.
pub const BLUE_ACRES_MUN_PROPERTY: &str = "MUNICIPALI";

/// A layer the dashboard controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerId {
    /// Dashed outline of the active municipality.
    Boundary,
    /// Floodplain fill for a scenario.
    Floodplain(ScenarioYear),
    /// Exposed asset points for a scenario.
    Assets(ScenarioYear),
    /// Blue Acres parcel polygons.
    BlueAcresFill,
    /// Blue Acres parcel outlines.
    BlueAcresOutline,
    /// Clustered Blue Acres parcel centroids.
    BlueAcresClusters,
    /// Labels on the Blue Acres clusters.
    BlueAcresClusterCount,
}

impl LayerId {
    /// All layers that make up the Blue Acres overlay.
    pub const BLUE_ACRES: [Self; 4] = [
        Self::BlueAcresFill,
        Self::BlueAcresOutline,
        Self::BlueAcresClusters,
        Self::BlueAcresClusterCount,
    ];

    /// Returns the asset layer for `year`.
    #[must_use]
    pub const fn assets(year: ScenarioYear) -> Self {
        Self::Assets(year)
    }

    /// Returns the floodplain layer for `year`.
    #[must_use]
    pub const fn floodplain(year: ScenarioYear) -> Self {
        Self::Floodplain(year)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boundary => f.write_str("boundary"),
            Self::Floodplain(year) => write!(f, "floodplain_{}", year.as_str()),
            Self::Assets(year) => write!(f, "assets_{}", year.as_str()),
            Self::BlueAcresFill => f.write_str("blueacres-fill"),
            Self::BlueAcresOutline => f.write_str("blueacres-outline"),
            Self::BlueAcresClusters => f.write_str("blueacres-clusters"),
            Self::BlueAcresClusterCount => f.write_str("blueacres-cluster-count"),
        }
    }
}

impl Serialize for LayerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Layout visibility of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Rendered.
    Visible,
    /// Not rendered.
    None,
}

impl Visibility {
    /// Maps a boolean to `Visible`/`None`.
    #[must_use]
    pub const fn from_bool(visible: bool) -> Self {
        if visible { Self::Visible } else { Self::None }
    }

    /// Whether this is [`Visibility::Visible`].
    #[must_use]
    pub const fn is_visible(self) -> bool {
        matches!(self, Self::Visible)
    }
}

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Grows the box to include the given point.
    pub fn extend(&mut self, lng: f64, lat: f64) {
        self.west = self.west.min(lng);
        self.south = self.south.min(lat);
        self.east = self.east.max(lng);
        self.north = self.north.max(lat);
    }

    /// Grows the box to include another box.
    pub fn union(&mut self, other: &Self) {
        self.extend(other.west, other.south);
        self.extend(other.east, other.north);
    }

    /// Whether the point lies inside or on the edge of the box.
    #[must_use]
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        (self.west..=self.east).contains(&lng) && (self.south..=self.north).contains(&lat)
    }

    /// Returns the `[[west, south], [east, north]]` form used by `fitBounds`.
    #[must_use]
    pub const fn corners(&self) -> [[f64; 2]; 2] {
        [[self.west, self.south], [self.east, self.north]]
    }
}

/// Pixel padding around fitted bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    /// Top padding.
    pub top: f64,
    /// Bottom padding.
    pub bottom: f64,
    /// Left padding.
    pub left: f64,
    /// Right padding.
    pub right: f64,
}

/// Options for a viewport fit request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitOptions {
    /// Padding around the bounds.
    pub padding: Padding,
    /// Pixel offset `[x, y]` applied after fitting.
    pub offset: [f64; 2],
    /// Animation duration in milliseconds.
    pub duration_ms: u32,
    /// Whether to animate linearly instead of with a fly-to curve.
    pub linear: bool,
    /// Maximum zoom the fit may reach.
    pub max_zoom: f64,
    /// Whether the animation ignores reduced-motion preferences.
    pub essential: bool,
}

/// A single declarative request to the map engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Instruction {
    /// Set a layer's layout visibility.
    SetVisibility {
        /// Target layer.
        layer: LayerId,
        /// New visibility.
        visibility: Visibility,
    },
    /// Replace a layer's attribute filter.
    SetFilter {
        /// Target layer.
        layer: LayerId,
        /// New filter.
        filter: FilterExpr,
    },
    /// Replace the expression that selects emphasized features on a layer.
    SetHighlight {
        /// Target layer.
        layer: LayerId,
        /// Features matching this expression are emphasized.
        filter: FilterExpr,
    },
    /// Frame the viewport around a bounding box.
    FitViewport {
        /// Bounds to fit.
        bounds: BoundingBox,
        /// Fit options.
        options: FitOptions,
    },
}

/// Builds the `circle-color` match expression for asset point layers.
#[must_use]
pub fn asset_color_expression() -> serde_json::Value {
    let mut expr = vec![
        serde_json::json!("match"),
        serde_json::json!(["get", ASSET_PROPERTY]),
    ];
    for asset in AssetType::all() {
        expr.push(serde_json::json!(asset.to_string()));
        expr.push(serde_json::json!(asset.color()));
    }
    expr.push(serde_json::json!(MAP_FALLBACK_COLOR));
    serde_json::Value::Array(expr)
}
