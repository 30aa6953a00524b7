//! Per-type and overall exposure statistics.

use std::collections::BTreeMap;

use flood_map_asset_models::{AssetType, Municipality, ScenarioYear, UNKNOWN_ASSET_COLOR};
use flood_map_map_models::FeatureRecord;
use serde::Serialize;

/// Tag used for features without an `ASSET` property.
const MISSING_TAG: &str = "Unknown";

/// The asset tag a statistics entry is keyed by.
///
/// Tags outside the taxonomy are kept verbatim so their features still
/// count toward the overall figures.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum AssetKey {
    /// A recognized asset type.
    Known(AssetType),
    /// Any other tag, as found on the feature.
    Other(String),
}

impl AssetKey {
    fn of(feature: &FeatureRecord) -> Self {
        match (feature.asset_type(), feature.asset.as_deref()) {
            (Some(asset), _) => Self::Known(asset),
            (None, Some(tag)) if !tag.is_empty() => Self::Other(tag.to_owned()),
            (None, _) => Self::Other(MISSING_TAG.to_owned()),
        }
    }

    /// The recognized type, if any.
    #[must_use]
    pub const fn known(&self) -> Option<AssetType> {
        match self {
            Self::Known(asset) => Some(*asset),
            Self::Other(_) => None,
        }
    }

    /// Display label; the raw tag for unrecognized tags.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Known(asset) => asset.label(),
            Self::Other(tag) => tag,
        }
    }

    /// Legend emoji, empty for unrecognized tags.
    #[must_use]
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::Known(asset) => asset.emoji(),
            Self::Other(_) => "",
        }
    }

    /// Legend color.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Known(asset) => asset.color(),
            Self::Other(_) => UNKNOWN_ASSET_COLOR,
        }
    }
}

impl From<AssetType> for AssetKey {
    fn from(asset: AssetType) -> Self {
        Self::Known(asset)
    }
}

/// Exposure of one asset type in the active municipality.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeStatistics {
    /// Asset tag.
    pub asset: AssetKey,
    /// Assets in the 2025 floodplain.
    pub count_2025: u32,
    /// Assets in the 2050 floodplain.
    pub count_2050: u32,
    /// Denominator for the percentages. Never zero.
    pub total: u32,
    /// Whether `total` came from the findings spreadsheet.
    pub has_baseline: bool,
}

impl TypeStatistics {
    /// Exposed count for a scenario.
    #[must_use]
    pub const fn count(&self, year: ScenarioYear) -> u32 {
        match year {
            ScenarioYear::Current => self.count_2025,
            ScenarioYear::Projected => self.count_2050,
        }
    }

    /// Percentage of this type exposed in a scenario.
    #[must_use]
    pub fn percent(&self, year: ScenarioYear) -> f64 {
        100.0 * f64::from(self.count(year)) / f64::from(self.total)
    }

    /// Ranking key: share of this type exposed by 2050.
    #[must_use]
    pub fn risk(&self) -> f64 {
        f64::from(self.count_2050) / f64::from(self.total)
    }
}

/// Statistics for the active municipality, ranked by 2050 risk.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStatistics {
    /// Municipality the statistics describe.
    pub municipality: Municipality,
    /// One entry per asset type, highest 2050 risk first.
    pub ranked: Vec<TypeStatistics>,
    /// Sum of per-type totals.
    pub overall_total: u32,
    /// Sum of 2025 counts.
    pub overall_2025: u32,
    /// Sum of 2050 counts.
    pub overall_2050: u32,
}

impl DerivedStatistics {
    /// Tallies deduplicated query results against the baseline totals.
    ///
    /// Records with a missing or unrecognized asset tag are counted under
    /// their raw tag.
    #[must_use]
    pub fn aggregate(
        municipality: Municipality,
        features_2025: &[FeatureRecord],
        features_2050: &[FeatureRecord],
        baseline: Option<&BTreeMap<AssetType, u32>>,
    ) -> Self {
        let mut universe: Vec<AssetKey> = Vec::new();
        let mut counts: BTreeMap<AssetKey, (u32, u32)> = BTreeMap::new();

        for (year, features) in [
            (ScenarioYear::Current, features_2025),
            (ScenarioYear::Projected, features_2050),
        ] {
            for feature in features {
                let asset = AssetKey::of(feature);
                if asset.known().is_none() {
                    log::debug!("Counting {year} feature with unrecognized tag {asset:?}");
                }
                let entry = counts.entry(asset).or_insert_with_key(|asset| {
                    universe.push(asset.clone());
                    (0, 0)
                });
                match year {
                    ScenarioYear::Current => entry.0 += 1,
                    ScenarioYear::Projected => entry.1 += 1,
                }
            }
        }

        if let Some(baseline) = baseline {
            for asset in baseline.keys().copied().map(AssetKey::Known) {
                if !universe.contains(&asset) {
                    universe.push(asset);
                }
            }
        }

        let mut ranked: Vec<TypeStatistics> = universe
            .into_iter()
            .map(|asset| {
                let (count_2025, count_2050) = counts.get(&asset).copied().unwrap_or_default();
                let known = baseline
                    .zip(asset.known())
                    .and_then(|(b, known)| b.get(&known).copied())
                    .filter(|total| *total > 0);
                let total = known.unwrap_or_else(|| count_2025.max(count_2050).max(1));
                TypeStatistics {
                    asset,
                    count_2025,
                    count_2050,
                    total,
                    has_baseline: known.is_some(),
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.risk().total_cmp(&a.risk()));

        Self {
            municipality,
            overall_total: ranked.iter().map(|s| s.total).sum(),
            overall_2025: ranked.iter().map(|s| s.count_2025).sum(),
            overall_2050: ranked.iter().map(|s| s.count_2050).sum(),
            ranked,
        }
    }

    /// Overall exposed count for a scenario.
    #[must_use]
    pub const fn overall_count(&self, year: ScenarioYear) -> u32 {
        match year {
            ScenarioYear::Current => self.overall_2025,
            ScenarioYear::Projected => self.overall_2050,
        }
    }

    /// Overall percentage exposed in a scenario, or 0 with no assets.
    #[must_use]
    pub fn overall_percent(&self, year: ScenarioYear) -> f64 {
        if self.overall_total == 0 {
            return 0.0;
        }
        100.0 * f64::from(self.overall_count(year)) / f64::from(self.overall_total)
    }

    /// Looks up one type's statistics.
    #[must_use]
    pub fn get(&self, asset: impl Into<AssetKey>) -> Option<&TypeStatistics> {
        let asset = asset.into();
        self.ranked.iter().find(|s| s.asset == asset)
    }
}
