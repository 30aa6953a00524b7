//! View models built from [`DerivedStatistics`]: legend cards, the key
//! finding sentence and the Blue Acres summary.

use std::collections::BTreeSet;

use flood_map_asset_models::{AssetType, BLUE_ACRES_STATEWIDE_PARCELS, Municipality, ScenarioYear};
use serde::Serialize;

use crate::stats::{AssetKey, DerivedStatistics};

/// Smallest bar width so empty bars stay visible.
const MIN_BAR_PERCENT: f64 = 2.0;

/// One scenario row of a legend card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendBar {
    /// Scenario year.
    pub year: ScenarioYear,
    /// Exposed count.
    pub count: u32,
    /// Denominator shown as `count/total`.
    pub total: u32,
    /// Exposed share of the type.
    pub percent: f64,
    /// Bar width in percent.
    pub bar_width: f64,
}

/// Legend card for one asset type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendCard {
    /// Asset tag the card toggles.
    pub asset: AssetKey,
    /// Display label, the raw tag if unrecognized.
    pub label: String,
    /// Card emoji, empty if unrecognized.
    pub emoji: &'static str,
    /// Border color.
    pub color: &'static str,
    /// Whether the type is shown on the map.
    pub visible: bool,
    /// 2025 and 2050 bars, in that order.
    pub bars: [LegendBar; 2],
}

/// Builds one card per ranked type, in ranking order.
#[must_use]
pub fn legend_cards(stats: &DerivedStatistics, hidden: &BTreeSet<AssetType>) -> Vec<LegendCard> {
    stats
        .ranked
        .iter()
        .map(|entry| {
            let bar = |year: ScenarioYear| {
                let percent = entry.percent(year);
                LegendBar {
                    year,
                    count: entry.count(year),
                    total: entry.total,
                    percent,
                    bar_width: percent.max(MIN_BAR_PERCENT),
                }
            };
            LegendCard {
                asset: entry.asset.clone(),
                label: entry.asset.label().to_owned(),
                emoji: entry.asset.emoji(),
                color: entry.asset.color(),
                visible: entry.asset.known().is_none_or(|asset| !hidden.contains(&asset)),
                bars: [bar(ScenarioYear::Current), bar(ScenarioYear::Projected)],
            }
        })
        .collect()
}

/// The key finding sentence, or an empty string when the municipality has
/// no known assets.
#[must_use]
pub fn finding_narrative(stats: &DerivedStatistics) -> String {
    if stats.overall_total == 0 {
        return String::new();
    }
    format!(
        "Of {} public assets in {}, {} are in the floodplain today \u{2014} rising to {} by 2050 ({:.1}% of all assets).",
        stats.overall_total,
        stats.municipality.display_name(),
        stats.overall_2025,
        stats.overall_2050,
        stats.overall_percent(ScenarioYear::Projected),
    )
}

/// Statewide and per-city Blue Acres buyout counts. Only shown while the
/// overlay is on.
#[must_use]
pub fn blue_acres_summary(municipality: Municipality, overlay: bool) -> Option<String> {
    if !overlay {
        return None;
    }

    let statewide = format!(
        "{} parcels acquired statewide.",
        with_thousands(BLUE_ACRES_STATEWIDE_PARCELS)
    );
    let city = municipality.display_name();

    Some(match municipality.blue_acres_parcels() {
        0 => format!("{statewide} {city} has no Blue Acres parcels yet."),
        1 => format!("{statewide} {city} has 1 Blue Acres parcel (highlighted)."),
        n => format!("{statewide} {city} has {n} Blue Acres parcels (highlighted)."),
    })
}

/// Formats an integer with comma thousands separators.
fn with_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use flood_map_map_models::FeatureRecord;

    use super::*;

    fn feature(id: &str, asset: &str) -> FeatureRecord {
        FeatureRecord {
            unique_id: Some(id.to_owned()),
            asset: Some(asset.to_owned()),
            municipality: Some("CAMDEN CITY".to_owned()),
            longitude: -75.1,
            latitude: 39.94,
            name: None,
            county: None,
        }
    }

    fn camden_stats() -> DerivedStatistics {
        let baseline = BTreeMap::from([(AssetType::School, 40), (AssetType::Park, 10)]);
        DerivedStatistics::aggregate(
            Municipality::Camden,
            &[feature("S1", "SCHOOL")],
            &[feature("S1", "SCHOOL"), feature("P1", "PARK"), feature("P2", "PARK")],
            Some(&baseline),
        )
    }

    #[test]
    fn cards_follow_ranking_and_visibility() {
        let hidden = BTreeSet::from([AssetType::School]);
        let cards = legend_cards(&camden_stats(), &hidden);

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].asset, AssetKey::Known(AssetType::Park));
        assert!(cards[0].visible);
        assert_eq!(cards[0].label, "Parks");
        assert!((cards[0].bars[1].percent - 20.0).abs() < 1e-9);

        assert_eq!(cards[1].asset, AssetKey::Known(AssetType::School));
        assert!(!cards[1].visible);
        let bar_2025 = &cards[1].bars[0];
        assert_eq!((bar_2025.count, bar_2025.total), (1, 40));
        assert!((bar_2025.percent - 2.5).abs() < 1e-9);

        let park_2025 = &cards[0].bars[0];
        assert_eq!(park_2025.count, 0);
        assert!((park_2025.bar_width - MIN_BAR_PERCENT).abs() < f64::EPSILON);
    }

    #[test]
    fn unrecognized_tags_get_plain_cards() {
        let stats = DerivedStatistics::aggregate(
            Municipality::Camden,
            &[feature("X1", "HELIPAD")],
            &[feature("X1", "HELIPAD")],
            None,
        );
        let cards = legend_cards(&stats, &BTreeSet::new());

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].label, "HELIPAD");
        assert_eq!(cards[0].emoji, "");
        assert_eq!(cards[0].color, flood_map_asset_models::UNKNOWN_ASSET_COLOR);
        assert!(cards[0].visible);
        assert!((cards[0].bars[1].percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn narrative_sentence() {
        assert_eq!(
            finding_narrative(&camden_stats()),
            "Of 50 public assets in Camden, 1 are in the floodplain today \u{2014} rising to 3 by 2050 (6.0% of all assets)."
        );
    }

    #[test]
    fn narrative_is_empty_without_assets() {
        let stats = DerivedStatistics::aggregate(Municipality::Camden, &[], &[], None);
        assert_eq!(finding_narrative(&stats), "");
    }

    #[test]
    fn blue_acres_text() {
        assert_eq!(blue_acres_summary(Municipality::Newark, false), None);
        assert_eq!(
            blue_acres_summary(Municipality::Paterson, true).as_deref(),
            Some("1,677 parcels acquired statewide. Paterson has 24 Blue Acres parcels (highlighted).")
        );
        assert_eq!(
            blue_acres_summary(Municipality::AtlanticCity, true).as_deref(),
            Some("1,677 parcels acquired statewide. Atlantic City has no Blue Acres parcels yet.")
        );
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(with_thousands(7), "7");
        assert_eq!(with_thousands(1677), "1,677");
        assert_eq!(with_thousands(1_234_567), "1,234,567");
        assert_eq!(with_thousands(100_000), "100,000");
    }
}
