#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Asset type taxonomy, municipality registry, and flood scenario years.
//!
//! This crate holds the static reference data shared by every part of the
//! flood-map system: the public asset categories with their display
//! color, label and emoji, the fixed set of municipalities the dashboard
//! covers, and the aliases used by the municipality findings spreadsheet.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Legend color used for asset tags outside the known taxonomy.
pub const UNKNOWN_ASSET_COLOR: &str = "#999";

/// Map point color used for asset tags outside the known taxonomy.
pub const MAP_FALLBACK_COLOR: &str = "#cccccc";

/// Total Blue Acres parcels acquired statewide.
pub const BLUE_ACRES_STATEWIDE_PARCELS: u32 = 1677;

/// A category of public infrastructure asset.
///
/// The string form (`AIRPORT`, `KCS`, ...) is the `ASSET` property carried
/// by every asset feature in the scenario layers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum AssetType {
    /// Airports and other aviation facilities
    Airport,
    /// Hospitals
    Hospital,
    /// Known contaminated sites
    #[serde(rename = "KCS")]
    #[strum(serialize = "KCS")]
    KnownContaminatedSite,
    /// Public libraries
    Library,
    /// Parks
    Park,
    /// Power plants
    PowerPlant,
    /// Schools
    School,
    /// Solid and hazardous waste facilities
    SolidHazard,
    /// Solid waste landfills
    SolidWaste,
    /// Superfund sites
    Superfund,
    /// Wastewater treatment plants
    Wastewater,
}

impl AssetType {
    /// Returns the hex color used for this asset on the map and legend.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Airport => "#111111",
            Self::Hospital => "#D7263D",
            Self::KnownContaminatedSite => "#FF8700",
            Self::Library => "#FFD100",
            Self::Park => "#3FB950",
            Self::PowerPlant => "#8C1EFF",
            Self::School => "#FF5EBF",
            Self::SolidHazard => "#A15500",
            Self::SolidWaste => "#FF3D00",
            Self::Superfund => "#C10087",
            Self::Wastewater => "#5A5A5A",
        }
    }

    /// Returns the user-facing plural label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Airport => "Aviation Facilities",
            Self::Hospital => "Hospitals",
            Self::KnownContaminatedSite => "Contaminated Sites",
            Self::Library => "Libraries",
            Self::Park => "Parks",
            Self::PowerPlant => "Power Plants",
            Self::School => "Schools",
            Self::SolidHazard => "Solid & Hazardous Waste",
            Self::SolidWaste => "Solid Waste Landfills",
            Self::Superfund => "Superfund Sites",
            Self::Wastewater => "Wastewater Treatment",
        }
    }

    /// Returns the emoji shown on legend cards.
    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Airport => "\u{2708}\u{FE0F}",
            Self::Hospital => "\u{1F3E5}",
            Self::KnownContaminatedSite => "\u{26A0}\u{FE0F}",
            Self::Library => "\u{1F4DA}",
            Self::Park => "\u{1F333}",
            Self::PowerPlant => "\u{26A1}",
            Self::School => "\u{1F3EB}",
            Self::SolidHazard => "\u{1F9EA}",
            Self::SolidWaste => "\u{1F5D1}\u{FE0F}",
            Self::Superfund => "\u{1F6D1}",
            Self::Wastewater => "\u{1F6B0}",
        }
    }

    /// Returns the label this asset carries in the municipality findings
    /// spreadsheet.
    #[must_use]
    pub const fn findings_label(self) -> &'static str {
        match self {
            Self::Airport => "AIRPORT",
            Self::Hospital => "HOSPITAL",
            Self::KnownContaminatedSite => "KNOWN CONTAMINATED SITE",
            Self::Library => "LIBRARY",
            Self::Park => "PARK",
            Self::PowerPlant => "POWERPLANT",
            Self::School => "SCHOOL",
            Self::SolidHazard => "SOLID & HAZARD",
            Self::SolidWaste => "SOLID WASTE LANDFILL",
            Self::Superfund => "SUPERFUND",
            Self::Wastewater => "WASTEWATER TREATMENT",
        }
    }

    /// Looks up an asset type by its findings spreadsheet label.
    ///
    /// Matching is exact; unknown labels return `None`.
    #[must_use]
    pub fn from_findings_label(label: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|asset| asset.findings_label() == label)
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Airport,
            Self::Hospital,
            Self::KnownContaminatedSite,
            Self::Library,
            Self::Park,
            Self::PowerPlant,
            Self::School,
            Self::SolidHazard,
            Self::SolidWaste,
            Self::Superfund,
            Self::Wastewater,
        ]
    }
}

/// One of the municipalities covered by the dashboard.
///
/// The string form is the canonical `MUN` key carried by boundary and
/// asset features (e.g. `"NEWARK CITY"`).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Municipality {
    /// Newark, Essex County
    #[default]
    #[serde(rename = "NEWARK CITY")]
    #[strum(serialize = "NEWARK CITY")]
    Newark,
    /// Elizabeth, Union County
    #[serde(rename = "ELIZABETH CITY")]
    #[strum(serialize = "ELIZABETH CITY")]
    Elizabeth,
    /// Camden, Camden County
    #[serde(rename = "CAMDEN CITY")]
    #[strum(serialize = "CAMDEN CITY")]
    Camden,
    /// Trenton, Mercer County
    #[serde(rename = "TRENTON CITY")]
    #[strum(serialize = "TRENTON CITY")]
    Trenton,
    /// Jersey City, Hudson County
    #[serde(rename = "JERSEY CITY")]
    #[strum(serialize = "JERSEY CITY")]
    JerseyCity,
    /// Paterson, Passaic County
    #[serde(rename = "PATERSON CITY")]
    #[strum(serialize = "PATERSON CITY")]
    Paterson,
    /// Asbury Park, Monmouth County
    #[serde(rename = "ASBURY PARK CITY")]
    #[strum(serialize = "ASBURY PARK CITY")]
    AsburyPark,
    /// Atlantic City, Atlantic County
    #[serde(rename = "ATLANTIC CITY")]
    #[strum(serialize = "ATLANTIC CITY")]
    AtlanticCity,
}

impl Municipality {
    /// Returns the canonical `MUN` key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Newark => "NEWARK CITY",
            Self::Elizabeth => "ELIZABETH CITY",
            Self::Camden => "CAMDEN CITY",
            Self::Trenton => "TRENTON CITY",
            Self::JerseyCity => "JERSEY CITY",
            Self::Paterson => "PATERSON CITY",
            Self::AsburyPark => "ASBURY PARK CITY",
            Self::AtlanticCity => "ATLANTIC CITY",
        }
    }

    /// Parses a canonical `MUN` key, returning `None` for anything outside
    /// the fixed set.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        key.parse().ok()
    }

    /// Returns the short name shown in the legend and finding card.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Newark => "Newark",
            Self::Elizabeth => "Elizabeth",
            Self::Camden => "Camden",
            Self::Trenton => "Trenton",
            Self::JerseyCity => "Jersey City",
            Self::Paterson => "Paterson",
            Self::AsburyPark => "Asbury Park",
            Self::AtlanticCity => "Atlantic City",
        }
    }

    /// Returns the section heading this municipality uses in the findings
    /// spreadsheet.
    #[must_use]
    pub const fn findings_label(self) -> &'static str {
        match self {
            Self::Newark => "Newark",
            Self::Elizabeth => "Elizabeth",
            Self::Camden => "Camden",
            Self::Trenton => "Trenton",
            Self::JerseyCity => "Jersey City",
            Self::Paterson => "Paterson",
            Self::AsburyPark => "Asbury Park City",
            Self::AtlanticCity => "Atlantic City",
        }
    }

    /// Looks up a municipality by its findings spreadsheet heading.
    #[must_use]
    pub fn from_findings_label(label: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|mun| mun.findings_label() == label)
    }

    /// Whether the municipality is small or elongated enough to need a
    /// tighter viewport fit.
    #[must_use]
    pub const fn is_tight(self) -> bool {
        !matches!(self, Self::Camden | Self::JerseyCity)
    }

    /// Returns the `MUNICIPALI` value Blue Acres parcels use for this
    /// municipality, if it has any acquired parcels.
    #[must_use]
    pub const fn blue_acres_name(self) -> Option<&'static str> {
        match self {
            Self::Newark => Some("Newark City"),
            Self::Paterson => Some("Paterson City"),
            _ => None,
        }
    }

    /// Returns the number of Blue Acres parcels acquired in this
    /// municipality.
    #[must_use]
    pub const fn blue_acres_parcels(self) -> u32 {
        match self {
            Self::Newark => 6,
            Self::Paterson => 24,
            _ => 0,
        }
    }

    /// Resolves the `city` URL parameter to a municipality.
    ///
    /// Missing or unrecognized values fall back to the default (Newark).
    #[must_use]
    pub fn from_url_param(param: Option<&str>) -> Self {
        param.and_then(Self::from_key).unwrap_or_default()
    }

    /// Returns all variants of this enum, in dropdown order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Newark,
            Self::Elizabeth,
            Self::Camden,
            Self::Trenton,
            Self::JerseyCity,
            Self::Paterson,
            Self::AsburyPark,
            Self::AtlanticCity,
        ]
    }
}

/// A flood projection horizon.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ScenarioYear {
    /// Current floodplain
    #[serde(rename = "2025")]
    #[strum(serialize = "2025")]
    Current,
    /// Projected 2050 floodplain
    #[serde(rename = "2050")]
    #[strum(serialize = "2050")]
    Projected,
}

impl ScenarioYear {
    /// Returns the four-digit year token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Current => "2025",
            Self::Projected => "2050",
        }
    }

    /// Returns the other scenario.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Current => Self::Projected,
            Self::Projected => Self::Current,
        }
    }

    /// Returns both scenarios in chronological order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Current, Self::Projected]
    }
}
