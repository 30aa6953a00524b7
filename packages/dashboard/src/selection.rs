//! Selection state and the layer instructions derived from it.
//!
//! [`SelectionState`] is only mutated through its operations. Each
//! operation returns `None` when the input changes nothing (so the caller
//! emits nothing) and otherwise the batch the map engine must apply.

use std::collections::BTreeSet;

use flood_map_asset_models::{AssetType, Municipality, ScenarioYear};
use flood_map_map_models::{
    ASSET_PROPERTY, BLUE_ACRES_MUN_PROPERTY, FilterExpr, Instruction, LayerId, MUN_PROPERTY,
    Visibility,
};
use serde::Serialize;

/// What the user currently has selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    municipality: Municipality,
    show_2025: bool,
    show_2050: bool,
    hidden_asset_types: BTreeSet<AssetType>,
    overlay: bool,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new(Municipality::default())
    }
}

impl SelectionState {
    /// Creates the initial selection: the 2025 floodplain shown, no asset
    /// types hidden, Blue Acres off.
    #[must_use]
    pub const fn new(municipality: Municipality) -> Self {
        Self {
            municipality,
            show_2025: true,
            show_2050: false,
            hidden_asset_types: BTreeSet::new(),
            overlay: false,
        }
    }

    /// The active municipality.
    #[must_use]
    pub const fn municipality(&self) -> Municipality {
        self.municipality
    }

    /// The scenario whose assets are shown. 2050 takes precedence.
    #[must_use]
    pub const fn active_year(&self) -> ScenarioYear {
        if self.show_2050 {
            ScenarioYear::Projected
        } else {
            ScenarioYear::Current
        }
    }

    /// Whether a scenario's floodplain toggle is on.
    #[must_use]
    pub const fn shows(&self, year: ScenarioYear) -> bool {
        match year {
            ScenarioYear::Current => self.show_2025,
            ScenarioYear::Projected => self.show_2050,
        }
    }

    /// Asset types the user has hidden.
    #[must_use]
    pub const fn hidden_asset_types(&self) -> &BTreeSet<AssetType> {
        &self.hidden_asset_types
    }

    /// Whether an asset type is hidden.
    #[must_use]
    pub fn is_hidden(&self, asset: AssetType) -> bool {
        self.hidden_asset_types.contains(&asset)
    }

    /// Whether the Blue Acres overlay is on.
    #[must_use]
    pub const fn overlay(&self) -> bool {
        self.overlay
    }

    /// Whether the active asset layer is visible. Never true together with
    /// [`Self::overlay_visible`].
    #[must_use]
    pub const fn asset_layer_visible(&self) -> bool {
        !self.overlay
    }

    /// Whether the Blue Acres layers are visible.
    #[must_use]
    pub const fn overlay_visible(&self) -> bool {
        self.overlay
    }

    /// Switches to another municipality and returns the full re-derived
    /// batch. Selecting the active municipality again re-derives as well.
    pub fn set_active_municipality(&mut self, municipality: Municipality) -> Vec<Instruction> {
        self.municipality = municipality;
        let mut batch = self.instructions();
        if self.overlay {
            batch.extend(self.highlight_instructions());
        }
        batch
    }

    /// Flips a scenario's floodplain toggle and returns the full
    /// re-derived batch.
    pub fn toggle_scenario(&mut self, year: ScenarioYear) -> Vec<Instruction> {
        match year {
            ScenarioYear::Current => self.show_2025 = !self.show_2025,
            ScenarioYear::Projected => self.show_2050 = !self.show_2050,
        }
        self.instructions()
    }

    /// Shows or hides an asset type and returns the updated filter for the
    /// active asset layer only.
    pub fn toggle_asset_type(&mut self, asset: AssetType) -> Vec<Instruction> {
        if !self.hidden_asset_types.remove(&asset) {
            self.hidden_asset_types.insert(asset);
        }
        vec![Instruction::SetFilter {
            layer: LayerId::assets(self.active_year()),
            filter: self.asset_filter(),
        }]
    }

    /// Flips the Blue Acres overlay and returns asset and overlay
    /// visibility as one batch.
    pub fn toggle_overlay(&mut self) -> Vec<Instruction> {
        self.overlay = !self.overlay;
        let mut batch = self.layer_visibility();
        if self.overlay {
            batch.extend(self.highlight_instructions());
        }
        batch
    }

    /// Filter selecting features of the active municipality.
    #[must_use]
    pub fn municipality_filter(&self) -> FilterExpr {
        FilterExpr::equals(MUN_PROPERTY, self.municipality.key())
    }

    /// Filter for the active asset layer: the active municipality minus
    /// every hidden asset type.
    #[must_use]
    pub fn asset_filter(&self) -> FilterExpr {
        let mut conditions = Vec::with_capacity(self.hidden_asset_types.len() + 1);
        conditions.push(self.municipality_filter());
        conditions.extend(
            self.hidden_asset_types
                .iter()
                .map(|asset| FilterExpr::not_equals(ASSET_PROPERTY, asset.to_string())),
        );
        FilterExpr::All(conditions)
    }

    /// Derives the complete set of visibility and filter instructions for
    /// the current selection.
    #[must_use]
    pub fn instructions(&self) -> Vec<Instruction> {
        let mut batch = self.layer_visibility();

        for year in ScenarioYear::all() {
            batch.push(Instruction::SetVisibility {
                layer: LayerId::floodplain(*year),
                visibility: Visibility::from_bool(self.shows(*year)),
            });
        }

        batch.push(Instruction::SetFilter {
            layer: LayerId::Boundary,
            filter: self.municipality_filter(),
        });
        for year in ScenarioYear::all() {
            batch.push(Instruction::SetFilter {
                layer: LayerId::floodplain(*year),
                filter: self.municipality_filter(),
            });
        }
        batch.push(Instruction::SetFilter {
            layer: LayerId::assets(self.active_year()),
            filter: self.asset_filter(),
        });

        batch
    }

    /// Visibility of both asset layers and every Blue Acres layer.
    fn layer_visibility(&self) -> Vec<Instruction> {
        let active = self.active_year();
        let mut batch: Vec<Instruction> = ScenarioYear::all()
            .iter()
            .map(|year| Instruction::SetVisibility {
                layer: LayerId::assets(*year),
                visibility: Visibility::from_bool(*year == active && self.asset_layer_visible()),
            })
            .collect();
        batch.extend(LayerId::BLUE_ACRES.iter().map(|layer| Instruction::SetVisibility {
            layer: *layer,
            visibility: Visibility::from_bool(self.overlay_visible()),
        }));
        batch
    }

    /// Emphasis for the active municipality's Blue Acres parcels.
    fn highlight_instructions(&self) -> Vec<Instruction> {
        let filter = blue_acres_highlight(self.municipality);
        [LayerId::BlueAcresFill, LayerId::BlueAcresOutline]
            .into_iter()
            .map(|layer| Instruction::SetHighlight {
                layer,
                filter: filter.clone(),
            })
            .collect()
    }
}

/// Expression matching the Blue Acres parcels of a municipality, or
/// nothing when it has none.
#[must_use]
pub fn blue_acres_highlight(municipality: Municipality) -> FilterExpr {
    municipality.blue_acres_name().map_or(FilterExpr::Literal(false), |name| {
        FilterExpr::equals(BLUE_ACRES_MUN_PROPERTY, name)
    })
}
