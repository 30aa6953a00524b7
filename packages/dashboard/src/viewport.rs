//! Viewport fit options for framing a municipality.

use flood_map_asset_models::Municipality;
use flood_map_map_models::{FitOptions, Padding};
use serde::{Deserialize, Serialize};

/// Widest viewport still laid out as mobile.
pub const MOBILE_MAX_WIDTH: f64 = 768.0;

/// Share of the viewport height the bottom sheet covers on mobile.
const MOBILE_SHEET_SHARE: f64 = 0.55;

const FIT_DURATION_MS: u32 = 2000;

/// The screen the map is drawn on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "camelCase")]
pub enum Viewport {
    /// Sidebars on both sides of the map.
    #[default]
    Desktop,
    /// Header on top and a bottom sheet.
    Mobile {
        /// Viewport height in pixels.
        height: f64,
    },
}

impl Viewport {
    /// Classifies a viewport by its pixel dimensions.
    #[must_use]
    pub fn from_dimensions(width: f64, height: f64) -> Self {
        if width <= MOBILE_MAX_WIDTH {
            Self::Mobile { height }
        } else {
            Self::Desktop
        }
    }
}

/// Fit options that keep a municipality clear of the surrounding panels.
#[must_use]
pub fn fit_options(municipality: Municipality, viewport: Viewport) -> FitOptions {
    let (padding, offset, max_zoom) = match viewport {
        Viewport::Mobile { height } => (
            Padding {
                top: 80.0,
                bottom: height * MOBILE_SHEET_SHARE,
                left: 20.0,
                right: 20.0,
            },
            [0.0, 0.0],
            12.0,
        ),
        Viewport::Desktop => {
            let tight = municipality.is_tight();
            let vertical = if tight { 10.0 } else { 20.0 };
            (
                Padding {
                    top: vertical,
                    bottom: vertical,
                    left: 320.0,
                    right: if tight { 340.0 } else { 360.0 },
                },
                [if tight { -40.0 } else { -60.0 }, 0.0],
                18.0,
            )
        }
    };

    FitOptions {
        padding,
        offset,
        duration_ms: FIT_DURATION_MS,
        linear: false,
        max_zoom,
        essential: true,
    }
}
