use crate::vitrage::hit_test::HotspotSize;
use crate::vitrage::layout::{LayoutParams, Viewport};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LayoutSettings {
    /// Frame and mullion thickness in pixels.
    #[serde(default = "default_profile_width")]
    pub profile_width: f64,
    /// Real-world size, in millimetres, of a row or column with no explicit
    /// dimension.
    #[serde(default = "default_cell_size")]
    pub default_cell_size: f64,
    #[serde(default = "default_min_cell_pixels")]
    pub min_cell_pixels: f64,
    #[serde(default)]
    pub hotspot: HotspotSize,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,
    /// When enabled the logger is initialised at debug level.
    #[serde(default)]
    pub debug_logging: bool,
}

fn default_profile_width() -> f64 {
    10.0
}

fn default_cell_size() -> f64 {
    100.0
}

fn default_min_cell_pixels() -> f64 {
    4.0
}

fn default_viewport_width() -> f64 {
    800.0
}

fn default_viewport_height() -> f64 {
    600.0
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            profile_width: default_profile_width(),
            default_cell_size: default_cell_size(),
            min_cell_pixels: default_min_cell_pixels(),
            hotspot: HotspotSize::default(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            debug_logging: false,
        }
    }
}

impl LayoutSettings {
    pub fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            default_cell_size: self.default_cell_size,
            min_cell_pixels: self.min_cell_pixels,
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::sized(self.viewport_width, self.viewport_height)
    }

    /// Replace non-finite or out-of-range values with their defaults. Returns
    /// `true` when anything changed.
    pub fn sanitize(&mut self) -> bool {
        let mut changed = false;
        changed |= reset_unless(&mut self.profile_width, default_profile_width(), |v| v >= 0.0);
        changed |= reset_unless(&mut self.default_cell_size, default_cell_size(), |v| v > 0.0);
        changed |= reset_unless(&mut self.min_cell_pixels, default_min_cell_pixels(), |v| {
            v >= 0.0
        });
        changed |= reset_unless(&mut self.viewport_width, default_viewport_width(), |v| v > 0.0);
        changed |= reset_unless(&mut self.viewport_height, default_viewport_height(), |v| {
            v > 0.0
        });

        let hotspot_default = HotspotSize::default();
        changed |= reset_unless(&mut self.hotspot.width, hotspot_default.width, |v| v > 0.0);
        changed |= reset_unless(&mut self.hotspot.height, hotspot_default.height, |v| v > 0.0);
        changed |= reset_unless(&mut self.hotspot.gap, hotspot_default.gap, |v| v >= 0.0);

        if changed {
            tracing::warn!("layout settings contained invalid values and were reset to defaults");
        }
        changed
    }
}

fn reset_unless(value: &mut f64, fallback: f64, valid: impl Fn(f64) -> bool) -> bool {
    if value.is_finite() && valid(*value) {
        return false;
    }
    *value = fallback;
    true
}
