use std::collections::{BTreeMap, BTreeSet};

use ash_curator::data::model::AttrValue;
use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

/// Hue step between consecutive palette entries (golden angle), so that
/// neighbouring classes stay distinguishable however many there are.
const HUE_STEP: f32 = 137.508;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` distinct colours.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 * HUE_STEP) % 360.0;
            let lightness = if i % 2 == 0 { 0.55 } else { 0.45 };
            let rgb: Srgb = Hsl::new(hue, 0.7, lightness).into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: attribute value → Color32
// ---------------------------------------------------------------------------

/// Maps the values of one particle attribute to colours. Absent and
/// unspecified values are always drawn in neutral greys.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<AttrValue, Color32>,
}

impl ColorMap {
    pub fn new(values: &BTreeSet<AttrValue>) -> Self {
        let coloured: Vec<&AttrValue> = values
            .iter()
            .filter(|v| !matches!(v, AttrValue::Absent | AttrValue::Unspecified))
            .collect();
        let palette = generate_palette(coloured.len());

        let mut mapping: BTreeMap<AttrValue, Color32> = coloured
            .into_iter()
            .cloned()
            .zip(palette)
            .collect();
        if values.contains(&AttrValue::Absent) {
            mapping.insert(AttrValue::Absent, Color32::DARK_GRAY);
        }
        if values.contains(&AttrValue::Unspecified) {
            mapping.insert(AttrValue::Unspecified, Color32::GRAY);
        }

        ColorMap { mapping }
    }

    pub fn color_for(&self, value: &AttrValue) -> Color32 {
        self.mapping.get(value).copied().unwrap_or(Color32::GRAY)
    }

    /// Legend entries (value label → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.mapping
            .iter()
            .map(|(v, c)| (v.to_string(), *c))
            .collect()
    }
}
