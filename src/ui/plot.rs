use std::collections::BTreeMap;

use ash_curator::data::model::AttrValue;
use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Class count chart (bottom panel)
// ---------------------------------------------------------------------------

/// Bar chart of visible particles per value of the colour-by attribute.
pub fn class_chart(ui: &mut Ui, state: &AppState) {
    let (Some(batch), Some(col)) = (&state.batch, state.color_column.as_deref()) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Import particle images to start  (File → Import…)");
        });
        return;
    };

    let mut counts: BTreeMap<AttrValue, usize> = BTreeMap::new();
    for &idx in &state.visible_indices {
        let attrs = batch.entries[idx].info.particle.attributes();
        let value = attrs.get(col).cloned().unwrap_or(AttrValue::Absent);
        *counts.entry(value).or_default() += 1;
    }

    Plot::new("class_chart")
        .legend(Legend::default())
        .x_axis_label(col)
        .y_axis_label("Particles")
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show_x(false)
        .show(ui, |plot_ui| {
            for (i, (value, count)) in counts.iter().enumerate() {
                let color = state
                    .color_map
                    .as_ref()
                    .map(|cm| cm.color_for(value))
                    .unwrap_or(Color32::LIGHT_BLUE);
                let bar = Bar::new(i as f64, *count as f64)
                    .width(0.7)
                    .fill(color);
                let chart = BarChart::new(vec![bar])
                    .name(value.to_string())
                    .color(color);
                plot_ui.bar_chart(chart);
            }
        });
}
