use eframe::egui::{self, RichText, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Right side panel – selected particle
// ---------------------------------------------------------------------------

/// Image and decoded record of the selected particle.
pub fn preview_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Particle");
    ui.separator();

    let Some(entry) = state.selected_entry() else {
        ui.label("Select a particle in the table.");
        return;
    };

    let frame_count = entry.frames.len();
    let frame = state.preview_frame.min(frame_count.saturating_sub(1));
    let image_path = entry.frames.get(frame).cloned();
    let record = serde_json::to_string_pretty(&entry.info.particle)
        .unwrap_or_else(|e| format!("<cannot display record: {e}>"));

    if let Some(path) = &image_path {
        ui.label(RichText::new(path.display().to_string()).small());
        ui.add(
            egui::Image::new(format!("file://{}", path.display()))
                .max_height(ui.available_width())
                .shrink_to_fit()
                .rounding(4.0),
        );
    }

    if frame_count > 1 {
        let mut frame = frame;
        ui.add(egui::Slider::new(&mut frame, 0..=frame_count - 1).text("focus frame"));
        state.preview_frame = frame;
    }

    ui.separator();
    egui::ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        ui.label(RichText::new(record).monospace());
    });
}
