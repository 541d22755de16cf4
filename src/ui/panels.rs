use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Attribute filters and colour legend
// ---------------------------------------------------------------------------

/// Colour-by selector, legend and one checkbox group per particle attribute.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let batch = match &state.batch {
        Some(batch) => batch,
        None => {
            ui.label("No particles imported.");
            return;
        }
    };

    // Snapshot so the checkboxes can toggle state.
    let columns = batch.column_names.clone();
    let unique = batch.unique_values.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Color by");
            let current_color_col = state.color_column.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("color_by")
                .selected_text(&current_color_col)
                .show_ui(ui, |ui: &mut Ui| {
                    for col in &columns {
                        if ui
                            .selectable_label(current_color_col == *col, col)
                            .clicked()
                        {
                            state.set_color_column(col.clone());
                        }
                    }
                });
            if let Some(cm) = &state.color_map {
                for (label, color) in cm.legend_entries() {
                    ui.label(RichText::new(format!("■ {label}")).color(color));
                }
            }
            ui.separator();

            for col in &columns {
                let Some(all_values) = unique.get(col) else {
                    continue;
                };

                let n_selected = state.filters.get(col).map_or(0, |s| s.len());
                let header_text = format!("{col}  ({n_selected}/{})", all_values.len());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col)
                    .default_open(col == "main_type")
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(col);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(col);
                            }
                        });

                        for val in all_values {
                            let mut text = RichText::new(val.to_string());
                            if state.color_column.as_deref() == Some(col.as_str()) {
                                if let Some(cm) = &state.color_map {
                                    text = text.color(cm.color_for(val));
                                }
                            }

                            let mut checked = state
                                .filters
                                .get(col)
                                .is_some_and(|selected| selected.contains(val));
                            if ui.checkbox(&mut checked, text).changed() {
                                state.toggle_filter_value(col, val);
                            }
                        }
                    });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Import/export menu, volcano field and batch counts.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Import images…").clicked() {
                import_files_dialog(state);
                ui.close_menu();
            }
            if ui.button("Import folder…").clicked() {
                import_folder_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            let can_export = state.batch.as_ref().is_some_and(|b| !b.is_empty());
            if ui
                .add_enabled(can_export, egui::Button::new("Export visible…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label("Volcano");
        ui.add(
            egui::TextEdit::singleline(&mut state.volcano_input)
                .hint_text("volcano number")
                .desired_width(110.0),
        );

        ui.separator();

        if let Some(batch) = &state.batch {
            ui.label(format!(
                "{} particles decoded, {} visible",
                batch.len(),
                state.visible_indices.len()
            ));
            if !batch.rejected.is_empty()
                && ui
                    .link(format!("{} rejected", batch.rejected.len()))
                    .clicked()
            {
                state.show_rejected = true;
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            let color = if msg.starts_with("Error") || msg.starts_with("Enter") {
                Color32::RED
            } else {
                Color32::LIGHT_GREEN
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// Rejected files
// ---------------------------------------------------------------------------

/// List every file whose name could not be decoded.
pub fn rejected_window(ctx: &egui::Context, state: &mut AppState) {
    let Some(batch) = &state.batch else {
        return;
    };
    if batch.rejected.is_empty() {
        return;
    }

    egui::Window::new("Malformed file names")
        .open(&mut state.show_rejected)
        .default_width(520.0)
        .show(ctx, |ui: &mut Ui| {
            ui.label("These files do not follow the particle naming convention and were skipped:");
            ui.separator();
            ScrollArea::vertical().max_height(300.0).show(ui, |ui: &mut Ui| {
                for rejected in &batch.rejected {
                    ui.label(RichText::new(rejected.path.display().to_string()).strong());
                    ui.label(RichText::new(rejected.reason.to_string()).color(Color32::RED));
                    ui.add_space(4.0);
                }
            });
        });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn image_dialog(state: &AppState, title: &str) -> rfd::FileDialog {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Particle images", state.config.image_extensions.as_slice())
}

pub fn import_files_dialog(state: &mut AppState) {
    if let Some(files) = image_dialog(state, "Import particle images").pick_files() {
        state.import(&files);
    }
}

pub fn import_folder_dialog(state: &mut AppState) {
    if let Some(folder) = image_dialog(state, "Import particle folder").pick_folder() {
        state.import(&[folder]);
    }
}

pub fn export_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export visible particles")
        .set_file_name("particles.json")
        .add_filter("Upload payload (JSON)", &["json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .save_file();

    if let Some(path) = file {
        state.export_visible(&path);
    }
}
