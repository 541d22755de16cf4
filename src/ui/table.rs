use ash_curator::data::model::AttrValue;
use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;

const HEADERS: &[&str] = &[
    "id",
    "afe",
    "sample",
    "batch",
    "main type",
    "sub type",
    "color",
    "crystallinity",
    "alteration",
    "shape",
    "grain size",
    "instrument",
    "frames",
];

// ---------------------------------------------------------------------------
// Particle table (central panel)
// ---------------------------------------------------------------------------

/// Decoded particles passing the filters; clicking an id selects it for preview.
pub fn particle_table(ui: &mut Ui, state: &mut AppState) {
    let Some(batch) = &state.batch else {
        return;
    };

    let rows: Vec<(usize, Vec<String>)> = state
        .visible_indices
        .iter()
        .map(|&idx| {
            let entry = &batch.entries[idx];
            let attrs = entry.info.particle.attributes();
            let cell = |key: &str| match attrs.get(key) {
                None | Some(AttrValue::Absent) => String::new(),
                Some(value) => value.to_string(),
            };
            let p = &entry.info.particle;
            let instrument = match (p.instrument, p.index) {
                (Some(instrument), Some(index)) => format!("{instrument} #{index}"),
                _ => "multi-focus".to_string(),
            };
            (
                idx,
                vec![
                    p.id.clone(),
                    p.afe_id.clone(),
                    p.sample_id.clone(),
                    p.batch.clone(),
                    cell("main_type"),
                    cell("sub_type"),
                    cell("color"),
                    cell("crystallinity"),
                    cell("hydro_alter_degree"),
                    cell("shape"),
                    p.grain_size_label(),
                    instrument,
                    entry.frames.len().to_string(),
                ],
            )
        })
        .collect();

    let selected = state.selected;
    let mut clicked = None;

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .columns(Column::auto().at_least(40.0), HEADERS.len() - 1)
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for title in HEADERS {
                header.col(|ui: &mut Ui| {
                    ui.strong(*title);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let (idx, cells) = &rows[row.index()];
                for (i, text) in cells.iter().enumerate() {
                    row.col(|ui: &mut Ui| {
                        if i == 0 {
                            if ui
                                .selectable_label(selected == Some(*idx), RichText::new(text).monospace())
                                .clicked()
                            {
                                clicked = Some(*idx);
                            }
                        } else {
                            ui.label(text);
                        }
                    });
                }
            });
        });

    if let Some(idx) = clicked {
        state.select_particle(idx);
    }
}
