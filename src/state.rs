use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use ash_curator::config::Config;
use ash_curator::data::export::export;
use ash_curator::data::filter::{filtered_indices, init_filter_state, FilterState};
use ash_curator::data::loader;
use ash_curator::data::model::{AttrValue, ContributionBatch, ParticleEntry, VolcanoId};

use crate::color::ColorMap;

/// Colour-by column used right after an import.
const DEFAULT_COLOR_COLUMN: &str = "main_type";

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: Config,

    /// Volcano identifier as typed by the contributor.
    pub volcano_input: String,

    /// Imported batch (None until the user imports images).
    pub batch: Option<ContributionBatch>,

    /// Per-attribute filter selections.
    pub filters: FilterState,

    /// Indices of particles passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Which attribute is used for colouring.
    pub color_column: Option<String>,

    /// Active colour map.
    pub color_map: Option<ColorMap>,

    /// Particle shown in the preview panel.
    pub selected: Option<usize>,

    /// Frame of the selected particle's focus stack shown in the preview.
    pub preview_frame: usize,

    /// Whether the rejected-files window is open.
    pub show_rejected: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let volcano_input = config
            .volcano
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_default();
        Self {
            config,
            volcano_input,
            batch: None,
            filters: FilterState::default(),
            visible_indices: Vec::new(),
            color_column: None,
            color_map: None,
            selected: None,
            preview_frame: 0,
            show_rejected: false,
            status_message: None,
        }
    }

    /// Volcano identifier from the form, if one was entered.
    pub fn volcano(&self) -> Option<VolcanoId> {
        let input = self.volcano_input.trim();
        (!input.is_empty()).then(|| VolcanoId::parse(input))
    }

    /// Decode the given files and folders and replace the current batch.
    pub fn import(&mut self, inputs: &[PathBuf]) {
        let Some(volcano) = self.volcano() else {
            self.status_message = Some("Enter a volcano number before importing".to_string());
            return;
        };

        match loader::import(
            inputs,
            &volcano,
            &self.config.image_extensions,
            self.config.recursive,
        ) {
            Ok(batch) => self.set_batch(batch),
            Err(e) => {
                log::error!("Failed to import images: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a newly decoded batch, initialise filters and colour.
    pub fn set_batch(&mut self, batch: ContributionBatch) {
        self.filters = init_filter_state(&batch);
        self.visible_indices = (0..batch.len()).collect();

        self.color_column = batch
            .column_names
            .iter()
            .find(|c| c.as_str() == DEFAULT_COLOR_COLUMN)
            .or_else(|| batch.column_names.first())
            .cloned();
        self.rebuild_color_map(&batch);

        self.show_rejected = !batch.rejected.is_empty();
        self.status_message = None;
        self.selected = None;
        self.preview_frame = 0;
        self.batch = Some(batch);
    }

    /// Rebuild the colour map from the current `color_column`.
    pub fn rebuild_color_map(&mut self, batch: &ContributionBatch) {
        self.color_map = self
            .color_column
            .as_ref()
            .and_then(|col| batch.unique_values.get(col))
            .map(ColorMap::new);
    }

    /// Recompute `visible_indices` after filter change.
    pub fn refilter(&mut self) {
        if let Some(batch) = &self.batch {
            self.visible_indices = filtered_indices(batch, &self.filters);
            if self
                .selected
                .is_some_and(|s| !self.visible_indices.contains(&s))
            {
                self.selected = None;
            }
        }
    }

    /// Set colour column and rebuild the map.
    pub fn set_color_column(&mut self, col: String) {
        self.color_column = Some(col);
        if let Some(batch) = self.batch.take() {
            self.rebuild_color_map(&batch);
            self.batch = Some(batch);
        }
    }

    /// Toggle a single attribute value in a column's filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &AttrValue) {
        let selected = self.filters.entry(column.to_string()).or_default();
        if !selected.remove(value) {
            selected.insert(value.clone());
        }
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) {
        let all = self
            .batch
            .as_ref()
            .and_then(|b| b.unique_values.get(column))
            .cloned();
        if let Some(all_vals) = all {
            self.filters.insert(column.to_string(), all_vals);
            self.refilter();
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.filters.insert(column.to_string(), BTreeSet::new());
        self.refilter();
    }

    pub fn select_particle(&mut self, index: usize) {
        if self.selected != Some(index) {
            self.selected = Some(index);
            self.preview_frame = 0;
        }
    }

    pub fn selected_entry(&self) -> Option<&ParticleEntry> {
        self.batch.as_ref()?.entries.get(self.selected?)
    }

    /// Write the visible particles to `path`.
    pub fn export_visible(&mut self, path: &Path) {
        let Some(batch) = &self.batch else {
            return;
        };
        let visible = batch.subset(&self.visible_indices);
        match export(&visible, path) {
            Ok(()) => {
                self.status_message = Some(format!(
                    "Exported {} particle(s) to {}",
                    visible.len(),
                    path.display()
                ));
            }
            Err(e) => {
                log::error!("Failed to export: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: &[&str] = &[
        "AB01_1_2_1_b4_5X_phi0phi1_PG.png",
        "AB01_1_2_2_m4_5X_phi1phi2_JJtrlcp.png",
        "AB01_1_2_3_m4_5X_phi1phi2_LLblmcn.png",
        "broken_name.png",
    ];

    fn imported() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        for name in NAMES {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let mut state = AppState::new(Config::default());
        state.volcano_input = "211060".to_string();
        state.import(&[dir.path().to_path_buf()]);
        (dir, state)
    }

    #[test]
    fn import_requires_a_volcano() {
        let mut state = AppState::new(Config::default());
        state.import(&[PathBuf::from("anything")]);
        assert!(state.batch.is_none());
        assert!(state.status_message.is_some());
    }

    #[test]
    fn import_decodes_folder_and_opens_rejected_window() {
        let (_dir, state) = imported();
        let batch = state.batch.as_ref().unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.rejected.len(), 1);
        assert!(state.show_rejected);
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        assert_eq!(state.color_column.as_deref(), Some("main_type"));
        assert_eq!(batch.entries[0].info.particle.volc_num, VolcanoId::Number(211060));
    }

    #[test]
    fn toggling_a_value_hides_matching_particles() {
        let (_dir, mut state) = imported();
        state.select_particle(1);
        state.toggle_filter_value("main_type", &AttrValue::Text("juvenile".into()));
        assert_eq!(state.visible_indices, vec![0, 2]);
        assert_eq!(state.selected, None);

        state.select_all("main_type");
        assert_eq!(state.visible_indices, vec![0, 1, 2]);

        state.select_none("main_type");
        assert!(state.visible_indices.is_empty());
    }

    #[test]
    fn export_writes_only_visible_particles() {
        let (dir, mut state) = imported();
        state.toggle_filter_value("main_type", &AttrValue::Text("lithic".into()));
        let out = dir.path().join("upload.json");
        state.export_visible(&out);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(json["particles"].as_array().unwrap().len(), 2);
    }
}
