use ash_curator::config::Config;
use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot, preview, table};

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

pub struct AshCuratorApp {
    pub state: AppState,
}

impl AshCuratorApp {
    pub fn new(config: Config) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for AshCuratorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Menu and volcano field
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // Filters
        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // Selected particle
        if self.state.selected.is_some() {
            egui::SidePanel::right("preview_panel")
                .default_width(320.0)
                .resizable(true)
                .show(ctx, |ui| {
                    preview::preview_panel(ui, &mut self.state);
                });
        }

        // Counts per class
        egui::TopBottomPanel::bottom("class_chart")
            .default_height(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                plot::class_chart(ui, &self.state);
            });

        // Particle table
        egui::CentralPanel::default().show(ctx, |ui| {
            table::particle_table(ui, &mut self.state);
        });

        panels::rejected_window(ctx, &mut self.state);
    }
}
