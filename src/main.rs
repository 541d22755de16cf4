mod app;
mod color;
mod state;
mod ui;

use app::AshCuratorApp;
use ash_curator::config::Config;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = Config::load();
    log::info!("Starting with {config:?}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Ash Curator – Particle Contribution",
        options,
        Box::new(|cc| {
            // Install image loaders so the preview can show png/jpg/tiff files.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(AshCuratorApp::new(config)))
        }),
    )
}
