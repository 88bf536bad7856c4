mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::DpgViewerApp;
use config::Settings;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let settings = Settings::load();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([settings.window_width, settings.window_height])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "DPG Viewer – Distal/Proximal Overlay",
        options,
        Box::new(move |_cc| Ok(Box::new(DpgViewerApp::new(settings)))),
    )
}
