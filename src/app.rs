use eframe::egui;

use crate::config::Settings;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DpgViewerApp {
    pub state: AppState,
}

impl DpgViewerApp {
    pub fn new(settings: Settings) -> Self {
        Self {
            state: AppState::new(settings),
        }
    }
}

impl eframe::App for DpgViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: files, base date, parse & merge ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: event toggles and manual entry ----
        egui::SidePanel::left("event_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: overlay plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            let domain = plot::overlay_plot(ui, &self.state);
            if domain.is_some() {
                self.state.domain = domain;
            }
        });
    }
}
