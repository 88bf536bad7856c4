use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::export::export_merged;
use crate::data::loader::load_input;
use crate::state::{AppState, InputSlot};
use crate::ui::plot::swatch;

// ---------------------------------------------------------------------------
// Left side panel – event toggles and manual entry
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Events");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            event_toggles(ui, state);
            ui.separator();
            off_screen_notice(ui, state);
            ui.separator();
            manual_entry(ui, state);
        });
}

fn event_toggles(ui: &mut Ui, state: &mut AppState) {
    let types = match &state.session {
        Some(s) if !s.events.is_empty() => s.event_types(),
        _ => {
            ui.label("No events loaded.");
            return;
        }
    };

    ui.strong("Show");
    for ty in &types {
        let mut checked = state.toggles.get(ty).copied().unwrap_or(true);
        ui.horizontal(|ui: &mut Ui| {
            ui.label(swatch(state.event_colors.color_for(ty)));
            if ui.checkbox(&mut checked, ty.as_str()).changed() {
                state.toggle_event_type(ty);
            }
        });
    }
}

fn off_screen_notice(ui: &mut Ui, state: &AppState) {
    let view = state.view();
    if view.off_screen.is_empty() {
        return;
    }
    ui.label(RichText::new(format!("{} event(s) outside the current view:", view.off_screen.len())).italics());
    for ev in &view.off_screen {
        ui.label(format!(
            "• {}  {}–{}",
            ev.display_label,
            ev.start.format("%H:%M"),
            ev.end.format("%H:%M")
        ));
    }
}

fn manual_entry(ui: &mut Ui, state: &mut AppState) {
    egui::CollapsingHeader::new(RichText::new("Add event").strong())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("manual_entry").num_columns(2).show(ui, |ui: &mut Ui| {
                ui.label("Date");
                ui.add(DatePickerButton::new(&mut state.form.date).id_salt("manual_date"));
                ui.end_row();

                ui.label("Start (HH:MM)");
                ui.text_edit_singleline(&mut state.form.start);
                ui.end_row();

                ui.label("End (HH:MM)");
                ui.text_edit_singleline(&mut state.form.end);
                ui.end_row();

                ui.label("Type");
                ui.text_edit_singleline(&mut state.form.event_type);
                ui.end_row();

                ui.label("Notes");
                ui.text_edit_multiline(&mut state.form.notes);
                ui.end_row();
            });

            if ui.button("Add").clicked() {
                state.add_manual_event();
            }
        });

    if state.manual_events.is_empty() {
        return;
    }
    ui.strong("Entered events");
    let mut remove = None;
    for (idx, ev) in state.manual_events.iter().enumerate() {
        ui.horizontal(|ui: &mut Ui| {
            ui.label(format!(
                "{} {}–{} {}",
                ev.date,
                ev.start_time.format("%H:%M"),
                ev.end_time.format("%H:%M"),
                ev.event_type
            ));
            if ui.small_button("✕").clicked() {
                remove = Some(idx);
            }
        });
    }
    if let Some(idx) = remove {
        state.remove_manual_event(idx);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            for slot in [InputSlot::Distal, InputSlot::Proximal, InputSlot::Events] {
                if ui.button(format!("Open {}…", slot.label())).clicked() {
                    open_file_dialog(state, slot);
                    ui.close_menu();
                }
            }
            ui.separator();
            let can_export = state.session.as_ref().is_some_and(|s| !s.is_empty());
            if ui.add_enabled(can_export, egui::Button::new("Export merged CSV…")).clicked() {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label("Base date");
        let mut date = state.base_date_shown();
        if ui.add(DatePickerButton::new(&mut date).id_salt("base_date")).changed() {
            state.pin_base_date(date);
        }
        if state.base_date.is_none() {
            ui.label(RichText::new("(none)").italics().color(Color32::GRAY));
            if ui
                .small_button("Use")
                .on_hover_text("Use the date shown for bare HH:MM:SS times")
                .clicked()
            {
                state.pin_base_date(date);
            }
        }

        if ui.button("Parse & Merge").clicked() {
            state.parse_and_merge();
        }

        ui.separator();

        for (label, file) in [("D", &state.distal), ("P", &state.proximal), ("E", &state.events_file)] {
            let name = file.as_ref().map(|f| f.name.as_str()).unwrap_or("–");
            ui.label(format!("{label}: {name}"));
        }

        if let Some(session) = &state.session {
            let s = session.summary;
            ui.separator();
            ui.label(format!(
                "{} samples, {} matched, {} dropped, {} events",
                session.len(),
                s.matched,
                s.dropped_rows,
                session.events.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState, slot: InputSlot) {
    let file = rfd::FileDialog::new()
        .set_title(format!("Open {} CSV", slot.label()))
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        match load_input(&path) {
            Ok(input) => state.set_input(slot, input),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let Some(session) = &state.session else {
        return;
    };
    let file = rfd::FileDialog::new()
        .set_title("Export merged data")
        .add_filter("CSV", &["csv"])
        .set_file_name("merged.csv")
        .save_file();

    if let Some(path) = file {
        if let Err(e) = export_merged(&path, &session.merged) {
            log::error!("Failed to export: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
