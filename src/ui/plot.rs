use chrono::DateTime;
use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoint, PlotPoints, Polygon};

use crate::color::{DISTAL_COLOR, DPG_COLOR, PROXIMAL_COLOR};
use crate::data::filter::TimeDomain;
use crate::data::model::{Field, Instant, MergedSample};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Axis conversion: plot x is seconds since the Unix epoch
// ---------------------------------------------------------------------------

pub fn instant_to_x(ts: Instant) -> f64 {
    ts.timestamp_millis() as f64 / 1000.0
}

pub fn x_to_instant(x: f64) -> Option<Instant> {
    DateTime::from_timestamp_millis((x * 1000.0).round() as i64)
}

fn format_clock(x: f64) -> String {
    x_to_instant(x)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

fn series<F>(samples: &[MergedSample], value: F) -> Vec<[f64; 2]>
where
    F: Fn(&MergedSample) -> Option<f64>,
{
    samples
        .iter()
        .filter_map(|s| value(s).map(|v| [instant_to_x(s.timestamp), v]))
        .collect()
}

// ---------------------------------------------------------------------------
// Overlay plot (central panel)
// ---------------------------------------------------------------------------

/// Render skin temperatures, DPG and the visible events. Returns the time
/// domain currently on screen.
pub fn overlay_plot(ui: &mut Ui, state: &AppState) -> Option<TimeDomain> {
    let session = match &state.session {
        Some(s) if !s.is_empty() => s,
        _ => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open distal and proximal files, then Parse & Merge");
            });
            return None;
        }
    };

    let distal = series(&session.merged, |s| s.distal[Field::SkinTemp]);
    let proximal = series(&session.merged, |s| s.proximal[Field::SkinTemp]);
    let dpg = series(&session.merged, |s| s.differential);

    // Event shading spans the data's y range.
    let (y_lo, y_hi) = distal
        .iter()
        .chain(&proximal)
        .chain(&dpg)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p[1]), hi.max(p[1]))
        });
    let (y_lo, y_hi) = if y_lo.is_finite() { (y_lo - 1.0, y_hi + 1.0) } else { (0.0, 1.0) };

    let view = state.view();
    let colors = &state.event_colors;

    let response = Plot::new("overlay_plot")
        .legend(Legend::default())
        .x_axis_label("Time")
        .y_axis_label("Temperature (°C)")
        .x_axis_formatter(|mark, _range| format_clock(mark.value))
        .label_formatter(|name, value: &PlotPoint| {
            format!("{name}\n{}  {:.2}", format_clock(value.x), value.y)
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for ev in &view.visible {
                let (x0, x1) = (instant_to_x(ev.start), instant_to_x(ev.end));
                let rect: PlotPoints = vec![[x0, y_lo], [x1, y_lo], [x1, y_hi], [x0, y_hi]].into();
                plot_ui.polygon(
                    Polygon::new(rect)
                        .name(&ev.display_label)
                        .fill_color(colors.fill_for(&ev.event_type)),
                );
            }

            plot_ui.line(Line::new(PlotPoints::from(distal)).name("Distal skin").color(DISTAL_COLOR).width(1.5));
            plot_ui.line(
                Line::new(PlotPoints::from(proximal))
                    .name("Proximal skin")
                    .color(PROXIMAL_COLOR)
                    .width(1.5),
            );
            plot_ui.line(Line::new(PlotPoints::from(dpg)).name("DPG").color(DPG_COLOR).width(2.0));

            plot_ui.plot_bounds()
        });

    let bounds = response.inner;
    Some(TimeDomain {
        min: x_to_instant(bounds.min()[0])?,
        max: x_to_instant(bounds.max()[0])?,
    })
}

/// Colour swatch text for an event type, used by the side panel.
pub fn swatch(color: Color32) -> eframe::egui::RichText {
    eframe::egui::RichText::new("■").color(color)
}
