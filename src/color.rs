use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

/// Series colours for the sensor traces.
pub const DISTAL_COLOR: Color32 = Color32::from_rgb(230, 120, 40);
pub const PROXIMAL_COLOR: Color32 = Color32::from_rgb(60, 130, 220);
pub const DPG_COLOR: Color32 = Color32::from_rgb(80, 180, 90);

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.6);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Event type → Color32
// ---------------------------------------------------------------------------

/// Maps event types to distinct colours, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct EventColors {
    mapping: BTreeMap<String, Color32>,
}

impl EventColors {
    pub fn new(types: &[String]) -> Self {
        let palette = generate_palette(types.len());
        let mapping = types.iter().cloned().zip(palette).collect();
        EventColors { mapping }
    }

    pub fn color_for(&self, event_type: &str) -> Color32 {
        self.mapping.get(event_type).copied().unwrap_or(Color32::GRAY)
    }

    /// Same colour, translucent, for shading an interval.
    pub fn fill_for(&self, event_type: &str) -> Color32 {
        let c = self.color_for(event_type);
        Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), 40)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_distinct() {
        let p = generate_palette(4);
        assert_eq!(p.len(), 4);
        assert_ne!(p[0], p[1]);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn test_unknown_type_is_gray() {
        let colors = EventColors::new(&["Meal".to_string(), "Sleep".to_string()]);
        assert_ne!(colors.color_for("Meal"), colors.color_for("Sleep"));
        assert_eq!(colors.color_for("Walk"), Color32::GRAY);
    }
}
