use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::AqiCategory;

fn hsl_to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Category colours (map markers, legend, filter labels)
// ---------------------------------------------------------------------------

pub fn category_color(category: Option<AqiCategory>) -> Color32 {
    match category {
        Some(AqiCategory::Good) => Color32::from_rgb(0, 128, 0),
        Some(AqiCategory::Moderate) => Color32::from_rgb(230, 200, 0),
        Some(AqiCategory::UnhealthyForSensitive) => Color32::from_rgb(255, 140, 0),
        Some(AqiCategory::Unhealthy) => Color32::from_rgb(255, 165, 0),
        Some(AqiCategory::VeryUnhealthy) => Color32::from_rgb(220, 0, 0),
        Some(AqiCategory::Hazardous) => Color32::from_rgb(128, 0, 128),
        None => Color32::GRAY,
    }
}

// ---------------------------------------------------------------------------
// Sequential palette (pollutant composition)
// ---------------------------------------------------------------------------

/// `n` colours sweeping from deep purple to yellow, viridis-like.
pub fn sequential_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let t = if n == 1 { 0.0 } else { i as f32 / (n - 1) as f32 };
            let hue = 275.0 - t * 215.0;
            let lightness = 0.30 + t * 0.30;
            hsl_to_color32(Hsl::new(hue, 0.70, lightness))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Continuous "Reds" scale (country ranking)
// ---------------------------------------------------------------------------

/// Maps a value range onto light → dark red.
#[derive(Debug, Clone, Copy)]
pub struct RedsScale {
    min: f64,
    max: f64,
}

impl RedsScale {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        let (min, max) = values
            .into_iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        RedsScale { min, max }
    }

    pub fn color_for(&self, value: f64) -> Color32 {
        let range = self.max - self.min;
        let t = if range.is_finite() && range > f64::EPSILON {
            ((value - self.min) / range).clamp(0.0, 1.0)
        } else {
            1.0
        };
        hsl_to_color32(Hsl::new(0.0, 0.85, 0.88 - 0.58 * t as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brightness(c: Color32) -> u32 {
        c.r() as u32 + c.g() as u32 + c.b() as u32
    }

    #[test]
    fn categories_have_distinct_colours() {
        let mut colours: Vec<_> = AqiCategory::ALL
            .into_iter()
            .map(|c| category_color(Some(c)))
            .collect();
        colours.dedup();
        assert_eq!(colours.len(), 6);
        assert_eq!(category_color(None), Color32::GRAY);
    }

    #[test]
    fn palette_has_requested_length() {
        assert!(sequential_palette(0).is_empty());
        assert_eq!(sequential_palette(1).len(), 1);
        assert_eq!(sequential_palette(4).len(), 4);
    }

    #[test]
    fn reds_get_darker_with_value() {
        let scale = RedsScale::new([10.0, 50.0, 90.0]);
        assert!(brightness(scale.color_for(10.0)) > brightness(scale.color_for(50.0)));
        assert!(brightness(scale.color_for(50.0)) > brightness(scale.color_for(90.0)));
    }

    #[test]
    fn flat_range_uses_darkest_red() {
        let scale = RedsScale::new([42.0]);
        assert_eq!(scale.color_for(42.0), RedsScale::new([0.0, 1.0]).color_for(1.0));
    }
}
