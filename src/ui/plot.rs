use std::collections::BTreeMap;

use eframe::egui::{self, RichText, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot, Points};

use crate::color::{category_color, sequential_palette, RedsScale};
use crate::data::aggregate::{CountryMean, MapPoint, PollutantMean, SummaryMetrics};
use crate::data::model::AqiCategory;

/// Shown wherever a mean or maximum has no data behind it.
pub const NO_DATA: &str = "—";

pub fn format_avg(value: Option<f64>) -> String {
    value.map_or_else(|| NO_DATA.to_string(), |v| format!("{v:.1}"))
}

pub fn format_max(value: Option<i64>) -> String {
    value.map_or_else(|| NO_DATA.to_string(), |v| v.to_string())
}

// ---------------------------------------------------------------------------
// Key metrics row
// ---------------------------------------------------------------------------

pub fn metrics_row(ui: &mut Ui, summary: &SummaryMetrics) {
    let metrics = [
        ("Total Cities", summary.total_count.to_string()),
        ("Avg AQI", format_avg(summary.avg_aqi)),
        ("Max AQI", format_max(summary.max_aqi)),
        ("Countries", summary.distinct_country_count.to_string()),
    ];

    ui.columns(metrics.len(), |columns| {
        for (ui, (label, value)) in columns.iter_mut().zip(metrics) {
            ui.group(|ui: &mut Ui| {
                ui.label(RichText::new(label).weak());
                ui.heading(value);
            });
        }
    });
}

// ---------------------------------------------------------------------------
// Geospatial scatter
// ---------------------------------------------------------------------------

/// Marker radius grows with AQI, in five steps.
fn radius_bucket(aqi: Option<i64>) -> u8 {
    aqi.map_or(0, |v| (v.max(0) / 100).min(4) as u8)
}

/// Render the map: longitude on x, latitude on y, one series per category
/// and size step.
pub fn map_plot(ui: &mut Ui, points: &[MapPoint]) {
    let mut series: BTreeMap<(Option<AqiCategory>, u8), Vec<[f64; 2]>> = BTreeMap::new();
    for p in points {
        series
            .entry((p.category, radius_bucket(p.aqi_value)))
            .or_default()
            .push([p.longitude, p.latitude]);
    }

    Plot::new("aqi_map")
        .height(480.0)
        .data_aspect(1.0)
        .include_x(-180.0)
        .include_x(180.0)
        .include_y(-90.0)
        .include_y(90.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .legend(Legend::default())
        .show(ui, |plot_ui| {
            for ((category, bucket), coords) in series {
                let name = category.map_or("Unknown", AqiCategory::label);
                plot_ui.points(
                    Points::new(coords)
                        .name(name)
                        .color(category_color(category))
                        .radius(2.0 + f32::from(bucket) * 1.5),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Average AQI by country
// ---------------------------------------------------------------------------

pub fn ranking_chart(ui: &mut Ui, ranking: &[CountryMean]) {
    let scale = RedsScale::new(ranking.iter().map(|c| c.mean_aqi));
    let bars: Vec<Bar> = ranking
        .iter()
        .enumerate()
        .map(|(i, c)| {
            Bar::new(i as f64, c.mean_aqi)
                .name(&c.country)
                .fill(scale.color_for(c.mean_aqi))
        })
        .collect();

    Plot::new("country_ranking")
        .height(320.0)
        .y_axis_label("AQI Value")
        .show_x(false)
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| plot_ui.bar_chart(BarChart::new(bars)));

    egui::Grid::new("country_ranking_table")
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            for c in ranking {
                ui.label(c.country.as_str());
                ui.label(format!("{:.1}", c.mean_aqi));
                ui.end_row();
            }
        });
}

// ---------------------------------------------------------------------------
// Pollutant composition
// ---------------------------------------------------------------------------

/// Share of each mean in the total of present means.
pub fn shares(composition: &[PollutantMean]) -> Vec<Option<f64>> {
    let total: f64 = composition.iter().filter_map(|p| p.mean).sum();
    composition
        .iter()
        .map(|p| p.mean.filter(|_| total > 0.0).map(|m| m / total))
        .collect()
}

pub fn pollutant_chart(ui: &mut Ui, composition: &[PollutantMean]) {
    let palette = sequential_palette(composition.len());
    let bars: Vec<Bar> = composition
        .iter()
        .zip(&palette)
        .enumerate()
        .filter_map(|(i, (p, color))| {
            let mean = p.mean?;
            Some(
                Bar::new(i as f64, mean)
                    .name(p.pollutant)
                    .fill(*color),
            )
        })
        .collect();

    Plot::new("pollutant_composition")
        .height(320.0)
        .show_y(false)
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| plot_ui.bar_chart(BarChart::new(bars).horizontal()));

    egui::Grid::new("pollutant_table")
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            for ((p, share), color) in composition.iter().zip(shares(composition)).zip(&palette) {
                ui.label(RichText::new(p.pollutant.to_string()).color(*color));
                ui.label(format_avg(p.mean));
                ui.label(share.map_or_else(
                    || NO_DATA.to_string(),
                    |s| format!("{:.1}%", s * 100.0),
                ));
                ui.end_row();
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Pollutant;

    #[test]
    fn sentinels_render_as_no_data() {
        assert_eq!(format_avg(None), NO_DATA);
        assert_eq!(format_max(None), NO_DATA);
        assert_eq!(format_avg(Some(20.0)), "20.0");
        assert_eq!(format_avg(Some(57.26)), "57.3");
        assert_eq!(format_max(Some(310)), "310");
    }

    #[test]
    fn radius_steps_are_capped() {
        assert_eq!(radius_bucket(None), 0);
        assert_eq!(radius_bucket(Some(42)), 0);
        assert_eq!(radius_bucket(Some(180)), 1);
        assert_eq!(radius_bucket(Some(999)), 4);
    }

    #[test]
    fn shares_ignore_missing_means() {
        let composition = vec![
            PollutantMean { pollutant: Pollutant::Pm25, mean: Some(75.0) },
            PollutantMean { pollutant: Pollutant::Ozone, mean: Some(25.0) },
            PollutantMean { pollutant: Pollutant::No2, mean: None },
        ];
        assert_eq!(shares(&composition), vec![Some(0.75), Some(0.25), None]);
    }

    #[test]
    fn shares_of_nothing_are_missing() {
        let composition = vec![PollutantMean { pollutant: Pollutant::Co, mean: None }];
        assert_eq!(shares(&composition), vec![None]);
    }
}
