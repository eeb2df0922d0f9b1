use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::Record;

use super::plot::NO_DATA;

const COLUMNS: [&str; 11] = [
    "Country",
    "City",
    "AQI Value",
    "AQI Category",
    "PM2.5",
    "CO",
    "Ozone",
    "NO2",
    "lat",
    "lng",
    "Hemisphere",
];

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| NO_DATA.to_string(), |v| v.to_string())
}

/// Cell texts for one record, in `COLUMNS` order.
fn row_cells(r: &Record) -> [String; 11] {
    [
        r.country.clone(),
        r.city.clone(),
        opt(r.aqi_value),
        opt(r.category),
        opt(r.pm25_aqi_value),
        opt(r.co_aqi_value),
        opt(r.ozone_aqi_value),
        opt(r.no2_aqi_value),
        format!("{:.4}", r.latitude),
        format!("{:.4}", r.longitude),
        r.hemisphere.to_string(),
    ]
}

// ---------------------------------------------------------------------------
// Raw filtered rows
// ---------------------------------------------------------------------------

/// `rows` are positions into `records`, as kept by the app state.
pub fn raw_table(ui: &mut Ui, records: &[Record], rows: &[usize]) {
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .columns(Column::auto().at_least(60.0), COLUMNS.len())
        .max_scroll_height(360.0)
        .header(20.0, |mut header| {
            for title in COLUMNS {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let cells = row_cells(&records[rows[row.index()]]);
                for cell in cells {
                    row.col(|ui: &mut Ui| {
                        ui.label(cell);
                    });
                }
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;
    use crate::data::model::AqiCategory;

    #[test]
    fn missing_values_show_placeholder() {
        let mut r = record("Peru", 40, AqiCategory::Good);
        r.aqi_value = None;
        r.pm25_aqi_value = Some(12.5);
        let cells = row_cells(&r);
        assert_eq!(cells[0], "Peru");
        assert_eq!(cells[2], NO_DATA);
        assert_eq!(cells[3], "Good");
        assert_eq!(cells[4], "12.5");
        assert_eq!(cells[5], NO_DATA);
        assert_eq!(cells[10], "Northern");
    }
}
