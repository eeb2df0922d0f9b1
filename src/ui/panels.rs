use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::color::category_color;
use crate::data::model::AqiCategory;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Options");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            if ui.button("Show everything").clicked() {
                state.select_everything();
            }
            ui.separator();
            category_filter(ui, state);
            ui.separator();
            country_filter(ui, state);
        });
}

fn category_filter(ui: &mut Ui, state: &mut AppState) {
    let header_text = format!(
        "AQI Categories  ({}/{})",
        state.selection.categories.len(),
        AqiCategory::ALL.len()
    );

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt("categories")
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all_categories();
                }
                if ui.small_button("None").clicked() {
                    state.select_no_categories();
                }
            });

            for category in AqiCategory::ALL {
                let mut checked = state.selection.categories.contains(&category);
                let text = RichText::new(category.label()).color(category_color(Some(category)));
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_category(category);
                }
            }
        });
}

fn country_filter(ui: &mut Ui, state: &mut AppState) {
    let header_text = format!(
        "Countries  ({}/{})",
        state.selection.countries.len(),
        state.countries.len()
    );

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt("countries")
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.add(
                egui::TextEdit::singleline(&mut state.country_search).hint_text("Search…"),
            );
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all_countries();
                }
                if ui.small_button("None").clicked() {
                    state.select_no_countries();
                }
            });

            // Collect toggles first; the list borrows `state`.
            let mut toggled = Vec::new();
            for country in state.visible_countries() {
                let mut checked = state.selection.countries.contains(country);
                if ui.checkbox(&mut checked, country).changed() {
                    toggled.push(country.to_string());
                }
            }
            for country in toggled {
                state.toggle_country(&country);
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.data_path.is_some(), egui::Button::new("Reload"))
                .clicked()
            {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(ds), Some(result)) = (&state.dataset, &state.result) {
            ui.label(format!(
                "{} cities loaded, {} visible",
                ds.len(),
                result.summary.total_count
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open air quality data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_path(&path);
    }
}
