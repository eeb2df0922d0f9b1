use eframe::egui::{self, ScrollArea, Ui};

use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct AqiDashboardApp {
    pub state: AppState,
}

impl AqiDashboardApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for AqiDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: metrics, map, charts, table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| dashboard(ui, &self.state));
        });
    }
}

fn dashboard(ui: &mut Ui, state: &AppState) {
    ui.heading("Global Air Quality Analysis Dashboard");
    ui.label("Exploring real-world AQI data and pollutants across the globe.");
    ui.add_space(8.0);

    let (Some(dataset), Some(result)) = (&state.dataset, &state.result) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view air quality data  (File → Open…)");
        });
        return;
    };

    plot::metrics_row(ui, &result.summary);
    ui.separator();

    ui.strong("Geospatial Distribution of Air Quality");
    plot::map_plot(ui, &result.map_points);
    ui.separator();

    ui.columns(2, |columns| {
        columns[0].strong("Average AQI by Country");
        plot::ranking_chart(&mut columns[0], &result.country_ranking);
        columns[1].strong("Pollutant Composition");
        plot::pollutant_chart(&mut columns[1], &result.pollutant_composition);
    });
    ui.separator();

    egui::CollapsingHeader::new("View Raw Filtered Data")
        .id_salt("raw_data")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            table::raw_table(ui, dataset.records(), &state.visible_rows);
        });
}
