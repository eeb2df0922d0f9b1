mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::path::{Path, PathBuf};

use app::AqiDashboardApp;
use config::DashboardConfig;
use eframe::egui;
use state::AppState;

fn load_config() -> DashboardConfig {
    let mut config = DashboardConfig::discover(Path::new(".")).unwrap_or_else(|e| {
        log::error!("{e:#}; falling back to defaults");
        DashboardConfig::default()
    });
    // First positional argument overrides the data file.
    if let Some(path) = std::env::args_os().nth(1) {
        config.data_path = PathBuf::from(path);
    }
    config
}

fn main() -> eframe::Result {
    env_logger::init();

    let mut state = AppState::new(load_config());
    state.load_configured();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Global Air Quality Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(AqiDashboardApp::new(state)))),
    )
}
