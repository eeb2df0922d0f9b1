use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::data::aggregate::{render, AggregateResult};
use crate::data::cache::DatasetCache;
use crate::data::filter::{matching_indices, FilterSelection};
use crate::data::model::{AqiCategory, Dataset};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Memo of loaded sources, owned here rather than globally.
    cache: DatasetCache,

    /// Path of the dataset currently shown.
    pub data_path: Option<PathBuf>,

    /// Loaded dataset (None until a file loads successfully).
    pub dataset: Option<Arc<Dataset>>,

    /// Sorted unique countries of the dataset, for the selector.
    pub countries: Vec<String>,

    pub selection: FilterSelection,

    /// Views for the current selection, recomputed on every change.
    pub result: Option<AggregateResult>,

    /// Dataset positions of the rows passing the selection, for the raw
    /// table. Recomputed together with `result`.
    pub visible_rows: Vec<usize>,

    /// Text typed into the country search box.
    pub country_search: String,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            cache: DatasetCache::new(),
            data_path: None,
            dataset: None,
            countries: Vec::new(),
            selection: FilterSelection::default(),
            result: None,
            visible_rows: Vec::new(),
            country_search: String::new(),
            status_message: None,
        }
    }

    /// Load the configured data file.
    pub fn load_configured(&mut self) {
        let path = self.config.data_path.clone();
        self.load_path(&path);
    }

    /// Load (or fetch from cache) a dataset and make it current.
    pub fn load_path(&mut self, path: &Path) {
        match self.cache.get_or_load(path) {
            Ok(dataset) => {
                log::info!(
                    "Showing {} records from {}",
                    dataset.len(),
                    path.display()
                );
                self.data_path = Some(path.to_path_buf());
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Switch to a file picked by the user. Only the shown source is kept
    /// cached, so opening a different one forgets the rest.
    pub fn open_path(&mut self, path: &Path) {
        if self.data_path.as_deref() != Some(path) {
            self.cache.clear();
        }
        self.load_path(path);
    }

    /// Drop the cached copy of the current file and read it again.
    pub fn reload(&mut self) {
        if let Some(path) = self.data_path.clone() {
            self.cache.invalidate(&path);
            self.load_path(&path);
        }
    }

    /// Ingest a dataset, initialise the selection from the defaults.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        self.countries = dataset.countries();
        self.selection = FilterSelection::from_defaults(
            &dataset,
            &self.config.default_countries,
            &self.config.default_categories,
        );
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refresh();
    }

    /// Re-run the filter → aggregate pipeline for the current selection.
    pub fn refresh(&mut self) {
        match self.dataset.as_deref() {
            Some(ds) => {
                self.visible_rows = matching_indices(ds.records(), &self.selection);
                self.result = Some(render(ds, &self.selection));
            }
            None => {
                self.visible_rows.clear();
                self.result = None;
            }
        }
    }

    /// Every country and every category.
    pub fn select_everything(&mut self) {
        if let Some(ds) = &self.dataset {
            self.selection = FilterSelection::all(ds);
            self.refresh();
        }
    }

    pub fn toggle_country(&mut self, country: &str) {
        self.selection.toggle_country(country);
        self.refresh();
    }

    pub fn toggle_category(&mut self, category: AqiCategory) {
        self.selection.toggle_category(category);
        self.refresh();
    }

    pub fn select_all_countries(&mut self) {
        self.selection.countries = self.countries.iter().cloned().collect();
        self.refresh();
    }

    pub fn select_no_countries(&mut self) {
        self.selection.countries.clear();
        self.refresh();
    }

    pub fn select_all_categories(&mut self) {
        self.selection.categories = AqiCategory::ALL.into_iter().collect();
        self.refresh();
    }

    pub fn select_no_categories(&mut self) {
        self.selection.categories.clear();
        self.refresh();
    }

    /// Countries whose name contains the search text (case-insensitive).
    pub fn visible_countries(&self) -> Vec<&str> {
        let needle = self.country_search.trim().to_lowercase();
        self.countries
            .iter()
            .map(String::as_str)
            .filter(|c| needle.is_empty() || c.to_lowercase().contains(&needle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Country,City,AQI Value,AQI Category,CO AQI Value,Ozone AQI Value,\
NO2 AQI Value,PM2.5 AQI Value,lat,lng\n\
India,Delhi,180,Unhealthy,3,40,10,180,28.6,77.2\n\
China,Beijing,90,Moderate,2,30,20,90,39.9,116.4\n\
Chad,N'Djamena,50,Good,1,20,1,50,12.1,15.0\n";

    fn loaded_state(dir: &Path) -> AppState {
        let path = dir.join("aqi.csv");
        std::fs::write(&path, CSV).unwrap();
        let config = DashboardConfig {
            data_path: path,
            ..DashboardConfig::default()
        };
        let mut state = AppState::new(config);
        state.load_configured();
        state
    }

    #[test]
    fn loading_applies_default_selection() {
        let dir = tempfile::tempdir().unwrap();
        let state = loaded_state(dir.path());

        assert_eq!(state.countries, vec!["Chad", "China", "India"]);
        // "United States of America" and "Brazil" are not in the file.
        assert_eq!(state.selection.countries.len(), 2);
        let summary = &state.result.as_ref().unwrap().summary;
        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.max_aqi, Some(180));
        assert_eq!(state.status_message, None);
    }

    #[test]
    fn toggles_recompute_the_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_state(dir.path());

        state.toggle_country("Chad");
        assert_eq!(state.result.as_ref().unwrap().summary.total_count, 3);

        state.toggle_category(AqiCategory::Unhealthy);
        let summary = &state.result.as_ref().unwrap().summary;
        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.max_aqi, Some(90));
    }

    #[test]
    fn clearing_a_selection_empties_the_views() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_state(dir.path());

        state.select_no_categories();
        let result = state.result.as_ref().unwrap();
        assert_eq!(result.summary.total_count, 0);
        assert_eq!(result.summary.avg_aqi, None);

        state.select_all_categories();
        state.select_all_countries();
        assert_eq!(state.result.as_ref().unwrap().summary.total_count, 3);

        state.select_no_countries();
        assert!(state.result.as_ref().unwrap().map_points.is_empty());
    }

    #[test]
    fn visible_rows_follow_the_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_state(dir.path());
        // Defaults keep India and China, rows 0 and 1.
        assert_eq!(state.visible_rows, vec![0, 1]);

        state.toggle_country("India");
        assert_eq!(state.visible_rows, vec![1]);

        state.select_everything();
        assert_eq!(state.visible_rows, vec![0, 1, 2]);
        assert_eq!(state.result.as_ref().unwrap().summary.total_count, 3);

        state.select_no_categories();
        assert!(state.visible_rows.is_empty());
    }

    #[test]
    fn opening_another_file_keeps_only_that_source_cached() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_state(dir.path());
        let first = state.dataset.clone().unwrap();

        let other = dir.path().join("other.csv");
        std::fs::write(&other, CSV).unwrap();
        state.open_path(&other);
        assert_eq!(state.data_path.as_deref(), Some(other.as_path()));
        assert_eq!(state.cache.len(), 1);

        // Re-opening the same file is served from the cache.
        let shown = state.dataset.clone().unwrap();
        state.open_path(&other);
        assert!(Arc::ptr_eq(&shown, state.dataset.as_ref().unwrap()));
        assert!(!Arc::ptr_eq(&first, &shown));
    }

    #[test]
    fn failed_load_sets_status() {
        let mut state = AppState::new(DashboardConfig {
            data_path: PathBuf::from("/no/such/file.csv"),
            ..DashboardConfig::default()
        });
        state.load_configured();
        assert!(state.dataset.is_none());
        assert!(state.result.is_none());
        assert!(state.status_message.unwrap().starts_with("Error:"));
    }

    #[test]
    fn search_narrows_country_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_state(dir.path());
        state.country_search = "ch".to_string();
        assert_eq!(state.visible_countries(), vec!["Chad", "China"]);
    }
}
