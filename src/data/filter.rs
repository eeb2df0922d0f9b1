use std::collections::BTreeSet;

use super::model::{AqiCategory, Dataset, Record};

// ---------------------------------------------------------------------------
// Filter predicate: selected countries and categories
// ---------------------------------------------------------------------------

/// The user's current selection. An empty set selects nothing (not "all").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub countries: BTreeSet<String>,
    pub categories: BTreeSet<AqiCategory>,
}

impl FilterSelection {
    pub fn new(
        countries: impl IntoIterator<Item = impl Into<String>>,
        categories: impl IntoIterator<Item = AqiCategory>,
    ) -> Self {
        Self {
            countries: countries.into_iter().map(Into::into).collect(),
            categories: categories.into_iter().collect(),
        }
    }

    /// Every country in the dataset and every category.
    pub fn all(dataset: &Dataset) -> Self {
        Self::new(dataset.countries(), AqiCategory::ALL)
    }

    /// Initial selection from configured defaults. Defaults that name a
    /// country absent from the dataset are dropped.
    pub fn from_defaults(
        dataset: &Dataset,
        default_countries: &[String],
        default_categories: &[AqiCategory],
    ) -> Self {
        let available: BTreeSet<String> = dataset.countries().into_iter().collect();
        let countries = default_countries
            .iter()
            .filter(|c| {
                let known = available.contains(*c);
                if !known {
                    log::warn!("Default country '{c}' is not in the dataset, ignoring");
                }
                known
            })
            .cloned();
        Self::new(countries, default_categories.iter().copied())
    }

    /// An empty set on either side selects nothing.
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty() || self.categories.is_empty()
    }

    /// Whether a record passes both predicates.
    pub fn matches(&self, record: &Record) -> bool {
        self.countries.contains(&record.country)
            && record
                .category
                .is_some_and(|cat| self.categories.contains(&cat))
    }

    pub fn toggle_country(&mut self, country: &str) {
        if !self.countries.remove(country) {
            self.countries.insert(country.to_string());
        }
    }

    pub fn toggle_category(&mut self, category: AqiCategory) {
        if !self.categories.remove(&category) {
            self.categories.insert(category);
        }
    }
}

// ---------------------------------------------------------------------------
// FilteredView
// ---------------------------------------------------------------------------

/// Records passing a selection, in dataset order. Borrows the dataset and
/// is rebuilt on every selection change.
#[derive(Debug, Clone, Default)]
pub struct FilteredView<'a> {
    rows: Vec<&'a Record>,
}

impl<'a> FilteredView<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.rows.iter().copied()
    }
}

impl<'v, 'a> IntoIterator for &'v FilteredView<'a> {
    type Item = &'a Record;
    type IntoIter = std::iter::Copied<std::slice::Iter<'v, &'a Record>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter().copied()
    }
}

/// Keep the records matching `selection`, preserving order.
///
/// `records` is usually a `&Dataset`, but a `&FilteredView` works too, so
/// views can be narrowed further.
pub fn filter<'a, I>(records: I, selection: &FilterSelection) -> FilteredView<'a>
where
    I: IntoIterator<Item = &'a Record>,
{
    if selection.is_empty() {
        return FilteredView::default();
    }
    FilteredView {
        rows: records
            .into_iter()
            .filter(|r| selection.matches(r))
            .collect(),
    }
}

/// Positions in `records` of the rows matching `selection`, ascending.
/// Unlike a `FilteredView` this owns nothing borrowed, so it can be kept
/// next to the dataset between frames.
pub fn matching_indices(records: &[Record], selection: &FilterSelection) -> Vec<usize> {
    if selection.is_empty() {
        return Vec::new();
    }
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| selection.matches(r))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;
    use crate::data::model::AqiCategory::*;

    fn sample() -> Dataset {
        Dataset::from_records(vec![
            record("India", 180, Unhealthy),
            record("China", 90, Moderate),
            record("India", 40, Good),
            record("Brazil", 60, Moderate),
            record("China", 310, Hazardous),
        ])
    }

    fn aqis(view: &FilteredView<'_>) -> Vec<i64> {
        view.iter().filter_map(|r| r.aqi_value).collect()
    }

    #[test]
    fn keeps_rows_matching_both_predicates_in_order() {
        let ds = sample();
        let sel = FilterSelection::new(["India", "China"], [Moderate, Unhealthy, Hazardous]);
        let view = filter(&ds, &sel);
        assert_eq!(aqis(&view), vec![180, 90, 310]);
    }

    #[test]
    fn empty_country_set_selects_nothing() {
        let ds = sample();
        let sel = FilterSelection::new(Vec::<String>::new(), AqiCategory::ALL);
        assert!(filter(&ds, &sel).is_empty());
    }

    #[test]
    fn empty_category_set_selects_nothing() {
        let ds = sample();
        let sel = FilterSelection::new(ds.countries(), []);
        assert!(filter(&ds, &sel).is_empty());
    }

    #[test]
    fn unknown_values_match_nothing() {
        let ds = sample();
        let sel = FilterSelection::new(["Atlantis"], AqiCategory::ALL);
        assert!(filter(&ds, &sel).is_empty());
    }

    #[test]
    fn records_without_category_never_match() {
        let mut odd = record("India", 12, Good);
        odd.category = None;
        let ds = Dataset::from_records(vec![odd]);
        assert!(filter(&ds, &FilterSelection::all(&ds)).is_empty());
    }

    #[test]
    fn indices_point_at_the_filtered_rows() {
        let ds = sample();
        let sel = FilterSelection::new(["India", "China"], [Moderate, Unhealthy, Hazardous]);
        let indices = matching_indices(ds.records(), &sel);
        assert_eq!(indices, vec![0, 1, 4]);
        let view = filter(&ds, &sel);
        let picked: Vec<&Record> = indices.iter().map(|&i| &ds.records()[i]).collect();
        assert_eq!(picked, view.iter().collect::<Vec<_>>());

        assert!(matching_indices(ds.records(), &FilterSelection::default()).is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let ds = sample();
        let sel = FilterSelection::new(["China", "Brazil"], [Moderate, Hazardous]);
        let once = filter(&ds, &sel);
        let twice = filter(&once, &sel);
        assert_eq!(aqis(&once), aqis(&twice));
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn selecting_everything_returns_the_dataset() {
        let ds = sample();
        let view = filter(&ds, &FilterSelection::all(&ds));
        assert_eq!(view.len(), ds.len());
    }

    #[test]
    fn defaults_drop_unknown_countries() {
        let ds = sample();
        let defaults = vec!["India".to_string(), "United States of America".to_string()];
        let sel = FilterSelection::from_defaults(&ds, &defaults, &AqiCategory::ALL);
        assert_eq!(sel.countries.len(), 1);
        assert!(sel.countries.contains("India"));
        assert_eq!(sel.categories.len(), 6);
    }

    #[test]
    fn toggles_flip_membership() {
        let mut sel = FilterSelection::default();
        sel.toggle_country("India");
        sel.toggle_category(Good);
        assert!(sel.countries.contains("India"));
        assert!(sel.categories.contains(&Good));
        sel.toggle_country("India");
        sel.toggle_category(Good);
        assert_eq!(sel, FilterSelection::default());
    }
}
