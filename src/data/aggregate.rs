use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use super::filter::{filter, FilterSelection, FilteredView};
use super::model::{AqiCategory, Dataset, Pollutant, Record};

// ---------------------------------------------------------------------------
// Result shapes handed to the presentation layer
// ---------------------------------------------------------------------------

/// Headline numbers. `None` means "no data" and is distinct from zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total_count: usize,
    pub avg_aqi: Option<f64>,
    pub max_aqi: Option<i64>,
    pub distinct_country_count: usize,
}

/// One city on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub category: Option<AqiCategory>,
    pub aqi_value: Option<i64>,
    pub city: String,
    pub country: String,
    pub pm25_aqi_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryMean {
    pub country: String,
    pub mean_aqi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollutantMean {
    pub pollutant: Pollutant,
    pub mean: Option<f64>,
}

/// Everything the dashboard draws for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub summary: SummaryMetrics,
    pub map_points: Vec<MapPoint>,
    /// Sorted by `mean_aqi` descending; ties keep first-appearance order.
    pub country_ranking: Vec<CountryMean>,
    /// Sorted by mean descending, missing means last; otherwise declaration
    /// order.
    pub pollutant_composition: Vec<PollutantMean>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Filter `dataset` by `selection` and aggregate the result from scratch.
pub fn render(dataset: &Dataset, selection: &FilterSelection) -> AggregateResult {
    let view = filter(dataset, selection);
    log::debug!(
        "Selection of {} countries / {} categories matched {} of {} records",
        selection.countries.len(),
        selection.categories.len(),
        view.len(),
        dataset.len()
    );
    aggregate(&view)
}

pub fn aggregate(view: &FilteredView<'_>) -> AggregateResult {
    AggregateResult {
        summary: summary_metrics(view),
        map_points: map_points(view),
        country_ranking: country_ranking(view),
        pollutant_composition: pollutant_composition(view),
    }
}

/// Arithmetic mean of the present values; `None` when there are none.
fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

pub fn summary_metrics(view: &FilteredView<'_>) -> SummaryMetrics {
    let aqis = || view.iter().filter_map(|r| r.aqi_value);
    SummaryMetrics {
        total_count: view.len(),
        avg_aqi: mean(aqis().map(|v| v as f64)),
        max_aqi: aqis().max(),
        distinct_country_count: view
            .iter()
            .map(|r| r.country.as_str())
            .collect::<BTreeSet<_>>()
            .len(),
    }
}

pub fn map_points(view: &FilteredView<'_>) -> Vec<MapPoint> {
    view.iter()
        .map(|r: &Record| MapPoint {
            latitude: r.latitude,
            longitude: r.longitude,
            category: r.category,
            aqi_value: r.aqi_value,
            city: r.city.clone(),
            country: r.country.clone(),
            pm25_aqi_value: r.pm25_aqi_value,
        })
        .collect()
}

pub fn country_ranking(view: &FilteredView<'_>) -> Vec<CountryMean> {
    // Groups in first-appearance order so the stable sort below breaks ties
    // by that order.
    let mut order: Vec<&str> = Vec::new();
    let mut sums: HashMap<&str, (f64, usize)> = HashMap::new();
    for r in view {
        let Some(aqi) = r.aqi_value else { continue };
        let entry = sums.entry(r.country.as_str()).or_insert_with(|| {
            order.push(r.country.as_str());
            (0.0, 0)
        });
        entry.0 += aqi as f64;
        entry.1 += 1;
    }

    let mut ranking: Vec<CountryMean> = order
        .into_iter()
        .map(|country| {
            let (sum, n) = sums[country];
            CountryMean {
                country: country.to_string(),
                mean_aqi: sum / n as f64,
            }
        })
        .collect();
    ranking.sort_by(|a, b| b.mean_aqi.total_cmp(&a.mean_aqi));
    ranking
}

pub fn pollutant_composition(view: &FilteredView<'_>) -> Vec<PollutantMean> {
    let mut means: Vec<PollutantMean> = Pollutant::ALL
        .into_iter()
        .map(|pollutant| PollutantMean {
            pollutant,
            mean: mean(view.iter().filter_map(|r| pollutant.value_in(r))),
        })
        .collect();
    // `None` sorts below every `Some`, so reversing puts missing means last.
    means.sort_by(|a, b| match (a.mean, b.mean) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (x, y) => y.is_some().cmp(&x.is_some()),
    });
    means
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;
    use crate::data::model::AqiCategory::*;

    fn all(ds: &Dataset) -> AggregateResult {
        render(ds, &FilterSelection::all(ds))
    }

    #[test]
    fn worked_example_metrics_and_ranking() {
        let ds = Dataset::from_records(vec![
            record("A", 10, Good),
            record("A", 30, Moderate),
            record("B", 20, Good),
        ]);
        let result = all(&ds);

        assert_eq!(
            result.summary,
            SummaryMetrics {
                total_count: 3,
                avg_aqi: Some(20.0),
                max_aqi: Some(30),
                distinct_country_count: 2,
            }
        );
        let ranking: Vec<_> = result
            .country_ranking
            .iter()
            .map(|c| (c.country.as_str(), c.mean_aqi))
            .collect();
        assert_eq!(ranking, vec![("A", 20.0), ("B", 20.0)]);
    }

    #[test]
    fn ranking_is_sorted_descending() {
        let ds = Dataset::from_records(vec![
            record("Chad", 50, Good),
            record("India", 180, Unhealthy),
            record("Chad", 70, Moderate),
            record("Peru", 30, Good),
            record("India", 160, Unhealthy),
        ]);
        let ranking = all(&ds).country_ranking;
        assert_eq!(ranking.len(), 3);
        assert!(ranking
            .windows(2)
            .all(|pair| pair[0].mean_aqi >= pair[1].mean_aqi));
        assert_eq!(ranking[0].country, "India");
        assert_eq!(ranking[0].mean_aqi, 170.0);
        assert_eq!(ranking[2].country, "Peru");
    }

    #[test]
    fn ranking_skips_countries_without_aqi() {
        let mut blank = record("Nauru", 0, Good);
        blank.aqi_value = None;
        let ds = Dataset::from_records(vec![blank, record("Chad", 50, Good)]);
        let result = all(&ds);
        assert_eq!(result.country_ranking.len(), 1);
        assert_eq!(result.summary.total_count, 2);
        assert_eq!(result.summary.avg_aqi, Some(50.0));
        assert_eq!(result.summary.distinct_country_count, 2);
    }

    #[test]
    fn empty_view_yields_sentinels() {
        let ds = Dataset::from_records(vec![record("A", 10, Good)]);
        let result = render(&ds, &FilterSelection::new(["A"], [Hazardous]));

        assert_eq!(
            result.summary,
            SummaryMetrics {
                total_count: 0,
                avg_aqi: None,
                max_aqi: None,
                distinct_country_count: 0,
            }
        );
        assert!(result.map_points.is_empty());
        assert!(result.country_ranking.is_empty());
        let composition: Vec<_> = result
            .pollutant_composition
            .iter()
            .map(|p| (p.pollutant, p.mean))
            .collect();
        assert_eq!(
            composition,
            vec![
                (Pollutant::Co, None),
                (Pollutant::Ozone, None),
                (Pollutant::No2, None),
                (Pollutant::Pm25, None),
            ]
        );
    }

    #[test]
    fn empty_dataset_aggregates_without_failing() {
        let ds = Dataset::default();
        let result = all(&ds);
        assert_eq!(result.summary.total_count, 0);
        assert_eq!(result.pollutant_composition.len(), 4);
    }

    #[test]
    fn pollutant_means_skip_missing_values_per_field() {
        let mut a = record("A", 10, Good);
        a.co_aqi_value = Some(2.0);
        a.ozone_aqi_value = Some(30.0);
        a.no2_aqi_value = Some(6.0);
        a.pm25_aqi_value = None;
        let mut b = record("A", 20, Good);
        b.co_aqi_value = Some(4.0);
        b.ozone_aqi_value = Some(50.0);
        b.no2_aqi_value = Some(10.0);
        b.pm25_aqi_value = Some(60.0);
        let ds = Dataset::from_records(vec![a, b]);

        let composition: Vec<_> = all(&ds)
            .pollutant_composition
            .iter()
            .map(|p| (p.pollutant, p.mean))
            .collect();
        assert_eq!(
            composition,
            vec![
                (Pollutant::Pm25, Some(60.0)),
                (Pollutant::Ozone, Some(40.0)),
                (Pollutant::No2, Some(8.0)),
                (Pollutant::Co, Some(3.0)),
            ]
        );
    }

    #[test]
    fn all_missing_pollutant_sorts_last() {
        let mut a = record("A", 10, Good);
        a.co_aqi_value = Some(1.0);
        a.ozone_aqi_value = Some(1.0);
        a.no2_aqi_value = None;
        a.pm25_aqi_value = Some(5.0);
        let ds = Dataset::from_records(vec![a]);

        let order: Vec<_> = all(&ds)
            .pollutant_composition
            .iter()
            .map(|p| p.pollutant)
            .collect();
        assert_eq!(
            order,
            vec![Pollutant::Pm25, Pollutant::Co, Pollutant::Ozone, Pollutant::No2]
        );
    }

    #[test]
    fn map_points_project_each_record() {
        let mut r = record("Japan", 55, Moderate);
        r.city = "Tokyo".to_string();
        r.latitude = 35.68;
        r.longitude = 139.69;
        r.pm25_aqi_value = Some(55.0);
        let ds = Dataset::from_records(vec![r]);

        let points = all(&ds).map_points;
        assert_eq!(
            points,
            vec![MapPoint {
                latitude: 35.68,
                longitude: 139.69,
                category: Some(Moderate),
                aqi_value: Some(55),
                city: "Tokyo".to_string(),
                country: "Japan".to_string(),
                pm25_aqi_value: Some(55.0),
            }]
        );
    }

    #[test]
    fn zero_match_selection_is_empty() {
        let ds = Dataset::from_records(vec![
            record("India", 180, Unhealthy),
            record("Chad", 20, Good),
        ]);
        let result = render(&ds, &FilterSelection::new(["Chad"], [Unhealthy]));
        assert_eq!(result.summary.total_count, 0);
        assert_eq!(result.summary.avg_aqi, None);
        assert_eq!(result.summary.max_aqi, None);
        assert_eq!(result.summary.distinct_country_count, 0);
        assert!(result.map_points.is_empty());
    }
}
