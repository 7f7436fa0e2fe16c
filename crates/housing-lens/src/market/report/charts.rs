use crate::market::dataset::PriceDataset;
use crate::market::domain::{mean, HousingType};
use serde::Serialize;
use std::collections::BTreeMap;

pub const DISTRIBUTION_BINS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub year: i32,
    pub housing_type: HousingType,
    pub mean_price_per_sqm: f64,
}

/// Mean price per square meter by year and housing type, oldest year first.
pub fn price_trends(dataset: &PriceDataset, city: &str) -> Vec<TrendPoint> {
    let mut groups: BTreeMap<(i32, HousingType), (f64, usize)> = BTreeMap::new();
    for record in dataset.records_for_city(city) {
        if let (Some(year), Some(price)) = (record.year, record.price_per_sqm) {
            let slot = groups.entry((year, record.housing_type)).or_insert((0.0, 0));
            slot.0 += price;
            slot.1 += 1;
        }
    }

    groups
        .into_iter()
        .map(|((year, housing_type), (sum, count))| TrendPoint {
            year,
            housing_type,
            mean_price_per_sqm: sum / count as f64,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSeries {
    pub housing_type: HousingType,
    pub counts: Vec<usize>,
}

/// Shared bin edges (`bins + 1` of them) with one count series per housing type.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct PriceHistogram {
    pub bin_edges: Vec<f64>,
    pub series: Vec<HistogramSeries>,
}

impl PriceHistogram {
    pub fn total(&self) -> usize {
        self.series
            .iter()
            .map(|series| series.counts.iter().sum::<usize>())
            .sum()
    }
}

/// Equal-width histogram over the city's price range. A flat range collapses to one bin.
pub fn price_distribution(dataset: &PriceDataset, city: &str, bins: usize) -> PriceHistogram {
    let values: Vec<(HousingType, f64)> = dataset
        .records_for_city(city)
        .filter_map(|record| record.price_per_sqm.map(|price| (record.housing_type, price)))
        .collect();

    let Some((min, max)) = values.iter().fold(None, |range: Option<(f64, f64)>, (_, price)| {
        Some(match range {
            Some((min, max)) => (min.min(*price), max.max(*price)),
            None => (*price, *price),
        })
    }) else {
        return PriceHistogram::default();
    };

    let bins = if max > min { bins.max(1) } else { 1 };
    let width = (max - min) / bins as f64;
    let bin_edges = (0..=bins)
        .map(|edge| if edge == bins { max } else { min + width * edge as f64 })
        .collect();

    let mut counts: BTreeMap<HousingType, Vec<usize>> = BTreeMap::new();
    for (housing_type, price) in values {
        let slot = if width > 0.0 {
            (((price - min) / width).floor() as usize).min(bins - 1)
        } else {
            0
        };
        counts.entry(housing_type).or_insert_with(|| vec![0; bins])[slot] += 1;
    }

    PriceHistogram {
        bin_edges,
        series: counts
            .into_iter()
            .map(|(housing_type, counts)| HistogramSeries {
                housing_type,
                counts,
            })
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceMomentum {
    Rising,
    Flat,
}

impl PriceMomentum {
    /// Positive annual variation is rising; zero, negative or unknown is not.
    pub fn from_variation(annual_variation_pct: Option<f64>) -> Self {
        match annual_variation_pct {
            Some(variation) if variation > 0.0 => Self::Rising,
            _ => Self::Flat,
        }
    }

    pub const fn color(self) -> &'static str {
        match self {
            Self::Rising => "green",
            Self::Flat => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceMarker {
    pub latitude: f64,
    pub longitude: f64,
    pub housing_type: HousingType,
    pub year: Option<i32>,
    pub price_per_sqm: Option<f64>,
    pub purchase_value: Option<f64>,
    pub momentum: PriceMomentum,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityMarkerMap {
    pub center_latitude: Option<f64>,
    pub center_longitude: Option<f64>,
    pub markers: Vec<PriceMarker>,
}

/// One marker per located record of the city, centred on the mean position.
pub fn price_markers(dataset: &PriceDataset, city: &str) -> CityMarkerMap {
    let markers: Vec<PriceMarker> = dataset
        .records_for_city(city)
        .filter_map(|record| {
            let (latitude, longitude) = record.coordinates()?;
            let momentum = PriceMomentum::from_variation(record.annual_variation_pct);
            Some(PriceMarker {
                latitude,
                longitude,
                housing_type: record.housing_type,
                year: record.year,
                price_per_sqm: record.price_per_sqm,
                purchase_value: record.purchase_value,
                momentum,
                color: momentum.color(),
            })
        })
        .collect();

    CityMarkerMap {
        center_latitude: mean(markers.iter().map(|marker| Some(marker.latitude))),
        center_longitude: mean(markers.iter().map(|marker| Some(marker.longitude))),
        markers,
    }
}
