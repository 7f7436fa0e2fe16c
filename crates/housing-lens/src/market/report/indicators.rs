use crate::market::dataset::PriceDataset;
use crate::market::domain::{mean, HousingType, PriceRecord};
use serde::Serialize;

/// Headline figures for one city. Means skip missing values and are absent when no
/// record carries the field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityIndicators {
    pub city: String,
    pub record_count: usize,
    pub mean_price_per_sqm: Option<f64>,
    pub mean_purchase_value: Option<f64>,
    pub mean_five_year_projection_pct: Option<f64>,
    pub by_housing_type: Vec<HousingTypeIndicators>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HousingTypeIndicators {
    pub housing_type: HousingType,
    pub label: &'static str,
    pub record_count: usize,
    pub mean_price_per_sqm: Option<f64>,
    pub mean_purchase_value: Option<f64>,
    pub mean_annual_variation_pct: Option<f64>,
}

impl CityIndicators {
    pub fn for_city(dataset: &PriceDataset, city: &str) -> Self {
        let records: Vec<&PriceRecord> = dataset.records_for_city(city).collect();

        let by_housing_type = HousingType::ordered()
            .into_iter()
            .filter_map(|housing_type| {
                let subset: Vec<&PriceRecord> = records
                    .iter()
                    .copied()
                    .filter(|record| record.housing_type == housing_type)
                    .collect();
                (!subset.is_empty()).then(|| HousingTypeIndicators {
                    housing_type,
                    label: housing_type.label(),
                    record_count: subset.len(),
                    mean_price_per_sqm: mean(subset.iter().map(|record| record.price_per_sqm)),
                    mean_purchase_value: mean(subset.iter().map(|record| record.purchase_value)),
                    mean_annual_variation_pct: mean(
                        subset.iter().map(|record| record.annual_variation_pct),
                    ),
                })
            })
            .collect();

        Self {
            city: city.to_string(),
            record_count: records.len(),
            mean_price_per_sqm: mean(records.iter().map(|record| record.price_per_sqm)),
            mean_purchase_value: mean(records.iter().map(|record| record.purchase_value)),
            mean_five_year_projection_pct: mean(
                records.iter().map(|record| record.five_year_projection_pct),
            ),
            by_housing_type,
        }
    }

    pub fn for_housing_type(&self, housing_type: HousingType) -> Option<&HousingTypeIndicators> {
        self.by_housing_type
            .iter()
            .find(|entry| entry.housing_type == housing_type)
    }
}
