use super::dataset::PriceDataset;
use super::domain::{mean, tier_legend, HousingType, TierLegendEntry, ViabilityTier};
use super::geo::BoundarySet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Fixed-rate mortgage assumptions supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MortgageTerms {
    pub annual_rate_pct: f64,
    pub term_years: u32,
}

impl Default for MortgageTerms {
    fn default() -> Self {
        Self {
            annual_rate_pct: 3.5,
            term_years: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AffordabilityError {
    #[error("cannot compute for these inputs: {0}")]
    InvalidInput(String),
}

/// Standard amortization: `price * r / (1 - (1 + r)^-n)` with monthly rate `r` and `n` payments.
pub fn monthly_payment(
    price: f64,
    annual_rate_pct: f64,
    term_years: u32,
) -> Result<f64, AffordabilityError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AffordabilityError::InvalidInput(format!(
            "price must be a non-negative amount, got {price}"
        )));
    }

    let monthly_rate = annual_rate_pct / 12.0 / 100.0;
    if !monthly_rate.is_finite() || monthly_rate <= 0.0 {
        return Err(AffordabilityError::InvalidInput(format!(
            "annual rate must be positive, got {annual_rate_pct}"
        )));
    }

    let payments = term_years.saturating_mul(12);
    if payments == 0 {
        return Err(AffordabilityError::InvalidInput(
            "term must be at least one year".to_string(),
        ));
    }

    let discount = 1.0 - (1.0 + monthly_rate).powi(-(payments.min(i32::MAX as u32) as i32));
    Ok(price * monthly_rate / discount)
}

/// Share of annual income spent on the mortgage, and the tier it falls into.
pub fn viability_tier(
    monthly_payment: f64,
    annual_income: f64,
) -> Result<(f64, ViabilityTier), AffordabilityError> {
    ensure_income(annual_income)?;
    let income_fraction_pct = monthly_payment * 12.0 / annual_income * 100.0;
    Ok((
        income_fraction_pct,
        ViabilityTier::from_income_fraction(income_fraction_pct),
    ))
}

pub(crate) fn ensure_income(annual_income: f64) -> Result<(), AffordabilityError> {
    if annual_income.is_finite() && annual_income > 0.0 {
        Ok(())
    } else {
        Err(AffordabilityError::InvalidInput(format!(
            "annual income must be positive, got {annual_income}"
        )))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffordabilityResult {
    pub city: String,
    pub monthly_payment: Option<f64>,
    pub income_fraction_pct: Option<f64>,
    pub viability_tier: ViabilityTier,
    pub color: &'static str,
}

/// Affordability of `price` for `annual_income`. A missing price yields
/// [`ViabilityTier::Unknown`] rather than an error.
pub fn assess(
    city: &str,
    price: Option<f64>,
    annual_income: f64,
    terms: &MortgageTerms,
) -> Result<AffordabilityResult, AffordabilityError> {
    ensure_income(annual_income)?;

    let Some(price) = price else {
        warn!(%city, "no purchase value available, affordability unknown");
        return Ok(AffordabilityResult {
            city: city.to_string(),
            monthly_payment: None,
            income_fraction_pct: None,
            viability_tier: ViabilityTier::Unknown,
            color: ViabilityTier::Unknown.legend_color(),
        });
    };

    let payment = monthly_payment(price, terms.annual_rate_pct, terms.term_years)?;
    let (income_fraction_pct, tier) = viability_tier(payment, annual_income)?;
    Ok(AffordabilityResult {
        city: city.to_string(),
        monthly_payment: Some(payment),
        income_fraction_pct: Some(income_fraction_pct),
        viability_tier: tier,
        color: tier.legend_color(),
    })
}

/// Mean positive purchase value of a city's records, optionally for one housing type.
pub fn city_purchase_value(
    dataset: &PriceDataset,
    city: &str,
    housing_type: Option<HousingType>,
) -> Option<f64> {
    mean(
        dataset
            .records_for_city(city)
            .filter(|record| housing_type.map_or(true, |kind| record.housing_type == kind))
            .map(|record| record.purchase_value.filter(|value| *value > 0.0)),
    )
}

fn city_center(dataset: &PriceDataset, city: &str) -> (Option<f64>, Option<f64>) {
    let coordinates: Vec<_> = dataset
        .records_for_city(city)
        .filter_map(|record| record.coordinates())
        .collect();
    (
        mean(coordinates.iter().map(|(lat, _)| Some(*lat))),
        mean(coordinates.iter().map(|(_, lon)| Some(*lon))),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapSource {
    Boundaries,
    CityMarkers,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionAffordability {
    #[serde(flatten)]
    pub affordability: AffordabilityResult,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Value>,
}

/// Map payload: one tier per region plus the colour legend.
#[derive(Debug, Clone, Serialize)]
pub struct AffordabilityMap {
    pub source: MapSource,
    pub regions: Vec<RegionAffordability>,
    pub legend: Vec<TierLegendEntry>,
}

impl AffordabilityMap {
    pub fn count(&self, tier: ViabilityTier) -> usize {
        self.regions
            .iter()
            .filter(|region| region.affordability.viability_tier == tier)
            .count()
    }
}

/// Joins each boundary to the same-named city (exact, case-sensitive) and classifies it.
pub fn municipality_affordability(
    boundaries: &BoundarySet,
    dataset: &PriceDataset,
    annual_income: f64,
    terms: &MortgageTerms,
    housing_type: Option<HousingType>,
) -> Result<AffordabilityMap, AffordabilityError> {
    let regions = boundaries
        .boundaries()
        .iter()
        .map(|boundary| {
            let price = city_purchase_value(dataset, &boundary.name, housing_type);
            let affordability = assess(&boundary.name, price, annual_income, terms)?;
            let (latitude, longitude) = city_center(dataset, &boundary.name);
            Ok(RegionAffordability {
                affordability,
                latitude,
                longitude,
                geometry: Some(boundary.geometry.clone()),
            })
        })
        .collect::<Result<Vec<_>, AffordabilityError>>()?;

    Ok(AffordabilityMap {
        source: MapSource::Boundaries,
        regions,
        legend: tier_legend(),
    })
}

/// Marker-based fallback used when no boundary collection is available.
pub fn city_affordability(
    dataset: &PriceDataset,
    annual_income: f64,
    terms: &MortgageTerms,
    housing_type: Option<HousingType>,
) -> Result<AffordabilityMap, AffordabilityError> {
    let regions = dataset
        .cities()
        .iter()
        .map(|city| {
            let price = city_purchase_value(dataset, city, housing_type);
            let affordability = assess(city, price, annual_income, terms)?;
            let (latitude, longitude) = city_center(dataset, city);
            Ok(RegionAffordability {
                affordability,
                latitude,
                longitude,
                geometry: None,
            })
        })
        .collect::<Result<Vec<_>, AffordabilityError>>()?;

    Ok(AffordabilityMap {
        source: MapSource::CityMarkers,
        regions,
        legend: tier_legend(),
    })
}
