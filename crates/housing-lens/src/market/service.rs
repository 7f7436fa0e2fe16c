use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::affordability::{
    assess, city_affordability, city_purchase_value, municipality_affordability,
    AffordabilityError, AffordabilityMap, AffordabilityResult, MortgageTerms,
};
use super::dataset::PriceDataset;
use super::domain::{HousingType, PriceRecord};
use super::geo::BoundarySet;
use super::history::{HistoryEntry, HistoryError, HistoryStore};
use super::recommend::{recommend, RecommendationEntry};
use super::report::{
    price_distribution, price_markers, price_trends, CityIndicators, CityMarkerMap, Guidance,
    PriceHistogram, TrendPoint, DISTRIBUTION_BINS,
};

pub const DEFAULT_TOP_RECOMMENDATIONS: usize = 5;

/// One user interaction: who is asking and what they are looking for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HousingQuery {
    pub age: u8,
    pub annual_income: f64,
    pub city: String,
    pub housing_type: HousingType,
    #[serde(default)]
    pub top: Option<usize>,
}

/// Accepted ranges for user-supplied figures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryLimits {
    pub min_age: u8,
    pub max_age: u8,
    pub min_annual_income: f64,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            min_age: 18,
            max_age: 100,
            min_annual_income: 1_000.0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error(transparent)]
    Affordability(#[from] AffordabilityError),
    #[error(transparent)]
    History(#[from] HistoryError),
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub city: String,
    pub housing_type: HousingType,
    pub indicators: CityIndicators,
    pub trends: Vec<TrendPoint>,
    pub distribution: PriceHistogram,
    pub city_map: CityMarkerMap,
    pub selected_affordability: AffordabilityResult,
    pub affordability_map: AffordabilityMap,
    pub recommendations: Vec<RecommendationEntry>,
    pub ranked_total: usize,
    pub guidance: Guidance,
    pub guidance_message: &'static str,
}

/// Cities and housing types a query may choose from.
#[derive(Debug, Clone, Serialize)]
pub struct QueryCatalog {
    pub cities: Vec<String>,
    pub housing_types: Vec<HousingType>,
    pub map_available: bool,
}

/// Runs queries against a loaded dataset and records each one in the history store.
pub struct HousingQueryService<H> {
    dataset: Arc<PriceDataset>,
    boundaries: Option<Arc<BoundarySet>>,
    history: Arc<H>,
    terms: MortgageTerms,
    limits: QueryLimits,
}

impl<H> HousingQueryService<H>
where
    H: HistoryStore + 'static,
{
    pub fn new(
        dataset: Arc<PriceDataset>,
        history: Arc<H>,
        terms: MortgageTerms,
        limits: QueryLimits,
    ) -> Self {
        Self {
            dataset,
            boundaries: None,
            history,
            terms,
            limits,
        }
    }

    pub fn with_boundaries(mut self, boundaries: Arc<BoundarySet>) -> Self {
        self.boundaries = Some(boundaries);
        self
    }

    pub fn dataset(&self) -> &PriceDataset {
        &self.dataset
    }

    pub fn terms(&self) -> &MortgageTerms {
        &self.terms
    }

    pub fn map_available(&self) -> bool {
        self.boundaries
            .as_ref()
            .is_some_and(|boundaries| !boundaries.is_empty())
    }

    pub fn catalog(&self) -> QueryCatalog {
        QueryCatalog {
            cities: self.dataset.cities().to_vec(),
            housing_types: self.dataset.housing_types().to_vec(),
            map_available: self.map_available(),
        }
    }

    /// Raw records, including those with missing figures, optionally for one city.
    pub fn records(&self, city: Option<&str>) -> Vec<PriceRecord> {
        match city {
            Some(city) => self.dataset.records_for_city(city).cloned().collect(),
            None => self.dataset.records().to_vec(),
        }
    }

    pub fn history(&self) -> Result<Vec<HistoryEntry>, QueryError> {
        Ok(self.history.load_all()?)
    }

    pub fn affordability(
        &self,
        annual_income: f64,
        housing_type: Option<HousingType>,
    ) -> Result<AffordabilityMap, QueryError> {
        self.validate_income(annual_income)?;
        let map = match self.boundaries.as_deref().filter(|set| !set.is_empty()) {
            Some(boundaries) => municipality_affordability(
                boundaries,
                &self.dataset,
                annual_income,
                &self.terms,
                housing_type,
            )?,
            None => city_affordability(&self.dataset, annual_income, &self.terms, housing_type)?,
        };
        Ok(map)
    }

    pub fn run(&self, query: HousingQuery) -> Result<QueryOutcome, QueryError> {
        self.validate(&query)?;
        let HousingQuery {
            age,
            annual_income,
            city,
            housing_type,
            top,
        } = query;

        let indicators = CityIndicators::for_city(&self.dataset, &city);
        let trends = price_trends(&self.dataset, &city);
        let distribution = price_distribution(&self.dataset, &city, DISTRIBUTION_BINS);
        let city_map = price_markers(&self.dataset, &city);

        let selected_affordability = assess(
            &city,
            city_purchase_value(&self.dataset, &city, Some(housing_type)),
            annual_income,
            &self.terms,
        )?;
        let affordability_map = self.affordability(annual_income, Some(housing_type))?;

        let mut recommendations =
            recommend(&self.dataset, housing_type, annual_income, &self.terms)?;
        let ranked_total = recommendations.len();
        recommendations.truncate(top.unwrap_or(DEFAULT_TOP_RECOMMENDATIONS));

        let guidance = Guidance::for_profile(age, annual_income);

        let entry = HistoryEntry {
            age,
            annual_income,
            city: city.clone(),
            price_per_sqm: indicators.mean_price_per_sqm,
            purchase_value: indicators.mean_purchase_value,
            five_year_projection_pct: indicators.mean_five_year_projection_pct,
        };
        if let Err(err) = self.history.append(&entry) {
            warn!(%city, error = %err, "failed to record search history");
            return Err(err.into());
        }

        info!(
            %city,
            housing_type = housing_type.label(),
            tier = selected_affordability.viability_tier.label(),
            ranked = ranked_total,
            "housing query completed"
        );

        Ok(QueryOutcome {
            city,
            housing_type,
            indicators,
            trends,
            distribution,
            city_map,
            selected_affordability,
            affordability_map,
            recommendations,
            ranked_total,
            guidance,
            guidance_message: guidance.message(),
        })
    }

    fn validate(&self, query: &HousingQuery) -> Result<(), QueryError> {
        if query.age < self.limits.min_age || query.age > self.limits.max_age {
            return Err(QueryError::InvalidQuery(format!(
                "age must be between {} and {}, got {}",
                self.limits.min_age, self.limits.max_age, query.age
            )));
        }

        self.validate_income(query.annual_income)?;

        if !self.dataset.contains_city(&query.city) {
            return Err(QueryError::InvalidQuery(format!(
                "no price data for city '{}'",
                query.city
            )));
        }

        if !self.dataset.housing_types().contains(&query.housing_type) {
            return Err(QueryError::InvalidQuery(format!(
                "housing type '{}' is not present in the dataset",
                query.housing_type
            )));
        }

        Ok(())
    }

    fn validate_income(&self, annual_income: f64) -> Result<(), QueryError> {
        if !annual_income.is_finite() || annual_income < self.limits.min_annual_income {
            return Err(QueryError::InvalidQuery(format!(
                "annual income must be at least {}, got {}",
                self.limits.min_annual_income, annual_income
            )));
        }
        Ok(())
    }
}
