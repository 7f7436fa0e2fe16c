use super::affordability::{ensure_income, monthly_payment, viability_tier, AffordabilityError, MortgageTerms};
use super::dataset::PriceDataset;
use super::domain::{HousingType, PriceRecord};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::warn;

const VIABILITY_WEIGHT: f64 = 0.4;
const PROJECTION_WEIGHT: f64 = 0.3;
const PROXIMITY_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationEntry {
    pub city: String,
    pub housing_type: HousingType,
    pub year: Option<i32>,
    pub price_per_sqm: f64,
    pub purchase_value: f64,
    pub five_year_projection_pct: f64,
    pub monthly_payment: f64,
    pub income_fraction_pct: f64,
    pub composite_score: f64,
}

/// Scores every complete record of `housing_type` and ranks them best first.
///
/// Records missing a purchase value (or with one `<= 0`), a five-year projection, or a
/// price per square meter are left out. Ties are ordered by city name so the ranking is
/// stable across runs. The full ranking is returned; callers pick how many to show.
pub fn recommend(
    dataset: &PriceDataset,
    housing_type: HousingType,
    annual_income: f64,
    terms: &MortgageTerms,
) -> Result<Vec<RecommendationEntry>, AffordabilityError> {
    ensure_income(annual_income)?;

    let Some(corpus_mean) = dataset.corpus_mean_price_per_sqm() else {
        return Ok(Vec::new());
    };

    let mut entries = Vec::new();
    for record in dataset
        .records()
        .iter()
        .filter(|record| record.housing_type == housing_type)
    {
        if let Some(entry) = score_record(record, annual_income, terms, corpus_mean)? {
            entries.push(entry);
        }
    }

    entries.sort_by(|left, right| {
        right
            .composite_score
            .total_cmp(&left.composite_score)
            .then_with(|| left.city.cmp(&right.city))
    });

    Ok(entries)
}

fn score_record(
    record: &PriceRecord,
    annual_income: f64,
    terms: &MortgageTerms,
    corpus_mean: f64,
) -> Result<Option<RecommendationEntry>, AffordabilityError> {
    let (Some(purchase_value), Some(projection), Some(price_per_sqm)) = (
        record.purchase_value.filter(|value| *value > 0.0),
        record.five_year_projection_pct,
        record.price_per_sqm,
    ) else {
        warn!(
            city = %record.city,
            year = ?record.year,
            housing_type = record.housing_type.label(),
            "record lacks price, purchase value or projection, left out of recommendations"
        );
        return Ok(None);
    };

    let payment = monthly_payment(purchase_value, terms.annual_rate_pct, terms.term_years)?;
    let (income_fraction_pct, _) = viability_tier(payment, annual_income)?;

    let viability_score = (100.0 - income_fraction_pct).max(0.0);
    let projection_score = projection.max(0.0);
    let proximity_score = (100.0 - (price_per_sqm - corpus_mean).abs()).max(0.0);

    let composite_score = VIABILITY_WEIGHT * viability_score
        + PROJECTION_WEIGHT * projection_score
        + PROXIMITY_WEIGHT * proximity_score;

    Ok(Some(RecommendationEntry {
        city: record.city.clone(),
        housing_type: record.housing_type,
        year: record.year,
        price_per_sqm,
        purchase_value,
        five_year_projection_pct: projection,
        monthly_payment: payment,
        income_fraction_pct,
        composite_score,
    }))
}

/// Ordering check shared by tests and callers that merge rankings.
pub fn is_ranked(entries: &[RecommendationEntry]) -> bool {
    entries.windows(2).all(|pair| {
        match pair[0].composite_score.total_cmp(&pair[1].composite_score) {
            Ordering::Greater => true,
            Ordering::Equal => pair[0].city <= pair[1].city,
            Ordering::Less => false,
        }
    })
}
