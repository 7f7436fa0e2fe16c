use super::columns::{ColumnIndex, PriceColumn};
use super::normalizer::{normalize_decimal, parse_year};
use crate::market::domain::{HousingType, PriceRecord};
use csv::StringRecord;

/// Why a row could not become a [`PriceRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RowRejection {
    EmptyCity,
    UnknownHousingType(String),
}

pub(crate) fn parse_row(
    index: &ColumnIndex,
    row: &StringRecord,
) -> Result<PriceRecord, RowRejection> {
    let city = index.field(row, PriceColumn::City).trim();
    if city.is_empty() {
        return Err(RowRejection::EmptyCity);
    }

    let raw_type = index.field(row, PriceColumn::HousingType);
    let housing_type = HousingType::from_source_label(raw_type)
        .ok_or_else(|| RowRejection::UnknownHousingType(raw_type.trim().to_string()))?;

    let decimal = |column| normalize_decimal(index.field(row, column));

    Ok(PriceRecord {
        city: city.to_string(),
        year: parse_year(index.field(row, PriceColumn::Year)),
        housing_type,
        price_per_sqm: decimal(PriceColumn::PricePerSqm),
        purchase_value: decimal(PriceColumn::PurchaseValue),
        annual_variation_pct: decimal(PriceColumn::AnnualVariation),
        five_year_projection_pct: decimal(PriceColumn::FiveYearProjection),
        latitude: decimal(PriceColumn::Latitude),
        longitude: decimal(PriceColumn::Longitude),
    })
}
