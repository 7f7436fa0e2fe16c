use super::normalizer::normalize_header;
use csv::StringRecord;

/// Columns the price table must carry, in the order they are checked.
/// Discriminants double as slots in [`ColumnIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PriceColumn {
    City,
    Year,
    PricePerSqm,
    PurchaseValue,
    AnnualVariation,
    FiveYearProjection,
    HousingType,
    Latitude,
    Longitude,
}

impl PriceColumn {
    pub(crate) const fn required() -> [Self; 9] {
        [
            Self::City,
            Self::Year,
            Self::PricePerSqm,
            Self::PurchaseValue,
            Self::AnnualVariation,
            Self::FiveYearProjection,
            Self::HousingType,
            Self::Latitude,
            Self::Longitude,
        ]
    }

    pub(crate) const fn header(self) -> &'static str {
        match self {
            Self::City => "Ciudad",
            Self::Year => "Año",
            Self::PricePerSqm => "Precio medio/m²",
            Self::PurchaseValue => "Valor medio de compra",
            Self::AnnualVariation => "Variación anual (%)",
            Self::FiveYearProjection => "Proyección 5 años (%)",
            Self::HousingType => "Tipo de vivienda",
            Self::Latitude => "Latitud",
            Self::Longitude => "Longitud",
        }
    }
}

/// Resolved field positions for every required column.
#[derive(Debug, Clone)]
pub(crate) struct ColumnIndex {
    positions: [usize; 9],
}

impl ColumnIndex {
    /// Returns the first required column absent from `headers` on failure.
    pub(crate) fn resolve(headers: &StringRecord) -> Result<Self, PriceColumn> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let mut positions = [0usize; 9];

        for column in PriceColumn::required() {
            positions[column as usize] = normalized
                .iter()
                .position(|header| header == column.header())
                .ok_or(column)?;
        }

        Ok(Self { positions })
    }

    pub(crate) fn field<'r>(&self, record: &'r StringRecord, column: PriceColumn) -> &'r str {
        record.get(self.positions[column as usize]).unwrap_or("")
    }
}
