use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HousingType {
    #[serde(alias = "Nueva", alias = "nueva")]
    New,
    #[serde(alias = "Segunda mano", alias = "segunda mano")]
    Resale,
}

impl HousingType {
    pub const fn ordered() -> [Self; 2] {
        [Self::New, Self::Resale]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Resale => "Resale",
        }
    }

    /// Maps the labels used by the source table (Spanish or English) onto a housing type.
    pub fn from_source_label(raw: &str) -> Option<Self> {
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_lowercase().as_str() {
            "nueva" | "nuevo" | "obra nueva" | "new" => Some(Self::New),
            "segunda mano" | "usada" | "usado" | "resale" | "second hand" => Some(Self::Resale),
            _ => None,
        }
    }
}

impl fmt::Display for HousingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HousingType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_source_label(value)
            .ok_or_else(|| format!("'{value}' is not a known housing type (new, resale)"))
    }
}

/// One row of the price table. Numeric fields are `None` when the source value did not parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRecord {
    pub city: String,
    pub year: Option<i32>,
    pub housing_type: HousingType,
    pub price_per_sqm: Option<f64>,
    pub purchase_value: Option<f64>,
    pub annual_variation_pct: Option<f64>,
    pub five_year_projection_pct: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl PriceRecord {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViabilityTier {
    Viable,
    Moderate,
    NotViable,
    Unknown,
}

impl ViabilityTier {
    pub const VIABLE_BELOW_PCT: f64 = 30.0;
    pub const MODERATE_BELOW_PCT: f64 = 50.0;

    pub const fn ordered() -> [Self; 4] {
        [Self::Viable, Self::Moderate, Self::NotViable, Self::Unknown]
    }

    /// Half-open ranges: [0, 30) viable, [30, 50) moderate, [50, inf) not viable.
    pub fn from_income_fraction(income_fraction_pct: f64) -> Self {
        if income_fraction_pct < Self::VIABLE_BELOW_PCT {
            Self::Viable
        } else if income_fraction_pct < Self::MODERATE_BELOW_PCT {
            Self::Moderate
        } else {
            Self::NotViable
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Viable => "Viable",
            Self::Moderate => "Moderate",
            Self::NotViable => "Not viable",
            Self::Unknown => "Unknown",
        }
    }

    pub const fn legend_color(self) -> &'static str {
        match self {
            Self::Viable => "green",
            Self::Moderate => "orange",
            Self::NotViable => "red",
            Self::Unknown => "gray",
        }
    }
}

/// Legend row handed to map renderers.
#[derive(Debug, Clone, Serialize)]
pub struct TierLegendEntry {
    pub tier: ViabilityTier,
    pub label: &'static str,
    pub color: &'static str,
}

pub fn tier_legend() -> Vec<TierLegendEntry> {
    ViabilityTier::ordered()
        .into_iter()
        .map(|tier| TierLegendEntry {
            tier,
            label: tier.label(),
            color: tier.legend_color(),
        })
        .collect()
}

/// Mean over the present values; `None` when nothing is present.
pub(crate) fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}
