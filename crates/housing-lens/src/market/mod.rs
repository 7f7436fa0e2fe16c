pub mod affordability;
pub mod dataset;
pub mod domain;
pub mod geo;
pub mod history;
pub mod recommend;
pub mod report;
pub mod router;
pub mod service;

pub use affordability::{
    monthly_payment, viability_tier, AffordabilityError, AffordabilityMap, AffordabilityResult,
    MortgageTerms,
};
pub use dataset::{DatasetError, PriceDataset};
pub use domain::{HousingType, PriceRecord, ViabilityTier};
pub use geo::{BoundarySet, GeoLoadError, MunicipalityBoundary};
pub use history::{CsvHistoryLog, HistoryEntry, HistoryError, HistoryStore};
pub use recommend::{recommend, RecommendationEntry};
pub use router::housing_router;
pub use service::{HousingQuery, HousingQueryService, QueryError, QueryLimits, QueryOutcome};
