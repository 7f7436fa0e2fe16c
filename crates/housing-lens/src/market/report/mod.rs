//! Presentation-ready summaries of a single city: headline indicators, chart series,
//! price markers, and profile guidance. Renderers consume these as plain data.

mod charts;
mod guidance;
mod indicators;

pub use charts::{
    price_distribution, price_markers, price_trends, CityMarkerMap, HistogramSeries,
    PriceHistogram, PriceMarker, PriceMomentum, TrendPoint, DISTRIBUTION_BINS,
};
pub use guidance::Guidance;
pub use indicators::{CityIndicators, HousingTypeIndicators};
