use housing_lens::config::AppConfig;
use housing_lens::error::AppError;
use housing_lens::market::{
    BoundarySet, CsvHistoryLog, HousingQueryService, PriceDataset, QueryError, QueryLimits,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type CsvQueryService = HousingQueryService<CsvHistoryLog>;

/// Loads the price table, the optional boundary file and the history log.
///
/// A missing or malformed boundary file only disables the municipality map; a
/// dataset without its required columns aborts start-up.
pub(crate) fn load_query_service(config: &AppConfig) -> Result<CsvQueryService, AppError> {
    let dataset = PriceDataset::from_path(&config.data.dataset_path, config.data.separator)?;

    let history = CsvHistoryLog::new(config.data.history_path.clone());
    history.create().map_err(QueryError::from)?;

    let limits = QueryLimits {
        min_annual_income: config.market.min_annual_income,
        ..QueryLimits::default()
    };
    let service = HousingQueryService::new(
        Arc::new(dataset),
        Arc::new(history),
        config.market.mortgage,
        limits,
    );

    match BoundarySet::from_path(&config.data.geo_path, &config.data.geo_name_field) {
        Ok(boundaries) if !boundaries.is_empty() => Ok(service.with_boundaries(Arc::new(boundaries))),
        Ok(_) => {
            warn!(
                path = %config.data.geo_path.display(),
                "boundary file has no usable features, using city markers"
            );
            Ok(service)
        }
        Err(err) => {
            warn!(
                path = %config.data.geo_path.display(),
                error = %err,
                "boundary file unavailable, using city markers"
            );
            Ok(service)
        }
    }
}
