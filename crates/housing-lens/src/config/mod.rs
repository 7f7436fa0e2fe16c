use crate::market::affordability::MortgageTerms;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub data: DataConfig,
    pub market: MarketConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&env_or("APP_ENV", "development"));

        let host = env_or("APP_HOST", "127.0.0.1");
        let port = env_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env_or("APP_LOG_LEVEL", "info");

        let separator = parse_separator(&env_or("APP_DATASET_SEPARATOR", ";"))?;
        let data = DataConfig {
            dataset_path: PathBuf::from(env_or("APP_DATASET_PATH", "data/datos_vivienda.csv")),
            separator,
            geo_path: PathBuf::from(env_or("APP_GEO_PATH", "data/municipios.geojson")),
            geo_name_field: env_or("APP_GEO_NAME_FIELD", "name"),
            history_path: PathBuf::from(env_or(
                "APP_HISTORY_PATH",
                "data/historial_busquedas.csv",
            )),
        };

        let annual_rate_pct = parse_positive("APP_MORTGAGE_RATE_PCT", "3.5")?;
        let term_years = env_or("APP_MORTGAGE_TERM_YEARS", "30")
            .parse::<u32>()
            .ok()
            .filter(|years| *years > 0)
            .ok_or_else(|| ConfigError::InvalidNumber {
                key: "APP_MORTGAGE_TERM_YEARS",
                value: env_or("APP_MORTGAGE_TERM_YEARS", "30"),
            })?;
        let min_annual_income = parse_non_negative("APP_MIN_ANNUAL_INCOME", "1000")?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            data,
            market: MarketConfig {
                mortgage: MortgageTerms {
                    annual_rate_pct,
                    term_years,
                },
                min_annual_income,
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_separator(raw: &str) -> Result<u8, ConfigError> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if ch.is_ascii() => Ok(ch as u8),
        _ => Err(ConfigError::InvalidSeparator {
            value: raw.to_string(),
        }),
    }
}

fn parse_float(key: &'static str, default: &str) -> Result<f64, ConfigError> {
    let raw = env_or(key, default);
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or(ConfigError::InvalidNumber { key, value: raw })
}

fn parse_positive(key: &'static str, default: &str) -> Result<f64, ConfigError> {
    let value = parse_float(key, default)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        })
    }
}

fn parse_non_negative(key: &'static str, default: &str) -> Result<f64, ConfigError> {
    let value = parse_float(key, default)?;
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Locations of the price table, boundary collection, and search history.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub dataset_path: PathBuf,
    pub separator: u8,
    pub geo_path: PathBuf,
    pub geo_name_field: String,
    pub history_path: PathBuf,
}

/// Mortgage assumptions and input floors applied to every query.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub mortgage: MortgageTerms,
    pub min_annual_income: f64,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSeparator { value: String },
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSeparator { value } => write!(
                f,
                "APP_DATASET_SEPARATOR must be a single ASCII character, got '{}'",
                value
            ),
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{} has an out-of-range or non-numeric value '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidSeparator { .. }
            | ConfigError::InvalidNumber { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_DATASET_PATH",
            "APP_DATASET_SEPARATOR",
            "APP_GEO_PATH",
            "APP_GEO_NAME_FIELD",
            "APP_HISTORY_PATH",
            "APP_MORTGAGE_RATE_PCT",
            "APP_MORTGAGE_TERM_YEARS",
            "APP_MIN_ANNUAL_INCOME",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.data.separator, b';');
        assert_eq!(config.data.geo_name_field, "name");
        assert_eq!(config.market.mortgage.annual_rate_pct, 3.5);
        assert_eq!(config.market.mortgage.term_years, 30);
        assert_eq!(config.market.min_annual_income, 1000.0);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn rejects_multi_character_separator() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_DATASET_SEPARATOR", ";;");
        let error = AppConfig::load().expect_err("separator rejected");
        assert!(matches!(error, ConfigError::InvalidSeparator { .. }));
        reset_env();
    }

    #[test]
    fn rejects_zero_mortgage_rate() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_MORTGAGE_RATE_PCT", "0");
        let error = AppConfig::load().expect_err("zero rate rejected");
        assert!(matches!(
            error,
            ConfigError::InvalidNumber {
                key: "APP_MORTGAGE_RATE_PCT",
                ..
            }
        ));
        reset_env();
    }

    #[test]
    fn custom_separator_and_terms_are_read() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_DATASET_SEPARATOR", ",");
        env::set_var("APP_MORTGAGE_TERM_YEARS", "25");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.data.separator, b',');
        assert_eq!(config.market.mortgage.term_years, 25);
        reset_env();
    }
}
