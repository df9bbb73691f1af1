use crate::domain::Decimal;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub quote_source: QuoteSourceMode,
    pub quote_api_url: String,
    pub quote_csv_dir: Option<String>,
    pub default_monthly_contribution: Decimal,
    pub currency_symbol: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteSourceMode {
    Yahoo,
    Csv,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let quote_source = match env_map
            .get("QUOTE_SOURCE")
            .map(|s| s.as_str())
            .unwrap_or("yahoo")
        {
            "yahoo" => QuoteSourceMode::Yahoo,
            "csv" => QuoteSourceMode::Csv,
            other => {
                return Err(ConfigError::InvalidValue(
                    "QUOTE_SOURCE".to_string(),
                    format!("must be yahoo or csv, got {}", other),
                ))
            }
        };

        let quote_api_url = env_map
            .get("QUOTE_API_URL")
            .cloned()
            .unwrap_or_else(|| "https://query1.finance.yahoo.com".to_string());

        let quote_csv_dir = env_map.get("QUOTE_CSV_DIR").cloned();
        if quote_source == QuoteSourceMode::Csv && quote_csv_dir.is_none() {
            return Err(ConfigError::MissingEnv("QUOTE_CSV_DIR".to_string()));
        }

        let default_monthly_contribution = env_map
            .get("DEFAULT_MONTHLY_CONTRIBUTION")
            .map(|s| s.as_str())
            .unwrap_or("15000")
            .parse::<Decimal>()
            .ok()
            .filter(Decimal::is_positive)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "DEFAULT_MONTHLY_CONTRIBUTION".to_string(),
                    "must be a positive decimal".to_string(),
                )
            })?;

        let currency_symbol = env_map
            .get("CURRENCY_SYMBOL")
            .cloned()
            .unwrap_or_else(|| "¥".to_string());

        Ok(Config {
            port,
            quote_source,
            quote_api_url,
            quote_csv_dir,
            default_monthly_contribution,
            currency_symbol,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            quote_source: QuoteSourceMode::Yahoo,
            quote_api_url: "https://query1.finance.yahoo.com".to_string(),
            quote_csv_dir: None,
            default_monthly_contribution: Decimal::from(15000i64),
            currency_symbol: "¥".to_string(),
        }
    }
}
