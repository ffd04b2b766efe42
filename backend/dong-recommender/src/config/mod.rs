use anyhow::{anyhow, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // HTTP server config
    pub http_host: String,
    pub http_port: u16,

    // Artifacts
    pub features_path: String,
    pub growth_model_path: String,
    pub risk_model_path: String,
    pub category_map_path: String,
    pub location_map_path: String,

    /// Comma-separated ONNX input columns; empty means every panel feature column
    pub model_feature_columns: String,

    // CORS
    pub cors_allowed_origins: String,

    // Observability
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("http_host", "0.0.0.0")?
            .set_default("http_port", 8000)?
            .set_default("features_path", "features_panel.csv")?
            .set_default("growth_model_path", "model_growth.onnx")?
            .set_default("risk_model_path", "model_risk.onnx")?
            .set_default("category_map_path", "biz_code_map.csv")?
            .set_default("location_map_path", "dong_map.csv")?
            .set_default("model_feature_columns", "")?
            .set_default("cors_allowed_origins", "*")?
            .set_default("log_format", "text")?
            .add_source(config::Environment::default())
            .build()?;

        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<()> {
        if self.http_port == 0 {
            return Err(anyhow!("HTTP port must be greater than 0"));
        }

        if self.features_path.trim().is_empty() {
            return Err(anyhow!("Feature panel path is required"));
        }

        if self.growth_model_path.trim().is_empty() || self.risk_model_path.trim().is_empty() {
            return Err(anyhow!("Growth and risk model paths are required"));
        }

        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err(anyhow!("LOG_FORMAT must be 'text' or 'json'"));
        }

        Ok(())
    }

    pub fn feature_columns(&self) -> Vec<String> {
        split_list(&self.model_feature_columns)
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        split_list(&self.cors_allowed_origins)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            http_host: "0.0.0.0".to_string(),
            http_port: 8000,
            features_path: "features_panel.csv".to_string(),
            growth_model_path: "model_growth.onnx".to_string(),
            risk_model_path: "model_risk.onnx".to_string(),
            category_map_path: "biz_code_map.csv".to_string(),
            location_map_path: "dong_map.csv".to_string(),
            model_feature_columns: String::new(),
            cors_allowed_origins: "*".to_string(),
            log_format: "text".to_string(),
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut bad_port = test_config();
        bad_port.http_port = 0;
        assert!(bad_port.validate().is_err());

        let mut no_model = test_config();
        no_model.risk_model_path = " ".to_string();
        assert!(no_model.validate().is_err());

        let mut bad_format = test_config();
        bad_format.log_format = "xml".to_string();
        assert!(bad_format.validate().is_err());
    }

    #[test]
    fn test_list_parsing() {
        let mut config = test_config();
        assert!(config.feature_columns().is_empty());

        config.model_feature_columns = "pop_mean, store_cnt,,close_rate ".to_string();
        assert_eq!(
            config.feature_columns(),
            vec!["pop_mean", "store_cnt", "close_rate"]
        );

        config.cors_allowed_origins = "http://localhost:5173, https://example.com".to_string();
        assert_eq!(
            config.allowed_origins(),
            vec!["http://localhost:5173", "https://example.com"]
        );
    }
}
