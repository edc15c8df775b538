use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "KrishiAdvisor";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix for every environment override read by `AppConfig::from_env`.
const ENV_PREFIX: &str = "KRISHI_";

/// Default number of test-time augmentation passes.
pub const DEFAULT_TTA_PASSES: usize = 5;

/// Default bind address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "krishi_advisor=info,tower_http=warn"
}

/// Get the application data directory
/// ~/KrishiAdvisor/ on all platforms. Falls back to the working
/// directory when no home directory can be resolved (containers).
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get the models directory (ONNX weights, class lists, soil metadata)
pub fn models_dir() -> PathBuf {
    app_data_dir().join("models")
}

// ═══════════════════════════════════════════════════════════
// Runtime configuration
// ═══════════════════════════════════════════════════════════

/// Everything the server needs at start-up.
///
/// Model paths come in primary/fallback pairs: the disease predictor tries
/// the advanced model first and falls back to the basic one.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub model_path: PathBuf,
    pub fallback_model_path: PathBuf,
    pub class_names_path: PathBuf,
    pub fallback_class_names_path: PathBuf,
    pub soil_model_path: PathBuf,
    pub soil_metadata_path: PathBuf,
    pub tta_passes: usize,
    /// Fixed seed for the augmentation RNG. `None` seeds from entropy.
    pub tta_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let models = models_dir();
        Self {
            addr: DEFAULT_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 5000))),
            model_path: models.join("best_model_advanced.onnx"),
            fallback_model_path: models.join("best_model.onnx"),
            class_names_path: models.join("class_names_advanced.txt"),
            fallback_class_names_path: models.join("class_names.txt"),
            soil_model_path: models.join("crop_recommendation_model.onnx"),
            soil_metadata_path: models.join("crop_recommendation_model.json"),
            tta_passes: DEFAULT_TTA_PASSES,
            tta_seed: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

impl AppConfig {
    /// Build a config from `KRISHI_*` environment variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable lookup (tests don't touch the
    /// process environment).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let mut config = Self::default();

        if let Some(v) = get("ADDR") {
            config.addr = parse_value("ADDR", &v)?;
        }
        if let Some(v) = get("MODEL_PATH") {
            config.model_path = PathBuf::from(v);
        }
        if let Some(v) = get("FALLBACK_MODEL_PATH") {
            config.fallback_model_path = PathBuf::from(v);
        }
        if let Some(v) = get("CLASS_NAMES_PATH") {
            config.class_names_path = PathBuf::from(v);
        }
        if let Some(v) = get("FALLBACK_CLASS_NAMES_PATH") {
            config.fallback_class_names_path = PathBuf::from(v);
        }
        if let Some(v) = get("SOIL_MODEL_PATH") {
            config.soil_model_path = PathBuf::from(v);
        }
        if let Some(v) = get("SOIL_METADATA_PATH") {
            config.soil_metadata_path = PathBuf::from(v);
        }
        if let Some(v) = get("TTA_PASSES") {
            let passes: usize = parse_value("TTA_PASSES", &v)?;
            if passes == 0 {
                return Err(ConfigError::InvalidValue {
                    key: format!("{ENV_PREFIX}TTA_PASSES"),
                    value: v,
                });
            }
            config.tta_passes = passes;
        }
        if let Some(v) = get("TTA_SEED") {
            config.tta_seed = Some(parse_value("TTA_SEED", &v)?);
        }

        Ok(config)
    }
}

fn parse_value<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: format!("{ENV_PREFIX}{name}"),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn models_dir_under_app_data() {
        let models = models_dir();
        assert!(models.starts_with(app_data_dir()));
        assert!(models.ends_with("models"));
    }

    #[test]
    fn app_name_is_krishi_advisor() {
        assert_eq!(APP_NAME, "KrishiAdvisor");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }

    #[test]
    fn defaults_without_env() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.addr.port(), 5000);
        assert_eq!(config.tta_passes, DEFAULT_TTA_PASSES);
        assert!(config.tta_seed.is_none());
        assert!(config.model_path.ends_with("best_model_advanced.onnx"));
        assert!(config.fallback_model_path.ends_with("best_model.onnx"));
    }

    #[test]
    fn env_overrides_apply() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("KRISHI_ADDR", "0.0.0.0:5001"),
            ("KRISHI_MODEL_PATH", "/srv/models/plant.onnx"),
            ("KRISHI_TTA_PASSES", "3"),
            ("KRISHI_TTA_SEED", "42"),
        ]))
        .unwrap();

        assert_eq!(config.addr.port(), 5001);
        assert_eq!(config.model_path, PathBuf::from("/srv/models/plant.onnx"));
        assert_eq!(config.tta_passes, 3);
        assert_eq!(config.tta_seed, Some(42));
    }

    #[test]
    fn invalid_addr_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("KRISHI_ADDR", "not-an-addr")]))
            .unwrap_err();
        assert!(err.to_string().contains("KRISHI_ADDR"));
    }

    #[test]
    fn zero_tta_passes_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[("KRISHI_TTA_PASSES", "0")]));
        assert!(result.is_err());
    }
}
