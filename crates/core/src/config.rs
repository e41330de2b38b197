use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::{validate_threshold, validate_top_n};
use crate::recommendation::{
    DEFAULT_DIVERSITY_POOL_EXTRA, DEFAULT_GLOBAL_RULE_LIMIT, DEFAULT_TOP_N,
};

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub mining: MiningConfig,
    pub recommendation: RecommendationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MiningConfig {
    pub min_support: f64,
    pub min_confidence: f64,
    pub algorithm: MiningAlgorithm,
    /// Widest itemset the miner will emit. `None` means unbounded.
    pub max_itemset_len: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecommendationConfig {
    pub top_n: usize,
    /// `false` disables both shuffle points and keeps ranked order everywhere.
    pub diversity: bool,
    /// Extra slots beyond `top_n` that make up the strict-match diversity pool.
    pub diversity_pool_extra: usize,
    /// How many highest-support rules feed the global popularity fallback.
    pub global_rule_limit: usize,
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiningAlgorithm {
    Apriori,
    FpGrowth,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub min_support: Option<f64>,
    pub min_confidence: Option<f64>,
    pub algorithm: Option<MiningAlgorithm>,
    pub top_n: Option<usize>,
    pub seed: Option<u64>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            min_support: 0.005,
            min_confidence: 0.2,
            algorithm: MiningAlgorithm::FpGrowth,
            max_itemset_len: None,
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            diversity: true,
            diversity_pool_extra: DEFAULT_DIVERSITY_POOL_EXTRA,
            global_rule_limit: DEFAULT_GLOBAL_RULE_LIMIT,
            seed: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mining: MiningConfig::default(),
            recommendation: RecommendationConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl MiningConfig {
    pub fn new(min_support: f64, min_confidence: f64) -> Self {
        Self { min_support, min_confidence, ..Self::default() }
    }

    pub fn with_algorithm(mut self, algorithm: MiningAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_max_itemset_len(mut self, max_itemset_len: usize) -> Self {
        self.max_itemset_len = Some(max_itemset_len);
        self
    }
}

impl std::str::FromStr for MiningAlgorithm {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "apriori" => Ok(Self::Apriori),
            "fp_growth" | "fpgrowth" => Ok(Self::FpGrowth),
            other => Err(ConfigError::Validation(format!(
                "unsupported mining algorithm `{other}` (expected apriori|fp_growth)"
            ))),
        }
    }
}

impl std::fmt::Display for MiningAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Apriori => f.write_str("apriori"),
            Self::FpGrowth => f.write_str("fp_growth"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("cartwise.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(mining) = patch.mining {
            if let Some(min_support) = mining.min_support {
                self.mining.min_support = min_support;
            }
            if let Some(min_confidence) = mining.min_confidence {
                self.mining.min_confidence = min_confidence;
            }
            if let Some(algorithm) = mining.algorithm {
                self.mining.algorithm = algorithm;
            }
            if let Some(max_itemset_len) = mining.max_itemset_len {
                self.mining.max_itemset_len = Some(max_itemset_len);
            }
        }

        if let Some(recommendation) = patch.recommendation {
            if let Some(top_n) = recommendation.top_n {
                self.recommendation.top_n = top_n;
            }
            if let Some(diversity) = recommendation.diversity {
                self.recommendation.diversity = diversity;
            }
            if let Some(extra) = recommendation.diversity_pool_extra {
                self.recommendation.diversity_pool_extra = extra;
            }
            if let Some(limit) = recommendation.global_rule_limit {
                self.recommendation.global_rule_limit = limit;
            }
            if let Some(seed) = recommendation.seed {
                self.recommendation.seed = Some(seed);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CARTWISE_MINING_MIN_SUPPORT") {
            self.mining.min_support = parse_env("CARTWISE_MINING_MIN_SUPPORT", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_MINING_MIN_CONFIDENCE") {
            self.mining.min_confidence = parse_env("CARTWISE_MINING_MIN_CONFIDENCE", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_MINING_ALGORITHM") {
            self.mining.algorithm = value.parse()?;
        }
        if let Some(value) = read_env("CARTWISE_MINING_MAX_ITEMSET_LEN") {
            self.mining.max_itemset_len =
                Some(parse_env("CARTWISE_MINING_MAX_ITEMSET_LEN", &value)?);
        }

        if let Some(value) = read_env("CARTWISE_RECOMMENDATION_TOP_N") {
            self.recommendation.top_n = parse_env("CARTWISE_RECOMMENDATION_TOP_N", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_RECOMMENDATION_DIVERSITY") {
            self.recommendation.diversity =
                parse_env("CARTWISE_RECOMMENDATION_DIVERSITY", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_RECOMMENDATION_POOL_EXTRA") {
            self.recommendation.diversity_pool_extra =
                parse_env("CARTWISE_RECOMMENDATION_POOL_EXTRA", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_RECOMMENDATION_GLOBAL_RULE_LIMIT") {
            self.recommendation.global_rule_limit =
                parse_env("CARTWISE_RECOMMENDATION_GLOBAL_RULE_LIMIT", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_RECOMMENDATION_SEED") {
            self.recommendation.seed = Some(parse_env("CARTWISE_RECOMMENDATION_SEED", &value)?);
        }

        let log_level =
            read_env("CARTWISE_LOGGING_LEVEL").or_else(|| read_env("CARTWISE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CARTWISE_LOGGING_FORMAT").or_else(|| read_env("CARTWISE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(min_support) = overrides.min_support {
            self.mining.min_support = min_support;
        }
        if let Some(min_confidence) = overrides.min_confidence {
            self.mining.min_confidence = min_confidence;
        }
        if let Some(algorithm) = overrides.algorithm {
            self.mining.algorithm = algorithm;
        }
        if let Some(top_n) = overrides.top_n {
            self.recommendation.top_n = top_n;
        }
        if let Some(seed) = overrides.seed {
            self.recommendation.seed = Some(seed);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_mining(&self.mining)?;
        validate_recommendation(&self.recommendation)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("cartwise.toml"), PathBuf::from("config/cartwise.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_mining(mining: &MiningConfig) -> Result<(), ConfigError> {
    validate_threshold("mining.min_support", mining.min_support)
        .map_err(|error| ConfigError::Validation(error.to_string()))?;
    validate_threshold("mining.min_confidence", mining.min_confidence)
        .map_err(|error| ConfigError::Validation(error.to_string()))?;

    if mining.max_itemset_len == Some(0) {
        return Err(ConfigError::Validation(
            "mining.max_itemset_len must be greater than zero when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_recommendation(recommendation: &RecommendationConfig) -> Result<(), ConfigError> {
    validate_top_n(recommendation.top_n).map_err(|_| {
        ConfigError::Validation("recommendation.top_n must be greater than zero".to_string())
    })?;

    if recommendation.global_rule_limit == 0 {
        return Err(ConfigError::Validation(
            "recommendation.global_rule_limit must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    mining: Option<MiningPatch>,
    recommendation: Option<RecommendationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct MiningPatch {
    min_support: Option<f64>,
    min_confidence: Option<f64>,
    algorithm: Option<MiningAlgorithm>,
    max_itemset_len: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationPatch {
    top_n: Option<usize>,
    diversity: Option<bool>,
    diversity_pool_extra: Option<usize>,
    global_rule_limit: Option<usize>,
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
