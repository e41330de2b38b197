use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use cartwise_core::config::{AppConfig, ConfigOverrides};
use serde::Serialize;
use toml::Value;

use super::{load_config, CommandResult};

const COMMAND: &str = "config";

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

#[derive(Debug, Serialize)]
struct ConfigReport {
    precedence: &'static str,
    file: Option<String>,
    entries: Vec<ConfigEntry>,
}

/// Effective configuration with the layer each value came from.
pub fn run(config_path: Option<&Path>) -> CommandResult {
    let config = match load_config(config_path, ConfigOverrides::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::from_error(COMMAND, error),
    };

    let config_file_path = detect_config_path(config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let entries = effective_values(&config)
        .into_iter()
        .map(|(key, env_keys, value)| ConfigEntry {
            key,
            value,
            source: field_source(
                key,
                env_keys,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        })
        .collect();

    CommandResult::success(
        COMMAND,
        ConfigReport {
            precedence: "env > file > default",
            file: config_file_path.map(|path| path.display().to_string()),
            entries,
        },
    )
}

type EffectiveValue = (&'static str, &'static [&'static str], String);

fn entry(key: &'static str, env_keys: &'static [&'static str], value: String) -> EffectiveValue {
    (key, env_keys, value)
}

fn effective_values(config: &AppConfig) -> Vec<EffectiveValue> {
    let mining = &config.mining;
    let recommendation = &config.recommendation;
    let max_itemset_len =
        mining.max_itemset_len.map_or_else(|| "<unbounded>".to_string(), |len| len.to_string());
    let seed =
        recommendation.seed.map_or_else(|| "<entropy>".to_string(), |seed| seed.to_string());

    vec![
        entry(
            "mining.min_support",
            &["CARTWISE_MINING_MIN_SUPPORT"],
            mining.min_support.to_string(),
        ),
        entry(
            "mining.min_confidence",
            &["CARTWISE_MINING_MIN_CONFIDENCE"],
            mining.min_confidence.to_string(),
        ),
        entry("mining.algorithm", &["CARTWISE_MINING_ALGORITHM"], mining.algorithm.to_string()),
        entry("mining.max_itemset_len", &["CARTWISE_MINING_MAX_ITEMSET_LEN"], max_itemset_len),
        entry(
            "recommendation.top_n",
            &["CARTWISE_RECOMMENDATION_TOP_N"],
            recommendation.top_n.to_string(),
        ),
        entry(
            "recommendation.diversity",
            &["CARTWISE_RECOMMENDATION_DIVERSITY"],
            recommendation.diversity.to_string(),
        ),
        entry(
            "recommendation.diversity_pool_extra",
            &["CARTWISE_RECOMMENDATION_POOL_EXTRA"],
            recommendation.diversity_pool_extra.to_string(),
        ),
        entry(
            "recommendation.global_rule_limit",
            &["CARTWISE_RECOMMENDATION_GLOBAL_RULE_LIMIT"],
            recommendation.global_rule_limit.to_string(),
        ),
        entry("recommendation.seed", &["CARTWISE_RECOMMENDATION_SEED"], seed),
        entry(
            "logging.level",
            &["CARTWISE_LOGGING_LEVEL", "CARTWISE_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        entry(
            "logging.format",
            &["CARTWISE_LOGGING_FORMAT", "CARTWISE_LOG_FORMAT"],
            format!("{:?}", config.logging.format).to_lowercase(),
        ),
    ]
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from("cartwise.toml"), PathBuf::from("config/cartwise.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let env_key = env_keys
        .iter()
        .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = env_key {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
