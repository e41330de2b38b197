use std::path::{Path, PathBuf};

use anyhow::Context;
use cartwise_core::config::ConfigOverrides;
use cartwise_core::{coerce_basket, shuffler_for, MatchStrategy, RecommendationEngine};
use clap::Args;
use serde::Serialize;
use serde_json::Value;

use super::{load_artifact, load_config, CommandError, CommandResult};

const COMMAND: &str = "recommend";

#[derive(Debug, Clone, Args)]
pub struct RecommendArgs {
    #[arg(long, help = "Rule-set artifact produced by `cartwise mine`")]
    pub rules: PathBuf,
    #[arg(long = "item", help = "Basket item; repeat for several items")]
    pub items: Vec<String>,
    #[arg(long, help = "Basket as a JSON array; numbers and booleans are read as names")]
    pub basket_json: Option<String>,
    #[arg(long, help = "Override recommendation.top_n")]
    pub top_n: Option<usize>,
    #[arg(long, help = "Seed the diversity shuffle for reproducible output")]
    pub seed: Option<u64>,
    #[arg(long, help = "Report which strategy produced each item")]
    pub explain: bool,
}

impl RecommendArgs {
    pub fn new<I, S>(rules: impl Into<PathBuf>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rules: rules.into(),
            items: items.into_iter().map(Into::into).collect(),
            basket_json: None,
            top_n: None,
            seed: None,
            explain: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct ExplainedItem {
    item: String,
    strategy: MatchStrategy,
    reason: &'static str,
}

#[derive(Debug, Serialize)]
struct RecommendReport {
    basket: Vec<String>,
    top_n: usize,
    recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved_by: Option<MatchStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diversified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<Vec<ExplainedItem>>,
}

pub fn run(args: &RecommendArgs, config_path: Option<&Path>) -> CommandResult {
    match execute(args, config_path) {
        Ok(report) => CommandResult::success(COMMAND, report),
        Err(error) => CommandResult::from_error(COMMAND, error),
    }
}

fn execute(
    args: &RecommendArgs,
    config_path: Option<&Path>,
) -> Result<RecommendReport, CommandError> {
    let overrides =
        ConfigOverrides { top_n: args.top_n, seed: args.seed, ..ConfigOverrides::default() };
    let config = load_config(config_path, overrides)?;

    let mut basket = args.items.clone();
    if let Some(raw) = &args.basket_json {
        let values: Vec<Value> = serde_json::from_str(raw)
            .context("--basket-json must be a JSON array")
            .map_err(CommandError::Input)?;
        basket.extend(coerce_basket(&values)?);
    }

    let artifact = load_artifact(&args.rules)?;
    let engine = RecommendationEngine::from_config(&config.recommendation)?;
    let mut shuffler = shuffler_for(&config.recommendation);
    let top_n = config.recommendation.top_n;

    let recommendation =
        engine.recommend_traced(&basket, &artifact.rules, top_n, shuffler.as_mut())?;

    let recommendations = recommendation.item_names();
    let (resolved_by, diversified, explanation) = if args.explain {
        let explained = recommendation
            .items
            .iter()
            .map(|recommended| ExplainedItem {
                item: recommended.item.clone(),
                strategy: recommended.strategy,
                reason: recommended.strategy.description(),
            })
            .collect();
        (Some(recommendation.resolved_by), Some(recommendation.diversified), Some(explained))
    } else {
        (None, None, None)
    };

    Ok(RecommendReport { basket, top_n, recommendations, resolved_by, diversified, explanation })
}
