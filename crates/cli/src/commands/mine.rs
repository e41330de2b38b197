use std::path::{Path, PathBuf};

use cartwise_core::config::ConfigOverrides;
use cartwise_core::{
    build_rules, distinct_items, extract_transactions, mine_itemsets, ApplicationError,
    MiningAlgorithm,
};
use clap::Args;
use serde::Serialize;
use uuid::Uuid;

use super::{load_config, CommandError, CommandResult};
use crate::artifact::{read_line_items, write_artifact, RuleSetArtifact};

const COMMAND: &str = "mine";

#[derive(Debug, Clone, Args)]
pub struct MineArgs {
    #[arg(long, help = "JSON array of line-item objects")]
    pub input: PathBuf,
    #[arg(long, help = "Where to write the rule-set artifact")]
    pub output: PathBuf,
    #[arg(long, help = "Override mining.min_support")]
    pub min_support: Option<f64>,
    #[arg(long, help = "Override mining.min_confidence")]
    pub min_confidence: Option<f64>,
    #[arg(long, value_parser = parse_algorithm, help = "apriori | fp_growth")]
    pub algorithm: Option<MiningAlgorithm>,
    #[arg(long, default_value = "order_id", help = "Field holding the order identifier")]
    pub order_field: String,
    #[arg(long, default_value = "item", help = "Field holding the item name")]
    pub item_field: String,
}

impl MineArgs {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            min_support: None,
            min_confidence: None,
            algorithm: None,
            order_field: "order_id".to_string(),
            item_field: "item".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MineReport {
    run_id: Uuid,
    output: String,
    algorithm: MiningAlgorithm,
    min_support: f64,
    min_confidence: f64,
    transactions: usize,
    skipped_records: usize,
    products: usize,
    itemsets: usize,
    rules: usize,
    fingerprint: String,
}

pub fn run(args: &MineArgs, config_path: Option<&Path>) -> CommandResult {
    match execute(args, config_path) {
        Ok(report) => CommandResult::success(COMMAND, report),
        Err(error) => CommandResult::from_error(COMMAND, error),
    }
}

fn execute(args: &MineArgs, config_path: Option<&Path>) -> Result<MineReport, CommandError> {
    let overrides = ConfigOverrides {
        min_support: args.min_support,
        min_confidence: args.min_confidence,
        algorithm: args.algorithm,
        ..ConfigOverrides::default()
    };
    let config = load_config(config_path, overrides)?;

    let input = read_line_items(&args.input, &args.order_field, &args.item_field)
        .map_err(CommandError::Input)?;
    let transactions = extract_transactions(input.records);

    let itemsets = mine_itemsets(&transactions, &config.mining)?;
    let rules = build_rules(&itemsets, config.mining.min_confidence)?;

    let artifact = RuleSetArtifact::new(
        &config.mining,
        transactions.len(),
        distinct_items(&transactions),
        rules,
    );
    write_artifact(&args.output, &artifact)
        .map_err(|error| ApplicationError::Persistence(format!("{error:#}")))?;

    tracing::info!(
        event_name = "cli.mine.completed",
        run_id = %artifact.run_id,
        output = %args.output.display(),
        rules = artifact.rules.len(),
        "rule-set artifact written"
    );

    Ok(MineReport {
        run_id: artifact.run_id,
        output: args.output.display().to_string(),
        algorithm: artifact.algorithm,
        min_support: artifact.min_support,
        min_confidence: artifact.min_confidence,
        transactions: artifact.transaction_count,
        skipped_records: input.skipped,
        products: artifact.products.len(),
        itemsets: itemsets.len(),
        rules: artifact.rules.len(),
        fingerprint: artifact.fingerprint,
    })
}

fn parse_algorithm(value: &str) -> Result<MiningAlgorithm, String> {
    value.parse().map_err(|error: cartwise_core::config::ConfigError| error.to_string())
}
