use std::path::PathBuf;

use cartwise_core::{AssociationRule, MiningAlgorithm};
use clap::Args;
use serde::Serialize;
use uuid::Uuid;

use super::{load_artifact, CommandResult};

const COMMAND: &str = "rules";

#[derive(Debug, Clone, Args)]
pub struct RulesArgs {
    #[arg(long, help = "Rule-set artifact produced by `cartwise mine`")]
    pub rules: PathBuf,
    #[arg(long, default_value_t = 10, help = "How many of the highest-ranked rules to list")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
struct RulesReport<'a> {
    run_id: Uuid,
    algorithm: MiningAlgorithm,
    transaction_count: usize,
    fingerprint: &'a str,
    total_rules: usize,
    rules: &'a [AssociationRule],
}

pub fn run(args: &RulesArgs) -> CommandResult {
    let artifact = match load_artifact(&args.rules) {
        Ok(artifact) => artifact,
        Err(error) => return CommandResult::from_error(COMMAND, error),
    };

    CommandResult::success(
        COMMAND,
        RulesReport {
            run_id: artifact.run_id,
            algorithm: artifact.algorithm,
            transaction_count: artifact.transaction_count,
            fingerprint: &artifact.fingerprint,
            total_rules: artifact.rules.len(),
            rules: artifact.rules.top(args.limit),
        },
    )
}
