use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use super::{load_artifact, CommandResult};

const COMMAND: &str = "products";

#[derive(Debug, Clone, Args)]
pub struct ProductsArgs {
    #[arg(long, help = "Rule-set artifact produced by `cartwise mine`")]
    pub rules: PathBuf,
}

#[derive(Debug, Serialize)]
struct ProductsReport {
    count: usize,
    products: Vec<String>,
}

/// Lists the product names a basket can be assembled from.
pub fn run(args: &ProductsArgs) -> CommandResult {
    match load_artifact(&args.rules) {
        Ok(artifact) => {
            let products = artifact.catalog();
            CommandResult::success(COMMAND, ProductsReport { count: products.len(), products })
        }
        Err(error) => CommandResult::from_error(COMMAND, error),
    }
}
