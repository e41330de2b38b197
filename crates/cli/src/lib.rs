pub mod artifact;
pub mod commands;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use cartwise_core::config::{AppConfig, LoadOptions};
use clap::{Parser, Subcommand};

use commands::mine::MineArgs;
use commands::products::ProductsArgs;
use commands::recommend::RecommendArgs;
use commands::rules::RulesArgs;

#[derive(Debug, Parser)]
#[command(
    name = "cartwise",
    about = "Cartwise basket-recommendation CLI",
    long_about = "Mine association rules from order line items and serve basket recommendations from the mined rule set.",
    after_help = "Examples:\n  cartwise mine --input line_items.json --output rules.json\n  cartwise recommend --rules rules.json --item \"WHITE METAL LANTERN\" --explain\n  cartwise rules --rules rules.json --limit 5"
)]
pub struct Cli {
    #[arg(
        long = "config",
        global = true,
        help = "Config file (defaults to cartwise.toml or config/cartwise.toml)"
    )]
    config_path: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Mine frequent itemsets and association rules into a rule-set artifact")]
    Mine(MineArgs),
    #[command(about = "Recommend items for a basket from a rule-set artifact")]
    Recommend(RecommendArgs),
    #[command(about = "List the highest-ranked rules of a rule-set artifact")]
    Rules(RulesArgs),
    #[command(about = "List the products a basket can be built from")]
    Products(ProductsArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

fn init_logging(config_path: Option<&Path>) {
    use cartwise_core::config::LogFormat::*;
    use tracing::Level;

    // A broken config is reported by the command itself; logging falls back to defaults.
    let config = AppConfig::load(LoadOptions {
        config_path: config_path.map(Path::to_path_buf),
        ..LoadOptions::default()
    })
    .unwrap_or_default();
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);
    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let config_path = cli.config_path.as_deref();
    init_logging(config_path);

    let result = match &cli.command {
        Command::Mine(args) => commands::mine::run(args, config_path),
        Command::Recommend(args) => commands::recommend::run(args, config_path),
        Command::Rules(args) => commands::rules::run(args),
        Command::Products(args) => commands::products::run(args),
        Command::Config => commands::config::run(config_path),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn repeated_item_flags_build_the_basket() {
        let cli = Cli::try_parse_from([
            "cartwise",
            "recommend",
            "--rules",
            "rules.json",
            "--item",
            "a",
            "--item",
            "b",
            "--top-n",
            "2",
        ])
        .unwrap();

        let Command::Recommend(args) = cli.command else {
            panic!("expected recommend subcommand");
        };
        assert_eq!(args.items, vec!["a", "b"]);
        assert_eq!(args.top_n, Some(2));
    }

    #[test]
    fn algorithm_flag_accepts_hyphenated_name() {
        let cli = Cli::try_parse_from([
            "cartwise",
            "--config",
            "custom.toml",
            "mine",
            "--input",
            "items.json",
            "--output",
            "rules.json",
            "--algorithm",
            "fp-growth",
        ])
        .unwrap();

        assert_eq!(cli.config_path.as_deref(), Some(Path::new("custom.toml")));
        let Command::Mine(args) = cli.command else {
            panic!("expected mine subcommand");
        };
        assert_eq!(args.algorithm, Some(cartwise_core::MiningAlgorithm::FpGrowth));
        assert_eq!(args.order_field, "order_id");
    }
}
