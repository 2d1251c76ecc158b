//! Vellum CLI
//!
//! Reads SVG path data from the command line, runs one operation and prints
//! the resulting path data.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use vellum_path::{BooleanOptions, FillRule, Item, PathItem};

use crate::config::VellumConfig;

#[derive(Parser)]
#[command(name = "vellum")]
#[command(about = "Boolean operations on SVG path data", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./vellum.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Area covered by either operand
    Unite(BinaryArgs),
    /// Area covered by both operands
    Intersect(BinaryArgs),
    /// Area of the first operand outside the second
    Subtract(BinaryArgs),
    /// Area covered by exactly one operand
    Exclude(BinaryArgs),
    /// Parts of the first operand inside and outside the second
    Divide(BinaryArgs),
    /// Remove self-crossings and overlaps
    Resolve(UnaryArgs),
    /// Orient contours so holes run against their containers
    Reorient(ReorientArgs),
    /// Print the signed area
    Area(UnaryArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum FillRuleArg {
    Nonzero,
    Evenodd,
}

impl From<FillRuleArg> for FillRule {
    fn from(arg: FillRuleArg) -> Self {
        match arg {
            FillRuleArg::Nonzero => FillRule::NonZero,
            FillRuleArg::Evenodd => FillRule::EvenOdd,
        }
    }
}

#[derive(Args)]
struct UnaryArgs {
    /// Path data of the operand
    #[arg(long)]
    a: String,

    /// Fill rule of every operand
    #[arg(long, value_enum)]
    fill_rule: Option<FillRuleArg>,
}

#[derive(Args)]
struct BinaryArgs {
    #[command(flatten)]
    first: UnaryArgs,

    /// Path data of the second operand
    #[arg(long)]
    b: String,

    /// Split the first outline instead of tracing areas
    #[arg(long)]
    no_trace: bool,

    /// Treat the first operand as a stroke
    #[arg(long)]
    stroke: bool,
}

#[derive(Args)]
struct ReorientArgs {
    #[command(flatten)]
    operand: UnaryArgs,

    /// Make outer contours run counter-clockwise
    #[arg(long)]
    counter_clockwise: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = VellumConfig::load(cli.config.as_deref())?;

    let level = match cli.verbose {
        0 => config.log.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level '{}'", level))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    debug!("loaded configuration: {:?}", config);

    let precision = config.output.precision;
    match cli.command {
        Commands::Unite(args) => run_binary(&args, &config, precision, |a, b, o| {
            Item::Path(a.unite(b, o))
        }),
        Commands::Intersect(args) => run_binary(&args, &config, precision, |a, b, o| {
            Item::Path(a.intersect(b, o))
        }),
        Commands::Subtract(args) => run_binary(&args, &config, precision, |a, b, o| {
            Item::Path(a.subtract(b, o))
        }),
        Commands::Exclude(args) => run_binary(&args, &config, precision, |a, b, o| {
            Item::Path(a.exclude(b, o))
        }),
        Commands::Divide(args) => {
            run_binary(&args, &config, precision, |a, b, o| a.divide(b, o))
        }
        Commands::Resolve(args) => {
            let mut item = load_operand(&args, "a")?;
            item.resolve_crossings();
            print_item(&Item::Path(item), precision);
            Ok(())
        }
        Commands::Reorient(args) => {
            let mut item = load_operand(&args.operand, "a")?;
            let non_zero = item.fill_rule() == FillRule::NonZero;
            item.reorient(non_zero, Some(!args.counter_clockwise));
            print_item(&Item::Path(item), precision);
            Ok(())
        }
        Commands::Area(args) => {
            let item = load_operand(&args, "a")?;
            println!("{}", item.area());
            Ok(())
        }
    }
}

fn load_operand(args: &UnaryArgs, name: &str) -> Result<PathItem> {
    parse_operand(&args.a, name, args.fill_rule)
}

fn parse_operand(data: &str, name: &str, fill_rule: Option<FillRuleArg>) -> Result<PathItem> {
    let mut item = PathItem::from_svg_path_data(data)
        .with_context(|| format!("Failed to parse path data of --{}", name))?;
    if let Some(fill_rule) = fill_rule {
        item.set_fill_rule(fill_rule.into());
    }
    Ok(item)
}

fn load_operands(args: &BinaryArgs) -> Result<(PathItem, PathItem)> {
    let a = load_operand(&args.first, "a")?;
    let b = parse_operand(&args.b, "b", args.first.fill_rule)?;
    Ok((a, b))
}

fn run_binary(
    args: &BinaryArgs,
    config: &VellumConfig,
    precision: usize,
    op: impl FnOnce(&PathItem, &PathItem, &BooleanOptions) -> Item,
) -> Result<()> {
    let (a, b) = load_operands(args)?;
    let options = BooleanOptions {
        insert: false,
        trace: config.boolean.trace && !args.no_trace,
        stroke: config.boolean.stroke || args.stroke,
    };
    let result = op(&a, &b, &options);
    print_item(&result, precision);
    println!("area: {}", result.area());
    Ok(())
}

/// Prints path data, one line per path item
fn print_item(item: &Item, precision: usize) {
    match item {
        Item::Path(path) => println!("{}", path.to_svg_path_data(precision)),
        Item::Group(group) => {
            for child in &group.children {
                print_item(child, precision);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_args(argv: &[&str]) -> BinaryArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Unite(args) => args,
            _ => panic!("expected the unite command"),
        }
    }

    #[test]
    fn test_fill_rule_applies_to_both_operands() {
        let args = binary_args(&[
            "vellum",
            "unite",
            "--a",
            "M0,0h10v10h-10z",
            "--b",
            "M5,5h10v10h-10z",
            "--fill-rule",
            "evenodd",
        ]);
        let (a, b) = load_operands(&args).unwrap();
        assert_eq!(a.fill_rule(), FillRule::EvenOdd);
        assert_eq!(b.fill_rule(), FillRule::EvenOdd);
    }

    #[test]
    fn test_default_fill_rule_is_kept() {
        let args = binary_args(&["vellum", "unite", "--a", "M0,0h10v10z", "--b", "M0,0h5v5z"]);
        let (a, b) = load_operands(&args).unwrap();
        assert_eq!(a.fill_rule(), FillRule::NonZero);
        assert_eq!(b.fill_rule(), FillRule::NonZero);
    }

    #[test]
    fn test_bad_path_data_names_the_operand() {
        let args = binary_args(&["vellum", "unite", "--a", "M0,0h10v10z", "--b", "L5,5"]);
        let err = load_operands(&args).unwrap_err();
        assert!(err.to_string().contains("--b"));
    }
}
