//! CLI implementation using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::output::Format;

/// apexmut - Mutation testing for Apex classes.
#[derive(Parser)]
#[command(name = "apexmut")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (defaults to the configured format)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate mutant candidates for a class without executing them
    #[command(alias = "gen")]
    Mutants(MutantsArgs),

    /// Show the method signatures discovered in a class
    Types(TypesArgs),

    /// Summarize a saved mutation testing report
    Score(ScoreArgs),
}

#[derive(Args)]
pub struct MutantsArgs {
    /// Apex class file (.cls)
    #[arg(short, long)]
    pub source: PathBuf,

    /// Only mutate these lines (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub lines: Vec<u32>,

    /// Only run these mutators (comma-separated)
    #[arg(short, long, value_delimiter = ',', conflicts_with = "exclude")]
    pub include: Vec<String>,

    /// Never run these mutators (comma-separated)
    #[arg(short = 'x', long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Skip candidates whose original text matches this regex (repeatable)
    #[arg(long)]
    pub skip: Vec<String>,

    /// Extra names to treat as user-defined classes (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub user_class: Vec<String>,
}

#[derive(Args)]
pub struct TypesArgs {
    /// Apex class file (.cls)
    #[arg(short, long)]
    pub source: PathBuf,

    /// Extra names to treat as user-defined classes (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub user_class: Vec<String>,
}

#[derive(Args)]
pub struct ScoreArgs {
    /// Saved report (JSON)
    #[arg(short, long)]
    pub report: PathBuf,

    /// Fail when the mutation score is below this percentage
    #[arg(long)]
    pub min_score: Option<f64>,
}

/// Output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    #[value(alias = "md")]
    Markdown,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => Format::Json,
            OutputFormat::Markdown => Format::Markdown,
            OutputFormat::Text => Format::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_mutants_args() {
        let cli = Cli::parse_from([
            "apexmut",
            "mutants",
            "--source",
            "Calculator.cls",
            "--lines",
            "4,7",
            "--include",
            "NegationMutator,SwitchMutator",
            "-f",
            "json",
        ]);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Command::Mutants(args) => {
                assert_eq!(args.lines, vec![4, 7]);
                assert_eq!(args.include, vec!["NegationMutator", "SwitchMutator"]);
                assert!(args.exclude.is_empty());
            }
            _ => panic!("expected mutants"),
        }
    }

    #[test]
    fn test_include_conflicts_with_exclude() {
        let result = Cli::try_parse_from([
            "apexmut",
            "mutants",
            "-s",
            "A.cls",
            "-i",
            "NegationMutator",
            "-x",
            "SwitchMutator",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_score_args() {
        let cli = Cli::parse_from(["apexmut", "score", "-r", "report.json", "--min-score", "75"]);
        match cli.command {
            Command::Score(args) => assert_eq!(args.min_score, Some(75.0)),
            _ => panic!("expected score"),
        }
    }

    #[test]
    fn test_markdown_alias() {
        let cli = Cli::parse_from(["apexmut", "-f", "md", "types", "-s", "A.cls"]);
        assert_eq!(cli.format, Some(OutputFormat::Markdown));
    }
}
