//! apexmut CLI - Mutation testing for Apex classes.

use std::collections::BTreeSet;
use std::io::stdout;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use regex::Regex;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use apexmut::cli::{Cli, Command, MutantsArgs, ScoreArgs, TypesArgs};
use apexmut::config::Config;
use apexmut::core::{Error, Result};
use apexmut::mutation::{
    GenerationOptions, Mutant, MutantGenerator, MutantStatus, MutationTestingReport, NameFilter,
    ScoreSummary,
};
use apexmut::output::Format;
use apexmut::types::{MethodSignature, TypeDiscoverer, TypeRegistry};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("apexmut=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_default(".")?,
    };
    let format = cli
        .format
        .map(Format::from)
        .unwrap_or_else(|| Format::from(config.output.format));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Command::Mutants(args) => runtime.block_on(run_mutants(args, &config, format)),
        Command::Types(args) => runtime.block_on(run_types(args, &config, format)),
        Command::Score(args) => run_score(args, &config, format),
    }
}

#[derive(Serialize)]
struct CandidateReport {
    source_file: String,
    total: usize,
    mutants: Vec<Mutant>,
}

#[derive(Serialize)]
struct TypeReport<'a> {
    source_file: String,
    methods: Vec<&'a MethodSignature>,
}

#[derive(Serialize)]
struct ScoreReport<'a> {
    source_file: &'a str,
    test_file: &'a str,
    #[serde(flatten)]
    summary: ScoreSummary,
    survivors: Vec<&'a Mutant>,
}

async fn run_mutants(args: MutantsArgs, config: &Config, format: Format) -> Result<()> {
    let (class_name, source) = read_class(&args.source)?;

    let mutator_filter = if args.include.is_empty() && args.exclude.is_empty() {
        config.mutator_filter()?
    } else {
        NameFilter::from_lists(&args.include, &args.exclude)?
    };
    let mut skip_patterns = config.skip_regexes()?;
    for pattern in &args.skip {
        skip_patterns.push(Regex::new(pattern)?);
    }
    let lines: BTreeSet<u32> = if args.lines.is_empty() {
        config.mutation.lines.iter().copied().collect()
    } else {
        args.lines.into_iter().collect()
    };

    let types = discover(&class_name, &source, config, &args.user_class).await?;
    let mut options = GenerationOptions::covering_all(&source)
        .with_mutator_filter(mutator_filter)
        .with_skip_patterns(skip_patterns);
    if !lines.is_empty() {
        options = options.with_allowed_lines(lines);
    }

    let mutations = MutantGenerator::new().compute(&source, &types, &options)?;
    tracing::info!("Generated {} mutants for {}", mutations.len(), class_name);

    let mutants = mutations
        .iter()
        .enumerate()
        .map(|(index, mutation)| {
            let original = mutation.original_text(&source)?;
            Ok(Mutant::from_mutation(&class_name, index, mutation, original))
        })
        .collect::<Result<Vec<_>>>()?;

    let report = CandidateReport {
        source_file: class_name,
        total: mutants.len(),
        mutants,
    };
    format.format(&report, &mut stdout())
}

async fn run_types(args: TypesArgs, config: &Config, format: Format) -> Result<()> {
    let (class_name, source) = read_class(&args.source)?;
    let types = discover(&class_name, &source, config, &args.user_class).await?;
    let report = TypeReport {
        source_file: class_name,
        methods: types.methods(),
    };
    format.format(&report, &mut stdout())
}

fn run_score(args: ScoreArgs, config: &Config, format: Format) -> Result<()> {
    let content = std::fs::read_to_string(&args.report)?;
    let report: MutationTestingReport = serde_json::from_str(&content)?;
    let summary = report.summary();
    let score = summary.score;

    let output = ScoreReport {
        source_file: &report.source_file,
        test_file: &report.test_file,
        summary,
        survivors: report
            .mutants
            .iter()
            .filter(|m| m.status == MutantStatus::Survived)
            .collect(),
    };
    format.format(&output, &mut stdout())?;

    if let Some(min) = args.min_score.or(config.mutation.min_score) {
        if score < min {
            return Err(Error::threshold_violation(
                format!("mutation score {score:.2}% is below the minimum of {min:.2}%"),
                score,
            ));
        }
    }
    Ok(())
}

/// Class name (file stem) and source of a class file.
fn read_class(path: &Path) -> Result<(String, String)> {
    let source = std::fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::InvalidArgument(format!("invalid class file: {}", path.display())))?
        .to_string();
    Ok((name, source))
}

async fn discover(
    class_name: &str,
    source: &str,
    config: &Config,
    extra: &[String],
) -> Result<TypeRegistry> {
    let user_classes = std::iter::once(class_name.to_string())
        .chain(config.types.user_classes.iter().cloned())
        .chain(extra.iter().cloned())
        .collect::<Vec<_>>();
    TypeDiscoverer::with_default_matchers(user_classes)
        .discover(source)
        .await
}
