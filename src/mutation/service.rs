//! End-to-end mutation testing of one class against its test class.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::progress::{ProgressCallback, ProgressEvent, ProgressStage};
use crate::core::{Error, Result};
use crate::remote::{ApexClass, RemoteExecution, SchemaDescriber, TestOutcome, TestRunResult};
use crate::types::{SchemaMatcher, TypeDiscoverer, TypeRegistry};

use super::classifier::{ClassifierChain, Verdict};
use super::generator::{GenerationOptions, MutantGenerator, NameFilter};
use super::mutant::{mutation_score, Mutant, MutantStatus, ScoreSummary};
use super::Mutation;

/// Covered line → test methods exercising it.
pub type CoverageMap = BTreeMap<u32, BTreeSet<String>>;

/// What to mutate and how to narrow the run.
#[derive(Debug, Clone, Default)]
pub struct MutationTestingOptions {
    /// Class under test.
    pub class_name: String,
    /// Test class exercising it.
    pub test_class_name: String,
    /// Which mutators run.
    pub mutator_filter: Option<NameFilter>,
    /// Which test methods count towards coverage.
    pub test_method_filter: Option<NameFilter>,
    /// Candidates whose original text matches are skipped.
    pub skip_patterns: Vec<Regex>,
    /// Optional restriction on mutated lines.
    pub allowed_lines: Option<BTreeSet<u32>>,
    /// Extra names to treat as user-defined classes.
    pub user_classes: Vec<String>,
}

impl MutationTestingOptions {
    pub fn new(class_name: impl Into<String>, test_class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            test_class_name: test_class_name.into(),
            ..Default::default()
        }
    }

    pub fn with_mutator_filter(mut self, filter: Option<NameFilter>) -> Self {
        self.mutator_filter = filter;
        self
    }

    pub fn with_test_method_filter(mut self, filter: Option<NameFilter>) -> Self {
        self.test_method_filter = filter;
        self
    }

    pub fn with_skip_patterns(mut self, patterns: Vec<Regex>) -> Self {
        self.skip_patterns = patterns;
        self
    }

    pub fn with_allowed_lines(mut self, lines: Option<BTreeSet<u32>>) -> Self {
        self.allowed_lines = lines;
        self
    }

    pub fn with_user_classes(mut self, names: Vec<String>) -> Self {
        self.user_classes = names;
        self
    }
}

/// Result of a mutation testing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationTestingReport {
    pub source_file: String,
    pub source_file_content: String,
    pub test_file: String,
    pub mutants: Vec<Mutant>,
    /// Non-fatal problems, e.g. a failed rollback.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl MutationTestingReport {
    /// Mutation score in percent.
    pub fn score(&self) -> f64 {
        mutation_score(&self.mutants)
    }

    /// Counts per status and mutator.
    pub fn summary(&self) -> ScoreSummary {
        ScoreSummary::from_mutants(&self.mutants)
    }
}

/// Drives the whole pipeline: fetch, discover types, verify, measure
/// coverage, generate, execute every mutant, roll back.
///
/// Mutants run strictly one after another since each deploy overwrites
/// the single remote copy of the class.
pub struct MutationTestingService {
    remote: Arc<dyn RemoteExecution>,
    schema: Option<Arc<dyn SchemaDescriber>>,
    options: MutationTestingOptions,
    generator: MutantGenerator,
    classifier: ClassifierChain,
    progress: Option<ProgressCallback>,
}

impl MutationTestingService {
    pub fn new(remote: Arc<dyn RemoteExecution>, options: MutationTestingOptions) -> Self {
        Self {
            remote,
            schema: None,
            options,
            generator: MutantGenerator::new(),
            classifier: ClassifierChain::default(),
            progress: None,
        }
    }

    /// Resolve entity field types through a schema describer.
    pub fn with_schema(mut self, schema: Arc<dyn SchemaDescriber>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Use a custom generator.
    pub fn with_generator(mut self, generator: MutantGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Use a custom classification chain.
    pub fn with_classifier(mut self, classifier: ClassifierChain) -> Self {
        self.classifier = classifier;
        self
    }

    /// Observe progress events.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Run the pipeline.
    pub async fn process(&self) -> Result<MutationTestingReport> {
        let class_name = &self.options.class_name;
        let test_class_name = &self.options.test_class_name;

        self.emit(ProgressStage::FetchSource, format!("Reading {class_name}"));
        let class = self.remote.read(class_name).await.map_err(|e| {
            Error::preflight(format!("Unable to read class {class_name}: {}", e.message()))
        })?;

        self.emit(ProgressStage::DiscoverTypes, "Discovering types");
        let types = self.discover_types(&class).await?;

        self.emit(ProgressStage::VerifyClass, format!("Compiling {class_name}"));
        self.remote.update(&class).await.map_err(|e| {
            Error::preflight(format!("Class {class_name} does not compile: {}", e.message()))
        })?;

        self.emit(ProgressStage::VerifyTestClass, format!("Compiling {test_class_name}"));
        let test_class = self.remote.read(test_class_name).await.map_err(|e| {
            Error::preflight(format!(
                "Unable to read test class {test_class_name}: {}",
                e.message()
            ))
        })?;
        self.remote.update(&test_class).await.map_err(|e| {
            Error::preflight(format!(
                "Test class {test_class_name} does not compile: {}",
                e.message()
            ))
        })?;

        self.emit(ProgressStage::Coverage, format!("Running {test_class_name}"));
        let coverage = self.baseline_coverage().await?;

        self.emit(ProgressStage::Generate, "Generating mutants");
        let mutations = self.generate(&class, &types, &coverage)?;
        tracing::info!(
            "Generated {} mutants for {} covered lines of {}",
            mutations.len(),
            coverage.len(),
            class_name
        );

        let outcome = self.run_mutants(&class, &mutations, &coverage).await;

        self.emit(ProgressStage::Rollback, format!("Restoring {class_name}"));
        let mut warnings = Vec::new();
        if let Err(e) = self.remote.update(&class).await {
            let warning = format!("Failed to restore original {class_name}: {}", e.message());
            tracing::warn!("{}", warning);
            warnings.push(warning);
        }

        let mutants = outcome?;
        let report = MutationTestingReport {
            source_file: class.name.clone(),
            source_file_content: class.body.clone(),
            test_file: test_class.name.clone(),
            mutants,
            warnings,
        };
        self.emit(
            ProgressStage::Done,
            format!("Mutation score {:.2}%", report.score()),
        );
        Ok(report)
    }

    async fn discover_types(&self, class: &ApexClass) -> Result<TypeRegistry> {
        let user_classes = std::iter::once(class.name.clone())
            .chain(self.options.user_classes.iter().cloned())
            .collect::<Vec<_>>();
        let mut discoverer = TypeDiscoverer::with_default_matchers(user_classes);
        if let Some(schema) = &self.schema {
            discoverer = discoverer.with_matcher(Box::new(SchemaMatcher::new(schema.clone())));
        }
        discoverer.discover(&class.body).await
    }

    async fn baseline_coverage(&self) -> Result<CoverageMap> {
        let test_class_name = &self.options.test_class_name;
        let baseline = self
            .remote
            .baseline_coverage(test_class_name)
            .await
            .map_err(|e| {
                Error::preflight(format!(
                    "Unable to run test class {test_class_name}: {}",
                    e.message()
                ))
            })?;

        if baseline.outcome != TestOutcome::Passed || baseline.failing > 0 {
            return Err(Error::preflight(format!(
                "Test class {test_class_name} does not pass: {} of {} tests failing",
                baseline.failing, baseline.tests_ran
            )));
        }
        if baseline.tests_ran == 0 {
            return Err(Error::preflight(format!(
                "No test method of {test_class_name} was executed"
            )));
        }

        let coverage = filter_coverage(
            baseline.per_line_test_methods,
            self.options.test_method_filter.as_ref(),
        );
        if coverage.is_empty() {
            return Err(Error::preflight(format!(
                "No line of {} is covered by {test_class_name}",
                self.options.class_name
            )));
        }
        Ok(coverage)
    }

    fn generate(
        &self,
        class: &ApexClass,
        types: &TypeRegistry,
        coverage: &CoverageMap,
    ) -> Result<Vec<Mutation>> {
        let mut options = GenerationOptions::new(coverage.keys().copied().collect())
            .with_mutator_filter(self.options.mutator_filter.clone())
            .with_skip_patterns(self.options.skip_patterns.clone());
        if let Some(lines) = &self.options.allowed_lines {
            options = options.with_allowed_lines(lines.clone());
        }

        let mutations = self.generator.compute(&class.body, types, &options)?;
        if mutations.is_empty() {
            return Err(Error::preflight(format!(
                "No mutant generated for {} on its covered lines",
                class.name
            )));
        }
        Ok(mutations)
    }

    async fn run_mutants(
        &self,
        class: &ApexClass,
        mutations: &[Mutation],
        coverage: &CoverageMap,
    ) -> Result<Vec<Mutant>> {
        let total = mutations.len();
        let mut mutants = Vec::with_capacity(total);

        for (index, mutation) in mutations.iter().enumerate() {
            let body = self.generator.mutate(&class.body, mutation)?;
            let original = mutation.original_text(&class.body)?;
            let test_methods: Vec<String> = coverage
                .get(&mutation.line())
                .map(|methods| methods.iter().cloned().collect())
                .unwrap_or_default();

            let verdict = self.execute(class, body, &test_methods).await;
            tracing::debug!(
                "{} at line {}: '{}' -> '{}' {}",
                mutation.mutator_name,
                mutation.line(),
                original,
                mutation.replacement,
                verdict.status
            );

            let mutant = Mutant::from_mutation(&class.name, index, mutation, original)
                .with_status(verdict.status, verdict.reason);
            self.emit_indexed(
                ProgressStage::Mutant,
                index + 1,
                total,
                format!("{} {}", mutant.mutator_name, mutant.status),
            );
            mutants.push(mutant);
        }

        Ok(mutants)
    }

    /// Deploy one mutated body and run its covering tests.
    async fn execute(&self, class: &ApexClass, body: String, test_methods: &[String]) -> Verdict {
        let mutated = ApexClass {
            body,
            ..class.clone()
        };
        let result: Result<TestRunResult> = async {
            self.remote.update(&mutated).await?;
            self.remote
                .run_covering_tests(&self.options.test_class_name, test_methods)
                .await
        }
        .await;

        match result {
            Ok(run) if run.outcome == TestOutcome::Passed => Verdict {
                status: MutantStatus::Survived,
                reason: None,
            },
            Ok(_) => Verdict {
                status: MutantStatus::Killed,
                reason: None,
            },
            Err(e) => self.classifier.classify(&e),
        }
    }

    fn emit(&self, stage: ProgressStage, message: impl Into<String>) {
        self.emit_indexed(stage, 0, 0, message);
    }

    fn emit_indexed(&self, stage: ProgressStage, index: usize, total: usize, message: impl Into<String>) {
        if let Some(callback) = &self.progress {
            callback(ProgressEvent {
                stage,
                index,
                total,
                message: message.into(),
            });
        }
    }
}

/// Keep only the allowed test methods, dropping lines left uncovered.
pub fn filter_coverage(coverage: CoverageMap, filter: Option<&NameFilter>) -> CoverageMap {
    let Some(filter) = filter else {
        return coverage;
    };
    coverage
        .into_iter()
        .filter_map(|(line, methods)| {
            let methods: BTreeSet<String> =
                methods.into_iter().filter(|m| filter.allows(m)).collect();
            (!methods.is_empty()).then_some((line, methods))
        })
        .collect()
}
