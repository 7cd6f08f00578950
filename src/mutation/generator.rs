//! Mutant generator - runs the mutator family over a class and rewrites source.

use std::collections::BTreeSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::parser::{ApexParser, ParseResult};
use crate::types::TypeRegistry;

use super::listener::MutationListener;
use super::mutator::{MutationContext, MutatorRegistry};
use super::{candidate, Mutation};

/// An include-list or an exclude-list of names, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameFilter {
    Include(Vec<String>),
    Exclude(Vec<String>),
}

impl NameFilter {
    /// Build a filter from optional include and exclude lists.
    ///
    /// Both lists empty means no filter; both non-empty is a configuration
    /// error.
    pub fn from_lists(include: &[String], exclude: &[String]) -> Result<Option<Self>> {
        match (include.is_empty(), exclude.is_empty()) {
            (true, true) => Ok(None),
            (false, true) => Ok(Some(Self::Include(include.to_vec()))),
            (true, false) => Ok(Some(Self::Exclude(exclude.to_vec()))),
            (false, false) => Err(Error::configuration(
                "include and exclude lists are mutually exclusive",
            )),
        }
    }

    /// Whether `name` passes the filter.
    pub fn allows(&self, name: &str) -> bool {
        match self {
            Self::Include(names) => names.iter().any(|n| n.eq_ignore_ascii_case(name)),
            Self::Exclude(names) => !names.iter().any(|n| n.eq_ignore_ascii_case(name)),
        }
    }
}

/// Inputs that narrow candidate generation.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    /// Lines exercised by at least one test. Nothing outside is mutated.
    pub covered_lines: BTreeSet<u32>,
    /// Which mutators run.
    pub mutator_filter: Option<NameFilter>,
    /// Candidates whose original text matches any of these are dropped.
    pub skip_patterns: Vec<Regex>,
    /// Optional further restriction on candidate lines.
    pub allowed_lines: Option<BTreeSet<u32>>,
}

impl GenerationOptions {
    /// Options for the given covered lines and nothing else.
    pub fn new(covered_lines: BTreeSet<u32>) -> Self {
        Self {
            covered_lines,
            ..Default::default()
        }
    }

    /// Options covering every line of `source`.
    pub fn covering_all(source: &str) -> Self {
        let lines = source.lines().count().max(1) as u32;
        Self::new((1..=lines).collect())
    }

    pub fn with_mutator_filter(mut self, filter: Option<NameFilter>) -> Self {
        self.mutator_filter = filter;
        self
    }

    pub fn with_skip_patterns(mut self, patterns: Vec<Regex>) -> Self {
        self.skip_patterns = patterns;
        self
    }

    pub fn with_allowed_lines(mut self, lines: BTreeSet<u32>) -> Self {
        self.allowed_lines = Some(lines);
        self
    }
}

/// Generator that computes mutation candidates and applies them.
pub struct MutantGenerator {
    parser: ApexParser,
    registry: MutatorRegistry,
}

impl Default for MutantGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MutantGenerator {
    /// Generator with every built-in mutator.
    pub fn new() -> Self {
        Self::with_registry(MutatorRegistry::builtin())
    }

    /// Generator over a custom set of mutators.
    pub fn with_registry(registry: MutatorRegistry) -> Self {
        Self {
            parser: ApexParser::new(),
            registry,
        }
    }

    /// The mutators this generator can run.
    pub fn registry(&self) -> &MutatorRegistry {
        &self.registry
    }

    /// Compute candidates for source text.
    pub fn compute(
        &self,
        source: &str,
        types: &TypeRegistry,
        options: &GenerationOptions,
    ) -> Result<Vec<Mutation>> {
        let parsed = self.parser.parse(source)?;
        if parsed.has_errors() {
            tracing::debug!("Source has syntax the grammar does not cover; those regions are skipped");
        }
        Ok(self.compute_parsed(&parsed, types, options))
    }

    /// Compute candidates for an already parsed source.
    ///
    /// Candidates come back in tree-walk order. An empty result is not an
    /// error here.
    pub fn compute_parsed(
        &self,
        parsed: &ParseResult,
        types: &TypeRegistry,
        options: &GenerationOptions,
    ) -> Vec<Mutation> {
        let active = self.registry.select(|name| {
            options
                .mutator_filter
                .as_ref()
                .is_none_or(|filter| filter.allows(name))
        });
        tracing::debug!("Running {} mutators", active.len());

        let ctx = MutationContext::new(parsed, types);
        MutationListener::new(active, options).walk(&ctx)
    }

    /// Apply a candidate to the source it was computed from.
    pub fn mutate(&self, source: &str, mutation: &Mutation) -> Result<String> {
        candidate::apply(source, mutation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    const CALCULATOR: &str = "public class Calculator {\n    public Integer add(Integer a, Integer b) {\n        Integer unused = 0;\n        return a + b;\n    }\n}\n";

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_name_filter_from_lists() {
        assert_eq!(NameFilter::from_lists(&[], &[]).unwrap(), None);
        assert!(matches!(
            NameFilter::from_lists(&strings(&["A"]), &[]).unwrap(),
            Some(NameFilter::Include(_))
        ));
        let err = NameFilter::from_lists(&strings(&["A"]), &strings(&["B"])).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_name_filter_case_insensitive() {
        let include = NameFilter::Include(strings(&["arithmeticoperatormutator"]));
        assert!(include.allows("ArithmeticOperatorMutator"));
        assert!(!include.allows("NegationMutator"));

        let exclude = NameFilter::Exclude(strings(&["NEGATIONMUTATOR"]));
        assert!(!exclude.allows("NegationMutator"));
        assert!(exclude.allows("ArithmeticOperatorMutator"));
    }

    #[test]
    fn test_compute_without_types_on_covered_line() {
        let generator = MutantGenerator::new();
        let options = GenerationOptions::new(BTreeSet::from([4])).with_mutator_filter(Some(
            NameFilter::Include(strings(&["ArithmeticOperatorMutator"])),
        ));
        let mutations = generator
            .compute(CALCULATOR, &TypeRegistry::empty(), &options)
            .unwrap();

        let replacements: Vec<_> = mutations.iter().map(|m| m.replacement.as_str()).collect();
        assert_eq!(replacements, vec!["-", "*", "/"]);
        assert!(mutations.iter().all(|m| m.line() == 4));

        let mutated = generator.mutate(CALCULATOR, &mutations[0]).unwrap();
        assert!(mutated.contains("return a - b;"));
        assert!(!mutated.contains("return a + b;"));
    }

    #[test]
    fn test_compute_respects_coverage() {
        let generator = MutantGenerator::new();
        let options = GenerationOptions::new(BTreeSet::from([3]));
        let mutations = generator
            .compute(CALCULATOR, &TypeRegistry::empty(), &options)
            .unwrap();
        assert!(mutations.iter().all(|m| m.line() == 3));
    }

    #[test]
    fn test_exclude_filter_removes_mutator() {
        let generator = MutantGenerator::new();
        let options = GenerationOptions::covering_all(CALCULATOR).with_mutator_filter(Some(
            NameFilter::Exclude(strings(&["ArithmeticOperatorMutator"])),
        ));
        let mutations = generator
            .compute(CALCULATOR, &TypeRegistry::empty(), &options)
            .unwrap();
        assert!(!mutations.is_empty());
        assert!(mutations
            .iter()
            .all(|m| m.mutator_name != "ArithmeticOperatorMutator"));
    }

    fn discovered(class_name: &str, source: &str) -> TypeRegistry {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(crate::types::TypeDiscoverer::with_default_matchers([class_name]).discover(source))
            .unwrap()
    }

    fn count_by_mutator(mutations: &[Mutation]) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for mutation in mutations {
            *counts.entry(mutation.mutator_name.as_str()).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_compute_on_global_override_method() {
        let source = "global class Svc {\n    global override Integer add(Integer a, Integer b) {\n        return a + b;\n    }\n}\n";
        let types = discovered("Svc", source);
        let mutations = MutantGenerator::new()
            .compute(source, &types, &GenerationOptions::covering_all(source))
            .unwrap();
        assert_eq!(
            count_by_mutator(&mutations),
            BTreeMap::from([
                ("ArithmeticOperatorDeletionMutator", 2),
                ("ArithmeticOperatorMutator", 3),
                ("EmptyReturnMutator", 1),
                ("NegationMutator", 1),
            ])
        );
        assert!(mutations.iter().all(|m| m.line() == 3));
    }

    #[test]
    fn test_compute_on_virtual_boolean_method() {
        let source = "public virtual class Rules {\n    public virtual Boolean isLarge(Integer size) {\n        return size >= 500;\n    }\n}\n";
        let types = discovered("Rules", source);
        let mutations = MutantGenerator::new()
            .compute(source, &types, &GenerationOptions::covering_all(source))
            .unwrap();
        assert_eq!(
            count_by_mutator(&mutations),
            BTreeMap::from([
                ("BoundaryConditionMutator", 1),
                ("FalseReturnMutator", 1),
                ("TrueReturnMutator", 1),
            ])
        );
    }

    #[test]
    fn test_compute_on_switch_on_method() {
        let source = "public class Grader {\n    Integer f(Integer x){ Integer a = 0; switch on x { when 1 {a = 10;} when 2 {a = 20;} when else {a = -1;} } return a; }\n}\n";
        let types = discovered("Grader", source);
        let mutations = MutantGenerator::new()
            .compute(source, &types, &GenerationOptions::covering_all(source))
            .unwrap();
        assert_eq!(
            count_by_mutator(&mutations),
            BTreeMap::from([
                ("EmptyReturnMutator", 1),
                ("InvertNegativesMutator", 1),
                ("NegationMutator", 1),
                ("SwitchMutator", 3),
            ])
        );
    }

    #[test]
    fn test_mutate_with_original_text_is_identity() {
        let generator = MutantGenerator::new();
        let options = GenerationOptions::covering_all(CALCULATOR);
        for mutation in generator
            .compute(CALCULATOR, &TypeRegistry::empty(), &options)
            .unwrap()
        {
            let original = mutation.original_text(CALCULATOR).unwrap().to_string();
            let identity = Mutation {
                replacement: original,
                ..mutation
            };
            assert_eq!(generator.mutate(CALCULATOR, &identity).unwrap(), CALCULATOR);
        }
    }
}
