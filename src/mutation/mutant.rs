//! Executed mutants, their verdicts and the mutation score.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Mutation;

/// Verdict of a mutant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutantStatus {
    /// Not executed (offline generation).
    Pending,
    /// A covering test failed - the mutant was detected.
    Killed,
    /// All covering tests passed - the mutant went unnoticed.
    Survived,
    /// The mutated class did not deploy.
    CompileError,
    /// Deploy or test execution raised an unexpected error.
    RuntimeError,
}

impl MutantStatus {
    /// Killed, or killed by a runtime error.
    pub fn is_detected(&self) -> bool {
        matches!(self, Self::Killed | Self::RuntimeError)
    }

    /// Whether this status takes part in the score denominator.
    pub fn counts_for_score(&self) -> bool {
        !matches!(self, Self::CompileError)
    }
}

impl std::fmt::Display for MutantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Killed => "killed",
            Self::Survived => "survived",
            Self::CompileError => "compile_error",
            Self::RuntimeError => "runtime_error",
        };
        f.write_str(s)
    }
}

/// A line/column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Line (1-indexed).
    pub line: u32,
    /// Column (0-indexed).
    pub column: u32,
}

/// Where in the source a mutant lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub start: Position,
    pub end: Position,
}

/// A mutant together with its verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutant {
    /// Unique identifier: class, position and a hash suffix.
    pub id: String,
    /// Mutator that produced the candidate.
    pub mutator_name: String,
    /// Verdict.
    pub status: MutantStatus,
    /// Platform message explaining the verdict, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
    /// Location of the replaced text.
    pub location: Location,
    /// Text that was replaced.
    pub original: String,
    /// Replacement text.
    pub replacement: String,
}

impl Mutant {
    /// Build a mutant from a candidate.
    ///
    /// `index` is the candidate's position in generation order and only
    /// feeds the id hash.
    pub fn from_mutation(
        class_name: &str,
        index: usize,
        mutation: &Mutation,
        original: impl Into<String>,
    ) -> Self {
        let start = mutation.target.start;
        let end = mutation.target.end;
        Self {
            id: mutant_id(class_name, index, mutation),
            mutator_name: mutation.mutator_name.clone(),
            status: MutantStatus::Pending,
            status_reason: None,
            location: Location {
                start: Position {
                    line: start.line,
                    column: start.column,
                },
                end: Position {
                    line: end.line,
                    column: end.column,
                },
            },
            original: original.into(),
            replacement: mutation.replacement.clone(),
        }
    }

    /// Set the verdict.
    pub fn with_status(mut self, status: MutantStatus, reason: Option<String>) -> Self {
        self.status = status;
        self.status_reason = reason;
        self
    }
}

fn mutant_id(class_name: &str, index: usize, mutation: &Mutation) -> String {
    let key = format!(
        "{}:{}:{}:{}:{}",
        mutation.mutator_name,
        mutation.target.start.start_offset,
        mutation.target.end.stop_offset,
        mutation.replacement,
        index
    );
    let hash = xxhash_rust::xxh3::xxh3_64(key.as_bytes());
    format!(
        "{}_{}_{}_{:06x}",
        class_name,
        mutation.target.start.line,
        mutation.target.start.column,
        hash & 0xFF_FFFF
    )
}

/// Mutation score in percent.
///
/// Killed and runtime-error mutants count as detected; compile errors are
/// left out of both numerator and denominator. Zero when nothing counts.
pub fn mutation_score(mutants: &[Mutant]) -> f64 {
    let counted = mutants
        .iter()
        .filter(|m| m.status.counts_for_score())
        .count();
    if counted == 0 {
        return 0.0;
    }
    let detected = mutants.iter().filter(|m| m.status.is_detected()).count();
    detected as f64 / counted as f64 * 100.0
}

/// Per-mutator tallies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutatorTally {
    pub total: usize,
    pub detected: usize,
    pub survived: usize,
}

/// Counts per status and per mutator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub total: usize,
    pub killed: usize,
    pub survived: usize,
    pub compile_errors: usize,
    pub runtime_errors: usize,
    pub pending: usize,
    pub score: f64,
    pub by_mutator: BTreeMap<String, MutatorTally>,
}

impl ScoreSummary {
    /// Summarize a list of mutants.
    pub fn from_mutants(mutants: &[Mutant]) -> Self {
        let mut summary = Self {
            total: mutants.len(),
            score: mutation_score(mutants),
            ..Default::default()
        };

        for mutant in mutants {
            match mutant.status {
                MutantStatus::Pending => summary.pending += 1,
                MutantStatus::Killed => summary.killed += 1,
                MutantStatus::Survived => summary.survived += 1,
                MutantStatus::CompileError => summary.compile_errors += 1,
                MutantStatus::RuntimeError => summary.runtime_errors += 1,
            }

            let tally = summary
                .by_mutator
                .entry(mutant.mutator_name.clone())
                .or_default();
            tally.total += 1;
            if mutant.status.is_detected() {
                tally.detected += 1;
            }
            if mutant.status == MutantStatus::Survived {
                tally.survived += 1;
            }
        }

        summary
    }
}
