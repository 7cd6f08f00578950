//! Mutant generation and execution.
//!
//! [`MutantGenerator`] walks a parsed class with the registered
//! [`Mutator`]s and yields [`Mutation`] candidates restricted to covered
//! lines. [`MutationTestingService`] deploys each candidate against a
//! remote org, runs the covering tests and records a [`Mutant`] verdict.

mod candidate;
mod classifier;
mod generator;
mod listener;
mod mutant;
pub(crate) mod mutator;
pub mod mutators;
mod service;

pub use candidate::{apply, Mutation, TokenSpan};
pub use classifier::{
    ClassifierChain, DeploymentFailureClassifier, FailureClassifier, GovernorLimitClassifier,
    RuntimeErrorClassifier, Verdict, DEPLOYMENT_FAILURE_MARKER, GOVERNOR_LIMIT_MARKERS,
};
pub use generator::{GenerationOptions, MutantGenerator, NameFilter};
pub use listener::MutationListener;
pub use mutant::{
    mutation_score, Location, Mutant, MutantStatus, MutatorTally, Position, ScoreSummary,
};
pub use mutator::{MutationContext, Mutator, MutatorRegistry};
pub use service::{
    filter_coverage, CoverageMap, MutationTestingOptions, MutationTestingReport,
    MutationTestingService,
};
