//! apexmut - Mutation testing engine for Apex classes.
//!
//! apexmut introduces small semantic changes ("mutants") into one class,
//! redeploys each mutant, re-runs only the tests covering the touched line
//! and records whether the test suite noticed. The result is a mutation
//! score and a per-mutant report.
//!
//! The engine has four layers:
//!
//! - [`types`]: lightweight type inference over parsed source
//! - [`mutation::mutators`]: the mutator family
//! - [`mutation::MutantGenerator`]: candidate generation and rewriting
//! - [`mutation::MutationTestingService`]: the deploy/test/classify pipeline,
//!   driven through the [`remote`] traits
//!
//! # Example
//!
//! ```no_run
//! use apexmut::mutation::{GenerationOptions, MutantGenerator};
//! use apexmut::types::TypeDiscoverer;
//!
//! # async fn run() -> apexmut::core::Result<()> {
//! let source = std::fs::read_to_string("Calculator.cls")?;
//! let types = TypeDiscoverer::with_default_matchers(["Calculator"])
//!     .discover(&source)
//!     .await?;
//! let generator = MutantGenerator::new();
//! let mutations = generator.compute(&source, &types, &GenerationOptions::covering_all(&source))?;
//! for mutation in &mutations {
//!     let mutated = generator.mutate(&source, mutation)?;
//!     println!("{} on line {}: {} bytes", mutation.mutator_name, mutation.line(), mutated.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod mutation;
pub mod output;
pub mod parser;
pub mod remote;
pub mod types;

pub use mutation::{MutantGenerator, MutationTestingService};
