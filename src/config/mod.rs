//! Configuration loading and management.

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::mutation::NameFilter;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mutator selection and candidate filtering.
    pub mutation: MutationConfig,
    /// Test method selection.
    pub tests: TestsConfig,
    /// Type inference settings.
    pub types: TypesConfig,
    /// Output configuration.
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from an explicit file path.
    ///
    /// Errors if the file does not exist. Use this for explicit `--config` flags.
    /// Env vars with `APEXMUT_` prefix override file values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file_exact(path))
            .merge(Env::prefixed("APEXMUT_").split("__"))
            .extract()
            .map_err(|e| Error::config(e.to_string()))
    }

    /// Load configuration from a directory, looking for apexmut.toml or
    /// .apexmut/apexmut.toml.
    ///
    /// Missing files are silently skipped (defaults are used).
    pub fn load_default(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(dir.join("apexmut.toml")))
            .merge(Toml::file(dir.join(".apexmut/apexmut.toml")))
            .merge(Env::prefixed("APEXMUT_").split("__"))
            .extract()
            .map_err(|e| Error::config(e.to_string()))
    }

    /// Mutator include/exclude filter.
    pub fn mutator_filter(&self) -> Result<Option<NameFilter>> {
        NameFilter::from_lists(&self.mutation.include, &self.mutation.exclude)
    }

    /// Test method include/exclude filter.
    pub fn test_method_filter(&self) -> Result<Option<NameFilter>> {
        NameFilter::from_lists(&self.tests.include, &self.tests.exclude)
    }

    /// Compiled skip patterns.
    pub fn skip_regexes(&self) -> Result<Vec<Regex>> {
        self.mutation
            .skip_patterns
            .iter()
            .map(|p| Regex::new(p).map_err(Error::from))
            .collect()
    }
}

/// `[mutation]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// Only these mutators run.
    pub include: Vec<String>,
    /// These mutators never run.
    pub exclude: Vec<String>,
    /// Candidates whose original text matches any pattern are dropped.
    pub skip_patterns: Vec<String>,
    /// Restrict mutation to these lines.
    pub lines: Vec<u32>,
    /// Minimum acceptable mutation score (percent).
    pub min_score: Option<f64>,
}

/// `[tests]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TestsConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// `[types]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypesConfig {
    /// Extra names treated as user-defined classes.
    pub user_classes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format.
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON format.
    Json,
    /// Markdown format.
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "md" | "markdown" => Ok(Self::Markdown),
            _ => Err(format!("Unknown format: {s}. Use 'text', 'json', or 'md'")),
        }
    }
}
