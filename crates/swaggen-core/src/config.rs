//! Configuration management for swaggen code generation.
//!
//! This module defines the `Config` struct and related functionality for managing
//! code generation settings. The configuration can be loaded from a YAML file,
//! created programmatically, or assembled from command-line arguments.
//!
//! # Examples
//!
//! ```no_run
//! use swaggen_core::config::{ArtifactKind, Config};
//!
//! // Create a new config programmatically
//! let mut config = Config::new("openapi.json", "src/api");
//! config.exclude.push(ArtifactKind::Slices);
//! config.validate().unwrap();
//! ```

// Internal imports (std, crate)
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// External imports (alphabetized)
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer, Serialize};
use serde_value::Value as SerdeValue;
use tokio::fs;

use crate::error::Error;

/// Configuration for a swaggen generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// File path or http(s) URL of the specification document
    #[serde(default = "default_spec_location")]
    pub spec_location: String,

    /// Output directory for generated code
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Base path prefix shared by every route (e.g. `api` or `api/v1`)
    #[serde(default = "default_api_base_path")]
    pub api_base_path: String,

    /// Emit `@/api/...` style imports instead of relative ones
    #[serde(default)]
    pub alias_imports: bool,

    /// Module prefix used when `alias_imports` is set
    #[serde(default = "default_alias_root")]
    pub alias_root: String,

    /// Artifact kinds to skip
    #[serde(default)]
    pub exclude: Vec<ArtifactKind>,

    /// Remove the output directory before writing
    #[serde(default)]
    pub clean: bool,

    /// Optional directory with `.tera` files overriding the built-in templates
    #[serde(default)]
    pub template_dir: Option<String>,

    /// Ordered name heuristics used to place schemas into domains
    #[serde(default = "default_domain_patterns")]
    pub domain_patterns: Vec<DomainPattern>,

    /// Shell commands run in the output directory after writing
    #[serde(default, deserialize_with = "deserialize_commands")]
    pub post_generate: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(default_spec_location(), default_output_dir())
    }
}

impl Config {
    /// Create a new Config with default values
    pub fn new(spec_location: impl Into<String>, output_dir: impl Into<String>) -> Self {
        Self {
            spec_location: spec_location.into(),
            output_dir: output_dir.into(),
            api_base_path: default_api_base_path(),
            alias_imports: false,
            alias_root: default_alias_root(),
            exclude: Vec::new(),
            clean: false,
            template_dir: None,
            domain_patterns: default_domain_patterns(),
            post_generate: Vec::new(),
        }
    }

    /// Load configuration from a file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Whether the given artifact kind should be emitted
    pub fn is_enabled(&self, kind: ArtifactKind) -> bool {
        !self.exclude.contains(&kind)
    }

    /// Base path with surrounding slashes removed
    pub fn base_path(&self) -> &str {
        self.api_base_path.trim_matches('/')
    }

    /// Number of path segments in the base path; this is the grouping depth
    pub fn grouping_depth(&self) -> usize {
        self.base_path()
            .split('/')
            .filter(|s| !s.is_empty())
            .count()
    }

    /// Reject contradictory settings before any generation work starts.
    pub fn validate(&self) -> crate::Result<()> {
        let excluded = |k| !self.is_enabled(k);

        if excluded(ArtifactKind::Services) {
            for dependent in [ArtifactKind::Thunks, ArtifactKind::Hooks] {
                if self.is_enabled(dependent) {
                    return Err(Error::config(format!(
                        "cannot exclude services while {} are generated; exclude {} as well",
                        dependent, dependent
                    )));
                }
            }
        }
        if excluded(ArtifactKind::Thunks) && self.is_enabled(ArtifactKind::Hooks) {
            return Err(Error::config(
                "cannot exclude thunks while hooks are generated; exclude hooks as well",
            ));
        }
        if self.clean && self.output_dir.trim().is_empty() {
            return Err(Error::config("clean requires a non-empty output directory"));
        }
        for pattern in &self.domain_patterns {
            pattern.compile()?;
        }
        Ok(())
    }
}

fn default_spec_location() -> String {
    "http://localhost:8000/swagger.json".to_string()
}

fn default_output_dir() -> String {
    "src/api".to_string()
}

fn default_api_base_path() -> String {
    "api".to_string()
}

fn default_alias_root() -> String {
    "@/api".to_string()
}

/// The kinds of generated artifact a run can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Models,
    Services,
    Thunks,
    Slices,
    Params,
    Tags,
    Hooks,
    Store,
}

impl ArtifactKind {
    /// Returns an iterator over all artifact kinds, in emission order
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::Models,
            Self::Params,
            Self::Services,
            Self::Thunks,
            Self::Slices,
            Self::Tags,
            Self::Hooks,
            Self::Store,
        ]
        .into_iter()
    }

    /// Returns the lowercase name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Models => "models",
            Self::Services => "services",
            Self::Thunks => "thunks",
            Self::Slices => "slices",
            Self::Params => "params",
            Self::Tags => "tags",
            Self::Hooks => "hooks",
            Self::Store => "store",
        }
    }
}

impl FromStr for ArtifactKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "models" => Ok(Self::Models),
            "services" => Ok(Self::Services),
            "thunks" => Ok(Self::Thunks),
            "slices" => Ok(Self::Slices),
            "params" => Ok(Self::Params),
            "tags" => Ok(Self::Tags),
            "hooks" => Ok(Self::Hooks),
            "store" => Ok(Self::Store),
            other => Err(Error::config(format!("unknown artifact kind: {}", other))),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One name heuristic: schema names matching `pattern` land in `domain`.
///
/// A `domain` of `$1` takes the first capture group instead of a literal tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainPattern {
    pub pattern: String,
    pub domain: String,
}

impl DomainPattern {
    pub fn new(pattern: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            domain: domain.into(),
        }
    }

    /// Compile the pattern, case-insensitively
    pub fn compile(&self) -> crate::Result<Regex> {
        RegexBuilder::new(&self.pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::config(format!("invalid domain pattern '{}': {}", self.pattern, e)))
    }
}

/// The built-in name heuristics for FastAPI-style mangled schema names.
pub fn default_domain_patterns() -> Vec<DomainPattern> {
    vec![
        DomainPattern::new(r"^app__schemas__([a-z_]+?)_schemas__", "$1"),
        DomainPattern::new(r"^App_schemas_([a-z]+?)Schemas_", "$1"),
    ]
}

/// Accept either a single command or a list of commands
fn deserialize_commands<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = SerdeValue::deserialize(deserializer)?;

    match value {
        SerdeValue::String(s) => Ok(vec![s]),
        SerdeValue::Unit | SerdeValue::Option(None) => Ok(Vec::new()),
        SerdeValue::Seq(seq) => {
            let mut result = Vec::new();
            for item in seq {
                if let SerdeValue::String(s) = item {
                    result.push(s);
                } else {
                    return Err(serde::de::Error::custom(
                        "Expected string or array of strings",
                    ));
                }
            }
            Ok(result)
        }
        _ => Err(serde::de::Error::custom(
            "Expected string or array of strings",
        )),
    }
}
