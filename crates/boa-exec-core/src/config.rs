//! Execution configuration
//!
//! An [`ExecConfig`] is plain data: limits for the source and for the
//! engine, how the source is parsed, where console output goes, and whether
//! queued promise jobs are drained. It loads from JSON and can be
//! overridden from the environment, which is how C hosts tune the boundary
//! without a new entry point.

use std::path::Path;

use crate::console::ConsoleTarget;
use crate::runner::DEFAULT_THREAD_STACK_SIZE;
use crate::source::{DEFAULT_MAX_NESTING, DEFAULT_MAX_SOURCE_LEN};
use crate::{Error, Result};

/// Path of a JSON config file read by [`ExecConfig::from_env`]
pub const ENV_CONFIG_PATH: &str = "BOA_EXEC_CONFIG";
pub const ENV_MAX_SOURCE_LEN: &str = "BOA_EXEC_MAX_SOURCE_LEN";
pub const ENV_LOOP_LIMIT: &str = "BOA_EXEC_LOOP_LIMIT";
pub const ENV_RECURSION_LIMIT: &str = "BOA_EXEC_RECURSION_LIMIT";
pub const ENV_STRICT: &str = "BOA_EXEC_STRICT";

/// How the source text is parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A classic script; the result is its completion value
    #[default]
    Script,
    /// An ECMAScript module; always strict, the result is `undefined`
    Module,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecConfig {
    /// Largest accepted source, in bytes
    pub max_source_len: usize,
    /// Maximum iterations of a single loop
    pub loop_iteration_limit: u64,
    /// Maximum call depth
    pub recursion_limit: usize,
    /// Maximum VM stack size
    pub stack_size_limit: usize,
    /// Largest native stack given to the evaluation thread, in bytes
    pub thread_stack_size: usize,
    /// Deepest bracket / prefix-operator nesting accepted before parsing
    pub max_nesting: usize,
    /// Evaluate scripts in strict mode
    pub strict: bool,
    pub source_kind: SourceKind,
    pub console: ConsoleTarget,
    /// Drain the promise job queue after the script completes
    pub run_jobs: bool,
}

impl Default for ExecConfig {
    fn default() -> Self {
        let limits = boa_engine::vm::RuntimeLimits::default();
        ExecConfig {
            max_source_len: DEFAULT_MAX_SOURCE_LEN,
            loop_iteration_limit: limits.loop_iteration_limit(),
            recursion_limit: limits.recursion_limit(),
            stack_size_limit: limits.stack_size_limit(),
            thread_stack_size: DEFAULT_THREAD_STACK_SIZE,
            max_nesting: DEFAULT_MAX_NESTING,
            strict: false,
            source_kind: SourceKind::Script,
            console: ConsoleTarget::Stdout,
            run_jobs: true,
        }
    }
}

impl ExecConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    /// Defaults, then the file named by `BOA_EXEC_CONFIG`, then the
    /// individual `BOA_EXEC_*` overrides.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup(ENV_CONFIG_PATH) {
            Some(path) if !path.is_empty() => Self::from_file(Path::new(&path))?,
            _ => Self::default(),
        };

        if let Some(v) = lookup(ENV_MAX_SOURCE_LEN) {
            config.max_source_len = parse_var(ENV_MAX_SOURCE_LEN, &v)?;
        }
        if let Some(v) = lookup(ENV_LOOP_LIMIT) {
            config.loop_iteration_limit = parse_var(ENV_LOOP_LIMIT, &v)?;
        }
        if let Some(v) = lookup(ENV_RECURSION_LIMIT) {
            config.recursion_limit = parse_var(ENV_RECURSION_LIMIT, &v)?;
        }
        if let Some(v) = lookup(ENV_STRICT) {
            config.strict = parse_var(ENV_STRICT, &v)?;
        }
        Ok(config)
    }

    pub fn with_console(mut self, console: ConsoleTarget) -> Self {
        self.console = console;
        self
    }

    pub fn with_max_source_len(mut self, max_source_len: usize) -> Self {
        self.max_source_len = max_source_len;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_source_kind(mut self, source_kind: SourceKind) -> Self {
        self.source_kind = source_kind;
        self
    }

    pub(crate) fn runtime_limits(&self) -> boa_engine::vm::RuntimeLimits {
        let mut limits = boa_engine::vm::RuntimeLimits::default();
        limits.set_loop_iteration_limit(self.loop_iteration_limit);
        limits.set_recursion_limit(self.recursion_limit);
        limits.set_stack_size_limit(self.stack_size_limit);
        limits
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{}={:?}: {}", key, value, e)))
}
