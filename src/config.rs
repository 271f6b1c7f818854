//! Batcher settings.
//!
//! [`BatcherSettings`] can be written by hand, parsed from YAML or JSON, or
//! overridden from environment variables:
//!
//! ```rust
//! use batchpipe::config::BatcherSettings;
//!
//! let settings = BatcherSettings::from_yaml_str("name: ingest\nbatch_size: 512\n")?;
//! assert_eq!(settings.batch_size, 512);
//! assert_eq!(settings.queue_size, 8);
//! # Ok::<(), batchpipe::Error>(())
//! ```

use crate::batcher::{DEFAULT_BATCH_SIZE, DEFAULT_NAME, DEFAULT_QUEUE_SIZE};
use crate::validation::{ValidationContext, Validator};
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Prefix used by the demo binary for environment overrides.
pub const DEFAULT_ENV_PREFIX: &str = "BATCHPIPE";

/// Batch sizes above this are accepted but reported as a warning.
const LARGE_BATCH_SIZE: usize = 1 << 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatcherSettings {
    /// Name used in log messages and worker thread names.
    pub name: String,
    /// Elements per batch.
    pub batch_size: usize,
    /// Batches that may wait in the queue before producers block.
    pub queue_size: usize,
    /// Worker threads passed to `start`.
    pub workers: usize,
}

impl Default for BatcherSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            queue_size: DEFAULT_QUEUE_SIZE,
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl BatcherSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads settings from a `.yaml`, `.yml` or `.json` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            Some("json") => Self::from_json_str(&text),
            other => Err(Error::configuration_with_context(
                "unsupported settings file extension",
                ErrorContext::new()
                    .with_field_path(path.display().to_string())
                    .with_details(format!("extension: {:?}", other))
                    .with_source("settings"),
            )),
        }
    }

    /// Applies `{prefix}_NAME`, `{prefix}_BATCH_SIZE`, `{prefix}_QUEUE_SIZE`
    /// and `{prefix}_WORKERS` from the process environment.
    pub fn with_env_overrides(self, prefix: &str) -> Result<Self> {
        self.with_overrides(prefix, |key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value.
    pub fn with_overrides(
        mut self,
        prefix: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        if let Some(name) = lookup(&format!("{}_NAME", prefix)) {
            self.name = name;
        }
        if let Some(v) = parse_override(&lookup, &format!("{}_BATCH_SIZE", prefix))? {
            self.batch_size = v;
        }
        if let Some(v) = parse_override(&lookup, &format!("{}_QUEUE_SIZE", prefix))? {
            self.queue_size = v;
        }
        if let Some(v) = parse_override(&lookup, &format!("{}_WORKERS", prefix))? {
            self.workers = v;
        }
        Ok(self)
    }
}

fn parse_override<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e: T::Err| {
            Error::configuration_with_context(
                format!("invalid value {:?}", raw),
                ErrorContext::new()
                    .with_field_path(key)
                    .with_details(e.to_string())
                    .with_source("settings"),
            )
        }),
    }
}

impl Validator for BatcherSettings {
    fn on_validate(&self, ctx: &mut ValidationContext) {
        ctx.problem_if(self.name.trim().is_empty(), "name is blank");
        ctx.problem_if(self.batch_size == 0, "batch_size must be at least 1");
        ctx.problem_if(self.queue_size == 0, "queue_size must be at least 1");
        ctx.problem_if(self.workers == 0, "workers must be at least 1");
        ctx.warning_if(
            self.batch_size > LARGE_BATCH_SIZE,
            format!("batch_size {} is very large", self.batch_size),
        );
    }

    fn validation_target(&self) -> &str {
        &self.name
    }
}
