//! Configuration for the grading orchestrator.
//!
//! Resolved from env vars with defaults matching the reference behavior
//! (64 MiB containers, `/home/` target path, `/bin/bash` entry point, no
//! per-submission timeout). CLI flags override the resolved values.

use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Container sizing and extraction settings shared by the whole batch.
#[derive(Debug, Clone)]
pub struct GraderConfig {
    /// Memory limit for submission containers, in MiB.
    pub memory_limit_mb: u64,
    /// Path inside the container where archives are extracted.
    pub container_home: String,
    /// Entry command the container is created with.
    pub entry_command: String,
    /// Per-submission deadline for the whole lookup/create/extract sequence.
    /// `None` means a slow extraction blocks the batch, like the reference.
    pub submission_timeout: Option<Duration>,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            memory_limit_mb: 64,
            container_home: "/home/".to_string(),
            entry_command: "/bin/bash".to_string(),
            submission_timeout: None,
        }
    }
}

impl GraderConfig {
    pub fn resolve() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        // 0 keeps the timeout disabled
        let timeout_secs = parse_optional_env::<u64>("GRADEBOX_SUBMISSION_TIMEOUT_SECS", 0)?;
        Ok(Self {
            memory_limit_mb: parse_optional_env("GRADEBOX_MEMORY_LIMIT_MB", defaults.memory_limit_mb)?,
            container_home: optional_env("GRADEBOX_CONTAINER_HOME")
                .unwrap_or(defaults.container_home),
            entry_command: optional_env("GRADEBOX_ENTRY_COMMAND").unwrap_or(defaults.entry_command),
            submission_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        })
    }
}

fn optional_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

fn parse_optional_env<T: FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match optional_env(var) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            var: var.to_string(),
            reason: format!("could not parse '{}'", raw),
        }),
        None => Ok(default),
    }
}
