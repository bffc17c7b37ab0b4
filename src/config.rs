//! Scope Configuration
//!
//! Configuration for the OS threads that back suspension units.
//! Configuration can be set programmatically or loaded from environment
//! variables.
//!
//! # Environment Variables
//!
//! All environment variables use the `DELIMIT_` prefix:
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DELIMIT_STACK_SIZE` | Strand thread stack size in bytes | 1048576 (1MB) |
//! | `DELIMIT_STRAND_NAME_PREFIX` | Thread name prefix for strands | "strand" |
//!
//! # Example
//!
//! ```rust,ignore
//! use delimit::config::ScopeConfig;
//!
//! // Load from environment with defaults
//! let config = ScopeConfig::from_env();
//!
//! // Or use the builder pattern
//! let config = ScopeConfig::named("parser")
//!     .with_stack_size(256 * 1024);
//! ```

use std::env;

/// Default stack size for strand threads (1 MB).
pub const DEFAULT_STACK_SIZE: usize = 1024 * 1024;

/// Default thread name prefix for strands.
pub const DEFAULT_NAME_PREFIX: &str = "strand";

/// Configuration for the strands backing a scope.
///
/// Replaying multi-shot scopes re-use the configuration of the execution
/// they fork from, so one config covers a whole scope tree.
#[derive(Debug, Clone)]
pub struct ScopeConfig {
    /// Optional name for debugging. Strand threads are named
    /// `<prefix>-<strand id>`.
    pub name: Option<String>,
    /// Stack size in bytes for each strand thread.
    pub stack_size: usize,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            name: None,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl ScopeConfig {
    /// Create a new config with a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Set the strand thread stack size.
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size;
        self
    }

    /// Load configuration from `DELIMIT_*` environment variables.
    ///
    /// Unset or unparsable variables fall back to the defaults.
    pub fn from_env() -> Self {
        let stack_size = env::var("DELIMIT_STACK_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_STACK_SIZE);
        let name = env::var("DELIMIT_STRAND_NAME_PREFIX").ok();
        Self { name, stack_size }
    }

    /// The thread name prefix to use for strands under this config.
    pub fn name_prefix(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_NAME_PREFIX)
    }
}
