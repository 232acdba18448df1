//! Configuration and constants for trace reconstruction.

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// Packed record layout: [63] direction | [62..43] method id | [42..0] timestamp
pub const METHOD_ID_BITS: u32 = 20;
pub const TIMESTAMP_BITS: u32 = 43;
pub const METHOD_ID_MASK: u64 = 0xF_FFFF;
pub const TIMESTAMP_MASK: u64 = 0x7FF_FFFF_FFFF;

/// Largest method id the instrumentation can hand out
pub const METHOD_ID_MAX: u32 = 0xF_FFFF;

/// Sentinel id marking the top of one message-dispatch cycle
pub const METHOD_ID_DISPATCH: u32 = METHOD_ID_MAX - 1;

/// Duration recorded by the capture side when a frame was cut off at the ANR limit
pub const DEFAULT_ANR_MS: u32 = 5 * 1000;

// Trimming defaults used by the CLI policy
pub const TIME_UPDATE_CYCLE_MS: u32 = 5;
pub const FILTER_STACK_MAX_COUNT: u32 = 60;
pub const TARGET_EVIL_METHOD_STACK: usize = 30;

/// Share of the stack cost an item must reach to be a key candidate
pub const FILTER_STACK_KEY_ALL_PERCENT: f64 = 0.3;

/// Tunables for the `analyze` command, loadable from TOML
///
/// ```toml
/// strict = true
/// target_stack = 30
///
/// [filter]
/// cycle_ms = 5
/// max_passes = 60
///
/// [key]
/// all_percent = 0.3
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TraceConfig {
    /// Drop everything before the first dispatch and close open frames at end time
    #[serde(default = "default_strict")]
    pub strict: bool,

    /// Maximum number of items kept in the report
    #[serde(default = "default_target_stack")]
    pub target_stack: usize,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub key: KeyConfig,
}

/// Escalating duration filter settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Pass `k` drops items shorter than `k * cycle_ms`
    #[serde(default = "default_cycle_ms")]
    pub cycle_ms: u32,

    /// Number of filter passes before the hard cut
    #[serde(default = "default_max_passes")]
    pub max_passes: u32,
}

/// Grouping key settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct KeyConfig {
    #[serde(default = "default_all_percent")]
    pub all_percent: f64,
}

fn default_strict() -> bool {
    true
}

fn default_target_stack() -> usize {
    TARGET_EVIL_METHOD_STACK
}

fn default_cycle_ms() -> u32 {
    TIME_UPDATE_CYCLE_MS
}

fn default_max_passes() -> u32 {
    FILTER_STACK_MAX_COUNT
}

fn default_all_percent() -> f64 {
    FILTER_STACK_KEY_ALL_PERCENT
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            strict: default_strict(),
            target_stack: default_target_stack(),
            filter: FilterConfig::default(),
            key: KeyConfig::default(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            cycle_ms: default_cycle_ms(),
            max_passes: default_max_passes(),
        }
    }
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            all_percent: default_all_percent(),
        }
    }
}

/// Load a trace config from a TOML file
///
/// # Errors
/// * `ConfigError::IoError` - If file cannot be read
/// * `ConfigError::ParseFailed` - If TOML is invalid
pub fn load_config(path: impl AsRef<Path>) -> Result<TraceConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: TraceConfig = toml::from_str(&contents)?;
    Ok(config)
}
