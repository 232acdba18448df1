//! Output JSON schema definitions for trace reports.
//!
//! This module defines the structure of JSON files we write to disk.
//! Schema is versioned to allow future evolution.

use crate::aggregator::MethodItem;
use serde::{Deserialize, Serialize};

/// Top-level report structure written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Buffer file the report was built from
    pub source: String,

    /// Whether strict reconstruction was used
    pub strict: bool,

    /// Records in the buffer, padding included
    pub record_count: usize,

    /// Longest frame in milliseconds
    pub stack_cost: u64,

    /// Grouping key of the dominant frame (empty if no frames)
    pub stack_key: String,

    /// Nodes in the call tree, 0 when the tree was malformed
    pub tree_nodes: usize,

    /// Frame count before trimming
    pub trimmed_from: usize,

    /// Frames in chronological order, after trimming
    pub items: Vec<MethodItem>,

    /// Timestamp when report was generated
    pub generated_at: String,
}
