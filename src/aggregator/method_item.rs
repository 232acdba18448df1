//! A completed method frame.

use crate::utils::config::DEFAULT_ANR_MS;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One closed (or synthesized) call frame
///
/// **Public** - produced by the reconstructor, consumed by tree, trimmer and key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodItem {
    pub method_id: u32,

    /// Wall time spent in the frame, in milliseconds
    pub duration: u32,

    /// Nesting level at the moment the frame closed
    pub depth: u32,

    /// Number of adjacent identical leaf calls folded into this item
    pub count: u32,
}

impl MethodItem {
    pub fn new(method_id: u32, duration: u32, depth: u32) -> Self {
        Self {
            method_id,
            duration,
            depth,
            count: 1,
        }
    }

    /// Whether `other` is a repeat of this frame at the same non-root level
    pub fn is_repeat_of(&self, other: &MethodItem) -> bool {
        self.method_id == other.method_id && self.depth == other.depth && other.depth != 0
    }

    /// Fold a repeated call into this item
    ///
    /// A repeat that only carries the ANR placeholder duration reuses the
    /// duration already recorded here.
    pub fn merge(&mut self, repeat: &MethodItem) {
        let cost = if repeat.duration == DEFAULT_ANR_MS {
            self.duration
        } else {
            repeat.duration
        };
        self.count = self.count.saturating_add(1);
        self.duration = self.duration.saturating_add(cost);
    }

    /// Dot-indented `methodId count duration` line for human output
    pub fn print(&self) -> String {
        format!(
            "{}{} {} {}",
            ".".repeat(self.depth as usize),
            self.method_id,
            self.count,
            self.duration
        )
    }
}

impl fmt::Display for MethodItem {
    /// Report line: `depth,methodId,count,duration`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.depth, self.method_id, self.count, self.duration
        )
    }
}
