//! Trim policy used by the CLI.

use crate::aggregator::{MethodItem, TrimPolicy};
use crate::utils::config::FilterConfig;
use log::warn;

/// Drops frames shorter than `pass * cycle_ms`, then hard-cuts the tail
#[derive(Debug, Clone)]
pub struct CycleFilterPolicy {
    pub cycle_ms: u32,
    pub max_passes: u32,
    pub target: usize,
}

impl CycleFilterPolicy {
    pub fn new(filter: &FilterConfig, target: usize) -> Self {
        Self {
            cycle_ms: filter.cycle_ms,
            max_passes: filter.max_passes,
            target,
        }
    }
}

impl TrimPolicy for CycleFilterPolicy {
    fn should_filter(&self, duration: u32, pass: u32) -> bool {
        duration < pass.saturating_mul(self.cycle_ms)
    }

    fn max_passes(&self) -> u32 {
        self.max_passes
    }

    fn fallback(&self, items: &mut Vec<MethodItem>, current_size: usize) {
        warn!(
            "[trim] size:{} target size:{}, cutting tail",
            current_size, self.target
        );
        items.truncate(current_size.min(self.target));
    }
}
