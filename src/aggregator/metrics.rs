//! Text dumps and cost figures for a reconstructed stack.

use super::method_item::MethodItem;
use log::debug;

/// Rendered stack plus its cost
///
/// **Public** - returned from dump_stack
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackDump {
    /// One `depth,methodId,count,duration` line per frame
    pub report: String,

    /// Human readable listing with dot-indented frames
    pub pretty: String,

    /// Longest single frame, used as the cost of the whole stack
    pub stack_cost: u64,
}

/// Render frames for reporting and compute the stack cost
///
/// **Public** - main entry point for metrics
pub fn dump_stack(items: &[MethodItem]) -> StackDump {
    let mut report = String::new();
    let mut pretty = String::from("|*\t\tTraceStack:\n|*\t\t[id count cost]\n");

    for item in items {
        report.push_str(&item.to_string());
        report.push('\n');
        pretty.push_str("|*\t\t");
        pretty.push_str(&item.print());
        pretty.push('\n');
    }

    let stack_cost = stack_cost(items);
    debug!("Dumped {} frames, stack cost {}", items.len(), stack_cost);

    StackDump {
        report,
        pretty,
        stack_cost,
    }
}

/// Longest frame duration, 0 for an empty stack
pub fn stack_cost(items: &[MethodItem]) -> u64 {
    items
        .iter()
        .map(|item| item.duration as u64)
        .max()
        .unwrap_or(0)
}
