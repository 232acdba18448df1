//! Grouping key for a reconstructed stack.
//!
//! The key is the method id of the frame that dominates the stack's cost,
//! weighted toward deeper frames so a leaf doing the work wins over the
//! callers merely containing it.

use super::method_item::MethodItem;
use crate::utils::config::{FILTER_STACK_KEY_ALL_PERCENT, METHOD_ID_DISPATCH};
use log::debug;

/// Key using the default cost ratio
///
/// **Public** - main entry point for key extraction
pub fn tree_key(items: &[MethodItem], total_cost: u64) -> String {
    tree_key_with_ratio(items, total_cost, FILTER_STACK_KEY_ALL_PERCENT)
}

/// Key using an explicit cost ratio
///
/// # Arguments
/// * `items` - frames in chronological order
/// * `total_cost` - cost of the whole stack, usually its longest frame
/// * `all_percent` - share of `total_cost` a frame needs to be a candidate
///
/// # Returns
/// Decimal method id, or an empty string when there are no frames
pub fn tree_key_with_ratio(items: &[MethodItem], total_cost: u64, all_percent: f64) -> String {
    let threshold = (total_cost as f64 * all_percent) as u64;

    let mut candidates: Vec<&MethodItem> = items
        .iter()
        .filter(|item| item.duration as u64 >= threshold)
        .collect();

    // sort_by is stable, ties keep stack order
    candidates.sort_by(|a, b| weight(b).cmp(&weight(a)));

    if candidates.is_empty() {
        if let Some(first) = items.first() {
            candidates.push(first);
        }
    } else if candidates.len() > 1 && candidates[0].method_id == METHOD_ID_DISPATCH {
        candidates.remove(0);
    }

    debug!(
        "[tree_key] items: {}, cost: {}, threshold: {}, candidates: {}",
        items.len(),
        total_cost,
        threshold,
        candidates.len()
    );

    candidates
        .first()
        .map(|item| item.method_id.to_string())
        .unwrap_or_default()
}

fn weight(item: &MethodItem) -> u64 {
    (item.depth as u64 + 1) * item.duration as u64
}
