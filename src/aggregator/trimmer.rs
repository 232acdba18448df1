//! Bound a frame list to a target size under a caller-supplied policy.
//!
//! Each pass walks from the tail toward the head removing frames the policy
//! filters for that pass, stopping as soon as the list fits. Passes escalate
//! until the policy's pass bound; anything left over is handed to the
//! policy's fallback.

use super::method_item::MethodItem;
use log::debug;

/// Cost policy driving [`trim_stack`]
///
/// **Public** - implemented by callers; the core ships no default
pub trait TrimPolicy {
    /// Whether a frame of `duration` ms should go on pass `pass` (1-based)
    fn should_filter(&self, duration: u32, pass: u32) -> bool;

    /// Highest pass number that will be run
    fn max_passes(&self) -> u32;

    /// Last-resort truncation when the filter passes were not enough
    ///
    /// `current_size` is the list length at the time of the call. The policy
    /// owns the final bound.
    fn fallback(&self, items: &mut Vec<MethodItem>, current_size: usize);
}

/// Trim `items` down to `target_count`
///
/// **Public** - main entry point for stack trimming
///
/// # Arguments
/// * `items` - frames in report order, trimmed in place
/// * `target_count` - size to reach; negative clears the list
/// * `policy` - filter predicate, pass bound and fallback
pub fn trim_stack(items: &mut Vec<MethodItem>, target_count: isize, policy: &dyn TrimPolicy) {
    if target_count < 0 {
        items.clear();
        return;
    }
    let target = target_count as usize;

    let mut pass = 1u32;
    while items.len() > target {
        let mut index = items.len();
        while index > 0 {
            index -= 1;
            if policy.should_filter(items[index].duration, pass) {
                items.remove(index);
                if items.len() <= target {
                    debug!("Trimmed to {} items on pass {}", items.len(), pass);
                    return;
                }
            }
        }

        pass += 1;
        if pass > policy.max_passes() {
            break;
        }
    }

    let size = items.len();
    if size > target {
        debug!("Filter passes left {} items, target {}, falling back", size, target);
        policy.fallback(items, size);
    }
}
