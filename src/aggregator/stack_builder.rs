//! Rebuild method frames from a captured enter/exit buffer.
//!
//! The buffer is a flat, possibly truncated stream of packed records. Enter
//! records are pushed on a pending stack; each exit pops until it finds its
//! enter. The output is ordered most-recently-completed first, which is the
//! order the tree builder expects.
//!
//! Example (non-strict):
//! `in(1)@0 in(2)@1 out(2)@5 out(1)@10` yields `[1 dur=10 depth=0, 2 dur=4 depth=1]`.

use super::method_item::MethodItem;
use super::tree::TraceTree;
use crate::parser::event::RawEvent;
use crate::utils::config::METHOD_ID_DISPATCH;
use log::{debug, error, warn};
use std::collections::VecDeque;
use thiserror::Error;

/// A frame closed before it opened; the whole buffer is untrustworthy
#[derive(Error, Debug)]
#[error("trace duration invalid: method[{method_id}] during {duration}")]
struct NegativeDuration {
    method_id: u32,
    duration: i64,
}

/// Enter/exit matcher over one thread's buffer
///
/// **Public** - main entry point for reconstruction
///
/// End time and time-base offset are only used in strict mode, to close
/// frames that were still open when the buffer was captured. Both are in the
/// same millisecond units as the embedded timestamps.
#[derive(Debug, Clone, Default)]
pub struct StackReconstructor {
    strict: bool,
    end_time: i64,
    time_offset: i64,
}

impl StackReconstructor {
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            ..Default::default()
        }
    }

    pub fn with_end_time(mut self, end_time: i64) -> Self {
        self.end_time = end_time;
        self
    }

    pub fn with_time_offset(mut self, time_offset: i64) -> Self {
        self.time_offset = time_offset;
        self
    }

    /// Match enters with exits and emit completed frames
    ///
    /// # Arguments
    /// * `buffer` - packed records in capture order, zero entries are padding
    ///
    /// # Returns
    /// Frames ordered most-recently-completed first. Empty when any frame
    /// would have a negative duration.
    ///
    /// # Algorithm
    /// 1. In strict mode skip everything before the first dispatch enter
    /// 2. Push enters, resetting depth on dispatch
    /// 3. Pop on exit until the matching enter is found
    /// 4. In strict mode close still-open frames at `end_time`
    pub fn reconstruct(&self, buffer: &[u64]) -> Vec<MethodItem> {
        match self.replay(buffer) {
            Ok(items) => items,
            Err(e) => {
                error!("[reconstruct] {}", e);
                Vec::new()
            }
        }
    }

    fn replay(&self, buffer: &[u64]) -> Result<Vec<MethodItem>, NegativeDuration> {
        let mut state = ReplayState::default();
        let mut begun = !self.strict;
        let (mut enters, mut exits, mut skipped) = (0usize, 0usize, 0usize);

        for &raw in buffer {
            if raw == 0 {
                skipped += 1;
                continue;
            }
            let event = RawEvent::decode(raw);

            if self.strict {
                if event.is_enter && event.method_id == METHOD_ID_DISPATCH {
                    begun = true;
                }
                if !begun {
                    skipped += 1;
                    continue;
                }
            }

            if event.is_enter {
                enters += 1;
                state.enter(event);
            } else {
                exits += 1;
                state.exit(event)?;
            }
        }

        debug!(
            "Replayed {} records: {} in, {} out, {} skipped, {} pending",
            buffer.len(),
            enters,
            exits,
            skipped,
            state.pending.len()
        );

        if self.strict {
            state.close_pending(self.end_time, self.time_offset)?;
        }

        Ok(state.result.into())
    }
}

/// Working state for one reconstruction
///
/// **Private** - owned by a single `replay` call
#[derive(Default)]
struct ReplayState {
    pending: Vec<RawEvent>,

    // Signed: a dispatch reset under still-open frames lets exits go below zero
    depth: i64,

    result: VecDeque<MethodItem>,
}

impl ReplayState {
    fn enter(&mut self, event: RawEvent) {
        if event.method_id == METHOD_ID_DISPATCH {
            self.depth = 0;
        }
        self.depth += 1;
        self.pending.push(event);
    }

    fn exit(&mut self, event: RawEvent) -> Result<(), NegativeDuration> {
        let Some(mut enter) = self.pending.pop() else {
            warn!("[reconstruct] method[{}] not found in!", event.method_id);
            return Ok(());
        };
        self.depth -= 1;

        let mut held = vec![enter];
        while enter.method_id != event.method_id {
            let Some(next) = self.pending.pop() else {
                break;
            };
            warn!(
                "pop in method[{}] to continue matching out method[{}]",
                enter.method_id, event.method_id
            );
            enter = next;
            self.depth -= 1;
            held.push(next);
        }

        if enter.method_id != event.method_id {
            if enter.method_id == METHOD_ID_DISPATCH {
                error!(
                    "in method[{}] != out method[{}], throwing this out method away",
                    enter.method_id, event.method_id
                );
                self.depth += held.len() as i64;
                self.pending.extend(held.into_iter().rev());
            } else {
                warn!(
                    "out method[{}] matched nothing, dropped {} pending frames",
                    event.method_id,
                    held.len()
                );
            }
            return Ok(());
        }

        let duration = event.timestamp as i64 - enter.timestamp as i64;
        if duration < 0 {
            return Err(NegativeDuration {
                method_id: event.method_id,
                duration,
            });
        }

        self.emit(MethodItem::new(
            event.method_id,
            clamp_duration(duration),
            self.depth.max(0) as u32,
        ));
        Ok(())
    }

    /// Synthesize frames for enters that never saw their exit
    fn close_pending(&mut self, end_time: i64, time_offset: i64) -> Result<(), NegativeDuration> {
        while let Some(entry) = self.pending.pop() {
            let in_time = entry.timestamp as i64 + time_offset;
            warn!(
                "[reconstruct] method[{}] never out, is_in:{}, in_time:{}, end_time:{}, pending:{}",
                entry.method_id,
                entry.is_enter,
                in_time,
                end_time,
                self.pending.len()
            );
            if !entry.is_enter {
                error!("[reconstruct] why has out method[{}] pending?", entry.method_id);
                continue;
            }

            let duration = end_time - in_time;
            if duration < 0 {
                return Err(NegativeDuration {
                    method_id: entry.method_id,
                    duration,
                });
            }
            self.emit(MethodItem::new(
                entry.method_id,
                clamp_duration(duration),
                self.pending.len() as u32,
            ));
        }
        Ok(())
    }

    /// Push a frame, folding it into the previous one if it repeats it
    fn emit(&mut self, item: MethodItem) {
        match self.result.front_mut() {
            Some(last) if last.is_repeat_of(&item) => last.merge(&item),
            _ => self.result.push_front(item),
        }
    }
}

fn clamp_duration(duration: i64) -> u32 {
    u32::try_from(duration).unwrap_or(u32::MAX)
}

/// Reconstructed frames plus the tree they were ordered by
#[derive(Debug, Clone, Default)]
pub struct MethodStack {
    /// Frames in chronological pre-order (or reconstruction order if the tree failed)
    pub items: Vec<MethodItem>,

    /// Call tree, empty when it was malformed
    pub tree: TraceTree,

    /// Nodes created by the tree builder, 0 when the tree was malformed
    pub tree_nodes: usize,
}

/// Full pipeline: reconstruct, build the call tree, flatten it back
///
/// **Public** - used by the analyze command
///
/// When the tree cannot be built the reconstruction output is returned as-is.
pub fn structured_data_to_stack(buffer: &[u64], reconstructor: &StackReconstructor) -> MethodStack {
    let items = reconstructor.reconstruct(buffer);
    let (tree, tree_nodes) = TraceTree::build(&items);

    if tree_nodes == 0 {
        if !buffer.is_empty() {
            warn!(
                "buffer has {} records but no tree was built from {} items",
                buffer.len(),
                items.len()
            );
        }
        return MethodStack {
            items,
            tree,
            tree_nodes,
        };
    }

    debug!("stack_to_tree: count={}", tree_nodes);
    MethodStack {
        items: tree.flatten(),
        tree,
        tree_nodes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::DEFAULT_ANR_MS;

    fn enter(id: u32, t: u64) -> u64 {
        RawEvent::enter(id, t).pack()
    }

    fn exit(id: u32, t: u64) -> u64 {
        RawEvent::exit(id, t).pack()
    }

    #[test]
    fn test_nested_pair() {
        let buffer = vec![enter(1, 0), enter(2, 1), exit(2, 5), exit(1, 10)];
        let items = StackReconstructor::new(false).reconstruct(&buffer);

        assert_eq!(
            items,
            vec![MethodItem::new(1, 10, 0), MethodItem::new(2, 4, 1)]
        );
    }

    #[test]
    fn test_padding_skipped() {
        let buffer = vec![0, enter(1, 0), 0, exit(1, 3), 0];
        let items = StackReconstructor::new(false).reconstruct(&buffer);
        assert_eq!(items, vec![MethodItem::new(1, 3, 0)]);
    }

    #[test]
    fn test_exit_without_enter_is_skipped() {
        let buffer = vec![exit(9, 1), enter(1, 2), exit(1, 4)];
        let items = StackReconstructor::new(false).reconstruct(&buffer);
        assert_eq!(items, vec![MethodItem::new(1, 2, 0)]);
    }

    #[test]
    fn test_mismatch_pops_until_match() {
        // 3 never exits; the exit of 1 unwinds through it
        let buffer = vec![enter(1, 0), enter(2, 1), enter(3, 2), exit(1, 9)];
        let items = StackReconstructor::new(false).reconstruct(&buffer);
        assert_eq!(items, vec![MethodItem::new(1, 9, 0)]);
    }

    #[test]
    fn test_dispatch_boundary_restores_pending() {
        let buffer = vec![enter(METHOD_ID_DISPATCH, 0), enter(1, 1), exit(3, 2)];

        let mut state = ReplayState::default();
        for raw in &buffer {
            let event = RawEvent::decode(*raw);
            if event.is_enter {
                state.enter(event);
            } else {
                state.exit(event).unwrap();
            }
        }

        assert!(state.result.is_empty());
        assert_eq!(state.depth, 2);
        assert_eq!(
            state.pending,
            vec![RawEvent::enter(METHOD_ID_DISPATCH, 0), RawEvent::enter(1, 1)]
        );
    }

    #[test]
    fn test_unmatched_without_dispatch_consumes_pending() {
        let buffer = vec![enter(1, 0), enter(2, 1), exit(3, 2), enter(4, 3), exit(4, 5)];
        let items = StackReconstructor::new(false).reconstruct(&buffer);

        // 1 and 2 were unwound, so 4 closes at the top level
        assert_eq!(items, vec![MethodItem::new(4, 2, 0)]);
    }

    #[test]
    fn test_negative_duration_aborts() {
        let buffer = vec![enter(5, 0), exit(5, 3), enter(1, 10), exit(1, 4)];
        assert!(StackReconstructor::new(false).reconstruct(&buffer).is_empty());
    }

    #[test]
    fn test_repeated_leaf_calls_merge() {
        let buffer = vec![
            enter(1, 0),
            enter(2, 1),
            exit(2, 3),
            enter(2, 3),
            exit(2, 6),
            enter(2, 6),
            exit(2, 7),
            exit(1, 10),
        ];
        let items = StackReconstructor::new(false).reconstruct(&buffer);

        let mut leaf = MethodItem::new(2, 6, 1);
        leaf.count = 3;
        assert_eq!(items, vec![MethodItem::new(1, 10, 0), leaf]);
    }

    #[test]
    fn test_top_level_repeats_do_not_merge() {
        let buffer = vec![enter(1, 0), exit(1, 1), enter(1, 1), exit(1, 2)];
        let items = StackReconstructor::new(false).reconstruct(&buffer);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_anr_placeholder_merge() {
        let buffer = vec![
            enter(1, 0),
            enter(2, 0),
            exit(2, 40),
            enter(2, 40),
            exit(2, 40 + DEFAULT_ANR_MS as u64),
            exit(1, 6000),
        ];
        let items = StackReconstructor::new(false).reconstruct(&buffer);

        assert_eq!(items[1].count, 2);
        assert_eq!(items[1].duration, 80);
    }

    #[test]
    fn test_strict_skips_until_dispatch() {
        let buffer = vec![
            enter(7, 0),
            exit(7, 1),
            enter(METHOD_ID_DISPATCH, 2),
            enter(1, 3),
            exit(1, 5),
            exit(METHOD_ID_DISPATCH, 8),
        ];
        let items = StackReconstructor::new(true).reconstruct(&buffer);

        assert_eq!(
            items,
            vec![
                MethodItem::new(METHOD_ID_DISPATCH, 6, 0),
                MethodItem::new(1, 2, 1),
            ]
        );
    }

    #[test]
    fn test_dispatch_resets_depth() {
        let buffer = vec![
            enter(METHOD_ID_DISPATCH, 0),
            exit(METHOD_ID_DISPATCH, 2),
            enter(METHOD_ID_DISPATCH, 3),
            enter(1, 4),
            exit(1, 6),
            exit(METHOD_ID_DISPATCH, 9),
        ];
        let items = StackReconstructor::new(false).reconstruct(&buffer);

        assert_eq!(items[0], MethodItem::new(METHOD_ID_DISPATCH, 6, 0));
        assert_eq!(items[1], MethodItem::new(1, 2, 1));
        assert_eq!(items[2], MethodItem::new(METHOD_ID_DISPATCH, 2, 0));
    }

    #[test]
    fn test_strict_closes_open_frames() {
        let buffer = vec![enter(METHOD_ID_DISPATCH, 10), enter(1, 20)];
        let items = StackReconstructor::new(true)
            .with_end_time(150)
            .with_time_offset(100)
            .reconstruct(&buffer);

        // Top of the pending stack closes first, at depth 1
        assert_eq!(
            items,
            vec![
                MethodItem::new(METHOD_ID_DISPATCH, 40, 0),
                MethodItem::new(1, 30, 1),
            ]
        );
    }

    #[test]
    fn test_non_strict_leaves_open_frames() {
        let buffer = vec![enter(1, 0), enter(2, 1), exit(2, 4)];
        let items = StackReconstructor::new(false)
            .with_end_time(100)
            .reconstruct(&buffer);
        assert_eq!(items, vec![MethodItem::new(2, 3, 1)]);
    }

    #[test]
    fn test_strict_negative_synthesized_duration_aborts() {
        let buffer = vec![enter(METHOD_ID_DISPATCH, 10), enter(1, 20), exit(1, 30)];
        let items = StackReconstructor::new(true)
            .with_end_time(5)
            .reconstruct(&buffer);
        assert!(items.is_empty());
    }

    #[test]
    fn test_pipeline_restores_chronological_order() {
        // 1 { 2 { 4 }, 3 }
        let buffer = vec![
            enter(1, 0),
            enter(2, 1),
            enter(4, 2),
            exit(4, 3),
            exit(2, 5),
            enter(3, 6),
            exit(3, 8),
            exit(1, 10),
        ];
        let stack = structured_data_to_stack(&buffer, &StackReconstructor::new(false));

        let ids: Vec<u32> = stack.items.iter().map(|i| i.method_id).collect();
        assert_eq!(ids, vec![1, 2, 4, 3]);
        assert_eq!(stack.tree_nodes, 4);
    }

    #[test]
    fn test_pipeline_falls_back_to_flat_items() {
        // 1 is still open, so the first closed item sits at depth 1
        let buffer = vec![enter(1, 0), enter(2, 1), exit(2, 4)];
        let stack = structured_data_to_stack(&buffer, &StackReconstructor::new(false));

        assert_eq!(stack.tree_nodes, 0);
        assert_eq!(stack.items, vec![MethodItem::new(2, 3, 1)]);
    }
}
