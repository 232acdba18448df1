//! Reconstruction of call stacks from raw trace buffers.
//!
//! This module transforms captured enter/exit records into:
//! - Completed method frames (stack_builder)
//! - A call tree and its chronological flattening (tree)
//! - A size-bounded frame list (trimmer)
//! - A grouping key for the dominant frame (key)

pub mod key;
pub mod method_item;
pub mod metrics;
pub mod stack_builder;
pub mod tree;
pub mod trimmer;

// Re-export main types and functions
pub use key::{tree_key, tree_key_with_ratio};
pub use method_item::MethodItem;
pub use metrics::{dump_stack, stack_cost, StackDump};
pub use stack_builder::{structured_data_to_stack, MethodStack, StackReconstructor};
pub use tree::{NodeId, TraceTree, TreeNode};
pub use trimmer::{trim_stack, TrimPolicy};
