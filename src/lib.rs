//! Trace Canary
//!
//! Call-stack reconstruction for method enter/exit trace buffers.
//!
//! A capture mechanism records one packed 64-bit word per method enter or
//! exit into a per-thread ring buffer. This crate turns such a buffer back
//! into a nested call tree, trims it to a bounded size under a caller-supplied
//! policy, and derives a grouping key for the frame dominating its cost.
//!
//! ## Getting Started
//!
//! ```bash
//! trace-canary analyze --input buffer.bin --summary
//! ```
//!
//! As a library:
//!
//! ```ignore
//! use trace_canary::aggregator::{structured_data_to_stack, stack_cost, tree_key, StackReconstructor};
//!
//! let stack = structured_data_to_stack(&buffer, &StackReconstructor::new(true).with_end_time(now));
//! let key = tree_key(&stack.items, stack_cost(&stack.items));
//! ```

pub mod aggregator;
pub mod commands;
pub mod output;
pub mod parser;
pub mod utils;
