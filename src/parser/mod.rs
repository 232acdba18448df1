//! Buffer input, record decoding and report schema.
//!
//! This module handles:
//! - Loading captured buffers from disk
//! - Decoding packed enter/exit records
//! - Defining output schema

pub mod buffer;
pub mod event;
pub mod schema;

// Re-export main types
pub use buffer::{load_buffer, max_timestamp, parse_buffer_bytes, parse_buffer_json};
pub use event::{decode, RawEvent};
pub use schema::TraceReport;
