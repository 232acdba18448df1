//! Decoding of packed 64-bit method trace records.
//!
//! Layout (most significant bit first):
//! - bit 63: direction, 1 = enter, 0 = exit
//! - bits 62..43: method id (20 bits)
//! - bits 42..0: timestamp in milliseconds (43 bits)
//!
//! A record of exactly zero is ring-buffer padding and must be skipped by the
//! caller before decoding.

use crate::utils::config::{METHOD_ID_MASK, TIMESTAMP_BITS, TIMESTAMP_MASK};
use std::fmt;

const DIRECTION_BIT: u64 = 1 << 63;

/// One decoded enter or exit record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub is_enter: bool,
    pub method_id: u32,
    pub timestamp: u64,
}

impl RawEvent {
    /// Decode a packed record
    pub fn decode(raw: u64) -> Self {
        Self {
            is_enter: raw & DIRECTION_BIT != 0,
            method_id: ((raw >> TIMESTAMP_BITS) & METHOD_ID_MASK) as u32,
            timestamp: raw & TIMESTAMP_MASK,
        }
    }

    /// Enter record, fields masked to their widths
    pub fn enter(method_id: u32, timestamp: u64) -> Self {
        Self::new(true, method_id, timestamp)
    }

    /// Exit record, fields masked to their widths
    pub fn exit(method_id: u32, timestamp: u64) -> Self {
        Self::new(false, method_id, timestamp)
    }

    fn new(is_enter: bool, method_id: u32, timestamp: u64) -> Self {
        Self {
            is_enter,
            method_id: (method_id as u64 & METHOD_ID_MASK) as u32,
            timestamp: timestamp & TIMESTAMP_MASK,
        }
    }

    /// Re-encode into the packed layout
    pub fn pack(&self) -> u64 {
        let direction = if self.is_enter { DIRECTION_BIT } else { 0 };
        direction
            | ((self.method_id as u64 & METHOD_ID_MASK) << TIMESTAMP_BITS)
            | (self.timestamp & TIMESTAMP_MASK)
    }
}

impl fmt::Display for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.is_enter { "in" } else { "out" };
        write!(f, "{}({})@{}", direction, self.method_id, self.timestamp)
    }
}

/// Decode a packed record
///
/// Free-function form of [`RawEvent::decode`].
pub fn decode(raw: u64) -> RawEvent {
    RawEvent::decode(raw)
}
