//! Error types for the routing table.

use thiserror::Error;

/// The one error the routing table's public API can return.
///
/// `BadIdentifier` covers every way a caller-supplied identifier can be
/// unusable: wrong hex length, out of the `[0, 2^160)` space, or (an
/// invariant violation, never user error) no bucket responsible for it.
/// The bucket-level `BucketFull` signal is a separate, smaller error type
/// (see [`crate::kbucket::BucketFull`]) that never reaches this enum — it
/// is absorbed internally by [`crate::routing_table::RoutingTable::add_contact`]
/// as a split-and-retry or a replacement-cache insert.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("bad identifier: {0}")]
    BadIdentifier(String),
}

pub type Result<T> = std::result::Result<T, RoutingError>;
