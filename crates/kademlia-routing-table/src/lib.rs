//! A Kademlia routing table: the in-memory structure a DHT peer uses to
//! remember other peers by XOR distance, and to answer "who do I know
//! closest to X?" and "how do I absorb a new observation without
//! forgetting a useful one?"
//!
//! The identifier space is partitioned into contiguous [`kbucket::KBucket`]s
//! that split on demand near the local identity and stay coarse far from
//! it — the standard Kademlia geometry. [`routing_table::RoutingTable`] is
//! the entry point; [`identifier::Identifier`] and [`contact::Contact`] are
//! its vocabulary.

pub mod clock;
pub mod contact;
pub mod error;
pub mod identifier;
pub mod kbucket;
pub mod random;
pub mod routing_table;

pub use clock::Clock;
pub use contact::Contact;
pub use error::{Result, RoutingError};
pub use identifier::{distance, Identifier};
pub use kbucket::{BucketFull, CachingKBucket, KBucket};
pub use random::RandomSource;
pub use routing_table::RoutingTable;

/// Width, in bits, of the identifier space.
pub const BIT_NODE_ID_LEN: usize = 160;

/// Width, in hex characters, of an identifier's canonical textual form.
pub const HEX_NODE_ID_LEN: usize = BIT_NODE_ID_LEN / 4;

/// Maximum number of contacts held directly in a bucket.
pub const K: usize = 24;

/// Maximum number of contacts held in a bucket's replacement cache.
pub const CACHE_K: usize = 32;

/// Seconds since last touch after which a bucket is considered stale and
/// due for refresh.
pub const REFRESH_TIMEOUT: u64 = 3600;

/// Degree of parallelism for iterative lookups. Consumed by the caller
/// performing lookups against [`RoutingTable::find_close_nodes`]; the
/// routing table itself has no notion of concurrency in its operations.
pub const ALPHA: usize = 3;
