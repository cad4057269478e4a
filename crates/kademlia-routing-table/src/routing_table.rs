//! The routing table: a dynamic partition of the identifier space into k-buckets.

use primitive_types::U256;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::contact::Contact;
use crate::error::{Result, RoutingError};
use crate::identifier::{self, Identifier};
use crate::kbucket::CachingKBucket;
use crate::random::{RandomSource, ThreadRandomSource};
use crate::{K, REFRESH_TIMEOUT};

/// An ordered, contiguous, exhaustive partition of the 160-bit identifier
/// space into [`CachingKBucket`]s, indexed by a local identity (`own_guid`)
/// that can never itself be stored.
///
/// Designed for a single logical mutator (see the crate's concurrency
/// notes) — callers that need shared access wrap the whole table in a
/// lock rather than locking individual buckets, since [`Self::add_contact`]
/// may rewrite the bucket vector.
pub struct RoutingTable {
    own_guid: Identifier,
    buckets: Vec<CachingKBucket>,
    clock: Box<dyn Clock>,
    random: Box<dyn RandomSource>,
}

impl RoutingTable {
    /// Creates a table for `own_guid`, initially a single bucket spanning
    /// the whole identifier space, using the system clock and the
    /// thread-local CSPRNG.
    pub fn new(own_guid: Identifier) -> Self {
        Self::with_clock_and_random(own_guid, Box::new(SystemClock), Box::new(ThreadRandomSource))
    }

    /// Creates a table with an explicitly injected [`Clock`] and
    /// [`RandomSource`], for deterministic tests or alternative runtimes.
    pub fn with_clock_and_random(own_guid: Identifier, clock: Box<dyn Clock>, random: Box<dyn RandomSource>) -> Self {
        let root = CachingKBucket::new(U256::zero(), Identifier::space_size(), clock.as_ref());
        RoutingTable {
            own_guid,
            buckets: vec![root],
            clock,
            random,
        }
    }

    pub fn own_guid(&self) -> Identifier {
        self.own_guid
    }

    /// The number of buckets currently in the partition.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of contacts across all buckets (cache excluded).
    pub fn contact_count(&self) -> usize {
        self.buckets.iter().map(CachingKBucket::len).sum()
    }

    /// Finds the index of the bucket responsible for `guid` by binary
    /// search over `range_min`/`range_max`.
    ///
    /// This is an internal invariant check, not user-facing validation:
    /// every identifier in `[0, 2^160)` is covered by exactly one bucket,
    /// so a miss here means the partition invariant broke.
    fn bucket_index(&self, guid: &Identifier) -> usize {
        let n = guid.as_u256();
        self.buckets
            .binary_search_by(|bucket| {
                if n < bucket.range_min() {
                    std::cmp::Ordering::Greater
                } else if n >= bucket.range_max() {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .expect("every identifier in the space is covered by exactly one bucket")
    }

    /// Records an observed peer.
    ///
    /// A contact sharing `own_guid` is always rejected (logged, not an
    /// error). Otherwise the contact is routed to its bucket; a full
    /// bucket is split and retried if `own_guid` falls in its range,
    /// cached as a replacement candidate otherwise.
    pub fn add_contact(&mut self, contact: Contact) -> Result<()> {
        if contact.guid == self.own_guid {
            info!(guid = %contact.guid, "rejecting self-add to routing table");
            return Ok(());
        }

        loop {
            let index = self.bucket_index(&contact.guid);
            match self.buckets[index].add_contact(contact.clone()) {
                Ok(()) => {
                    self.buckets[index].touch(self.clock.as_ref());
                    debug!(guid = %contact.guid, bucket = index, "added contact");
                    return Ok(());
                }
                Err(_full) => {
                    if self.buckets[index].guid_in_range(&self.own_guid) {
                        let new_bucket = self.buckets[index].split(self.clock.as_ref());
                        info!(bucket = index, "splitting full bucket containing own guid");
                        self.buckets.insert(index + 1, new_bucket);
                    } else {
                        debug!(guid = %contact.guid, bucket = index, "caching contact as replacement candidate");
                        self.buckets[index].cache_contact(contact);
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Returns the stored contact with the given guid, touching its
    /// bucket on success. `None` if no such contact is known.
    pub fn get_contact(&mut self, guid: &Identifier) -> Option<Contact> {
        let index = self.bucket_index(guid);
        let found = self.buckets[index].get_contact(guid).cloned();
        if found.is_some() {
            self.buckets[index].touch(self.clock.as_ref());
        }
        found
    }

    /// Removes `contact` by guid, refilling from the replacement cache.
    /// A no-op if it wasn't present.
    pub fn remove_contact(&mut self, contact: &Contact) {
        self.remove_guid(&contact.guid);
    }

    /// Removes the contact with the given guid, refilling from the
    /// replacement cache. A no-op if it wasn't present.
    pub fn remove_guid(&mut self, guid: &Identifier) {
        let index = self.bucket_index(guid);
        self.buckets[index].remove_guid(guid);
    }

    /// Returns up to `count` contacts (default [`K`]) closest to
    /// `target_guid`, optionally excluding `sender_guid`, by visiting
    /// buckets outward from the target's own bucket in alternating
    /// shell order.
    pub fn find_close_nodes(
        &self,
        target_guid: &Identifier,
        count: Option<usize>,
        sender_guid: Option<&Identifier>,
    ) -> Vec<Contact> {
        let count = count.unwrap_or(K);
        if count == 0 {
            return Vec::new();
        }

        let origin = self.bucket_index(target_guid);
        let mut accumulated = Vec::with_capacity(count);

        for index in spiral_indices(origin, self.buckets.len()) {
            if accumulated.len() >= count {
                break;
            }
            let remaining = count - accumulated.len();
            accumulated.extend(self.buckets[index].get_contacts(Some(remaining), sender_guid));
        }

        accumulated
    }

    /// For each bucket stale by more than [`REFRESH_TIMEOUT`] (or every
    /// bucket, if `force`), returns one uniformly random identifier in
    /// that bucket's range, suitable as a lookup target to rehydrate it.
    pub fn get_refresh_list(&self, force: bool) -> Result<Vec<Identifier>> {
        let mut targets = Vec::new();
        for bucket in &self.buckets {
            if force || bucket.is_stale(self.clock.as_ref(), REFRESH_TIMEOUT) {
                let target = identifier::random_in_range(bucket.range_min(), bucket.range_max(), self.random.as_ref())
                    .map_err(|_| RoutingError::BadIdentifier(format!("empty bucket range during refresh at [{:#x}, {:#x})", bucket.range_min(), bucket.range_max())))?;
                targets.push(target);
            }
        }
        Ok(targets)
    }
}

/// Generates bucket indices outward from `origin`, alternating low/high:
/// `origin, origin-1, origin+1, origin-2, origin+2, ...`, clamped to
/// `[0, len)` and skipping sides that run out before the other.
fn spiral_indices(origin: usize, len: usize) -> impl Iterator<Item = usize> {
    let mut indices = Vec::with_capacity(len);
    if origin < len {
        indices.push(origin);
    }
    let mut offset: usize = 1;
    loop {
        let low = origin.checked_sub(offset);
        let high = origin + offset;
        let low_valid = low.is_some();
        let high_valid = high < len;
        if !low_valid && !high_valid {
            break;
        }
        if let Some(low) = low {
            indices.push(low);
        }
        if high_valid {
            indices.push(high);
        }
        offset += 1;
    }
    indices.into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::random::FixedRandomSource;

    fn id(n: u64) -> Identifier {
        Identifier::from_u256(U256::from(n)).unwrap()
    }

    fn contact(n: u64) -> Contact {
        Contact::new("127.0.0.1", 1, id(n))
    }

    fn table_with(own: u64, now: u64) -> RoutingTable {
        RoutingTable::with_clock_and_random(
            id(own),
            Box::new(FixedClock::new(now)),
            Box::new(FixedRandomSource(U256::zero())),
        )
    }

    #[test]
    fn starts_as_a_single_bucket_spanning_the_whole_space() {
        let table = table_with(1, 0);
        assert_eq!(table.bucket_count(), 1);
        assert_eq!(table.contact_count(), 0);
    }

    #[test]
    fn rejects_self_add() {
        let mut table = table_with(1, 0);
        table.add_contact(contact(1)).unwrap();
        assert_eq!(table.contact_count(), 0);
        assert!(table.get_contact(&id(1)).is_none());
    }

    #[test]
    fn find_close_nodes_on_an_empty_table_returns_nothing() {
        let table = table_with(1, 0);
        assert_eq!(table.find_close_nodes(&id(42), None, None), Vec::new());
    }

    #[test]
    fn refresh_list_is_empty_when_fresh_and_one_identifier_when_forced() {
        let table = table_with(1, 1_000);
        assert_eq!(table.get_refresh_list(false).unwrap(), Vec::new());
        let forced = table.get_refresh_list(true).unwrap();
        assert_eq!(forced.len(), 1);
    }

    #[test]
    fn splits_on_overflow_when_own_guid_is_in_range() {
        let mut table = table_with(1, 0);
        for i in 2..=K as u64 + 1 {
            table.add_contact(contact(i)).unwrap();
        }
        assert_eq!(table.bucket_count(), 1);
        assert_eq!(table.contact_count(), K);

        let top = Identifier::space_size() - U256::one();
        table.add_contact(Contact::new("1.1.1.1", 1, Identifier::from_u256(top).unwrap())).unwrap();

        assert_eq!(table.bucket_count(), 2);
        assert_eq!(table.contact_count(), K + 1);
    }

    #[test]
    fn caches_overflow_in_the_bucket_not_holding_own_guid() {
        let mut table = table_with(1, 0);
        for i in 2..=K as u64 + 1 {
            table.add_contact(contact(i)).unwrap();
        }
        let top = Identifier::space_size() - U256::one();
        let top_id = Identifier::from_u256(top).unwrap();
        table.add_contact(Contact::new("1.1.1.1", 1, top_id)).unwrap();
        assert_eq!(table.bucket_count(), 2);

        let high_index = table.bucket_index(&top_id);
        // Fill the high bucket to capacity (it already holds one contact, `top_id`).
        for i in 1..K as u64 {
            let guid = Identifier::from_u256(top - U256::from(i)).unwrap();
            table.add_contact(Contact::new("1.1.1.1", 1, guid)).unwrap();
        }
        assert_eq!(table.buckets[high_index].len(), K);

        let before = table.contact_count();
        let overflow_guid = Identifier::from_u256(top - U256::from(K as u64)).unwrap();
        table.add_contact(Contact::new("2.2.2.2", 2, overflow_guid)).unwrap();

        assert_eq!(table.contact_count(), before);
        assert!(table.buckets[high_index].get_contact(&overflow_guid).is_none());
        assert!(table.buckets[high_index].get_cached_contacts().iter().any(|c| c.guid == overflow_guid));
    }

    #[test]
    fn get_contact_touches_its_bucket() {
        let mut table = table_with(1, 1_000);
        table.add_contact(contact(2)).unwrap();
        assert!(table.get_contact(&id(2)).is_some());
    }

    #[test]
    fn removing_an_absent_contact_is_a_no_op() {
        let mut table = table_with(1, 0);
        table.remove_guid(&id(99));
        assert_eq!(table.contact_count(), 0);
    }

    #[test]
    fn spiral_indices_visit_origin_then_alternate_outward() {
        let collected: Vec<usize> = spiral_indices(2, 5).collect();
        assert_eq!(collected[0], 2);
        assert_eq!(collected.len(), 5);
        let mut sorted = collected.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn spiral_indices_clamp_at_the_edges() {
        let collected: Vec<usize> = spiral_indices(0, 3).collect();
        let mut sorted = collected.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2]);

        let collected: Vec<usize> = spiral_indices(4, 5).collect();
        let mut sorted = collected.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn find_close_nodes_excludes_sender_and_respects_count() {
        let mut table = table_with(1, 0);
        for i in 2..=10u64 {
            table.add_contact(contact(i)).unwrap();
        }
        let result = table.find_close_nodes(&id(5), Some(3), Some(&id(7)));
        assert_eq!(result.len(), 3);
        assert!(!result.iter().any(|c| c.guid == id(7)));
    }
}
