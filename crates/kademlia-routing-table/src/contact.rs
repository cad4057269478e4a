//! Peer contacts: immutable network/identity records keyed by guid.

use std::hash::{Hash, Hasher};

use crate::identifier::Identifier;

/// An immutable record of a peer known to the routing table.
///
/// Two contacts are equal, and hash identically, iff their `guid`s match —
/// `ip`/`port` are not part of identity. A fresher observation with the
/// same guid but a different `ip`/`port` replaces the stored one; see
/// [`crate::kbucket::KBucket::add_contact`].
#[derive(Debug, Clone)]
pub struct Contact {
    pub ip: String,
    pub port: u16,
    pub guid: Identifier,
}

impl Contact {
    pub fn new(ip: impl Into<String>, port: u16, guid: Identifier) -> Self {
        Contact {
            ip: ip.into(),
            port,
            guid,
        }
    }
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.guid == other.guid
    }
}

impl Eq for Contact {}

impl Hash for Contact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.guid.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::U256;

    fn id(n: u64) -> Identifier {
        Identifier::from_u256(U256::from(n)).unwrap()
    }

    #[test]
    fn equality_and_hash_ignore_ip_and_port() {
        use std::collections::hash_map::DefaultHasher;

        let a = Contact::new("10.0.0.1", 1, id(7));
        let b = Contact::new("10.0.0.2", 2, id(7));
        assert_eq!(a, b);

        let hash = |c: &Contact| {
            let mut hasher = DefaultHasher::new();
            c.hash(&mut hasher);
            hasher.finish()
        };
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn distinct_guids_are_unequal() {
        let a = Contact::new("10.0.0.1", 1, id(7));
        let b = Contact::new("10.0.0.1", 1, id(8));
        assert_ne!(a, b);
    }
}
