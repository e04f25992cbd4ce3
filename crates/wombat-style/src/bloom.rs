//! A counting Bloom filter over the ancestors of the element being styled.
//!
//! Descendant and child combinators make matching walk up the tree. Most
//! candidate rules fail because some ancestor they require (`.sidebar a`)
//! is simply not there, so the filter lets the matcher reject those rules
//! without walking. It may answer "maybe" for something absent, never "no"
//! for something present.
//!
//! Counters are 8 bits and saturate: once a slot reaches 255 it is never
//! decremented again, which can only cause false positives.

use std::hash::Hasher;

use rustc_hash::FxHasher;
use wombat_dom::{ElementData, NodeId};

const KEY_SIZE: usize = 12;
const ARRAY_SIZE: usize = 1 << KEY_SIZE;
const KEY_MASK: u32 = (1 << KEY_SIZE) - 1;

/// Kind of feature a hash stands for, mixed into the hash so that a class
/// and a tag of the same name do not collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Local name.
    Tag,
    /// `id` attribute.
    Id,
    /// One class name.
    Class,
    /// An attribute name.
    Attribute,
}

/// Hash a feature for the filter. Names are ASCII-lowercased first.
#[must_use]
pub fn feature_hash(kind: FeatureKind, name: &str) -> u32 {
    let mut hasher = FxHasher::default();
    hasher.write_u8(kind as u8);
    for byte in name.bytes() {
        hasher.write_u8(byte.to_ascii_lowercase());
    }
    let hash = hasher.finish();
    (hash ^ (hash >> 32)) as u32
}

/// Every hash an element contributes while it is an ancestor.
#[must_use]
pub fn element_hashes(element: &ElementData) -> Vec<u32> {
    let mut hashes = Vec::with_capacity(2 + element.classes().len() + element.attributes().len());
    hashes.push(feature_hash(FeatureKind::Tag, element.local_name()));
    if let Some(id) = element.id() {
        hashes.push(feature_hash(FeatureKind::Id, id));
    }
    for class in element.classes() {
        hashes.push(feature_hash(FeatureKind::Class, class));
    }
    for attribute in element.attributes() {
        hashes.push(feature_hash(FeatureKind::Attribute, &attribute.name));
    }
    hashes
}

const fn hash1(hash: u32) -> usize {
    (hash & KEY_MASK) as usize
}

const fn hash2(hash: u32) -> usize {
    ((hash >> KEY_SIZE) & KEY_MASK) as usize
}

/// A counting Bloom filter with 4096 eight-bit counters and two hash
/// functions derived from one 32-bit hash.
#[derive(Clone)]
pub struct CountingBloomFilter {
    counters: Box<[u8; ARRAY_SIZE]>,
}

impl std::fmt::Debug for CountingBloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let occupied = self.counters.iter().filter(|&&c| c != 0).count();
        f.debug_struct("CountingBloomFilter").field("occupied", &occupied).finish()
    }
}

impl Default for CountingBloomFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl CountingBloomFilter {
    /// An empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            counters: Box::new([0; ARRAY_SIZE]),
        }
    }

    /// Reset every counter.
    pub fn clear(&mut self) {
        self.counters.fill(0);
    }

    /// Whether no hash is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.iter().all(|&c| c == 0)
    }

    fn increment(&mut self, slot: usize) {
        let counter = &mut self.counters[slot];
        if *counter != u8::MAX {
            *counter += 1;
        }
    }

    fn decrement(&mut self, slot: usize) {
        let counter = &mut self.counters[slot];
        // A full counter may stand for more insertions than it can count.
        if *counter != u8::MAX {
            debug_assert!(*counter != 0, "removing a hash that was never inserted");
            *counter = counter.saturating_sub(1);
        }
    }

    /// Add a hash.
    pub fn insert_hash(&mut self, hash: u32) {
        self.increment(hash1(hash));
        self.increment(hash2(hash));
    }

    /// Remove a hash previously added with [`Self::insert_hash`].
    pub fn remove_hash(&mut self, hash: u32) {
        self.decrement(hash1(hash));
        self.decrement(hash2(hash));
    }

    /// `false` means the hash was definitely never inserted.
    #[must_use]
    pub fn might_contain_hash(&self, hash: u32) -> bool {
        self.counters[hash1(hash)] != 0 && self.counters[hash2(hash)] != 0
    }
}

/// The filter plus the stack of elements currently pushed into it.
#[derive(Debug, Default, Clone)]
pub struct AncestorFilter {
    filter: CountingBloomFilter,
    stack: Vec<(NodeId, Vec<u32>)>,
}

impl AncestorFilter {
    /// An empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an element as the new innermost ancestor.
    pub fn push(&mut self, element: NodeId, data: &ElementData) {
        let hashes = element_hashes(data);
        for &hash in &hashes {
            self.filter.insert_hash(hash);
        }
        self.stack.push((element, hashes));
    }

    /// Pop the innermost ancestor. Popping anything else is a traversal bug;
    /// in that case the filter is reset so that it never lies.
    pub fn pop(&mut self, element: NodeId) {
        match self.stack.last() {
            Some((top, _)) if *top == element => {
                if let Some((_, hashes)) = self.stack.pop() {
                    for hash in hashes {
                        self.filter.remove_hash(hash);
                    }
                }
            }
            _ => {
                log::warn!(target: "wombat::style", "ancestor filter popped out of order at {element:?}; resetting");
                self.reset();
            }
        }
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        self.filter.clear();
        self.stack.clear();
    }

    /// The innermost pushed element.
    #[must_use]
    pub fn top(&self) -> Option<NodeId> {
        self.stack.last().map(|(id, _)| *id)
    }

    /// Number of pushed elements.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether the filter is usable for an element with this parent: it
    /// must describe exactly the parent's ancestor chain.
    #[must_use]
    pub fn is_valid_for_parent(&self, parent: Option<NodeId>) -> bool {
        parent.is_some() && self.top() == parent
    }

    /// `false` if some required hash is definitely absent.
    #[must_use]
    pub fn might_contain_all(&self, hashes: &[u32]) -> bool {
        hashes.iter().all(|&hash| self.filter.might_contain_hash(hash))
    }

    /// The underlying filter.
    #[must_use]
    pub const fn filter(&self) -> &CountingBloomFilter {
        &self.filter
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    #[test]
    fn test_contains_after_insert() {
        let mut filter = CountingBloomFilter::new();
        let hash = feature_hash(FeatureKind::Class, "sidebar");
        assert!(!filter.might_contain_hash(hash));
        filter.insert_hash(hash);
        assert!(filter.might_contain_hash(hash));
        filter.remove_hash(hash);
        assert!(!filter.might_contain_hash(hash));
    }

    #[test]
    fn test_hash_ignores_ascii_case_but_not_kind() {
        assert_eq!(
            feature_hash(FeatureKind::Tag, "DIV"),
            feature_hash(FeatureKind::Tag, "div")
        );
        assert_ne!(
            feature_hash(FeatureKind::Tag, "main"),
            feature_hash(FeatureKind::Class, "main")
        );
    }

    #[test]
    fn test_saturated_counter_stays_full() {
        let mut filter = CountingBloomFilter::new();
        let hash = 0x0012_3456;
        for _ in 0..300 {
            filter.insert_hash(hash);
        }
        for _ in 0..300 {
            filter.remove_hash(hash);
        }
        assert!(filter.might_contain_hash(hash));
    }

    #[quickcheck]
    fn inserted_hashes_are_always_reported(hashes: Vec<u32>) -> bool {
        let mut filter = CountingBloomFilter::new();
        for &hash in &hashes {
            filter.insert_hash(hash);
        }
        hashes.iter().all(|&hash| filter.might_contain_hash(hash))
    }

    #[quickcheck]
    fn removing_everything_empties_the_filter(hashes: Vec<u32>) -> bool {
        let hashes: Vec<u32> = hashes.into_iter().take(100).collect();
        let mut filter = CountingBloomFilter::new();
        for &hash in &hashes {
            filter.insert_hash(hash);
        }
        for &hash in hashes.iter().rev() {
            filter.remove_hash(hash);
        }
        filter.is_empty()
    }
}
