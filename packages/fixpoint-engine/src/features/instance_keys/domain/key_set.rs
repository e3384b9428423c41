//! Key-Set Lattice
//!
//! Sparse set of instance-key ids backed by a sorted vec. This is the
//! lattice the propagation operators compute over: ⊑ is set inclusion,
//! join is union, bottom is the empty set. With finitely many keys the
//! height is finite, which is what lets worklist iteration terminate.
//!
//! `union_with` reports whether the set grew, so operators can answer the
//! changed/not-changed question without diffing whole sets.

use serde::{Deserialize, Serialize};

use super::instance_key::KeyId;

/// Sorted sparse set over key ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySet {
    elements: Vec<KeyId>,
}

impl KeySet {
    /// Empty set (lattice bottom)
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn singleton(key: KeyId) -> Self {
        Self {
            elements: vec![key],
        }
    }

    pub fn from_iter(iter: impl IntoIterator<Item = KeyId>) -> Self {
        let mut elements: Vec<KeyId> = iter.into_iter().collect();
        elements.sort_unstable();
        elements.dedup();
        Self { elements }
    }

    /// Insert one key. Returns true if it was not present.
    pub fn insert(&mut self, key: KeyId) -> bool {
        match self.elements.binary_search(&key) {
            Ok(_) => false,
            Err(pos) => {
                self.elements.insert(pos, key);
                true
            }
        }
    }

    #[inline]
    pub fn contains(&self, key: KeyId) -> bool {
        self.elements.binary_search(&key).is_ok()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.elements.iter().copied()
    }

    /// self = self ∪ other; returns true iff self grew.
    /// Sorted-merge, O(n + m).
    pub fn union_with(&mut self, other: &KeySet) -> bool {
        if other.is_empty() {
            return false;
        }
        if self.is_empty() {
            self.elements = other.elements.clone();
            return true;
        }

        let mut merged = Vec::with_capacity(self.elements.len() + other.elements.len());
        let (a, b) = (&self.elements, &other.elements);
        let (mut i, mut j) = (0, 0);
        let mut grew = false;
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => {
                    merged.push(a[i]);
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    merged.push(b[j]);
                    j += 1;
                    grew = true;
                }
                std::cmp::Ordering::Equal => {
                    merged.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        merged.extend_from_slice(&a[i..]);
        if j < b.len() {
            merged.extend_from_slice(&b[j..]);
            grew = true;
        }

        if grew {
            self.elements = merged;
        }
        grew
    }

    /// self = self ∩ other
    pub fn intersect_with(&mut self, other: &KeySet) {
        self.elements.retain(|k| other.contains(*k));
    }

    /// Whether every element of self is in other (⊑)
    pub fn subset_of(&self, other: &KeySet) -> bool {
        self.elements.iter().all(|&k| other.contains(k))
    }
}

impl FromIterator<KeyId> for KeySet {
    fn from_iter<T: IntoIterator<Item = KeyId>>(iter: T) -> Self {
        KeySet::from_iter(iter)
    }
}
