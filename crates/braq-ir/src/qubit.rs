//! Qubits and ordered qubit sets.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A qubit index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Qubit(pub u32);

impl fmt::Display for Qubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Qubit {
    fn from(index: u32) -> Self {
        Qubit(index)
    }
}

/// An ordered set of qubits without duplicates.
///
/// Iteration follows insertion order, which is the order targets are
/// emitted in. Equality and hashing ignore order: `{0, 1}` equals `{1, 0}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QubitSet(IndexSet<Qubit>);

impl QubitSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of qubits in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `qubit` is a member.
    pub fn contains(&self, qubit: Qubit) -> bool {
        self.0.contains(&qubit)
    }

    /// Insert a qubit, returning `false` if it was already present.
    pub fn insert(&mut self, qubit: Qubit) -> bool {
        self.0.insert(qubit)
    }

    /// Add all qubits from `other`, keeping the order of first appearance.
    pub fn extend(&mut self, other: impl IntoIterator<Item = Qubit>) {
        self.0.extend(other);
    }

    /// Qubit at `index` in insertion order.
    pub fn get(&self, index: usize) -> Option<Qubit> {
        self.0.get_index(index).copied()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = Qubit> + '_ {
        self.0.iter().copied()
    }

    /// Qubits in insertion order.
    pub fn to_vec(&self) -> Vec<Qubit> {
        self.iter().collect()
    }

    /// Largest qubit index, if any.
    pub fn max(&self) -> Option<Qubit> {
        self.iter().max()
    }

    /// Union preserving `self`'s order followed by new qubits of `other`.
    #[must_use]
    pub fn union(&self, other: &QubitSet) -> QubitSet {
        let mut out = self.clone();
        out.extend(other.iter());
        out
    }

    /// Whether any qubit is shared with `other`.
    pub fn intersects(&self, other: &QubitSet) -> bool {
        self.iter().any(|q| other.contains(q))
    }
}

impl PartialEq for QubitSet {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for QubitSet {}

impl Hash for QubitSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut sorted = self.to_vec();
        sorted.sort_unstable();
        sorted.hash(state);
    }
}

impl FromIterator<Qubit> for QubitSet {
    fn from_iter<I: IntoIterator<Item = Qubit>>(iter: I) -> Self {
        QubitSet(iter.into_iter().collect())
    }
}

impl From<Qubit> for QubitSet {
    fn from(qubit: Qubit) -> Self {
        std::iter::once(qubit).collect()
    }
}

impl<const N: usize> From<[Qubit; N]> for QubitSet {
    fn from(qubits: [Qubit; N]) -> Self {
        qubits.into_iter().collect()
    }
}

impl From<Vec<Qubit>> for QubitSet {
    fn from(qubits: Vec<Qubit>) -> Self {
        qubits.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a QubitSet {
    type Item = Qubit;
    type IntoIter = std::iter::Copied<indexmap::set::Iter<'a, Qubit>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

impl fmt::Display for QubitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.iter().map(|q| q.to_string()).collect();
        write!(f, "({})", items.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_dedup_preserves_order() {
        let set: QubitSet = [Qubit(2), Qubit(0), Qubit(2), Qubit(1)].into_iter().collect();
        assert_eq!(set.to_vec(), vec![Qubit(2), Qubit(0), Qubit(1)]);
        assert_eq!(format!("{set}"), "(2, 0, 1)");
    }

    #[test]
    fn test_set_equality_ignores_order() {
        let a = QubitSet::from([Qubit(0), Qubit(1)]);
        let b = QubitSet::from([Qubit(1), Qubit(0)]);
        assert_eq!(a, b);

        let mut seen = FxHashSet::default();
        seen.insert(a);
        assert!(seen.contains(&b));
    }

    #[test]
    fn test_union_and_intersects() {
        let a = QubitSet::from([Qubit(3), Qubit(1)]);
        let b = QubitSet::from([Qubit(1), Qubit(5)]);
        assert_eq!(a.union(&b).to_vec(), vec![Qubit(3), Qubit(1), Qubit(5)]);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&QubitSet::from(Qubit(0))));
        assert_eq!(a.max(), Some(Qubit(3)));
    }
}
