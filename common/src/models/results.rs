use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::hostname::Hostname;

/// The unique hostnames found for one domain at one point in time.
///
/// Backed by an ordered set, so iteration is always lexicographic no matter
/// in which order the sources answered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet(BTreeSet<Hostname>);

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the host was already present.
    pub fn insert(&mut self, host: Hostname) -> bool {
        self.0.insert(host)
    }

    pub fn contains(&self, host: &Hostname) -> bool {
        self.0.contains(host)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hostname> {
        self.0.iter()
    }

    /// Hosts in `self` that `other` does not contain, in sorted order.
    pub fn difference(&self, other: &ResultSet) -> Vec<Hostname> {
        self.0.difference(&other.0).cloned().collect()
    }

    pub fn to_vec(&self) -> Vec<Hostname> {
        self.0.iter().cloned().collect()
    }
}

impl FromIterator<Hostname> for ResultSet {
    fn from_iter<I: IntoIterator<Item = Hostname>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ResultSet {
    type Item = Hostname;
    type IntoIter = std::collections::btree_set::IntoIter<Hostname>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Hostname;
    type IntoIter = std::collections::btree_set::Iter<'a, Hostname>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
