//! Per-element relationship storage: seven parent and seven child sequences.
//!
//! Every element carries one `Hierarchy`: an ordered sequence of parent
//! handles per kind and an ordered sequence of child handles per kind.
//! Sequences preserve insertion order and admit duplicates (a demand route
//! may legitimately reference the same edge twice). The pairing invariant —
//! an element appears in a parent's child sequence exactly as often as that
//! parent appears in the element's parent sequence — is not enforced here;
//! it is maintained by command execution and checked by the network sweep.

use serde::{Deserialize, Serialize};

use super::id::ElementId;
use super::kind::{ElementKind, KindIndexed};

/// Ordered parent/child reference sets of one element, split by kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    parents: KindIndexed<Vec<ElementId>>,
    children: KindIndexed<Vec<ElementId>>,
}

impl Hierarchy {
    /// An element with no relationships at all.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parent handles of the given kind, in insertion order.
    #[inline]
    pub fn parents(&self, kind: ElementKind) -> &[ElementId] {
        &self.parents[kind]
    }

    /// Child handles of the given kind, in insertion order.
    #[inline]
    pub fn children(&self, kind: ElementKind) -> &[ElementId] {
        &self.children[kind]
    }

    /// `(kind, sequence)` pairs over all parent sets, canonical kind order.
    #[inline]
    pub fn iter_parents(&self) -> impl Iterator<Item = (ElementKind, &[ElementId])> {
        self.parents.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// `(kind, sequence)` pairs over all child sets, canonical kind order.
    #[inline]
    pub fn iter_children(&self) -> impl Iterator<Item = (ElementKind, &[ElementId])> {
        self.children.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// True when all fourteen sequences are empty.
    pub fn is_empty(&self) -> bool {
        self.parents.values().all(Vec::is_empty) && self.children.values().all(Vec::is_empty)
    }

    /// How often `target` occurs in the parent sequence of its kind.
    pub fn parent_multiplicity(&self, kind: ElementKind, target: ElementId) -> usize {
        self.parents[kind].iter().filter(|&&p| p == target).count()
    }

    /// How often `target` occurs in the child sequence of its kind.
    pub fn child_multiplicity(&self, kind: ElementKind, target: ElementId) -> usize {
        self.children[kind].iter().filter(|&&c| c == target).count()
    }

    pub(crate) fn parents_mut(&mut self, kind: ElementKind) -> &mut Vec<ElementId> {
        &mut self.parents[kind]
    }

    pub(crate) fn children_mut(&mut self, kind: ElementKind) -> &mut Vec<ElementId> {
        &mut self.children[kind]
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
