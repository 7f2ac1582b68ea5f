//! The closed set of element kinds and per-kind indexed storage.
//!
//! Relationship maintenance walks "one sequence per kind, in a fixed order"
//! in several places; both facts live here. [`ElementKind::ALL`] is the
//! canonical order and [`KindIndexed`] is the array-backed map used for every
//! per-kind table in the crate, so adding a kind is a compile error until all
//! storage and every walk agrees.

use std::fmt;
use std::ops::{Index, IndexMut};

/// Kind of a network element.
///
/// The set is closed: relationship storage, the linkage walks and the
/// attachment registries are all exhaustive over these seven variants.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum ElementKind {
    Edge,
    Lane,
    Additional,
    Shape,
    TazElement,
    DemandElement,
    GenericData,
}

impl ElementKind {
    /// Number of kinds.
    pub const COUNT: usize = 7;

    /// Every kind, in the canonical walk order.
    ///
    /// Linkage maintenance iterates this array on both the add and the
    /// remove side; keeping one shared definition is what makes the two
    /// walks provably identical.
    pub const ALL: [ElementKind; Self::COUNT] = [
        ElementKind::Edge,
        ElementKind::Lane,
        ElementKind::Additional,
        ElementKind::Shape,
        ElementKind::TazElement,
        ElementKind::DemandElement,
        ElementKind::GenericData,
    ];

    /// Position of this kind in [`Self::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short human-readable label, used in error messages and change labels.
    #[inline]
    pub const fn label(self) -> &'static str {
        match self {
            ElementKind::Edge => "edge",
            ElementKind::Lane => "lane",
            ElementKind::Additional => "additional",
            ElementKind::Shape => "shape",
            ElementKind::TazElement => "TAZ element",
            ElementKind::DemandElement => "demand element",
            ElementKind::GenericData => "generic data",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Dense map from [`ElementKind`] to `T`, backed by a fixed array.
///
/// Indexing is total; there is no entry-missing case. Iteration order is
/// [`ElementKind::ALL`] order.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct KindIndexed<T>([T; ElementKind::COUNT]);

impl<T> KindIndexed<T> {
    /// Builds a table by evaluating `f` for every kind in canonical order.
    #[inline]
    pub fn from_fn(mut f: impl FnMut(ElementKind) -> T) -> Self {
        KindIndexed(std::array::from_fn(|i| f(ElementKind::ALL[i])))
    }

    /// Iterates `(kind, &value)` pairs in canonical order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (ElementKind, &T)> {
        ElementKind::ALL.iter().copied().zip(self.0.iter())
    }

    /// Iterates `(kind, &mut value)` pairs in canonical order.
    #[inline]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ElementKind, &mut T)> {
        ElementKind::ALL.iter().copied().zip(self.0.iter_mut())
    }

    /// Borrows the values in canonical order.
    #[inline]
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T: Default> Default for KindIndexed<T> {
    fn default() -> Self {
        KindIndexed(std::array::from_fn(|_| T::default()))
    }
}

impl<T> Index<ElementKind> for KindIndexed<T> {
    type Output = T;
    #[inline]
    fn index(&self, kind: ElementKind) -> &T {
        &self.0[kind.index()]
    }
}

impl<T> IndexMut<ElementKind> for KindIndexed<T> {
    #[inline]
    fn index_mut(&mut self, kind: ElementKind) -> &mut T {
        &mut self.0[kind.index()]
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
