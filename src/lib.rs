//! # net-ledger
//!
//! net-ledger is the reversible editing core for hierarchical traffic-network
//! models. It provides an element arena with per-kind attachment registries,
//! typed attribute carriers validated against an immutable schema, and an
//! undo/redo stack of change commands whose linkage replay restores every
//! parent/child sequence bit for bit.
//!
//! ## Features
//! - Seven element kinds with fourteen ordered relationship sequences per
//!   element, kept pairwise symmetric by a fixed-order linkage walk
//! - Change commands (create, delete, attribute, reparent) that capture their
//!   inverse state up front and replay it exactly, in either direction
//! - Nestable change groups, undo history limits and redo-branch truncation
//! - Consistency sweeps (symmetry, dangling handles, registry agreement)
//!   wired into debug builds and opt-in feature flags
//!
//! ## Determinism
//!
//! Replay is deterministic: linking and unlinking walk an element's
//! relationships in one canonical kind order, and undone work is restored at
//! recorded positions rather than appended. Randomized tests fix their seeds.
//!
//! ## Usage
//! Add `net-ledger` as a dependency in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! net-ledger = "0.4.2"
//! # Optional features:
//! # features = ["check-invariants"]
//! ```

pub mod attribute;
pub mod change;
pub mod debug_invariants;
pub mod element;
pub mod ledger_error;
pub mod network;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::attribute::{
        AttrSpec, AttrType, AttrValue, AttributeCarrier, Schema, TagSchema,
    };
    pub use crate::change::{
        Change, Direction, LinkMemento, UndoStack, link_element, unlink_element,
    };
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::element::{Element, ElementId, ElementKind, Hierarchy, KindIndexed};
    pub use crate::ledger_error::NetLedgerError;
    pub use crate::network::{ConsistencyOptions, Network};
}
