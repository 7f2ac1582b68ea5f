//! Uniform attribute interface over heterogeneous network elements.
//!
//! This module provides:
//! - Typed attribute values and their four-type system ([`value`])
//! - Tag schemas: declared attributes, types and defaults ([`schema`])
//! - The [`AttributeCarrier`] trait, the read/validate surface every
//!   element exposes regardless of kind
//!
//! Mutation is deliberately absent from the trait: attribute edits go
//! through [`Network::set_attribute`](crate::network::Network::set_attribute)
//! so that every change is reversible.

pub mod schema;
pub mod value;

pub use schema::{AttrSpec, Schema, TagSchema};
pub use value::{AttrType, AttrValue};

use crate::element::kind::ElementKind;
use crate::ledger_error::NetLedgerError;

/// Read/validate surface shared by every network element.
///
/// `attribute` falls back to the schema default for unset keys; `is_valid`
/// checks key existence and type conformance only, deeper rules live above
/// this crate.
pub trait AttributeCarrier {
    /// Tag name of this element (e.g. `"busStop"`).
    fn tag(&self) -> &str;

    /// Kind of this element.
    fn kind(&self) -> ElementKind;

    /// Current value of `key`, or the schema default when unset.
    ///
    /// # Errors
    ///
    /// [`NetLedgerError::UnknownAttribute`] for keys the tag does not carry,
    /// [`NetLedgerError::UnsetAttribute`] when unset with no default.
    fn attribute(&self, key: &str) -> Result<AttrValue, NetLedgerError>;

    /// Whether `value` would be accepted for `key`.
    fn is_valid(&self, key: &str, value: &AttrValue) -> bool;
}
