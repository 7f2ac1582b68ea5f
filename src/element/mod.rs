//! Network elements: identity, kind, attributes and relationship storage.
//!
//! This module provides:
//! - [`ElementId`]: the opaque arena handle ([`id`])
//! - [`ElementKind`] and [`KindIndexed`]: the closed kind set ([`kind`])
//! - [`Hierarchy`]: the fourteen per-kind relationship sequences ([`hierarchy`])
//! - [`Element`]: one element instance, owned by the arena
//!
//! Elements are created and owned by [`Network`](crate::network::Network);
//! everything else holds `ElementId` handles.

pub mod hierarchy;
pub mod id;
pub mod kind;

pub use hierarchy::Hierarchy;
pub use id::ElementId;
pub use kind::{ElementKind, KindIndexed};

use std::collections::HashMap;
use std::sync::Arc;

use crate::attribute::schema::TagSchema;
use crate::attribute::value::AttrValue;
use crate::attribute::AttributeCarrier;
use crate::ledger_error::NetLedgerError;

/// One network element: tag schema handle, explicit attribute values and
/// relationship sequences.
///
/// The attribute map stores only explicitly set values; reads fall back to
/// the schema default. The `attached` flag tracks registry membership and is
/// flipped only by the arena.
#[derive(Clone, Debug)]
pub struct Element {
    id: ElementId,
    schema: Arc<TagSchema>,
    attributes: HashMap<String, AttrValue>,
    hierarchy: Hierarchy,
    attached: bool,
}

impl Element {
    pub(crate) fn new(id: ElementId, schema: Arc<TagSchema>) -> Self {
        Element {
            id,
            schema,
            attributes: HashMap::new(),
            hierarchy: Hierarchy::new(),
            attached: false,
        }
    }

    #[inline]
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Whether this element currently participates in the relationship graph.
    #[inline]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    #[inline]
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Schema of this element's tag.
    #[inline]
    pub fn tag_schema(&self) -> &Arc<TagSchema> {
        &self.schema
    }

    pub(crate) fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    pub(crate) fn hierarchy_mut(&mut self) -> &mut Hierarchy {
        &mut self.hierarchy
    }

    /// Explicitly set value of `key`, ignoring schema defaults.
    #[inline]
    pub fn explicit_attribute(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    /// Raw attribute write, no validation, returns the previous explicit
    /// value. Reserved for change replay; the validated path is
    /// [`Network::set_attribute`](crate::network::Network::set_attribute).
    pub(crate) fn apply_attribute(&mut self, key: &str, value: AttrValue) -> Option<AttrValue> {
        self.attributes.insert(key.to_owned(), value)
    }

    /// Removes the explicit value of `key`, returning the element to its
    /// schema default. Counterpart of [`apply_attribute`](Self::apply_attribute)
    /// for undoing a first-time set.
    pub(crate) fn clear_attribute(&mut self, key: &str) -> Option<AttrValue> {
        self.attributes.remove(key)
    }
}

impl AttributeCarrier for Element {
    #[inline]
    fn tag(&self) -> &str {
        self.schema.tag()
    }

    #[inline]
    fn kind(&self) -> ElementKind {
        self.schema.kind()
    }

    fn attribute(&self, key: &str) -> Result<AttrValue, NetLedgerError> {
        if let Some(value) = self.attributes.get(key) {
            return Ok(value.clone());
        }
        let spec = self
            .schema
            .spec(key)
            .ok_or_else(|| NetLedgerError::UnknownAttribute {
                tag: self.schema.tag().to_owned(),
                key: key.to_owned(),
            })?;
        spec.default()
            .cloned()
            .ok_or_else(|| NetLedgerError::UnsetAttribute {
                tag: self.schema.tag().to_owned(),
                key: key.to_owned(),
            })
    }

    fn is_valid(&self, key: &str, value: &AttrValue) -> bool {
        self.schema
            .spec(key)
            .is_some_and(|spec| spec.ty() == value.type_of())
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
