//! Tag schemas: which attributes a tag carries, their types and defaults.
//!
//! The schema set is built once, validated, and shared immutably (`Arc`)
//! between the network and its elements. There is no global registry; a
//! [`Schema`] is explicit configuration handed to
//! [`Network::new`](crate::network::Network::new).

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::element::kind::ElementKind;
use crate::ledger_error::NetLedgerError;
use crate::attribute::value::{AttrType, AttrValue};

/// Declaration of one attribute: key, type, optional default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttrSpec {
    key: String,
    ty: AttrType,
    default: Option<AttrValue>,
}

impl AttrSpec {
    pub fn new(key: impl Into<String>, ty: AttrType) -> Self {
        AttrSpec {
            key: key.into(),
            ty,
            default: None,
        }
    }

    /// Adds a default value. Its type is checked when the schema set is built.
    pub fn with_default(mut self, default: impl Into<AttrValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn ty(&self) -> AttrType {
        self.ty
    }

    #[inline]
    pub fn default(&self) -> Option<&AttrValue> {
        self.default.as_ref()
    }
}

/// Schema of one tag: its element kind plus the attributes it carries.
///
/// The key index is built lazily on first lookup and shared in the cell
/// afterwards; the attribute list itself is immutable after construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TagSchema {
    tag: String,
    kind: ElementKind,
    attrs: Vec<AttrSpec>,
    #[serde(skip)]
    index: OnceCell<HashMap<String, usize>>,
}

impl TagSchema {
    pub fn new(tag: impl Into<String>, kind: ElementKind, attrs: Vec<AttrSpec>) -> Self {
        TagSchema {
            tag: tag.into(),
            kind,
            attrs,
            index: OnceCell::new(),
        }
    }

    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[inline]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Attribute declarations in declaration order.
    #[inline]
    pub fn attrs(&self) -> &[AttrSpec] {
        &self.attrs
    }

    /// Looks up one attribute declaration by key.
    pub fn spec(&self, key: &str) -> Option<&AttrSpec> {
        let index = self.index.get_or_init(|| {
            self.attrs
                .iter()
                .enumerate()
                .map(|(i, a)| (a.key.clone(), i))
                .collect()
        });
        index.get(key).map(|&i| &self.attrs[i])
    }

    #[inline]
    pub fn has(&self, key: &str) -> bool {
        self.spec(key).is_some()
    }
}

/// Immutable set of tag schemas, the complete attribute configuration of one
/// network.
#[derive(Clone, Debug)]
pub struct Schema {
    tags: Vec<Arc<TagSchema>>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Validates and freezes a schema set.
    ///
    /// # Errors
    ///
    /// - [`NetLedgerError::DuplicateTag`] when two entries share a tag name.
    /// - [`NetLedgerError::DuplicateAttribute`] when one tag declares the
    ///   same attribute key twice.
    /// - [`NetLedgerError::AttributeTypeMismatch`] when a default value does
    ///   not inhabit its declared type.
    pub fn new(tags: Vec<TagSchema>) -> Result<Self, NetLedgerError> {
        let mut index = HashMap::with_capacity(tags.len());
        for (i, tag) in tags.iter().enumerate() {
            if index.insert(tag.tag.clone(), i).is_some() {
                return Err(NetLedgerError::DuplicateTag(tag.tag.clone()));
            }
            let mut keys = HashMap::with_capacity(tag.attrs.len());
            for spec in &tag.attrs {
                if keys.insert(spec.key.as_str(), ()).is_some() {
                    return Err(NetLedgerError::DuplicateAttribute {
                        tag: tag.tag.clone(),
                        key: spec.key.clone(),
                    });
                }
                if let Some(default) = &spec.default {
                    if default.type_of() != spec.ty {
                        return Err(NetLedgerError::AttributeTypeMismatch {
                            key: spec.key.clone(),
                            expected: spec.ty,
                            found: default.type_of(),
                        });
                    }
                }
            }
        }
        let tags = tags.into_iter().map(Arc::new).collect();
        Ok(Schema { tags, index })
    }

    /// Resolves a tag name to its schema.
    ///
    /// # Errors
    ///
    /// [`NetLedgerError::UnknownTag`] when no entry carries this name.
    pub fn tag_schema(&self, tag: &str) -> Result<&Arc<TagSchema>, NetLedgerError> {
        self.index
            .get(tag)
            .map(|&i| &self.tags[i])
            .ok_or_else(|| NetLedgerError::UnknownTag(tag.to_owned()))
    }

    #[inline]
    pub fn contains(&self, tag: &str) -> bool {
        self.index.contains_key(tag)
    }

    /// All tag schemas, declaration order.
    #[inline]
    pub fn tags(&self) -> impl Iterator<Item = &Arc<TagSchema>> {
        self.tags.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
