//! The network container: element arena, attachment registry, consistency.
//!
//! `Network` owns every element instance. Elements enter the relationship
//! graph by *attachment* (per-kind, insertion-ordered registries) and leave
//! it by *detachment*; detached elements stay in the arena so that pending
//! undo/redo entries can revive them. Mirror writes between parent and child
//! sequences happen only through change execution; the container exposes the
//! declaration API for detached elements and the validated attribute setter.
//!
//! Consistency of the graph (mirror symmetry, no dangling handles, registry
//! and flags in agreement) is checked by [`Network::validate_consistency`],
//! wired into [`DebugInvariants`] the same way throughout the crate.

use std::collections::HashMap;
use std::sync::Arc;

use itertools::Itertools;

use crate::attribute::schema::Schema;
use crate::attribute::value::AttrValue;
use crate::attribute::AttributeCarrier;
use crate::change::undo_stack::UndoStack;
use crate::change::Change;
use crate::debug_invariants::DebugInvariants;
use crate::element::hierarchy::Hierarchy;
use crate::element::{Element, ElementId, ElementKind, KindIndexed};
use crate::ledger_error::NetLedgerError;

/// Which consistency sweeps [`Network::validate_consistency`] runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ConsistencyOptions {
    /// Mirror multiplicities agree for every attached pair.
    pub check_symmetry: bool,
    /// Attached elements reference only attached, existing elements.
    pub check_dangling: bool,
    /// Registry entries and attachment flags agree, no duplicates, right kinds.
    pub check_registry: bool,
}

impl ConsistencyOptions {
    pub const fn all() -> Self {
        ConsistencyOptions {
            check_symmetry: true,
            check_dangling: true,
            check_registry: true,
        }
    }
}

impl Default for ConsistencyOptions {
    fn default() -> Self {
        Self::all()
    }
}

/// Arena and attachment registry for one editable network.
#[derive(Clone, Debug)]
pub struct Network {
    schema: Arc<Schema>,
    elements: HashMap<ElementId, Element>,
    attached: KindIndexed<Vec<ElementId>>,
    next_id: u64,
}

impl Network {
    /// Empty network over an immutable schema.
    pub fn new(schema: Arc<Schema>) -> Self {
        Network {
            schema,
            elements: HashMap::new(),
            attached: KindIndexed::default(),
            next_id: 1,
        }
    }

    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    // ---------------------------------------------------------------------
    // Arena: creation, lookup, disposal
    // ---------------------------------------------------------------------

    /// Creates a detached element of the given tag and returns its handle.
    ///
    /// The element owns no explicit attribute values yet (reads fall back to
    /// schema defaults) and has no relationships. Declare construction-time
    /// references with [`declare_parent`](Self::declare_parent) /
    /// [`declare_child`](Self::declare_child), then bring it into the graph
    /// through a creating [`Change`].
    ///
    /// # Errors
    ///
    /// [`NetLedgerError::UnknownTag`] when the schema has no such tag.
    pub fn create_element(&mut self, tag: &str) -> Result<ElementId, NetLedgerError> {
        let schema = self.schema.tag_schema(tag)?.clone();
        let id = ElementId::new(self.next_id);
        self.next_id += 1;
        self.elements.insert(id, Element::new(id, schema));
        Ok(id)
    }

    /// Frees a detached element.
    ///
    /// The caller is responsible for not discarding elements still referenced
    /// by entries on an undo stack; replaying such an entry reports
    /// [`NetLedgerError::UnknownElement`].
    ///
    /// # Errors
    ///
    /// [`NetLedgerError::DiscardAttached`] while the element is attached,
    /// [`NetLedgerError::UnknownElement`] for stale handles.
    pub fn discard(&mut self, id: ElementId) -> Result<(), NetLedgerError> {
        if self.element(id)?.is_attached() {
            return Err(NetLedgerError::DiscardAttached(id));
        }
        self.elements.remove(&id);
        Ok(())
    }

    #[inline]
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// Number of elements in the arena, attached or not.
    #[inline]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn element(&self, id: ElementId) -> Result<&Element, NetLedgerError> {
        self.elements
            .get(&id)
            .ok_or(NetLedgerError::UnknownElement(id))
    }

    pub(crate) fn element_mut(&mut self, id: ElementId) -> Result<&mut Element, NetLedgerError> {
        self.elements
            .get_mut(&id)
            .ok_or(NetLedgerError::UnknownElement(id))
    }

    pub fn kind_of(&self, id: ElementId) -> Result<ElementKind, NetLedgerError> {
        Ok(self.element(id)?.kind())
    }

    pub fn tag_of(&self, id: ElementId) -> Result<&str, NetLedgerError> {
        Ok(self.element(id)?.tag())
    }

    pub fn is_attached(&self, id: ElementId) -> Result<bool, NetLedgerError> {
        Ok(self.element(id)?.is_attached())
    }

    // ---------------------------------------------------------------------
    // Attachment registry
    // ---------------------------------------------------------------------

    /// Attached elements of one kind, in attachment order.
    #[inline]
    pub fn attached_of_kind(&self, kind: ElementKind) -> &[ElementId] {
        &self.attached[kind]
    }

    /// Total number of attached elements.
    pub fn attached_count(&self) -> usize {
        self.attached.values().map(Vec::len).sum()
    }

    pub(crate) fn attach(&mut self, id: ElementId) -> Result<(), NetLedgerError> {
        let kind = {
            let element = self.element(id)?;
            if element.is_attached() {
                return Err(NetLedgerError::AlreadyAttached(id));
            }
            element.kind()
        };
        self.element_mut(id)?.set_attached(true);
        self.attached[kind].push(id);
        Ok(())
    }

    pub(crate) fn detach(&mut self, id: ElementId) -> Result<(), NetLedgerError> {
        let kind = {
            let element = self.element(id)?;
            if !element.is_attached() {
                return Err(NetLedgerError::NotAttached(id));
            }
            element.kind()
        };
        self.element_mut(id)?.set_attached(false);
        let registry = &mut self.attached[kind];
        match registry.iter().position(|&e| e == id) {
            Some(at) => {
                registry.remove(at);
                Ok(())
            }
            // Flag said attached but the registry disagrees.
            None => Err(NetLedgerError::RegistryMismatch(id)),
        }
    }

    // ---------------------------------------------------------------------
    // Relationship queries and construction-time declarations
    // ---------------------------------------------------------------------

    pub fn parents_of(
        &self,
        id: ElementId,
        kind: ElementKind,
    ) -> Result<&[ElementId], NetLedgerError> {
        Ok(self.element(id)?.hierarchy().parents(kind))
    }

    pub fn children_of(
        &self,
        id: ElementId,
        kind: ElementKind,
    ) -> Result<&[ElementId], NetLedgerError> {
        Ok(self.element(id)?.hierarchy().children(kind))
    }

    /// Declares `parent` in `child`'s own parent sequence.
    ///
    /// Declarations describe the relationships an element is born with; the
    /// mirror entries materialize when the creating change executes. Only
    /// detached elements accept declarations.
    ///
    /// # Errors
    ///
    /// [`NetLedgerError::DeclareOnAttached`] when `child` is attached, plus
    /// the usual unknown-handle errors.
    pub fn declare_parent(
        &mut self,
        child: ElementId,
        parent: ElementId,
    ) -> Result<(), NetLedgerError> {
        let kind = self.kind_of(parent)?;
        let element = self.element_mut(child)?;
        if element.is_attached() {
            return Err(NetLedgerError::DeclareOnAttached(child));
        }
        element.hierarchy_mut().parents_mut(kind).push(parent);
        Ok(())
    }

    /// Declares `child` in `parent`'s own child sequence.
    ///
    /// Mirror of [`declare_parent`](Self::declare_parent); `parent` must be
    /// detached.
    pub fn declare_child(
        &mut self,
        parent: ElementId,
        child: ElementId,
    ) -> Result<(), NetLedgerError> {
        let kind = self.kind_of(child)?;
        let element = self.element_mut(parent)?;
        if element.is_attached() {
            return Err(NetLedgerError::DeclareOnAttached(parent));
        }
        element.hierarchy_mut().children_mut(kind).push(child);
        Ok(())
    }

    pub(crate) fn hierarchy_mut(
        &mut self,
        id: ElementId,
    ) -> Result<&mut Hierarchy, NetLedgerError> {
        Ok(self.element_mut(id)?.hierarchy_mut())
    }

    // ---------------------------------------------------------------------
    // Attributes
    // ---------------------------------------------------------------------

    /// Effective value of `key` on `id` (explicit value or schema default).
    pub fn attribute(&self, id: ElementId, key: &str) -> Result<AttrValue, NetLedgerError> {
        self.element(id)?.attribute(key)
    }

    /// Whether `value` would be accepted for `key` on `id`.
    pub fn is_valid_attribute(
        &self,
        id: ElementId,
        key: &str,
        value: &AttrValue,
    ) -> Result<bool, NetLedgerError> {
        Ok(self.element(id)?.is_valid(key, value))
    }

    /// Validated, undoable attribute write.
    ///
    /// Pushes a [`Change`] onto `undo` and executes it. Setting an attribute
    /// to its current effective value is skipped entirely and pushes nothing.
    ///
    /// # Errors
    ///
    /// [`NetLedgerError::UnknownAttribute`] /
    /// [`NetLedgerError::AttributeTypeMismatch`] from validation, or any
    /// replay error from execution.
    pub fn set_attribute(
        &mut self,
        undo: &mut UndoStack,
        id: ElementId,
        key: &str,
        value: AttrValue,
    ) -> Result<(), NetLedgerError> {
        match self.attribute(id, key) {
            Ok(current) if current == value => {
                log::trace!("set_attribute {id}.{key}: value unchanged, skipping");
                return Ok(());
            }
            // Unset without default still accepts a first value.
            Err(NetLedgerError::UnsetAttribute { .. }) | Ok(_) => {}
            Err(e) => return Err(e),
        }
        let change = Change::set_attribute(self, id, key, value)?;
        undo.add(change, self)
    }

    /// Undoable move of `id`'s first `from` occurrence onto `to`.
    ///
    /// Pushes a [`Change`] onto `undo` and executes it. Moving onto the
    /// parent already held is skipped entirely and pushes nothing.
    pub fn reparent(
        &mut self,
        undo: &mut UndoStack,
        id: ElementId,
        from: ElementId,
        to: ElementId,
    ) -> Result<(), NetLedgerError> {
        if from == to {
            log::trace!("reparent {id}: endpoints equal, skipping");
            return Ok(());
        }
        let change = Change::reparent(self, id, from, to)?;
        undo.add(change, self)
    }

    // ---------------------------------------------------------------------
    // Consistency
    // ---------------------------------------------------------------------

    /// Runs the selected consistency sweeps and reports the first violation.
    pub fn validate_consistency(
        &self,
        options: ConsistencyOptions,
    ) -> Result<(), NetLedgerError> {
        if options.check_registry {
            self.sweep_registry()?;
        }
        if options.check_dangling {
            self.sweep_dangling()?;
        }
        if options.check_symmetry {
            self.sweep_symmetry()?;
        }
        Ok(())
    }

    fn sweep_registry(&self) -> Result<(), NetLedgerError> {
        for (kind, registry) in self.attached.iter() {
            if let Some(&dup) = registry.iter().duplicates().next() {
                return Err(NetLedgerError::RegistryMismatch(dup));
            }
            for &id in registry {
                let element = self
                    .elements
                    .get(&id)
                    .ok_or(NetLedgerError::RegistryMismatch(id))?;
                if element.kind() != kind || !element.is_attached() {
                    return Err(NetLedgerError::RegistryMismatch(id));
                }
            }
        }
        for (&id, element) in &self.elements {
            if element.is_attached() && !self.attached[element.kind()].contains(&id) {
                return Err(NetLedgerError::RegistryMismatch(id));
            }
        }
        Ok(())
    }

    fn sweep_dangling(&self) -> Result<(), NetLedgerError> {
        for element in self.elements.values().filter(|e| e.is_attached()) {
            let hierarchy = element.hierarchy();
            let refs = hierarchy
                .iter_parents()
                .chain(hierarchy.iter_children())
                .flat_map(|(_, seq)| seq.iter().copied());
            for target in refs {
                match self.elements.get(&target) {
                    None => {
                        return Err(NetLedgerError::DanglingReference {
                            holder: element.id(),
                            target,
                            state: "absent",
                        });
                    }
                    Some(t) if !t.is_attached() => {
                        return Err(NetLedgerError::DanglingReference {
                            holder: element.id(),
                            target,
                            state: "detached",
                        });
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    /// Mirror multiplicities must agree pairwise: an element appears in a
    /// parent's child sequence exactly as often as that parent appears in
    /// the element's parent sequence. Both orientations are swept so a
    /// one-sided entry is found no matter which side carries it.
    fn sweep_symmetry(&self) -> Result<(), NetLedgerError> {
        for element in self.elements.values().filter(|e| e.is_attached()) {
            let my_kind = element.kind();
            for (child_kind, children) in element.hierarchy().iter_children() {
                for &child in children.iter().unique() {
                    let Some(child_el) = self.elements.get(&child) else {
                        continue; // dangling sweep reports these
                    };
                    let down = element.hierarchy().child_multiplicity(child_kind, child);
                    let up = child_el.hierarchy().parent_multiplicity(my_kind, element.id());
                    if down != up {
                        return Err(NetLedgerError::BrokenSymmetry {
                            parent: element.id(),
                            child,
                            down,
                            up,
                        });
                    }
                }
            }
            for (parent_kind, parents) in element.hierarchy().iter_parents() {
                for &parent in parents.iter().unique() {
                    let Some(parent_el) = self.elements.get(&parent) else {
                        continue;
                    };
                    let up = element.hierarchy().parent_multiplicity(parent_kind, parent);
                    let down = parent_el.hierarchy().child_multiplicity(my_kind, element.id());
                    if down != up {
                        return Err(NetLedgerError::BrokenSymmetry {
                            parent,
                            child: element.id(),
                            down,
                            up,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl DebugInvariants for Network {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "network consistency");
    }

    fn validate_invariants(&self) -> Result<(), NetLedgerError> {
        self.validate_consistency(ConsistencyOptions::all())
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
