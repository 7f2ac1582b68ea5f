//! Reversible change commands.
//!
//! This module provides:
//! - [`Change`]: one reversible structural or attribute edit
//! - [`Direction`] and the forward-flag composition that folds creation and
//!   deletion into a single command shape
//! - The linkage maintenance walks ([`linkage`])
//! - The undo/redo stack with change groups ([`undo_stack`])
//!
//! A change captures everything it needs at construction time; hierarchical
//! state is replayed from the subject's own live sequences so that edits made
//! after construction (for example children linked to the subject later) are
//! honored when the change is finally undone. Each full application leaves
//! the graph consistent and asserts so in checked builds.

pub mod linkage;
pub mod undo_stack;

pub use linkage::{LinkMemento, link_element, unlink_element};
pub use undo_stack::UndoStack;

#[cfg(test)]
mod tests;

use crate::attribute::AttributeCarrier;
use crate::attribute::value::AttrValue;
use crate::debug_invariants::DebugInvariants;
use crate::element::{ElementId, ElementKind};
use crate::ledger_error::NetLedgerError;
use crate::network::Network;

/// Orientation of one application of a change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Reverse,
}

/// What a change does, together with the state its replay carries.
#[derive(Clone, Debug)]
enum EditOp {
    /// Subject enters the relationship graph.
    Create,
    /// Subject leaves the relationship graph.
    Delete,
    /// One attribute moves between `previous` (explicit value or unset) and
    /// `next`.
    SetAttribute {
        key: String,
        previous: Option<AttrValue>,
        next: AttrValue,
    },
    /// One parent occurrence of the subject moves between `from` and `to`.
    ///
    /// `own_index` pins which occurrence in the subject's own parent
    /// sequence moves; the slot fields record where the subject's mirror
    /// entry sits in either parent's child sequence, filled in on first
    /// application.
    Reparent {
        kind: ElementKind,
        from: ElementId,
        to: ElementId,
        own_index: usize,
        from_slot: Option<usize>,
        to_slot: Option<usize>,
    },
}

/// One reversible edit of the network.
///
/// `redo` applies the edit in its stated direction, `undo` exactly inverts
/// it. Structural changes walk the subject's live relationship sequences, so
/// links gained or lost since construction are honored; recorded positions
/// (linkage mementos, reparent slots) make in-order cycles under
/// [`UndoStack`] restore every sequence bit for bit, and replay against a
/// graph that has drifted out of stack order falls back to append/front
/// resolution instead of corrupting it.
#[derive(Debug)]
pub struct Change {
    subject: ElementId,
    tag: String,
    forward: bool,
    op: EditOp,
    links: Option<LinkMemento>,
}

impl Change {
    /// Change that brings a detached element (and its declared references)
    /// into the graph.
    ///
    /// # Errors
    ///
    /// [`NetLedgerError::AlreadyAttached`] when the subject is already part
    /// of the graph.
    pub fn create(net: &Network, subject: ElementId) -> Result<Self, NetLedgerError> {
        let element = net.element(subject)?;
        if element.is_attached() {
            return Err(NetLedgerError::AlreadyAttached(subject));
        }
        Ok(Change {
            subject,
            tag: element.tag().to_owned(),
            forward: true,
            op: EditOp::Create,
            links: None,
        })
    }

    /// Change that removes an attached element from the graph.
    ///
    /// The element stays in the arena so the change can revive it on undo.
    ///
    /// # Errors
    ///
    /// [`NetLedgerError::NotAttached`] when the subject is not in the graph.
    pub fn delete(net: &Network, subject: ElementId) -> Result<Self, NetLedgerError> {
        let element = net.element(subject)?;
        if !element.is_attached() {
            return Err(NetLedgerError::NotAttached(subject));
        }
        Ok(Change {
            subject,
            tag: element.tag().to_owned(),
            forward: false,
            op: EditOp::Delete,
            links: None,
        })
    }

    /// Change that sets one attribute, capturing the current explicit value
    /// for undo.
    ///
    /// # Errors
    ///
    /// [`NetLedgerError::UnknownAttribute`] /
    /// [`NetLedgerError::AttributeTypeMismatch`] when the key or value does
    /// not fit the subject's tag schema.
    pub fn set_attribute(
        net: &Network,
        subject: ElementId,
        key: &str,
        next: AttrValue,
    ) -> Result<Self, NetLedgerError> {
        let element = net.element(subject)?;
        let spec =
            element
                .tag_schema()
                .spec(key)
                .ok_or_else(|| NetLedgerError::UnknownAttribute {
                    tag: element.tag().to_owned(),
                    key: key.to_owned(),
                })?;
        if spec.ty() != next.type_of() {
            return Err(NetLedgerError::AttributeTypeMismatch {
                key: key.to_owned(),
                expected: spec.ty(),
                found: next.type_of(),
            });
        }
        let previous = element.explicit_attribute(key).cloned();
        Ok(Change {
            subject,
            tag: element.tag().to_owned(),
            forward: true,
            op: EditOp::SetAttribute {
                key: key.to_owned(),
                previous,
                next,
            },
            links: None,
        })
    }

    /// Change that moves one parent occurrence of `subject` from `from` to
    /// `to` (first occurrence of `from` in the subject's own sequence), with
    /// both mirror sequences maintained.
    ///
    /// # Errors
    ///
    /// [`NetLedgerError::KindMismatch`] when `to` is not of `from`'s kind,
    /// [`NetLedgerError::NotAttached`] when any participant is outside the
    /// graph, [`NetLedgerError::MissingLink`] when `from` is not a parent of
    /// the subject.
    pub fn reparent(
        net: &Network,
        subject: ElementId,
        from: ElementId,
        to: ElementId,
    ) -> Result<Self, NetLedgerError> {
        let element = net.element(subject)?;
        if !element.is_attached() {
            return Err(NetLedgerError::NotAttached(subject));
        }
        let kind = net.kind_of(from)?;
        let to_kind = net.kind_of(to)?;
        if to_kind != kind {
            return Err(NetLedgerError::KindMismatch {
                expected: kind,
                found: to_kind,
            });
        }
        if !net.is_attached(from)? {
            return Err(NetLedgerError::NotAttached(from));
        }
        if !net.is_attached(to)? {
            return Err(NetLedgerError::NotAttached(to));
        }
        let own_index = element
            .hierarchy()
            .parents(kind)
            .iter()
            .position(|&p| p == from)
            .ok_or(NetLedgerError::MissingLink {
                subject: from,
                counterpart: subject,
                side: "parent",
            })?;
        Ok(Change {
            subject,
            tag: element.tag().to_owned(),
            forward: true,
            op: EditOp::Reparent {
                kind,
                from,
                to,
                own_index,
                from_slot: None,
                to_slot: None,
            },
            links: None,
        })
    }

    #[inline]
    pub fn subject(&self) -> ElementId {
        self.subject
    }

    /// Stack-depth cost of this change. Always 1; groups sum their members.
    #[inline]
    pub fn size(&self) -> usize {
        1
    }

    /// Human-readable description of the edit, e.g. `create lane`.
    pub fn description(&self) -> String {
        match &self.op {
            EditOp::Create => format!("create {}", self.tag),
            EditOp::Delete => format!("delete {}", self.tag),
            EditOp::SetAttribute { key, .. } => {
                format!("change {} attribute '{}'", self.tag, key)
            }
            EditOp::Reparent { .. } => format!("move {}", self.tag),
        }
    }

    pub fn undo_name(&self) -> String {
        format!("Undo {}", self.description())
    }

    pub fn redo_name(&self) -> String {
        format!("Redo {}", self.description())
    }

    /// Applies the edit in its stated direction.
    pub fn redo(&mut self, net: &mut Network) -> Result<(), NetLedgerError> {
        self.apply(net, Direction::Forward)
    }

    /// Exactly inverts [`redo`](Self::redo).
    pub fn undo(&mut self, net: &mut Network) -> Result<(), NetLedgerError> {
        self.apply(net, Direction::Reverse)
    }

    /// Applies the edit in the given direction.
    ///
    /// Whether a structural change attaches or detaches its subject is
    /// `(direction == Forward) == forward`: a creating change carries
    /// `forward = true`, a deleting one `forward = false`, and undo flips
    /// the orientation. Every successful application leaves the graph
    /// consistent; failures from pre-validation leave it untouched.
    pub fn apply(&mut self, net: &mut Network, direction: Direction) -> Result<(), NetLedgerError> {
        let subject = self.subject;
        let forward = self.forward;
        match &mut self.op {
            EditOp::Create | EditOp::Delete => {
                let attach = (direction == Direction::Forward) == forward;
                if attach {
                    if net.is_attached(subject)? {
                        return Err(NetLedgerError::AlreadyAttached(subject));
                    }
                    let filled = replay_links(net, subject, self.links.as_ref(), true)?;
                    self.links = Some(filled);
                    net.attach(subject)?;
                } else {
                    if !net.is_attached(subject)? {
                        return Err(NetLedgerError::NotAttached(subject));
                    }
                    let vacated = replay_links(net, subject, self.links.as_ref(), false)?;
                    self.links = Some(vacated);
                    net.detach(subject)?;
                }
            }
            EditOp::SetAttribute {
                key,
                previous,
                next,
            } => {
                let apply_next = (direction == Direction::Forward) == forward;
                let element = net.element_mut(subject)?;
                if apply_next {
                    let _ = element.apply_attribute(key, next.clone());
                } else {
                    match previous {
                        Some(value) => {
                            let _ = element.apply_attribute(key, value.clone());
                        }
                        None => {
                            let _ = element.clear_attribute(key);
                        }
                    }
                }
            }
            EditOp::Reparent {
                kind,
                from,
                to,
                own_index,
                from_slot,
                to_slot,
            } => {
                let onward = (direction == Direction::Forward) == forward;
                let (old, new, old_slot, new_slot) = if onward {
                    (*from, *to, &mut *from_slot, &mut *to_slot)
                } else {
                    (*to, *from, &mut *to_slot, &mut *from_slot)
                };
                let subject_kind = net.kind_of(subject)?;

                // Validation pass: own occurrence, removal slot, insert slot.
                if net.element(subject)?.hierarchy().parents(*kind).get(*own_index) != Some(&old) {
                    return Err(NetLedgerError::MissingLink {
                        subject: old,
                        counterpart: subject,
                        side: "parent",
                    });
                }
                let old_children = net.element(old)?.hierarchy().children(subject_kind);
                match *old_slot {
                    Some(slot) => {
                        if slot >= old_children.len() {
                            return Err(NetLedgerError::LinkSlotOutOfRange {
                                counterpart: old,
                                slot,
                                len: old_children.len(),
                            });
                        }
                        if old_children[slot] != subject {
                            return Err(NetLedgerError::MissingLink {
                                subject,
                                counterpart: old,
                                side: "child",
                            });
                        }
                    }
                    None => {
                        if !old_children.contains(&subject) {
                            return Err(NetLedgerError::MissingLink {
                                subject,
                                counterpart: old,
                                side: "child",
                            });
                        }
                    }
                }
                let new_children = net.element(new)?.hierarchy().children(subject_kind);
                if let Some(slot) = *new_slot {
                    if slot > new_children.len() {
                        return Err(NetLedgerError::LinkSlotOutOfRange {
                            counterpart: new,
                            slot,
                            len: new_children.len(),
                        });
                    }
                }

                // Mutation pass.
                let seq = net.hierarchy_mut(old)?.children_mut(subject_kind);
                let vacated = match *old_slot {
                    Some(slot) => slot,
                    None => seq
                        .iter()
                        .position(|&e| e == subject)
                        .expect("occurrence validated above"),
                };
                seq.remove(vacated);
                *old_slot = Some(vacated);

                let seq = net.hierarchy_mut(new)?.children_mut(subject_kind);
                let filled = new_slot.unwrap_or(seq.len());
                seq.insert(filled, subject);
                *new_slot = Some(filled);

                net.hierarchy_mut(subject)?.parents_mut(*kind)[*own_index] = new;
            }
        }
        net.debug_assert_invariants();
        Ok(())
    }
}

/// Runs a linkage walk with recorded positions when the live graph still
/// matches them.
///
/// Under strict stack ordering the positions always match and every entry
/// returns to exactly where it was. A command replayed out of stack order
/// (its subject gained or lost relationships through other commands) finds
/// its positions stale; the walk is then re-resolved against the live
/// sequences, appending on link and removing front to back on unlink.
fn replay_links(
    net: &mut Network,
    subject: ElementId,
    memento: Option<&LinkMemento>,
    attach: bool,
) -> Result<LinkMemento, NetLedgerError> {
    let walk = |net: &mut Network, m: Option<&LinkMemento>| {
        if attach {
            linkage::link_element(net, subject, m)
        } else {
            linkage::unlink_element(net, subject, m)
        }
    };
    if let Some(m) = memento {
        match walk(net, Some(m)) {
            Ok(replay) => return Ok(replay),
            // the failed walk mutates nothing, so re-resolving is safe
            Err(NetLedgerError::LinkReplayMismatch { .. })
            | Err(NetLedgerError::LinkSlotOutOfRange { .. })
            | Err(NetLedgerError::MissingLink { .. }) => {
                log::debug!(
                    "recorded link positions for element {subject} no longer match, re-resolving"
                );
            }
            Err(e) => return Err(e),
        }
    }
    walk(net, None)
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
