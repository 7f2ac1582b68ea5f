//! Linkage maintenance: the mirror writes that keep the relationship graph
//! symmetric when one element enters or leaves it.
//!
//! An element's own fourteen sequences (seven parent, seven child) say what
//! it is related to; the mirror entries live in the counterparts. Linking
//! walks the subject's live bundles in one fixed order (parents in
//! [`ElementKind::ALL`] order, then children in the same order) and inserts
//! the subject into every counterpart's mirror sequence; unlinking performs
//! the identical walk and removes those entries again. The subject's own
//! sequences are never touched: they are the capture the walk replays, and
//! they must survive detachment so a later re-link can restore the mirrors.
//!
//! Both operations exchange a [`LinkMemento`]: `unlink_element` records the
//! position each removal vacated, `link_element` reinserts at exactly those
//! positions (appending when no memento exists, i.e. on first execution of a
//! creating change). Under the strict stack ordering of command replay this
//! makes every undo/redo cycle restore each sequence bit-identically, with
//! identity, order and multiplicity preserved.
//!
//! Both walks pre-validate every counterpart and slot before the first
//! mutation, so a reported error leaves the graph untouched.

use std::collections::HashMap;

use crate::attribute::AttributeCarrier;
use crate::element::{ElementId, ElementKind};
use crate::ledger_error::NetLedgerError;
use crate::network::Network;

/// Which mirror sequence of the counterpart a walk entry touches.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum Side {
    /// Counterpart is a parent of the subject: its child sequence mirrors.
    Parent,
    /// Counterpart is a child of the subject: its parent sequence mirrors.
    Child,
}

impl Side {
    /// Name of the mirror sequence searched, for error reporting.
    const fn mirror_name(self) -> &'static str {
        match self {
            Side::Parent => "child",
            Side::Child => "parent",
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct WalkEntry {
    side: Side,
    target: ElementId,
}

impl WalkEntry {
    #[inline]
    fn sequence_key(&self) -> (Side, ElementId) {
        (self.side, self.target)
    }
}

/// Positions of the subject's mirror entries, one per walk entry, in the
/// coordinates of the fully linked state.
///
/// Produced by [`unlink_element`] (positions vacated) and [`link_element`]
/// (positions filled); replaying a memento against the walk that produced
/// its counterpart restores sequences exactly. Mementos are opaque: they are
/// only valid for the walk shape they were recorded against.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkMemento {
    slots: Vec<usize>,
}

impl LinkMemento {
    /// Number of mirror entries this memento covers.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Resolves the subject's live bundles into the canonical walk.
///
/// Parents first, children second, each in `ElementKind::ALL` order; within
/// one sequence, declaration order. Link and unlink share this resolution,
/// which is what makes their iteration orders identical.
fn resolve_walk(
    net: &Network,
    subject: ElementId,
) -> Result<(ElementKind, Vec<WalkEntry>), NetLedgerError> {
    let element = net.element(subject)?;
    let hierarchy = element.hierarchy();
    let mut walk = Vec::new();
    for kind in ElementKind::ALL {
        for &target in hierarchy.parents(kind) {
            walk.push(WalkEntry {
                side: Side::Parent,
                target,
            });
        }
    }
    for kind in ElementKind::ALL {
        for &target in hierarchy.children(kind) {
            walk.push(WalkEntry {
                side: Side::Child,
                target,
            });
        }
    }
    Ok((element.kind(), walk))
}

fn mirror_seq<'n>(
    net: &'n Network,
    entry: &WalkEntry,
    subject_kind: ElementKind,
) -> Result<&'n [ElementId], NetLedgerError> {
    let hierarchy = net.element(entry.target)?.hierarchy();
    Ok(match entry.side {
        Side::Parent => hierarchy.children(subject_kind),
        Side::Child => hierarchy.parents(subject_kind),
    })
}

fn mirror_seq_mut<'n>(
    net: &'n mut Network,
    entry: &WalkEntry,
    subject_kind: ElementKind,
) -> Result<&'n mut Vec<ElementId>, NetLedgerError> {
    let hierarchy = net.hierarchy_mut(entry.target)?;
    Ok(match entry.side {
        Side::Parent => hierarchy.children_mut(subject_kind),
        Side::Child => hierarchy.parents_mut(subject_kind),
    })
}

fn check_memento_shape(
    subject: ElementId,
    memento: Option<&LinkMemento>,
    walk_len: usize,
) -> Result<(), NetLedgerError> {
    match memento {
        Some(m) if m.slots.len() != walk_len => Err(NetLedgerError::LinkReplayMismatch {
            subject,
            recorded: m.slots.len(),
            resolved: walk_len,
        }),
        _ => Ok(()),
    }
}

/// Inserts the subject into every counterpart's mirror sequence.
///
/// Without a memento each insertion appends (first execution of a creating
/// change); with one, entries return to the exact positions a prior
/// [`unlink_element`] vacated. Returns the memento of filled positions
/// either way.
///
/// # Errors
///
/// [`NetLedgerError::UnknownElement`] for a stale counterpart handle,
/// [`NetLedgerError::LinkReplayMismatch`] /
/// [`NetLedgerError::LinkSlotOutOfRange`] when the memento does not fit the
/// live walk. Nothing is mutated when an error is reported.
pub fn link_element(
    net: &mut Network,
    subject: ElementId,
    memento: Option<&LinkMemento>,
) -> Result<LinkMemento, NetLedgerError> {
    let (subject_kind, walk) = resolve_walk(net, subject)?;
    check_memento_shape(subject, memento, walk.len())?;

    // Validation pass: all counterparts resolve, all slots fit.
    let mut pending: HashMap<(Side, ElementId), usize> = HashMap::new();
    for (i, entry) in walk.iter().enumerate() {
        let seq = mirror_seq(net, entry, subject_kind)?;
        let already = pending.entry(entry.sequence_key()).or_insert(0);
        if let Some(m) = memento {
            let slot = m.slots[i];
            if slot > seq.len() + *already {
                return Err(NetLedgerError::LinkSlotOutOfRange {
                    counterpart: entry.target,
                    slot,
                    len: seq.len() + *already,
                });
            }
        }
        *already += 1;
    }

    // Mutation pass. Memento slots ascend per sequence, so inserting in walk
    // order keeps every recorded coordinate valid when its turn comes.
    let mut filled = Vec::with_capacity(walk.len());
    for (i, entry) in walk.iter().enumerate() {
        let seq = mirror_seq_mut(net, entry, subject_kind)?;
        let slot = match memento {
            Some(m) => m.slots[i],
            None => seq.len(),
        };
        seq.insert(slot, subject);
        filled.push(slot);
    }
    log::trace!("linked {} mirror entries for element {subject}", filled.len());
    Ok(LinkMemento { slots: filled })
}

/// Removes the subject from every counterpart's mirror sequence.
///
/// Without a memento the walk removes occurrences front to back (a deleting
/// change's first execution, where symmetry guarantees the counts match);
/// with one, exactly the recorded positions are vacated. Returns the memento
/// of vacated positions for the paired [`link_element`].
///
/// # Errors
///
/// [`NetLedgerError::MissingLink`] when a counterpart does not hold the
/// expected occurrence, plus the handle and memento errors of
/// [`link_element`]. Nothing is mutated when an error is reported.
pub fn unlink_element(
    net: &mut Network,
    subject: ElementId,
    memento: Option<&LinkMemento>,
) -> Result<LinkMemento, NetLedgerError> {
    let (subject_kind, walk) = resolve_walk(net, subject)?;
    check_memento_shape(subject, memento, walk.len())?;

    // Validation pass against the untouched state: memento slots must hold
    // the subject; self-resolved walks need enough occurrences per sequence.
    let mut required: HashMap<(Side, ElementId), usize> = HashMap::new();
    for (i, entry) in walk.iter().enumerate() {
        let seq = mirror_seq(net, entry, subject_kind)?;
        match memento {
            Some(m) => {
                let slot = m.slots[i];
                if slot >= seq.len() {
                    return Err(NetLedgerError::LinkSlotOutOfRange {
                        counterpart: entry.target,
                        slot,
                        len: seq.len(),
                    });
                }
                if seq[slot] != subject {
                    return Err(NetLedgerError::MissingLink {
                        subject,
                        counterpart: entry.target,
                        side: entry.side.mirror_name(),
                    });
                }
            }
            None => {
                let needed = required.entry(entry.sequence_key()).or_insert(0);
                *needed += 1;
                let present = seq.iter().filter(|&&e| e == subject).count();
                if present < *needed {
                    return Err(NetLedgerError::MissingLink {
                        subject,
                        counterpart: entry.target,
                        side: entry.side.mirror_name(),
                    });
                }
            }
        }
    }

    // Mutation pass. Coordinates are recorded in pre-walk (linked) state;
    // removals shift later occurrences left, hence the per-sequence offset.
    let mut removed: HashMap<(Side, ElementId), usize> = HashMap::new();
    let mut vacated = Vec::with_capacity(walk.len());
    for (i, entry) in walk.iter().enumerate() {
        let prior = removed.entry(entry.sequence_key()).or_insert(0);
        let seq = mirror_seq_mut(net, entry, subject_kind)?;
        let slot = match memento {
            Some(m) => m.slots[i],
            None => {
                let at = seq
                    .iter()
                    .position(|&e| e == subject)
                    .expect("occurrence count validated above");
                at + *prior
            }
        };
        seq.remove(slot - *prior);
        *prior += 1;
        vacated.push(slot);
    }
    log::trace!(
        "unlinked {} mirror entries for element {subject}",
        vacated.len()
    );
    Ok(LinkMemento { slots: vacated })
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::schema::{Schema, TagSchema};
    use crate::debug_invariants::DebugInvariants;
    use std::sync::Arc;

    fn net() -> Network {
        let tags = vec![
            TagSchema::new("edge", ElementKind::Edge, vec![]),
            TagSchema::new("lane", ElementKind::Lane, vec![]),
            TagSchema::new("busStop", ElementKind::Additional, vec![]),
            TagSchema::new("poly", ElementKind::Shape, vec![]),
            TagSchema::new("taz", ElementKind::TazElement, vec![]),
            TagSchema::new("trip", ElementKind::DemandElement, vec![]),
            TagSchema::new("edgeData", ElementKind::GenericData, vec![]),
        ];
        Network::new(Arc::new(Schema::new(tags).unwrap()))
    }

    fn attached(net: &mut Network, tag: &str) -> ElementId {
        let id = net.create_element(tag).unwrap();
        net.attach(id).unwrap();
        id
    }

    #[test]
    fn link_mirrors_parents_and_children() {
        let mut net = net();
        let edge = attached(&mut net, "edge");
        let stop = attached(&mut net, "busStop");
        let data = attached(&mut net, "edgeData");

        let trip = net.create_element("trip").unwrap();
        net.declare_parent(trip, edge).unwrap();
        net.declare_parent(trip, stop).unwrap();
        net.declare_child(trip, data).unwrap();
        net.attach(trip).unwrap();

        link_element(&mut net, trip, None).unwrap();
        assert_eq!(
            net.children_of(edge, ElementKind::DemandElement).unwrap(),
            &[trip]
        );
        assert_eq!(
            net.children_of(stop, ElementKind::DemandElement).unwrap(),
            &[trip]
        );
        assert_eq!(
            net.parents_of(data, ElementKind::DemandElement).unwrap(),
            &[trip]
        );
        net.debug_assert_invariants();
    }

    #[test]
    fn unlink_clears_mirrors_and_keeps_own_sequences() {
        let mut net = net();
        let edge = attached(&mut net, "edge");
        let lane = net.create_element("lane").unwrap();
        net.declare_parent(lane, edge).unwrap();
        net.attach(lane).unwrap();
        link_element(&mut net, lane, None).unwrap();

        let memento = unlink_element(&mut net, lane, None).unwrap();
        assert_eq!(memento.len(), 1);
        assert!(net.children_of(edge, ElementKind::Lane).unwrap().is_empty());
        // the subject's own capture survives for a later re-link
        assert_eq!(net.parents_of(lane, ElementKind::Edge).unwrap(), &[edge]);
    }

    #[test]
    fn empty_hierarchy_is_a_noop() {
        let mut net = net();
        let edge = attached(&mut net, "edge");
        let m = link_element(&mut net, edge, None).unwrap();
        assert!(m.is_empty());
        let m = unlink_element(&mut net, edge, None).unwrap();
        assert!(m.is_empty());
    }

    #[test]
    fn appended_links_preserve_sibling_order() {
        let mut net = net();
        let edge = attached(&mut net, "edge");
        let mut lanes = Vec::new();
        for _ in 0..3 {
            let lane = net.create_element("lane").unwrap();
            net.declare_parent(lane, edge).unwrap();
            net.attach(lane).unwrap();
            link_element(&mut net, lane, None).unwrap();
            lanes.push(lane);
        }
        assert_eq!(
            net.children_of(edge, ElementKind::Lane).unwrap(),
            lanes.as_slice()
        );
    }

    #[test]
    fn memento_restores_middle_position() {
        let mut net = net();
        let edge = attached(&mut net, "edge");
        let mut lanes = Vec::new();
        for _ in 0..3 {
            let lane = net.create_element("lane").unwrap();
            net.declare_parent(lane, edge).unwrap();
            net.attach(lane).unwrap();
            link_element(&mut net, lane, None).unwrap();
            lanes.push(lane);
        }
        let middle = lanes[1];
        let memento = unlink_element(&mut net, middle, None).unwrap();
        net.detach(middle).unwrap();
        assert_eq!(
            net.children_of(edge, ElementKind::Lane).unwrap(),
            &[lanes[0], lanes[2]]
        );

        net.attach(middle).unwrap();
        link_element(&mut net, middle, Some(&memento)).unwrap();
        assert_eq!(
            net.children_of(edge, ElementKind::Lane).unwrap(),
            lanes.as_slice()
        );
        net.debug_assert_invariants();
    }

    #[test]
    fn duplicate_references_link_and_unlink_fully() {
        let mut net = net();
        let edge = attached(&mut net, "edge");
        let trip = net.create_element("trip").unwrap();
        net.declare_parent(trip, edge).unwrap();
        net.declare_parent(trip, edge).unwrap();
        net.attach(trip).unwrap();

        link_element(&mut net, trip, None).unwrap();
        assert_eq!(
            net.children_of(edge, ElementKind::DemandElement).unwrap(),
            &[trip, trip]
        );
        net.debug_assert_invariants();

        unlink_element(&mut net, trip, None).unwrap();
        assert!(net
            .children_of(edge, ElementKind::DemandElement)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn stale_memento_is_rejected() {
        let mut net = net();
        let edge = attached(&mut net, "edge");
        let other = attached(&mut net, "edge");
        let lane = net.create_element("lane").unwrap();
        net.declare_parent(lane, edge).unwrap();
        net.attach(lane).unwrap();
        link_element(&mut net, lane, None).unwrap();
        let memento = unlink_element(&mut net, lane, None).unwrap();

        // bundle grows behind the memento's back
        net.hierarchy_mut(lane)
            .unwrap()
            .parents_mut(ElementKind::Edge)
            .push(other);
        let err = link_element(&mut net, lane, Some(&memento)).unwrap_err();
        assert_eq!(
            err,
            NetLedgerError::LinkReplayMismatch {
                subject: lane,
                recorded: 1,
                resolved: 2,
            }
        );
    }

    #[test]
    fn missing_occurrence_is_reported_without_mutation() {
        let mut net = net();
        let edge = attached(&mut net, "edge");
        let lane = net.create_element("lane").unwrap();
        net.declare_parent(lane, edge).unwrap();
        net.attach(lane).unwrap();
        // never linked: the mirror entry does not exist
        let err = unlink_element(&mut net, lane, None).unwrap_err();
        assert_eq!(
            err,
            NetLedgerError::MissingLink {
                subject: lane,
                counterpart: edge,
                side: "child",
            }
        );
    }
}
