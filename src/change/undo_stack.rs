//! The undo/redo stack: executed changes on one side, undone ones on the
//! other, with nestable change groups between `begin`/`end`.
//!
//! Ordering is strict. `add` executes the change immediately and drops the
//! whole redo branch; `undo`/`redo` move exactly one entry (a single change
//! or a whole group) across the two sides, executing it on the way. A failed
//! execution propagates its error and leaves the entry on the side it came
//! from, so the history stays inspectable.

use std::collections::VecDeque;

use crate::change::Change;
use crate::ledger_error::NetLedgerError;
use crate::network::Network;

/// Changes recorded between one `begin`/`end` pair, undone and redone as a
/// unit. Groups nest: an inner group becomes one entry of its parent.
#[derive(Debug)]
struct ChangeGroup {
    label: String,
    entries: Vec<StackEntry>,
}

#[derive(Debug)]
enum StackEntry {
    Single(Change),
    Group(ChangeGroup),
}

impl StackEntry {
    fn size(&self) -> usize {
        match self {
            StackEntry::Single(change) => change.size(),
            StackEntry::Group(group) => group.entries.iter().map(StackEntry::size).sum(),
        }
    }

    fn description(&self) -> String {
        match self {
            StackEntry::Single(change) => change.description(),
            StackEntry::Group(group) => group.label.clone(),
        }
    }

    /// Members redo in insertion order.
    fn redo(&mut self, net: &mut Network) -> Result<(), NetLedgerError> {
        match self {
            StackEntry::Single(change) => change.redo(net),
            StackEntry::Group(group) => {
                for entry in group.entries.iter_mut() {
                    entry.redo(net)?;
                }
                Ok(())
            }
        }
    }

    /// Members undo in reverse insertion order.
    fn undo(&mut self, net: &mut Network) -> Result<(), NetLedgerError> {
        match self {
            StackEntry::Single(change) => change.undo(net),
            StackEntry::Group(group) => {
                for entry in group.entries.iter_mut().rev() {
                    entry.undo(net)?;
                }
                Ok(())
            }
        }
    }
}

/// Undo/redo history of one network.
///
/// The stack owns every recorded [`Change`]; the network arena keeps the
/// elements those changes refer to alive while entries referencing them
/// remain on either side.
#[derive(Debug, Default)]
pub struct UndoStack {
    /// Undo side; back is the most recent entry, front is evicted first.
    applied: VecDeque<StackEntry>,
    /// Redo side; last is the next entry to redo.
    undone: Vec<StackEntry>,
    /// Open groups, innermost last.
    open: Vec<ChangeGroup>,
    limit: Option<usize>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes `change` and records it.
    ///
    /// The redo branch is dropped first; the executed change lands in the
    /// innermost open group if any, else on the undo side, where entries past
    /// the limit are evicted oldest first. A change whose execution fails is
    /// not recorded and the history is left untouched.
    pub fn add(&mut self, mut change: Change, net: &mut Network) -> Result<(), NetLedgerError> {
        change.redo(net)?;
        self.undone.clear();
        match self.open.last_mut() {
            Some(group) => group.entries.push(StackEntry::Single(change)),
            None => {
                self.applied.push_back(StackEntry::Single(change));
                self.enforce_limit();
            }
        }
        Ok(())
    }

    /// Reverts the most recent entry, moving it to the redo side.
    ///
    /// Undoing with nothing recorded is a no-op.
    ///
    /// # Errors
    ///
    /// [`NetLedgerError::GroupStillOpen`] while a group awaits its `end`;
    /// replay errors leave the entry on the undo side.
    pub fn undo(&mut self, net: &mut Network) -> Result<(), NetLedgerError> {
        if let Some(group) = self.open.last() {
            return Err(NetLedgerError::GroupStillOpen(group.label.clone()));
        }
        let Some(mut entry) = self.applied.pop_back() else {
            log::debug!("undo requested on empty history");
            return Ok(());
        };
        match entry.undo(net) {
            Ok(()) => {
                self.undone.push(entry);
                Ok(())
            }
            Err(e) => {
                self.applied.push_back(entry);
                Err(e)
            }
        }
    }

    /// Re-applies the most recently undone entry, moving it back to the undo
    /// side. Mirror of [`undo`](Self::undo).
    pub fn redo(&mut self, net: &mut Network) -> Result<(), NetLedgerError> {
        if let Some(group) = self.open.last() {
            return Err(NetLedgerError::GroupStillOpen(group.label.clone()));
        }
        let Some(mut entry) = self.undone.pop() else {
            log::debug!("redo requested with nothing undone");
            return Ok(());
        };
        match entry.redo(net) {
            Ok(()) => {
                self.applied.push_back(entry);
                Ok(())
            }
            Err(e) => {
                self.undone.push(entry);
                Err(e)
            }
        }
    }

    /// Opens a change group; subsequent `add`s are recorded into it until the
    /// matching [`end`](Self::end). Groups nest.
    pub fn begin(&mut self, label: &str) {
        self.open.push(ChangeGroup {
            label: label.to_owned(),
            entries: Vec::new(),
        });
    }

    /// Closes the innermost open group.
    ///
    /// An empty group is discarded; otherwise it becomes one entry of its
    /// parent group or of the undo side.
    ///
    /// # Errors
    ///
    /// [`NetLedgerError::NoOpenGroup`] without a matching `begin`.
    pub fn end(&mut self) -> Result<(), NetLedgerError> {
        let Some(group) = self.open.pop() else {
            return Err(NetLedgerError::NoOpenGroup);
        };
        if group.entries.is_empty() {
            log::trace!("discarding empty change group '{}'", group.label);
            return Ok(());
        }
        let entry = StackEntry::Group(group);
        match self.open.last_mut() {
            Some(parent) => parent.entries.push(entry),
            None => {
                self.applied.push_back(entry);
                self.enforce_limit();
            }
        }
        Ok(())
    }

    /// Whether a change group is currently open.
    #[inline]
    pub fn in_group(&self) -> bool {
        !self.open.is_empty()
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        self.open.is_empty() && !self.applied.is_empty()
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        self.open.is_empty() && !self.undone.is_empty()
    }

    /// Label for the next undo, `"Undo <description>"`, or plain `"Undo"`
    /// with nothing recorded.
    pub fn undo_name(&self) -> String {
        match self.applied.back() {
            Some(entry) => format!("Undo {}", entry.description()),
            None => "Undo".to_owned(),
        }
    }

    /// Label for the next redo, mirroring [`undo_name`](Self::undo_name).
    pub fn redo_name(&self) -> String {
        match self.undone.last() {
            Some(entry) => format!("Redo {}", entry.description()),
            None => "Redo".to_owned(),
        }
    }

    /// Total `size()` of the undo side, groups counted member by member.
    pub fn undo_size(&self) -> usize {
        self.applied.iter().map(StackEntry::size).sum()
    }

    pub fn redo_size(&self) -> usize {
        self.undone.iter().map(StackEntry::size).sum()
    }

    /// Drops the whole history, open groups included. Recorded changes are
    /// destroyed without being reverted.
    pub fn clear(&mut self) {
        let dropped = self.undo_size() + self.redo_size();
        self.applied.clear();
        self.undone.clear();
        self.open.clear();
        if dropped > 0 {
            log::debug!("cleared undo history, dropped {dropped} changes");
        }
    }

    /// Caps the total `size()` of the undo side; `None` lifts the cap.
    /// Applies immediately and on every later push.
    pub fn set_undo_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
        self.enforce_limit();
    }

    fn enforce_limit(&mut self) {
        let Some(limit) = self.limit else {
            return;
        };
        while !self.applied.is_empty() && self.undo_size() > limit {
            // unwrap is fine, emptiness checked above
            let evicted = self.applied.pop_front().unwrap();
            log::warn!(
                "undo history over limit {limit}, dropping oldest entry '{}'",
                evicted.description()
            );
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
