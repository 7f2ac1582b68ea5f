//! NetLedgerError: unified error type for net-ledger public APIs.
//!
//! Every fallible operation in the crate reports through this enum so that
//! callers get non-panicking, matchable error handling. Contract violations
//! (dangling handles, out-of-order replay) surface here as typed errors
//! rather than as undefined behavior.

use thiserror::Error;

use crate::attribute::value::AttrType;
use crate::element::id::ElementId;
use crate::element::kind::ElementKind;

/// Unified error type for net-ledger operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetLedgerError {
    /// A handle did not resolve to an element in this arena.
    #[error("unknown element `{0}` in this arena")]
    UnknownElement(ElementId),
    /// No tag schema is registered under this name.
    #[error("unknown tag `{0}`")]
    UnknownTag(String),
    /// Two tag schemas with the same name were handed to one schema set.
    #[error("duplicate tag `{0}` in schema")]
    DuplicateTag(String),
    /// One tag schema declares the same attribute key twice.
    #[error("tag `{tag}` declares attribute `{key}` twice")]
    DuplicateAttribute { tag: String, key: String },
    /// Attachment of an element that is already part of the graph.
    #[error("element `{0}` is already attached")]
    AlreadyAttached(ElementId),
    /// Detachment of an element that is not part of the graph.
    #[error("element `{0}` is not attached")]
    NotAttached(ElementId),
    /// Discarding is only legal for detached elements.
    #[error("element `{0}` is still attached and cannot be discarded")]
    DiscardAttached(ElementId),
    /// Construction-time references can only be declared on detached elements.
    #[error("element `{0}` is attached; declare references before the creating change runs")]
    DeclareOnAttached(ElementId),
    /// An unlink walk expected `subject` in a counterpart sequence and found nothing.
    #[error("missing link: `{subject}` not present in the {side} sequence of `{counterpart}`")]
    MissingLink {
        subject: ElementId,
        counterpart: ElementId,
        /// Which mirror sequence was searched: `"child"` or `"parent"`.
        side: &'static str,
    },
    /// A link replay memento no longer matches the subject's live bundles.
    #[error("link replay mismatch for `{subject}`: memento holds {recorded} slots, live walk resolves {resolved}")]
    LinkReplayMismatch {
        subject: ElementId,
        recorded: usize,
        resolved: usize,
    },
    /// A memento slot points past the end of a counterpart sequence.
    #[error("link replay slot {slot} out of range for `{counterpart}` (sequence length {len})")]
    LinkSlotOutOfRange {
        counterpart: ElementId,
        slot: usize,
        len: usize,
    },
    /// An operation received an element of the wrong kind.
    #[error("kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        expected: ElementKind,
        found: ElementKind,
    },
    /// The tag schema has no attribute under this key.
    #[error("tag `{tag}` has no attribute `{key}`")]
    UnknownAttribute { tag: String, key: String },
    /// The attribute is unset and its spec declares no default.
    #[error("attribute `{key}` of tag `{tag}` is unset and has no default")]
    UnsetAttribute { tag: String, key: String },
    /// A value of the wrong type was offered for an attribute.
    #[error("attribute `{key}` expects {expected}, found {found}")]
    AttributeTypeMismatch {
        key: String,
        expected: AttrType,
        found: AttrType,
    },
    /// A string could not be parsed as the requested attribute type.
    #[error("cannot parse `{input}` as {expected}")]
    AttributeParse { expected: AttrType, input: String },
    /// `end()` was called with no open change group.
    #[error("no change group is open")]
    NoOpenGroup,
    /// Undo/redo attempted while a change group is still open.
    #[error("change group `{0}` is still open")]
    GroupStillOpen(String),
    /// Consistency sweep: mirror multiplicities disagree.
    #[error("broken symmetry between `{parent}` and `{child}`: child multiplicity {down} != parent multiplicity {up}")]
    BrokenSymmetry {
        parent: ElementId,
        child: ElementId,
        down: usize,
        up: usize,
    },
    /// Consistency sweep: an attached element references a missing or detached one.
    #[error("dangling reference: attached `{holder}` references `{target}`, which is {state}")]
    DanglingReference {
        holder: ElementId,
        target: ElementId,
        /// `"absent"` (not in the arena) or `"detached"`.
        state: &'static str,
    },
    /// Consistency sweep: attachment registry and element flags disagree.
    #[error("attachment registry mismatch for element `{0}`")]
    RegistryMismatch(ElementId),
}
