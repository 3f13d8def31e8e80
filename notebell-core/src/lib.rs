//! notebell core - note domain
//!
//! Pure data structures and state transitions shared by the client and its
//! tests. Nothing in this crate performs I/O.

pub mod error;
pub mod filter;
pub mod identity;
pub mod note;
pub mod reminder;
pub mod store;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use error::{NoteError, NoteResult};
pub use filter::{filter_notes, note_matches, FilteredView};
pub use identity::{
    format_for_editing, format_wire, parse_timestamp, NoteId, Timestamp, EDIT_FORMAT, WIRE_FORMAT,
};
pub use note::{Attachment, Note, NoteDraft, UpdateDraft};
pub use reminder::{NotificationLedger, ReminderState};
pub use store::NoteStore;
