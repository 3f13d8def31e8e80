//! Reminder state machine and the notification ledger.
//!
//! The ledger remembers the reminder instant each note was notified for. A
//! note counts as notified only while its current `reminder_at` equals that
//! instant, so rescheduling or clearing a reminder re-arms it.

use crate::{Note, NoteId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a note's reminder stands at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderState {
    /// No reminder set.
    None,
    /// Reminder set in the future.
    Pending,
    /// Reminder elapsed, notification not yet delivered.
    DueUnnotified,
    /// Notification delivered for the current reminder instant.
    Notified,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationLedger {
    fired: HashMap<NoteId, Timestamp>,
}

impl NotificationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_notified(&self, note: &Note) -> bool {
        match note.reminder_at {
            Some(at) => self.fired.get(&note.id) == Some(&at),
            None => false,
        }
    }

    pub fn state_of(&self, note: &Note, now: Timestamp) -> ReminderState {
        match note.reminder_at {
            None => ReminderState::None,
            Some(_) if self.is_notified(note) => ReminderState::Notified,
            Some(at) if at <= now => ReminderState::DueUnnotified,
            Some(_) => ReminderState::Pending,
        }
    }

    /// Notes whose reminder is due and not yet notified, in collection order.
    pub fn due_unnotified<'a>(&self, notes: &'a [Note], now: Timestamp) -> Vec<&'a Note> {
        notes
            .iter()
            .filter(|note| self.state_of(note, now) == ReminderState::DueUnnotified)
            .collect()
    }

    /// Mark the note's current reminder as notified.
    ///
    /// Returns `false` when the note has no reminder.
    pub fn record(&mut self, note: &Note) -> bool {
        match note.reminder_at {
            Some(at) => {
                self.fired.insert(note.id, at);
                true
            }
            None => false,
        }
    }

    pub fn forget(&mut self, id: NoteId) -> Option<Timestamp> {
        self.fired.remove(&id)
    }

    /// Drop entries for notes that are gone or whose reminder has changed.
    ///
    /// Returns how many entries were removed.
    pub fn prune(&mut self, notes: &[Note]) -> usize {
        let current: HashMap<NoteId, Option<Timestamp>> =
            notes.iter().map(|note| (note.id, note.reminder_at)).collect();
        let before = self.fired.len();
        self.fired
            .retain(|id, at| matches!(current.get(id), Some(Some(current_at)) if *current_at == *at));
        before - self.fired.len()
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.fired.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }
}
