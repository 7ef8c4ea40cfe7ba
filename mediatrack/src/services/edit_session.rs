//! Detail screen edit session
//!
//! Holds the saved value (baseline) and the edited value (draft) of every
//! editable field. `diff()` is pure: it turns the pending edits into the
//! update payload without touching storage.

use crate::database::{EntryDetail, EntryUpdate, Status, Tier};

/// Saved and edited value of one field
#[derive(Debug, Clone, PartialEq)]
pub struct Field<T> {
    pub baseline: T,
    pub draft: T,
}

impl<T: Clone + PartialEq> Field<T> {
    fn new(value: T) -> Self {
        Self {
            baseline: value.clone(),
            draft: value,
        }
    }

    pub fn is_changed(&self) -> bool {
        self.baseline != self.draft
    }

    fn changed_draft(&self) -> Option<T> {
        self.is_changed().then(|| self.draft.clone())
    }

    fn reset(&mut self) {
        self.draft = self.baseline.clone();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    entry_id: String,
    status: Field<Status>,
    tier: Field<Option<Tier>>,
    is_favorite: Field<bool>,
    /// Missing notes are edited as an empty string
    notes: Field<String>,
}

impl EditSession {
    pub fn new(detail: &EntryDetail) -> Self {
        let entry = &detail.entry;
        Self {
            entry_id: entry.entry_id.clone(),
            status: Field::new(entry.status),
            tier: Field::new(entry.tier),
            is_favorite: Field::new(entry.is_favorite),
            notes: Field::new(entry.notes.clone().unwrap_or_default()),
        }
    }

    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    pub fn set_status(&mut self, status: Status) {
        self.status.draft = status;
    }

    pub fn set_tier(&mut self, tier: Tier) {
        self.tier.draft = Some(tier);
    }

    pub fn toggle_favorite(&mut self) {
        self.is_favorite.draft = !self.is_favorite.draft;
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes.draft = notes.into();
    }

    pub fn status(&self) -> &Field<Status> {
        &self.status
    }

    pub fn tier(&self) -> &Field<Option<Tier>> {
        &self.tier
    }

    pub fn is_favorite(&self) -> &Field<bool> {
        &self.is_favorite
    }

    pub fn notes(&self) -> &Field<String> {
        &self.notes
    }

    pub fn has_changes(&self) -> bool {
        self.status.is_changed()
            || self.tier.is_changed()
            || self.is_favorite.is_changed()
            || self.notes.is_changed()
    }

    /// Update payload with only the changed fields.
    ///
    /// Completing an entry sends just the status; the completion date is
    /// filled by the store so an existing date is kept.
    pub fn diff(&self) -> EntryUpdate {
        EntryUpdate {
            status: self.status.changed_draft(),
            tier: self.tier.changed_draft().flatten(),
            is_favorite: self.is_favorite.changed_draft(),
            notes: self.notes.changed_draft(),
            completed_date: None,
        }
    }

    /// Discard all edits
    pub fn reset(&mut self) {
        self.status.reset();
        self.tier.reset();
        self.is_favorite.reset();
        self.notes.reset();
    }

    /// Adopt freshly saved values as the new baseline, dropping edits
    pub fn rebase(&mut self, detail: &EntryDetail) {
        *self = Self::new(detail);
    }
}
