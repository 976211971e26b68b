/**
 * Author Bookkeeping
 *
 * Per-author state the server needs to interpret an author's next
 * submission: how many of their transactions are waiting to be acknowledged
 * as rejected, and the baseline their next change will be built against.
 * Name, color and selection are presentation data passed through untouched.
 */

use serde::{Deserialize, Serialize};

use crate::shared::change::Change;

/// Author identifier, unique per document session
pub type AuthorId = u64;

/// Opaque selection owned by the presentation layer
pub type Selection = serde_json::Value;

/// Per-author state within one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorState {
    /// Baseline the author's next change must be rebased over
    pub continue_base: Option<Change>,
    /// Transactions rejected but not yet acknowledged through `backtrack`
    pub rejections: usize,
    /// Display name
    pub name: Option<String>,
    /// Display color
    pub color: Option<String>,
    /// Last known selection
    pub selection: Option<Selection>,
}

/// Partial update of an `AuthorState`
///
/// Only fields that are `Some` overwrite the existing value; `None` fields
/// leave the current value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorDataChanges {
    pub continue_base: Option<Change>,
    pub rejections: Option<usize>,
    pub name: Option<String>,
    pub color: Option<String>,
    pub selection: Option<Selection>,
}

impl AuthorDataChanges {
    pub fn continue_base(mut self, base: Change) -> Self {
        self.continue_base = Some(base);
        self
    }

    pub fn rejections(mut self, rejections: usize) -> Self {
        self.rejections = Some(rejections);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }
}

impl AuthorState {
    /// Merge a partial update into this state
    pub fn apply(&mut self, changes: AuthorDataChanges) {
        if let Some(base) = changes.continue_base {
            self.continue_base = Some(base);
        }
        if let Some(rejections) = changes.rejections {
            self.rejections = rejections;
        }
        if let Some(name) = changes.name {
            self.name = Some(name);
        }
        if let Some(color) = changes.color {
            self.color = Some(color);
        }
        if let Some(selection) = changes.selection {
            self.selection = Some(selection);
        }
    }
}
