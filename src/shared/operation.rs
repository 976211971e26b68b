/**
 * Linear Data Operations
 *
 * This module defines the edit primitives that make up a transaction. The
 * document itself is an opaque sequence of items; an operation only needs
 * to know how far it moves through that sequence, how much it changes its
 * length, and which offsets it touches.
 */

use serde::{Deserialize, Serialize};

/// One element of linear document data
///
/// Plain characters are JSON strings, annotated characters are
/// `[char, [index, ...]]`, element openings are JSON objects that may hold an
/// `attributes` object.
pub type Item = serde_json::Value;

/// Whether an annotation operation adds or removes an annotation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationMethod {
    /// Add the annotation to the covered items
    Set,
    /// Remove the annotation from the covered items
    Clear,
}

impl AnnotationMethod {
    /// The method that undoes this one
    pub fn reversed(self) -> Self {
        match self {
            Self::Set => Self::Clear,
            Self::Clear => Self::Set,
        }
    }
}

/// Whether an annotation operation opens or closes its span
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationBias {
    /// Opens the annotated span
    Start,
    /// Closes the annotated span
    Stop,
}

/// Atomic edit primitive
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Skip over `length` items unchanged
    Retain {
        /// Number of items to skip
        length: usize,
    },
    /// Replace the items at the cursor
    Replace {
        /// Items expected at the cursor, removed
        remove: Vec<Item>,
        /// Items inserted in their place
        insert: Vec<Item>,
    },
    /// Change one attribute of the element at the cursor
    Attribute {
        /// Attribute name
        key: String,
        /// Previous value (`None` when unset)
        from: Option<serde_json::Value>,
        /// New value (`None` to unset)
        to: Option<serde_json::Value>,
    },
    /// Open or close an annotation span at the cursor
    Annotate {
        /// Set or clear
        method: AnnotationMethod,
        /// Start or stop of the span
        bias: AnnotationBias,
        /// Annotation index (store hash of the annotation)
        index: String,
    },
}

impl Operation {
    /// Create a retain operation
    pub fn retain(length: usize) -> Self {
        Self::Retain { length }
    }

    /// Create a replace operation
    pub fn replace(remove: Vec<Item>, insert: Vec<Item>) -> Self {
        Self::Replace { remove, insert }
    }

    /// Create an attribute change
    pub fn attribute(
        key: impl Into<String>,
        from: Option<serde_json::Value>,
        to: Option<serde_json::Value>,
    ) -> Self {
        Self::Attribute {
            key: key.into(),
            from,
            to,
        }
    }

    /// Create an annotation boundary
    pub fn annotate(method: AnnotationMethod, bias: AnnotationBias, index: impl Into<String>) -> Self {
        Self::Annotate {
            method,
            bias,
            index: index.into(),
        }
    }

    /// Number of pre-edit items this operation moves the cursor past
    pub fn advance(&self) -> usize {
        match self {
            Self::Retain { length } => *length,
            Self::Replace { remove, .. } => remove.len(),
            Self::Attribute { .. } | Self::Annotate { .. } => 0,
        }
    }

    /// Net change in document length
    pub fn length_delta(&self) -> isize {
        match self {
            Self::Replace { remove, insert } => insert.len() as isize - remove.len() as isize,
            _ => 0,
        }
    }

    /// Span of pre-edit offsets touched when this operation sits at `offset`
    ///
    /// Retains touch nothing. Attribute changes touch the element they modify.
    pub fn touched_span(&self, offset: usize) -> Option<(usize, usize)> {
        match self {
            Self::Retain { .. } => None,
            Self::Replace { remove, .. } => Some((offset, offset + remove.len())),
            Self::Attribute { .. } => Some((offset, offset + 1)),
            Self::Annotate { .. } => Some((offset, offset)),
        }
    }

    /// The operation that undoes this one
    pub fn invert(&self) -> Self {
        match self {
            Self::Retain { length } => Self::Retain { length: *length },
            Self::Replace { remove, insert } => Self::Replace {
                remove: insert.clone(),
                insert: remove.clone(),
            },
            Self::Attribute { key, from, to } => Self::Attribute {
                key: key.clone(),
                from: to.clone(),
                to: from.clone(),
            },
            Self::Annotate { method, bias, index } => Self::Annotate {
                method: method.reversed(),
                bias: *bias,
                index: index.clone(),
            },
        }
    }

    /// True for operations that never change the document length
    pub fn is_metadata(&self) -> bool {
        matches!(self, Self::Attribute { .. } | Self::Annotate { .. })
    }
}

/// Convert a string into one item per character
pub fn text_items(text: &str) -> Vec<Item> {
    text.chars().map(|c| Item::String(c.to_string())).collect()
}
