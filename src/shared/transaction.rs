/**
 * Transactions
 *
 * A transaction is one atomic edit: an ordered list of operations walked
 * left to right over the document. Transactions are kept in canonical form
 * (merged retains, no empty operations, no trailing retain) so that two
 * equivalent edits compare equal and the rebase function stays deterministic.
 *
 * Everything after the last operation is implicitly retained, which lets a
 * transaction be moved through history by adjusting only its leading retain.
 */

use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;
use crate::shared::operation::{AnnotationBias, AnnotationMethod, Item, Operation};

/// Span of pre-edit offsets a transaction touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveRange {
    /// First touched offset
    pub start: usize,
    /// One past the last touched offset (equal to `start` for a pure insertion)
    pub end: usize,
    /// Net change in document length
    pub length_delta: isize,
}

/// Metadata a transaction changes without moving content
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Touch {
    Attribute { offset: usize, key: String },
    Annotation { index: String },
}

/// An ordered, atomic list of operations
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "Vec<Operation>", into = "Vec<Operation>")]
pub struct Transaction {
    operations: Vec<Operation>,
}

impl Transaction {
    /// Create a transaction, normalizing the operation list
    pub fn new(operations: Vec<Operation>) -> Self {
        Self {
            operations: normalize(operations),
        }
    }

    /// Start building a transaction
    pub fn builder() -> TransactionBuilder {
        TransactionBuilder::default()
    }

    /// Insert `items` at `offset`
    pub fn insertion(offset: usize, items: Vec<Item>) -> Self {
        Self::builder().retain(offset).insert(items).build()
    }

    /// Remove `items`, which must sit at `offset`
    pub fn removal(offset: usize, items: Vec<Item>) -> Self {
        Self::builder().retain(offset).remove(items).build()
    }

    /// The operations in this transaction
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// True when the transaction changes nothing
    pub fn is_noop(&self) -> bool {
        self.operations.is_empty()
    }

    /// Net change in document length
    pub fn length_delta(&self) -> isize {
        self.operations.iter().map(Operation::length_delta).sum()
    }

    /// Span of the document this transaction touches, or `None` for a no-op
    pub fn active_range(&self) -> Option<ActiveRange> {
        let mut offset = 0;
        let mut range: Option<(usize, usize)> = None;
        for op in &self.operations {
            if let Some((start, end)) = op.touched_span(offset) {
                range = Some(match range {
                    None => (start, end),
                    Some((lo, hi)) => (lo.min(start), hi.max(end)),
                });
            }
            offset += op.advance();
        }
        range.map(|(start, end)| ActiveRange {
            start,
            end,
            length_delta: self.length_delta(),
        })
    }

    /// True when every non-retain operation only changes metadata
    pub fn is_metadata_only(&self) -> bool {
        self.operations
            .iter()
            .all(|op| matches!(op, Operation::Retain { .. }) || op.is_metadata())
    }

    pub(crate) fn metadata_touches(&self) -> Vec<Touch> {
        let mut offset = 0;
        let mut touches = Vec::new();
        for op in &self.operations {
            match op {
                Operation::Attribute { key, .. } => touches.push(Touch::Attribute {
                    offset,
                    key: key.clone(),
                }),
                Operation::Annotate { index, .. } => touches.push(Touch::Annotation {
                    index: index.clone(),
                }),
                _ => {}
            }
            offset += op.advance();
        }
        touches
    }

    /// Move the whole transaction by `delta` positions
    ///
    /// Only the leading retain changes; a shift that would move the first
    /// operation before offset 0 is an error.
    pub fn shifted(&self, delta: isize) -> Result<Self, SharedError> {
        if delta == 0 || self.operations.is_empty() {
            return Ok(self.clone());
        }
        let mut operations = self.operations.clone();
        let leading = match operations.first() {
            Some(Operation::Retain { length }) => *length,
            _ => 0,
        };
        let moved = leading as isize + delta;
        if moved < 0 {
            return Err(SharedError::invalid_transaction(format!(
                "cannot shift leading retain {} by {}",
                leading, delta
            )));
        }
        if leading > 0 {
            operations.remove(0);
        }
        if moved > 0 {
            operations.insert(0, Operation::retain(moved as usize));
        }
        Ok(Self::new(operations))
    }

    /// The transaction that undoes this one
    pub fn invert(&self) -> Self {
        Self::new(self.operations.iter().map(Operation::invert).collect())
    }

    /// Apply this transaction to a linear document
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransaction` when an operation runs past the end of
    /// the document, a removal does not match the items present, an attribute
    /// change targets a non-element or a stale value, or annotation
    /// boundaries are unbalanced.
    pub fn apply(&self, document: &[Item]) -> Result<Vec<Item>, SharedError> {
        let mut source = document.to_vec();
        let mut output = Vec::with_capacity(source.len());
        let mut cursor = 0;
        let mut annotations: Vec<(AnnotationMethod, String)> = Vec::new();

        for op in &self.operations {
            match op {
                Operation::Retain { length } => {
                    let end = cursor + length;
                    if end > source.len() {
                        return Err(SharedError::invalid_transaction(format!(
                            "retain to {} past document length {}",
                            end,
                            source.len()
                        )));
                    }
                    output.extend(source[cursor..end].iter().map(|item| annotate_item(item, &annotations)));
                    cursor = end;
                }
                Operation::Replace { remove, insert } => {
                    let end = cursor + remove.len();
                    if end > source.len() || source[cursor..end] != remove[..] {
                        return Err(SharedError::invalid_transaction(format!(
                            "removed items do not match document at offset {}",
                            cursor
                        )));
                    }
                    output.extend(insert.iter().cloned());
                    cursor = end;
                }
                Operation::Attribute { key, from, to } => {
                    let item = source.get_mut(cursor).ok_or_else(|| {
                        SharedError::invalid_transaction(format!("no element at offset {}", cursor))
                    })?;
                    set_attribute(item, key, from.as_ref(), to.as_ref())?;
                }
                Operation::Annotate { method, bias, index } => match bias {
                    AnnotationBias::Start => annotations.push((*method, index.clone())),
                    AnnotationBias::Stop => {
                        let open = annotations
                            .iter()
                            .position(|(m, i)| m == method && i == index)
                            .ok_or_else(|| {
                                SharedError::invalid_transaction(format!(
                                    "annotation {} stopped without start",
                                    index
                                ))
                            })?;
                        annotations.remove(open);
                    }
                },
            }
        }

        if let Some((_, index)) = annotations.first() {
            return Err(SharedError::invalid_transaction(format!(
                "annotation {} never stopped",
                index
            )));
        }
        output.extend(source.drain(cursor..));
        Ok(output)
    }
}

impl From<Vec<Operation>> for Transaction {
    fn from(operations: Vec<Operation>) -> Self {
        Self::new(operations)
    }
}

impl From<Transaction> for Vec<Operation> {
    fn from(transaction: Transaction) -> Self {
        transaction.operations
    }
}

/// Builder for transactions
#[derive(Debug, Default)]
pub struct TransactionBuilder {
    operations: Vec<Operation>,
}

impl TransactionBuilder {
    /// Skip `length` items
    pub fn retain(mut self, length: usize) -> Self {
        self.operations.push(Operation::retain(length));
        self
    }

    /// Insert items at the cursor
    pub fn insert(self, items: Vec<Item>) -> Self {
        self.replace(Vec::new(), items)
    }

    /// Remove items at the cursor
    pub fn remove(self, items: Vec<Item>) -> Self {
        self.replace(items, Vec::new())
    }

    /// Replace items at the cursor
    pub fn replace(mut self, remove: Vec<Item>, insert: Vec<Item>) -> Self {
        self.operations.push(Operation::replace(remove, insert));
        self
    }

    /// Change an attribute of the element at the cursor
    pub fn attribute(
        mut self,
        key: impl Into<String>,
        from: Option<serde_json::Value>,
        to: Option<serde_json::Value>,
    ) -> Self {
        self.operations.push(Operation::attribute(key, from, to));
        self
    }

    /// Open or close an annotation span
    pub fn annotate(mut self, method: AnnotationMethod, bias: AnnotationBias, index: impl Into<String>) -> Self {
        self.operations.push(Operation::annotate(method, bias, index));
        self
    }

    /// Build the normalized transaction
    pub fn build(self) -> Transaction {
        Transaction::new(self.operations)
    }
}

fn normalize(operations: Vec<Operation>) -> Vec<Operation> {
    let mut out: Vec<Operation> = Vec::with_capacity(operations.len());
    for op in operations {
        match op {
            Operation::Retain { length: 0 } => {}
            Operation::Replace { ref remove, ref insert } if remove.is_empty() && insert.is_empty() => {}
            Operation::Retain { length } => match out.last_mut() {
                Some(Operation::Retain { length: previous }) => *previous += length,
                _ => out.push(Operation::Retain { length }),
            },
            other => out.push(other),
        }
    }
    while matches!(out.last(), Some(Operation::Retain { .. })) {
        out.pop();
    }
    out
}

fn set_attribute(
    item: &mut Item,
    key: &str,
    from: Option<&serde_json::Value>,
    to: Option<&serde_json::Value>,
) -> Result<(), SharedError> {
    let element = item
        .as_object_mut()
        .ok_or_else(|| SharedError::invalid_transaction(format!("attribute {} set on a non-element", key)))?;
    let attributes = element
        .entry("attributes")
        .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()))
        .as_object_mut()
        .ok_or_else(|| SharedError::invalid_transaction("element attributes are not an object"))?;

    if attributes.get(key) != from {
        return Err(SharedError::invalid_transaction(format!(
            "attribute {} does not hold the expected previous value",
            key
        )));
    }
    match to {
        Some(value) => {
            attributes.insert(key.to_string(), value.clone());
        }
        None => {
            attributes.remove(key);
        }
    }
    Ok(())
}

fn annotate_item(item: &Item, annotations: &[(AnnotationMethod, String)]) -> Item {
    if annotations.is_empty() {
        return item.clone();
    }
    let (character, mut indexes): (Item, Vec<String>) = match item {
        Item::String(_) => (item.clone(), Vec::new()),
        Item::Array(pair) if pair.len() == 2 => {
            let indexes = pair[1]
                .as_array()
                .map(|list| list.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default();
            (pair[0].clone(), indexes)
        }
        _ => return item.clone(),
    };
    for (method, index) in annotations {
        match method {
            AnnotationMethod::Set => {
                if !indexes.contains(index) {
                    indexes.push(index.clone());
                }
            }
            AnnotationMethod::Clear => indexes.retain(|existing| existing != index),
        }
    }
    if indexes.is_empty() {
        character
    } else {
        serde_json::json!([character, indexes])
    }
}
