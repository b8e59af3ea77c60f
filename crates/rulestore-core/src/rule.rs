//! The stored rule record.
//!
//! A [`CasbinRule`] is one line of a policy file: a policy type tag plus up to
//! six positional values. Unset values are `None`, which is distinct from an
//! empty string: only present values are written to the store and only present
//! values take part in queries.

use std::fmt;

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::line::format_policy_line;

/// Document key holding the policy type.
pub const PTYPE_FIELD: &str = "ptype";

/// Document key holding the store-assigned identity.
pub const ID_FIELD: &str = "_id";

/// Number of positional value fields a rule can carry.
pub const MAX_FIELDS: usize = 6;

/// Document keys of the positional values, in index order.
pub const VALUE_FIELDS: [&str; MAX_FIELDS] = ["v0", "v1", "v2", "v3", "v4", "v5"];

/// Returns the document key for a positional index.
///
/// # Errors
///
/// Returns [`CoreError::InvalidFieldIndex`] for indices outside `0..=5`.
pub fn value_field(index: usize) -> Result<&'static str> {
    VALUE_FIELDS
        .get(index)
        .copied()
        .ok_or(CoreError::InvalidFieldIndex(index))
}

/// Section a policy type belongs to: its first character, so `p2` lives in
/// `p` and `g2` in `g`. Empty policy types have no section.
pub fn section_of(ptype: &str) -> Option<&str> {
    let first = ptype.chars().next()?;
    ptype.get(..first.len_utf8())
}

/// A single policy rule as persisted in the rule collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CasbinRule {
    pub ptype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v0: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v5: Option<String>,
}

impl CasbinRule {
    /// Creates a rule with the given policy type and no values.
    pub fn new(ptype: impl Into<String>) -> Self {
        Self {
            ptype: ptype.into(),
            ..Default::default()
        }
    }

    /// Creates a rule assigning `values` positionally to `v0`, `v1`, ...
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TooManyValues`] if more than six values are given.
    pub fn from_values<I, S>(ptype: impl Into<String>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.len() > MAX_FIELDS {
            return Err(CoreError::too_many_values(values.len()));
        }
        let mut rule = Self::new(ptype);
        for (index, value) in values.into_iter().enumerate() {
            rule.set_field(index, value)?;
        }
        Ok(rule)
    }

    fn slot(&self, index: usize) -> Option<&Option<String>> {
        match index {
            0 => Some(&self.v0),
            1 => Some(&self.v1),
            2 => Some(&self.v2),
            3 => Some(&self.v3),
            4 => Some(&self.v4),
            5 => Some(&self.v5),
            _ => None,
        }
    }

    fn slot_mut(&mut self, index: usize) -> Option<&mut Option<String>> {
        match index {
            0 => Some(&mut self.v0),
            1 => Some(&mut self.v1),
            2 => Some(&mut self.v2),
            3 => Some(&mut self.v3),
            4 => Some(&mut self.v4),
            5 => Some(&mut self.v5),
            _ => None,
        }
    }

    /// Returns the value at a positional index, if the index is valid and set.
    pub fn field(&self, index: usize) -> Option<&str> {
        self.slot(index).and_then(|v| v.as_deref())
    }

    /// Sets the value at a positional index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFieldIndex`] for indices outside `0..=5`.
    pub fn set_field(&mut self, index: usize, value: impl Into<String>) -> Result<()> {
        let slot = self
            .slot_mut(index)
            .ok_or(CoreError::InvalidFieldIndex(index))?;
        *slot = Some(value.into());
        Ok(())
    }

    /// Clears the value at a positional index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFieldIndex`] for indices outside `0..=5`.
    pub fn clear_field(&mut self, index: usize) -> Result<()> {
        let slot = self
            .slot_mut(index)
            .ok_or(CoreError::InvalidFieldIndex(index))?;
        *slot = None;
        Ok(())
    }

    /// Iterates the present values with their document keys, in index order.
    pub fn present_fields(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        VALUE_FIELDS
            .iter()
            .enumerate()
            .filter_map(|(index, key)| self.field(index).map(|value| (*key, value)))
    }

    /// Present values in index order. Gaps collapse.
    pub fn values(&self) -> Vec<&str> {
        self.present_fields().map(|(_, value)| value).collect()
    }

    /// A rule with no values cannot be loaded into a policy model.
    pub fn is_degenerate(&self) -> bool {
        self.present_fields().next().is_none()
    }

    /// Section this rule belongs to. See [`section_of`].
    pub fn section(&self) -> Option<&str> {
        section_of(&self.ptype)
    }

    /// Serializes the rule as a store document: `ptype` followed by the
    /// present `vN` keys only.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(PTYPE_FIELD, self.ptype.clone());
        for (key, value) in self.present_fields() {
            doc.insert(key, value.to_string());
        }
        doc
    }

    /// Decodes a store document.
    ///
    /// Returns `Ok(None)` for documents without a `ptype`. Keys other than
    /// `ptype` and `v0`..`v5` (including `_id`) are ignored; `null` values are
    /// treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDocument`] if `ptype` or a `vN` value is
    /// present but not a string.
    pub fn from_document(doc: &Document) -> Result<Option<Self>> {
        let ptype = match doc.get(PTYPE_FIELD) {
            None | Some(Bson::Null) => return Ok(None),
            Some(Bson::String(ptype)) => ptype.clone(),
            Some(other) => {
                return Err(CoreError::invalid_document(format!(
                    "{PTYPE_FIELD} must be a string, found {:?}",
                    other.element_type()
                )));
            }
        };

        let mut rule = Self::new(ptype);
        for (index, key) in VALUE_FIELDS.iter().enumerate() {
            match doc.get(*key) {
                None | Some(Bson::Null) => {}
                Some(Bson::String(value)) => rule.set_field(index, value.clone())?,
                Some(other) => {
                    return Err(CoreError::invalid_document(format!(
                        "{key} must be a string, found {:?}",
                        other.element_type()
                    )));
                }
            }
        }
        Ok(Some(rule))
    }
}

/// Formats the rule as a policy line, e.g. `p, alice, data1, read`.
impl fmt::Display for CasbinRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_policy_line(&self.ptype, &self.values()))
    }
}
