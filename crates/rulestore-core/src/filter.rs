//! Filter descriptor for partial policy loads.

use bson::Document;

use crate::error::{CoreError, Result};
use crate::rule::{MAX_FIELDS, PTYPE_FIELD, VALUE_FIELDS};

/// Selects the subset of stored rules a filtered load reads.
///
/// Each field holds the set of acceptable values for that document key. An
/// empty set leaves the key unconstrained. When `raw_query` is set it is sent
/// to the store verbatim and every other field is ignored.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RuleFilter {
    pub ptype: Vec<String>,
    pub v0: Vec<String>,
    pub v1: Vec<String>,
    pub v2: Vec<String>,
    pub v3: Vec<String>,
    pub v4: Vec<String>,
    pub v5: Vec<String>,
    pub raw_query: Option<Document>,
}

impl RuleFilter {
    /// Create a new unconstrained filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter that passes `query` through to the store unchanged.
    #[must_use]
    pub fn raw(query: Document) -> Self {
        Self {
            raw_query: Some(query),
            ..Default::default()
        }
    }

    /// Set the acceptable policy types.
    #[must_use]
    pub fn with_ptype<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ptype = values.into_iter().map(Into::into).collect();
        self
    }

    /// Set the acceptable values of positional field `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFieldIndex`] for indices outside `0..=5`.
    pub fn with_field<I, S>(mut self, index: usize, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slot = self
            .field_mut(index)
            .ok_or(CoreError::InvalidFieldIndex(index))?;
        *slot = values.into_iter().map(Into::into).collect();
        Ok(self)
    }

    /// Acceptable values of positional field `index`.
    pub fn field(&self, index: usize) -> Option<&[String]> {
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

    fn field_mut(&mut self, index: usize) -> Option<&mut Vec<String>> {
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

    /// Non-empty value sets with their document keys: `ptype` first, then
    /// `v0`..`v5`.
    pub fn constraints(&self) -> impl Iterator<Item = (&'static str, &[String])> + '_ {
        std::iter::once((PTYPE_FIELD, self.ptype.as_slice()))
            .chain((0..MAX_FIELDS).filter_map(|index| {
                self.field(index).map(|values| (VALUE_FIELDS[index], values))
            }))
            .filter(|(_, values)| !values.is_empty())
    }

    /// Returns `true` if the filter neither carries a raw query nor
    /// constrains any field.
    pub fn is_unconstrained(&self) -> bool {
        self.raw_query.is_none() && self.constraints().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_default_is_unconstrained() {
        let filter = RuleFilter::new();
        assert!(filter.is_unconstrained());
        assert_eq!(filter.constraints().count(), 0);
    }

    #[test]
    fn test_constraints_skip_empty_sets() {
        let filter = RuleFilter::new()
            .with_ptype(["p"])
            .with_field(1, ["data1", "data2"])
            .unwrap();
        let constraints: Vec<_> = filter.constraints().collect();
        assert_eq!(constraints.len(), 2);
        assert_eq!(constraints[0].0, "ptype");
        assert_eq!(constraints[0].1, ["p"]);
        assert_eq!(constraints[1].0, "v1");
        assert_eq!(constraints[1].1, ["data1", "data2"]);
    }

    #[test]
    fn test_with_field_rejects_out_of_range() {
        assert_eq!(
            RuleFilter::new().with_field(6, ["x"]).unwrap_err(),
            CoreError::InvalidFieldIndex(6)
        );
    }

    #[test]
    fn test_raw_filter() {
        let filter = RuleFilter::raw(doc! { "v0": "alice" });
        assert!(!filter.is_unconstrained());
        assert_eq!(filter.raw_query, Some(doc! { "v0": "alice" }));
    }
}
