//! Query documents the adapter sends to the rule collection.

use bson::{Bson, Document, doc};
use rulestore_core::{
    CasbinRule, ID_FIELD, MAX_FIELDS, PTYPE_FIELD, Result, RuleFilter, VALUE_FIELDS,
};

/// Query matching documents that carry `ptype` and `rule`'s values at their
/// positions. Other keys are unconstrained.
///
/// # Errors
///
/// Fails if `rule` has more than six values.
pub fn rule_query(ptype: &str, rule: &[String]) -> Result<Document> {
    Ok(CasbinRule::from_values(ptype, rule)?.to_document())
}

/// Query for a filtered load: the raw query when set, otherwise an `$in`
/// clause per non-empty value set.
pub fn filter_query(filter: &RuleFilter) -> Document {
    if let Some(raw) = &filter.raw_query {
        return raw.clone();
    }
    let mut query = Document::new();
    for (key, values) in filter.constraints() {
        query.insert(key, doc! { "$in": values.to_vec() });
    }
    query
}

/// Query for one section of a positional engine filter.
///
/// `ptypes` are the policy types the model defines for the section. Each
/// non-empty entry of `values` pins the value at its position; empty entries
/// and entries past `v5` leave the position open.
pub fn positional_query(ptypes: &[String], values: &[&str]) -> Document {
    let mut query = Document::new();
    query.insert(PTYPE_FIELD, doc! { "$in": ptypes.to_vec() });
    for (key, value) in VALUE_FIELDS.iter().zip(values) {
        if !value.is_empty() {
            query.insert(*key, *value);
        }
    }
    query
}

/// Disjunction of `branches`, or `None` when there is nothing to match.
pub fn any_of(mut branches: Vec<Document>) -> Option<Document> {
    match branches.len() {
        0 => None,
        1 => branches.pop(),
        _ => Some(doc! { "$or": branches }),
    }
}

/// Query for a positional removal, or `None` if the range is out of bounds.
///
/// `field_index` must lie in `0..=5` and the values must end within `v5`
/// while covering at least one field.
pub fn filtered_removal_query(
    ptype: &str,
    field_index: usize,
    field_values: &[String],
) -> Option<Document> {
    if field_index >= MAX_FIELDS {
        return None;
    }
    let end = field_index + field_values.len();
    if !(1..=MAX_FIELDS).contains(&end) {
        return None;
    }

    let mut query = Document::new();
    for (offset, value) in field_values.iter().enumerate() {
        query.insert(VALUE_FIELDS[field_index + offset], value.clone());
    }
    query.insert(PTYPE_FIELD, ptype);
    Some(query)
}

/// Query matching documents whose `_id` is one of `ids`.
pub fn ids_query(ids: Vec<Bson>) -> Document {
    let mut query = Document::new();
    query.insert(ID_FIELD, doc! { "$in": ids });
    query
}

/// Number of keys in `doc` other than `_id`.
pub fn field_count(doc: &Document) -> usize {
    doc.keys().filter(|key| key.as_str() != ID_FIELD).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_rule_query() {
        let query = rule_query("p", &strings(&["alice", "data1"])).unwrap();
        assert_eq!(query, doc! { "ptype": "p", "v0": "alice", "v1": "data1" });
        assert!(rule_query("p", &strings(&["1", "2", "3", "4", "5", "6", "7"])).is_err());
    }

    #[test]
    fn test_filter_query_uses_in_clauses() {
        let filter = RuleFilter::new()
            .with_ptype(["p"])
            .with_field(0, ["alice", "bob"])
            .unwrap();
        assert_eq!(
            filter_query(&filter),
            doc! { "ptype": { "$in": ["p"] }, "v0": { "$in": ["alice", "bob"] } }
        );
        assert_eq!(filter_query(&RuleFilter::new()), doc! {});
    }

    #[test]
    fn test_filter_query_raw_overrides_fields() {
        let filter = RuleFilter::raw(doc! { "v0": "alice" })
            .with_ptype(["g"])
            .with_field(1, ["data1"])
            .unwrap();
        assert_eq!(filter_query(&filter), doc! { "v0": "alice" });
    }

    #[test]
    fn test_positional_query_skips_empty_positions() {
        let query = positional_query(&strings(&["p", "p2"]), &["", "data1", "read"]);
        assert_eq!(
            query,
            doc! { "ptype": { "$in": ["p", "p2"] }, "v1": "data1", "v2": "read" }
        );
    }

    #[test]
    fn test_positional_query_ignores_positions_past_v5() {
        let query = positional_query(&strings(&["g"]), &["a", "", "", "", "", "f", "g"]);
        assert_eq!(query, doc! { "ptype": { "$in": ["g"] }, "v0": "a", "v5": "f" });
    }

    #[test]
    fn test_any_of() {
        assert_eq!(any_of(Vec::new()), None);
        assert_eq!(any_of(vec![doc! { "v0": "a" }]), Some(doc! { "v0": "a" }));
        assert_eq!(
            any_of(vec![doc! { "v0": "a" }, doc! { "v0": "b" }]),
            Some(doc! { "$or": [{ "v0": "a" }, { "v0": "b" }] })
        );
    }

    #[test]
    fn test_filtered_removal_query() {
        assert_eq!(
            filtered_removal_query("p", 1, &strings(&["data1"])),
            Some(doc! { "v1": "data1", "ptype": "p" })
        );
        assert_eq!(
            filtered_removal_query("g", 0, &strings(&["alice", "admin"])),
            Some(doc! { "v0": "alice", "v1": "admin", "ptype": "g" })
        );
        assert_eq!(
            filtered_removal_query("p", 4, &strings(&["a", "b"])),
            Some(doc! { "v4": "a", "v5": "b", "ptype": "p" })
        );
    }

    #[test]
    fn test_filtered_removal_query_bounds() {
        assert_eq!(filtered_removal_query("p", 5, &strings(&["a", "b"])), None);
        assert_eq!(filtered_removal_query("p", 6, &strings(&["a"])), None);
        assert_eq!(filtered_removal_query("p", 0, &[]), None);
        // An index with no values still covers a field.
        assert_eq!(
            filtered_removal_query("p", 2, &[]),
            Some(doc! { "ptype": "p" })
        );
    }

    #[test]
    fn test_ids_query_and_field_count() {
        let ids = vec![Bson::Int32(1), Bson::Int32(2)];
        assert_eq!(ids_query(ids), doc! { "_id": { "$in": [1, 2] } });
        assert_eq!(field_count(&doc! { "_id": 1, "ptype": "p", "v0": "a" }), 2);
    }
}
