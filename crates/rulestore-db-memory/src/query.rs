//! Evaluation of MongoDB-style filter documents against in-memory documents.
//!
//! Supported: implicit equality, `$eq`, `$ne`, `$in`, `$nin`, `$exists`, and
//! the logical `$and`, `$or`, `$nor`. Equality against an array field matches
//! when any element is equal, and `null` matches a missing field. Any other
//! operator is rejected with [`StorageError::InvalidQuery`].

use bson::{Bson, Document};
use rulestore_storage::{StorageError, StorageResult};

/// Returns `true` if `doc` satisfies every clause of `filter`.
///
/// # Errors
///
/// Returns [`StorageError::InvalidQuery`] for unsupported or malformed clauses.
pub fn matches(doc: &Document, filter: &Document) -> StorageResult<bool> {
    for (key, condition) in filter {
        if !matches_clause(doc, key, condition)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches_clause(doc: &Document, key: &str, condition: &Bson) -> StorageResult<bool> {
    match key {
        "$and" => {
            for clause in sub_filters(key, condition)? {
                if !matches(doc, clause)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        "$or" => {
            for clause in sub_filters(key, condition)? {
                if matches(doc, clause)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        "$nor" => {
            for clause in sub_filters(key, condition)? {
                if matches(doc, clause)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ if key.starts_with('$') => Err(StorageError::invalid_query(format!(
            "unsupported top-level operator {key}"
        ))),
        _ => matches_field(doc.get(key), condition),
    }
}

fn sub_filters<'a>(op: &str, condition: &'a Bson) -> StorageResult<Vec<&'a Document>> {
    let invalid =
        || StorageError::invalid_query(format!("{op} expects a non-empty array of documents"));
    match condition {
        Bson::Array(items) if !items.is_empty() => items
            .iter()
            .map(|item| match item {
                Bson::Document(clause) => Ok(clause),
                _ => Err(invalid()),
            })
            .collect(),
        _ => Err(invalid()),
    }
}

fn is_operator_document(doc: &Document) -> bool {
    doc.keys().next().is_some_and(|key| key.starts_with('$'))
}

fn matches_field(value: Option<&Bson>, condition: &Bson) -> StorageResult<bool> {
    match condition {
        Bson::Document(operators) if is_operator_document(operators) => {
            for (op, operand) in operators {
                if !apply_operator(value, op, operand)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Ok(equals(value, condition)),
    }
}

fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    match (value, expected) {
        (None, Bson::Null) => true,
        (None, _) => false,
        (Some(Bson::Array(items)), expected) if !matches!(expected, Bson::Array(_)) => {
            items.contains(expected)
        }
        (Some(actual), expected) => actual == expected,
    }
}

fn array_operand<'a>(op: &str, operand: &'a Bson) -> StorageResult<&'a [Bson]> {
    match operand {
        Bson::Array(items) => Ok(items.as_slice()),
        _ => Err(StorageError::invalid_query(format!("{op} expects an array"))),
    }
}

fn truthy(operand: &Bson) -> bool {
    match operand {
        Bson::Boolean(flag) => *flag,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        Bson::Null | Bson::Undefined => false,
        _ => true,
    }
}

fn apply_operator(value: Option<&Bson>, op: &str, operand: &Bson) -> StorageResult<bool> {
    match op {
        "$eq" => Ok(equals(value, operand)),
        "$ne" => Ok(!equals(value, operand)),
        "$in" => Ok(array_operand(op, operand)?
            .iter()
            .any(|candidate| equals(value, candidate))),
        "$nin" => Ok(!array_operand(op, operand)?
            .iter()
            .any(|candidate| equals(value, candidate))),
        "$exists" => Ok(value.is_some() == truthy(operand)),
        other => Err(StorageError::invalid_query(format!(
            "unsupported operator {other}"
        ))),
    }
}
