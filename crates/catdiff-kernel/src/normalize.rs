//! Deep structural normalization of entity JSON.
//!
//! Two exports of the same entity from different environments should
//! serialize to identical bytes once volatile keys are gone. Normalization
//! removes excluded keys at every depth, sorts object keys, sorts arrays whose
//! order carries no meaning, and prunes containers left empty by removal.

use crate::error::CatalogError;
use crate::exclusion::ExclusionPolicy;
use serde_json::{Map, Value};
use std::cmp::Ordering;

pub const IDENTIFIER_KEY: &str = "identifier";

/// How an array is treated, decided once before recursing into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayShape {
    /// Every element is an object with a string `identifier`.
    ItemCollection,
    /// Every element is null, a boolean, a number, or a string.
    Primitives,
    /// Anything else; element order is preserved.
    Mixed,
}

pub fn classify_array(items: &[Value]) -> ArrayShape {
    if items.iter().all(is_primitive) {
        return ArrayShape::Primitives;
    }
    if items.iter().all(|item| item_identifier(item).is_some()) {
        return ArrayShape::ItemCollection;
    }
    ArrayShape::Mixed
}

/// Normalize any JSON value against `policy` for `item_type`.
///
/// The root itself is never pruned: an object whose keys are all excluded
/// normalizes to `{}`.
pub fn normalize(
    value: &Value,
    policy: &ExclusionPolicy,
    item_type: Option<&str>,
) -> Result<Value, CatalogError> {
    Ok(normalize_node(value, policy, item_type)?.unwrap_or_else(|| empty_like(value)))
}

/// Normalize an array of items: each item is normalized, and the array is
/// sorted by `identifier`.
///
/// Fails when an element is not an object with a string `identifier`.
pub fn normalize_items(
    items: &[Value],
    policy: &ExclusionPolicy,
    item_type: Option<&str>,
) -> Result<Vec<Value>, CatalogError> {
    for (idx, item) in items.iter().enumerate() {
        if item_identifier(item).is_none() {
            return Err(CatalogError::InvalidInput(format!(
                "items[{idx}] must be an object with a string `{IDENTIFIER_KEY}`"
            )));
        }
    }
    sort_item_collection(items, policy, item_type)
}

/// Returns `None` when the value is a container that normalization emptied.
fn normalize_node(
    value: &Value,
    policy: &ExclusionPolicy,
    item_type: Option<&str>,
) -> Result<Option<Value>, CatalogError> {
    match value {
        Value::Object(map) => {
            if map.is_empty() {
                return Ok(Some(Value::Object(Map::new())));
            }
            let mut keys: Vec<&String> = map
                .keys()
                .filter(|key| !policy.should_exclude(key, item_type))
                .collect();
            keys.sort_unstable();
            let mut sorted = Map::new();
            for key in keys {
                if let Some(item) = map.get(key)
                    && let Some(normalized) = normalize_node(item, policy, item_type)?
                {
                    sorted.insert(key.clone(), normalized);
                }
            }
            if sorted.is_empty() {
                return Ok(None);
            }
            Ok(Some(Value::Object(sorted)))
        }
        Value::Array(items) => {
            if items.is_empty() {
                return Ok(Some(Value::Array(Vec::new())));
            }
            let normalized = match classify_array(items) {
                ArrayShape::ItemCollection => sort_item_collection(items, policy, item_type)?,
                ArrayShape::Primitives => {
                    let mut sorted = items.clone();
                    sorted.sort_by(compare_primitives);
                    sorted
                }
                ArrayShape::Mixed => {
                    let mut out = Vec::with_capacity(items.len());
                    for item in items {
                        if let Some(normalized) = normalize_node(item, policy, item_type)? {
                            out.push(normalized);
                        }
                    }
                    // Pruning can leave an array that now classifies differently.
                    match classify_array(&out) {
                        ArrayShape::Primitives => out.sort_by(compare_primitives),
                        ArrayShape::ItemCollection => {
                            out.sort_by(|a, b| item_identifier(a).cmp(&item_identifier(b)))
                        }
                        ArrayShape::Mixed => {}
                    }
                    out
                }
            };
            if normalized.is_empty() {
                return Ok(None);
            }
            Ok(Some(Value::Array(normalized)))
        }
        _ => Ok(Some(value.clone())),
    }
}

fn sort_item_collection(
    items: &[Value],
    policy: &ExclusionPolicy,
    item_type: Option<&str>,
) -> Result<Vec<Value>, CatalogError> {
    let mut keyed: Vec<(String, Value)> = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let Some(identifier) = item_identifier(item) else {
            return Err(CatalogError::InvalidInput(format!(
                "item collection element [{idx}] lost its `{IDENTIFIER_KEY}`"
            )));
        };
        let identifier = identifier.to_string();
        if let Some(normalized) = normalize_node(item, policy, item_type)? {
            keyed.push((identifier, normalized));
        }
    }
    // Stable: items sharing an identifier keep their input order.
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(keyed.into_iter().map(|(_, item)| item).collect())
}

fn item_identifier(value: &Value) -> Option<&str> {
    value
        .as_object()
        .and_then(|obj| obj.get(IDENTIFIER_KEY))
        .and_then(Value::as_str)
}

fn is_primitive(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn primitive_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) | Value::Object(_) => 4,
    }
}

fn compare_primitives(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        _ => primitive_rank(a).cmp(&primitive_rank(b)),
    }
}

fn compare_numbers(a: &serde_json::Number, b: &serde_json::Number) -> Ordering {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a.cmp(&b);
    }
    let a = a.as_f64().unwrap_or(f64::NAN);
    let b = b.as_f64().unwrap_or(f64::NAN);
    a.total_cmp(&b)
}

fn empty_like(value: &Value) -> Value {
    match value {
        Value::Array(_) => Value::Array(Vec::new()),
        _ => Value::Object(Map::new()),
    }
}
