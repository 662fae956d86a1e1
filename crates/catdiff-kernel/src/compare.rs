//! Item-level comparison between a source and a destination environment.
//!
//! Both sides are matched by `identifier`. Each identifier in the union is
//! classified, and differing items carry the top-level keys that differ so a
//! diff collaborator can focus on them.

use crate::error::CatalogError;
use crate::exclusion::ExclusionPolicy;
use crate::normalize::{IDENTIFIER_KEY, normalize};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

const PERMISSIONS_KEY: &str = "permissions";
const TYPE_KEY: &str = "type";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStatus {
    Identical,
    Different,
    OnlyInSource,
    OnlyInDestination,
}

impl ComparisonStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonStatus::Identical => "identical",
            ComparisonStatus::Different => "different",
            ComparisonStatus::OnlyInSource => "only_in_source",
            ComparisonStatus::OnlyInDestination => "only_in_destination",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareOptions {
    /// Keep only items whose `type` equals this value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_filter: Option<String>,
    /// Drop top-level `permissions` before comparing.
    #[serde(default)]
    pub exclude_permissions: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonEntry {
    pub identifier: String,
    pub status: ComparisonStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_digest: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub total: usize,
    pub identical: usize,
    pub different: usize,
    pub only_in_source: usize,
    pub only_in_destination: usize,
}

impl ComparisonSummary {
    fn record(&mut self, status: ComparisonStatus) {
        self.total += 1;
        match status {
            ComparisonStatus::Identical => self.identical += 1,
            ComparisonStatus::Different => self.different += 1,
            ComparisonStatus::OnlyInSource => self.only_in_source += 1,
            ComparisonStatus::OnlyInDestination => self.only_in_destination += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemComparison {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    pub entries: Vec<ComparisonEntry>,
    pub summary: ComparisonSummary,
}

impl ItemComparison {
    pub fn entry(&self, identifier: &str) -> Option<&ComparisonEntry> {
        self.entries
            .iter()
            .find(|entry| entry.identifier == identifier)
    }

    pub fn is_identical(&self) -> bool {
        self.summary.total == self.summary.identical
    }
}

/// Compact JSON rendering of an already-normalized value.
pub fn canonical_json(value: &Value) -> String {
    // Value's Display impl cannot fail, unlike serde_json::to_string.
    value.to_string()
}

/// Hex sha256 of the canonical JSON rendering.
pub fn stable_digest(value: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(value).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Classify every identifier present on either side.
///
/// Items are normalized with `policy` before comparison, so callers may pass
/// raw exports. Items without a string `identifier` are ignored.
pub fn compare_items(
    source: &[Value],
    destination: &[Value],
    policy: &ExclusionPolicy,
    item_type: Option<&str>,
    options: &CompareOptions,
) -> Result<ItemComparison, CatalogError> {
    let left = index_items(source, policy, item_type, options)?;
    let right = index_items(destination, policy, item_type, options)?;

    let identifiers: BTreeSet<&String> = left.keys().chain(right.keys()).collect();
    let mut entries = Vec::with_capacity(identifiers.len());
    let mut summary = ComparisonSummary::default();
    for identifier in identifiers {
        let entry = match (left.get(identifier), right.get(identifier)) {
            (Some(a), Some(b)) => {
                let source_digest = stable_digest(a);
                let destination_digest = stable_digest(b);
                let (status, changed_keys) = if source_digest == destination_digest {
                    (ComparisonStatus::Identical, Vec::new())
                } else {
                    (ComparisonStatus::Different, changed_top_level_keys(a, b))
                };
                ComparisonEntry {
                    identifier: identifier.clone(),
                    status,
                    changed_keys,
                    source_digest: Some(source_digest),
                    destination_digest: Some(destination_digest),
                }
            }
            (Some(a), None) => ComparisonEntry {
                identifier: identifier.clone(),
                status: ComparisonStatus::OnlyInSource,
                changed_keys: Vec::new(),
                source_digest: Some(stable_digest(a)),
                destination_digest: None,
            },
            (None, Some(b)) => ComparisonEntry {
                identifier: identifier.clone(),
                status: ComparisonStatus::OnlyInDestination,
                changed_keys: Vec::new(),
                source_digest: None,
                destination_digest: Some(stable_digest(b)),
            },
            (None, None) => continue,
        };
        summary.record(entry.status);
        entries.push(entry);
    }

    Ok(ItemComparison {
        item_type: item_type.map(ToOwned::to_owned),
        entries,
        summary,
    })
}

fn index_items(
    items: &[Value],
    policy: &ExclusionPolicy,
    item_type: Option<&str>,
    options: &CompareOptions,
) -> Result<BTreeMap<String, Value>, CatalogError> {
    let mut out = BTreeMap::new();
    for item in items {
        let Some(obj) = item.as_object() else {
            continue;
        };
        let Some(identifier) = obj.get(IDENTIFIER_KEY).and_then(Value::as_str) else {
            continue;
        };
        if let Some(wanted) = options.type_filter.as_deref()
            && obj.get(TYPE_KEY).and_then(Value::as_str) != Some(wanted)
        {
            continue;
        }
        let mut obj = obj.clone();
        if options.exclude_permissions {
            obj.remove(PERMISSIONS_KEY);
        }
        let normalized = normalize(&Value::Object(obj), policy, item_type)?;
        out.insert(identifier.to_string(), normalized);
    }
    Ok(out)
}

fn changed_top_level_keys(a: &Value, b: &Value) -> Vec<String> {
    let (Some(a), Some(b)) = (a.as_object(), b.as_object()) else {
        return Vec::new();
    };
    let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
    keys.into_iter()
        .filter(|key| a.get(key.as_str()) != b.get(key.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compare(source: &[Value], destination: &[Value], options: &CompareOptions) -> ItemComparison {
        compare_items(
            source,
            destination,
            &ExclusionPolicy::builtin(),
            Some("Pages"),
            options,
        )
        .expect("compare")
    }

    #[test]
    fn classifies_every_identifier_in_the_union() {
        let source = vec![
            json!({"identifier": "home", "title": "Home", "_id": "s1"}),
            json!({"identifier": "ops", "title": "Ops"}),
            json!({"identifier": "legacy", "title": "Legacy"}),
        ];
        let destination = vec![
            json!({"identifier": "home", "title": "Home", "_id": "d1"}),
            json!({"identifier": "ops", "title": "Operations", "icon": "Gear"}),
            json!({"identifier": "new", "title": "New"}),
        ];
        let report = compare(&source, &destination, &CompareOptions::default());

        let ids: Vec<&str> = report.entries.iter().map(|e| e.identifier.as_str()).collect();
        assert_eq!(ids, vec!["home", "legacy", "new", "ops"]);
        assert_eq!(report.entry("home").map(|e| e.status), Some(ComparisonStatus::Identical));
        assert_eq!(
            report.entry("legacy").map(|e| e.status),
            Some(ComparisonStatus::OnlyInSource)
        );
        assert_eq!(
            report.entry("new").map(|e| e.status),
            Some(ComparisonStatus::OnlyInDestination)
        );
        let ops = report.entry("ops").expect("ops entry");
        assert_eq!(ops.status, ComparisonStatus::Different);
        assert_eq!(ops.changed_keys, vec!["icon".to_string(), "title".to_string()]);
        assert_eq!(
            report.summary,
            ComparisonSummary {
                total: 4,
                identical: 1,
                different: 1,
                only_in_source: 1,
                only_in_destination: 1,
            }
        );
        assert!(!report.is_identical());
    }

    #[test]
    fn permissions_can_be_left_out_of_the_comparison() {
        let source = vec![json!({"identifier": "home", "permissions": {"read": ["a"]}})];
        let destination = vec![json!({"identifier": "home", "permissions": {"read": ["b"]}})];

        let strict = compare(&source, &destination, &CompareOptions::default());
        assert_eq!(strict.entries[0].status, ComparisonStatus::Different);
        assert_eq!(strict.entries[0].changed_keys, vec!["permissions".to_string()]);

        let relaxed = compare(
            &source,
            &destination,
            &CompareOptions {
                exclude_permissions: true,
                ..CompareOptions::default()
            },
        );
        assert!(relaxed.is_identical());
    }

    #[test]
    fn type_filter_keeps_matching_items_only() {
        let source = vec![
            json!({"identifier": "home", "type": "home"}),
            json!({"identifier": "svc", "type": "entity"}),
        ];
        let destination = vec![json!({"identifier": "svc", "type": "entity"})];
        let report = compare(
            &source,
            &destination,
            &CompareOptions {
                type_filter: Some("entity".to_string()),
                ..CompareOptions::default()
            },
        );
        assert_eq!(report.summary.total, 1);
        assert!(report.is_identical());
    }

    #[test]
    fn item_order_and_volatile_keys_do_not_matter() {
        let source = vec![json!({"identifier": "a", "tags": ["y", "x"], "updatedAt": "1"})];
        let destination = vec![json!({"updatedAt": "2", "tags": ["x", "y"], "identifier": "a"})];
        let report = compare(&source, &destination, &CompareOptions::default());
        assert!(report.is_identical());
        let entry = &report.entries[0];
        assert_eq!(entry.source_digest, entry.destination_digest);
    }

    #[test]
    fn items_without_identifier_are_ignored() {
        let source = vec![json!({"title": "orphan"}), json!("not an object")];
        let report = compare(&source, &[], &CompareOptions::default());
        assert_eq!(report.summary.total, 0);
    }

    #[test]
    fn digest_is_sha256_of_canonical_json() {
        assert_eq!(canonical_json(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(
            stable_digest(&json!({})),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }
}
