//! Blueprint schema registry.
//!
//! One registry is built per environment from the full blueprint export,
//! before any page is validated. Relation chains can cross any number of
//! blueprints, so resolution never runs against a partial registry.

use crate::error::{PagesError, json_kind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Properties every entity exposes regardless of its blueprint schema.
pub const META_PROPERTIES: &[&str] = &[
    "$identifier",
    "$title",
    "$blueprint",
    "$icon",
    "$team",
    "$createdAt",
    "$updatedAt",
    "$createdBy",
    "$updatedBy",
    "$relations",
];

/// Blueprint fields whose keys name resolvable properties.
const PROPERTY_SOURCES: &[&[&str]] = &[
    &["schema", "properties"],
    &["calculationProperties"],
    &["mirrorProperties"],
    &["aggregationProperties"],
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintDescriptor {
    pub identifier: String,
    pub title: String,
    pub properties: BTreeSet<String>,
    /// Relation name to target blueprint identifier.
    pub relations: BTreeMap<String, String>,
}

impl BlueprintDescriptor {
    /// Build a descriptor from one raw blueprint record.
    ///
    /// Returns `None` when the record has no non-empty string identifier.
    pub fn from_value(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let identifier = obj
            .get("identifier")
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())?
            .to_string();
        let title = obj
            .get("title")
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| identifier.clone());

        let mut properties: BTreeSet<String> =
            META_PROPERTIES.iter().map(|name| name.to_string()).collect();
        for path in PROPERTY_SOURCES {
            if let Some(source) = lookup(raw, path).and_then(Value::as_object) {
                properties.extend(source.keys().cloned());
            }
        }

        let mut relations = BTreeMap::new();
        if let Some(raw_relations) = obj.get("relations").and_then(Value::as_object) {
            for (name, relation) in raw_relations {
                let Some(target) = relation
                    .get("target")
                    .and_then(Value::as_str)
                    .filter(|value| !value.is_empty())
                else {
                    continue;
                };
                relations.insert(name.clone(), target.to_string());
            }
        }

        Some(Self {
            identifier,
            title,
            properties,
            relations,
        })
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains(name)
    }

    pub fn relation_target(&self, name: &str) -> Option<&str> {
        self.relations.get(name).map(String::as_str)
    }

    /// Whether any relation of this blueprint points at `target`.
    pub fn relates_to(&self, target: &str) -> bool {
        self.relations.values().any(|value| value == target)
    }

    /// Number of properties beyond the meta-properties.
    pub fn schema_property_count(&self) -> usize {
        self.properties
            .iter()
            .filter(|name| !META_PROPERTIES.contains(&name.as_str()))
            .count()
    }
}

/// A blueprint record the builder could not register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedBlueprint {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintRegistry {
    blueprints: BTreeMap<String, BlueprintDescriptor>,
    skipped: Vec<SkippedBlueprint>,
}

impl BlueprintRegistry {
    /// Build from raw blueprint records. Never fails: malformed records are
    /// skipped and recorded. A repeated identifier replaces the earlier one.
    pub fn build(blueprints: &[Value]) -> Self {
        let mut registry = Self::default();
        for (index, raw) in blueprints.iter().enumerate() {
            let Some(descriptor) = BlueprintDescriptor::from_value(raw) else {
                tracing::warn!(index, "skipping blueprint without identifier");
                registry.skipped.push(SkippedBlueprint {
                    index,
                    reason: "blueprint has no identifier".to_string(),
                });
                continue;
            };
            tracing::debug!(
                blueprint = %descriptor.identifier,
                properties = descriptor.schema_property_count(),
                relations = descriptor.relations.len(),
                "blueprint registered"
            );
            registry.insert(descriptor);
        }
        registry
    }

    /// Build from a whole blueprint export, which must be an array.
    pub fn from_value(raw: &Value) -> Result<Self, PagesError> {
        let Some(rows) = raw.as_array() else {
            return Err(PagesError::BlueprintsNotArray(json_kind(raw)));
        };
        Ok(Self::build(rows))
    }

    pub fn insert(&mut self, descriptor: BlueprintDescriptor) {
        self.blueprints
            .insert(descriptor.identifier.clone(), descriptor);
    }

    pub fn get(&self, identifier: &str) -> Option<&BlueprintDescriptor> {
        self.blueprints.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.blueprints.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }

    pub fn skipped(&self) -> &[SkippedBlueprint] {
        &self.skipped
    }
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}
