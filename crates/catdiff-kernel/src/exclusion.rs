//! Key exclusion policy.
//!
//! Some keys are expected to differ between two environments of the same
//! catalog (database ids, audit timestamps, organization ids). They are
//! dropped before entities are normalized or compared. A key can be volatile
//! for every item type, or only for an explicit set of item types.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Keys excluded for every item type.
pub const UNRESTRICTED_KEYS: &[&str] = &[
    "_id",
    "createdAt",
    "createdBy",
    "id",
    "orgId",
    "publish",
    "updatedAt",
    "updatedBy",
];

/// Keys excluded only for the listed item types.
pub const SCOPED_KEYS: &[(&str, &[&str])] = &[("ownedByTeam", &["Actions"])];

/// Restriction attached to an excluded key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "itemTypes")]
pub enum KeyRestriction {
    /// Excluded regardless of item type.
    Unrestricted,
    /// Excluded only when the item type is a member of the set.
    ItemTypes(BTreeSet<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExclusionPolicy {
    keys: BTreeMap<String, KeyRestriction>,
}

impl ExclusionPolicy {
    /// A policy that excludes nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in table of volatile keys.
    pub fn builtin() -> Self {
        let mut policy = Self::empty();
        for key in UNRESTRICTED_KEYS {
            policy.exclude(*key);
        }
        for (key, item_types) in SCOPED_KEYS {
            policy.exclude_for(*key, item_types.iter().copied());
        }
        policy
    }

    /// Exclude `key` for every item type. Replaces any earlier restriction.
    pub fn exclude(&mut self, key: impl Into<String>) -> &mut Self {
        self.keys.insert(key.into(), KeyRestriction::Unrestricted);
        self
    }

    /// Exclude `key` only for the given item types.
    ///
    /// Scoping a key that is already unrestricted leaves it unrestricted;
    /// scoping a key twice unions the item type sets.
    pub fn exclude_for<I, S>(&mut self, key: impl Into<String>, item_types: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self
            .keys
            .entry(key.into())
            .or_insert_with(|| KeyRestriction::ItemTypes(BTreeSet::new()));
        if let KeyRestriction::ItemTypes(set) = entry {
            set.extend(item_types.into_iter().map(Into::into));
        }
        self
    }

    pub fn restriction(&self, key: &str) -> Option<&KeyRestriction> {
        self.keys.get(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Whether `key` is dropped for `item_type`.
    pub fn should_exclude(&self, key: &str, item_type: Option<&str>) -> bool {
        match self.keys.get(key) {
            None => false,
            Some(KeyRestriction::Unrestricted) => true,
            Some(KeyRestriction::ItemTypes(item_types)) => {
                item_type.is_some_and(|item_type| item_types.contains(item_type))
            }
        }
    }
}
