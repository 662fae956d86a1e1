//! The closed set of entity kinds compared across environments.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Actions,
    Blueprints,
    Integrations,
    Pages,
    Scorecards,
    Webhooks,
}

impl ItemType {
    pub const ALL: [ItemType; 6] = [
        ItemType::Actions,
        ItemType::Blueprints,
        ItemType::Integrations,
        ItemType::Pages,
        ItemType::Scorecards,
        ItemType::Webhooks,
    ];

    /// Label used by exclusion rules and report keys.
    pub fn label(self) -> &'static str {
        match self {
            ItemType::Actions => "Actions",
            ItemType::Blueprints => "Blueprints",
            ItemType::Integrations => "Integrations",
            ItemType::Pages => "Pages",
            ItemType::Scorecards => "Scorecards",
            ItemType::Webhooks => "Webhooks",
        }
    }

    /// File holding this item type inside an environment directory.
    pub fn file_name(self) -> String {
        format!("{}.json", self.label())
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ItemType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        ItemType::ALL
            .into_iter()
            .find(|item_type| item_type.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| CatalogError::UnknownItemType(needle.to_string()))
    }
}
