//! Filtering and ordering of a user's inventory for display.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::model::InventoryItem;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Name,
    Price,
    PricePerLiter,
    LastUpdated,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQuery {
    /// Case-insensitive substring of the item type; empty matches everything.
    #[serde(default)]
    pub type_filter: Option<String>,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub order: SortOrder,
}

impl ItemQuery {
    pub fn matches(&self, item: &InventoryItem) -> bool {
        match self.type_filter.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => item
                .item_type
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }

    pub fn apply(&self, items: Vec<InventoryItem>) -> Vec<InventoryItem> {
        let mut out: Vec<InventoryItem> = items.into_iter().filter(|i| self.matches(i)).collect();
        out.sort_by(|a, b| {
            let ord = compare(self.sort, a, b);
            match self.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        out
    }
}

fn compare(key: SortKey, a: &InventoryItem, b: &InventoryItem) -> Ordering {
    match key {
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::Price => a.price.total_cmp(&b.price),
        SortKey::PricePerLiter => a.unit_price().total_cmp(&b.unit_price()),
        SortKey::LastUpdated => a.last_updated.cmp(&b.last_updated),
    }
}
