use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{InventoryItem, PricedItem};

/// Persistent record store for inventory items. Every operation is scoped to
/// one user; ids are unique within a user's collection.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn list_items(&self, user_id: &str) -> Result<Vec<InventoryItem>, StoreError>;

    async fn create_item(&self, user_id: &str, item: &PricedItem)
        -> Result<InventoryItem, StoreError>;

    /// Replace an item's attributes. Unknown ids yield `StoreError::NotFound`.
    async fn update_item(
        &self,
        user_id: &str,
        item_id: &str,
        item: &PricedItem,
    ) -> Result<InventoryItem, StoreError>;

    async fn delete_item(&self, user_id: &str, item_id: &str) -> Result<(), StoreError>;
}
