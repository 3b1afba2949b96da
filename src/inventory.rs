//! Item mutation entry point. Validates input and prices it before anything
//! reaches the store, so a rejected request never leaves a partial item.
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::InventoryError;
use crate::listing::ItemQuery;
use crate::model::{InventoryItem, ItemFields, PricedItem, Session};
use crate::store::ItemStore;

#[derive(Clone)]
pub struct Inventory {
    store: Arc<dyn ItemStore>,
}

impl Inventory {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    #[instrument(skip_all, fields(user_id = %session.user_id()))]
    pub async fn list_items(
        &self,
        session: &Session,
        query: &ItemQuery,
    ) -> Result<Vec<InventoryItem>, InventoryError> {
        let items = self.store.list_items(session.user_id()).await?;
        Ok(query.apply(items))
    }

    #[instrument(skip_all, fields(user_id = %session.user_id()))]
    pub async fn create_item(
        &self,
        session: &Session,
        fields: ItemFields,
    ) -> Result<InventoryItem, InventoryError> {
        let priced = price(fields)?;
        let item = self.store.create_item(session.user_id(), &priced).await?;
        info!(item_id = %item.id, name = %item.name, "item created");
        Ok(item)
    }

    #[instrument(skip_all, fields(user_id = %session.user_id(), item_id = %item_id))]
    pub async fn update_item(
        &self,
        session: &Session,
        item_id: &str,
        fields: ItemFields,
    ) -> Result<InventoryItem, InventoryError> {
        let priced = price(fields)?;
        let item = self
            .store
            .update_item(session.user_id(), item_id, &priced)
            .await?;
        info!(price = item.price, price_per_liter = item.price_per_liter, "item updated");
        Ok(item)
    }

    #[instrument(skip_all, fields(user_id = %session.user_id(), item_id = %item_id))]
    pub async fn delete_item(&self, session: &Session, item_id: &str) -> Result<(), InventoryError> {
        self.store.delete_item(session.user_id(), item_id).await?;
        info!("item deleted");
        Ok(())
    }
}

fn price(fields: ItemFields) -> Result<PricedItem, InventoryError> {
    fields.validate()?;
    Ok(PricedItem::new(fields, Utc::now())?)
}
