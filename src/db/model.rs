//! Row mapping for the SQLite item store.
//!
//! Keep these functions focused on turning rows into domain structs. Business
//! logic lives in `inventory` and `refresh`.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::model::{InventoryItem, PriceHistoryEntry};

pub(crate) const ITEM_COLUMNS: &str = "id, user_id, name, brand, item_type, size_ml, \
     alcohol_percentage, price, price_per_liter, shop, source_url, image_url, last_updated";

pub(crate) fn item_from_row(row: &SqliteRow) -> Result<InventoryItem, sqlx::Error> {
    Ok(InventoryItem {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        brand: row.try_get("brand")?,
        item_type: row.try_get("item_type")?,
        size_ml: row.try_get("size_ml")?,
        alcohol_percentage: row.try_get("alcohol_percentage")?,
        price: row.try_get("price")?,
        price_per_liter: row.try_get("price_per_liter")?,
        shop: row.try_get("shop")?,
        source_url: row.try_get::<Option<String>, _>("source_url")?,
        image_url: row.try_get::<Option<String>, _>("image_url")?,
        last_updated: row.try_get::<DateTime<Utc>, _>("last_updated")?,
    })
}

pub(crate) fn history_from_row(row: &SqliteRow) -> Result<PriceHistoryEntry, sqlx::Error> {
    Ok(PriceHistoryEntry {
        item_id: row.try_get("item_id")?,
        price: row.try_get("price")?,
        shop: row.try_get("shop")?,
        recorded_at: row.try_get::<DateTime<Utc>, _>("recorded_at")?,
    })
}
