use super::model::{history_from_row, item_from_row, ITEM_COLUMNS};
use crate::error::StoreError;
use crate::model::{InventoryItem, PriceHistoryEntry, PricedItem};
use crate::store::ItemStore;
use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;

pub type Pool = SqlitePool;

/// How long a connection waits for another writer before giving up.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// File-backed pool. WAL, `synchronous=FULL` and the busy timeout are set on
/// every connection the pool opens, not just the first.
pub async fn init_pool(database_url: &str) -> Result<Pool, StoreError> {
    let normalized = prepare_sqlite_url(database_url);
    let options = SqliteConnectOptions::from_str(&normalized)?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    Ok(pool)
}

/// Single-connection in-memory pool with migrations applied. Every connection
/// to `sqlite::memory:` is its own database, so the pool must not grow.
pub async fn memory_pool() -> Result<Pool, StoreError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// For file-backed SQLite URLs, expand a leading `~/`, make sure the parent
/// directory exists and create the file on first use.
fn prepare_sqlite_url(url: &str) -> String {
    let Some(rest) = url.strip_prefix("sqlite:") else {
        return url.to_string();
    };
    if rest.starts_with(":memory") {
        return url.to_string();
    }
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let (path, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    if path.is_empty() {
        return url.to_string();
    }

    let path = match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(tail), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), tail),
        _ => path.to_string(),
    };
    if let Some(parent) = std::path::Path::new(&path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    let mut query = query.map(str::to_string).unwrap_or_default();
    if !query.split('&').any(|kv| kv.starts_with("mode=")) {
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str("mode=rwc");
    }
    format!("sqlite://{}?{}", path, query)
}

pub async fn run_migrations(pool: &Pool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Unavailable(format!("migration failed: {e}")))?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct SqliteItemStore {
    pool: Pool,
}

impl SqliteItemStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    #[instrument(skip_all, fields(user_id = %user_id, item_id = %item_id))]
    pub async fn get_item(
        &self,
        user_id: &str,
        item_id: &str,
    ) -> Result<InventoryItem, StoreError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE user_id = ? AND id = ?");
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Err(StoreError::NotFound(item_id.to_string()));
        };
        Ok(item_from_row(&row)?)
    }

    /// Recorded prices for one item, oldest first.
    #[instrument(skip_all)]
    pub async fn price_history(
        &self,
        user_id: &str,
        item_id: &str,
    ) -> Result<Vec<PriceHistoryEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT item_id, price, shop, recorded_at FROM price_history \
             WHERE user_id = ? AND item_id = ? ORDER BY id ASC",
        )
        .bind(user_id)
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;
        let entries = rows
            .iter()
            .map(history_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

/// Append a history row when the stored price differs from the new one.
/// Unknown items and unchanged prices insert nothing.
async fn record_price_change_tx(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: &str,
    item_id: &str,
    item: &PricedItem,
) -> Result<(), StoreError> {
    let price = item.fields().price;
    sqlx::query(
        "INSERT INTO price_history (user_id, item_id, price, shop, recorded_at) \
         SELECT user_id, id, ?, ?, ? FROM items \
         WHERE user_id = ? AND id = ? AND price <> ?",
    )
    .bind(price)
    .bind(&item.fields().shop)
    .bind(item.last_updated())
    .bind(user_id)
    .bind(item_id)
    .bind(price)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl ItemStore for SqliteItemStore {
    #[instrument(skip_all, fields(user_id = %user_id))]
    async fn list_items(&self, user_id: &str) -> Result<Vec<InventoryItem>, StoreError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE user_id = ? ORDER BY rowid");
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        let items = rows
            .iter()
            .map(item_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = items.len(), "listed items");
        Ok(items)
    }

    #[instrument(skip_all, fields(user_id = %user_id))]
    async fn create_item(
        &self,
        user_id: &str,
        item: &PricedItem,
    ) -> Result<InventoryItem, StoreError> {
        let id = Uuid::new_v4().to_string();
        let f = item.fields();
        sqlx::query(
            "INSERT INTO items (id, user_id, name, brand, item_type, size_ml, alcohol_percentage, \
             price, price_per_liter, shop, source_url, image_url, last_updated) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(&f.name)
        .bind(&f.brand)
        .bind(&f.item_type)
        .bind(f.size_ml)
        .bind(f.alcohol_percentage)
        .bind(f.price)
        .bind(item.price_per_liter())
        .bind(&f.shop)
        .bind(&f.source_url)
        .bind(&f.image_url)
        .bind(item.last_updated())
        .execute(&self.pool)
        .await?;
        Ok(InventoryItem::from_priced(id, user_id.to_string(), item))
    }

    #[instrument(skip_all, fields(user_id = %user_id, item_id = %item_id))]
    async fn update_item(
        &self,
        user_id: &str,
        item_id: &str,
        item: &PricedItem,
    ) -> Result<InventoryItem, StoreError> {
        // The first statement must be a write. A deferred transaction that
        // reads first gets SQLITE_BUSY on upgrade instead of waiting.
        let mut tx = self.pool.begin().await?;
        record_price_change_tx(&mut tx, user_id, item_id, item).await?;

        let f = item.fields();
        let res = sqlx::query(
            "UPDATE items SET name = ?, brand = ?, item_type = ?, size_ml = ?, alcohol_percentage = ?, \
             price = ?, price_per_liter = ?, shop = ?, source_url = ?, image_url = ?, last_updated = ? \
             WHERE user_id = ? AND id = ?",
        )
        .bind(&f.name)
        .bind(&f.brand)
        .bind(&f.item_type)
        .bind(f.size_ml)
        .bind(f.alcohol_percentage)
        .bind(f.price)
        .bind(item.price_per_liter())
        .bind(&f.shop)
        .bind(&f.source_url)
        .bind(&f.image_url)
        .bind(item.last_updated())
        .bind(user_id)
        .bind(item_id)
        .execute(&mut *tx)
        .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound(item_id.to_string()));
        }

        tx.commit().await?;
        Ok(InventoryItem::from_priced(
            item_id.to_string(),
            user_id.to_string(),
            item,
        ))
    }

    #[instrument(skip_all, fields(user_id = %user_id, item_id = %item_id))]
    async fn delete_item(&self, user_id: &str, item_id: &str) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let res = sqlx::query("DELETE FROM items WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound(item_id.to_string()));
        }
        sqlx::query("DELETE FROM price_history WHERE user_id = ? AND item_id = ?")
            .bind(user_id)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
