//! Inventory pricing core for a bar price tracker: per-liter price
//! normalization, validated item mutations, and bulk price refresh from
//! retailer product pages.

pub mod autofill;
pub mod config;
pub mod db;
pub mod error;
pub mod inventory;
pub mod listing;
pub mod model;
pub mod pricing;
pub mod refresh;
pub mod scraper;
pub mod store;

pub use error::{InventoryError, RefreshError, ScrapeError, StoreError, ValidationError};
pub use model::{
    CocktailCosts, CocktailIngredient, InventoryItem, ItemFields, ScrapeOutcome, ScrapedProduct,
    Session,
};
pub use refresh::{RefreshOptions, Refresher};
