//! SQLite-backed item store.
//!
//! - `model`: row mapping into domain structs.
//! - `repo`: pool setup, migrations and the `ItemStore` implementation.
//!
//! External modules should import from `bar_price_tracker::db`.

pub mod model;
pub mod repo;

pub use repo::*;
