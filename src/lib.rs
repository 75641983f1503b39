//! Customers, items and the reviews that connect them, persisted in SQLite.
//!
//! A [`Database`] owns the connection and the schema. Work happens in a
//! [`Session`]: records are added, committed, and read back through typed
//! queries. Reviews hold their parents by id; the reverse `reviews`
//! collections on [`Customer`] and [`Item`] are loaded by query.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod session;

pub use config::DatabaseConfig;
pub use db::Database;
pub use error::{Error, Result};
pub use models::{Customer, Entity, Item, Persist, Review};
pub use query::Query;
pub use session::Session;
