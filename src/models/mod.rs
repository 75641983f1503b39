//! Record types and the row mapping shared by the session and query layers.

pub mod customer;
pub mod item;
pub mod review;

pub use customer::Customer;
pub use item::Item;
pub use review::Review;

use rusqlite::{Connection, Row};

/// A record type backed by one table.
///
/// `COLUMNS` lists every column in the order `from_row` reads them, with the
/// surrogate key `id` first.
pub trait Entity: Sized {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: i64);

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Insert every column except `id` and return the assigned rowid.
    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64>;

    /// Look up a column by name, returning the static spelling.
    fn column(name: &str) -> Option<&'static str> {
        Self::COLUMNS.iter().copied().find(|column| *column == name)
    }
}

/// Object-safe view of an [`Entity`], so one `add_all` call can take
/// customers and items side by side.
pub trait Persist {
    fn table(&self) -> &'static str;
    fn persisted_id(&self) -> Option<i64>;
    fn assign_id(&mut self, id: i64);
    fn insert_into(&self, conn: &Connection) -> rusqlite::Result<i64>;
}

impl<E: Entity> Persist for E {
    fn table(&self) -> &'static str {
        E::TABLE
    }

    fn persisted_id(&self) -> Option<i64> {
        self.id()
    }

    fn assign_id(&mut self, id: i64) {
        self.set_id(id)
    }

    fn insert_into(&self, conn: &Connection) -> rusqlite::Result<i64> {
        self.insert(conn)
    }
}
