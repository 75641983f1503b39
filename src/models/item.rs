use super::{Entity, Review};
use crate::error::Result;
use crate::session::Session;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Item {
    pub id: Option<i64>, // Assigned when the session inserts the row
    pub name: String,    // Item name
    pub price: f64,      // Unit price
}

impl Item {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            id: None,
            name: name.into(),
            price,
        }
    }

    /// Reviews left on this item, ordered by review id.
    pub fn reviews(&self, session: &Session) -> Result<Vec<Review>> {
        match self.id {
            Some(id) => session.query::<Review>().filter_by("item_id", id).all(),
            None => Ok(Vec::new()),
        }
    }
}

impl Entity for Item {
    const TABLE: &'static str = "item";
    const COLUMNS: &'static [&'static str] = &["id", "name", "price"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Item {
            id: row.get(0)?,
            name: row.get(1)?,
            price: row.get(2)?,
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO item (name, price) VALUES (?, ?)",
            params![&self.name, self.price],
        )?;
        Ok(conn.last_insert_rowid())
    }
}
