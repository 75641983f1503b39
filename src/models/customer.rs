use super::{Entity, Review};
use crate::error::Result;
use crate::session::Session;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Customer {
    pub id: Option<i64>, // Assigned when the session inserts the row
    pub name: String,
}

impl Customer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    /// Reviews written by this customer, ordered by review id.
    /// A transient customer has none.
    pub fn reviews(&self, session: &Session) -> Result<Vec<Review>> {
        match self.id {
            Some(id) => session.query::<Review>().filter_by("customer_id", id).all(),
            None => Ok(Vec::new()),
        }
    }
}

impl Entity for Customer {
    const TABLE: &'static str = "customer";
    const COLUMNS: &'static [&'static str] = &["id", "name"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Customer {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute("INSERT INTO customer (name) VALUES (?)", params![&self.name])?;
        Ok(conn.last_insert_rowid())
    }
}
