// src/models/review.rs
use super::{Customer, Entity, Item};
use crate::error::{Error, Result};
use crate::session::Session;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

/// A customer's comment on an item.
///
/// Every field is optional, so `Review::default()` is a valid empty review.
/// The parents are held by id only; [`Review::customer`] and
/// [`Review::item`] load them through a session when asked.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Review {
    pub id: Option<i64>,
    pub comment: Option<String>,
    pub customer_id: Option<i64>, // customer.id of the author
    pub item_id: Option<i64>,     // item.id of the reviewed item
}

impl Review {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Point the review at `customer`. The customer must already have been
    /// added to a session; a transient parent has no id to copy and is
    /// refused rather than leaving the key NULL.
    pub fn with_customer(mut self, customer: &Customer) -> Result<Self> {
        self.customer_id = Some(customer.id.ok_or(Error::TransientParent {
            table: Customer::TABLE,
        })?);
        Ok(self)
    }

    pub fn with_item(mut self, item: &Item) -> Result<Self> {
        self.item_id = Some(item.id.ok_or(Error::TransientParent { table: Item::TABLE })?);
        Ok(self)
    }

    pub fn customer(&self, session: &Session) -> Result<Option<Customer>> {
        match self.customer_id {
            Some(id) => session.get::<Customer>(id),
            None => Ok(None),
        }
    }

    pub fn item(&self, session: &Session) -> Result<Option<Item>> {
        match self.item_id {
            Some(id) => session.get::<Item>(id),
            None => Ok(None),
        }
    }
}

impl Entity for Review {
    const TABLE: &'static str = "review";
    const COLUMNS: &'static [&'static str] = &["id", "comment", "customer_id", "item_id"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Review {
            id: row.get(0)?,
            comment: row.get(1)?,
            customer_id: row.get(2)?,
            item_id: row.get(3)?,
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO review (comment, customer_id, item_id) VALUES (?, ?, ?)",
            params![&self.comment, self.customer_id, self.item_id],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_be_instantiated() {
        let r = Review::new();
        assert_eq!(r, Review::default());
        assert!(r.id.is_none());
        assert!(r.comment.is_none());
    }

    #[test]
    fn test_has_comment() {
        for comment in ["great product!", "", "ünïcödé ✓", "multi\nline"] {
            let r = Review::new().with_comment(comment);
            assert_eq!(r.comment.as_deref(), Some(comment));
        }
    }

    #[test]
    fn test_links_copy_parent_ids() {
        let c = Customer {
            id: Some(7),
            name: "Jane Doe".into(),
        };
        let i = Item {
            id: Some(3),
            name: "Phone".into(),
            price: 500.0,
        };

        let r = Review::new()
            .with_customer(&c)
            .unwrap()
            .with_item(&i)
            .unwrap();
        assert_eq!(r.customer_id, Some(7));
        assert_eq!(r.item_id, Some(3));
    }

    #[test]
    fn test_links_refuse_transient_parents() {
        let c = Customer::new("Jane Doe");
        let i = Item::new("Phone", 500.0);

        match Review::new().with_customer(&c) {
            Err(Error::TransientParent { table }) => assert_eq!(table, "customer"),
            other => panic!("expected TransientParent, got {:?}", other),
        }
        match Review::new().with_item(&i) {
            Err(Error::TransientParent { table }) => assert_eq!(table, "item"),
            other => panic!("expected TransientParent, got {:?}", other),
        }
    }

    #[test]
    fn test_columns() {
        for column in ["comment", "customer_id", "item_id"] {
            assert_eq!(Review::column(column), Some(column));
        }
        assert_eq!(Review::column("rating"), None);
    }
}
