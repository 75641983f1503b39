//! Typed SELECTs over a single table.

use crate::error::{Error, Result};
use crate::models::Entity;
use rusqlite::types::Value;
use rusqlite::Connection;
use std::marker::PhantomData;

/// Query over the rows of `E`, built from `Session::query`.
///
/// Filters are ANDed equality tests. An unknown column is remembered and
/// reported when the query runs, so the builder chain stays infallible.
pub struct Query<'s, E: Entity> {
    conn: &'s Connection,
    filters: Vec<(&'static str, Value)>,
    unknown_column: Option<String>,
    _entity: PhantomData<E>,
}

impl<'s, E: Entity> Query<'s, E> {
    pub(crate) fn new(conn: &'s Connection) -> Self {
        Self {
            conn,
            filters: Vec::new(),
            unknown_column: None,
            _entity: PhantomData,
        }
    }

    pub fn filter_by(mut self, column: &str, value: impl Into<Value>) -> Self {
        match E::column(column) {
            Some(column) => self.filters.push((column, value.into())),
            None => {
                if self.unknown_column.is_none() {
                    self.unknown_column = Some(column.to_string());
                }
            }
        }
        self
    }

    pub fn all(self) -> Result<Vec<E>> {
        self.check()?;
        select(self.conn, &self.filters, None)
    }

    pub fn first(self) -> Result<Option<E>> {
        self.check()?;
        Ok(select(self.conn, &self.filters, Some(1))?.into_iter().next())
    }

    pub fn count(self) -> Result<usize> {
        self.check()?;
        let (clause, values) = where_clause(&self.filters);
        let sql = format!("SELECT COUNT(*) FROM {}{}", E::TABLE, clause);
        let count: i64 = self.conn.query_row(
            &sql,
            rusqlite::params_from_iter(values.iter()),
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn check(&self) -> Result<()> {
        match &self.unknown_column {
            Some(column) => Err(Error::UnknownColumn {
                table: E::TABLE,
                column: column.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Load rows of `E` matching `filters`, ordered by id.
pub(crate) fn select<E: Entity>(
    conn: &Connection,
    filters: &[(&'static str, Value)],
    limit: Option<usize>,
) -> Result<Vec<E>> {
    let (clause, values) = where_clause(filters);
    let mut sql = format!(
        "SELECT {} FROM {}{} ORDER BY id ASC",
        E::COLUMNS.join(", "),
        E::TABLE,
        clause
    );
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    tracing::trace!(sql = %sql, "select");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(values.iter()), |row| {
        E::from_row(row)
    })?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

// NULL never compares equal, so a NULL filter becomes IS NULL and binds nothing.
fn where_clause<'a>(filters: &'a [(&'static str, Value)]) -> (String, Vec<&'a Value>) {
    if filters.is_empty() {
        return (String::new(), Vec::new());
    }
    let mut parts = Vec::with_capacity(filters.len());
    let mut values = Vec::with_capacity(filters.len());
    for (column, value) in filters {
        if *value == Value::Null {
            parts.push(format!("{} IS NULL", column));
        } else {
            parts.push(format!("{} = ?", column));
            values.push(value);
        }
    }
    (format!(" WHERE {}", parts.join(" AND ")), values)
}
