use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::models::{Customer, Entity, Item, Review};
use crate::query::select;
use crate::session::Session;
use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info};

// Parents first on create, children first on drop.
const TABLES: [&str; 3] = [Customer::TABLE, Item::TABLE, Review::TABLE];

// Define a struct to represent a database connection
#[derive(Debug)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    // Open a connection as described by `config`
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        let conn = Connection::open(&config.path)?;
        // Must be set outside a transaction; SQLite ignores it otherwise
        let pragma = if config.foreign_keys { "ON" } else { "OFF" };
        conn.execute_batch(&format!("PRAGMA foreign_keys = {};", pragma))?;
        info!(
            "Database connection established at: {} (foreign keys {})",
            config.path, pragma
        );
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(&DatabaseConfig::in_memory())
    }

    /// Start a unit of work. The session holds the connection until dropped,
    /// and waits for any session already open on another task.
    pub async fn session(&self) -> Session {
        Session::new(self.conn.clone().lock_owned().await)
    }

    // Schema and introspection calls never wait on a session: from the task
    // that owns it, waiting would never end.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.try_lock().map_err(|_| Error::SessionOpen)
    }

    // Create the database schema
    pub async fn create_all(&self) -> Result<()> {
        let conn = self.lock()?;

        // 1. Customers table
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS customer (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL
            );",
        )
        .map_err(|e| {
            error!("Failed creating customer table: {}", e);
            e
        })?;

        // 2. Items table
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS item (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                price REAL NOT NULL
            );",
        )
        .map_err(|e| {
            error!("Failed creating item table: {}", e);
            e
        })?;

        // 3. Reviews table. Deferred so a dangling key fails the COMMIT,
        // not the INSERT. AUTOINCREMENT everywhere keeps rolled-back ids
        // from being handed out again (see Session::rollback).
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS review (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                comment TEXT,
                customer_id INTEGER,
                item_id INTEGER,
                FOREIGN KEY (customer_id) REFERENCES customer(id)
                    DEFERRABLE INITIALLY DEFERRED,
                FOREIGN KEY (item_id) REFERENCES item(id)
                    DEFERRABLE INITIALLY DEFERRED
            );
            CREATE INDEX IF NOT EXISTS review_customer_id ON review (customer_id);
            CREATE INDEX IF NOT EXISTS review_item_id ON review (item_id);",
        )
        .map_err(|e| {
            error!("Failed creating review table: {}", e);
            e
        })?;

        debug!("Schema created");
        Ok(())
    }

    pub async fn drop_all(&self) -> Result<()> {
        let conn = self.lock()?;
        for table in TABLES.iter().rev() {
            conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", table))?;
        }
        debug!("Schema dropped");
        Ok(())
    }

    /// Drop and recreate every table, leaving an empty schema.
    pub async fn reset(&self) -> Result<()> {
        self.drop_all().await?;
        self.create_all().await
    }

    pub async fn table_names(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;
        let names = stmt.query_map([], |row| row.get(0))?;
        Ok(names.collect::<rusqlite::Result<Vec<String>>>()?)
    }

    /// Column names of `table` in declaration order, empty if it does not exist.
    pub async fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?)")?;
        let columns = stmt.query_map([table], |row| row.get(0))?;
        Ok(columns.collect::<rusqlite::Result<Vec<String>>>()?)
    }

    pub async fn foreign_keys_enabled(&self) -> Result<bool> {
        let conn = self.lock()?;
        let enabled: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
        Ok(enabled == 1)
    }

    // function to log database state
    pub async fn debug_dump(&self) -> Result<()> {
        let conn = self.lock()?;
        dump_table::<Customer>(&conn)?;
        dump_table::<Item>(&conn)?;
        dump_table::<Review>(&conn)?;
        Ok(())
    }
}

fn dump_table<E: Entity + serde::Serialize>(conn: &Connection) -> Result<()> {
    let rows = select::<E>(conn, &[], None)?;
    info!("[DATABASE DEBUG] {} ({} rows):", E::TABLE, rows.len());
    for row in rows {
        match serde_json::to_string(&row) {
            Ok(json) => info!("[DATABASE DEBUG] {}", json),
            Err(e) => error!("[DATABASE DEBUG] Failed to render {} row: {}", E::TABLE, e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Helper function to create test database
    async fn create_test_db() -> Database {
        info!("[TEST] Creating in-memory test database");
        let db = Database::open_in_memory().unwrap();
        db.reset().await.unwrap();
        info!("[TEST] Database schema created");
        db
    }

    // Test database schema creation
    #[tokio::test]
    async fn test_schema_creation() {
        info!("[TEST] Starting test_schema_creation");
        let db = create_test_db().await;

        let tables = db.table_names().await.unwrap();
        assert_eq!(tables, vec!["customer", "item", "review"]);

        assert_eq!(db.table_columns("customer").await.unwrap(), vec!["id", "name"]);
        assert_eq!(
            db.table_columns("item").await.unwrap(),
            vec!["id", "name", "price"]
        );
        assert_eq!(
            db.table_columns("review").await.unwrap(),
            vec!["id", "comment", "customer_id", "item_id"]
        );
        assert!(db.table_columns("missing").await.unwrap().is_empty());
    }

    // Declared columns and the live schema must agree
    #[tokio::test]
    async fn test_entity_columns_match_schema() {
        let db = create_test_db().await;
        assert_eq!(db.table_columns(Customer::TABLE).await.unwrap(), Customer::COLUMNS);
        assert_eq!(db.table_columns(Item::TABLE).await.unwrap(), Item::COLUMNS);
        assert_eq!(db.table_columns(Review::TABLE).await.unwrap(), Review::COLUMNS);
    }

    #[tokio::test]
    async fn test_reset_clears_rows() {
        info!("[TEST] Starting test_reset_clears_rows");
        let db = create_test_db().await;

        {
            let mut session = db.session().await;
            let mut c = Customer::new("John Doe");
            let mut i = Item::new("Laptop", 1000.0);
            session.add_all(&mut [&mut c, &mut i]).unwrap();
            let mut r = Review::new()
                .with_comment("great!")
                .with_customer(&c)
                .unwrap()
                .with_item(&i)
                .unwrap();
            session.add(&mut r).unwrap();
            session.commit().unwrap();
        }
        db.debug_dump().await.unwrap();

        db.reset().await.unwrap();
        let session = db.session().await;
        assert_eq!(session.query::<Customer>().count().unwrap(), 0);
        assert_eq!(session.query::<Item>().count().unwrap(), 0);
        assert_eq!(session.query::<Review>().count().unwrap(), 0);
        info!("[TEST] Reset - PASSED");
    }

    #[tokio::test]
    async fn test_drop_all_removes_tables() {
        let db = create_test_db().await;
        db.drop_all().await.unwrap();
        assert!(db.table_names().await.unwrap().is_empty());

        // Recreating is idempotent
        db.create_all().await.unwrap();
        db.create_all().await.unwrap();
        assert_eq!(db.table_names().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_schema_calls_fail_while_session_open() {
        info!("[TEST] Starting test_schema_calls_fail_while_session_open");
        let db = create_test_db().await;

        let mut session = db.session().await;
        session.rollback().unwrap();
        assert!(matches!(db.drop_all().await, Err(Error::SessionOpen)));
        assert!(matches!(db.create_all().await, Err(Error::SessionOpen)));
        assert!(matches!(db.reset().await, Err(Error::SessionOpen)));
        assert!(matches!(db.table_columns("review").await, Err(Error::SessionOpen)));
        assert!(matches!(db.debug_dump().await, Err(Error::SessionOpen)));

        drop(session);
        db.reset().await.unwrap();
        assert_eq!(db.table_names().await.unwrap().len(), 3);
        info!("[TEST] Open session reported instead of blocking - PASSED");
    }

    #[tokio::test]
    async fn test_foreign_key_pragma_follows_config() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.foreign_keys_enabled().await.unwrap());

        let config = DatabaseConfig {
            foreign_keys: false,
            ..DatabaseConfig::in_memory()
        };
        let db = Database::open(&config).unwrap();
        assert!(!db.foreign_keys_enabled().await.unwrap());
    }
}
