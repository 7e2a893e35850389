//! Wipeline Storage Layer
//!
//! Implements the `RecordStore` trait over SQLite: a scratch staging table
//! reloaded every cycle and a durable fact table guarded by a content hash.
//!
//! # Architecture
//!
//! - `blancco_data_stage`: wide all-text scratch table, cleared at the start
//!   of each load cycle
//! - `blancco_data`: append-only fact table keyed for dedup by `hash_data`
//! - both tables and the merge statement are generated from one column map,
//!   so schema and merge can never disagree
//!
//! # Examples
//!
//! ```no_run
//! use wipeline_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for load cycles
//! ```

#![warn(missing_docs)]

pub mod hash;
pub mod schema;

use std::path::Path;

use rusqlite::{params, params_from_iter, Connection};
use thiserror::Error;
use tracing::{info, warn};

use wipeline_domain::{FlatRecord, RecordStore, StageSummary};

pub use hash::{content_hash, HASH_COLUMNS};
pub use schema::{COLUMN_MAP, FACT_TABLE, STAGE_TABLE};

/// Default number of staged rows per insert transaction
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// SQLite-based implementation of RecordStore
///
/// Holds both the staging and fact tables in one database file. The schema
/// is created on open if it does not exist yet.
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. The pipeline runs a single load
/// cycle at a time, so one store instance per process is the expected shape.
pub struct SqliteStore {
    conn: Connection,
    batch_size: usize,
}

impl SqliteStore {
    /// Open a store at the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wipeline_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("wipeline.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self {
            conn,
            batch_size: DEFAULT_BATCH_SIZE,
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Override the staging chunk size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch(&schema::schema_ddl())?;
        Ok(())
    }

    /// Live staging columns, lowercased, in table order
    fn stage_columns(&self) -> Result<Vec<String>, StoreError> {
        let stmt = self
            .conn
            .prepare(&format!("SELECT * FROM \"{}\" WHERE 1=0", STAGE_TABLE))?;
        let columns = stmt
            .column_names()
            .iter()
            .map(|name| name.to_lowercase())
            .collect();
        Ok(columns)
    }
}

impl RecordStore for SqliteStore {
    type Error = StoreError;

    fn clear_stage(&mut self) -> Result<(), Self::Error> {
        self.conn
            .execute(&format!("DELETE FROM \"{}\"", STAGE_TABLE), [])?;
        Ok(())
    }

    fn stage_batch(&mut self, batch: &[FlatRecord]) -> Result<StageSummary, Self::Error> {
        if batch.is_empty() {
            info!(rows = 0, table = STAGE_TABLE, "loaded records to staging");
            return Ok(StageSummary::default());
        }

        let destination = self.stage_columns()?;

        // Union of keys across the batch, in first-seen order
        let mut batch_columns: Vec<String> = Vec::new();
        for record in batch {
            for key in record.keys() {
                if !batch_columns.iter().any(|column| column == key) {
                    batch_columns.push(key.to_string());
                }
            }
        }

        let mapped: Vec<String> = destination
            .iter()
            .filter(|column| batch_columns.iter().any(|key| key == *column))
            .cloned()
            .collect();
        let unmapped: Vec<String> = batch_columns
            .into_iter()
            .filter(|key| !destination.iter().any(|column| column == key))
            .collect();
        if !unmapped.is_empty() {
            warn!(
                columns = %unmapped.join(", "),
                "unmapped columns skipped during staging"
            );
        }
        if mapped.is_empty() {
            warn!(table = STAGE_TABLE, "no batch column maps to the staging schema");
            return Ok(StageSummary {
                staged: 0,
                unmapped,
            });
        }

        let insert_sql = schema::stage_insert_sql(&mapped);
        let mut staged = 0usize;
        for chunk in batch.chunks(self.batch_size) {
            let tx = self.conn.transaction()?;
            {
                let mut stmt = tx.prepare(&insert_sql)?;
                for record in chunk {
                    // Nulls and absent fields both land as '' (columns are text-typed)
                    let values: Vec<&str> = mapped
                        .iter()
                        .map(|column| record.value(column).unwrap_or(""))
                        .collect();
                    stmt.execute(params_from_iter(values.iter()))?;
                    staged += 1;
                }
            }
            tx.commit()?;
        }
        info!(rows = staged, table = STAGE_TABLE, "loaded records to staging");

        Ok(StageSummary { staged, unmapped })
    }

    fn update_hashes(&mut self) -> Result<usize, Self::Error> {
        let select = format!(
            "SELECT rowid, {} FROM \"{}\"",
            HASH_COLUMNS
                .iter()
                .map(|column| format!("\"{}\"", column))
                .collect::<Vec<_>>()
                .join(", "),
            STAGE_TABLE
        );

        let rows: Vec<(i64, String)> = {
            let mut stmt = self.conn.prepare(&select)?;
            let mapped = stmt.query_map([], |row| {
                let rowid: i64 = row.get(0)?;
                let mut values: Vec<Option<String>> = Vec::with_capacity(HASH_COLUMNS.len());
                for idx in 0..HASH_COLUMNS.len() {
                    values.push(row.get(idx + 1)?);
                }
                Ok((rowid, values))
            })?;
            mapped.collect::<Result<Vec<_>, _>>()?
        }
        .into_iter()
        .map(|(rowid, values)| {
            let hash = content_hash(values.iter().map(|value| value.as_deref()));
            (rowid, hash)
        })
        .collect();

        let hashed = rows.len();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "UPDATE \"{}\" SET \"hash_data\" = ?1 WHERE rowid = ?2",
                STAGE_TABLE
            ))?;
            for (rowid, hash) in &rows {
                stmt.execute(params![hash, rowid])?;
            }
        }
        tx.commit()?;

        Ok(hashed)
    }

    fn merge(&mut self) -> Result<usize, Self::Error> {
        let inserted = self.conn.execute(&schema::merge_sql(), [])?;
        info!(rows = inserted, table = FACT_TABLE, "loaded records to fact table");
        Ok(inserted)
    }
}
