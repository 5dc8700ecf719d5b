//! Persisted candidate table backed by redb.
//!
//! Rows are keyed by a monotonically assigned `u64` row index, so redb's
//! key ordering reproduces insertion order exactly — the same scan order
//! the in-memory table has, and the sentence↔path pairing by row index
//! stays valid across writes and reads.
//!
//! A `meta` table stores the fingerprint of the normalizer the table was
//! built with; [`ExampleDb::check_normalizer`] compares it at load time so
//! a training/query normalization divergence is flagged instead of
//! silently degrading match quality.

use std::ops::ControlFlow;
use std::path::Path;

use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition, TableError};

use crate::error::{StoreError, StoreResult};
use crate::normalize::Normalizer;

use super::{Candidates, ExampleRow};

/// Row index → JSON-encoded [`ExampleRow`].
const EXAMPLES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("examples");

/// Table metadata (normalizer fingerprint).
const META_TABLE: TableDefinition<&str, &str> = TableDefinition::new("meta");

const NORMALIZER_KEY: &str = "normalizer";

/// Persisted, insertion-ordered examples table.
///
/// All writes go through transactions; reads use MVCC snapshots, so a
/// retrain in another process never exposes a half-written table to
/// readers.
pub struct ExampleDb {
    db: Database,
}

impl ExampleDb {
    /// Open or create an examples database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io { source })?;
        }
        let db = Database::create(path).map_err(|e| StoreError::Redb {
            message: format!("failed to open examples db at {}: {e}", path.display()),
        })?;
        Ok(Self { db })
    }

    /// Replace the table contents with freshly generated rows, in one
    /// transaction. Row indices are assigned in iteration order starting
    /// at 0; the normalizer fingerprint is recorded alongside.
    ///
    /// Returns the number of rows written.
    pub fn replace_rows<'a, I>(&self, rows: I, normalizer: &Normalizer) -> StoreResult<u64>
    where
        I: IntoIterator<Item = &'a ExampleRow>,
    {
        let txn = self.db.begin_write().map_err(|e| StoreError::Redb {
            message: format!("begin_write failed: {e}"),
        })?;
        let count = {
            txn.delete_table(EXAMPLES_TABLE).map_err(|e| StoreError::Redb {
                message: format!("delete_table failed: {e}"),
            })?;
            let mut table = txn.open_table(EXAMPLES_TABLE).map_err(|e| StoreError::Redb {
                message: format!("open_table failed: {e}"),
            })?;
            let mut index: u64 = 0;
            for row in rows {
                let encoded = serde_json::to_vec(row).map_err(|e| StoreError::Redb {
                    message: format!("failed to encode row {index}: {e}"),
                })?;
                table
                    .insert(index, encoded.as_slice())
                    .map_err(|e| StoreError::Redb {
                        message: format!("insert failed: {e}"),
                    })?;
                index += 1;
            }

            let mut meta = txn.open_table(META_TABLE).map_err(|e| StoreError::Redb {
                message: format!("open_table failed: {e}"),
            })?;
            meta.insert(NORMALIZER_KEY, normalizer.fingerprint().as_str())
                .map_err(|e| StoreError::Redb {
                    message: format!("insert failed: {e}"),
                })?;
            index
        };
        txn.commit().map_err(|e| StoreError::Redb {
            message: format!("commit failed: {e}"),
        })?;
        tracing::debug!(rows = count, "wrote examples table");
        Ok(count)
    }

    /// Compare the stored normalizer fingerprint against the session
    /// normalizer. A mismatch is advisory — it logs a warning and returns
    /// `Ok(false)` rather than failing, since matching still works, just
    /// worse.
    pub fn check_normalizer(&self, normalizer: &Normalizer) -> StoreResult<bool> {
        let stored = self.stored_fingerprint()?;
        let expected = normalizer.fingerprint();
        match stored {
            Some(stored) if stored == expected => Ok(true),
            Some(stored) => {
                tracing::warn!(
                    stored = %stored,
                    expected = %expected,
                    "examples table was built with a different normalizer; \
                     match quality may degrade"
                );
                Ok(false)
            }
            None => {
                tracing::warn!(
                    expected = %expected,
                    "examples table has no recorded normalizer fingerprint"
                );
                Ok(false)
            }
        }
    }

    fn stored_fingerprint(&self) -> StoreResult<Option<String>> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Redb {
            message: format!("begin_read failed: {e}"),
        })?;
        let meta = match txn.open_table(META_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => {
                return Err(StoreError::Redb {
                    message: format!("open_table failed: {e}"),
                });
            }
        };
        let value = meta.get(NORMALIZER_KEY).map_err(|e| StoreError::Redb {
            message: format!("get failed: {e}"),
        })?;
        Ok(value.map(|guard| guard.value().to_string()))
    }
}

impl Candidates for ExampleDb {
    fn scan(
        &self,
        visit: &mut dyn FnMut(&ExampleRow) -> ControlFlow<()>,
    ) -> StoreResult<()> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Redb {
            message: format!("begin_read failed: {e}"),
        })?;
        let table = match txn.open_table(EXAMPLES_TABLE) {
            Ok(table) => table,
            // Never trained: an empty table, not an error.
            Err(TableError::TableDoesNotExist(_)) => return Ok(()),
            Err(e) => {
                return Err(StoreError::Redb {
                    message: format!("open_table failed: {e}"),
                });
            }
        };
        for item in table.iter().map_err(|e| StoreError::Redb {
            message: format!("iter failed: {e}"),
        })? {
            let (key, value) = item.map_err(|e| StoreError::Redb {
                message: format!("read failed: {e}"),
            })?;
            let row: ExampleRow = serde_json::from_slice(value.value()).map_err(|source| {
                StoreError::CorruptRow {
                    row: key.value(),
                    source,
                }
            })?;
            if visit(&row).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn len(&self) -> StoreResult<u64> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Redb {
            message: format!("begin_read failed: {e}"),
        })?;
        match txn.open_table(EXAMPLES_TABLE) {
            Ok(table) => table.len().map_err(|e| StoreError::Redb {
                message: format!("len failed: {e}"),
            }),
            Err(TableError::TableDoesNotExist(_)) => Ok(0),
            Err(e) => Err(StoreError::Redb {
                message: format!("open_table failed: {e}"),
            }),
        }
    }
}

impl std::fmt::Debug for ExampleDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExampleDb").finish()
    }
}
