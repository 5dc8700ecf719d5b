//! Candidate storage for generated examples.
//!
//! Two backends share one row model and identical scan semantics:
//!
//! - [`MemTable`] — rows in memory, insertion-ordered (training in-process)
//! - [`ExampleDb`] — rows in a redb table keyed by row index (persisted
//!   training artifacts)
//!
//! Row order is load-bearing: the recognizer's tie-break rule is "first
//! candidate with the maximal score wins", so both backends present rows in
//! exactly the order training inserted them.

pub mod durable;
pub mod mem;

pub use durable::ExampleDb;
pub use mem::MemTable;

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::graph::NodeId;

/// One candidate: a normalized example sentence, its intent, and the graph
/// path that rendered it. The sentence↔path pairing must survive any
/// storage backend exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleRow {
    /// Bare intent name.
    pub intent: String,
    /// Normalized sentence text (the lookup key).
    pub text: String,
    /// Path through the intent graph, in upstream node ids.
    pub path: Vec<NodeId>,
}

/// Read-only access to candidate rows in stable insertion order.
///
/// The recognizer is written against this trait so it is agnostic to where
/// the rows live. Implementations must visit rows in the same order on
/// every call.
pub trait Candidates {
    /// Visit rows in row order. The visitor returns
    /// [`ControlFlow::Break`] to stop the scan early (exact-match
    /// short-circuit).
    fn scan(
        &self,
        visit: &mut dyn FnMut(&ExampleRow) -> ControlFlow<()>,
    ) -> StoreResult<()>;

    /// Number of rows.
    fn len(&self) -> StoreResult<u64>;

    /// Whether the table has no rows.
    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Materialize all rows in row order (used by the parallel scan).
    fn collect_rows(&self) -> StoreResult<Vec<ExampleRow>> {
        let mut rows = Vec::new();
        self.scan(&mut |row| {
            rows.push(row.clone());
            ControlFlow::Continue(())
        })?;
        Ok(rows)
    }
}

impl<C: Candidates + ?Sized> Candidates for &C {
    fn scan(
        &self,
        visit: &mut dyn FnMut(&ExampleRow) -> ControlFlow<()>,
    ) -> StoreResult<()> {
        (**self).scan(visit)
    }

    fn len(&self) -> StoreResult<u64> {
        (**self).len()
    }
}
