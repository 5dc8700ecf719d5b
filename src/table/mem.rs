//! In-memory candidate table.

use std::collections::BTreeMap;
use std::ops::ControlFlow;

use crate::error::{GraphResult, StoreResult};
use crate::graph::NodeId;
use crate::graph::generate::Example;
use crate::normalize::Normalizer;

use super::{Candidates, ExampleRow};

/// Insertion-ordered candidate table held in memory.
///
/// Built once per training run from the example generator's output;
/// read-only at query time. Retraining builds a fresh table and swaps it
/// in — concurrent queries never observe a partially built table.
#[derive(Debug, Default, Clone)]
pub struct MemTable {
    rows: Vec<ExampleRow>,
}

impl MemTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from generated examples, normalizing each sentence
    /// with the session normalizer before it becomes a key.
    ///
    /// Generator errors (malformed paths) abort the build.
    pub fn from_examples<I>(examples: I, normalizer: &Normalizer) -> GraphResult<Self>
    where
        I: IntoIterator<Item = GraphResult<Example>>,
    {
        let mut table = Self::new();
        for example in examples {
            let example = example?;
            table.push(ExampleRow {
                intent: example.intent,
                text: normalizer.apply(&example.text),
                path: example.path,
            });
        }
        tracing::debug!(rows = table.rows.len(), "built example table");
        Ok(table)
    }

    /// Append a row, preserving insertion order.
    pub fn push(&mut self, row: ExampleRow) {
        self.rows.push(row);
    }

    /// All rows in insertion order.
    pub fn rows(&self) -> &[ExampleRow] {
        &self.rows
    }

    /// The nested mapping view: intent name → sentence text → path.
    ///
    /// Duplicate normalized sentences within an intent resolve
    /// last-writer-wins, deterministically by enumeration order.
    pub fn by_intent(&self) -> BTreeMap<&str, BTreeMap<&str, &[NodeId]>> {
        let mut out: BTreeMap<&str, BTreeMap<&str, &[NodeId]>> = BTreeMap::new();
        for row in &self.rows {
            out.entry(&row.intent)
                .or_default()
                .insert(&row.text, &row.path);
        }
        out
    }
}

impl Candidates for MemTable {
    fn scan(
        &self,
        visit: &mut dyn FnMut(&ExampleRow) -> ControlFlow<()>,
    ) -> StoreResult<()> {
        for row in &self.rows {
            if visit(row).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn len(&self) -> StoreResult<u64> {
        Ok(self.rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Casing;

    fn row(intent: &str, text: &str, path: &[NodeId]) -> ExampleRow {
        ExampleRow {
            intent: intent.into(),
            text: text.into(),
            path: path.to_vec(),
        }
    }

    #[test]
    fn scan_preserves_insertion_order() {
        let mut table = MemTable::new();
        table.push(row("A", "b sentence", &[0, 1, 2]));
        table.push(row("B", "a sentence", &[0, 3, 2]));

        let mut seen = Vec::new();
        table
            .scan(&mut |r| {
                seen.push(r.text.clone());
                ControlFlow::Continue(())
            })
            .unwrap();
        assert_eq!(seen, vec!["b sentence", "a sentence"]);
    }

    #[test]
    fn from_examples_normalizes_keys() {
        let examples = vec![Ok(Example {
            intent: "Greet".into(),
            text: "Hello, World!".into(),
            path: vec![0, 1, 2],
        })];
        let table =
            MemTable::from_examples(examples, &Normalizer::with_casing(Casing::Lower)).unwrap();
        assert_eq!(table.rows()[0].text, "hello world");
        assert_eq!(table.rows()[0].path, vec![0, 1, 2]);
    }

    #[test]
    fn by_intent_last_writer_wins() {
        let mut table = MemTable::new();
        table.push(row("A", "same text", &[0, 1, 9]));
        table.push(row("A", "same text", &[0, 2, 9]));
        table.push(row("B", "same text", &[0, 3, 9]));

        let view = table.by_intent();
        assert_eq!(view["A"]["same text"], &[0, 2, 9]);
        assert_eq!(view["B"]["same text"], &[0, 3, 9]);
        // The row table itself keeps every row.
        assert_eq!(table.rows().len(), 3);
    }
}
