//! Fuzzy recognition: find the closest example sentence to arbitrary input.
//!
//! The [`Recognizer`] is a per-session context object holding a candidate
//! table and the session normalizer — no process-wide mutable state. A
//! query normalizes the input, scans candidates in table order, and keeps
//! the best [`score::weighted_ratio`] under a cutoff-raising protocol:
//!
//! - a score equal to the cutoff or above replaces the running best and
//!   raises the cutoff *strictly above* it, so later candidates must beat
//!   (not tie) the best — first candidate with the maximal score wins;
//! - an exact match (score 100) returns immediately;
//! - an empty (possibly filtered) candidate set, or a scan where nothing
//!   reached the initial cutoff, signals [`RecognizeError::NoMatch`].
//!
//! A low score is a valid result, never an error; callers wanting a
//! minimum-confidence threshold set [`RecognizeOptions::min_score`] or
//! filter afterwards.

pub mod score;

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::error::{RecognizeError, RecognizeResult};
use crate::graph::{IntentGraph, NodeId};
use crate::normalize::Normalizer;
use crate::reconstruct::{ConverterMap, Reconstruct};
use crate::table::{Candidates, ExampleRow};

/// Predicate over bare intent names, restricting the candidate set.
pub type IntentFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Per-query options.
#[derive(Default)]
pub struct RecognizeOptions {
    /// Only candidates whose intent satisfies the predicate are scanned.
    pub intent_filter: Option<IntentFilter>,
    /// Initial cutoff: candidates below it are ignored; when nothing
    /// reaches it the query signals `NoMatch`. Zero accepts anything.
    pub min_score: u8,
    /// Score candidates on the rayon thread pool. Results are identical
    /// to the serial scan; worthwhile from a few thousand candidates up.
    pub parallel: bool,
    /// Converters handed through to the reconstruction collaborator,
    /// uninterpreted (see [`crate::reconstruct`]).
    pub extra_converters: ConverterMap,
}

impl RecognizeOptions {
    /// Restrict candidates to intents satisfying `filter`.
    pub fn with_intent_filter(
        mut self,
        filter: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.intent_filter = Some(Arc::new(filter));
        self
    }
}

impl std::fmt::Debug for RecognizeOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognizeOptions")
            .field("intent_filter", &self.intent_filter.is_some())
            .field("min_score", &self.min_score)
            .field("parallel", &self.parallel)
            .field("extra_converters", &self.extra_converters.len())
            .finish()
    }
}

/// The winning candidate for a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Intent of the winning example.
    pub intent: String,
    /// The winning example sentence (normalized form).
    pub text: String,
    /// Graph path of the winning example, in upstream node ids.
    pub path: Vec<NodeId>,
    /// Similarity score, 0–100.
    pub score: u8,
    /// `score / 100`.
    pub confidence: f64,
    /// Wall-clock duration of the match.
    pub recognize_seconds: f64,
}

/// Fuzzy recognizer over a candidate table.
///
/// Read-only against the table; rebuild-on-retrain is done by constructing
/// a fresh recognizer over a fresh table and swapping, never by mutating a
/// table under live queries.
#[derive(Debug)]
pub struct Recognizer<T: Candidates> {
    table: T,
    normalizer: Normalizer,
}

impl<T: Candidates> Recognizer<T> {
    /// Recognizer over `table`, normalizing queries with `normalizer`.
    ///
    /// The normalizer must match the one the table's keys were built with;
    /// see [`crate::table::ExampleDb::check_normalizer`].
    pub fn new(table: T, normalizer: Normalizer) -> Self {
        Self { table, normalizer }
    }

    /// The underlying candidate table.
    pub fn table(&self) -> &T {
        &self.table
    }

    /// Find the single best-matching example for `input`.
    pub fn recognize(
        &self,
        input: &str,
        options: &RecognizeOptions,
    ) -> RecognizeResult<MatchResult> {
        let started = Instant::now();
        let query = self.normalizer.apply(input);

        let best = if options.parallel {
            self.scan_parallel(&query, options)?
        } else {
            self.scan_serial(&query, options)?
        };

        let (row, matched) = best.ok_or(RecognizeError::NoMatch)?;
        tracing::debug!(input = %query, matched = %row.text, score = matched, "best match");

        Ok(MatchResult {
            intent: row.intent,
            text: row.text,
            path: row.path,
            score: matched,
            confidence: f64::from(matched) / 100.0,
            recognize_seconds: started.elapsed().as_secs_f64(),
        })
    }

    /// Recognize, then hand the match to the reconstruction collaborator
    /// with the caller's converters passed through opaquely.
    pub fn recognize_with<R: Reconstruct>(
        &self,
        input: &str,
        options: &RecognizeOptions,
        graph: &IntentGraph,
        reconstructor: &R,
    ) -> RecognizeResult<(MatchResult, R::Output)> {
        let matched = self.recognize(input, options)?;
        let output = reconstructor.reconstruct(graph, &matched, &options.extra_converters);
        Ok((matched, output))
    }

    fn scan_serial(
        &self,
        query: &str,
        options: &RecognizeOptions,
    ) -> RecognizeResult<Option<(ExampleRow, u8)>> {
        let query_len = query.chars().count();
        let mut cutoff = options.min_score;
        let mut best: Option<(ExampleRow, u8)> = None;

        self.table.scan(&mut |row| {
            if let Some(filter) = &options.intent_filter
                && !filter(&row.intent)
            {
                return ControlFlow::Continue(());
            }
            // Cheap length bound: skip candidates that cannot reach the cutoff.
            if score::weighted_upper_bound(query_len, row.text.chars().count()) < cutoff {
                return ControlFlow::Continue(());
            }
            let s = score::weighted_ratio(query, &row.text);
            if s >= cutoff {
                let exact = s == score::EXACT;
                best = Some((row.clone(), s));
                if exact {
                    // First exact match wins; no further scanning.
                    return ControlFlow::Break(());
                }
                // Later candidates must strictly exceed the current best.
                cutoff = s + 1;
            }
            ControlFlow::Continue(())
        })?;

        Ok(best)
    }

    /// Parallel variant: score a row snapshot on the rayon pool, then
    /// reduce sequentially in row order with the identical cutoff protocol,
    /// so results are bit-identical to the serial scan.
    fn scan_parallel(
        &self,
        query: &str,
        options: &RecognizeOptions,
    ) -> RecognizeResult<Option<(ExampleRow, u8)>> {
        use rayon::prelude::*;

        let mut rows = self.table.collect_rows()?;
        if let Some(filter) = &options.intent_filter {
            rows.retain(|row| filter(&row.intent));
        }

        let scores: Vec<u8> = rows
            .par_iter()
            .map(|row| score::weighted_ratio(query, &row.text))
            .collect();

        let mut cutoff = options.min_score;
        let mut best: Option<(usize, u8)> = None;
        for (i, &s) in scores.iter().enumerate() {
            if s >= cutoff {
                best = Some((i, s));
                if s == score::EXACT {
                    break;
                }
                cutoff = s + 1;
            }
        }

        Ok(best.map(|(i, s)| (rows.swap_remove(i), s)))
    }
}
