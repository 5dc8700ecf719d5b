//! # hark
//!
//! Fuzzy-matching intent recognition for voice-assistant style commands.
//! A grammar, compiled externally into a directed word graph, defines every
//! valid phrasing; hark expands that graph into its full set of example
//! sentences and matches arbitrary spoken-style input — misspellings,
//! extra words, reordering and all — against the closed set.
//!
//! ## Architecture
//!
//! - **Intent graph** (`graph`): the compiled grammar as a petgraph DAG,
//!   loaded from the compiler's node-link JSON export
//! - **Example generation** (`graph::generate`): lazy exhaustive expansion
//!   of every start→final path into (intent, sentence, path) examples
//! - **Candidate tables** (`table`): insertion-ordered rows, in memory or
//!   persisted in redb
//! - **Fuzzy recognition** (`fuzzy`): weighted similarity ratio plus a
//!   deterministic cutoff-raising best-match scan
//! - **Normalization** (`normalize`): shared training/query-time text
//!   canonicalization, with fingerprint-based divergence detection
//!
//! ## Library usage
//!
//! ```no_run
//! use hark::fuzzy::{Recognizer, RecognizeOptions};
//! use hark::graph::{IntentGraph, generate::generate_examples};
//! use hark::normalize::{Casing, Normalizer};
//! use hark::table::MemTable;
//!
//! # fn main() -> Result<(), hark::error::HarkError> {
//! let graph = IntentGraph::from_json_file("intent_graph.json".as_ref())?;
//! let normalizer = Normalizer::with_casing(Casing::Lower);
//! let table = MemTable::from_examples(generate_examples(&graph)?, &normalizer)?;
//!
//! let recognizer = Recognizer::new(table, normalizer);
//! let result = recognizer.recognize("turn off the lights", &RecognizeOptions::default())?;
//! println!("{} ({:.2})", result.intent, result.confidence);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fuzzy;
pub mod graph;
pub mod normalize;
pub mod reconstruct;
pub mod table;

pub use error::{HarkError, HarkResult};
pub use fuzzy::{MatchResult, RecognizeOptions, Recognizer};
pub use graph::IntentGraph;
pub use normalize::{Casing, Normalizer};
pub use table::{ExampleDb, ExampleRow, MemTable};
