//! Rich diagnostic error types for hark.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for hark.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, source spans) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum HarkError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Recognize(#[from] RecognizeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

/// Result type for top-level operations.
pub type HarkResult<T> = std::result::Result<T, HarkError>;

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

/// Errors from loading or enumerating an intent graph.
///
/// All variants are fatal: a malformed grammar graph cannot be trained
/// against and must be fixed upstream, not retried.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("graph has {starts} start node(s) and {finals} final node(s)")]
    #[diagnostic(
        code(hark::graph::missing_start_end),
        help(
            "An intent graph must have exactly one node marked `start` and one \
             marked `final`. Re-export the graph from the grammar compiler; \
             a partial or hand-edited export is the usual cause."
        )
    )]
    MissingStartEnd { starts: usize, finals: usize },

    #[error("path from node {from} to node {to} has no intent label on its first edge")]
    #[diagnostic(
        code(hark::graph::missing_intent_label),
        help(
            "Every path leaving the start node must begin with an edge whose \
             output label has the form `__label__<IntentName>`. The grammar \
             compiler emits this automatically; its absence means the graph \
             is malformed or was produced by an incompatible version."
        )
    )]
    MissingIntentLabel { from: u64, to: u64 },

    #[error("degenerate path: start node {from} connects directly to final node {to}")]
    #[diagnostic(
        code(hark::graph::degenerate_path),
        help(
            "A start→final path must pass through at least one intermediate \
             node; a direct edge would render an empty sentence. The grammar \
             that compiled to this graph has an empty template."
        )
    )]
    DegeneratePath { from: u64, to: u64 },

    #[error("node {id} referenced by an edge does not exist")]
    #[diagnostic(
        code(hark::graph::unknown_node),
        help("The node-link JSON references a node id missing from the `nodes` array.")
    )]
    UnknownNode { id: u64 },

    #[error("failed to parse intent graph JSON: {source}")]
    #[diagnostic(
        code(hark::graph::json),
        help(
            "The graph file must be node-link JSON with `nodes` and `links` \
             arrays, as exported by the grammar compiler."
        )
    )]
    Json {
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error reading intent graph: {source}")]
    #[diagnostic(
        code(hark::graph::io),
        help("Check that the graph file exists and is readable.")
    )]
    Io {
        #[source]
        source: std::io::Error,
    },
}

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

// ---------------------------------------------------------------------------
// Recognition errors
// ---------------------------------------------------------------------------

/// Errors from the fuzzy recognizer.
///
/// `NoMatch` is recoverable and expected in batch use; a low-confidence
/// match is *not* an error and is returned as a normal result.
#[derive(Debug, Error, Diagnostic)]
pub enum RecognizeError {
    #[error("no candidate sentences to match against")]
    #[diagnostic(
        code(hark::fuzzy::no_match),
        help(
            "The candidate set is empty after intent filtering. Either the \
             examples table has no rows, or the intent filter excluded every \
             intent. Retrain, or relax the filter."
        )
    )]
    NoMatch,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

/// Result type for recognition operations.
pub type RecognizeResult<T> = std::result::Result<T, RecognizeError>;

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Errors from the persisted examples table.
///
/// Fatal per-operation; retry policy belongs to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(hark::store::io),
        help(
            "A filesystem operation failed. Check that the database path \
             exists, has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("examples database error: {message}")]
    #[diagnostic(
        code(hark::store::redb),
        help(
            "The redb examples database could not be read or written. If the \
             file is corrupt or was written by an incompatible version, delete \
             it and retrain."
        )
    )]
    Redb { message: String },

    #[error("corrupt example row {row}: {source}")]
    #[diagnostic(
        code(hark::store::corrupt_row),
        help("A stored row failed to decode. Delete the database and retrain.")
    )]
    CorruptRow {
        row: u64,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
