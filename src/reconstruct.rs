//! Interface boundary to the path-reconstruction collaborator.
//!
//! Turning a matched path back into typed slot/entity values is not this
//! crate's concern; this module only fixes the handoff shape. The
//! recognizer produces a [`MatchResult`](crate::fuzzy::MatchResult) and
//! forwards the caller's converters untouched — it never invokes them.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::fuzzy::MatchResult;
use crate::graph::IntentGraph;

/// A named value converter the reconstruction collaborator may invoke
/// while rebuilding typed slot values (e.g. `"int"`, `"upper"`).
pub type ConverterFn = Arc<dyn Fn(&[Value]) -> Vec<Value> + Send + Sync>;

/// Extra converters passed through recognition opaquely.
pub type ConverterMap = HashMap<String, ConverterFn>;

/// The reconstruction collaborator: walks the matched path through the
/// intent graph and yields whatever structured result it defines.
pub trait Reconstruct {
    /// The collaborator's structured result type.
    type Output;

    /// Rebuild a structured result from a match. `converters` are the
    /// extra converters the caller supplied at recognition time, handed
    /// over uninterpreted.
    fn reconstruct(
        &self,
        graph: &IntentGraph,
        matched: &MatchResult,
        converters: &ConverterMap,
    ) -> Self::Output;
}
