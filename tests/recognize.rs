//! End-to-end recognition tests: graph → examples → table → recognizer.
//!
//! These exercise the full pipeline the way a voice-assistant host would
//! drive it: build an intent graph (as the grammar compiler's export
//! would), expand it into examples, and query with clean, misspelled, and
//! unrelated input.

use hark::error::RecognizeError;
use hark::fuzzy::{MatchResult, RecognizeOptions, Recognizer};
use hark::graph::generate::generate_examples;
use hark::graph::{Edge, IntentGraph, Node};
use hark::normalize::{Casing, Normalizer};
use hark::reconstruct::{ConverterMap, Reconstruct};
use hark::table::MemTable;

/// `[TestIntent] this is a test` — one intent, one sentence.
fn single_sentence_graph() -> IntentGraph {
    let mut g = IntentGraph::new();
    g.add_node(Node::structural(0).with_start());
    g.add_node(Node::word(1, "this"));
    g.add_node(Node::word(2, "is"));
    g.add_node(Node::word(3, "a"));
    g.add_node(Node::word(4, "test"));
    g.add_node(Node::structural(5).with_final());
    g.add_edge(Edge::labeled(0, 1, "__label__TestIntent")).unwrap();
    g.add_edge(Edge::new(1, 2)).unwrap();
    g.add_edge(Edge::new(2, 3)).unwrap();
    g.add_edge(Edge::new(3, 4)).unwrap();
    g.add_edge(Edge::new(4, 5)).unwrap();
    g
}

/// Two intents rendering the identical sentence "this is a test".
/// TestIntent1's path enumerates first.
fn duplicate_sentence_graph() -> IntentGraph {
    let mut g = IntentGraph::new();
    g.add_node(Node::structural(0).with_start());
    // TestIntent1 branch
    g.add_node(Node::word(1, "this"));
    g.add_node(Node::word(2, "is"));
    g.add_node(Node::word(3, "a"));
    g.add_node(Node::word(4, "test"));
    // TestIntent2 branch
    g.add_node(Node::word(5, "this"));
    g.add_node(Node::word(6, "is"));
    g.add_node(Node::word(7, "a"));
    g.add_node(Node::word(8, "test"));
    g.add_node(Node::structural(9).with_final());
    g.add_edge(Edge::labeled(0, 1, "__label__TestIntent1")).unwrap();
    g.add_edge(Edge::new(1, 2)).unwrap();
    g.add_edge(Edge::new(2, 3)).unwrap();
    g.add_edge(Edge::new(3, 4)).unwrap();
    g.add_edge(Edge::new(4, 9)).unwrap();
    g.add_edge(Edge::labeled(0, 5, "__label__TestIntent2")).unwrap();
    g.add_edge(Edge::new(5, 6)).unwrap();
    g.add_edge(Edge::new(6, 7)).unwrap();
    g.add_edge(Edge::new(7, 8)).unwrap();
    g.add_edge(Edge::new(8, 9)).unwrap();
    g
}

fn recognizer_for(graph: &IntentGraph) -> Recognizer<MemTable> {
    let normalizer = Normalizer::with_casing(Casing::Lower);
    let table = MemTable::from_examples(generate_examples(graph).unwrap(), &normalizer).unwrap();
    Recognizer::new(table, normalizer)
}

#[test]
fn single_sentence_exact_match() {
    let graph = single_sentence_graph();
    let recognizer = recognizer_for(&graph);

    let result = recognizer
        .recognize("this is a test", &RecognizeOptions::default())
        .unwrap();
    assert_eq!(result.intent, "TestIntent");
    assert_eq!(result.text, "this is a test");
    assert_eq!(result.score, 100);
    assert_eq!(result.confidence, 1.0);
    assert_eq!(result.path, vec![0, 1, 2, 3, 4, 5]);
    assert!(result.recognize_seconds >= 0.0);
}

#[test]
fn misspellings_lower_confidence_keep_path() {
    let graph = single_sentence_graph();
    let recognizer = recognizer_for(&graph);

    for sentence in ["this is a bad test", "this iz b tst"] {
        let result = recognizer
            .recognize(sentence, &RecognizeOptions::default())
            .unwrap();
        assert!(result.confidence < 1.0, "{sentence} should not match exactly");
        assert_eq!(result.path, vec![0, 1, 2, 3, 4, 5]);
    }
}

#[test]
fn disjoint_vocabulary_still_scores() {
    let graph = single_sentence_graph();
    let recognizer = recognizer_for(&graph);

    // No threshold rejection in the core: a defined low score, not an error.
    let result = recognizer
        .recognize("completely unrelated phrase", &RecognizeOptions::default())
        .unwrap();
    assert!(result.score < 100);
    assert_eq!(result.path, vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn progressive_edits_degrade_monotonically() {
    let graph = single_sentence_graph();
    let recognizer = recognizer_for(&graph);
    let options = RecognizeOptions::default();

    let s0 = recognizer.recognize("this is a test", &options).unwrap().score;
    let s1 = recognizer.recognize("this is a tesk", &options).unwrap().score;
    let s2 = recognizer.recognize("this is q tesk", &options).unwrap().score;
    let s3 = recognizer.recognize("thiz is q tesk", &options).unwrap().score;
    assert_eq!(s0, 100);
    assert!(s1 <= s0);
    assert!(s2 <= s1);
    assert!(s3 <= s2);
}

#[test]
fn identical_sentences_tie_break_to_first_inserted() {
    let graph = duplicate_sentence_graph();
    let recognizer = recognizer_for(&graph);

    let result = recognizer
        .recognize("this is a test", &RecognizeOptions::default())
        .unwrap();
    assert_eq!(result.intent, "TestIntent1");
    assert_eq!(result.path, vec![0, 1, 2, 3, 4, 9]);
}

#[test]
fn intent_filter_selects_other_duplicate() {
    let graph = duplicate_sentence_graph();
    let recognizer = recognizer_for(&graph);

    let options = RecognizeOptions::default().with_intent_filter(|name| name == "TestIntent2");
    let result = recognizer.recognize("this is a test", &options).unwrap();
    assert_eq!(result.intent, "TestIntent2");
    assert_eq!(result.score, 100);
    assert_eq!(result.path, vec![0, 5, 6, 7, 8, 9]);
}

#[test]
fn filter_excluding_everything_is_no_match() {
    let graph = duplicate_sentence_graph();
    let recognizer = recognizer_for(&graph);

    let options = RecognizeOptions::default().with_intent_filter(|name| name == "Absent");
    assert!(matches!(
        recognizer.recognize("this is a test", &options),
        Err(RecognizeError::NoMatch)
    ));
}

#[test]
fn repeated_queries_identical_results() {
    let graph = duplicate_sentence_graph();
    let recognizer = recognizer_for(&graph);
    let options = RecognizeOptions::default();

    let first = recognizer.recognize("this iz a test", &options).unwrap();
    for _ in 0..10 {
        let again = recognizer.recognize("this iz a test", &options).unwrap();
        assert_eq!(again.intent, first.intent);
        assert_eq!(again.text, first.text);
        assert_eq!(again.path, first.path);
        assert_eq!(again.score, first.score);
    }
}

#[test]
fn normalization_applies_to_queries() {
    let graph = single_sentence_graph();
    let recognizer = recognizer_for(&graph);

    // Casing::Lower plus punctuation stripping at query time.
    let result = recognizer
        .recognize("  THIS is, a TEST!  ", &RecognizeOptions::default())
        .unwrap();
    assert_eq!(result.score, 100);
}

/// Minimal reconstruction collaborator: resolves the intent from the
/// path's first edge and records which converters it was handed.
struct IntentOnly;

impl Reconstruct for IntentOnly {
    type Output = (String, Vec<String>);

    fn reconstruct(
        &self,
        graph: &IntentGraph,
        matched: &MatchResult,
        converters: &ConverterMap,
    ) -> Self::Output {
        let first = graph.index_of(matched.path[0]).unwrap();
        let second = graph.index_of(matched.path[1]).unwrap();
        let label = graph.olabel(first, second).unwrap();
        let mut names: Vec<String> = converters.keys().cloned().collect();
        names.sort();
        (label.strip_prefix("__label__").unwrap().to_string(), names)
    }
}

#[test]
fn reconstruction_handoff_passes_converters_through() {
    use std::sync::Arc;

    let graph = single_sentence_graph();
    let recognizer = recognizer_for(&graph);

    let mut options = RecognizeOptions::default();
    options.extra_converters.insert(
        "square".to_string(),
        Arc::new(|args: &[serde_json::Value]| {
            args.iter()
                .map(|v| serde_json::json!(v.as_i64().unwrap_or(0).pow(2)))
                .collect()
        }),
    );

    let (matched, (intent, converter_names)) = recognizer
        .recognize_with("this is a test", &options, &graph, &IntentOnly)
        .unwrap();
    assert_eq!(matched.score, 100);
    // The collaborator saw the converters; the core never invoked them.
    assert_eq!(intent, "TestIntent");
    assert_eq!(converter_names, vec!["square".to_string()]);
}

#[test]
fn branching_grammar_is_fully_enumerated_and_matchable() {
    // [ChangeLight] turn (on | off) the (light | lamp)
    let mut g = IntentGraph::new();
    g.add_node(Node::structural(0).with_start());
    g.add_node(Node::word(1, "turn"));
    g.add_node(Node::word(2, "on"));
    g.add_node(Node::word(3, "off"));
    g.add_node(Node::word(4, "the"));
    g.add_node(Node::word(5, "light"));
    g.add_node(Node::word(6, "lamp"));
    g.add_node(Node::structural(7).with_final());
    g.add_edge(Edge::labeled(0, 1, "__label__ChangeLight")).unwrap();
    g.add_edge(Edge::new(1, 2)).unwrap();
    g.add_edge(Edge::new(1, 3)).unwrap();
    g.add_edge(Edge::new(2, 4)).unwrap();
    g.add_edge(Edge::new(3, 4)).unwrap();
    g.add_edge(Edge::new(4, 5)).unwrap();
    g.add_edge(Edge::new(4, 6)).unwrap();
    g.add_edge(Edge::new(5, 7)).unwrap();
    g.add_edge(Edge::new(6, 7)).unwrap();

    let recognizer = recognizer_for(&g);
    assert_eq!(recognizer.table().rows().len(), 4);

    for phrase in [
        "turn on the light",
        "turn off the light",
        "turn on the lamp",
        "turn off the lamp",
    ] {
        let result = recognizer
            .recognize(phrase, &RecognizeOptions::default())
            .unwrap();
        assert_eq!(result.score, 100, "{phrase}");
        assert_eq!(result.text, phrase);
    }
}
