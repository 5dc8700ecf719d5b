//! hark CLI: train and query the fuzzy intent recognizer.

use std::collections::HashSet;
use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use hark::fuzzy::{RecognizeOptions, Recognizer};
use hark::graph::{IntentGraph, generate::generate_examples};
use hark::normalize::{Casing, Normalizer};
use hark::table::{ExampleDb, MemTable};

#[derive(Parser)]
#[command(name = "hark", version, about = "Fuzzy-matching intent recognizer")]
struct Cli {
    /// Print DEBUG messages to the console.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate intent examples from a compiled grammar graph.
    Train {
        /// Path to the intent graph JSON file; read from stdin when omitted.
        #[arg(long)]
        graph: Option<PathBuf>,

        /// Path to write the examples database; JSON to stdout when omitted.
        #[arg(long)]
        examples: Option<PathBuf>,

        /// Case transformation applied to example sentences.
        #[arg(long, value_enum, default_value = "ignore")]
        casing: CasingArg,
    },

    /// Do intent recognition on query text.
    Recognize {
        /// Path to the examples database written by `train`.
        #[arg(long)]
        examples: PathBuf,

        /// Path to the intent graph JSON file. When given, matched paths
        /// are checked against the graph.
        #[arg(long)]
        graph: Option<PathBuf>,

        /// Case transformation applied to query text (must match training).
        #[arg(long, value_enum, default_value = "ignore")]
        casing: CasingArg,

        /// Restrict matching to these intents (repeatable).
        #[arg(long)]
        intent: Vec<String>,

        /// Minimum score (0-100); queries scoring below signal no match.
        #[arg(long, default_value = "0")]
        min_score: u8,

        /// Score candidates in parallel.
        #[arg(long)]
        parallel: bool,

        /// Query input sentences; read from stdin when omitted.
        query: Vec<String>,
    },
}

/// Case transformation choices, mapped onto [`Casing`].
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CasingArg {
    Lower,
    Upper,
    Ignore,
}

impl From<CasingArg> for Casing {
    fn from(arg: CasingArg) -> Self {
        match arg {
            CasingArg::Lower => Casing::Lower,
            CasingArg::Upper => Casing::Upper,
            CasingArg::Ignore => Casing::Ignore,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Train {
            graph,
            examples,
            casing,
        } => train(graph, examples, casing.into()),
        Commands::Recognize {
            examples,
            graph,
            casing,
            intent,
            min_score,
            parallel,
            query,
        } => recognize(examples, graph, casing.into(), intent, min_score, parallel, query),
    }
}

fn load_graph(path: Option<&PathBuf>) -> Result<IntentGraph> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading intent graph");
            Ok(IntentGraph::from_json_file(path)?)
        }
        None => {
            let stdin = std::io::stdin();
            if stdin.is_terminal() {
                eprintln!("Reading intent graph JSON from stdin...");
            }
            Ok(IntentGraph::from_json_reader(stdin.lock())?)
        }
    }
}

fn train(graph: Option<PathBuf>, examples: Option<PathBuf>, casing: Casing) -> Result<()> {
    let graph = load_graph(graph.as_ref())?;
    let normalizer = Normalizer::with_casing(casing);
    let table = MemTable::from_examples(generate_examples(&graph)?, &normalizer)?;

    match examples {
        Some(path) => {
            let db = ExampleDb::open(&path)?;
            let rows = db.replace_rows(table.rows(), &normalizer)?;
            tracing::info!(rows, path = %path.display(), "wrote examples database");
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            serde_json::to_writer(&mut out, &table.by_intent()).into_diagnostic()?;
            writeln!(out).into_diagnostic()?;
        }
    }
    Ok(())
}

fn recognize(
    examples: PathBuf,
    graph: Option<PathBuf>,
    casing: Casing,
    intents: Vec<String>,
    min_score: u8,
    parallel: bool,
    queries: Vec<String>,
) -> Result<()> {
    let normalizer = Normalizer::with_casing(casing);

    tracing::debug!(path = %examples.display(), "loading examples database");
    let db = ExampleDb::open(&examples)?;
    db.check_normalizer(&normalizer)?;

    let graph = graph.map(|path| load_graph(Some(&path))).transpose()?;
    let recognizer = Recognizer::new(db, normalizer);

    let mut options = RecognizeOptions {
        min_score,
        parallel,
        ..Default::default()
    };
    if !intents.is_empty() {
        let allowed: HashSet<String> = intents.into_iter().collect();
        options = options.with_intent_filter(move |name| allowed.contains(name));
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let mut process = |sentence: &str| -> Result<()> {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            return Ok(());
        }
        match recognizer.recognize(sentence, &options) {
            Ok(result) => {
                if let Some(graph) = &graph {
                    for &id in &result.path {
                        if graph.index_of(id).is_err() {
                            tracing::warn!(id, "matched path references a node missing from the graph");
                        }
                    }
                }
                let mut line = serde_json::to_value(&result).into_diagnostic()?;
                line["raw_text"] = serde_json::Value::String(sentence.to_string());
                serde_json::to_writer(&mut out, &line).into_diagnostic()?;
            }
            // A batch keeps going past unmatchable inputs.
            Err(hark::error::RecognizeError::NoMatch) => {
                serde_json::to_writer(&mut out, &serde_json::json!({})).into_diagnostic()?;
            }
            Err(e) => return Err(e.into()),
        }
        writeln!(out).into_diagnostic()?;
        out.flush().into_diagnostic()?;
        Ok(())
    };

    if queries.is_empty() {
        let stdin = std::io::stdin();
        if stdin.is_terminal() {
            eprintln!("Reading queries from stdin...");
        }
        for line in stdin.lock().lines() {
            let line = line.into_diagnostic()?;
            process(&line)?;
        }
    } else {
        for sentence in &queries {
            process(sentence)?;
        }
    }
    Ok(())
}
