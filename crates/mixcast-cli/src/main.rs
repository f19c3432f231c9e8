//! mixcast CLI.
//!
//! Provides the `mixcast` binary for working with JSON-serialized
//! computation graphs. `convert` rewrites the designated nodes to bfloat16
//! and inserts casts at the precision boundaries; `check` validates a
//! graph's structure without rewriting it.
//!
//! Uses the same `mixcast_rewrite::convert()` pipeline as library callers,
//! ensuring identical rewriting behavior from both entry points.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use mixcast_core::GraphDef;
use mixcast_rewrite::{convert, ConversionPolicy, RewriteMode};

/// Precision-conversion graph rewriter.
#[derive(Parser)]
#[command(name = "mixcast", about = "bfloat16 precision-conversion graph rewriter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Rewrite allow-listed nodes to bfloat16, inserting boundary casts.
    Convert {
        /// Path to the input graph (JSON).
        #[arg(short, long)]
        input: PathBuf,

        /// Path for the rewritten graph (JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Node to convert (repeatable).
        #[arg(short, long = "allow")]
        allow: Vec<String>,

        /// Node to keep in float32 (repeatable). Wins over --allow.
        #[arg(short, long = "deny")]
        deny: Vec<String>,

        /// Convert every supported operator except denied ones; ignores
        /// the allow list.
        #[arg(long)]
        force: bool,
    },

    /// Validate a graph: unique names, resolvable inputs, acyclicity.
    Check {
        /// Path to the graph (JSON).
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Convert {
            input,
            output,
            allow,
            deny,
            force,
        } => run_convert(&input, output.as_deref(), allow, deny, force),
        Commands::Check { input } => run_check(&input),
    };
    process::exit(exit_code);
}

fn load_graph(path: &std::path::Path) -> Result<GraphDef, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&data).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
}

fn run_convert(
    input: &std::path::Path,
    output: Option<&std::path::Path>,
    allow: Vec<String>,
    deny: Vec<String>,
    force: bool,
) -> i32 {
    let graph = match load_graph(input) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    let policy = ConversionPolicy::new(allow, deny);
    let mode = if force {
        RewriteMode::Force
    } else {
        RewriteMode::Selective
    };

    let rewritten = match convert(&graph, &policy, mode) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    let json = match serde_json::to_string_pretty(&rewritten) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("error: failed to serialize output: {}", e);
            return 1;
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = fs::write(path, json) {
                eprintln!("error: failed to write {}: {}", path.display(), e);
                return 1;
            }
            tracing::info!(
                nodes = rewritten.nodes.len(),
                output = %path.display(),
                "graph rewritten"
            );
        }
        None => println!("{}", json),
    }
    0
}

fn run_check(input: &std::path::Path) -> i32 {
    let graph = match load_graph(input) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    let index = match graph.index() {
        Ok(index) => index,
        Err(e) => {
            eprintln!("invalid graph: {}", e);
            return 1;
        }
    };
    if let Err(e) = index.validate() {
        eprintln!("invalid graph: {}", e);
        return 1;
    }

    println!("ok: {} nodes", index.len());
    0
}
