pub mod chains;
pub mod classes;
pub mod hashes;
pub mod info;
pub mod translate;

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Subcommand;
use indicatif::{ProgressBar, ProgressStyle};

use leaktrace_core::{LeaktraceConfig, TaskRegistry};
use leaktrace_snapshot::search::{ChainEndpoint, ChainLink};
use leaktrace_snapshot::HeapGraph;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find shortest retaining chains for nodes matching a display name
    Chains(chains::ChainsArgs),
    /// Batch retaining-chain report for a list of class names
    Classes(classes::ClassesArgs),
    /// Batch retaining-chain report for watched objects by identity hash
    Hashes(hashes::HashesArgs),
    /// Translate a raw binary capture into a JSON snapshot
    Translate(translate::TranslateArgs),
    /// Summarize a snapshot: node/edge counts, GC roots, schema
    Info(info::InfoArgs),
}

pub async fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Chains(args) => chains::run(args).await,
        Command::Classes(args) => classes::run(args).await,
        Command::Hashes(args) => hashes::run(args).await,
        Command::Translate(args) => translate::run(args).await,
        Command::Info(args) => info::run(args).await,
    }
}

pub(crate) fn load_config(path: &Path) -> anyhow::Result<LeaktraceConfig> {
    LeaktraceConfig::load_or_default(path)
        .with_context(|| format!("Configuration error in {}", path.display()))
}

/// Decode the snapshot at `path` into a graph, with a spinner while the
/// decode runs on a blocking worker.
pub(crate) async fn decode_graph(path: &Path) -> anyhow::Result<Arc<HeapGraph>> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Decoding {}", path.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let registry = Arc::new(TaskRegistry::new());
    let result = registry.create_task_async(path.to_path_buf()).await;
    spinner.finish_and_clear();

    let id = result.with_context(|| format!("Cannot load snapshot: {}", path.display()))?;
    let graph = registry.require_task(id)?;
    registry.destroy_task(id);
    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        roots = graph.gc_root_count(),
        "snapshot ready"
    );
    Ok(graph)
}

// ── Chain rendering ─────────────────────────────────────────────

fn endpoint_label(endpoint: &ChainEndpoint) -> String {
    let mut label = format!(
        "{} [{}] (id {})",
        endpoint.name,
        endpoint.node_type.as_str(),
        endpoint.id
    );
    if !endpoint.path.is_empty() {
        let _ = write!(label, " {}:{}", endpoint.path, endpoint.line);
    }
    label
}

/// Render one chain holder-first: links are recorded target-first during
/// the search, so the walk here is reversed.
pub(crate) fn render_chain_text(out: &mut String, index: usize, chain: &[ChainLink]) {
    let _ = writeln!(out, "Chain {} ({} links):", index + 1, chain.len());
    if let Some(root_link) = chain.last() {
        let _ = writeln!(out, "  {}", endpoint_label(&root_link.referrer));
    }
    for link in chain.iter().rev() {
        let _ = writeln!(
            out,
            "    --{}--> {}",
            link.edge_type.as_str(),
            endpoint_label(&link.node)
        );
    }
}

pub(crate) fn render_chains_text(name: &str, chains: &[Vec<ChainLink>]) -> String {
    let mut out = String::new();
    if chains.is_empty() {
        let _ = writeln!(out, "{name}: no retaining chains found");
        return out;
    }
    let _ = writeln!(out, "{name}: {} retaining chain(s)", chains.len());
    for (i, chain) in chains.iter().enumerate() {
        render_chain_text(&mut out, i, chain);
    }
    out
}
