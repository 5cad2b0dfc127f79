use std::path::PathBuf;

use clap::Args;

use leaktrace_core::analyze;
use leaktrace_snapshot::search::SearchBound;

#[derive(Args, Debug)]
pub struct ChainsArgs {
    /// Path to a `.heapsnapshot` JSON file
    pub snapshot: PathBuf,

    /// Display name of the object(s) to explain
    pub name: String,

    /// Single-shortest-path mode: cap the chain at this many links
    #[arg(long, conflicts_with = "limit")]
    pub depth: Option<usize>,

    /// Multi-path mode: collect up to this many shortest chains
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output format: text, json
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Configuration file
    #[arg(long, default_value = "leaktrace.toml")]
    pub config: PathBuf,
}

pub async fn run(args: ChainsArgs) -> anyhow::Result<()> {
    let config = super::load_config(&args.config)?;
    let bound = match (args.depth, args.limit) {
        (Some(depth), _) => SearchBound::MaxDepth(depth),
        (None, Some(limit)) => SearchBound::MaxChains(limit),
        (None, None) => SearchBound::MaxDepth(config.analysis.default_max_depth),
    };

    let graph = super::decode_graph(&args.snapshot).await?;
    let chains = analyze::find_chains_by_node_name(&graph, &args.name, bound);

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&chains)?),
        _ => print!("{}", super::render_chains_text(&args.name, &chains)),
    }
    Ok(())
}
