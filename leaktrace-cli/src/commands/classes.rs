use std::path::PathBuf;

use clap::Args;

use leaktrace_core::analyze;
use leaktrace_snapshot::search::SearchBound;

#[derive(Args, Debug)]
pub struct ClassesArgs {
    /// Path to a `.heapsnapshot` JSON file
    pub snapshot: PathBuf,

    /// Class names to report on
    #[arg(required = true)]
    pub classes: Vec<String>,

    /// Chains collected per matched instance
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output format: text, json
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Configuration file
    #[arg(long, default_value = "leaktrace.toml")]
    pub config: PathBuf,
}

pub async fn run(args: ClassesArgs) -> anyhow::Result<()> {
    let config = super::load_config(&args.config)?;
    let limit = args.limit.unwrap_or(config.analysis.default_chain_limit);

    let graph = super::decode_graph(&args.snapshot).await?;
    let report = analyze::find_chains_for_classes(&graph, &args.classes, SearchBound::MaxChains(limit));

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => {
            for (class, chains) in &report {
                print!("{}", super::render_chains_text(class, chains));
                println!();
            }
        }
    }
    Ok(())
}
