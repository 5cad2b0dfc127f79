use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to a `.heapsnapshot` JSON file
    pub snapshot: PathBuf,

    /// Output format: text, json
    #[arg(long, default_value = "text")]
    pub format: String,
}

pub async fn run(args: InfoArgs) -> anyhow::Result<()> {
    let graph = super::decode_graph(&args.snapshot).await?;

    let mut type_counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for node in graph.nodes() {
        *type_counts.entry(node.node_type.as_str()).or_default() += 1;
    }

    match args.format.as_str() {
        "json" => {
            let data = serde_json::json!({
                "snapshot": args.snapshot.display().to_string(),
                "nodes": graph.node_count(),
                "edges": graph.edge_count(),
                "gc_roots": graph.gc_root_count(),
                "node_types": type_counts,
            });
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        _ => {
            println!("Snapshot: {}", args.snapshot.display());
            println!("Nodes:    {}", graph.node_count());
            println!("Edges:    {}", graph.edge_count());
            println!("GC roots: {}", graph.gc_root_count());
            println!();
            println!("Node types:");
            for (name, count) in &type_counts {
                println!("  {name}: {count}");
            }
        }
    }
    Ok(())
}
