use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use leaktrace_core::analyze::{self, HashObject};
use leaktrace_snapshot::search::SearchBound;

#[derive(Args, Debug)]
pub struct HashesArgs {
    /// Path to a `.heapsnapshot` JSON file
    pub snapshot: PathBuf,

    /// Watched objects as `<name>:<identity-hash>` entries
    #[arg(required = true)]
    pub objects: Vec<String>,

    /// Chains collected per resolved object
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output format: text, json
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Configuration file
    #[arg(long, default_value = "leaktrace.toml")]
    pub config: PathBuf,
}

/// Parse a `<name>:<hash>` entry. The split is on the last colon so names
/// containing colons stay intact.
fn parse_hash_object(entry: &str) -> anyhow::Result<HashObject> {
    let (name, hash_text) = entry
        .rsplit_once(':')
        .with_context(|| format!("Expected <name>:<hash>, got: {entry}"))?;
    let hash = hash_text
        .parse::<u64>()
        .with_context(|| format!("Invalid identity hash in entry: {entry}"))?;
    Ok(HashObject {
        name: name.to_string(),
        hash,
    })
}

pub async fn run(args: HashesArgs) -> anyhow::Result<()> {
    let config = super::load_config(&args.config)?;
    let limit = args.limit.unwrap_or(config.analysis.default_chain_limit);

    let objects = args
        .objects
        .iter()
        .map(|entry| parse_hash_object(entry))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let graph = super::decode_graph(&args.snapshot).await?;
    let report = analyze::find_chains_by_hash_objects(&graph, &objects, SearchBound::MaxChains(limit));

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => {
            if report.is_empty() {
                println!("No watched object resolved to a snapshot node");
            }
            for entry in &report {
                let label = format!("{} (hash {})", entry.name, entry.hash);
                print!("{}", super::render_chains_text(&label, &entry.chains));
                println!();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_entry() {
        let object = parse_hash_object("LeakyService:4242").unwrap();
        assert_eq!(object.name, "LeakyService");
        assert_eq!(object.hash, 4242);
    }

    #[test]
    fn name_may_contain_colons() {
        let object = parse_hash_object("ns::Widget:17").unwrap();
        assert_eq!(object.name, "ns::Widget");
        assert_eq!(object.hash, 17);
    }

    #[test]
    fn rejects_missing_or_bad_hash() {
        assert!(parse_hash_object("NoHashHere").is_err());
        assert!(parse_hash_object("Widget:notanumber").is_err());
    }
}
