use clap::Parser;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "leaktrace",
    version,
    about = "Analyze heap snapshots: why is this object still alive?"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Classify an error into an exit code.
///
/// Exit codes:
///   0 — success
///   1 — general/unknown error
///   2 — configuration error
///   3 — snapshot file not found / unreadable
///   4 — snapshot parse or schema error
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    let msg = format!("{err:#}");
    let lower = msg.to_lowercase();

    if lower.contains("config") {
        2
    } else if lower.contains("no such file")
        || lower.contains("not found")
        || lower.contains("permission denied")
    {
        3
    } else if lower.contains("parse error") || lower.contains("schema error") {
        4
    } else {
        1
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Failed to create runtime: {e}");
            std::process::exit(1);
        }
    };

    match runtime.block_on(commands::run(cli.command)) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_missing_file() {
        let err = anyhow::anyhow!("IO error: No such file or directory (os error 2)");
        assert_eq!(classify_exit_code(&err), 3);
    }

    #[test]
    fn exit_code_parse_error() {
        let err = anyhow::anyhow!("Parse error at line 3, column 9: expected value");
        assert_eq!(classify_exit_code(&err), 4);
    }

    #[test]
    fn exit_code_schema_error() {
        let err = anyhow::anyhow!("Schema error: node buffer present but node_fields is empty");
        assert_eq!(classify_exit_code(&err), 4);
    }

    #[test]
    fn exit_code_config() {
        let err = anyhow::anyhow!("Configuration error: Parse error: bad toml");
        assert_eq!(classify_exit_code(&err), 2);
    }

    #[test]
    fn exit_code_general() {
        let err = anyhow::anyhow!("Something unexpected happened");
        assert_eq!(classify_exit_code(&err), 1);
    }
}
