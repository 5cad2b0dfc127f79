use std::path::PathBuf;

use clap::Args;

use leaktrace_core::translate::{CommandTranslator, RawCaptureTranslator};

#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Raw binary capture file
    pub raw: PathBuf,

    /// Output path for the translated JSON snapshot
    pub output: PathBuf,

    /// Translator executable, invoked as `<command> <raw> <output>`
    #[arg(long)]
    pub command: Option<String>,

    /// Configuration file
    #[arg(long, default_value = "leaktrace.toml")]
    pub config: PathBuf,
}

pub async fn run(args: TranslateArgs) -> anyhow::Result<()> {
    let config = super::load_config(&args.config)?;
    let command = args
        .command
        .or(config.translator.command)
        .ok_or(leaktrace_core::error::TranslateError::NotConfigured)?;

    let translator = CommandTranslator::new(command);
    translator.translate(&args.raw, &args.output)?;
    println!("Translated {} -> {}", args.raw.display(), args.output.display());
    Ok(())
}
