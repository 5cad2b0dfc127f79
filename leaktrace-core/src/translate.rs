// Raw-capture translation boundary.
//
// Device captures arrive as a proprietary binary dump; an external
// translator converts them into the JSON snapshot format before analysis.
// The core never inspects the binary format — it only consumes the
// translator's JSON output through the decoder.

use std::path::Path;

use tracing::info;

use crate::error::TranslateError;
use crate::tasks::{TaskId, TaskRegistry};
use crate::Result;

/// Opaque collaborator turning a raw binary capture into a JSON snapshot
/// file consumable by the decoder.
pub trait RawCaptureTranslator {
    fn translate(&self, input: &Path, output: &Path) -> std::result::Result<(), TranslateError>;
}

/// Translator backed by an external executable, invoked as
/// `<command> <input> <output>`.
#[derive(Debug, Clone)]
pub struct CommandTranslator {
    command: String,
}

impl CommandTranslator {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl RawCaptureTranslator for CommandTranslator {
    fn translate(&self, input: &Path, output: &Path) -> std::result::Result<(), TranslateError> {
        info!(command = %self.command, input = %input.display(), "translating raw capture");
        let status = std::process::Command::new(&self.command)
            .arg(input)
            .arg(output)
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(TranslateError::CommandFailed {
                command: self.command.clone(),
                status: status.code().unwrap_or(-1),
            })
        }
    }
}

/// Translate a raw capture, then register the resulting snapshot as a new
/// analysis task. A translation failure registers nothing.
pub fn create_task_from_raw(
    registry: &TaskRegistry,
    translator: &dyn RawCaptureTranslator,
    raw_path: &Path,
    json_path: &Path,
) -> Result<TaskId> {
    translator.translate(raw_path, json_path)?;
    registry.create_task(json_path)
}
