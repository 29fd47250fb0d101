use anyhow::{Context, Result};
use bpmnscribe_core::ConversionOutput;
use std::path::Path;

/// Output format for the `bpmn` subcommand
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Transcript text exactly as the extractor renders it
    Text,
    /// Transcript, statistics and diagnostics as pretty JSON
    Json,
}

/// Write a BPMN conversion result in the requested format
pub fn save_conversion(output: &ConversionOutput, path: &Path, format: OutputFormat) -> Result<()> {
    let content = match format {
        OutputFormat::Text => output.text.clone(),
        OutputFormat::Json => output.to_json()?,
    };
    write_file(path, content.as_bytes())
}

/// Write bytes, creating missing parent directories
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}
