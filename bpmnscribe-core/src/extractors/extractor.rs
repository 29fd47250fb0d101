// Extractor abstraction for diagram processing
//
// This module defines the boundary between reading a diagram file (bytes -> XML tree)
// and projecting it (XML tree -> Transcript). Everything after the second step works
// with the Transcript and does not know which diagram format it came from.

use crate::error::ParseError;
use crate::types::Transcript;
use crate::xml::XmlElement;
use anyhow::Result;
use std::path::Path;

/// Extractor trait - converts diagram files to a Transcript
///
/// The extraction happens in two clear steps:
/// 1. Bytes -> XML element tree (the only step that can fail)
/// 2. XML element tree -> Transcript (total: degraded input becomes diagnostics)
pub trait Extractor {
    /// Step 1: Parse raw bytes into an element tree
    ///
    /// Fails with `ParseError` when the bytes are not well-formed XML.
    fn parse_bytes(&self, bytes: &[u8]) -> std::result::Result<XmlElement, ParseError>;

    /// Step 2: Project the element tree into a Transcript
    fn build_transcript(&self, document: &XmlElement) -> Transcript;

    /// Full extraction (combines both steps)
    fn extract(&self, bytes: &[u8]) -> std::result::Result<Transcript, ParseError> {
        let document = self.parse_bytes(bytes)?;
        Ok(self.build_transcript(&document))
    }

    /// Reads the file and extracts it. Useful for the CLI.
    fn extract_file(&self, input: &Path) -> Result<Transcript> {
        let bytes = std::fs::read(input)?;
        Ok(self.extract(&bytes)?)
    }

    /// Extractor name for logging
    fn name(&self) -> &str;

    /// Check if the extractor supports the given file type
    fn supports_file_type(&self, path: &Path) -> bool;
}
