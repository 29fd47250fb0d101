//! Report template transformer
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────────────┐   ┌─────────────────┐
//! │ UploadedFile │──▶│ .docx → outline sections │──▶│                 │
//! │ (name+bytes) │   │ .xlsx → sheet layouts    │   │ Plantilla.docx  │──▶ bytes
//! └──────────────┘   └──────────────────────────┘   │ + Heading1 + …  │
//!                                                   └─────────────────┘
//! ```
//!
//! Every run writes the outline headings into a fresh copy of the template and
//! returns the serialized package; the template file itself is never modified.

pub mod docx;
pub mod media;
pub mod outline;
pub mod package;
pub mod xlsx;

use crate::config::TemplateConfig;
use crate::error::TransformError;
use docx::{Block, DocxBuilder};
use std::path::Path;
use xlsx::Workbook;

/// Source file as received from the user
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, TransformError> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, bytes })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Word,
    Excel,
}

impl SourceKind {
    /// Chosen by the lowercase file name extension
    pub fn detect(name: &str) -> Result<Self, TransformError> {
        let lower = name.to_lowercase();
        if lower.ends_with(".docx") {
            Ok(SourceKind::Word)
        } else if lower.ends_with(".xlsx") {
            Ok(SourceKind::Excel)
        } else {
            Err(TransformError::UnsupportedFormat(name.to_string()))
        }
    }
}

/// Fill the template at `template_path` from the uploaded file
pub fn transform(
    file: &UploadedFile,
    template_path: &Path,
    config: &TemplateConfig,
) -> Result<Vec<u8>, TransformError> {
    let kind = SourceKind::detect(&file.name)?;
    let template = std::fs::read(template_path)?;
    transform_with_template(file, &template, config, kind)
}

/// Same as [`transform`] with the template already in memory
pub fn transform_with_template(
    file: &UploadedFile,
    template: &[u8],
    config: &TemplateConfig,
    kind: SourceKind,
) -> Result<Vec<u8>, TransformError> {
    let mut builder = DocxBuilder::from_template(template)?;

    match kind {
        SourceKind::Word => fill_from_word(&file.bytes, &mut builder, config)?,
        SourceKind::Excel => fill_from_workbook(&file.bytes, &mut builder, config)?,
    }

    tracing::info!(source = %file.name, ?kind, "template filled");
    builder.finish()
}

fn fill_from_word(
    bytes: &[u8],
    builder: &mut DocxBuilder,
    config: &TemplateConfig,
) -> Result<(), TransformError> {
    let blocks = docx::read_blocks(bytes)?;
    tracing::debug!(blocks = blocks.len(), "read Word source");

    for section in outline::classify(blocks, &config.outline) {
        builder.add_heading(&section.title);
        for block in &section.blocks {
            match block {
                Block::Paragraph(paragraph) => builder.add_paragraph(paragraph),
                Block::Table(table) => builder.add_table(table.columns, &table.rows),
            }
        }
    }
    Ok(())
}

fn fill_from_workbook(
    bytes: &[u8],
    builder: &mut DocxBuilder,
    config: &TemplateConfig,
) -> Result<(), TransformError> {
    let workbook = Workbook::read(bytes)?;
    tracing::debug!(sheets = ?workbook.sheet_names().collect::<Vec<_>>(), "read Excel source");

    for section in &config.workbook_sections {
        xlsx::render_section(&workbook, section, builder, config)?;
    }
    Ok(())
}
