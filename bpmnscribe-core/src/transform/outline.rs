//! Sorting source blocks into the report outline

use super::docx::Block;
use crate::config::OutlineSection;

/// Blocks gathered under one outline heading
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedSection {
    pub title: String,
    pub blocks: Vec<Block>,
}

/// Index of the first outline section with a keyword that opens the text.
/// Comparison is case-insensitive on the trimmed text.
pub fn match_section(text: &str, outline: &[OutlineSection]) -> Option<usize> {
    let text = text.trim().to_lowercase();
    outline.iter().position(|section| {
        section
            .keywords
            .iter()
            .any(|keyword| text.starts_with(&keyword.to_lowercase()))
    })
}

/// Walk the source in document order.
///
/// A paragraph that matches a section switches the current section and is kept
/// in it. Every other block goes to the current section; blocks before the first
/// match are dropped. All outline sections are returned, empty ones included.
pub fn classify(blocks: Vec<Block>, outline: &[OutlineSection]) -> Vec<ClassifiedSection> {
    let mut sections: Vec<ClassifiedSection> = outline
        .iter()
        .map(|section| ClassifiedSection {
            title: section.title.clone(),
            blocks: Vec::new(),
        })
        .collect();
    let mut current: Option<usize> = None;
    let mut dropped = 0usize;

    for block in blocks {
        if let Block::Paragraph(paragraph) = &block {
            if let Some(index) = match_section(&paragraph.text(), outline) {
                current = Some(index);
            }
        }
        match current {
            Some(index) => sections[index].blocks.push(block),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::debug!(dropped, "blocks before the first outline heading dropped");
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_outline;
    use crate::transform::docx::{Paragraph, Table};

    fn para(text: &str) -> Block {
        Block::Paragraph(Paragraph::plain(text))
    }

    #[test]
    fn test_match_is_case_insensitive_prefix_on_trimmed_text() {
        let outline = default_outline();
        assert_eq!(match_section("  RIESGOS del proceso", &outline), Some(5));
        assert_eq!(match_section("metas de desempeño 2024", &outline), Some(4));
        assert_eq!(match_section("Los Riesgos", &outline), None);
    }

    #[test]
    fn test_first_section_in_outline_order_wins() {
        // "Registro de cambios" also starts with "Registro de cambio"; both map to X
        let outline = default_outline();
        assert_eq!(match_section("Registro de cambios", &outline), Some(9));

        let overlapping = vec![
            OutlineSection {
                title: "A".to_string(),
                keywords: vec!["Riesgos".to_string()],
            },
            OutlineSection {
                title: "B".to_string(),
                keywords: vec!["Riesgos altos".to_string()],
            },
        ];
        assert_eq!(match_section("Riesgos altos", &overlapping), Some(0));
    }

    #[test]
    fn test_classify_follows_current_section() {
        let outline = default_outline();
        let table = Block::Table(Table {
            columns: 1,
            rows: vec![vec!["celda".to_string()]],
        });
        let sections = classify(
            vec![
                para("Portada"),
                table.clone(),
                para("Flujo del Proceso"),
                para("Diagrama general"),
                para("Riesgos"),
                table.clone(),
                para("Flujo del proceso (continuación)"),
            ],
            &outline,
        );

        assert_eq!(sections.len(), 10);
        assert_eq!(sections[0].title, "I. Flujo del Proceso");
        assert_eq!(
            sections[0].blocks,
            vec![
                para("Flujo del Proceso"),
                para("Diagrama general"),
                para("Flujo del proceso (continuación)")
            ]
        );
        assert_eq!(sections[5].blocks, vec![para("Riesgos"), table]);
        assert!(sections[1].blocks.is_empty());
    }
}
