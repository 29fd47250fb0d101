//! Word documents: reading the source body and writing into the template
//!
//! ```text
//! source.docx ──read_blocks──▶ [Block] ──classify──▶ sections
//!                                                       │
//! Plantilla.docx ──DocxBuilder::from_template──▶ add_* ◀┘ ──finish──▶ bytes
//! ```
//!
//! The builder never rewrites what the template already holds. New blocks are
//! serialized as WordprocessingML and spliced in front of the body's closing
//! section properties, so the template's cover, headers and styles stay intact.

use super::media::{self, ImageInfo};
use super::package::{part_dir, rels_path, Package, IMAGE_REL, PACKAGE_RELS_NS};
use crate::error::TransformError;
use crate::xml::{parse_document, XmlElement};
use quick_xml::escape::escape;
use regex::Regex;
use std::sync::LazyLock;

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const DEFAULT_DOCUMENT_PART: &str = "word/document.xml";

const HEADING_STYLE: &str = "Heading1";
const TABLE_STYLE: &str = "TableGrid";
/// Text width used to split table columns, in twentieths of a point
const TABLE_WIDTH_TWIPS: usize = 8640;
const EMU_PER_INCH: f64 = 914_400.0;

static REL_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^rId(\d+)$").unwrap());
static DOC_PR_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<wp:docPr\s[^>]*\bid="(\d+)""#).unwrap());

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    pub text: String,
    /// `None` inherits from the paragraph style
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    /// Underline style (`single`, `double`, `none`, ...)
    pub underline: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn plain(text: &str) -> Self {
        Self {
            runs: vec![Run {
                text: text.to_string(),
                ..Default::default()
            }],
        }
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

/// Cell texts on the table grid. Merged cells repeat their text in every grid slot they cover.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: usize,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// Top-level paragraphs and tables of a Word document, in body order
pub fn read_blocks(bytes: &[u8]) -> Result<Vec<Block>, TransformError> {
    let package = Package::read(bytes)?;
    let part = package.main_part(DEFAULT_DOCUMENT_PART)?;
    let document = package.xml_part(&part)?;
    let body = document
        .child(W_NS, "body")
        .ok_or_else(|| TransformError::MissingPart(format!("{part}: w:body")))?;

    let blocks = body
        .children
        .iter()
        .filter_map(|child| match (child.namespace.as_deref(), child.name.as_str()) {
            (Some(W_NS), "p") => Some(Block::Paragraph(read_paragraph(child))),
            (Some(W_NS), "tbl") => Some(Block::Table(read_table(child))),
            _ => None,
        })
        .collect();
    Ok(blocks)
}

fn read_paragraph(p: &XmlElement) -> Paragraph {
    let mut runs = Vec::new();
    for child in &p.children {
        if child.is(W_NS, "r") {
            runs.push(read_run(child));
        } else if child.is(W_NS, "hyperlink") {
            runs.extend(child.children_named(W_NS, "r").map(read_run));
        }
    }
    Paragraph { runs }
}

fn read_run(r: &XmlElement) -> Run {
    let mut text = String::new();
    for child in r.children.iter().filter(|c| c.namespace.as_deref() == Some(W_NS)) {
        match child.name.as_str() {
            "t" => text.push_str(&child.text),
            "tab" => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            _ => {}
        }
    }

    let properties = r.child(W_NS, "rPr");
    let toggle = |name: &str| {
        properties
            .and_then(|p| p.child(W_NS, name))
            .map(|el| !matches!(el.attr_ns(W_NS, "val"), Some("0" | "false" | "off")))
    };
    let underline = properties
        .and_then(|p| p.child(W_NS, "u"))
        .map(|u| u.attr_ns(W_NS, "val").unwrap_or("single").to_string());

    Run {
        text,
        bold: toggle("b"),
        italic: toggle("i"),
        underline,
    }
}

fn cell_text(tc: &XmlElement) -> String {
    let paragraphs: Vec<String> = tc
        .children_named(W_NS, "p")
        .map(|p| read_paragraph(p).text())
        .collect();
    paragraphs.join("\n").trim().to_string()
}

fn read_table(tbl: &XmlElement) -> Table {
    let grid_columns = tbl
        .child(W_NS, "tblGrid")
        .map(|grid| grid.children_named(W_NS, "gridCol").count())
        .unwrap_or(0);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for tr in tbl.children_named(W_NS, "tr") {
        let mut row: Vec<String> = Vec::new();
        for tc in tr.children_named(W_NS, "tc") {
            let properties = tc.child(W_NS, "tcPr");
            let span = properties
                .and_then(|p| p.child(W_NS, "gridSpan"))
                .and_then(|s| s.attr_ns(W_NS, "val"))
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(1)
                .max(1);
            // vMerge without val="restart" continues the cell above
            let continues = properties
                .and_then(|p| p.child(W_NS, "vMerge"))
                .is_some_and(|m| m.attr_ns(W_NS, "val") != Some("restart"));

            let text = if continues {
                rows.last()
                    .and_then(|above| above.get(row.len()))
                    .cloned()
                    .unwrap_or_default()
            } else {
                cell_text(tc)
            };
            row.extend(std::iter::repeat(text).take(span));
        }
        rows.push(row);
    }

    let columns = if grid_columns > 0 {
        grid_columns
    } else {
        rows.iter().map(Vec::len).max().unwrap_or(0)
    };
    for row in &mut rows {
        row.resize(columns, String::new());
    }
    Table { columns, rows }
}

/// Appends content to a copy of the Word template
pub struct DocxBuilder {
    package: Package,
    document_part: String,
    document_xml: String,
    body: String,
    next_rel_id: usize,
    next_doc_pr_id: usize,
}

impl DocxBuilder {
    pub fn from_template(bytes: &[u8]) -> Result<Self, TransformError> {
        let package = Package::read(bytes)?;
        let document_part = package.main_part(DEFAULT_DOCUMENT_PART)?;
        let raw = package.require_part(&document_part)?;

        let root = parse_document(raw).map_err(|source| TransformError::Part {
            part: document_part.clone(),
            source,
        })?;
        if !root.is(W_NS, "document") || root.child(W_NS, "body").is_none() {
            return Err(TransformError::InvalidTemplate(format!(
                "{document_part} is not a Word document body"
            )));
        }

        let document_xml = String::from_utf8_lossy(raw).into_owned();
        let binds_w = [format!("xmlns:w=\"{W_NS}\""), format!("xmlns:w='{W_NS}'")]
            .iter()
            .any(|binding| document_xml.contains(binding.as_str()));
        if !binds_w || body_insertion_point(&document_xml).is_none() {
            return Err(TransformError::InvalidTemplate(format!(
                "{document_part} must use the 'w' prefix and an open <w:body> element"
            )));
        }

        let next_rel_id = max_rel_id(&package, &document_part)? + 1;
        let next_doc_pr_id = DOC_PR_ID_REGEX
            .captures_iter(&document_xml)
            .filter_map(|caps| caps[1].parse::<usize>().ok())
            .max()
            .unwrap_or(0)
            + 1;

        Ok(Self {
            package,
            document_part,
            document_xml,
            body: String::new(),
            next_rel_id,
            next_doc_pr_id,
        })
    }

    pub fn add_heading(&mut self, text: &str) {
        self.body.push_str(&format!(
            "<w:p><w:pPr><w:pStyle w:val=\"{HEADING_STYLE}\"/></w:pPr>{}</w:p>",
            run_xml(&Run {
                text: text.to_string(),
                ..Default::default()
            })
        ));
    }

    pub fn add_paragraph(&mut self, paragraph: &Paragraph) {
        let runs: String = paragraph.runs.iter().map(run_xml).collect();
        self.body.push_str(&format!("<w:p>{runs}</w:p>"));
    }

    pub fn add_text_paragraph(&mut self, text: &str) {
        if text.is_empty() {
            self.body.push_str("<w:p/>");
        } else {
            self.add_paragraph(&Paragraph::plain(text));
        }
    }

    /// Grid-styled table; short rows are padded to `columns`
    pub fn add_table(&mut self, columns: usize, rows: &[Vec<String>]) {
        if columns == 0 {
            return;
        }
        let width = TABLE_WIDTH_TWIPS / columns;
        let mut xml = format!(
            "<w:tbl><w:tblPr><w:tblStyle w:val=\"{TABLE_STYLE}\"/><w:tblW w:w=\"0\" w:type=\"auto\"/>\
             <w:tblLook w:val=\"04A0\"/></w:tblPr><w:tblGrid>"
        );
        for _ in 0..columns {
            xml.push_str(&format!("<w:gridCol w:w=\"{width}\"/>"));
        }
        xml.push_str("</w:tblGrid>");

        for row in rows {
            xml.push_str("<w:tr>");
            for index in 0..columns {
                let text = row.get(index).map(String::as_str).unwrap_or("");
                xml.push_str(&format!(
                    "<w:tc><w:tcPr><w:tcW w:w=\"{width}\" w:type=\"dxa\"/></w:tcPr>{}</w:tc>",
                    cell_paragraph_xml(text)
                ));
            }
            xml.push_str("</w:tr>");
        }
        xml.push_str("</w:tbl>");
        self.body.push_str(&xml);
    }

    /// Inline picture in its own paragraph, scaled to `width_inches` keeping its aspect ratio
    pub fn add_picture(
        &mut self,
        name: &str,
        bytes: Vec<u8>,
        width_inches: f64,
    ) -> Result<(), TransformError> {
        let info = media::sniff(&bytes)
            .ok_or_else(|| TransformError::UnsupportedImage(name.to_string()))?;

        let rel_id = format!("rId{}", self.next_rel_id);
        self.next_rel_id += 1;
        let doc_pr_id = self.next_doc_pr_id;
        self.next_doc_pr_id += 1;

        let file_name = self.unused_media_name(doc_pr_id, &info);
        let dir = part_dir(&self.document_part);
        let media_part = if dir.is_empty() {
            format!("media/{file_name}")
        } else {
            format!("{dir}/media/{file_name}")
        };

        self.package.set_part(&media_part, bytes);
        self.add_relationship(&rel_id, &format!("media/{file_name}"))?;
        self.ensure_content_type(&info)?;

        let cx = (width_inches * EMU_PER_INCH).round() as u64;
        let cy = if info.width == 0 {
            cx
        } else {
            (cx as f64 * f64::from(info.height) / f64::from(info.width)).round() as u64
        };
        self.body
            .push_str(&picture_xml(&rel_id, doc_pr_id, &file_name, cx, cy));
        Ok(())
    }

    /// Package bytes with every added block in place
    pub fn finish(mut self) -> Result<Vec<u8>, TransformError> {
        let at = body_insertion_point(&self.document_xml).ok_or_else(|| {
            TransformError::InvalidTemplate("document body disappeared".to_string())
        })?;
        self.document_xml.insert_str(at, &self.body);
        let part = self.document_part.clone();
        self.package
            .set_part(&part, std::mem::take(&mut self.document_xml).into_bytes());
        self.package.to_bytes()
    }

    fn unused_media_name(&self, seed: usize, info: &ImageInfo) -> String {
        let dir = part_dir(&self.document_part);
        (seed..)
            .map(|n| format!("image{n}.{}", info.format.extension()))
            .find(|candidate| {
                let full = if dir.is_empty() {
                    format!("media/{candidate}")
                } else {
                    format!("{dir}/media/{candidate}")
                };
                !self.package.has_part(&full)
            })
            .unwrap_or_else(|| format!("image{seed}.{}", info.format.extension()))
    }

    fn add_relationship(&mut self, rel_id: &str, target: &str) -> Result<(), TransformError> {
        let rels_name = rels_path(&self.document_part);
        let entry = format!(
            "<Relationship Id=\"{rel_id}\" Type=\"{IMAGE_REL}\" Target=\"{}\"/>",
            escape(target)
        );
        let rels = match self.package.part(&rels_name) {
            Some(existing) => {
                insert_before_close(&String::from_utf8_lossy(existing), "</Relationships>", &entry)
                    .ok_or_else(|| {
                        TransformError::InvalidTemplate(format!("{rels_name} has no </Relationships>"))
                    })?
            }
            None => format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
                 <Relationships xmlns=\"{PACKAGE_RELS_NS}\">{entry}</Relationships>"
            ),
        };
        self.package.set_part(&rels_name, rels.into_bytes());
        Ok(())
    }

    fn ensure_content_type(&mut self, info: &ImageInfo) -> Result<(), TransformError> {
        let extension = info.format.extension();
        let types = self.package.xml_part(CONTENT_TYPES_PART)?;
        let declared = types
            .children_named(CONTENT_TYPES_NS, "Default")
            .any(|d| d.attr("Extension").is_some_and(|e| e.eq_ignore_ascii_case(extension)));
        if declared {
            return Ok(());
        }

        let raw = String::from_utf8_lossy(self.package.require_part(CONTENT_TYPES_PART)?).into_owned();
        let entry = format!(
            "<Default Extension=\"{extension}\" ContentType=\"{}\"/>",
            info.format.content_type()
        );
        let updated = insert_before_close(&raw, "</Types>", &entry).ok_or_else(|| {
            TransformError::InvalidTemplate(format!("{CONTENT_TYPES_PART} has no </Types>"))
        })?;
        self.package.set_part(CONTENT_TYPES_PART, updated.into_bytes());
        Ok(())
    }
}

/// Byte offset where new body content goes: before the body-level `w:sectPr`
/// when there is one, otherwise before `</w:body>`.
fn body_insertion_point(xml: &str) -> Option<usize> {
    let body_end = xml.rfind("</w:body>")?;
    let head = &xml[..body_end];
    let sect_pr = [
        head.rfind("<w:sectPr>"),
        head.rfind("<w:sectPr "),
        head.rfind("<w:sectPr/>"),
    ]
        .into_iter()
        .flatten()
        .max();

    match sect_pr {
        // A sectPr inside a paragraph's properties is followed by its </w:p>
        Some(start) if !xml[start..body_end].contains("</w:p>") => Some(start),
        _ => Some(body_end),
    }
}

fn insert_before_close(xml: &str, closing: &str, entry: &str) -> Option<String> {
    let at = xml.rfind(closing)?;
    let mut out = String::with_capacity(xml.len() + entry.len());
    out.push_str(&xml[..at]);
    out.push_str(entry);
    out.push_str(&xml[at..]);
    Some(out)
}

fn max_rel_id(package: &Package, document_part: &str) -> Result<usize, TransformError> {
    Ok(package
        .relationships(document_part)?
        .iter()
        .filter_map(|rel| REL_ID_REGEX.captures(&rel.id))
        .filter_map(|caps| caps[1].parse::<usize>().ok())
        .max()
        .unwrap_or(0))
}

fn toggle_xml(name: &str, value: Option<bool>) -> String {
    match value {
        Some(true) => format!("<w:{name}/>"),
        Some(false) => format!("<w:{name} w:val=\"0\"/>"),
        None => String::new(),
    }
}

fn run_xml(run: &Run) -> String {
    let mut properties = toggle_xml("b", run.bold);
    properties.push_str(&toggle_xml("i", run.italic));
    if let Some(underline) = &run.underline {
        properties.push_str(&format!("<w:u w:val=\"{}\"/>", escape(underline.as_str())));
    }

    let mut xml = String::from("<w:r>");
    if !properties.is_empty() {
        xml.push_str(&format!("<w:rPr>{properties}</w:rPr>"));
    }
    for (index, line) in run.text.split('\n').enumerate() {
        if index > 0 {
            xml.push_str("<w:br/>");
        }
        for (piece_index, piece) in line.split('\t').enumerate() {
            if piece_index > 0 {
                xml.push_str("<w:tab/>");
            }
            if !piece.is_empty() {
                xml.push_str(&format!(
                    "<w:t xml:space=\"preserve\">{}</w:t>",
                    escape(piece)
                ));
            }
        }
    }
    xml.push_str("</w:r>");
    xml
}

fn cell_paragraph_xml(text: &str) -> String {
    if text.is_empty() {
        "<w:p/>".to_string()
    } else {
        format!(
            "<w:p>{}</w:p>",
            run_xml(&Run {
                text: text.to_string(),
                ..Default::default()
            })
        )
    }
}

fn picture_xml(rel_id: &str, doc_pr_id: usize, file_name: &str, cx: u64, cy: u64) -> String {
    format!(
        "<w:p><w:r><w:drawing>\
         <wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\" \
         xmlns:wp=\"http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing\">\
         <wp:extent cx=\"{cx}\" cy=\"{cy}\"/>\
         <wp:docPr id=\"{doc_pr_id}\" name=\"Picture {doc_pr_id}\"/>\
         <wp:cNvGraphicFramePr>\
         <a:graphicFrameLocks xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" noChangeAspect=\"1\"/>\
         </wp:cNvGraphicFramePr>\
         <a:graphic xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\">\
         <a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">\
         <pic:pic xmlns:pic=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">\
         <pic:nvPicPr><pic:cNvPr id=\"0\" name=\"{name}\"/><pic:cNvPicPr/></pic:nvPicPr>\
         <pic:blipFill>\
         <a:blip xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" r:embed=\"{rel_id}\"/>\
         <a:stretch><a:fillRect/></a:stretch>\
         </pic:blipFill>\
         <pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>\
         <a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>\
         </pic:pic></a:graphicData></a:graphic></wp:inline>\
         </w:drawing></w:r></w:p>",
        name = escape(file_name),
    )
}
