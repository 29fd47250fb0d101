//! OOXML package access
//!
//! A `.docx` or `.xlsx` file is a zip archive of XML parts tied together by
//! `_rels/*.rels` relationship parts. The whole archive is held in memory; the
//! parts that change are replaced and the package is written back in the same
//! part order.

use crate::error::TransformError;
use crate::xml::{parse_document, XmlElement};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const PACKAGE_RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
/// Namespace of `r:id` / `r:embed` attributes in document parts
pub const OFFICE_RELS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const OFFICE_DOCUMENT_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    pub fn read(bytes: &[u8]) -> Result<Self, TransformError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)?;
            parts.push((file.name().to_string(), content));
        }

        Ok(Self { parts })
    }

    pub fn from_parts(parts: Vec<(String, Vec<u8>)>) -> Self {
        Self { parts }
    }

    pub fn open(path: &Path) -> Result<Self, TransformError> {
        let bytes = std::fs::read(path)?;
        Self::read(&bytes)
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, content)| content.as_slice())
    }

    pub fn require_part(&self, name: &str) -> Result<&[u8], TransformError> {
        self.part(name)
            .ok_or_else(|| TransformError::MissingPart(name.to_string()))
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    /// Replace a part in place, or append it when new
    pub fn set_part(&mut self, name: &str, content: Vec<u8>) {
        match self.parts.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = content,
            None => self.parts.push((name.to_string(), content)),
        }
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    /// Parse a part as XML
    pub fn xml_part(&self, name: &str) -> Result<XmlElement, TransformError> {
        let bytes = self.require_part(name)?;
        parse_document(bytes).map_err(|source| TransformError::Part {
            part: name.to_string(),
            source,
        })
    }

    /// Relationships of a part; empty when the part has no `.rels` companion
    pub fn relationships(&self, part_name: &str) -> Result<Vec<Relationship>, TransformError> {
        let rels_name = rels_path(part_name);
        if !self.has_part(&rels_name) {
            return Ok(Vec::new());
        }
        let root = self.xml_part(&rels_name)?;
        Ok(root
            .children_named(PACKAGE_RELS_NS, "Relationship")
            .filter_map(|rel| {
                Some(Relationship {
                    id: rel.attr("Id")?.to_string(),
                    rel_type: rel.attr("Type").unwrap_or_default().to_string(),
                    target: rel.attr("Target")?.to_string(),
                    external: rel.attr("TargetMode") == Some("External"),
                })
            })
            .collect())
    }

    /// Main part named by the package-level `officeDocument` relationship
    pub fn main_part(&self, fallback: &str) -> Result<String, TransformError> {
        let main = self
            .relationships("")?
            .into_iter()
            .find(|rel| rel.rel_type == OFFICE_DOCUMENT_REL)
            .map(|rel| resolve_target("", &rel.target));
        Ok(main.unwrap_or_else(|| fallback.to_string()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TransformError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, content) in &self.parts {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(content)?;
        }

        Ok(writer.finish()?.into_inner())
    }
}

/// `word/document.xml` → `word/_rels/document.xml.rels`; `""` is the package itself
pub fn rels_path(part_name: &str) -> String {
    match part_name.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part_name}.rels"),
    }
}

/// Resolve a relationship target against the part that owns the relationship
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Directory of a part, without the trailing slash
pub fn part_dir(part_name: &str) -> &str {
    part_name.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package_with(parts: &[(&str, &str)]) -> Package {
        let mut package = Package::default();
        for (name, content) in parts {
            package.set_part(name, content.as_bytes().to_vec());
        }
        package
    }

    #[test]
    fn test_rels_path() {
        assert_eq!(rels_path("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(
            rels_path("xl/worksheets/sheet1.xml"),
            "xl/worksheets/_rels/sheet1.xml.rels"
        );
        assert_eq!(rels_path(""), "_rels/.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("xl/workbook.xml", "worksheets/sheet1.xml"),
            "xl/worksheets/sheet1.xml"
        );
        assert_eq!(
            resolve_target("xl/drawings/drawing1.xml", "../media/image1.png"),
            "xl/media/image1.png"
        );
        assert_eq!(
            resolve_target("xl/workbook.xml", "/xl/worksheets/sheet2.xml"),
            "xl/worksheets/sheet2.xml"
        );
        assert_eq!(resolve_target("", "word/document.xml"), "word/document.xml");
    }

    #[test]
    fn test_zip_roundtrip_keeps_part_order() {
        let mut package = package_with(&[("b.xml", "<b/>"), ("a.xml", "<a/>")]);
        package.set_part("b.xml", b"<b2/>".to_vec());
        let reread = Package::read(&package.to_bytes().unwrap()).unwrap();

        let names: Vec<&str> = reread.part_names().collect();
        assert_eq!(names, vec!["b.xml", "a.xml"]);
        assert_eq!(reread.part("b.xml"), Some(&b"<b2/>"[..]));
    }

    #[test]
    fn test_relationships_and_main_part() {
        let package = package_with(&[(
            "_rels/.rels",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
                <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/main.xml"/>
                <Relationship Id="rId2" Type="x" Target="http://example.com" TargetMode="External"/>
            </Relationships>"#,
        )]);
        let rels = package.relationships("").unwrap();
        assert_eq!(rels.len(), 2);
        assert!(rels[1].external);
        assert_eq!(package.main_part("word/document.xml").unwrap(), "word/main.xml");
        assert!(package.relationships("word/main.xml").unwrap().is_empty());
    }

    #[test]
    fn test_missing_part_is_an_error() {
        let package = Package::default();
        assert!(matches!(
            package.require_part("word/document.xml"),
            Err(TransformError::MissingPart(name)) if name == "word/document.xml"
        ));
        assert!(Package::read(b"not a zip").is_err());
    }
}
