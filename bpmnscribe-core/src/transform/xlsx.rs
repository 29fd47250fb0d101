//! Excel workbooks: sheet grids and the layouts that turn them into report sections

use super::docx::DocxBuilder;
use super::media;
use super::package::{resolve_target, Package, OFFICE_RELS_NS};
use crate::config::{SheetLayout, TemplateConfig, WorkbookSection};
use crate::error::TransformError;
use crate::xml::XmlElement;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

const SHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const DRAWING_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
const DRAWINGML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";
const BULLET: &str = "• ";

static CELL_REF_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([A-Z]+)(\d+)$").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    /// Numeric cell as stored in the sheet
    Number(String),
    Bool(bool),
    Error(String),
}

impl CellValue {
    pub fn display(&self) -> String {
        match self {
            CellValue::Text(text) | CellValue::Number(text) | CellValue::Error(text) => text.clone(),
            CellValue::Bool(true) => "True".to_string(),
            CellValue::Bool(false) => "False".to_string(),
        }
    }
}

/// A sheet read as a table: first used row as header, then every non-blank row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<CellValue>>>,
}

impl Frame {
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.headers.is_empty()
    }

    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.as_ref().map(CellValue::display).unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}

/// Parsed workbook with sheets resolved by name
pub struct Workbook {
    package: Package,
    sheets: Vec<(String, String)>,
    shared_strings: Vec<String>,
}

impl Workbook {
    pub fn read(bytes: &[u8]) -> Result<Self, TransformError> {
        let package = Package::read(bytes)?;
        let workbook_part = package.main_part(DEFAULT_WORKBOOK_PART)?;
        let workbook = package.xml_part(&workbook_part)?;
        let relationships = package.relationships(&workbook_part)?;

        let targets: HashMap<&str, String> = relationships
            .iter()
            .map(|rel| (rel.id.as_str(), resolve_target(&workbook_part, &rel.target)))
            .collect();

        let mut sheets = Vec::new();
        if let Some(list) = workbook.child(SHEET_NS, "sheets") {
            for sheet in list.children_named(SHEET_NS, "sheet") {
                let rel_id = sheet.attr_ns(OFFICE_RELS_NS, "id");
                let (Some(name), Some(rel_id)) = (sheet.attr("name"), rel_id) else {
                    continue;
                };
                match targets.get(rel_id) {
                    Some(part) => sheets.push((name.to_string(), part.clone())),
                    None => tracing::warn!(sheet = name, rel_id, "sheet relationship not found"),
                }
            }
        }

        let shared_part = relationships
            .iter()
            .find(|rel| rel.rel_type.ends_with("/sharedStrings"))
            .map(|rel| resolve_target(&workbook_part, &rel.target));
        let shared_strings = match shared_part {
            Some(part) if package.has_part(&part) => read_shared_strings(&package.xml_part(&part)?),
            _ => Vec::new(),
        };

        Ok(Self {
            package,
            sheets,
            shared_strings,
        })
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|(name, _)| name.as_str())
    }

    fn sheet_part(&self, name: &str) -> Result<&str, TransformError> {
        self.sheets
            .iter()
            .find(|(sheet, _)| sheet == name)
            .map(|(_, part)| part.as_str())
            .ok_or_else(|| TransformError::MissingSheet(name.to_string()))
    }

    pub fn frame(&self, sheet: &str) -> Result<Frame, TransformError> {
        let part = self.sheet_part(sheet)?;
        let worksheet = self.package.xml_part(part)?;
        let cells = read_cells(&worksheet, &self.shared_strings);
        Ok(build_frame(cells))
    }

    /// Bytes and name of the first picture anchored on the sheet
    pub fn first_image(&self, sheet: &str) -> Result<Option<(String, Vec<u8>)>, TransformError> {
        let sheet_part = self.sheet_part(sheet)?;
        let drawings: Vec<String> = self
            .package
            .relationships(sheet_part)?
            .into_iter()
            .filter(|rel| !rel.external && rel.rel_type.ends_with("/drawing"))
            .map(|rel| resolve_target(sheet_part, &rel.target))
            .collect();

        for drawing_part in drawings {
            if !self.package.has_part(&drawing_part) {
                continue;
            }
            let drawing = self.package.xml_part(&drawing_part)?;
            let rels = self.package.relationships(&drawing_part)?;

            for embed in picture_embeds(&drawing) {
                let Some(rel) = rels.iter().find(|rel| rel.id == embed && !rel.external) else {
                    continue;
                };
                let media_part = resolve_target(&drawing_part, &rel.target);
                if let Some(bytes) = self.package.part(&media_part) {
                    let name = media_part.rsplit('/').next().unwrap_or(media_part.as_str()).to_string();
                    return Ok(Some((name, bytes.to_vec())));
                }
            }
        }
        Ok(None)
    }
}

fn read_shared_strings(root: &XmlElement) -> Vec<String> {
    root.children_named(SHEET_NS, "si").map(rich_text).collect()
}

/// Text of an `si` or `is` element: plain `t`, or the `t` of every rich-text run
fn rich_text(element: &XmlElement) -> String {
    match element.child(SHEET_NS, "t") {
        Some(t) => t.text.clone(),
        None => element
            .children_named(SHEET_NS, "r")
            .filter_map(|r| r.child(SHEET_NS, "t"))
            .map(|t| t.text.as_str())
            .collect(),
    }
}

/// `B3` → (row 2, column 1), zero-based
pub fn parse_cell_ref(reference: &str) -> Option<(usize, usize)> {
    let caps = CELL_REF_REGEX.captures(reference)?;
    let column = caps[1]
        .bytes()
        .fold(0usize, |acc, letter| acc * 26 + usize::from(letter - b'A' + 1));
    let row: usize = caps[2].parse().ok()?;
    Some((row.checked_sub(1)?, column - 1))
}

fn read_cells(worksheet: &XmlElement, shared_strings: &[String]) -> Vec<(usize, usize, CellValue)> {
    let mut cells = Vec::new();
    let Some(data) = worksheet.child(SHEET_NS, "sheetData") else {
        return cells;
    };

    let mut next_row = 0usize;
    for row in data.children_named(SHEET_NS, "row") {
        let row_index = row
            .attr("r")
            .and_then(|r| r.parse::<usize>().ok())
            .and_then(|r| r.checked_sub(1))
            .unwrap_or(next_row);
        next_row = row_index + 1;

        let mut next_column = 0usize;
        for cell in row.children_named(SHEET_NS, "c") {
            let (row_index, column) = cell
                .attr("r")
                .and_then(parse_cell_ref)
                .unwrap_or((row_index, next_column));
            next_column = column + 1;

            if let Some(value) = cell_value(cell, shared_strings) {
                cells.push((row_index, column, value));
            }
        }
    }
    cells
}

fn cell_value(cell: &XmlElement, shared_strings: &[String]) -> Option<CellValue> {
    let raw = cell.child(SHEET_NS, "v").map(|v| v.text.as_str());
    let value = match cell.attr("t") {
        Some("s") => {
            let index: usize = raw?.trim().parse().ok()?;
            CellValue::Text(shared_strings.get(index)?.clone())
        }
        Some("inlineStr") => CellValue::Text(rich_text(cell.child(SHEET_NS, "is")?)),
        Some("str") => CellValue::Text(raw?.to_string()),
        Some("b") => CellValue::Bool(raw?.trim() == "1"),
        Some("e") => CellValue::Error(raw?.to_string()),
        _ => CellValue::Number(raw?.trim().to_string()),
    };
    match &value {
        CellValue::Text(text) | CellValue::Number(text) if text.is_empty() => None,
        _ => Some(value),
    }
}

/// Grid anchored at column A, so column indices match the sheet's letters.
/// Blank rows are skipped and the first non-blank row becomes the header.
fn build_frame(cells: Vec<(usize, usize, CellValue)>) -> Frame {
    let (Some(max_row), Some(max_col)) = (
        cells.iter().map(|c| c.0).max(),
        cells.iter().map(|c| c.1).max(),
    ) else {
        return Frame::default();
    };

    let mut grid: Vec<Vec<Option<CellValue>>> = vec![vec![None; max_col + 1]; max_row + 1];
    for (row, column, value) in cells {
        grid[row][column] = Some(value);
    }

    let mut rows = grid
        .into_iter()
        .filter(|row| row.iter().any(Option::is_some));
    let headers = rows
        .next()
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, cell)| match cell {
            Some(value) => value.display(),
            None => format!("Unnamed: {index}"),
        })
        .collect();

    Frame {
        headers,
        rows: rows.collect(),
    }
}

/// `r:embed` ids of the drawing's pictures; two-cell anchors first, then one-cell, then absolute
fn picture_embeds(drawing: &XmlElement) -> Vec<String> {
    ["twoCellAnchor", "oneCellAnchor", "absoluteAnchor"]
        .iter()
        .flat_map(|anchor| drawing.children_named(DRAWING_NS, *anchor))
        .filter_map(|anchor| anchor.child(DRAWING_NS, "pic"))
        .filter_map(|pic| pic.child(DRAWING_NS, "blipFill"))
        .filter_map(|fill| fill.child(DRAWINGML_NS, "blip"))
        .filter_map(|blip| blip.attr_ns(OFFICE_RELS_NS, "embed").map(str::to_string))
        .collect()
}

fn add_frame_table(builder: &mut DocxBuilder, headers: Vec<String>, rows: Vec<Vec<String>>) {
    let columns = headers.len();
    let mut table = Vec::with_capacity(rows.len() + 1);
    table.push(headers);
    table.extend(rows);
    builder.add_table(columns, &table);
    builder.add_text_paragraph("");
}

fn bullet_values(frame: &Frame, column: usize, exclude: &[String], distinct_sorted: bool) -> Vec<String> {
    let mut values: Vec<&str> = frame
        .rows
        .iter()
        .filter_map(|row| match row.get(column) {
            Some(Some(CellValue::Text(text))) => Some(text.as_str()),
            _ => None,
        })
        .filter(|text| !exclude.iter().any(|word| word == text.trim()))
        .collect();

    if distinct_sorted {
        values.sort_unstable();
        values.dedup();
    }
    values.into_iter().map(|text| text.trim().to_string()).collect()
}

/// Render one workbook section under its heading
pub fn render_section(
    workbook: &Workbook,
    section: &WorkbookSection,
    builder: &mut DocxBuilder,
    config: &TemplateConfig,
) -> Result<(), TransformError> {
    builder.add_heading(&section.title);

    match &section.layout {
        SheetLayout::Table => {
            let frame = workbook.frame(&section.sheet)?;
            if !frame.is_empty() {
                add_frame_table(builder, frame.headers.clone(), frame.display_rows());
            }
        }
        SheetLayout::BulletColumn {
            column,
            exclude,
            distinct_sorted,
        } => {
            let frame = workbook.frame(&section.sheet)?;
            for value in bullet_values(&frame, *column, exclude, *distinct_sorted) {
                builder.add_text_paragraph(&format!("{BULLET}{value}"));
            }
        }
        SheetLayout::ColumnRange { start, end } => {
            let frame = workbook.frame(&section.sheet)?;
            let end = (*end).min(frame.width());
            if *start >= end {
                tracing::debug!(sheet = %section.sheet, start, end, "column range outside the sheet, skipped");
                return Ok(());
            }
            let headers = (1..=end - start).map(|i| format!("Columna {i}")).collect();
            let rows = frame
                .rows
                .iter()
                .map(|row| &row[*start..end])
                .filter(|slice| slice.iter().any(Option::is_some))
                .map(|slice| {
                    slice
                        .iter()
                        .map(|cell| cell.as_ref().map(CellValue::display).unwrap_or_default())
                        .collect()
                })
                .collect();
            add_frame_table(builder, headers, rows);
        }
        SheetLayout::ImageOrTable => {
            let picture = workbook
                .first_image(&section.sheet)?
                .filter(|(name, bytes)| {
                    let supported = media::sniff(bytes).is_some();
                    if !supported {
                        tracing::warn!(
                            sheet = %section.sheet,
                            image = %name,
                            "picture is not PNG, JPEG or GIF, rendering the sheet as a table"
                        );
                    }
                    supported
                });
            match picture {
                Some((name, bytes)) => builder.add_picture(&name, bytes, config.image_width_inches)?,
                None => {
                    let frame = workbook.frame(&section.sheet)?;
                    if !frame.is_empty() {
                        add_frame_table(builder, frame.headers.clone(), frame.display_rows());
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const WORKBOOK_REL: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";

    /// In-memory workbook. Each sheet is `(name, sheetData inner XML)`.
    pub(crate) fn xlsx(sheets: &[(&str, &str)], shared: &[&str]) -> Package {
        let mut workbook = format!(
            r#"<workbook xmlns="{SHEET_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#
        );
        let mut rels = String::from(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        let mut parts = Vec::new();

        for (index, (name, data)) in sheets.iter().enumerate() {
            let n = index + 1;
            workbook.push_str(&format!(r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{n}" Type="{WORKBOOK_REL}" Target="worksheets/sheet{n}.xml"/>"#
            ));
            parts.push((
                format!("xl/worksheets/sheet{n}.xml"),
                format!(r#"<worksheet xmlns="{SHEET_NS}"><sheetData>{data}</sheetData></worksheet>"#)
                    .into_bytes(),
            ));
        }
        workbook.push_str("</sheets></workbook>");
        rels.push_str(
            r#"<Relationship Id="rIdS" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#,
        );

        let strings: String = shared.iter().map(|s| format!("<si><t>{s}</t></si>")).collect();
        parts.push((
            "xl/sharedStrings.xml".to_string(),
            format!(r#"<sst xmlns="{SHEET_NS}">{strings}</sst>"#).into_bytes(),
        ));
        parts.push(("xl/workbook.xml".to_string(), workbook.into_bytes()));
        parts.push(("xl/_rels/workbook.xml.rels".to_string(), rels.into_bytes()));
        Package::from_parts(parts)
    }

    pub(crate) fn row(r: usize, cells: &[(&str, &str)]) -> String {
        let cells: String = cells
            .iter()
            .map(|(reference, value)| match value.strip_prefix('#') {
                Some(number) => format!(r#"<c r="{reference}{r}"><v>{number}</v></c>"#),
                None => format!(
                    r#"<c r="{reference}{r}" t="inlineStr"><is><t>{value}</t></is></c>"#
                ),
            })
            .collect();
        format!(r#"<row r="{r}">{cells}</row>"#)
    }

    fn workbook(sheets: &[(&str, &str)], shared: &[&str]) -> Workbook {
        Workbook::read(&xlsx(sheets, shared).to_bytes().unwrap()).unwrap()
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(parse_cell_ref("A1"), Some((0, 0)));
        assert_eq!(parse_cell_ref("AB12"), Some((11, 27)));
        assert_eq!(parse_cell_ref("a1"), None);
        assert_eq!(parse_cell_ref("A0"), None);
    }

    #[test]
    fn test_frame_is_anchored_at_column_a_and_skips_blank_rows() {
        let data = format!(
            "{}{}{}",
            row(2, &[("B", "Nombre"), ("D", "Edad")]),
            row(3, &[("B", "Ana"), ("C", "#7"), ("D", "#31")]),
            row(5, &[("C", "x")]),
        );
        let book = workbook(&[("Hoja", &data)], &[]);
        let frame = book.frame("Hoja").unwrap();

        assert_eq!(frame.headers, vec!["Unnamed: 0", "Nombre", "Unnamed: 2", "Edad"]);
        assert_eq!(frame.rows.len(), 2);
        assert_eq!(frame.display_rows()[0], vec!["", "Ana", "7", "31"]);
        assert_eq!(frame.display_rows()[1], vec!["", "", "x", ""]);
    }

    #[test]
    fn test_empty_column_a_keeps_sheet_column_positions() {
        let data = format!(
            "{}{}{}",
            row(1, &[("B", "Etapa"), ("E", "Actividad"), ("F", "Otro")]),
            row(2, &[("B", "x"), ("E", "Revisar pedido"), ("F", "NO")]),
            row(3, &[("B", "y"), ("F", "Registro")]),
        );
        let book = workbook(&[("Descripción Proceso", &data)], &[]);
        let frame = book.frame("Descripción Proceso").unwrap();

        assert_eq!(frame.headers[0], "Unnamed: 0");
        assert_eq!(frame.headers[4], "Actividad");
        assert_eq!(bullet_values(&frame, 4, &[], false), vec!["Revisar pedido"]);

        let template = crate::transform::docx::tests::docx_with_body("");
        let mut builder = DocxBuilder::from_template(&template).unwrap();
        let section = WorkbookSection {
            title: "VIII. Registros".to_string(),
            sheet: "Descripción Proceso".to_string(),
            layout: SheetLayout::ColumnRange { start: 4, end: 10 },
        };
        render_section(&book, &section, &mut builder, &TemplateConfig::default()).unwrap();
        let names = body_names(&builder.finish().unwrap());
        assert_eq!(names[1].1, "Columna 1Columna 2Revisar pedidoNORegistro");
    }

    #[test]
    fn test_shared_bool_and_error_cells() {
        let data = r#"<row r="1"><c r="A1" t="s"><v>1</v></c><c r="B1" t="b"><v>1</v></c><c r="C1" t="e"><v>#N/A</v></c></row>"#;
        let book = workbook(&[("S", data)], &["cero", "uno"]);
        let frame = book.frame("S").unwrap();
        assert_eq!(frame.headers, vec!["uno", "True", "#N/A"]);
        assert!(frame.is_empty());
    }

    #[test]
    fn test_missing_sheet() {
        let book = workbook(&[("Uno", "")], &[]);
        assert!(matches!(book.frame("Dos"), Err(TransformError::MissingSheet(name)) if name == "Dos"));
        assert_eq!(book.sheet_names().collect::<Vec<_>>(), vec!["Uno"]);
    }

    #[test]
    fn test_bullets_exclude_and_distinct_sort() {
        let data = format!(
            "{}{}{}{}{}",
            row(1, &[("A", "Etapa"), ("B", "Quien")]),
            row(2, &[("A", "x"), ("B", "Quien")]),
            row(3, &[("A", "x"), ("B", " Ventas ")]),
            row(4, &[("A", "x"), ("B", "Compras")]),
            row(5, &[("A", "x"), ("B", "#12")]),
        );
        let book = workbook(&[("S", &data)], &[]);
        let frame = book.frame("S").unwrap();
        let exclude = vec!["Quien".to_string()];

        assert_eq!(
            bullet_values(&frame, 1, &exclude, false),
            vec!["Ventas", "Compras"]
        );
        assert_eq!(
            bullet_values(&frame, 1, &exclude, true),
            vec!["Ventas", "Compras"]
        );
        let mut plain = frame.clone();
        plain.rows.push(vec![None, Some(CellValue::Text("Compras".to_string()))]);
        assert_eq!(
            bullet_values(&plain, 1, &exclude, true),
            vec!["Ventas", "Compras"]
        );
    }

    fn with_picture(mut package: Package, png: Vec<u8>) -> Package {
        package.set_part(
            "xl/worksheets/_rels/sheet1.xml.rels",
            br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing" Target="../drawings/drawing1.xml"/></Relationships>"#.to_vec(),
        );
        package.set_part(
            "xl/drawings/drawing1.xml",
            format!(
                r#"<xdr:wsDr xmlns:xdr="{DRAWING_NS}" xmlns:a="{DRAWINGML_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><xdr:oneCellAnchor><xdr:pic><xdr:blipFill><a:blip r:embed="rId2"/></xdr:blipFill></xdr:pic></xdr:oneCellAnchor><xdr:twoCellAnchor><xdr:pic><xdr:blipFill><a:blip r:embed="rId1"/></xdr:blipFill></xdr:pic></xdr:twoCellAnchor></xdr:wsDr>"#
            )
            .into_bytes(),
        );
        package.set_part(
            "xl/drawings/_rels/drawing1.xml.rels",
            br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image2.png"/></Relationships>"#.to_vec(),
        );
        package.set_part("xl/media/image1.png", png);
        package.set_part("xl/media/image2.png", b"other".to_vec());
        package
    }

    #[test]
    fn test_first_image_prefers_two_cell_anchors() {
        let png = crate::transform::media::tests::png_header(10, 10);
        let package = with_picture(xlsx(&[("Flujo", "")], &[]), png.clone());
        let book = Workbook::read(&package.to_bytes().unwrap()).unwrap();

        let (name, bytes) = book.first_image("Flujo").unwrap().unwrap();
        assert_eq!(name, "image1.png");
        assert_eq!(bytes, png);

        let plain = workbook(&[("Flujo", "")], &[]);
        assert!(plain.first_image("Flujo").unwrap().is_none());
    }

    fn body_names(output: &[u8]) -> Vec<(String, String)> {
        use crate::transform::docx::W_NS;
        let document = Package::read(output)
            .unwrap()
            .xml_part("word/document.xml")
            .unwrap();
        document
            .child(W_NS, "body")
            .unwrap()
            .children
            .iter()
            .map(|child| (child.name.clone(), child.text_content()))
            .collect()
    }

    #[test]
    fn test_column_range_layout_renames_headers_and_drops_empty_rows() {
        let data = format!(
            "{}{}{}{}",
            row(1, &[("A", "Doc"), ("B", "Código"), ("E", "Registro")]),
            row(2, &[("A", "Manual"), ("B", "M-1")]),
            row(3, &[("E", "Acta")]),
            row(4, &[("B", "M-2")]),
        );
        let book = workbook(&[("Información Documentada", &data)], &[]);
        let template = crate::transform::docx::tests::docx_with_body("");
        let mut builder = DocxBuilder::from_template(&template).unwrap();
        let section = WorkbookSection {
            title: "VII. Referencias".to_string(),
            sheet: "Información Documentada".to_string(),
            layout: SheetLayout::ColumnRange { start: 0, end: 3 },
        };
        render_section(&book, &section, &mut builder, &TemplateConfig::default()).unwrap();
        let output = builder.finish().unwrap();

        let names = body_names(&output);
        assert_eq!(names[0], ("p".to_string(), "VII. Referencias".to_string()));
        assert_eq!(names[1].0, "tbl");
        assert!(names[1].1.starts_with("Columna 1Columna 2Columna 3ManualM-1"));
        assert!(!names[1].1.contains("Acta"));
        assert!(names[1].1.ends_with("M-2"));
        assert_eq!(names[2], ("p".to_string(), String::new()));
    }

    #[test]
    fn test_image_or_table_inserts_picture() {
        let png = crate::transform::media::tests::png_header(10, 10);
        let package = with_picture(xlsx(&[("Flujo", "")], &[]), png);
        let book = Workbook::read(&package.to_bytes().unwrap()).unwrap();
        let template = crate::transform::docx::tests::docx_with_body("");
        let mut builder = DocxBuilder::from_template(&template).unwrap();
        let section = WorkbookSection {
            title: "I. Flujo del Proceso".to_string(),
            sheet: "Flujo".to_string(),
            layout: SheetLayout::ImageOrTable,
        };
        render_section(&book, &section, &mut builder, &TemplateConfig::default()).unwrap();

        let output = Package::read(&builder.finish().unwrap()).unwrap();
        assert!(output.has_part("word/media/image1.png"));
    }

    #[test]
    fn test_unsupported_picture_falls_back_to_table() {
        let data = row(1, &[("A", "Paso")]) + &row(2, &[("A", "Inicio")]);
        let package = with_picture(xlsx(&[("Flujo", &data)], &[]), b"BM\x00\x00".to_vec());
        let book = Workbook::read(&package.to_bytes().unwrap()).unwrap();
        let template = crate::transform::docx::tests::docx_with_body("");
        let mut builder = DocxBuilder::from_template(&template).unwrap();
        let section = WorkbookSection {
            title: "I. Flujo del Proceso".to_string(),
            sheet: "Flujo".to_string(),
            layout: SheetLayout::ImageOrTable,
        };
        render_section(&book, &section, &mut builder, &TemplateConfig::default()).unwrap();

        let output = builder.finish().unwrap();
        assert!(!Package::read(&output).unwrap().has_part("word/media/image1.png"));
        let names = body_names(&output);
        assert_eq!(names[1], ("tbl".to_string(), "PasoInicio".to_string()));
    }

    #[test]
    fn test_empty_table_sheet_renders_heading_only() {
        let book = workbook(&[("Indicadores", &row(1, &[("A", "Meta")]))], &[]);
        let template = crate::transform::docx::tests::docx_with_body("");
        let mut builder = DocxBuilder::from_template(&template).unwrap();
        let section = WorkbookSection {
            title: "V. Indicadores de Desempeño".to_string(),
            sheet: "Indicadores".to_string(),
            layout: SheetLayout::Table,
        };
        render_section(&book, &section, &mut builder, &TemplateConfig::default()).unwrap();
        assert_eq!(body_names(&builder.finish().unwrap()).len(), 1);
    }
}
