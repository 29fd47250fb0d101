use anyhow::Result;
use serde::{Deserialize, Serialize};

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_bpmn_extensions() -> Vec<String> {
    vec!["bpmn".to_string(), "xml".to_string()]
}

fn default_template_path() -> Option<String> {
    Some("plantilla/Plantilla.docx".to_string())
}

fn default_image_width_inches() -> f64 {
    6.0
}

/// Top-level configuration for both conversions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionConfig {
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub template: TemplateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Append the per-role statistics block after the transcript
    #[serde(default)]
    pub include_statistics: bool,
    /// Log a warning for every missing shape and dangling reference
    #[serde(default = "default_true")]
    pub warn_on_degraded_input: bool,
    /// File extensions accepted by `supports_file_type` (lowercase, no dot)
    #[serde(default = "default_bpmn_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            include_statistics: false,
            warn_on_degraded_input: true,
            extensions: default_bpmn_extensions(),
        }
    }
}

/// One heading of the fixed report outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineSection {
    /// Heading written into the report
    pub title: String,
    /// Paragraph prefixes (case-insensitive) that open this section in a Word source
    pub keywords: Vec<String>,
}

/// How a worksheet is rendered under its outline heading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SheetLayout {
    /// Whole sheet as a table, header row first; nothing when the sheet has no data rows
    Table,
    /// Text values of one column as bullet paragraphs
    BulletColumn {
        column: usize,
        #[serde(default)]
        exclude: Vec<String>,
        #[serde(default)]
        distinct_sorted: bool,
    },
    /// Columns `start..end` as a table with generic headers, fully empty rows dropped
    ColumnRange { start: usize, end: usize },
    /// First picture of the sheet, or the sheet as a table when it has none
    ImageOrTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkbookSection {
    /// Must match an outline title
    pub title: String,
    pub sheet: String,
    pub layout: SheetLayout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Default location of the Word template when none is given
    #[serde(default = "default_template_path")]
    pub template_path: Option<String>,
    #[serde(default = "default_outline")]
    pub outline: Vec<OutlineSection>,
    /// Sections produced from an Excel source, in output order
    #[serde(default = "default_workbook_sections")]
    pub workbook_sections: Vec<WorkbookSection>,
    #[serde(default = "default_image_width_inches")]
    pub image_width_inches: f64,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            template_path: default_template_path(),
            outline: default_outline(),
            workbook_sections: default_workbook_sections(),
            image_width_inches: default_image_width_inches(),
        }
    }
}

fn section(title: &str, keywords: &[&str]) -> OutlineSection {
    OutlineSection {
        title: title.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

pub fn default_outline() -> Vec<OutlineSection> {
    vec![
        section("I. Flujo del Proceso", &["Flujo del Proceso"]),
        section("II. Descripción de Actividades", &["Descripción de actividades"]),
        section("III. Roles y Responsabilidades", &["Roles y Responsabilidades"]),
        section("IV. Criterio de Aceptación", &["Criterio de Aceptación"]),
        section(
            "V. Indicadores de Desempeño",
            &["Indicadores de Desempeño", "Metas de Desempeño"],
        ),
        section("VI. Riesgos", &["Riesgos"]),
        section(
            "VII. Información Documentada Mantenida (Referencias)",
            &["Información Documentada de Referencia"],
        ),
        section(
            "VIII. Información Documentada Conservada (Registros)",
            &["Información documentada conservada"],
        ),
        section("IX. Anexos", &["Anexos"]),
        section(
            "X. Registro de Cambios",
            &["Registro de cambio", "Registro de cambios"],
        ),
    ]
}

fn sheet_section(title: &str, sheet: &str, layout: SheetLayout) -> WorkbookSection {
    WorkbookSection {
        title: title.to_string(),
        sheet: sheet.to_string(),
        layout,
    }
}

pub fn default_workbook_sections() -> Vec<WorkbookSection> {
    vec![
        sheet_section("I. Flujo del Proceso", "Flujo", SheetLayout::ImageOrTable),
        sheet_section(
            "II. Descripción de Actividades",
            "Descripción Proceso",
            SheetLayout::BulletColumn {
                column: 4,
                exclude: vec!["Cliente".to_string(), "ComoCuando".to_string()],
                distinct_sorted: false,
            },
        ),
        sheet_section(
            "III. Roles y Responsabilidades",
            "Descripción Proceso",
            SheetLayout::BulletColumn {
                column: 2,
                exclude: vec!["Etapa".to_string(), "Quien".to_string()],
                distinct_sorted: true,
            },
        ),
        sheet_section(
            "IV. Criterio de Aceptación",
            "Productos y Servicios",
            SheetLayout::Table,
        ),
        sheet_section("V. Indicadores de Desempeño", "Indicadores", SheetLayout::Table),
        sheet_section("VI. Riesgos", "Gestión Riesgos", SheetLayout::Table),
        sheet_section(
            "VII. Información Documentada Mantenida (Referencias)",
            "Información Documentada",
            SheetLayout::ColumnRange { start: 0, end: 3 },
        ),
        sheet_section(
            "VIII. Información Documentada Conservada (Registros)",
            "Información Documentada",
            SheetLayout::ColumnRange { start: 4, end: 10 },
        ),
        sheet_section("X. Registro de Cambios", "Control de Cambios", SheetLayout::Table),
    ]
}

impl ConversionConfig {
    /// Load config from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ConversionConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback to defaults
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                tracing::warn!(path = p, error = %e, "failed to load config, using defaults");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
