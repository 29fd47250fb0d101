// bpmnscribe Core Library
//
// Turns BPMN diagrams into role-annotated Spanish transcripts, where each
// element's role comes from the lane its shape sits in, and fills Word report
// templates from Word or Excel sources.

pub mod config;
pub mod error;
pub mod extractors;
pub mod processor;
pub mod statistics;
pub mod transform;
pub mod types;
pub mod xml;

// Re-export main types and functions for easy use
pub use config::{ConversionConfig, ExtractionConfig, TemplateConfig};
pub use error::{ParseError, TransformError};
pub use extractors::{BpmnExtractor, Extractor};
pub use processor::{ConversionOutput, ConversionProcessor};
pub use statistics::{parse_statistics, ParsedStatistics, RoleStatistics};
pub use transform::{transform, UploadedFile};
pub use types::*;
