//! Document Extractors
//!
//! This module provides the extraction layer for turning diagram files into a
//! structured `Transcript` that the renderer and the statistics block consume.
//!
//! ## Architecture
//!
//! ```text
//! Diagram bytes (.bpmn)
//!     ↓
//! [XML tree]            parse_bytes
//!     ↓
//! [Shape map → lane areas → lane assignment]
//!     ↓
//! Transcript (structured)
//!     ↓
//! [Renderer] (+ statistics block)
//!     ↓
//! Text
//! ```
//!
//! ## Available Extractors
//!
//! - `BpmnExtractor` - BPMN 2.0 process diagrams

pub mod bpmn;
pub mod extractor;

// Re-export main types
pub use bpmn::BpmnExtractor;
pub use extractor::Extractor;
