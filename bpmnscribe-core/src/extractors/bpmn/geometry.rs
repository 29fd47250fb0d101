//! Layout-derived semantics
//!
//! BPMN files do carry `flowNodeRef` lane membership, but diagrams exported by
//! many modelers leave it stale or empty. Lane membership here is read from the
//! picture instead: an element belongs to the first lane (declaration order)
//! whose rectangle contains the element's center.

use super::{BPMN_DI_NS, DC_NS};
use crate::types::{BoundingBox, Diagnostic, Lane};
use crate::xml::XmlElement;
use std::collections::HashMap;

/// `bpmnElement` id → rectangle, over every shape in the document
#[derive(Debug, Default)]
pub struct ShapeMap {
    shapes: HashMap<String, BoundingBox>,
}

impl ShapeMap {
    /// Scan all `BPMNShape` records. A shape whose bounds cannot be read is
    /// dropped and reported; later shapes for the same id replace earlier ones.
    pub fn from_document(root: &XmlElement, diagnostics: &mut Vec<Diagnostic>) -> Self {
        let mut shapes = HashMap::new();

        for shape in root.descendants_named(BPMN_DI_NS, "BPMNShape") {
            let Some(element_id) = shape.attr("bpmnElement") else {
                tracing::debug!(shape = shape.attr("id"), "shape without bpmnElement, skipped");
                continue;
            };

            match parse_bounds(shape) {
                Ok(bounds) => {
                    shapes.insert(element_id.to_string(), bounds);
                }
                Err(reason) => {
                    tracing::warn!(element = element_id, %reason, "ignoring shape with unreadable bounds");
                    diagnostics.push(Diagnostic::InvalidShape {
                        element_id: element_id.to_string(),
                        reason,
                    });
                }
            }
        }

        Self { shapes }
    }

    pub fn get(&self, element_id: &str) -> Option<BoundingBox> {
        self.shapes.get(element_id).copied()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

fn parse_bounds(shape: &XmlElement) -> Result<BoundingBox, String> {
    let bounds = shape
        .child(DC_NS, "Bounds")
        .ok_or_else(|| "shape has no Bounds".to_string())?;

    let read = |key: &str| -> Result<f64, String> {
        let raw = bounds
            .attr(key)
            .ok_or_else(|| format!("missing attribute '{key}'"))?;
        raw.trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid number for {key}: {raw}"))
    };

    Ok(BoundingBox::new(
        read("x")?,
        read("y")?,
        read("width")?,
        read("height")?,
    ))
}

/// First lane, in declaration order, whose area contains the point.
/// Lanes without an area never match.
pub fn find_lane(point: (f64, f64), lanes: &[Lane]) -> Option<&Lane> {
    lanes
        .iter()
        .find(|lane| lane.area.is_some_and(|area| area.contains_point(point)))
}
