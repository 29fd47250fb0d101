//! BPMN Extractor
//!
//! Reads a BPMN 2.0 document and produces a role-annotated transcript:
//! pools, then every process with its lanes, its elements (each placed in a
//! lane by geometry) and its sequence flows.
//!
//! Three lookups are built per call and dropped with it:
//! - shape map: element id → rectangle, over the whole diagram section
//! - lane areas: per process, in lane declaration order
//! - element index: per process, id → element (for flow endpoints)

pub mod geometry;
pub mod render;

use crate::config::ExtractionConfig;
use crate::error::ParseError;
use crate::extractors::Extractor;
use crate::statistics::RoleStatistics;
use crate::types::*;
use crate::xml::{self, XmlElement};
use geometry::ShapeMap;
use std::collections::HashMap;
use std::path::Path;

pub const BPMN_MODEL_NS: &str = "http://www.omg.org/spec/BPMN/20100524/MODEL";
pub const BPMN_DI_NS: &str = "http://www.omg.org/spec/BPMN/20100524/DI";
pub const DC_NS: &str = "http://www.omg.org/spec/DD/20100524/DC";
pub const DI_NS: &str = "http://www.omg.org/spec/DD/20100524/DI";

/// Prefix → URI bindings of BPMN 2.0 interchange files
pub static NAMESPACES: [(&str, &str); 4] = [
    ("bpmn", BPMN_MODEL_NS),
    ("bpmndi", BPMN_DI_NS),
    ("dc", DC_NS),
    ("di", DI_NS),
];

pub struct BpmnExtractor {
    config: ExtractionConfig,
}

impl Default for BpmnExtractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

impl BpmnExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Bytes in, report text out. Only malformed XML fails.
    pub fn extract_text(&self, bytes: &[u8]) -> Result<String, ParseError> {
        let transcript = self.extract(bytes)?;
        Ok(self.render(&transcript))
    }

    /// Render a transcript, appending the statistics block when configured
    pub fn render(&self, transcript: &Transcript) -> String {
        let mut text = render::render_transcript(transcript);
        if self.config.include_statistics {
            text.push_str("\n\n");
            text.push_str(&RoleStatistics::from_transcript(transcript).render());
        }
        text
    }

    fn report(&self, diagnostic: Diagnostic, diagnostics: &mut Vec<Diagnostic>) {
        if self.config.warn_on_degraded_input {
            tracing::warn!(?diagnostic, "degraded input");
        } else {
            tracing::debug!(?diagnostic, "degraded input");
        }
        diagnostics.push(diagnostic);
    }

    fn extract_process(
        &self,
        process: &XmlElement,
        id: &str,
        shapes: &ShapeMap,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ProcessTranscript {
        let name = process.attr("name").unwrap_or(UNNAMED).to_string();

        // Lane pass
        let mut lanes = Vec::new();
        for lane in process
            .children_named(BPMN_MODEL_NS, "laneSet")
            .flat_map(|set| set.children_named(BPMN_MODEL_NS, "lane"))
        {
            let Some(lane_id) = lane.attr("id") else {
                continue;
            };
            let area = shapes.get(lane_id);
            if area.is_none() {
                self.report(
                    Diagnostic::MissingGeometry {
                        element_id: lane_id.to_string(),
                    },
                    diagnostics,
                );
            }
            lanes.push(Lane {
                id: lane_id.to_string(),
                name: lane.attr("name").unwrap_or(UNNAMED).to_string(),
                area,
            });
        }

        // Element pass: direct children only, document order
        let mut elements: Vec<FlowElement> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for child in &process.children {
            let Some(element_id) = child.attr("id") else {
                continue;
            };
            let Some(kind) = ElementKind::from_tag(&child.name) else {
                continue;
            };

            let bounds = shapes.get(element_id);
            let lane = match bounds {
                Some(bounds) => match geometry::find_lane(bounds.center(), &lanes) {
                    Some(lane) => LaneAssignment::Lane {
                        id: lane.id.clone(),
                        name: lane.name.clone(),
                    },
                    None => LaneAssignment::Unassigned,
                },
                None => {
                    self.report(
                        Diagnostic::MissingGeometry {
                            element_id: element_id.to_string(),
                        },
                        diagnostics,
                    );
                    LaneAssignment::Unassigned
                }
            };
            tracing::debug!(element = element_id, lane = lane.lane_id(), "placed element");

            index.insert(element_id.to_string(), elements.len());
            elements.push(FlowElement {
                kind,
                id: element_id.to_string(),
                name: child.attr("name").unwrap_or(UNNAMED).to_string(),
                bounds,
                lane,
            });
        }

        // Flow pass: after every element of the process is known
        let mut flows = Vec::new();
        for child in process.children.iter().filter(|c| c.name == "sequenceFlow") {
            let Some(flow_id) = child.attr("id") else {
                continue;
            };
            let mut endpoint = |reference: Option<&str>| {
                let reference = reference.unwrap_or_default();
                match index.get(reference).map(|&i| &elements[i]) {
                    Some(element) => FlowEndpoint {
                        id: reference.to_string(),
                        name: Some(element.name.clone()),
                        role: element.lane.role().to_string(),
                    },
                    None => {
                        self.report(
                            Diagnostic::UnresolvedReference {
                                flow_id: flow_id.to_string(),
                                reference: reference.to_string(),
                            },
                            diagnostics,
                        );
                        FlowEndpoint {
                            id: reference.to_string(),
                            name: None,
                            role: UNASSIGNED_ROLE.to_string(),
                        }
                    }
                }
            };
            let source = endpoint(child.attr("sourceRef"));
            let target = endpoint(child.attr("targetRef"));
            flows.push(SequenceFlow {
                id: flow_id.to_string(),
                source,
                target,
            });
        }

        ProcessTranscript {
            id: id.to_string(),
            name,
            lanes,
            elements,
            flows,
        }
    }
}

fn collect_pools(root: &XmlElement) -> Vec<Pool> {
    root.children_named(BPMN_MODEL_NS, "collaboration")
        .flat_map(|collaboration| collaboration.children_named(BPMN_MODEL_NS, "participant"))
        .map(|participant| Pool {
            name: participant.attr("name").unwrap_or(UNNAMED).to_string(),
            process_ref: participant.attr("processRef").map(str::to_string),
        })
        .collect()
}

impl Extractor for BpmnExtractor {
    fn parse_bytes(&self, bytes: &[u8]) -> Result<XmlElement, ParseError> {
        xml::parse_document(bytes)
    }

    fn build_transcript(&self, document: &XmlElement) -> Transcript {
        let mut diagnostics = Vec::new();

        let shapes = ShapeMap::from_document(document, &mut diagnostics);
        let pools = collect_pools(document);

        let mut processes = Vec::new();
        for process in document.children_named(BPMN_MODEL_NS, "process") {
            let Some(id) = process.attr("id") else {
                tracing::warn!("process without id, skipped");
                continue;
            };
            processes.push(self.extract_process(process, id, &shapes, &mut diagnostics));
        }

        let transcript = Transcript {
            pools,
            processes,
            diagnostics,
        };
        tracing::info!(
            shapes = shapes.len(),
            pools = transcript.pools.len(),
            processes = transcript.processes.len(),
            lanes = transcript.lane_count(),
            elements = transcript.element_count(),
            flows = transcript.flow_count(),
            diagnostics = transcript.diagnostics.len(),
            "BPMN extraction complete"
        );
        transcript
    }

    fn name(&self) -> &str {
        "BpmnExtractor"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        if let Some(extension) = path.extension() {
            let extension = extension.to_str().unwrap_or("").to_lowercase();
            self.config.extensions.iter().any(|e| *e == extension)
        } else {
            false
        }
    }
}
