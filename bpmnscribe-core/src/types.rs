use serde::{Deserialize, Serialize};

/// Display name used when an element carries no `name` attribute
pub const UNNAMED: &str = "(sin nombre)";
/// Lane id recorded for elements no lane contains
pub const UNASSIGNED_LANE_ID: &str = "SinLane";
/// Role rendered for elements no lane contains
pub const UNASSIGNED_ROLE: &str = "Sin rol";

// ===== GEOMETRY =====

/// Axis-aligned rectangle from a diagram-interchange `Bounds` record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive on all four edges
    pub fn contains_point(&self, (px, py): (f64, f64)) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }
}

// ===== ELEMENT KINDS =====

/// Process children that are rendered and can be placed in a lane.
/// Anything else under a process (sequence flows, lane sets, data objects,
/// text annotations...) is not an element for the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    Task,
    UserTask,
    ManualTask,
    ServiceTask,
    ReceiveTask,
    SendTask,
    ScriptTask,
    BusinessRuleTask,
    CallActivity,
    StartEvent,
    EndEvent,
    IntermediateCatchEvent,
    IntermediateThrowEvent,
    BoundaryEvent,
    ExclusiveGateway,
    InclusiveGateway,
    ParallelGateway,
    EventBasedGateway,
    ComplexGateway,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementCategory {
    Activity,
    Event,
    Gateway,
}

impl ElementKind {
    pub const ALL: [ElementKind; 19] = [
        ElementKind::Task,
        ElementKind::UserTask,
        ElementKind::ManualTask,
        ElementKind::ServiceTask,
        ElementKind::ReceiveTask,
        ElementKind::SendTask,
        ElementKind::ScriptTask,
        ElementKind::BusinessRuleTask,
        ElementKind::CallActivity,
        ElementKind::StartEvent,
        ElementKind::EndEvent,
        ElementKind::IntermediateCatchEvent,
        ElementKind::IntermediateThrowEvent,
        ElementKind::BoundaryEvent,
        ElementKind::ExclusiveGateway,
        ElementKind::InclusiveGateway,
        ElementKind::ParallelGateway,
        ElementKind::EventBasedGateway,
        ElementKind::ComplexGateway,
    ];

    /// Exact, case-sensitive match on the local tag name
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::Task => "task",
            ElementKind::UserTask => "userTask",
            ElementKind::ManualTask => "manualTask",
            ElementKind::ServiceTask => "serviceTask",
            ElementKind::ReceiveTask => "receiveTask",
            ElementKind::SendTask => "sendTask",
            ElementKind::ScriptTask => "scriptTask",
            ElementKind::BusinessRuleTask => "businessRuleTask",
            ElementKind::CallActivity => "callActivity",
            ElementKind::StartEvent => "startEvent",
            ElementKind::EndEvent => "endEvent",
            ElementKind::IntermediateCatchEvent => "intermediateCatchEvent",
            ElementKind::IntermediateThrowEvent => "intermediateThrowEvent",
            ElementKind::BoundaryEvent => "boundaryEvent",
            ElementKind::ExclusiveGateway => "exclusiveGateway",
            ElementKind::InclusiveGateway => "inclusiveGateway",
            ElementKind::ParallelGateway => "parallelGateway",
            ElementKind::EventBasedGateway => "eventBasedGateway",
            ElementKind::ComplexGateway => "complexGateway",
        }
    }

    pub fn category(&self) -> ElementCategory {
        match self {
            ElementKind::Task
            | ElementKind::UserTask
            | ElementKind::ManualTask
            | ElementKind::ServiceTask
            | ElementKind::ReceiveTask
            | ElementKind::SendTask
            | ElementKind::ScriptTask
            | ElementKind::BusinessRuleTask
            | ElementKind::CallActivity => ElementCategory::Activity,
            ElementKind::StartEvent
            | ElementKind::EndEvent
            | ElementKind::IntermediateCatchEvent
            | ElementKind::IntermediateThrowEvent
            | ElementKind::BoundaryEvent => ElementCategory::Event,
            ElementKind::ExclusiveGateway
            | ElementKind::InclusiveGateway
            | ElementKind::ParallelGateway
            | ElementKind::EventBasedGateway
            | ElementKind::ComplexGateway => ElementCategory::Gateway,
        }
    }
}

// ===== TRANSCRIPT MODEL =====
// Everything below is rebuilt from scratch for every extraction call.

/// Result of the geometric containment test for one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LaneAssignment {
    Lane { id: String, name: String },
    Unassigned,
}

impl LaneAssignment {
    pub fn lane_id(&self) -> &str {
        match self {
            LaneAssignment::Lane { id, .. } => id,
            LaneAssignment::Unassigned => UNASSIGNED_LANE_ID,
        }
    }

    /// Label shown after `Rol:` in the transcript
    pub fn role(&self) -> &str {
        match self {
            LaneAssignment::Lane { name, .. } => name,
            LaneAssignment::Unassigned => UNASSIGNED_ROLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub name: String,
    pub process_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub id: String,
    pub name: String,
    /// `None` when the diagram has no shape for this lane; such a lane never contains anything
    pub area: Option<BoundingBox>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowElement {
    pub kind: ElementKind,
    pub id: String,
    pub name: String,
    pub bounds: Option<BoundingBox>,
    pub lane: LaneAssignment,
}

/// One end of a sequence flow, resolved against the elements of its process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEndpoint {
    /// The raw `sourceRef`/`targetRef` value
    pub id: String,
    /// Name of the referenced element, `None` when the reference is unknown
    pub name: Option<String>,
    pub role: String,
}

impl FlowEndpoint {
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceFlow {
    pub id: String,
    pub source: FlowEndpoint,
    pub target: FlowEndpoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessTranscript {
    pub id: String,
    pub name: String,
    pub lanes: Vec<Lane>,
    pub elements: Vec<FlowElement>,
    pub flows: Vec<SequenceFlow>,
}

/// Degraded-but-accepted input, reported alongside the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// An element or lane has no diagram shape
    MissingGeometry { element_id: String },
    /// A shape exists but its bounds could not be read; the shape is ignored
    InvalidShape { element_id: String, reason: String },
    /// A sequence flow points at an id that is not an element of its process
    UnresolvedReference { flow_id: String, reference: String },
}

/// Structured projection of a BPMN document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub pools: Vec<Pool>,
    pub processes: Vec<ProcessTranscript>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Transcript {
    pub fn element_count(&self) -> usize {
        self.processes.iter().map(|p| p.elements.len()).sum()
    }

    pub fn flow_count(&self) -> usize {
        self.processes.iter().map(|p| p.flows.len()).sum()
    }

    pub fn lane_count(&self) -> usize {
        self.processes.iter().map(|p| p.lanes.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_and_inclusive_containment() {
        let lane = BoundingBox::new(0.0, 0.0, 200.0, 200.0);
        assert_eq!(BoundingBox::new(50.0, 50.0, 20.0, 20.0).center(), (60.0, 60.0));
        assert!(lane.contains_point((60.0, 60.0)));
        assert!(lane.contains_point((200.0, 0.0)));
        assert!(!lane.contains_point((200.5, 10.0)));
        assert!(!lane.contains_point((-0.1, 10.0)));
    }

    #[test]
    fn test_tag_lookup_is_exact() {
        assert_eq!(ElementKind::from_tag("userTask"), Some(ElementKind::UserTask));
        assert_eq!(ElementKind::from_tag("UserTask"), None);
        assert_eq!(ElementKind::from_tag("sequenceFlow"), None);
        assert_eq!(ElementKind::from_tag("laneSet"), None);
        for kind in ElementKind::ALL {
            assert_eq!(ElementKind::from_tag(kind.tag()), Some(kind));
        }
    }

    #[test]
    fn test_unassigned_labels() {
        assert_eq!(LaneAssignment::Unassigned.lane_id(), "SinLane");
        assert_eq!(LaneAssignment::Unassigned.role(), "Sin rol");
    }
}
