//! Transcript → text
//!
//! The layout is consumed by people and by the statistics parser, so it is
//! reproduced literally: pools block (only when there are pools), then the
//! processes block, one blank line between processes.

use crate::types::{FlowElement, Lane, ProcessTranscript, SequenceFlow, Transcript};

pub const POOLS_HEADER: &str = "=== POOLS ===";
pub const PROCESSES_HEADER: &str = "=== PROCESOS ===";
/// Shown for a pool that references no process (black-box participant)
pub const NO_PROCESS: &str = "(sin proceso)";

pub fn render_transcript(transcript: &Transcript) -> String {
    let mut lines: Vec<String> = Vec::new();

    if !transcript.pools.is_empty() {
        lines.push(POOLS_HEADER.to_string());
        for pool in &transcript.pools {
            lines.push(format!(
                "Pool: {} (Proceso: {})",
                pool.name,
                pool.process_ref.as_deref().unwrap_or(NO_PROCESS)
            ));
        }
        lines.push(String::new());
    }

    lines.push(PROCESSES_HEADER.to_string());
    lines.push(String::new());

    for (index, process) in transcript.processes.iter().enumerate() {
        if index > 0 {
            lines.push(String::new());
        }
        render_process(process, &mut lines);
    }

    lines.join("\n")
}

fn render_process(process: &ProcessTranscript, lines: &mut Vec<String>) {
    lines.push(format!("Proceso: {} (ID: {})", process.name, process.id));
    lines.extend(process.lanes.iter().map(lane_line));
    lines.extend(process.elements.iter().map(element_line));
    lines.extend(process.flows.iter().map(flow_line));
}

fn lane_line(lane: &Lane) -> String {
    format!("  Lane: {} (ID: {})", lane.name, lane.id)
}

fn element_line(element: &FlowElement) -> String {
    format!(
        "  [{}] {} (ID: {}, Rol: {})",
        element.kind.tag(),
        element.name,
        element.id,
        element.lane.role()
    )
}

fn flow_line(flow: &SequenceFlow) -> String {
    format!(
        "  [sequenceFlow] {} (Rol: {}) ➝ {} (Rol: {})",
        flow.source.label(),
        flow.source.role,
        flow.target.label(),
        flow.target.role
    )
}
