//! Per-role statistics block
//!
//! Producer and consumer of the block appended after a transcript:
//!
//! ```text
//! === ESTADÍSTICAS ===
//! Tareas por rol:
//! - Ventas (3 tareas (75.0%))
//! - Sin rol (1 tareas (25.0%))
//! Gateways por rol:
//! - Ventas (1 gateways (100.0%))
//! ```
//!
//! The consumer splits each line on `(` and strips `%`/`)`, so a role name
//! containing a parenthesis does not survive the round trip. That grammar is
//! what existing readers of these reports expect and is kept as is.

use crate::types::{ElementCategory, Transcript};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const STATISTICS_HEADER: &str = "=== ESTADÍSTICAS ===";
const TASKS_HEADING: &str = "Tareas por rol:";
const GATEWAYS_HEADING: &str = "Gateways por rol:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatCategory {
    Tasks,
    Gateways,
}

impl StatCategory {
    fn word(&self) -> &'static str {
        match self {
            StatCategory::Tasks => "tareas",
            StatCategory::Gateways => "gateways",
        }
    }

    fn from_word(word: &str) -> Option<Self> {
        match word {
            "tareas" => Some(StatCategory::Tasks),
            "gateways" => Some(StatCategory::Gateways),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleCount {
    pub role: String,
    pub count: usize,
    pub percent: f64,
}

/// Task and gateway counts per rendered role, in order of first appearance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleStatistics {
    pub tasks: Vec<RoleCount>,
    pub gateways: Vec<RoleCount>,
}

impl RoleStatistics {
    pub fn from_transcript(transcript: &Transcript) -> Self {
        let mut tasks: IndexMap<String, usize> = IndexMap::new();
        let mut gateways: IndexMap<String, usize> = IndexMap::new();

        for element in transcript.processes.iter().flat_map(|p| &p.elements) {
            let bucket = match element.kind.category() {
                ElementCategory::Activity => &mut tasks,
                ElementCategory::Gateway => &mut gateways,
                ElementCategory::Event => continue,
            };
            *bucket.entry(element.lane.role().to_string()).or_insert(0) += 1;
        }

        Self {
            tasks: to_role_counts(tasks),
            gateways: to_role_counts(gateways),
        }
    }

    pub fn total_tasks(&self) -> usize {
        self.tasks.iter().map(|c| c.count).sum()
    }

    pub fn total_gateways(&self) -> usize {
        self.gateways.iter().map(|c| c.count).sum()
    }

    pub fn render(&self) -> String {
        let mut lines = vec![STATISTICS_HEADER.to_string(), TASKS_HEADING.to_string()];
        lines.extend(self.tasks.iter().map(|c| stat_line(c, StatCategory::Tasks)));
        lines.push(GATEWAYS_HEADING.to_string());
        lines.extend(self.gateways.iter().map(|c| stat_line(c, StatCategory::Gateways)));
        lines.join("\n")
    }
}

fn to_role_counts(counts: IndexMap<String, usize>) -> Vec<RoleCount> {
    let total: usize = counts.values().sum();
    counts
        .into_iter()
        .map(|(role, count)| RoleCount {
            role,
            count,
            percent: count as f64 * 100.0 / total as f64,
        })
        .collect()
}

fn stat_line(count: &RoleCount, category: StatCategory) -> String {
    format!(
        "- {} ({} {} ({:.1}%))",
        count.role,
        count.count,
        category.word(),
        count.percent
    )
}

/// Tables recovered from a report's statistics block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedStatistics {
    pub tasks: Vec<RoleCount>,
    pub gateways: Vec<RoleCount>,
}

/// Read the statistics block of a report. `None` when the report has none.
///
/// Every `- ` line under the marker yields an entry; unreadable counts and
/// percentages become 0. The category comes from the line itself, or from the
/// heading above it; lines with neither are dropped.
pub fn parse_statistics(text: &str) -> Option<ParsedStatistics> {
    let (_, block) = text.split_once(STATISTICS_HEADER)?;
    let mut parsed = ParsedStatistics::default();
    let mut heading: Option<StatCategory> = None;

    for line in block.lines().map(str::trim) {
        if line.starts_with("===") {
            break;
        }
        if line == TASKS_HEADING {
            heading = Some(StatCategory::Tasks);
            continue;
        }
        if line == GATEWAYS_HEADING {
            heading = Some(StatCategory::Gateways);
            continue;
        }
        let Some(entry) = line.strip_prefix("- ") else {
            continue;
        };

        let (count, category) = parse_entry(entry);
        match category.or(heading) {
            Some(StatCategory::Tasks) => parsed.tasks.push(count),
            Some(StatCategory::Gateways) => parsed.gateways.push(count),
            None => tracing::debug!(line, "statistics line without category, skipped"),
        }
    }

    Some(parsed)
}

fn parse_entry(entry: &str) -> (RoleCount, Option<StatCategory>) {
    let parts: Vec<&str> = entry.split('(').collect();
    let role = parts[0].trim().to_string();

    let mut words = parts.get(1).into_iter().flat_map(|p| p.split_whitespace());
    let count = words.next().and_then(|w| w.parse().ok()).unwrap_or(0);
    let category = words.next().and_then(StatCategory::from_word);

    let percent = parts
        .get(2)
        .map(|p| p.replace(|c: char| c == '%' || c == ')', ""))
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(0.0);

    (
        RoleCount {
            role,
            count,
            percent,
        },
        category,
    )
}
