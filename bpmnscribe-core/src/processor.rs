use crate::config::ConversionConfig;
use crate::error::TransformError;
use crate::extractors::{BpmnExtractor, Extractor};
use crate::statistics::RoleStatistics;
use crate::transform::{self, UploadedFile};
use crate::types::Transcript;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};

/// Everything one BPMN conversion produces
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// Report text, statistics block included when configured
    pub text: String,
    pub transcript: Transcript,
    pub statistics: RoleStatistics,
    pub generated_at: DateTime<Utc>,
}

impl ConversionOutput {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Simple profiler that collects timings for conversion steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.timings.push((step_name.to_string(), elapsed));
        tracing::info!(step = step_name, elapsed_ms = elapsed.as_millis() as u64, "step finished");

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn log_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();
        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            tracing::info!(
                step = step.as_str(),
                elapsed_ms = duration.as_millis() as u64,
                percentage = %format!("{percentage:.1}"),
                "profile"
            );
        }
        tracing::info!(total_ms = total.as_millis() as u64, "profile total");
    }
}

pub struct ConversionProcessor {
    extractor: BpmnExtractor,
    config: ConversionConfig,
    profiling: bool,
}

impl ConversionProcessor {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            extractor: BpmnExtractor::new(config.extraction.clone()),
            config,
            profiling: false,
        }
    }

    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// BPMN bytes → transcript, report text and per-role statistics
    pub fn convert_bpmn(&self, bytes: &[u8]) -> Result<ConversionOutput> {
        let mut profiler = StepProfiler::new(self.profiling);

        let document = profiler
            .time_step("XML parsing", || self.extractor.parse_bytes(bytes))
            .context("BPMN input is not well-formed XML")?;
        let transcript =
            profiler.time_step("Transcript extraction", || self.extractor.build_transcript(&document));
        let statistics =
            profiler.time_step("Statistics", || RoleStatistics::from_transcript(&transcript));
        let text = profiler.time_step("Rendering", || self.extractor.render(&transcript));

        profiler.log_summary();
        Ok(ConversionOutput {
            text,
            transcript,
            statistics,
            generated_at: Utc::now(),
        })
    }

    pub fn convert_bpmn_file(&self, input: &Path) -> Result<ConversionOutput> {
        if !self.extractor.supports_file_type(input) {
            tracing::warn!(
                path = %input.display(),
                extractor = self.extractor.name(),
                "unexpected extension, trying anyway"
            );
        }
        let bytes = std::fs::read(input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        tracing::info!(path = %input.display(), bytes = bytes.len(), "converting BPMN file");
        self.convert_bpmn(&bytes)
    }

    /// Fill the Word template from a `.docx` or `.xlsx` upload
    pub fn apply_template(
        &self,
        file: &UploadedFile,
        template_path: &Path,
    ) -> Result<Vec<u8>, TransformError> {
        let mut profiler = StepProfiler::new(self.profiling);
        let result = profiler.time_step("Template transform", || {
            transform::transform(file, template_path, &self.config.template)
        });
        profiler.log_summary();
        result
    }
}

impl Default for ConversionProcessor {
    fn default() -> Self {
        Self::new(ConversionConfig::default())
    }
}
