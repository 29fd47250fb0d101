// All conversion logic is in bpmnscribe-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod output;

// Re-export core types for convenience
pub use bpmnscribe_core::*;

// Re-export CLI utilities
pub use output::{save_conversion, write_file, OutputFormat};
