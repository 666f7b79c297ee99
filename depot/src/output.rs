//! Output formatting for CLI commands.
//!
//! Provides abstraction layer for outputting results in text or JSON format.

use anyhow::Result;
use depot_core::{Digest, FileRecord, StoreStats};
use serde::Serialize;
use std::io::{self, Write};

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Writer for command output with format abstraction.
pub struct OutputWriter {
    format: OutputFormat,
    stdout: io::Stdout,
}

impl OutputWriter {
    /// Create a new OutputWriter.
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            stdout: io::stdout(),
        }
    }

    /// Check if JSON mode is enabled.
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Write output using the configured format.
    ///
    /// The `data` parameter must be a serializable struct that includes a
    /// `success: bool` field.
    ///
    /// The `text_fn` closure is called only in text mode to generate the
    /// human-readable output.
    pub fn write<T: Serialize>(&self, data: &T, text_fn: impl FnOnce() -> String) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(data)?;
                writeln!(&self.stdout, "{}", json)?;
            }
            OutputFormat::Text => {
                let text = text_fn();
                if !text.is_empty() {
                    write!(&self.stdout, "{}", text)?;
                }
            }
        }
        Ok(())
    }

    /// Write an error message to stderr.
    ///
    /// In JSON mode, writes a JSON error envelope with success=false.
    /// In text mode, writes the error message directly.
    pub fn write_error(&self, error: &anyhow::Error) {
        match self.format {
            OutputFormat::Json => {
                let error_output = ErrorOutput {
                    success: false,
                    error: error.to_string(),
                };
                if let Ok(json) = serde_json::to_string_pretty(&error_output) {
                    let _ = writeln!(io::stderr(), "{}", json);
                }
            }
            OutputFormat::Text => {
                let _ = writeln!(io::stderr(), "Error: {}", error);
            }
        }
    }
}

/// Format a byte count for human-readable text output.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

// ============================================================================
// Data Transfer Objects (DTOs) for JSON output
// ============================================================================

/// Error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub success: bool,
    pub error: String,
}

/// Output for `add` command.
#[derive(Debug, Serialize)]
pub struct AddOutput {
    pub success: bool,
    pub digest: Digest,
    pub display_name: String,
    pub size_bytes: u64,
    pub media_type: String,
    pub deduplicated: bool,
}

/// Output for `get` and `fetch` commands when writing to a file.
#[derive(Debug, Serialize)]
pub struct ContentOutput {
    pub success: bool,
    pub digest: Digest,
    pub display_name: String,
    pub media_type: String,
    pub size_bytes: u64,
    pub written_to: String,
}

/// Output for `rm` command.
#[derive(Debug, Serialize)]
pub struct RmOutput {
    pub success: bool,
    pub digest: Digest,
    pub display_name: String,
    pub size_bytes: u64,
}

/// Output for `ls` command.
#[derive(Debug, Serialize)]
pub struct LsOutput {
    pub success: bool,
    pub files: Vec<FileRecord>,
    pub total: u64,
    pub limit: usize,
    pub offset: usize,
}

/// Output for `info` command.
#[derive(Debug, Serialize)]
pub struct InfoOutput {
    pub success: bool,
    pub file: FileRecord,
}

/// Output for `stats` command.
#[derive(Debug, Serialize)]
pub struct StatsOutput {
    pub success: bool,
    pub stats: StoreStats,
    pub max_object_bytes: u64,
    pub max_total_bytes: u64,
}

/// Output for `search` command.
#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub success: bool,
    pub files: Vec<FileRecord>,
    pub total: u64,
}

/// Output for `check` command.
#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub success: bool,
    pub digest: Digest,
    pub intact: bool,
}
