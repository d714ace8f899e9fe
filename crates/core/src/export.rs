//! Rendering of failed items for export.
//!
//! After a run settles the operator can export every failed item's
//! sequence number, original input, and failure reason, either as plain
//! text (one line per failure) or as structured JSON.

use serde::Serialize;

use crate::item::{BatchItem, ItemStatus};

/// Output format for the failure export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// One human-readable line per failed item.
    Text,
    /// A JSON array of failure records.
    Structured,
}

impl ExportFormat {
    /// Parse from a string, defaulting to `Text` for unknown values.
    pub fn from_str(s: &str) -> Self {
        match s {
            "structured" | "json" => ExportFormat::Structured,
            _ => ExportFormat::Text,
        }
    }
}

/// One row of the structured export.
#[derive(Debug, Serialize)]
struct FailureRecord<'a> {
    sequence_number: u32,
    original_input: &'a str,
    kind: &'a str,
    error: &'a str,
}

/// Render all `Failed` items in the requested format.
///
/// Items are emitted in sequence-number order regardless of completion
/// order. Returns an empty text document / empty JSON array when nothing
/// failed.
pub fn render_failures(items: &[BatchItem], format: ExportFormat) -> String {
    let mut failed: Vec<&BatchItem> = items
        .iter()
        .filter(|i| i.status == ItemStatus::Failed)
        .collect();
    failed.sort_by_key(|i| i.sequence_number);

    match format {
        ExportFormat::Text => failed
            .iter()
            .map(|item| {
                let error = item
                    .error
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown error".to_string());
                format!("#{} {}: {}", item.sequence_number, item.original_input, error)
            })
            .collect::<Vec<_>>()
            .join("\n"),
        ExportFormat::Structured => {
            let records: Vec<FailureRecord<'_>> = failed
                .iter()
                .map(|item| {
                    let (kind, error) = item
                        .error
                        .as_ref()
                        .map(|e| (e.kind.as_str(), e.message.as_str()))
                        .unwrap_or(("unknown", "unknown error"));
                    FailureRecord {
                        sequence_number: item.sequence_number,
                        original_input: &item.original_input,
                        kind,
                        error,
                    }
                })
                .collect();
            // Serialization of these borrowed records cannot fail.
            serde_json::to_string_pretty(&records).unwrap_or_else(|_| "[]".to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
