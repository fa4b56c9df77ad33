use std::time::Instant;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::CloudPrintError;
use crate::{compress_document, get_page_count, merge_documents, split_ranges};

/// A page-tool request, as sent by the web front end
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum PdfCommand {
    Merge {
        files: Vec<Vec<u8>>,
    },
    /// Ranges are concatenated into a single output
    Split {
        file: Vec<u8>,
        ranges: Vec<(u32, u32)>,
    },
    Compress {
        file: Vec<u8>,
    },
}

impl PdfCommand {
    pub fn name(&self) -> &'static str {
        match self {
            PdfCommand::Merge { .. } => "merge",
            PdfCommand::Split { .. } => "split",
            PdfCommand::Compress { .. } => "compress",
        }
    }

    pub fn input_size(&self) -> usize {
        match self {
            PdfCommand::Merge { files } => files.iter().map(Vec::len).sum(),
            PdfCommand::Split { file, .. } | PdfCommand::Compress { file } => file.len(),
        }
    }

    pub fn execute(&self) -> Result<Vec<u8>, CloudPrintError> {
        tracing::debug!("Executing {} command", self.name());
        match self {
            PdfCommand::Merge { files } => merge_documents(files.clone()),
            PdfCommand::Split { file, ranges } => {
                let parts = split_ranges(file, ranges)?;
                merge_documents(parts)
            }
            PdfCommand::Compress { file } => compress_document(file).map(|outcome| outcome.bytes),
        }
    }

    /// Execute and wrap the outcome for a JSON response
    pub fn process(&self) -> ProcessResult {
        let started = Instant::now();
        let input_size_bytes = self.input_size();

        match self.execute() {
            Ok(output) => {
                let metrics = ProcessMetrics {
                    input_size_bytes,
                    output_size_bytes: output.len(),
                    page_count: get_page_count(&output).unwrap_or(0),
                    processing_time_ms: started.elapsed().as_millis() as u64,
                };
                ProcessResult {
                    success: true,
                    data: Some(base64::engine::general_purpose::STANDARD.encode(&output)),
                    error: None,
                    metrics: Some(metrics),
                }
            }
            Err(e) => {
                tracing::warn!("{} command failed: {}", self.name(), e);
                ProcessResult {
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                    metrics: None,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub success: bool,
    /// Base64-encoded PDF data
    pub data: Option<String>,
    pub error: Option<String>,
    pub metrics: Option<ProcessMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessMetrics {
    pub input_size_bytes: usize,
    pub output_size_bytes: usize,
    pub page_count: u32,
    pub processing_time_ms: u64,
}
