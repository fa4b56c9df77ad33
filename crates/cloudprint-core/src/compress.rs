//! Size reduction for print uploads
//!
//! Strips descriptive metadata, drops unreachable objects and Flate-compresses
//! every stream that is not compressed yet.

use crate::error::CloudPrintError;
use lopdf::{Dictionary, Document, Object};
use serde::Serialize;

/// Written as both Producer and Creator
pub const PRODUCER: &str = "CloudPrint";

const CLEARED_FIELDS: [&str; 4] = ["Title", "Author", "Subject", "Keywords"];

#[derive(Debug, Clone, Serialize)]
pub struct CompressOutcome {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub original_size: usize,
    pub compressed_size: usize,
}

impl CompressOutcome {
    /// Percentage saved relative to the input; negative when the output grew
    pub fn savings_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (1.0 - self.compressed_size as f64 / self.original_size as f64) * 100.0
    }
}

pub fn compress_document(bytes: &[u8]) -> Result<CompressOutcome, CloudPrintError> {
    let mut doc =
        Document::load_mem(bytes).map_err(|e| CloudPrintError::ParseError(e.to_string()))?;

    scrub_info(&mut doc);
    doc.prune_objects();
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| CloudPrintError::OperationError(format!("Save failed: {}", e)))?;

    tracing::info!(
        "Compressed {} bytes to {} bytes",
        bytes.len(),
        buffer.len()
    );

    Ok(CompressOutcome {
        original_size: bytes.len(),
        compressed_size: buffer.len(),
        bytes: buffer,
    })
}

/// Blank the descriptive fields and stamp the producer
fn scrub_info(doc: &mut Document) {
    let info_ref = doc
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .ok();

    let existing = info_ref.and_then(|id| {
        doc.get_object_mut(id)
            .and_then(Object::as_dict_mut)
            .ok()
    });

    match existing {
        Some(info) => stamp(info),
        None => {
            let mut info = Dictionary::new();
            stamp(&mut info);
            let info_id = doc.add_object(info);
            doc.trailer.set("Info", Object::Reference(info_id));
        }
    }
}

fn stamp(info: &mut Dictionary) {
    for field in CLEARED_FIELDS {
        info.set(field, Object::string_literal(""));
    }
    info.set("Producer", Object::string_literal(PRODUCER));
    info.set("Creator", Object::string_literal(PRODUCER));
}
