//! PDF merge
//!
//! Concatenates the pages of several PDFs, in input order, into one document.

use crate::error::CloudPrintError;
use lopdf::{Document, Object, ObjectId};

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Merge multiple PDFs into one
///
/// 1. Empty input is an error; a single document is returned as-is
/// 2. Every document after the first is renumbered past the current max id
///    and its objects are moved into the first one
/// 3. Every page is hung directly under the first document's page tree root,
///    with inherited attributes copied onto the page so nothing is lost
/// 4. Orphans (the other documents' catalogs and page trees) are pruned
pub fn merge_documents(documents: Vec<Vec<u8>>) -> Result<Vec<u8>, CloudPrintError> {
    let mut inputs = documents.into_iter();
    let Some(first) = inputs.next() else {
        return Err(CloudPrintError::OperationError("No documents to merge".into()));
    };

    let mut dest = load(&first, 1)?;
    let mut rest = Vec::new();
    for (i, bytes) in inputs.enumerate() {
        rest.push(load(&bytes, i + 2)?);
    }

    if rest.is_empty() {
        tracing::debug!("Single document, nothing to merge");
        return Ok(first);
    }

    let root_id = pages_root(&dest)?;
    let mut ordered_pages = flatten_pages(&mut dest, root_id);

    for mut source in rest {
        source.renumber_objects_with(dest.max_id + 1);
        let source_root = pages_root(&source)?;
        let source_pages = flatten_pages(&mut source, source_root);

        dest.objects.extend(source.objects);
        dest.max_id = dest.max_id.max(source.max_id);

        for &page_id in &source_pages {
            if let Ok(page) = dest.get_object_mut(page_id).and_then(Object::as_dict_mut) {
                page.set("Parent", Object::Reference(root_id));
            }
        }
        ordered_pages.extend(source_pages);
    }

    let pages = dest
        .get_object_mut(root_id)
        .and_then(Object::as_dict_mut)
        .map_err(|_| CloudPrintError::OperationError("Invalid pages dictionary".into()))?;
    pages.set(
        "Kids",
        Object::Array(ordered_pages.iter().map(|&id| Object::Reference(id)).collect()),
    );
    pages.set("Count", Object::Integer(ordered_pages.len() as i64));

    tracing::info!("Merged {} pages", ordered_pages.len());

    dest.prune_objects();
    dest.compress();

    let mut buffer = Vec::new();
    dest.save_to(&mut buffer).map_err(|e| {
        CloudPrintError::OperationError(format!("Failed to save merged PDF: {}", e))
    })?;

    Ok(buffer)
}

fn load(bytes: &[u8], position: usize) -> Result<Document, CloudPrintError> {
    Document::load_mem(bytes).map_err(|e| {
        CloudPrintError::ParseError(format!("Failed to load document {}: {}", position, e))
    })
}

/// Object id of the document's root Pages node
fn pages_root(doc: &Document) -> Result<ObjectId, CloudPrintError> {
    doc.catalog()
        .map_err(|_| CloudPrintError::OperationError("Catalog not found".into()))?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| CloudPrintError::OperationError("No Pages in catalog".into()))
}

/// Pages in reading order, each made a direct child of `root`
///
/// Attributes a page inherited from intermediate nodes are copied onto it
/// before its Parent is rewritten.
fn flatten_pages(doc: &mut Document, root: ObjectId) -> Vec<ObjectId> {
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

    for &page_id in &page_ids {
        let inherited = inherited_attributes(doc, page_id);
        if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            for (key, value) in inherited {
                page.set(key, value);
            }
            page.set("Parent", Object::Reference(root));
        }
    }

    page_ids
}

fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let mut found: Vec<(Vec<u8>, Object)> = Vec::new();
    let Ok(page) = doc.get_dictionary(page_id) else {
        return found;
    };

    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(node_id) = parent {
        // Guard against cyclic Parent chains
        if depth > 64 {
            break;
        }
        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };
        for key in INHERITABLE {
            if page.has(key) || found.iter().any(|(k, _)| k.as_slice() == key) {
                continue;
            }
            if let Ok(value) = node.get(key) {
                found.push((key.to_vec(), value.clone()));
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{page_labels, sample_pdf};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_merge_empty_fails() {
        let result = merge_documents(vec![]);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("No documents to merge"));
    }

    #[test]
    fn test_merge_single_document_returns_same() {
        let pdf = sample_pdf(2, "Single");
        let result = merge_documents(vec![pdf.clone()]).unwrap();
        assert_eq!(result, pdf);
    }

    #[test]
    fn test_merge_single_corrupt_document_fails() {
        let result = merge_documents(vec![b"not a pdf".to_vec()]);
        assert!(matches!(result, Err(CloudPrintError::ParseError(_))));
    }

    #[test]
    fn test_merge_names_the_bad_document() {
        let result = merge_documents(vec![sample_pdf(1, "Ok"), b"%PDF-garbage".to_vec()]);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("document 2"), "{}", message);
    }

    #[test]
    fn test_merge_preserves_page_order() {
        let merged = merge_documents(vec![
            sample_pdf(2, "First"),
            sample_pdf(1, "Second"),
            sample_pdf(2, "Third"),
        ])
        .unwrap();

        assert_eq!(
            page_labels(&merged),
            vec![
                "First page 1",
                "First page 2",
                "Second page 1",
                "Third page 1",
                "Third page 2",
            ]
        );
    }

    #[test]
    fn test_merge_handles_different_sizes() {
        let merged = merge_documents(vec![
            sample_pdf(10, "Large"),
            sample_pdf(1, "Small"),
            sample_pdf(5, "Medium"),
        ])
        .unwrap();

        let doc = Document::load_mem(&merged).unwrap();
        assert_eq!(doc.get_pages().len(), 16);
    }

    #[test]
    fn test_merged_pages_keep_inherited_media_box() {
        let merged = merge_documents(vec![sample_pdf(1, "A"), sample_pdf(1, "B")]).unwrap();
        let doc = Document::load_mem(&merged).unwrap();

        for page_id in doc.get_pages().into_values() {
            let page = doc.get_dictionary(page_id).unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            assert_eq!(media_box[2].as_float().unwrap(), 612.0);
            assert!(page.has(b"Resources"));
        }
    }

    #[test]
    fn test_merged_pages_share_one_page_tree() {
        let merged = merge_documents(vec![
            sample_pdf(1, "A"),
            sample_pdf(2, "B"),
            sample_pdf(1, "C"),
        ])
        .unwrap();
        let doc = Document::load_mem(&merged).unwrap();
        let root_id = pages_root(&doc).unwrap();

        let kids = doc
            .get_dictionary(root_id)
            .unwrap()
            .get(b"Kids")
            .unwrap()
            .as_array()
            .unwrap()
            .len();
        assert_eq!(kids, 4);

        for page_id in doc.get_pages().into_values() {
            let parent = doc
                .get_dictionary(page_id)
                .unwrap()
                .get(b"Parent")
                .unwrap()
                .as_reference()
                .unwrap();
            assert_eq!(parent, root_id);
        }
    }
}
