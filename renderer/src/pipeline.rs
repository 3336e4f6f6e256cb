use std::path::PathBuf;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use fencekit::{Block, BlockError, Document};

use crate::descriptor::Descriptor;
use crate::render::render;

/// Everything the pipeline produced for one document, in source order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub document: usize,
    pub path: PathBuf,
    pub descriptors: Vec<Descriptor>,
    pub errors: Vec<BlockError>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate, check and render a single extracted block.
pub fn process_block(block: &Block) -> Result<Descriptor, Vec<BlockError>> {
    let confirmed = fencekit::confirm_block(block)?;
    Ok(render(&confirmed))
}

/// Run Extractor → Validator → Checker → Renderer over one document.
pub fn process_document(document: &Document) -> Report {
    let mut descriptors = Vec::new();
    let mut errors = Vec::new();

    for extracted in document.blocks() {
        match extracted.map_err(|e| vec![e]).and_then(|block| process_block(&block)) {
            Ok(descriptor) => descriptors.push(descriptor),
            Err(block_errors) => errors.extend(block_errors),
        }
    }

    debug!(
        path = %document.path.display(),
        descriptors = descriptors.len(),
        errors = errors.len(),
        "processed document"
    );

    Report {
        document: document.id,
        path: document.path.clone(),
        descriptors,
        errors,
    }
}

/// Process documents in parallel. Reports come back in input order.
pub fn process_documents(documents: &[Document]) -> Vec<Report> {
    documents.par_iter().map(process_document).collect()
}
