pub mod block;
pub mod check;
pub mod document;
pub mod error;
pub mod extract;
pub mod schema;

pub use block::{Block, BlockId, BlockKind, BlockSpan};
pub use document::{Document, Segment};
pub use error::{BlockError, ErrorKind, InvariantViolation, Location};
pub use extract::Extractor;
pub use schema::Record;

/// A block that passed schema validation and every invariant check.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmed {
    pub id: BlockId,
    pub span: BlockSpan,
    /// The body as the author wrote it, unknown keys included.
    pub config: serde_yaml::Value,
    pub record: Record,
}

/// Run the validator and the checker over one extracted block.
pub fn confirm_block(block: &Block) -> Result<Confirmed, Vec<BlockError>> {
    let attribute = |kinds: Vec<ErrorKind>| -> Vec<BlockError> {
        kinds
            .into_iter()
            .map(|kind| BlockError::new(kind, block.location()))
            .collect()
    };
    let config = schema::parse_config(&block.body).map_err(|e| attribute(vec![e]))?;
    let record = schema::record_from(block.kind, &config).map_err(attribute)?;
    let record = check::confirm(block, record)?;
    Ok(Confirmed {
        id: block.id,
        span: block.span.clone(),
        config,
        record,
    })
}
