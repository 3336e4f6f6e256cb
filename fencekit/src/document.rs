use std::path::{Path, PathBuf};

use crate::block::Block;
use crate::extract::Extractor;

/// One source file's full text, treated as an ordered container of prose and blocks.
#[derive(Debug, Clone)]
pub struct Document {
    /// Document id, shared with the codespan file database.
    pub id: usize,
    pub path: PathBuf,
    source: String,
    /// Byte offset of the first character of every line.
    line_starts: Vec<usize>,
}

/// A piece of a document: prose passed through untouched, or a recognized block.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'a> {
    Text(&'a str),
    Block(Block),
}

impl Document {
    pub fn new(id: usize, path: impl Into<PathBuf>, source: String) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Document {
            id,
            path: path.into(),
            source,
            line_starts,
        }
    }

    /// Read a document from disk.
    pub fn load(id: usize, path: &Path) -> std::io::Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Ok(Document::new(id, path, source))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Convert a byte offset to a 1-based line number.
    pub fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(next) => next,
        }
    }

    /// Byte offset where the line after the one containing `offset` begins.
    pub fn next_line_start(&self, offset: usize) -> usize {
        let line = self.line_of(offset);
        self.line_starts
            .get(line)
            .copied()
            .unwrap_or(self.source.len())
    }

    /// Text of a 1-based line without its line ending. Out-of-range lines are empty.
    pub fn line_text(&self, line: usize) -> &str {
        let Some(&start) = line.checked_sub(1).and_then(|i| self.line_starts.get(i)) else {
            return "";
        };
        let end = self
            .line_starts
            .get(line)
            .copied()
            .unwrap_or(self.source.len());
        self.source[start..end].trim_end_matches(['\n', '\r'])
    }

    /// Iterate over the document's blocks in source order. Each call starts a fresh scan.
    pub fn blocks(&self) -> Extractor<'_> {
        Extractor::new(self)
    }

    /// Split the document into prose and blocks. Malformed fences stay in the prose.
    pub fn segments(&self) -> Vec<Segment<'_>> {
        let mut segments = Vec::new();
        let mut cursor = 0;
        for block in self.blocks().flatten() {
            let range = block.span.bytes.clone();
            if range.start < cursor {
                continue;
            }
            if range.start > cursor {
                segments.push(Segment::Text(&self.source[cursor..range.start]));
            }
            cursor = range.end;
            segments.push(Segment::Block(block));
        }
        if cursor < self.source.len() {
            segments.push(Segment::Text(&self.source[cursor..]));
        }
        segments
    }
}
