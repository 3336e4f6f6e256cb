use std::fmt;
use std::ops::Range;

use serde::Serialize;

use crate::error::Location;

/// The five instructional widget kinds, keyed by fence identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Quiz,
    Terminal,
    Exercise,
    CodeWalkthrough,
    CommandBuilder,
}

impl BlockKind {
    pub const ALL: [BlockKind; 5] = [
        BlockKind::Quiz,
        BlockKind::Terminal,
        BlockKind::Exercise,
        BlockKind::CodeWalkthrough,
        BlockKind::CommandBuilder,
    ];

    /// Match a fence identifier token. Case-sensitive, like the fence tags themselves.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "quiz" => Some(BlockKind::Quiz),
            "terminal" => Some(BlockKind::Terminal),
            "exercise" => Some(BlockKind::Exercise),
            "code-walkthrough" => Some(BlockKind::CodeWalkthrough),
            "command-builder" => Some(BlockKind::CommandBuilder),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            BlockKind::Quiz => "quiz",
            BlockKind::Terminal => "terminal",
            BlockKind::Exercise => "exercise",
            BlockKind::CodeWalkthrough => "code-walkthrough",
            BlockKind::CommandBuilder => "command-builder",
        }
    }

    /// Human-readable name, e.g. `Code Walkthrough`.
    pub fn display_name(self) -> String {
        self.tag()
            .split('-')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.tag())
    }
}

/// Composite identifier addressing a block independently of file layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BlockId {
    /// Document id (the codespan file id of the source).
    pub document: usize,
    /// 0-based position among the document's recognized fences.
    pub index: usize,
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.document, self.index)
    }
}

/// Where a block sits in its document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSpan {
    /// 1-based line of the opening fence.
    pub start_line: usize,
    /// 1-based line of the closing fence.
    pub end_line: usize,
    /// Byte range of the whole fence, delimiters included.
    pub bytes: Range<usize>,
}

/// A fenced instructional block as extracted from a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    /// Raw fence body, without the delimiter lines.
    pub body: String,
    pub span: BlockSpan,
}

impl Block {
    /// Location attributing an error to the whole block, reported at its opening line.
    pub fn location(&self) -> Location {
        Location {
            document: self.id.document,
            block: Some(self.id),
            line: self.span.start_line,
            span: self.span.bytes.clone(),
        }
    }
}
