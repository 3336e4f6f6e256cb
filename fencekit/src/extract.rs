use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser as CmarkParser, Tag, TagEnd};
use tracing::{debug, warn};

use crate::block::{Block, BlockId, BlockKind, BlockSpan};
use crate::document::Document;
use crate::error::{BlockError, ErrorKind, Location};

type OffsetEvents<'a> = Box<dyn Iterator<Item = (Event<'a>, Range<usize>)> + 'a>;

/// Lazy scanner yielding a document's instructional blocks in source order.
///
/// Fences are recognized with pulldown-cmark so indented code, nested
/// containers and longer delimiter runs follow CommonMark. Fences whose
/// identifier is not one of the block kinds are skipped.
pub struct Extractor<'a> {
    document: &'a Document,
    events: OffsetEvents<'a>,
    /// Byte offset of the slice the current event stream was built from.
    base: usize,
    next_index: usize,
}

impl<'a> Extractor<'a> {
    pub fn new(document: &'a Document) -> Self {
        Extractor {
            document,
            events: scan(document.source()),
            base: 0,
            next_index: 0,
        }
    }

    /// Restart scanning at `offset`, after an unterminated fence swallowed the rest.
    fn resume_at(&mut self, offset: usize) {
        self.base = offset;
        self.events = scan(&self.document.source()[offset..]);
    }

    fn take_body(&mut self) -> String {
        let mut body = String::new();
        for (event, _) in self.events.by_ref() {
            match event {
                Event::Text(text) => body.push_str(&text),
                Event::End(TagEnd::CodeBlock) => break,
                _ => {}
            }
        }
        body
    }
}

impl Iterator for Extractor<'_> {
    type Item = Result<Block, BlockError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (event, range) = self.events.next()?;
            let Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) = event else {
                continue;
            };
            let Some(kind) = info.split_whitespace().next().and_then(BlockKind::from_tag) else {
                continue;
            };

            let body = self.take_body();
            let bytes = self.base + range.start..self.base + range.end;
            let id = BlockId {
                document: self.document.id,
                index: self.next_index,
            };
            self.next_index += 1;

            let fence = &self.document.source()[bytes.clone()];
            let start_line = self.document.line_of(bytes.start);
            let end_line = self.document.line_of(last_line_start(fence, bytes.start));
            let closed = end_line > start_line
                && is_closed(
                    self.document.line_text(start_line),
                    self.document.line_text(end_line),
                );

            if !closed {
                warn!(
                    path = %self.document.path.display(),
                    line = start_line,
                    "unterminated {} fence",
                    kind
                );
                let opening_end = self.document.next_line_start(bytes.start);
                self.resume_at(opening_end);
                let location = Location {
                    document: self.document.id,
                    block: Some(id),
                    line: start_line,
                    span: bytes.start..opening_end,
                };
                return Some(Err(BlockError::new(
                    ErrorKind::MalformedFence {
                        kind,
                        line: start_line,
                    },
                    location,
                )));
            }

            debug!(block = %id, %kind, start_line, end_line, "extracted block");
            return Some(Ok(Block {
                id,
                kind,
                body,
                span: BlockSpan {
                    start_line,
                    end_line,
                    bytes,
                },
            }));
        }
    }
}

fn scan(source: &str) -> OffsetEvents<'_> {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    Box::new(CmarkParser::new_ext(source, options).into_offset_iter())
}

/// How a fence opened inside its container.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Opener {
    /// Block quote markers in front of the delimiter.
    quotes: usize,
    /// Widest indentation a closing delimiter may carry after the quote markers.
    max_indent: usize,
    ch: char,
    len: usize,
}

impl Opener {
    fn parse(line: &str) -> Option<Opener> {
        let (rest, quotes) = strip_quotes(line, usize::MAX);
        let pos = rest.find(['`', '~'])?;
        let (lead, fence) = rest.split_at(pos);
        let ch = fence.chars().next()?;
        let len = fence.chars().take_while(|c| *c == ch).count();
        if len < 3 {
            return None;
        }
        // list item content starts where the marker ends; bare indentation stays at column 0
        let width = indent_width(lead);
        let max_indent = if lead.trim().is_empty() && width <= 3 {
            3
        } else {
            width + 3
        };
        Some(Opener {
            quotes,
            max_indent,
            ch,
            len,
        })
    }

    /// Whether `line` is a closing delimiter for this fence in the same container.
    fn closed_by(&self, line: &str) -> bool {
        let (rest, quotes) = strip_quotes(line, self.quotes);
        if quotes != self.quotes {
            return false;
        }
        let run = rest.trim_start_matches([' ', '\t']);
        if indent_width(&rest[..rest.len() - run.len()]) > self.max_indent {
            return false;
        }
        let run = run.trim_end();
        let len = run.chars().take_while(|c| *c == self.ch).count();
        len >= self.len && len == run.len()
    }
}

/// Strip up to `limit` block quote markers, returning the rest and how many were removed.
fn strip_quotes(line: &str, limit: usize) -> (&str, usize) {
    let mut rest = line;
    let mut count = 0;
    while count < limit {
        let trimmed = rest.trim_start_matches(' ');
        if rest.len() - trimmed.len() > 3 {
            break;
        }
        let Some(after) = trimmed.strip_prefix('>') else {
            break;
        };
        rest = after.strip_prefix(' ').unwrap_or(after);
        count += 1;
    }
    (rest, count)
}

fn indent_width(s: &str) -> usize {
    s.chars().map(|c| if c == '\t' { 4 } else { 1 }).sum()
}

/// Whether `last` closes the fence opened on `first`. Both are full source lines.
fn is_closed(first: &str, last: &str) -> bool {
    Opener::parse(first).is_some_and(|opener| opener.closed_by(last))
}

/// Absolute offset of the last non-empty line of a fence.
fn last_line_start(fence: &str, fence_start: usize) -> usize {
    let trimmed = fence.trim_end_matches(['\n', '\r']);
    fence_start + trimmed.rfind('\n').map(|p| p + 1).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closing_fence_must_match_opener() {
        assert!(is_closed("```quiz", "```"));
        assert!(is_closed("```quiz", "`````  "));
        assert!(is_closed("~~~quiz", "~~~"));
        assert!(!is_closed("````quiz", "```"));
        assert!(!is_closed("```quiz", "~~~"));
        assert!(!is_closed("```quiz", "``` trailing"));
        assert!(!is_closed("``quiz", "``"));
    }

    #[test]
    fn closing_fence_indentation() {
        assert!(is_closed("```quiz", "   ```"));
        assert!(!is_closed("```quiz", "    ```"));
        assert!(!is_closed("```quiz", "\t```"));
        assert!(is_closed("  ```terminal", "  ```"));
        assert!(is_closed("- ```terminal", "  ```"));
        assert!(!is_closed("- ```terminal", "      ```"));
    }

    #[test]
    fn closing_fence_inside_block_quotes() {
        assert!(is_closed("> ```quiz", "> ```"));
        assert!(is_closed("> ```quiz", ">```"));
        assert!(!is_closed("> ```quiz", "```"));
        assert!(!is_closed("> > ```quiz", "> ```"));
        assert!(!is_closed("```quiz", "> ```"));
    }
}
