use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use serde::Serialize;
use thiserror::Error;

use crate::block::{BlockId, BlockKind};

/// A semantically inconsistent but well-typed record.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "violation", rename_all = "kebab-case")]
pub enum InvariantViolation {
    #[error("quiz must have exactly one correct option (found {found})")]
    QuizCorrectCount { found: usize },
    #[error("annotation references out-of-range line {line} (max {max})")]
    AnnotationOutOfRange { line: i64, max: usize },
    #[error("duplicate group name \"{name}\"")]
    DuplicateGroup { name: String },
    #[error("terminal block has zero steps")]
    EmptyTerminal,
    #[error("exercise has no tasks or solution")]
    EmptyExercise,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "error", rename_all = "kebab-case")]
pub enum ErrorKind {
    /// An opening fence with no closing delimiter.
    #[error("unterminated {kind} fence opened on line {line}")]
    MalformedFence { kind: BlockKind, line: usize },
    /// One or more required keys are absent.
    #[error("{kind} block is missing required key(s): {}", .missing_keys.join(", "))]
    Schema {
        kind: BlockKind,
        missing_keys: Vec<String>,
    },
    #[error("type mismatch at `{key}`: expected {expected}, got {actual}")]
    TypeMismatch {
        key: String,
        expected: String,
        actual: String,
    },
    /// The body is not YAML at all.
    #[error("invalid block body: {message}")]
    InvalidBody { message: String },
    #[error("{0}")]
    Invariant(InvariantViolation),
}

impl ErrorKind {
    pub fn type_mismatch(key: impl Into<String>, expected: &str, actual: impl Into<String>) -> Self {
        ErrorKind::TypeMismatch {
            key: key.into(),
            expected: expected.to_string(),
            actual: actual.into(),
        }
    }
}

/// Where an error was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub document: usize,
    pub block: Option<BlockId>,
    /// 1-based line the error is attributed to.
    pub line: usize,
    /// Byte span for diagnostics.
    pub span: Range<usize>,
}

/// An error attributed to a document position.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("line {}: {kind}", .location.line)]
pub struct BlockError {
    pub kind: ErrorKind,
    pub location: Location,
}

impl BlockError {
    pub fn new(kind: ErrorKind, location: Location) -> Self {
        BlockError { kind, location }
    }

    pub fn is_invariant(&self) -> bool {
        matches!(self.kind, ErrorKind::Invariant(_))
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let label = match &self.kind {
            ErrorKind::MalformedFence { .. } => "this fence is never closed",
            ErrorKind::Schema { .. } => "required key missing in this block",
            ErrorKind::TypeMismatch { .. } => "value has the wrong shape",
            ErrorKind::InvalidBody { .. } => "body is not valid YAML",
            ErrorKind::Invariant(_) => "block is inconsistent",
        };
        let mut notes = Vec::new();
        if let Some(block) = self.location.block {
            notes.push(format!("block {}", block));
        }
        if let ErrorKind::Schema { missing_keys, .. } = &self.kind {
            for key in missing_keys {
                notes.push(format!("add `{}`", key));
            }
        }
        Diagnostic::error()
            .with_message(self.kind.to_string())
            .with_labels(vec![
                Label::primary(self.location.document, self.location.span.clone())
                    .with_message(label),
            ])
            .with_notes(notes)
    }
}
