use std::collections::HashSet;

use crate::block::Block;
use crate::error::{BlockError, ErrorKind, InvariantViolation};
use crate::schema::{CodeWalkthrough, CommandBuilder, Exercise, Quiz, Record, Terminal};

/// Check a record's semantic invariants. Every violation is reported; an empty list means valid.
pub fn check(record: &Record) -> Vec<InvariantViolation> {
    match record {
        Record::Quiz(quiz) => check_quiz(quiz),
        Record::Terminal(terminal) => check_terminal(terminal),
        Record::Exercise(exercise) => check_exercise(exercise),
        Record::CodeWalkthrough(walkthrough) => check_walkthrough(walkthrough),
        Record::CommandBuilder(builder) => check_command_builder(builder),
    }
}

/// Pass a validated record through, or report its violations against the block.
pub fn confirm(block: &Block, record: Record) -> Result<Record, Vec<BlockError>> {
    let violations = check(&record);
    if violations.is_empty() {
        return Ok(record);
    }
    Err(violations
        .into_iter()
        .map(|v| BlockError::new(ErrorKind::Invariant(v), block.location()))
        .collect())
}

fn check_quiz(quiz: &Quiz) -> Vec<InvariantViolation> {
    let found = quiz.options.iter().filter(|o| o.correct).count();
    if found == 1 {
        Vec::new()
    } else {
        vec![InvariantViolation::QuizCorrectCount { found }]
    }
}

fn check_terminal(terminal: &Terminal) -> Vec<InvariantViolation> {
    if terminal.steps.is_empty() {
        vec![InvariantViolation::EmptyTerminal]
    } else {
        Vec::new()
    }
}

fn check_exercise(exercise: &Exercise) -> Vec<InvariantViolation> {
    let has_solution = std::iter::once(&exercise.solution)
        .chain(exercise.exercises.iter().map(|item| &item.solution))
        .any(|s| s.as_deref().is_some_and(|s| !s.trim().is_empty()));
    if exercise.tasks.is_empty() && !has_solution {
        vec![InvariantViolation::EmptyExercise]
    } else {
        Vec::new()
    }
}

fn check_walkthrough(walkthrough: &CodeWalkthrough) -> Vec<InvariantViolation> {
    let max = walkthrough.code.len();
    walkthrough
        .annotations
        .iter()
        .filter(|a| a.line < 1 || a.line > max as i64)
        .map(|a| InvariantViolation::AnnotationOutOfRange { line: a.line, max })
        .collect()
}

/// One violation per repeated occurrence, in source order.
fn check_command_builder(builder: &CommandBuilder) -> Vec<InvariantViolation> {
    let mut seen = HashSet::new();
    builder
        .groups
        .iter()
        .filter(|group| !seen.insert(group.name.as_str()))
        .map(|group| InvariantViolation::DuplicateGroup {
            name: group.name.clone(),
        })
        .collect()
}
