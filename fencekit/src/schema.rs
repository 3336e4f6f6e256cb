//! Per-kind schemas for block bodies.
//!
//! Bodies are YAML. Required keys are enforced and value shapes are checked,
//! but unknown keys are ignored and semantic oddities (two correct quiz
//! options, an annotation on line 0) are accepted here and left to
//! [`crate::check`].

use serde_yaml::{Mapping, Value};

use crate::block::{Block, BlockKind};
use crate::error::{BlockError, ErrorKind};

/// Key name used in errors about the body as a whole.
pub const BODY_KEY: &str = "<body>";

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Quiz(Quiz),
    Terminal(Terminal),
    Exercise(Exercise),
    CodeWalkthrough(CodeWalkthrough),
    CommandBuilder(CommandBuilder),
}

impl Record {
    pub fn kind(&self) -> BlockKind {
        match self {
            Record::Quiz(_) => BlockKind::Quiz,
            Record::Terminal(_) => BlockKind::Terminal,
            Record::Exercise(_) => BlockKind::Exercise,
            Record::CodeWalkthrough(_) => BlockKind::CodeWalkthrough,
            Record::CommandBuilder(_) => BlockKind::CommandBuilder,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    pub title: Option<String>,
    pub question: String,
    pub options: Vec<QuizOption>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuizOption {
    pub text: String,
    pub correct: bool,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Terminal {
    pub title: Option<String>,
    pub steps: Vec<TerminalStep>,
}

/// One step of a terminal transcript. An empty command continues the previous step.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalStep {
    pub command: String,
    pub output: String,
    pub narration: String,
}

/// An exercise is either a flat list of `tasks` or a list of itemized
/// instructions under `exercises`; a block may carry both.
#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub title: String,
    pub difficulty: Option<String>,
    pub scenario: Option<String>,
    pub hints: Vec<String>,
    pub tasks: Vec<Task>,
    pub exercises: Vec<ExerciseItem>,
    pub solution: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseItem {
    pub title: String,
    pub difficulty: Option<String>,
    pub scenario: Option<String>,
    pub hints: Vec<String>,
    pub solution: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub task: String,
    pub hint: Option<String>,
    pub answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeWalkthrough {
    pub title: Option<String>,
    pub language: String,
    pub code: Vec<String>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// 1-based line in `code`. Not range-checked until the checker runs.
    pub line: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandBuilder {
    pub title: Option<String>,
    pub base: String,
    pub groups: Vec<CommandGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandGroup {
    pub name: String,
    pub options: Vec<CommandOption>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandOption {
    pub flag: String,
    pub description: String,
}

/// Validate an extracted block, attributing every error to the block.
pub fn validate(block: &Block) -> Result<Record, Vec<BlockError>> {
    parse_record(block.kind, &block.body).map_err(|kinds| {
        kinds
            .into_iter()
            .map(|kind| BlockError::new(kind, block.location()))
            .collect()
    })
}

/// Parse a raw body into the record for `kind`, collecting every schema error.
pub fn parse_record(kind: BlockKind, body: &str) -> Result<Record, Vec<ErrorKind>> {
    let config = parse_config(body).map_err(|e| vec![e])?;
    record_from(kind, &config)
}

/// Read the typed record for `kind` out of an already parsed configuration.
pub fn record_from(kind: BlockKind, config: &Value) -> Result<Record, Vec<ErrorKind>> {
    let mut walker = Walker::default();

    let Some(map) = walker.mapping(config, BODY_KEY) else {
        return Err(walker.errors);
    };

    let record = match kind {
        BlockKind::Quiz => Record::Quiz(walker.quiz(map)),
        BlockKind::Terminal => Record::Terminal(walker.terminal(map)),
        BlockKind::Exercise => Record::Exercise(walker.exercise(map)),
        BlockKind::CodeWalkthrough => Record::CodeWalkthrough(walker.code_walkthrough(map)),
        BlockKind::CommandBuilder => Record::CommandBuilder(walker.command_builder(map)),
    };

    if walker.errors.is_empty() {
        Ok(record)
    } else {
        Err(walker.errors)
    }
}

/// Parse a body as the author wrote it. Empty and null bodies are an empty mapping.
pub fn parse_config(body: &str) -> Result<Value, ErrorKind> {
    if body.trim().is_empty() {
        return Ok(Value::Mapping(Mapping::new()));
    }
    match serde_yaml::from_str::<Value>(body) {
        Ok(Value::Null) => Ok(Value::Mapping(Mapping::new())),
        Ok(value) => Ok(value),
        Err(err) => Err(ErrorKind::InvalidBody {
            message: err.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Walker
// ---------------------------------------------------------------------------

/// Walks a YAML tree, reading typed fields and accumulating errors.
#[derive(Default)]
struct Walker {
    errors: Vec<ErrorKind>,
}

impl Walker {
    fn quiz(&mut self, map: &Mapping) -> Quiz {
        self.require(BlockKind::Quiz, map, "", &["question", "options"]);
        let title = self.string(map, "", "title");
        let question = self.string(map, "", "question").unwrap_or_default();
        let options = self
            .items(map, "", "options")
            .into_iter()
            .filter_map(|(path, item)| {
                let option = self.mapping(item, &path)?;
                self.require(BlockKind::Quiz, option, &path, &["text"]);
                Some(QuizOption {
                    text: self.string(option, &path, "text").unwrap_or_default(),
                    correct: self.boolean(option, &path, "correct").unwrap_or(false),
                    feedback: self.string(option, &path, "feedback").unwrap_or_default(),
                })
            })
            .collect();
        Quiz {
            title,
            question,
            options,
        }
    }

    fn terminal(&mut self, map: &Mapping) -> Terminal {
        self.require(BlockKind::Terminal, map, "", &["steps"]);
        let title = self.string(map, "", "title");
        let steps = self
            .items(map, "", "steps")
            .into_iter()
            .filter_map(|(path, item)| {
                let step = self.mapping(item, &path)?;
                Some(TerminalStep {
                    command: self.string(step, &path, "command").unwrap_or_default(),
                    output: self.string(step, &path, "output").unwrap_or_default(),
                    narration: self.string(step, &path, "narration").unwrap_or_default(),
                })
            })
            .collect();
        Terminal { title, steps }
    }

    fn exercise(&mut self, map: &Mapping) -> Exercise {
        self.require(BlockKind::Exercise, map, "", &["title"]);
        let tasks = self
            .items(map, "", "tasks")
            .into_iter()
            .filter_map(|(path, item)| {
                let task = self.mapping(item, &path)?;
                self.require(BlockKind::Exercise, task, &path, &["task"]);
                Some(Task {
                    task: self.string(task, &path, "task").unwrap_or_default(),
                    hint: self.string(task, &path, "hint"),
                    answer: self.string(task, &path, "answer"),
                })
            })
            .collect();
        let exercises = self
            .items(map, "", "exercises")
            .into_iter()
            .filter_map(|(path, item)| {
                let item = self.mapping(item, &path)?;
                self.require(BlockKind::Exercise, item, &path, &["title"]);
                Some(ExerciseItem {
                    title: self.string(item, &path, "title").unwrap_or_default(),
                    difficulty: self.string(item, &path, "difficulty"),
                    scenario: self.string(item, &path, "scenario"),
                    hints: self.strings(item, &path, "hints"),
                    solution: self.string(item, &path, "solution"),
                })
            })
            .collect();
        Exercise {
            title: self.string(map, "", "title").unwrap_or_default(),
            difficulty: self.string(map, "", "difficulty"),
            scenario: self.string(map, "", "scenario"),
            hints: self.strings(map, "", "hints"),
            tasks,
            exercises,
            solution: self.string(map, "", "solution"),
        }
    }

    fn code_walkthrough(&mut self, map: &Mapping) -> CodeWalkthrough {
        self.require(BlockKind::CodeWalkthrough, map, "", &["code"]);
        let code = match map.get("code") {
            Some(Value::Sequence(_)) => self.strings(map, "", "code"),
            _ => self
                .string(map, "", "code")
                .map(|code| code.lines().map(str::to_string).collect())
                .unwrap_or_default(),
        };
        let annotations = self
            .items(map, "", "annotations")
            .into_iter()
            .filter_map(|(path, item)| {
                let annotation = self.mapping(item, &path)?;
                self.require(BlockKind::CodeWalkthrough, annotation, &path, &["line"]);
                Some(Annotation {
                    line: self.integer(annotation, &path, "line").unwrap_or(0),
                    text: self.string(annotation, &path, "text").unwrap_or_default(),
                })
            })
            .collect();
        CodeWalkthrough {
            title: self.string(map, "", "title"),
            language: self
                .string(map, "", "language")
                .unwrap_or_else(|| "text".to_string()),
            code,
            annotations,
        }
    }

    fn command_builder(&mut self, map: &Mapping) -> CommandBuilder {
        self.require(BlockKind::CommandBuilder, map, "", &["base", "groups"]);
        let groups = self
            .items(map, "", "groups")
            .into_iter()
            .filter_map(|(path, item)| {
                let group = self.mapping(item, &path)?;
                self.require(BlockKind::CommandBuilder, group, &path, &["name"]);
                let options = self
                    .items(group, &path, "options")
                    .into_iter()
                    .filter_map(|(opt_path, item)| {
                        let option = self.mapping(item, &opt_path)?;
                        self.require(BlockKind::CommandBuilder, option, &opt_path, &["flag"]);
                        Some(CommandOption {
                            flag: self.string(option, &opt_path, "flag").unwrap_or_default(),
                            description: self
                                .string(option, &opt_path, "description")
                                .unwrap_or_default(),
                        })
                    })
                    .collect();
                Some(CommandGroup {
                    name: self.string(group, &path, "name").unwrap_or_default(),
                    options,
                })
            })
            .collect();
        CommandBuilder {
            title: self.string(map, "", "title"),
            base: self.string(map, "", "base").unwrap_or_default(),
            groups,
        }
    }

    /// Record a single `Schema` error listing every absent (or null) key.
    fn require(&mut self, kind: BlockKind, map: &Mapping, path: &str, keys: &[&str]) {
        let missing_keys: Vec<String> = keys
            .iter()
            .filter(|key| matches!(map.get(**key), None | Some(Value::Null)))
            .map(|key| join(path, key))
            .collect();
        if !missing_keys.is_empty() {
            self.errors.push(ErrorKind::Schema { kind, missing_keys });
        }
    }

    fn mapping<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v Mapping> {
        match untag(value) {
            Value::Mapping(map) => Some(map),
            other => {
                self.errors
                    .push(ErrorKind::type_mismatch(path, "mapping", describe(other)));
                None
            }
        }
    }

    /// A string field. Numbers and booleans are stringified; absent or null is `None`.
    fn string(&mut self, map: &Mapping, path: &str, key: &str) -> Option<String> {
        let value = field(map, key)?;
        match scalar_text(value) {
            Some(text) => Some(text),
            None => {
                self.errors
                    .push(ErrorKind::type_mismatch(join(path, key), "string", describe(value)));
                None
            }
        }
    }

    fn boolean(&mut self, map: &Mapping, path: &str, key: &str) -> Option<bool> {
        match field(map, key)? {
            Value::Bool(b) => Some(*b),
            other => {
                self.errors
                    .push(ErrorKind::type_mismatch(join(path, key), "boolean", describe(other)));
                None
            }
        }
    }

    /// An integer field; strings holding an integer are accepted.
    fn integer(&mut self, map: &Mapping, path: &str, key: &str) -> Option<i64> {
        let value = field(map, key)?;
        let parsed = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        if parsed.is_none() {
            self.errors
                .push(ErrorKind::type_mismatch(join(path, key), "integer", describe(value)));
        }
        parsed
    }

    /// Elements of a sequence field paired with their key paths. Absent is empty.
    fn items<'v>(&mut self, map: &'v Mapping, path: &str, key: &str) -> Vec<(String, &'v Value)> {
        let Some(value) = field(map, key) else {
            return Vec::new();
        };
        let key_path = join(path, key);
        match value {
            Value::Sequence(seq) => seq
                .iter()
                .enumerate()
                .map(|(i, item)| (format!("{}[{}]", key_path, i), item))
                .collect(),
            other => {
                self.errors
                    .push(ErrorKind::type_mismatch(key_path, "sequence", describe(other)));
                Vec::new()
            }
        }
    }

    fn strings(&mut self, map: &Mapping, path: &str, key: &str) -> Vec<String> {
        self.items(map, path, key)
            .into_iter()
            .filter_map(|(item_path, item)| match scalar_text(item) {
                Some(text) => Some(text),
                None => {
                    self.errors
                        .push(ErrorKind::type_mismatch(item_path, "string", describe(item)));
                    None
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Look up a key, treating an explicit null as absent.
fn field<'v>(map: &'v Mapping, key: &str) -> Option<&'v Value> {
    match map.get(key).map(untag) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value),
    }
}

/// YAML tags (`!foo`) carry no meaning for block bodies.
fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match untag(value) {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn describe(value: &Value) -> String {
    match untag(value) {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => format!("string {:?}", s),
        Value::Sequence(_) => "sequence".to_string(),
        Value::Mapping(_) => "mapping".to_string(),
        Value::Tagged(_) => "tagged value".to_string(),
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}
