use serde::Serialize;

use fencekit::BlockId;

/// Pure-data description of how a UI should present one confirmed block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Descriptor {
    pub id: BlockId,
    /// 1-based line of the block's opening fence.
    pub line: usize,
    /// Heading shown by the widget and by the no-script fallback.
    pub title: String,
    #[serde(flatten)]
    pub widget: Widget,
    /// The author's configuration, embedded unchanged in the HTML placeholder.
    #[serde(skip)]
    pub config: serde_yaml::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Widget {
    Quiz(QuizWidget),
    Terminal(TerminalWidget),
    Exercise(ExerciseWidget),
    CodeWalkthrough(WalkthroughWidget),
    CommandBuilder(CommandBuilderWidget),
}

/// When answer data may be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reveal {
    /// `correct` and `feedback` stay hidden until the reader picks an option.
    OnSelect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizWidget {
    pub question: String,
    pub options: Vec<QuizChoice>,
    pub reveal: Reveal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizChoice {
    pub text: String,
    pub correct: bool,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminalWidget {
    pub steps: Vec<TerminalLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminalLine {
    pub command: String,
    pub output: String,
    pub narration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseWidget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    pub hints: Vec<String>,
    pub tasks: Vec<ExerciseTask>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exercises: Vec<ExercisePart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExercisePart {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    pub hints: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseTask {
    pub task: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkthroughWidget {
    pub language: String,
    pub lines: Vec<String>,
    pub annotations: Vec<WalkthroughNote>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkthroughNote {
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandBuilderWidget {
    pub base: String,
    pub groups: Vec<FlagGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagGroup {
    pub name: String,
    pub options: Vec<Flag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flag {
    pub flag: String,
    pub description: String,
}

impl Widget {
    pub fn kind(&self) -> fencekit::BlockKind {
        use fencekit::BlockKind;
        match self {
            Widget::Quiz(_) => BlockKind::Quiz,
            Widget::Terminal(_) => BlockKind::Terminal,
            Widget::Exercise(_) => BlockKind::Exercise,
            Widget::CodeWalkthrough(_) => BlockKind::CodeWalkthrough,
            Widget::CommandBuilder(_) => BlockKind::CommandBuilder,
        }
    }
}
