use fencekit::Confirmed;
use fencekit::schema::Record;

use crate::descriptor::{
    CommandBuilderWidget, Descriptor, ExercisePart, ExerciseTask, ExerciseWidget, Flag, FlagGroup, QuizChoice,
    QuizWidget, Reveal, TerminalLine, TerminalWidget, WalkthroughNote, WalkthroughWidget, Widget,
};

/// Turn a confirmed block into its presentation descriptor. Pure; field order is preserved.
pub fn render(block: &Confirmed) -> Descriptor {
    Descriptor {
        id: block.id,
        line: block.span.start_line,
        title: title_of(&block.record),
        widget: widget_of(&block.record),
        config: block.config.clone(),
    }
}

/// Explicit title, then the quiz question, then the kind's display name.
pub fn title_of(record: &Record) -> String {
    let (explicit, question) = match record {
        Record::Quiz(quiz) => (quiz.title.as_deref(), Some(quiz.question.as_str())),
        Record::Terminal(terminal) => (terminal.title.as_deref(), None),
        Record::Exercise(exercise) => (Some(exercise.title.as_str()), None),
        Record::CodeWalkthrough(walkthrough) => (walkthrough.title.as_deref(), None),
        Record::CommandBuilder(builder) => (builder.title.as_deref(), None),
    };
    [explicit, question]
        .into_iter()
        .flatten()
        .find(|title| !title.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| record.kind().display_name())
}

fn widget_of(record: &Record) -> Widget {
    match record {
        Record::Quiz(quiz) => Widget::Quiz(QuizWidget {
            question: quiz.question.clone(),
            options: quiz
                .options
                .iter()
                .map(|o| QuizChoice {
                    text: o.text.clone(),
                    correct: o.correct,
                    feedback: o.feedback.clone(),
                })
                .collect(),
            reveal: Reveal::OnSelect,
        }),
        Record::Terminal(terminal) => Widget::Terminal(TerminalWidget {
            steps: terminal
                .steps
                .iter()
                .map(|s| TerminalLine {
                    command: s.command.clone(),
                    output: s.output.clone(),
                    narration: s.narration.clone(),
                })
                .collect(),
        }),
        Record::Exercise(exercise) => Widget::Exercise(ExerciseWidget {
            difficulty: exercise.difficulty.clone(),
            scenario: exercise.scenario.clone(),
            hints: exercise.hints.clone(),
            tasks: exercise
                .tasks
                .iter()
                .map(|t| ExerciseTask {
                    task: t.task.clone(),
                    hint: t.hint.clone(),
                    answer: t.answer.clone(),
                })
                .collect(),
            exercises: exercise
                .exercises
                .iter()
                .map(|item| ExercisePart {
                    title: item.title.clone(),
                    difficulty: item.difficulty.clone(),
                    scenario: item.scenario.clone(),
                    hints: item.hints.clone(),
                    solution: item.solution.clone(),
                })
                .collect(),
            solution: exercise.solution.clone(),
        }),
        Record::CodeWalkthrough(walkthrough) => Widget::CodeWalkthrough(WalkthroughWidget {
            language: walkthrough.language.clone(),
            lines: walkthrough.code.clone(),
            annotations: walkthrough
                .annotations
                .iter()
                .map(|a| WalkthroughNote {
                    // confirmed records only hold lines in 1..=code.len()
                    line: usize::try_from(a.line).unwrap_or_default(),
                    text: a.text.clone(),
                })
                .collect(),
        }),
        Record::CommandBuilder(builder) => Widget::CommandBuilder(CommandBuilderWidget {
            base: builder.base.clone(),
            groups: builder
                .groups
                .iter()
                .map(|g| FlagGroup {
                    name: g.name.clone(),
                    options: g
                        .options
                        .iter()
                        .map(|o| Flag {
                            flag: o.flag.clone(),
                            description: o.description.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }),
    }
}
