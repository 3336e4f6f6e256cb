use fencekit::{Document, ErrorKind, InvariantViolation};
use renderer::descriptor::{Reveal, Widget};
use renderer::{process_document, process_documents};

fn doc(source: &str) -> Document {
    Document::new(0, "lesson.md", source.to_string())
}

const LESSON: &str = "\
# Indexes

```quiz
question: \"Q?\"
options:
  - text: B-tree
    correct: true
    feedback: Default for InnoDB.
  - text: Hash
    feedback: Only for MEMORY tables.
```

```sql
CREATE INDEX idx_name ON users(name);
```

```terminal
steps:
  - command: ls
    output: a.txt
    narration: list
```

```command-builder
base: SELECT
groups:
  - name: Columns
  - name: Columns
```

```code-walkthrough
code: |
  SELECT *
  FROM users
annotations:
  - line: 3
    text: past the end
```
";

#[test]
fn empty_document_yields_nothing() {
    let report = process_document(&doc(""));
    assert!(report.descriptors.is_empty());
    assert!(report.errors.is_empty());
    assert!(report.is_clean());
}

#[test]
fn minimal_quiz_round_trips() {
    let src = "```quiz\nquestion: \"Q?\"\noptions:\n  - text: first\n    correct: true\n  - text: second\n```\n";
    let report = process_document(&doc(src));
    assert!(report.is_clean());
    assert_eq!(report.descriptors.len(), 1);

    let descriptor = &report.descriptors[0];
    assert_eq!(descriptor.title, "Q?");
    let Widget::Quiz(quiz) = &descriptor.widget else {
        panic!("expected quiz widget");
    };
    assert_eq!(quiz.question, "Q?");
    let texts: Vec<&str> = quiz.options.iter().map(|o| o.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert_eq!(quiz.reveal, Reveal::OnSelect);
}

#[test]
fn terminal_steps_render_verbatim() {
    let src = "```terminal\nsteps:\n  - command: ls\n    output: a.txt\n    narration: list\n```\n";
    let report = process_document(&doc(src));
    let Widget::Terminal(terminal) = &report.descriptors[0].widget else {
        panic!("expected terminal widget");
    };
    assert_eq!(terminal.steps.len(), 1);
    assert_eq!(terminal.steps[0].command, "ls");
    assert_eq!(terminal.steps[0].output, "a.txt");
    assert_eq!(terminal.steps[0].narration, "list");
    assert_eq!(report.descriptors[0].title, "Terminal");
}

#[test]
fn mixed_lesson_reports_in_source_order() {
    let report = process_document(&doc(LESSON));

    let kinds: Vec<String> = report
        .descriptors
        .iter()
        .map(|d| d.widget.kind().to_string())
        .collect();
    assert_eq!(kinds, vec!["quiz", "terminal"]);

    assert_eq!(report.errors.len(), 2);
    assert_eq!(
        report.errors[0].kind,
        ErrorKind::Invariant(InvariantViolation::DuplicateGroup {
            name: "Columns".to_string()
        })
    );
    assert_eq!(
        report.errors[1].kind,
        ErrorKind::Invariant(InvariantViolation::AnnotationOutOfRange { line: 3, max: 2 })
    );
    assert!(report.errors[0].location.line < report.errors[1].location.line);

    // the sql fence is not a block, so indices skip nothing
    let indices: Vec<usize> = report.descriptors.iter().map(|d| d.id.index).collect();
    assert_eq!(indices, vec![0, 1]);
    assert_eq!(report.errors[0].location.block.map(|b| b.index), Some(2));
}

#[test]
fn pipeline_is_idempotent() {
    let d = doc(LESSON);
    let first = serde_json::to_string(&process_document(&d)).unwrap();
    let second = serde_json::to_string(&process_document(&d)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn parallel_matches_sequential() {
    let docs: Vec<Document> = (0..8)
        .map(|i| {
            let body = if i % 2 == 0 { LESSON.to_string() } else { format!("# Page {}\n", i) };
            Document::new(i, format!("page-{}.md", i), body)
        })
        .collect();

    let parallel = process_documents(&docs);
    let sequential: Vec<_> = docs.iter().map(process_document).collect();
    assert_eq!(parallel, sequential);
    assert_eq!(
        serde_json::to_string(&parallel).unwrap(),
        serde_json::to_string(&sequential).unwrap()
    );
    assert!(parallel.iter().enumerate().all(|(i, r)| r.document == i));
}

#[test]
fn one_bad_block_does_not_stop_the_rest() {
    let src = "```exercise\ntitle: [broken\n```\n\n```exercise\ntitle: Fine\nsolution: done\n```\n\n```quiz\nquestion: unterminated\n";
    let report = process_document(&doc(src));
    assert_eq!(report.descriptors.len(), 1);
    assert_eq!(report.descriptors[0].title, "Fine");
    assert_eq!(report.errors.len(), 2);
    assert!(matches!(report.errors[0].kind, ErrorKind::InvalidBody { .. }));
    assert!(matches!(report.errors[1].kind, ErrorKind::MalformedFence { line: 10, .. }));
}

#[test]
fn descriptor_json_shape() {
    let src = "```code-walkthrough\ntitle: Query\nlanguage: sql\ncode: SELECT 1;\nannotations:\n  - line: 1\n    text: constant\n```\n";
    let report = process_document(&doc(src));
    let value = serde_json::to_value(&report.descriptors[0]).unwrap();
    assert_eq!(value["kind"], "code-walkthrough");
    assert_eq!(value["title"], "Query");
    assert_eq!(value["line"], 1);
    assert_eq!(value["id"]["index"], 0);
    assert_eq!(value["lines"][0], "SELECT 1;");
    assert_eq!(value["annotations"][0]["line"], 1);
}

#[test]
fn pages_loaded_from_disk_keep_their_paths() {
    let dir = tempfile::tempdir().unwrap();
    let pages = [
        ("intro.md", "# Intro\n"),
        ("replication.md", LESSON),
        ("broken.md", "```terminal\nsteps: []\n```\n"),
    ];
    let docs: Vec<Document> = pages
        .iter()
        .enumerate()
        .map(|(id, (name, body))| {
            let path = dir.path().join(name);
            std::fs::write(&path, body).unwrap();
            Document::load(id, &path).unwrap()
        })
        .collect();

    let reports = process_documents(&docs);
    let paths: Vec<_> = reports.iter().map(|r| r.path.clone()).collect();
    assert_eq!(
        paths,
        pages.iter().map(|(name, _)| dir.path().join(name)).collect::<Vec<_>>()
    );
    assert!(reports[0].is_clean());
    assert_eq!(reports[1].descriptors.len(), 2);
    assert_eq!(reports[2].errors.len(), 1);
    assert_eq!(reports[2].errors[0].location.document, 2);
}
