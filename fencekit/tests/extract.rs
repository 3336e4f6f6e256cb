use fencekit::{Block, BlockKind, Document, ErrorKind, Segment};

fn doc(source: &str) -> Document {
    Document::new(0, "lesson.md", source.to_string())
}

fn blocks(source: &str) -> Vec<Block> {
    doc(source)
        .blocks()
        .collect::<Result<Vec<_>, _>>()
        .expect("extraction failed")
}

#[test]
fn empty_document_has_no_blocks() {
    let d = doc("");
    assert_eq!(d.blocks().count(), 0);
}

#[test]
fn recognizes_every_kind_in_source_order() {
    let src = "\
```quiz
question: q
```

```terminal
steps: []
```

```exercise
title: t
```

```code-walkthrough
code: x
```

```command-builder
base: ls
```
";
    let kinds: Vec<BlockKind> = blocks(src).iter().map(|b| b.kind).collect();
    assert_eq!(kinds, BlockKind::ALL.to_vec());
}

#[test]
fn plain_code_fences_pass_through() {
    let src = "# SQL\n\n```sql\nSELECT 1;\n```\n\n```ini\n[mysqld]\n```\n\n```json\n{}\n```\n\n```bash\nls\n```\n";
    assert!(blocks(src).is_empty());
}

#[test]
fn identifier_is_first_info_token() {
    let src = "```quiz {.extra}\nquestion: q\n```\n\n```quizzes\nquestion: q\n```\n";
    let found = blocks(src);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].kind, BlockKind::Quiz);
}

#[test]
fn body_and_span_are_recorded() {
    let src = "# Title\n\nIntro.\n\n```terminal\nsteps:\n  - command: ls\n```\nAfter.\n";
    let found = blocks(src);
    assert_eq!(found.len(), 1);
    let block = &found[0];
    assert_eq!(block.body, "steps:\n  - command: ls\n");
    assert_eq!(block.span.start_line, 5);
    assert_eq!(block.span.end_line, 8);
    assert!(src[block.span.bytes.clone()].starts_with("```terminal"));
    assert_eq!(block.id.document, 0);
    assert_eq!(block.id.index, 0);
}

#[test]
fn longer_fences_and_tildes() {
    let src = "````quiz\n```\nnot a close\n```\n````\n\n~~~exercise\ntitle: t\n~~~\n";
    let found = blocks(src);
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].body, "```\nnot a close\n```\n");
    assert_eq!(found[1].kind, BlockKind::Exercise);
}

#[test]
fn blocks_inside_containers_are_found() {
    let src = "> ```quiz\n> question: q\n> ```\n\n- item\n\n  ```terminal\n  steps: []\n  ```\n";
    let found = blocks(src);
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].body, "question: q\n");
    assert_eq!(found[1].body, "steps: []\n");
}

#[test]
fn unterminated_fence_reports_opening_line() {
    let src = "# Page\n\n```quiz\nquestion: q\n";
    let results: Vec<_> = doc(src).blocks().collect();
    assert_eq!(results.len(), 1);
    let err = results[0].as_ref().unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::MalformedFence {
            kind: BlockKind::Quiz,
            line: 3
        }
    );
    assert_eq!(err.location.line, 3);
}

#[test]
fn scanning_resumes_after_unterminated_fence() {
    let src = "```exercise\ntitle: lost\n\n# Later\n\n~~~terminal\nsteps: []\n~~~\n";
    let results: Vec<_> = doc(src).blocks().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_err());
    let block = results[1].as_ref().unwrap();
    assert_eq!(block.kind, BlockKind::Terminal);
    assert_eq!(block.span.start_line, 6);
    assert_eq!(block.id.index, 1);
}

#[test]
fn over_indented_delimiter_does_not_close() {
    let src = "```terminal\nsteps:\n  - command: ls\n    ```\n";
    let results: Vec<_> = doc(src).blocks().collect();
    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].as_ref().unwrap_err().kind,
        ErrorKind::MalformedFence {
            kind: BlockKind::Terminal,
            line: 1
        }
    );
}

#[test]
fn unterminated_fence_inside_block_quote() {
    let src = "> ```quiz\n> question: q\n\n```terminal\nsteps:\n  - command: ls\n```\n";
    let results: Vec<_> = doc(src).blocks().collect();
    assert_eq!(results.len(), 2);
    assert_eq!(
        results[0].as_ref().unwrap_err().kind,
        ErrorKind::MalformedFence {
            kind: BlockKind::Quiz,
            line: 1
        }
    );
    let block = results[1].as_ref().unwrap();
    assert_eq!(block.kind, BlockKind::Terminal);
    assert_eq!(block.span.start_line, 4);
    assert_eq!(block.id.index, 1);
}

#[test]
fn unterminated_fence_inside_list_item() {
    let src = "- step\n\n  ```quiz\n  question: q\n\nOutside.\n\n```terminal\nsteps: []\n```\n";
    let results: Vec<_> = doc(src).blocks().collect();
    assert_eq!(results.len(), 2);
    assert!(matches!(
        results[0].as_ref().unwrap_err().kind,
        ErrorKind::MalformedFence { line: 3, .. }
    ));
    let block = results[1].as_ref().unwrap();
    assert_eq!(block.span.start_line, 8);
    assert_eq!(block.body, "steps: []\n");
}

#[test]
fn extraction_restarts_from_the_top() {
    let d = doc("```quiz\nquestion: q\n```\n");
    let first: Vec<_> = d.blocks().collect();
    let second: Vec<_> = d.blocks().collect();
    assert_eq!(first, second);
}

#[test]
fn segments_cover_the_document() {
    let src = "Before\n\n```quiz\nquestion: q\n```\nAfter\n";
    let d = doc(src);
    let segments = d.segments();
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0], Segment::Text("Before\n\n"));
    assert!(matches!(&segments[1], Segment::Block(b) if b.kind == BlockKind::Quiz));
    assert!(matches!(segments[2], Segment::Text(t) if t.trim_start() == "After\n"));

    let rebuilt: String = segments
        .iter()
        .map(|s| match s {
            Segment::Text(t) => t.to_string(),
            Segment::Block(b) => src[b.span.bytes.clone()].to_string(),
        })
        .collect();
    assert_eq!(rebuilt, src);
}

#[test]
fn load_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.md");
    std::fs::write(&path, "```terminal\nsteps: []\n```\n").unwrap();
    let d = Document::load(3, &path).unwrap();
    assert_eq!(d.id, 3);
    let found: Vec<_> = d.blocks().collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].as_ref().unwrap().id.document, 3);
}

#[test]
fn line_lookup() {
    let d = doc("a\nbb\n\nccc");
    assert_eq!(d.line_of(0), 1);
    assert_eq!(d.line_of(2), 2);
    assert_eq!(d.line_of(5), 3);
    assert_eq!(d.line_of(6), 4);
    assert_eq!(d.next_line_start(2), 5);
    assert_eq!(d.line_text(2), "bb");
    assert_eq!(d.line_text(3), "");
    assert_eq!(d.line_text(4), "ccc");
    assert_eq!(d.line_text(9), "");
}
