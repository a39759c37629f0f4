//! Splits mixed source into alternating DSL and host-language blocks.
//!
//! Classification is line based. A line belongs to the DSL when it opens a
//! `struct`/`trait`/`impl`, sits inside such a declaration, starts with `let ` or
//! `match `, or contains `|>`. Blank and comment-only lines never change state and
//! ride along with the surrounding block. A declaration header without a brace
//! keeps the following line in the DSL when that line opens with `{`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::trace;

use crate::syntax::lexer::compile_pattern;

static DECLARATION_START: Lazy<Regex> =
    Lazy::new(|| compile_pattern(r"^(?:struct|trait|impl)\b"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockKind {
    Dsl,
    Host,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    pub kind: BlockKind,
    pub text: String,
    /// 1-based line of the block's first line.
    pub start_line: usize,
    /// Byte offset of the block's first line in the full source.
    pub start_offset: usize,
}

#[derive(Debug, Default)]
struct LineState {
    depth: i64,
    in_declaration: bool,
    /// A `struct`/`trait`/`impl` header whose `{` may start the next line.
    awaiting_body: bool,
}

impl LineState {
    /// Update brace tracking for `line` and report whether it is DSL.
    fn classify(&mut self, line: &str) -> BlockKind {
        let opens = line.matches('{').count() as i64;
        let closes = line.matches('}').count() as i64;
        let starts_declaration = DECLARATION_START.is_match(line);
        let starts_binding = line.starts_with("let ") || line.starts_with("match ");
        let opens_pending_body = std::mem::take(&mut self.awaiting_body) && line.starts_with('{');
        let was_inside = self.in_declaration;

        if self.in_declaration {
            self.depth += opens - closes;
            if closes > 0 && self.depth <= 0 {
                self.in_declaration = false;
                self.depth = 0;
            }
        } else if starts_declaration || starts_binding || opens_pending_body {
            // A bodiless `struct A;` never opens a brace, so it never enters this state.
            self.depth = opens - closes;
            self.in_declaration = self.depth > 0;
            if !self.in_declaration {
                self.depth = 0;
            }
            self.awaiting_body = starts_declaration && opens == 0 && !line.ends_with(';');
        }

        if was_inside
            || starts_declaration
            || starts_binding
            || opens_pending_body
            || line.contains("|>")
        {
            BlockKind::Dsl
        } else {
            BlockKind::Host
        }
    }
}

fn is_neutral(line: &str) -> bool {
    line.is_empty() || line.starts_with("//")
}

/// Segment `source` into blocks, preserving order and every byte of text.
pub fn preprocess(source: &str) -> Vec<CodeBlock> {
    let mut blocks: Vec<CodeBlock> = Vec::new();
    let mut state = LineState::default();
    // Neutral lines seen before any block is open: (text, line, offset).
    let mut pending: Option<(String, usize, usize)> = None;
    let mut offset = 0;

    for (index, raw) in source.split_inclusive('\n').enumerate() {
        let line_number = index + 1;
        let line_offset = offset;
        offset += raw.len();
        let trimmed = raw.trim();

        if is_neutral(trimmed) {
            if let Some(block) = blocks.last_mut() {
                block.text.push_str(raw);
            } else if let Some((text, _, _)) = pending.as_mut() {
                text.push_str(raw);
            } else {
                pending = Some((raw.to_string(), line_number, line_offset));
            }
            continue;
        }

        let kind = state.classify(trimmed);
        trace!(line = line_number, ?kind, "classified");

        match blocks.last_mut() {
            Some(block) if block.kind == kind => block.text.push_str(raw),
            _ => {
                let (mut text, start_line, start_offset) = pending
                    .take()
                    .unwrap_or_else(|| (String::new(), line_number, line_offset));
                text.push_str(raw);
                blocks.push(CodeBlock {
                    kind,
                    text,
                    start_line,
                    start_offset,
                });
            }
        }
    }

    if let Some((text, start_line, start_offset)) = pending {
        blocks.push(CodeBlock {
            kind: BlockKind::Host,
            text,
            start_line,
            start_offset,
        });
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(BlockKind, usize)> {
        preprocess(source)
            .into_iter()
            .map(|b| (b.kind, b.start_line))
            .collect()
    }

    #[test]
    fn host_only_is_one_block() {
        let source = "const a = 1;\n\nfunction f() {\n  return a;\n}\n";
        let blocks = preprocess(source);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Host);
        assert_eq!(blocks[0].text, source);
    }

    #[test]
    fn struct_then_host() {
        let source = "struct User {\n  name: string\n}\nconsole.log(1);\n";
        assert_eq!(
            kinds(source),
            vec![(BlockKind::Dsl, 1), (BlockKind::Host, 4)]
        );
    }

    #[test]
    fn impl_methods_do_not_end_the_declaration() {
        let source = "impl User {\n  greet() {\n    return \"hi\";\n  }\n  bye() {\n  }\n}\nconst x = 1;\n";
        let blocks = preprocess(source);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].text.ends_with("}\n}\n"));
        assert_eq!(blocks[1].start_line, 8);
    }

    #[test]
    fn multi_line_let_match_stays_together() {
        let source = "let r = match x {\n  :ok => 1,\n  _ => 2\n}\nfoo();\n";
        assert_eq!(
            kinds(source),
            vec![(BlockKind::Dsl, 1), (BlockKind::Host, 5)]
        );
    }

    #[test]
    fn bodiless_struct_does_not_swallow_host() {
        let source = "struct Marker;\nconst y = 2;\n";
        assert_eq!(
            kinds(source),
            vec![(BlockKind::Dsl, 1), (BlockKind::Host, 2)]
        );
    }

    #[test]
    fn brace_on_the_next_line_opens_the_declaration() {
        let source = "struct User\n// fields\n{\n  name: string\n}\nconst x = 1;\n";
        assert_eq!(
            kinds(source),
            vec![(BlockKind::Dsl, 1), (BlockKind::Host, 6)]
        );
    }

    #[test]
    fn header_without_brace_does_not_capture_host() {
        let source = "impl Greet for User\nconst y = 2;\n";
        assert_eq!(
            kinds(source),
            vec![(BlockKind::Dsl, 1), (BlockKind::Host, 2)]
        );
    }

    #[test]
    fn pipe_line_is_dsl() {
        let source = "const a = 1;\n\"x\" |> trim |> print\nconst b = 2;\n";
        assert_eq!(
            kinds(source),
            vec![(BlockKind::Host, 1), (BlockKind::Dsl, 2), (BlockKind::Host, 3)]
        );
    }

    #[test]
    fn leading_comments_join_first_block() {
        let source = "// header\n\nstruct A;\n";
        let blocks = preprocess(source);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Dsl);
        assert_eq!(blocks[0].start_line, 1);
        assert_eq!(blocks[0].start_offset, 0);
    }

    #[test]
    fn offsets_track_bytes() {
        let source = "const a = 1;\nstruct 123Bad { }\n";
        let blocks = preprocess(source);
        assert_eq!(blocks[1].start_offset, 13);
        assert_eq!(&source[blocks[1].start_offset..], blocks[1].text);
    }

    #[test]
    fn comment_only_source_is_host() {
        let blocks = preprocess("// nothing here\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Host);
    }
}
