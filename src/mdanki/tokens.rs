//! # Token Source
//!
//! Splits a markdown document into its top-level blocks. Everything downstream
//! (extraction, rendering) works on these blocks and never re-tokenizes the
//! document mid-pass.
//!
//! Parsing is delegated to `pulldown-cmark`; this module only flattens the
//! event stream into one [`Block`] per top-level element and works out the
//! line each block starts on.

use crate::model::{Block, BlockKind};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag};
use std::ops::Range;

pub fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Tokenizes `markdown` into top-level blocks, in document order.
///
/// A leading byte order mark is ignored.
pub fn tokenize(markdown: &str) -> Vec<Block> {
    let markdown = markdown.strip_prefix('\u{feff}').unwrap_or(markdown);
    let lines = LineIndex::new(markdown);
    let mut blocks = Vec::new();
    let mut nesting = 0usize;
    let mut current: Option<Pending> = None;

    for (event, range) in Parser::new_ext(markdown, parser_options()).into_offset_iter() {
        match event {
            Event::Start(tag) => {
                if nesting == 0 {
                    let kind = match tag {
                        Tag::Heading { level, .. } => BlockKind::Heading {
                            depth: heading_depth(level),
                        },
                        _ => BlockKind::Other,
                    };
                    current = Some(Pending {
                        kind,
                        range,
                        heading_text: String::new(),
                    });
                }
                nesting += 1;
            }
            Event::End(_) => {
                nesting = nesting.saturating_sub(1);
                if nesting == 0 {
                    if let Some(pending) = current.take() {
                        blocks.push(pending.finish(markdown, &lines));
                    }
                }
            }
            other => {
                if nesting == 0 {
                    // Standalone top-level events such as thematic breaks.
                    let pending = Pending {
                        kind: BlockKind::Other,
                        range,
                        heading_text: String::new(),
                    };
                    blocks.push(pending.finish(markdown, &lines));
                } else if let Some(pending) = current.as_mut() {
                    pending.push_inline(&other);
                }
            }
        }
    }

    blocks
}

struct Pending {
    kind: BlockKind,
    range: Range<usize>,
    heading_text: String,
}

impl Pending {
    fn push_inline(&mut self, event: &Event<'_>) {
        if !matches!(self.kind, BlockKind::Heading { .. }) {
            return;
        }
        match event {
            Event::Text(text) | Event::InlineHtml(text) | Event::Html(text) => {
                self.heading_text.push_str(text)
            }
            Event::Code(code) => {
                self.heading_text.push('`');
                self.heading_text.push_str(code);
                self.heading_text.push('`');
            }
            Event::SoftBreak | Event::HardBreak => self.heading_text.push(' '),
            _ => {}
        }
    }

    fn finish(self, markdown: &str, lines: &LineIndex) -> Block {
        let source = markdown[self.range.clone()]
            .trim_end_matches(['\n', '\r'])
            .to_string();
        let text = match self.kind {
            BlockKind::Heading { .. } => self.heading_text.trim().to_string(),
            BlockKind::Other => source.clone(),
        };
        Block {
            kind: self.kind,
            text,
            source,
            line: lines.line_of(self.range.start),
        }
    }
}

fn heading_depth(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Maps byte offsets to 1-based line numbers.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn summary(blocks: &[Block]) -> Vec<(Option<usize>, String, usize)> {
        blocks
            .iter()
            .map(|b| (b.heading_depth(), b.text.clone(), b.line))
            .collect()
    }

    #[test]
    fn headings_and_paragraphs_with_lines() {
        let md = "# Deck: My Deck\n\n## First question?\n\nFirst answer";
        assert_eq!(
            summary(&tokenize(md)),
            vec![
                (Some(1), "Deck: My Deck".to_string(), 1),
                (Some(2), "First question?".to_string(), 3),
                (None, "First answer".to_string(), 5),
            ]
        );
    }

    #[test]
    fn leading_byte_order_mark_is_ignored() {
        let md = "\u{feff}# Deck: D\n\n## Q\n";
        assert_eq!(
            summary(&tokenize(md)),
            vec![
                (Some(1), "Deck: D".to_string(), 1),
                (Some(2), "Q".to_string(), 3),
            ]
        );
    }

    #[test]
    fn heading_text_keeps_id_annotation() {
        let blocks = tokenize("## First question? <!-- id:someid -->\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "First question? <!-- id:someid -->");
        assert_eq!(blocks[0].source, "## First question? <!-- id:someid -->");
    }

    #[test]
    fn crlf_line_numbers_match_lf() {
        let lf = "# A\n\ntext\n\n## B\n";
        let crlf = lf.replace('\n', "\r\n");
        let a: Vec<usize> = tokenize(lf).iter().map(|b| b.line).collect();
        let b: Vec<usize> = tokenize(&crlf).iter().map(|b| b.line).collect();
        assert_eq!(a, vec![1, 3, 5]);
        assert_eq!(a, b);
    }

    #[test]
    fn nested_structures_are_single_blocks() {
        let md = "- one\n- two\n  - nested\n\n> quote\n> more\n\n```rust\nfn main() {}\n```\n\n---\n";
        let blocks = tokenize(md);
        assert_eq!(blocks.len(), 4);
        assert!(blocks.iter().all(|b| b.heading_depth().is_none()));
        assert_eq!(blocks[0].source, "- one\n- two\n  - nested");
        assert_eq!(blocks[2].line, 8);
        assert_eq!(blocks[3].source, "---");
    }

    #[test]
    fn heading_inline_code_is_kept() {
        let blocks = tokenize("### What does `Rc` do?");
        assert_eq!(blocks[0].text, "What does `Rc` do?");
        assert_eq!(blocks[0].heading_depth(), Some(3));
    }

    #[test]
    fn empty_document_has_no_blocks() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("\n\n").is_empty());
    }
}
