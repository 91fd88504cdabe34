//! # Rendering
//!
//! Turns a card's question and answer blocks into the HTML stored on the
//! note. Each block is rendered on its own with `pulldown-cmark`'s HTML
//! writer. Id annotations are stripped from headings only, so an annotation
//! quoted in a paragraph or code sample is rendered as written.
//!
//! Fenced code blocks that name a language are offered to a [`Highlighter`].
//! A highlighter returns highlighted markup, or an empty string to fall back
//! to the writer's default escaping.

use crate::ids;
use crate::model::{Block, Card, RenderedCard};
use crate::tokens::parser_options;
use pulldown_cmark::{html, CodeBlockKind, Event, Parser, Tag, TagEnd};

/// Source-code highlighting hook, keyed by the fence's language tag.
pub trait Highlighter {
    fn highlight(&self, code: &str, lang: &str) -> String;
}

impl<F> Highlighter for F
where
    F: Fn(&str, &str) -> String,
{
    fn highlight(&self, code: &str, lang: &str) -> String {
        self(code, lang)
    }
}

/// Never highlights; code is always escaped by the HTML writer.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, _code: &str, _lang: &str) -> String {
        String::new()
    }
}

pub struct Renderer<H = PlainHighlighter> {
    highlighter: H,
}

impl Default for Renderer<PlainHighlighter> {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer<PlainHighlighter> {
    pub fn new() -> Self {
        Self {
            highlighter: PlainHighlighter,
        }
    }
}

impl<H: Highlighter> Renderer<H> {
    pub fn with_highlighter(highlighter: H) -> Self {
        Self { highlighter }
    }

    pub fn render_cards(&self, cards: &[Card]) -> Vec<RenderedCard> {
        cards.iter().map(|card| self.render_card(card)).collect()
    }

    pub fn render_card(&self, card: &Card) -> RenderedCard {
        RenderedCard {
            id: card.id.clone(),
            deck: card.deck.clone(),
            question: self.render_blocks(&card.question),
            answer: self.render_blocks(&card.answer),
            line: card.line,
        }
    }

    pub fn render_blocks(&self, blocks: &[Block]) -> String {
        let mut out = String::new();
        for block in blocks {
            if block.heading_depth().is_some() {
                self.render_source(&ids::strip_annotation(&block.source), &mut out);
            } else {
                self.render_source(&block.source, &mut out);
            }
        }
        out.truncate(out.trim_end().len());
        out
    }

    fn render_source(&self, source: &str, out: &mut String) {
        let mut events = Vec::new();
        let mut pending: Option<PendingCode<'_>> = None;

        for event in Parser::new_ext(source, parser_options()) {
            if pending.is_some() {
                match event {
                    Event::Text(text) => {
                        if let Some(code) = pending.as_mut() {
                            code.text.push_str(&text);
                        }
                    }
                    Event::End(TagEnd::CodeBlock) => {
                        if let Some(code) = pending.take() {
                            self.push_code(code, &mut events);
                        }
                    }
                    _ => {}
                }
                continue;
            }

            if let Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) = &event {
                let lang = fence_language(info);
                if !lang.is_empty() {
                    pending = Some(PendingCode {
                        start: event.clone(),
                        lang,
                        text: String::new(),
                    });
                    continue;
                }
            }
            events.push(event);
        }

        html::push_html(out, events.into_iter());
    }

    fn push_code<'a>(&self, code: PendingCode<'a>, events: &mut Vec<Event<'a>>) {
        let highlighted = self.highlighter.highlight(&code.text, &code.lang);
        if highlighted.is_empty() {
            events.push(code.start);
            events.push(Event::Text(code.text.into()));
            events.push(Event::End(TagEnd::CodeBlock));
        } else {
            events.push(Event::Html(
                format!(
                    "<pre><code class=\"language-{}\">{}</code></pre>\n",
                    code.lang, highlighted
                )
                .into(),
            ));
        }
    }
}

struct PendingCode<'a> {
    start: Event<'a>,
    lang: String,
    text: String,
}

fn fence_language(info: &str) -> String {
    info.split_whitespace()
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '+' | '#' | '.'))
        .collect()
}
