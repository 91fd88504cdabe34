//! # Card Extraction
//!
//! Walks the top-level blocks of a document once, in order, and groups them
//! into cards. The document only partially spells out its own structure, so
//! the extractor infers the rest:
//!
//! - **Decks** are headings starting with `Deck: `. They nest by heading depth:
//!   `# Deck: Rust` followed by `## Deck: Traits` yields `Rust::Traits`.
//! - **Questions** are any other heading at or above the depth of the card in
//!   progress. The heading itself is part of the question unless its text
//!   starts with `Question`, which is only a label.
//! - **Answers** either follow an `Answer` heading exactly one level below the
//!   question (everything in between is question context), or, when there is
//!   no such heading, are simply the question heading's body.
//!
//! At most one card is in progress at any time; it is modelled by
//! [`Progress`] so a card can only ever be gathering one side.
//!
//! ## Identifiers
//!
//! A question heading that carries an id annotation keeps that id. Otherwise a
//! fresh id is minted through the caller's generator and recorded as a
//! [`NewId`] so it can be written back to the document by line.
//!
//! ## Anomalies
//!
//! Extraction never fails. A deck heading found while a card is gathering its
//! answer drops that card and records a [`Diagnostic`]. Cards with no answer
//! content are kept, and reported, leaving the policy to the caller.

use crate::ids;
use crate::model::{Block, Card, NewId, ANSWER_MARKER, QUESTION_LABEL};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A deck heading interrupted a card's answer; the card was dropped.
    DeckInsideAnswer {
        line: usize,
        heading: String,
        dropped_id: String,
        dropped_line: usize,
    },
    /// A card was finalized without any answer content.
    EmptyAnswer { line: usize, id: String },
    /// A card reuses an id already carried by an earlier card.
    DuplicateId {
        line: usize,
        id: String,
        first_line: usize,
    },
}

impl Diagnostic {
    pub fn line(&self) -> usize {
        match self {
            Diagnostic::DeckInsideAnswer { line, .. }
            | Diagnostic::EmptyAnswer { line, .. }
            | Diagnostic::DuplicateId { line, .. } => *line,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DeckInsideAnswer {
                line,
                heading,
                dropped_id,
                dropped_line,
            } => write!(
                f,
                "line {}: found deck heading '{}' while gathering the answer of card {} (line {}); ignoring that card",
                line, heading, dropped_id, dropped_line
            ),
            Diagnostic::EmptyAnswer { line, id } => {
                write!(f, "line {}: card {} has an empty answer", line, id)
            }
            Diagnostic::DuplicateId {
                line,
                id,
                first_line,
            } => write!(
                f,
                "line {}: id {} is already used by the card on line {}; ignoring this card",
                line, id, first_line
            ),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub cards: Vec<Card>,
    pub new_ids: Vec<NewId>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug)]
struct UnfinishedCard {
    id: String,
    question_depth: usize,
    question: Vec<Block>,
    answer: Vec<Block>,
    line: usize,
}

#[derive(Debug, Default)]
enum Progress {
    #[default]
    Idle,
    GatheringQuestion(UnfinishedCard),
    GatheringAnswer(UnfinishedCard),
}

impl Progress {
    fn card(&self) -> Option<&UnfinishedCard> {
        match self {
            Progress::Idle => None,
            Progress::GatheringQuestion(card) | Progress::GatheringAnswer(card) => Some(card),
        }
    }

    fn into_card(self) -> Option<UnfinishedCard> {
        match self {
            Progress::Idle => None,
            Progress::GatheringQuestion(card) | Progress::GatheringAnswer(card) => Some(card),
        }
    }
}

/// Extracts cards from `blocks`, minting ids for new cards with `gen_id`.
pub fn extract<G>(blocks: &[Block], gen_id: G) -> Extraction
where
    G: FnMut() -> String,
{
    let mut extractor = Extractor {
        blocks,
        gen_id,
        deck_headings: Vec::new(),
        progress: Progress::Idle,
        out: Extraction::default(),
    };
    for index in 0..blocks.len() {
        extractor.step(index);
    }
    extractor.finish()
}

struct Extractor<'a, G> {
    blocks: &'a [Block],
    gen_id: G,
    deck_headings: Vec<&'a Block>,
    progress: Progress,
    out: Extraction,
}

impl<'a, G> Extractor<'a, G>
where
    G: FnMut() -> String,
{
    fn step(&mut self, index: usize) {
        let blocks = self.blocks;
        let block = &blocks[index];

        if let Some(depth) = block.heading_depth() {
            if block.is_deck_heading() {
                self.encountered_deck(block);
                return;
            }

            if let Progress::GatheringQuestion(card) = &self.progress {
                if depth == card.question_depth + 1 && block.text == ANSWER_MARKER {
                    self.progress = match std::mem::take(&mut self.progress) {
                        Progress::GatheringQuestion(card) => Progress::GatheringAnswer(card),
                        other => other,
                    };
                    return;
                }
            }

            let is_boundary = match self.progress.card() {
                None => true,
                Some(card) => depth <= card.question_depth,
            };
            if is_boundary {
                self.encountered_question(index, depth);
                return;
            }
        }

        match &mut self.progress {
            Progress::Idle => {}
            Progress::GatheringQuestion(card) => card.question.push(block.clone()),
            Progress::GatheringAnswer(card) => card.answer.push(block.clone()),
        }
    }

    fn encountered_deck(&mut self, heading: &'a Block) {
        match std::mem::take(&mut self.progress) {
            Progress::GatheringAnswer(card) => {
                self.out.diagnostics.push(Diagnostic::DeckInsideAnswer {
                    line: heading.line,
                    heading: heading.text.clone(),
                    dropped_id: card.id,
                    dropped_line: card.line,
                });
            }
            Progress::GatheringQuestion(card) => self.finish_card(card),
            Progress::Idle => {}
        }
        self.deck_headings.push(heading);
    }

    fn encountered_question(&mut self, index: usize, depth: usize) {
        if let Some(card) = std::mem::take(&mut self.progress).into_card() {
            self.finish_card(card);
        }

        let blocks = self.blocks;
        let heading = &blocks[index];
        let id = match ids::embedded_id(&heading.text) {
            Some(id) => id.to_string(),
            None => {
                let id = (self.gen_id)();
                self.out.new_ids.push(NewId {
                    line: heading.line,
                    id: id.clone(),
                });
                id
            }
        };

        let question = if heading.text.starts_with(QUESTION_LABEL) {
            Vec::new()
        } else {
            vec![heading.clone()]
        };
        let card = UnfinishedCard {
            id,
            question_depth: depth,
            question,
            answer: Vec::new(),
            line: heading.line,
        };

        self.progress = if question_has_context(depth, &blocks[index + 1..]) {
            Progress::GatheringQuestion(card)
        } else {
            Progress::GatheringAnswer(card)
        };
    }

    fn finish_card(&mut self, card: UnfinishedCard) {
        if card.answer.is_empty() {
            self.out.diagnostics.push(Diagnostic::EmptyAnswer {
                line: card.line,
                id: card.id.clone(),
            });
        }
        self.out.cards.push(Card {
            id: card.id,
            deck: deck_path(&self.deck_headings),
            question: card.question,
            answer: card.answer,
            line: card.line,
        });
    }

    fn finish(mut self) -> Extraction {
        if let Some(card) = std::mem::take(&mut self.progress).into_card() {
            self.finish_card(card);
        }
        self.out
    }
}

/// Decides whether a question heading at `depth` has context before its
/// answer, i.e. whether the next relevant heading is an `Answer` marker.
fn question_has_context(depth: usize, rest: &[Block]) -> bool {
    for block in rest {
        let Some(next_depth) = block.heading_depth() else {
            continue;
        };
        if next_depth == depth + 1 {
            return block.text == ANSWER_MARKER;
        }
        if next_depth <= depth {
            return false;
        }
    }
    false
}

/// Builds the `Outer::Inner` deck path for the most recent deck heading.
pub fn deck_path(deck_headings: &[&Block]) -> String {
    let Some(last) = deck_headings.last() else {
        return String::new();
    };

    let mut parts = vec![last.deck_name().unwrap_or_default()];
    let mut last_depth = last.heading_depth().unwrap_or(1);

    for heading in deck_headings.iter().rev().skip(1) {
        if last_depth == 1 {
            break;
        }
        let depth = heading.heading_depth().unwrap_or(1);
        if depth >= last_depth {
            continue;
        }
        parts.push(heading.deck_name().unwrap_or_default());
        last_depth = depth;
    }

    parts.reverse();
    parts.join("::")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BlockKind;
    use crate::tokens::tokenize;
    use pretty_assertions::assert_eq;

    fn extract_md(md: &str) -> Extraction {
        extract(&tokenize(md), || "newId".to_string())
    }

    fn texts(blocks: &[Block]) -> Vec<&str> {
        blocks.iter().map(|b| b.text.as_str()).collect()
    }

    fn heading(depth: usize, text: &str, line: usize) -> Block {
        Block {
            kind: BlockKind::Heading { depth },
            text: text.to_string(),
            source: format!("{} {}", "#".repeat(depth), text),
            line,
        }
    }

    #[test]
    fn markdown_without_ids() {
        let result = extract_md("# Deck: My Deck\n\n## First question?\n\nFirst answer");

        assert_eq!(result.cards.len(), 1);
        assert_eq!(
            result.new_ids,
            vec![NewId {
                line: 3,
                id: "newId".to_string()
            }]
        );
        let card = &result.cards[0];
        assert_eq!(card.id, "newId");
        assert_eq!(card.deck, "My Deck");
        assert_eq!(texts(&card.question), vec!["First question?"]);
        assert_eq!(texts(&card.answer), vec!["First answer"]);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn markdown_with_some_ids() {
        let md = "# Deck: My Deck\n\n## First question? <!-- id:someid -->\n\nFirst answer\n\n## Question\n\nq\n\n### Answer\n\na";
        let result = extract_md(md);

        assert_eq!(result.cards.len(), 2);
        assert_eq!(
            result.new_ids,
            vec![NewId {
                line: 7,
                id: "newId".to_string()
            }]
        );

        assert_eq!(result.cards[0].id, "someid");
        assert_eq!(texts(&result.cards[0].answer), vec!["First answer"]);

        let second = &result.cards[1];
        assert_eq!(second.id, "newId");
        assert_eq!(second.deck, "My Deck");
        assert_eq!(texts(&second.question), vec!["q"]);
        assert_eq!(texts(&second.answer), vec!["a"]);
    }

    #[test]
    fn question_with_context_before_answer() {
        let md = "\n# Deck: My Deck\n\n## This is a question <!-- id:c72ec3b33c89c5f55e77cc7e9408bd86 -->\n\nSome more context of the question.\n\n### Answer\n\nThis is the answer to the question.\n";
        let result = extract_md(md);

        assert!(result.new_ids.is_empty());
        let card = &result.cards[0];
        assert_eq!(card.id, "c72ec3b33c89c5f55e77cc7e9408bd86");
        assert_eq!(
            texts(&card.question),
            vec![
                "This is a question <!-- id:c72ec3b33c89c5f55e77cc7e9408bd86 -->",
                "Some more context of the question."
            ]
        );
        assert_eq!(
            texts(&card.answer),
            vec!["This is the answer to the question."]
        );
    }

    #[test]
    fn nested_decks() {
        let md = "# Deck: Upper Deck\n\n## Deck: Nested\n\n### Some Question  <!-- id:x -->\n\nSome Answer\n";
        let result = extract_md(md);

        assert_eq!(result.cards.len(), 1);
        assert_eq!(result.cards[0].deck, "Upper Deck::Nested");
        assert_eq!(result.cards[0].id, "x");
    }

    #[test]
    fn sibling_questions_stay_separate() {
        let md = "# Deck: My Deck\n\n### Some Question  <!-- id:yyy -->\n\nSome Answer\n\n### Some Other Question  <!-- id:zzz -->\n\nAnother answer\n";
        let result = extract_md(md);

        assert!(result.new_ids.is_empty());
        assert_eq!(result.cards.len(), 2);
        assert_eq!(result.cards[0].id, "yyy");
        assert_eq!(texts(&result.cards[0].answer), vec!["Some Answer"]);
        assert_eq!(result.cards[1].id, "zzz");
        assert_eq!(texts(&result.cards[1].answer), vec!["Another answer"]);
        assert_eq!(result.cards[1].question.len(), 1);
    }

    #[test]
    fn question_label_is_not_part_of_question() {
        let md = "# Deck: My Deck\n\n## Question  <!-- id:yyy -->\n\nSome Question\n\n### Answer\n\nSome Answer";
        let result = extract_md(md);

        let card = &result.cards[0];
        assert_eq!(card.id, "yyy");
        assert_eq!(texts(&card.question), vec!["Some Question"]);
        assert_eq!(texts(&card.answer), vec!["Some Answer"]);
    }

    #[test]
    fn deck_heading_inside_answer_drops_card() {
        let md = "# Deck: A\n\n## Dropped <!-- id:gone -->\n\nanswer\n\n### Deck: B\n\n## Kept <!-- id:kept -->\n\nkept answer";
        let result = extract_md(md);

        assert_eq!(result.cards.len(), 1);
        assert_eq!(result.cards[0].id, "kept");
        assert_eq!(result.cards[0].deck, "A::B");
        assert_eq!(
            result.diagnostics,
            vec![Diagnostic::DeckInsideAnswer {
                line: 7,
                heading: "Deck: B".to_string(),
                dropped_id: "gone".to_string(),
                dropped_line: 3,
            }]
        );
    }

    #[test]
    fn deck_heading_finishes_card_gathering_question() {
        // The lookahead skips the deeper deck heading and sees the Answer marker,
        // so the card is still gathering its question when the deck arrives.
        let blocks = vec![
            heading(1, "Deck: A", 1),
            heading(2, "Q <!-- id:q1 -->", 2),
            heading(4, "Deck: B", 3),
            heading(3, "Answer", 4),
        ];
        let result = extract(&blocks, || "gen".to_string());

        assert_eq!(result.cards.len(), 2);
        assert_eq!(result.cards[0].id, "q1");
        assert_eq!(result.cards[0].deck, "A");
        // With no card in progress the orphaned marker opens a card of its own.
        assert_eq!(result.cards[1].id, "gen");
        assert_eq!(result.cards[1].deck, "A::B");
        assert_eq!(
            result.diagnostics,
            vec![
                Diagnostic::EmptyAnswer {
                    line: 2,
                    id: "q1".to_string()
                },
                Diagnostic::EmptyAnswer {
                    line: 4,
                    id: "gen".to_string()
                },
            ]
        );
    }

    #[test]
    fn deck_path_follows_strictly_decreasing_depths() {
        let a = heading(1, "Deck: A", 1);
        let b = heading(2, "Deck: B", 2);
        let c = heading(1, "Deck: C", 3);
        assert_eq!(deck_path(&[&a, &b]), "A::B");
        assert_eq!(deck_path(&[&a, &b, &c]), "C");

        let b3 = heading(3, "Deck: B", 2);
        let c2 = heading(2, "Deck: C", 3);
        assert_eq!(deck_path(&[&a, &b3, &c2]), "A::C");

        let sibling = heading(2, "Deck: D", 4);
        assert_eq!(deck_path(&[&a, &b, &sibling]), "A::D");
        assert_eq!(deck_path(&[]), "");
    }

    #[test]
    fn lookahead_skips_deeper_headings() {
        let md = "## Q <!-- id:q -->\n\n#### detail\n\n### Answer\n\nans";
        let result = extract_md(md);

        let card = &result.cards[0];
        assert_eq!(texts(&card.question), vec!["Q <!-- id:q -->", "detail"]);
        assert_eq!(texts(&card.answer), vec!["ans"]);
    }

    #[test]
    fn non_marker_subheading_means_body_is_answer() {
        let md = "## Q <!-- id:q -->\n\nbody\n\n### Details\n\nmore";
        let result = extract_md(md);

        let card = &result.cards[0];
        assert_eq!(texts(&card.question), vec!["Q <!-- id:q -->"]);
        assert_eq!(texts(&card.answer), vec!["body", "Details", "more"]);
    }

    #[test]
    fn answer_heading_while_gathering_answer_is_content() {
        let md = "## Q <!-- id:q -->\n\nbody\n\n### Answer\n\nmore";
        let result = extract_md(md);

        // The first deeper heading is the marker, so the body is question context.
        assert_eq!(texts(&result.cards[0].question), vec!["Q <!-- id:q -->", "body"]);
        assert_eq!(texts(&result.cards[0].answer), vec!["more"]);

        let md = "## Q <!-- id:q -->\n\n### Other\n\ntext\n\n### Answer\n\nmore";
        let result = extract_md(md);
        assert_eq!(
            texts(&result.cards[0].answer),
            vec!["Other", "text", "Answer", "more"]
        );
    }

    #[test]
    fn content_before_first_question_is_ignored() {
        let md = "Intro paragraph.\n\n# Deck: D\n\nDeck description.\n\n## Q <!-- id:q -->\n\nA";
        let result = extract_md(md);

        assert_eq!(result.cards.len(), 1);
        assert_eq!(texts(&result.cards[0].question), vec!["Q <!-- id:q -->"]);
        assert_eq!(texts(&result.cards[0].answer), vec!["A"]);
    }

    #[test]
    fn card_without_deck_has_empty_deck() {
        let result = extract_md("## Q\n\nA");
        assert_eq!(result.cards[0].deck, "");
    }

    #[test]
    fn empty_answer_is_reported() {
        let result = extract_md("# Deck: D\n\n## Q1 <!-- id:one -->\n\n## Q2 <!-- id:two -->\n\nA2");

        assert_eq!(result.cards.len(), 2);
        assert!(result.cards[0].answer.is_empty());
        assert_eq!(
            result.diagnostics,
            vec![Diagnostic::EmptyAnswer {
                line: 3,
                id: "one".to_string()
            }]
        );
    }

    #[test]
    fn generator_only_called_for_new_cards() {
        let md = "## A <!-- id:a -->\n\nx\n\n## B\n\ny\n\n## C\n\nz";
        let mut counter = 0;
        let result = extract(&tokenize(md), || {
            counter += 1;
            format!("gen{}", counter)
        });

        let ids: Vec<&str> = result.cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "gen1", "gen2"]);
        assert_eq!(
            result.new_ids,
            vec![
                NewId {
                    line: 5,
                    id: "gen1".to_string()
                },
                NewId {
                    line: 9,
                    id: "gen2".to_string()
                },
            ]
        );
    }

    #[test]
    fn annotated_ids_are_stable_across_extractions() {
        let md = "# Deck: D\n\n## A <!-- id:stable_a -->\n\nx\n\n## B\n\ny";
        let blocks = tokenize(md);
        let first = extract(&blocks, || "one".to_string());
        let second = extract(&blocks, || "two".to_string());

        assert_eq!(first.cards[0].id, second.cards[0].id);
        assert_ne!(first.cards[1].id, second.cards[1].id);
        assert_eq!(first.cards[0], second.cards[0]);
    }

    #[test]
    fn malformed_annotation_gets_fresh_id() {
        let result = extract_md("## Q <!-- id:not-valid -->\n\nA");
        assert_eq!(result.cards[0].id, "newId");
        assert_eq!(result.new_ids.len(), 1);
    }
}
