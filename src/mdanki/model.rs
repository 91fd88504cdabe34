/// Heading prefix that declares (or nests) a deck.
pub const DECK_PREFIX: &str = "Deck: ";

/// Heading text that separates question context from the answer.
pub const ANSWER_MARKER: &str = "Answer";

/// Heading prefix for purely cosmetic question labels.
pub const QUESTION_LABEL: &str = "Question";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading { depth: usize },
    Other,
}

/// A top-level markdown block as produced by [`crate::tokens::tokenize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// Inline text for headings, raw source for everything else.
    pub text: String,
    /// The markdown slice this block was parsed from.
    pub source: String,
    /// 1-based line of the first character of the block.
    pub line: usize,
}

impl Block {
    pub fn heading_depth(&self) -> Option<usize> {
        match self.kind {
            BlockKind::Heading { depth } => Some(depth),
            BlockKind::Other => None,
        }
    }

    pub fn is_deck_heading(&self) -> bool {
        self.heading_depth().is_some() && self.text.starts_with(DECK_PREFIX)
    }

    /// Deck name declared by this heading, if it is a deck heading.
    pub fn deck_name(&self) -> Option<&str> {
        if self.heading_depth().is_some() {
            self.text.strip_prefix(DECK_PREFIX)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: String,
    pub deck: String,
    pub question: Vec<Block>,
    pub answer: Vec<Block>,
    /// Line of the heading that opened this card.
    pub line: usize,
}

/// An identifier minted during extraction that must be written back to
/// the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewId {
    pub line: usize,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCard {
    pub id: String,
    pub deck: String,
    pub question: String,
    pub answer: String,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteHandle(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CardHandle(pub i64);

/// A card as it currently exists in the remote collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCard {
    pub note: NoteHandle,
    pub card: CardHandle,
    pub id: String,
    pub question: String,
    pub answer: String,
    pub deck: String,
}
