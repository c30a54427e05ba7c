//! Collaborator seams.
//!
//! The engine never owns the document, the highlighter, or the dictionary
//! configuration: they are borrowed per call through the traits below, the
//! same way a derived-state processor borrows the editor state it reads.
//! The backend validation session is the one collaborator the engine owns,
//! because it carries in-flight per-job state.

use crate::position::{DocRange, Position};

/// Plain text rendered from a document range, with a map back to document
/// coordinates.
///
/// `offsets[i]` is the document position of `text`'s `i`-th `char`. Documents
/// that decode multi-character escapes into single characters produce maps
/// where consecutive entries are more than one column apart.
#[derive(Debug, Clone, Default)]
pub struct DecodedText {
    /// The decoded plain text.
    pub text: String,
    /// Document position of each `char` in `text`.
    pub offsets: Vec<Position>,
}

impl DecodedText {
    /// Map a `char` offset in `text` back to its document position.
    pub fn map_offset(&self, offset: usize) -> Option<Position> {
        self.offsets.get(offset).copied()
    }

    /// Whether no text was decoded.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Read access to the host's text document.
///
/// All coordinates are line/column positions as defined in
/// [`crate::position`]. The engine only ever reads; it never mutates the
/// document.
pub trait Document {
    /// The full extent of the document, from `(0,0)` to one past the last
    /// character of the last line.
    fn document_range(&self) -> DocRange;

    /// Number of lines. An empty document still has one (empty) line.
    fn line_count(&self) -> usize;

    /// Length of `line` in `char`s, excluding any line terminator.
    /// Out-of-range lines report 0.
    fn line_length(&self, line: usize) -> usize;

    /// The text of `line` without its terminator, or `None` when out of range.
    fn line_text(&self, line: usize) -> Option<String>;

    /// The character at `pos`, or `None` at line ends / out of range.
    fn char_at(&self, pos: Position) -> Option<char>;

    /// Render `range` to plain text for the backend, producing the offset map
    /// used to translate backend-reported offsets to document coordinates.
    ///
    /// Line breaks inside `range` must appear as `'\n'` in the output (and in
    /// the offset map, anchored at the end of the broken line).
    fn decode(&self, range: DocRange) -> DecodedText;
}

/// Opaque highlighting attribute identifier, as assigned by the host's
/// highlighter.
pub type AttributeId = u32;

/// The highlighting token under one document position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightToken {
    /// The attribute the highlighter assigned here.
    pub attribute: AttributeId,
    /// Width of the token in `char`s. Tokens wider than one character are
    /// atomic (e.g. an encoded-character escape): the partitioner consumes
    /// them whole and always treats them as eligible.
    pub atom_len: usize,
}

impl HighlightToken {
    /// A plain single-character token.
    pub const fn single(attribute: AttributeId) -> Self {
        Self {
            attribute,
            atom_len: 1,
        }
    }
}

/// Read access to the host's highlighting classification.
pub trait HighlightSource {
    /// The token at `pos`.
    fn token_at(&self, pos: Position) -> HighlightToken;

    /// Whether text carrying `attribute` should be spell checked
    /// (prose/comments yes, code keywords/strings typically no).
    fn eligible_for_check(&self, attribute: AttributeId) -> bool;

    /// Whether `line` holds nothing checkable (used to skip whole lines).
    fn is_empty_line(&self, line: usize) -> bool {
        let _ = line;
        false
    }
}

/// Every position eligible: the classification for plain-text hosts that run
/// no highlighter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextEligibility;

impl HighlightSource for PlainTextEligibility {
    fn token_at(&self, _pos: Position) -> HighlightToken {
        HighlightToken::single(0)
    }

    fn eligible_for_check(&self, _attribute: AttributeId) -> bool {
        true
    }
}

/// Dictionary assignment for the document: one default plus optional declared
/// per-range overrides.
pub trait DictionaryMap {
    /// The dictionary used where no declared range applies.
    fn default_dictionary(&self) -> String;

    /// Declared `(range, dictionary)` overrides, in document coordinates.
    fn dictionary_ranges(&self) -> Vec<(DocRange, String)>;
}

/// A [`DictionaryMap`] over fixed data.
#[derive(Debug, Clone)]
pub struct StaticDictionaryMap {
    default: String,
    ranges: Vec<(DocRange, String)>,
}

impl StaticDictionaryMap {
    /// Create a map with only a default dictionary.
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            ranges: Vec::new(),
        }
    }

    /// Add a declared override range (kept sorted by start).
    pub fn with_range(mut self, range: DocRange, dictionary: impl Into<String>) -> Self {
        let dictionary = dictionary.into();
        let pos = self
            .ranges
            .binary_search_by(|(r, _)| r.start.cmp(&range.start))
            .unwrap_or_else(|pos| pos);
        self.ranges.insert(pos, (range, dictionary));
        self
    }
}

impl DictionaryMap for StaticDictionaryMap {
    fn default_dictionary(&self) -> String {
        self.default.clone()
    }

    fn dictionary_ranges(&self) -> Vec<(DocRange, String)> {
        self.ranges.clone()
    }
}

/// An event reported by the backend validation session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A word in the submitted text failed validation.
    Misspelling {
        /// The misspelled word as the backend saw it.
        word: String,
        /// `char` offset of the word in the submitted text.
        offset: usize,
    },
    /// The submitted text is fully checked.
    Done,
}

/// The external backend that actually judges words.
///
/// The session is cooperative and single-threaded from the engine's point of
/// view: after [`start`](ValidationSession::start), results are pulled with
/// [`poll`](ValidationSession::poll). After reporting a misspelling the
/// session waits until [`continue_checking`](ValidationSession::continue_checking)
/// before producing more. [`stop`](ValidationSession::stop) discards the
/// in-flight check synchronously and completely.
pub trait ValidationSession {
    /// Select the dictionary for the next check.
    fn set_dictionary(&mut self, name: &str);

    /// Submit `text` and begin checking it.
    fn start(&mut self, text: &str);

    /// Abandon the in-flight check, if any.
    fn stop(&mut self);

    /// Allow the session to proceed past the last reported misspelling.
    fn continue_checking(&mut self);

    /// Pull the next result, or `None` when the session is waiting
    /// (for `continue_checking`, or for its own asynchronous progress).
    fn poll(&mut self) -> Option<SessionEvent>;

    /// Permanently accept `word` (user added it to their personal list).
    fn add_word_to_personal_list(&mut self, word: &str);

    /// Accept `word` for the rest of this session only.
    fn add_word_to_session_ignore_list(&mut self, word: &str);
}

/// Borrowed bundle of the per-call collaborators.
///
/// Engine entry points take a `CheckContext` instead of individual references
/// so hosts keep one wiring site.
#[derive(Clone, Copy)]
pub struct CheckContext<'a> {
    /// The text document.
    pub document: &'a dyn Document,
    /// The highlighting classification.
    pub highlight: &'a dyn HighlightSource,
    /// The dictionary assignment.
    pub dictionaries: &'a dyn DictionaryMap,
}

impl<'a> CheckContext<'a> {
    /// Bundle the three read-side collaborators.
    pub fn new(
        document: &'a dyn Document,
        highlight: &'a dyn HighlightSource,
        dictionaries: &'a dyn DictionaryMap,
    ) -> Self {
        Self {
            document,
            highlight,
            dictionaries,
        }
    }
}
