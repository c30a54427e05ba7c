//! `spellcheck-wordlist` - In-memory word-list backend for `spellcheck-core`.
//!
//! A reference [`ValidationSession`] that judges words against plain word
//! lists (one word per line, `#` comments). It is deliberately simple - no
//! affix rules, no suggestions - but it honors the full session protocol:
//! cooperative delivery, stop-after-misspelling until `continue_checking`,
//! personal and session-ignore lists, synchronous total `stop`.

use std::collections::{BTreeMap, HashSet};
use std::io::{BufRead, BufReader, Read};

use spellcheck_core::{SessionEvent, ValidationSession};
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

/// Errors from loading word lists.
#[derive(Debug, Error)]
pub enum WordListError {
    /// Reading the source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The source held no words at all.
    #[error("empty word list for dictionary '{0}'")]
    Empty(String),
}

/// A set of named dictionaries, each a plain set of known words.
///
/// Lookup is case-tolerant in one direction: a capitalized occurrence of a
/// known lowercase word (sentence start) is accepted, but not the reverse.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    dictionaries: BTreeMap<String, HashSet<String>>,
}

impl WordList {
    /// Create an empty word list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or extend) a dictionary from an iterator of words.
    pub fn add_dictionary<I, S>(&mut self, name: impl Into<String>, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dictionaries
            .entry(name.into())
            .or_default()
            .extend(words.into_iter().map(Into::into));
    }

    /// Parse a dictionary from word-list text: one word per line, blank lines
    /// and `#` comment lines skipped.
    pub fn add_from_text(&mut self, name: impl Into<String>, text: &str) -> Result<(), WordListError> {
        let name = name.into();
        let words: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect();
        if words.is_empty() {
            return Err(WordListError::Empty(name));
        }
        self.add_dictionary(name, words);
        Ok(())
    }

    /// Parse a dictionary from a reader in the same format.
    pub fn add_from_reader(
        &mut self,
        name: impl Into<String>,
        reader: impl Read,
    ) -> Result<(), WordListError> {
        let name = name.into();
        let mut words = Vec::new();
        for line in BufReader::new(reader).lines() {
            let line = line?;
            let line = line.trim();
            if !line.is_empty() && !line.starts_with('#') {
                words.push(line.to_string());
            }
        }
        if words.is_empty() {
            return Err(WordListError::Empty(name));
        }
        self.add_dictionary(name, words);
        Ok(())
    }

    /// Whether `word` is known in `dictionary`.
    ///
    /// An unknown dictionary name knows every word: a misconfigured language
    /// must degrade to "nothing flagged", not to "everything flagged".
    pub fn contains(&self, dictionary: &str, word: &str) -> bool {
        let Some(words) = self.dictionaries.get(dictionary) else {
            return true;
        };
        words.contains(word) || words.contains(&word.to_lowercase())
    }

    /// Names of the loaded dictionaries.
    pub fn dictionary_names(&self) -> impl Iterator<Item = &str> {
        self.dictionaries.keys().map(String::as_str)
    }
}

#[derive(Debug)]
enum SessionState {
    Idle,
    Checking {
        tokens: Vec<(usize, String)>,
        next: usize,
        awaiting_continue: bool,
    },
}

/// A [`ValidationSession`] over a [`WordList`].
#[derive(Debug)]
pub struct WordListSession {
    words: WordList,
    dictionary: String,
    state: SessionState,
    personal: HashSet<String>,
    ignored: HashSet<String>,
}

impl WordListSession {
    /// Create a session over `words`. The dictionary starts unset; the engine
    /// selects one per job via `set_dictionary`.
    pub fn new(words: WordList) -> Self {
        Self {
            words,
            dictionary: String::new(),
            state: SessionState::Idle,
            personal: HashSet::new(),
            ignored: HashSet::new(),
        }
    }

    fn is_acceptable(&self, word: &str) -> bool {
        // Bare numbers are never misspellings.
        if word.chars().all(|c| c.is_numeric()) {
            return true;
        }
        self.words.contains(&self.dictionary, word)
            || self.personal.contains(word)
            || self.personal.contains(&word.to_lowercase())
            || self.ignored.contains(word)
            || self.ignored.contains(&word.to_lowercase())
    }
}

/// Split `text` into words with their `char` offsets.
///
/// Unicode word segmentation keeps contractions ("isn't") together, matching
/// the engine's word-boundary rule.
fn tokenize(text: &str) -> Vec<(usize, String)> {
    let mut tokens = Vec::new();
    let mut char_offset = 0;
    let mut last_byte = 0;
    for (byte, word) in text.unicode_word_indices() {
        char_offset += text[last_byte..byte].chars().count();
        last_byte = byte;
        tokens.push((char_offset, word.to_string()));
    }
    tokens
}

impl ValidationSession for WordListSession {
    fn set_dictionary(&mut self, name: &str) {
        self.dictionary = name.to_string();
    }

    fn start(&mut self, text: &str) {
        self.state = SessionState::Checking {
            tokens: tokenize(text),
            next: 0,
            awaiting_continue: false,
        };
    }

    fn stop(&mut self) {
        self.state = SessionState::Idle;
    }

    fn continue_checking(&mut self) {
        if let SessionState::Checking {
            awaiting_continue, ..
        } = &mut self.state
        {
            *awaiting_continue = false;
        }
    }

    fn poll(&mut self) -> Option<SessionEvent> {
        let SessionState::Checking {
            tokens,
            mut next,
            awaiting_continue,
        } = std::mem::replace(&mut self.state, SessionState::Idle)
        else {
            return None;
        };
        if awaiting_continue {
            self.state = SessionState::Checking {
                tokens,
                next,
                awaiting_continue,
            };
            return None;
        }

        while next < tokens.len() {
            let (offset, word) = tokens[next].clone();
            next += 1;
            if !self.is_acceptable(&word) {
                self.state = SessionState::Checking {
                    tokens,
                    next,
                    awaiting_continue: true,
                };
                return Some(SessionEvent::Misspelling { word, offset });
            }
        }

        Some(SessionEvent::Done)
    }

    fn add_word_to_personal_list(&mut self, word: &str) {
        self.personal.insert(word.to_string());
    }

    fn add_word_to_session_ignore_list(&mut self, word: &str) {
        self.ignored.insert(word.to_string());
    }
}
