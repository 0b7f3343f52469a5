use std::ops::Index;
use std::sync::Arc;

/// Characters that close a sentence or clause and earn a dwell.
pub const CLAUSE_TERMINATORS: [char; 5] = ['.', '!', '?', ';', ':'];

/// Immutable, ordered list of display tokens.
///
/// Cloning is cheap: the tokens live behind an `Arc` and are shared between the
/// controller and anything holding a snapshot of the sequence. A new text always
/// produces a new sequence; an existing one is never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSequence {
    tokens: Arc<[String]>,
}

impl TokenSequence {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    /// `len` tokens starting at `start`, joined by single spaces.
    /// Empty when `start` is out of range.
    pub fn window(&self, start: usize, len: usize) -> String {
        if start >= self.tokens.len() {
            return String::new();
        }
        let end = start.saturating_add(len).min(self.tokens.len());
        self.tokens[start..end].join(" ")
    }
}

impl Index<usize> for TokenSequence {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.tokens[index]
    }
}

impl From<Vec<String>> for TokenSequence {
    fn from(tokens: Vec<String>) -> Self {
        Self {
            tokens: tokens.into(),
        }
    }
}

impl FromIterator<String> for TokenSequence {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}

/// Pure: split on whitespace runs, drop empties.
///
/// U+FEFF counts as a separator: `char::is_whitespace` excludes it, and a byte
/// order mark at the head of a UTF-8 file would otherwise stick to the first word.
pub fn tokenize(text: &str) -> TokenSequence {
    text.split(is_separator)
        .filter(|word| !word.is_empty())
        .map(str::to_owned)
        .collect()
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

/// True when the token's last character is one of [`CLAUSE_TERMINATORS`].
pub fn ends_clause(token: &str) -> bool {
    token
        .chars()
        .next_back()
        .is_some_and(|c| CLAUSE_TERMINATORS.contains(&c))
}
