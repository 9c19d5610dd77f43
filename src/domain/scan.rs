//! Text scanning primitives
//!
//! A byte-offset cursor over a `&str` with character-class predicates and
//! keyword matching. The precondition parser is built on these; nothing here
//! knows about preconditions.

use super::id::is_id_char;

/// A cursor over input text
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Byte offset of the cursor
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Unconsumed input
    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Consumes characters while `pred` holds and returns them
    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !pred(*c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Skips whitespace
    pub fn skip_spaces(&mut self) {
        self.take_while(char::is_whitespace);
    }

    /// Consumes `keyword` if the input continues with it
    pub fn eat(&mut self, keyword: &str) -> bool {
        if self.rest().starts_with(keyword) {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    /// Consumes `keyword` and any whitespace after it
    pub fn eat_token(&mut self, keyword: &str) -> bool {
        if self.eat(keyword) {
            self.skip_spaces();
            true
        } else {
            false
        }
    }

    /// Scans an identifier of `[A-Za-z0-9_.-]` characters, then skips spaces
    ///
    /// A final `-` directly followed by `>` starts an arrow, so it is left
    /// unconsumed. Returns `None` without moving if no identifier is present.
    pub fn node_id(&mut self) -> Option<&'a str> {
        let start = self.pos;
        let mut id = self.take_while(is_id_char);

        if id.ends_with('-') && self.rest().starts_with('>') {
            self.pos -= 1;
            id = &id[..id.len() - 1];
        }

        if id.is_empty() {
            self.pos = start;
            return None;
        }

        self.skip_spaces();
        Some(id)
    }
}
