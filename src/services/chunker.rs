//! Splits extracted document text into model-sized pieces.
//!
//! Sizes are counted in characters. A window that does not reach the end of
//! the text is pulled back to just after the last line break inside it, so a
//! chunk never stops in the middle of a line unless the window holds no line
//! break at all. The chunks partition the input: joined back together they
//! reproduce it exactly.

use std::iter::FusedIterator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    size: usize,
}

impl Chunker {
    /// A size of zero is treated as one character.
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            position: 0,
            size: self.size,
        }
    }

    pub fn count(&self, text: &str) -> usize {
        self.chunks(text).count()
    }
}

/// Single-pass iterator over the chunks of one text.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    position: usize,
    size: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.text[self.position..];
        if rest.is_empty() {
            return None;
        }

        let window_end = rest
            .char_indices()
            .nth(self.size)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());

        let end = if window_end < rest.len() {
            match rest[..window_end].rfind('\n') {
                Some(newline) => newline + 1,
                None => window_end,
            }
        } else {
            window_end
        };

        self.position += end;
        Some(&rest[..end])
    }
}

impl FusedIterator for Chunks<'_> {}
