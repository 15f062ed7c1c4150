//! Character sources feeding the lexer
//!
//! The lexer never sees a whole file. It pulls characters one at a time from a
//! [`CharSource`], which also owns position tracking:
//! - [`StrSource`]: in-memory text (tests, the viewer, `compile_program`)
//! - [`ReaderSource`]: any [`BufRead`], decoded one line at a time
//!
//! Both sources only move forward. There is no seeking back.

use std::io::{self, BufRead};

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Location of the first character of a file
    pub fn start() -> Self {
        Self::new(1, 1)
    }

    fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

/// A pull-based stream of characters with position tracking.
///
/// `location` is the position of the character `peek` would return, or the
/// final cursor position once the source is drained.
pub trait CharSource {
    /// Look at the next character without consuming it
    fn peek(&mut self) -> io::Result<Option<char>>;

    /// Consume and return the next character
    fn next_char(&mut self) -> io::Result<Option<char>>;

    /// Current cursor position
    fn location(&self) -> SourceLocation;

    fn is_at_end(&mut self) -> io::Result<bool> {
        Ok(self.peek()?.is_none())
    }
}

/// Character source over an in-memory string
pub struct StrSource {
    input: Vec<char>,
    position: usize,
    location: SourceLocation,
}

impl StrSource {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            location: SourceLocation::start(),
        }
    }
}

impl CharSource for StrSource {
    fn peek(&mut self) -> io::Result<Option<char>> {
        Ok(self.input.get(self.position).copied())
    }

    fn next_char(&mut self) -> io::Result<Option<char>> {
        let ch = self.input.get(self.position).copied();
        if let Some(ch) = ch {
            self.position += 1;
            self.location.advance(ch);
        }
        Ok(ch)
    }

    fn location(&self) -> SourceLocation {
        self.location
    }
}

/// Character source over a buffered reader.
///
/// Reads one line into a buffer at a time, so a file is never held in memory
/// as a whole. Invalid UTF-8 is reported as an [`io::Error`].
pub struct ReaderSource<R> {
    reader: R,
    buffer: Vec<char>,
    position: usize,
    exhausted: bool,
    location: SourceLocation,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            position: 0,
            exhausted: false,
            location: SourceLocation::start(),
        }
    }

    /// Make sure the buffer holds at least one unread character, unless the
    /// reader is drained.
    fn fill(&mut self) -> io::Result<()> {
        while self.position >= self.buffer.len() && !self.exhausted {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                self.exhausted = true;
            } else {
                self.buffer = line.chars().collect();
                self.position = 0;
            }
        }
        Ok(())
    }
}

impl<R: BufRead> CharSource for ReaderSource<R> {
    fn peek(&mut self) -> io::Result<Option<char>> {
        self.fill()?;
        Ok(self.buffer.get(self.position).copied())
    }

    fn next_char(&mut self) -> io::Result<Option<char>> {
        let ch = self.peek()?;
        if let Some(ch) = ch {
            self.position += 1;
            self.location.advance(ch);
        }
        Ok(ch)
    }

    fn location(&self) -> SourceLocation {
        self.location
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_str_source_tracks_lines() {
        let mut src = StrSource::new("a\nbc");
        assert_eq!(src.location(), SourceLocation::new(1, 1));
        assert_eq!(src.next_char().unwrap(), Some('a'));
        assert_eq!(src.next_char().unwrap(), Some('\n'));
        assert_eq!(src.location(), SourceLocation::new(2, 1));
        assert_eq!(src.peek().unwrap(), Some('b'));
        src.next_char().unwrap();
        src.next_char().unwrap();
        assert!(src.is_at_end().unwrap());
        assert_eq!(src.location(), SourceLocation::new(2, 3));
        assert_eq!(src.next_char().unwrap(), None);
        assert_eq!(src.location(), SourceLocation::new(2, 3));
    }

    #[test]
    fn test_reader_source_matches_str_source() {
        let text = "let x: int;\n\nfn f() -> void {}\n";
        let mut from_reader = ReaderSource::new(text.as_bytes());
        let mut from_str = StrSource::new(text);

        loop {
            assert_eq!(from_reader.location(), from_str.location());
            let a = from_reader.next_char().unwrap();
            let b = from_str.next_char().unwrap();
            assert_eq!(a, b);
            if a.is_none() {
                break;
            }
        }
    }

    #[test]
    fn test_reader_source_rejects_invalid_utf8() {
        let bytes: &[u8] = &[b'a', 0xff, 0xfe, b'\n'];
        let mut src = ReaderSource::new(bytes);
        assert!(src.peek().is_err());
    }
}
