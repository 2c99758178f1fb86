//! Byte-to-text decoding with escape sequence stripping.
//!
//! Prompts sometimes arrive wrapped in color codes or cursor movement that
//! cannot be switched off. A `vte` parser drops those sequences while keeping
//! printable text. The parser is stateful, so a UTF-8 character or an escape
//! sequence split across two reads is still handled correctly.

use std::fmt;

use vte::{Parser, Perform};

/// Stateful filter turning raw terminal bytes into plain text.
pub struct TerminalFilter {
    parser: Parser,
}

impl TerminalFilter {
    /// Create a filter in the ground state.
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Decode `data`, appending the printable text to `out`.
    pub fn feed(&mut self, data: &[u8], out: &mut String) {
        let mut collector = TextCollector { out };
        self.parser.advance(&mut collector, data);
    }
}

impl Default for TerminalFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TerminalFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalFilter").finish_non_exhaustive()
    }
}

struct TextCollector<'a> {
    out: &'a mut String,
}

impl Perform for TextCollector<'_> {
    fn print(&mut self, c: char) {
        self.out.push(c);
    }

    fn execute(&mut self, byte: u8) {
        // Line structure survives, bells and backspaces do not.
        if matches!(byte, b'\r' | b'\n' | b'\t') {
            self.out.push(byte as char);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(chunks: &[&[u8]]) -> String {
        let mut filter = TerminalFilter::new();
        let mut out = String::new();
        for chunk in chunks {
            filter.feed(chunk, &mut out);
        }
        out
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(decode(&[b"router> "]), "router> ");
    }

    #[test]
    fn test_color_codes_stripped() {
        assert_eq!(decode(&[b"\x1b[32mGreen text\x1b[0m"]), "Green text");
        assert_eq!(decode(&[b"\x1b[K\x1b[?1h\x1b=amnesiac #"]), "amnesiac #");
    }

    #[test]
    fn test_line_controls_kept() {
        assert_eq!(decode(&[b"a\r\nb\tc\x07\x08"]), "a\r\nb\tc");
    }

    #[test]
    fn test_escape_split_across_reads() {
        assert_eq!(decode(&[b"abc\x1b[3", b"2mdef"]), "abcdef");
    }

    #[test]
    fn test_utf8_split_across_reads() {
        let bytes = "für".as_bytes();
        assert_eq!(decode(&[&bytes[..2], &bytes[2..]]), "für");
    }
}
