//! Receive buffer with line-at-a-time prompt search.
//!
//! Data is decoded and normalized as it arrives. The buffer remembers where
//! the first unprocessed line starts, so every line is matched exactly once
//! except the trailing partial line, which is matched again as more of it
//! arrives. Only the region after that cursor is ever renormalized.

use memchr::memrchr;

use super::normalize::normalize_region;
use super::patterns::{PatternSet, PromptMatch};
use super::terminal::TerminalFilter;

/// Result of a successful expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectMatch {
    /// Text received before the prompt.
    ///
    /// When the prompt starts a line, the newline ending the previous line
    /// is not part of the output.
    pub output: String,

    /// Index of the matching pattern within the pattern set.
    pub index: usize,

    /// Source of the matching pattern.
    pub pattern: String,

    /// The text the pattern matched.
    pub matched: String,

    /// Byte offset of the match start within the buffered text.
    pub start: usize,

    /// Byte offset of the match end within the buffered text.
    pub end: usize,

    /// Value of the pattern's `name` capture group, if any.
    pub name: Option<String>,
}

/// Buffer for accumulating received text and scanning it for prompts.
#[derive(Debug, Default)]
pub struct ReceiveBuffer {
    /// Decoded, normalized text not yet consumed by a match.
    text: String,

    /// Start of the first line that has not been fully processed.
    next_line_start: usize,

    filter: TerminalFilter,
}

impl ReceiveBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes.
    ///
    /// Escape sequences are dropped, then the unprocessed region is
    /// normalized again since a `\r` at its end may now be followed by more
    /// data.
    pub fn extend(&mut self, data: &[u8]) {
        let before = self.text.len();
        self.filter.feed(data, &mut self.text);
        if self.text.len() == before {
            return;
        }

        let cursor = self.next_line_start;
        let after_newline = cursor > 0 && self.text.as_bytes()[cursor - 1] == b'\n';
        let normalized = normalize_region(&self.text[cursor..], after_newline);
        self.text.truncate(cursor);
        self.text.push_str(&normalized);
    }

    /// Match each unprocessed line against `patterns`.
    ///
    /// On a match everything up to the end of the match is consumed and the
    /// text following the prompt stays buffered. Without a match the cursor
    /// moves past the last complete line.
    pub fn scan(&mut self, patterns: &PatternSet) -> Option<ExpectMatch> {
        if let Some((line_start, found)) = self.find_line_match(patterns) {
            return Some(self.consume(patterns, line_start, found));
        }

        if let Some(pos) = memrchr(b'\n', self.text.as_bytes()) {
            self.next_line_start = self.next_line_start.max(pos + 1);
        }
        None
    }

    fn find_line_match(&self, patterns: &PatternSet) -> Option<(usize, PromptMatch)> {
        let cursor = self.next_line_start;
        let mut line_start = cursor;
        for segment in self.text[cursor..].split('\n') {
            let segment_start = line_start;
            line_start += segment.len() + 1;

            // Nothing follows the last newline yet.
            if segment.is_empty() && segment_start == self.text.len() {
                break;
            }

            let line = segment.strip_suffix('\r').unwrap_or(segment);
            if let Some(found) = patterns.find_match(line) {
                return Some((segment_start, found));
            }
        }
        None
    }

    fn consume(&mut self, patterns: &PatternSet, line_start: usize, found: PromptMatch) -> ExpectMatch {
        let start = line_start + found.start;
        let end = line_start + found.end;

        let mut output = self.text[..start].to_string();
        if found.start == 0 && output.ends_with('\n') {
            output.pop();
        }
        let matched = self.text[start..end].to_string();
        let pattern = patterns
            .get(found.index)
            .map(|p| p.as_str().to_string())
            .unwrap_or_default();

        self.text.drain(..end);
        self.next_line_start = 0;

        ExpectMatch {
            output,
            index: found.index,
            pattern,
            matched,
            start,
            end,
            name: found.name,
        }
    }

    /// Take all buffered text and reset.
    pub fn take_all(&mut self) -> String {
        self.next_line_start = 0;
        std::mem::take(&mut self.text)
    }

    /// Buffered text not yet consumed by a match.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Start of the first unprocessed line.
    pub fn next_line_start(&self) -> usize {
        self.next_line_start
    }

    /// Length of the buffered text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether any text is buffered.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt() -> PatternSet {
        PatternSet::single(r"^PROMPT$").unwrap()
    }

    fn feed(chunks: &[&str], patterns: &PatternSet) -> Option<ExpectMatch> {
        let mut buffer = ReceiveBuffer::new();
        for chunk in chunks {
            buffer.extend(chunk.as_bytes());
            if let Some(m) = buffer.scan(patterns) {
                return Some(m);
            }
        }
        None
    }

    #[test]
    fn test_output_excludes_echo_boundary_newline() {
        let m = feed(&["show date\r\ndata\r\nPROMPT"], &prompt()).unwrap();
        assert_eq!(m.output, "show date\ndata");
        assert_eq!(m.matched, "PROMPT");
        assert_eq!(m.index, 0);
    }

    #[test]
    fn test_split_prompt_matches_like_single_chunk() {
        let whole = feed(&["\ndata\nPROMPT"], &prompt()).unwrap();
        let split = feed(&["\ndata\nPRO", "MPT"], &prompt()).unwrap();
        assert_eq!(split.output, "\ndata");
        assert_eq!(whole.output, split.output);
        assert_eq!(whole.matched, split.matched);
    }

    #[test]
    fn test_split_between_line_feed_and_prompt() {
        let whole = feed(&["data\r\nPROMPT"], &prompt()).unwrap();
        let split = feed(&["data\r", "\nPROMPT"], &prompt()).unwrap();
        assert_eq!(whole.output, "data");
        assert_eq!(split.output, "data");
    }

    #[test]
    fn test_prompt_mid_line_keeps_preceding_text() {
        let patterns = PatternSet::single(r"[Pp]assword: ?$").unwrap();
        let m = feed(&["Enter password: "], &patterns).unwrap();
        assert_eq!(m.output, "Enter ");
        assert_eq!(m.matched, "password: ");
    }

    #[test]
    fn test_cursor_advances_past_complete_lines() {
        let mut buffer = ReceiveBuffer::new();
        buffer.extend(b"line one\nline two\npart");
        assert!(buffer.scan(&prompt()).is_none());
        assert_eq!(buffer.next_line_start(), "line one\nline two\n".len());
        assert_eq!(buffer.as_str(), "line one\nline two\npart");
    }

    #[test]
    fn test_text_after_prompt_stays_buffered() {
        let mut buffer = ReceiveBuffer::new();
        buffer.extend(b"x\nPROMPT\nextra");
        let m = buffer.scan(&prompt()).unwrap();
        assert_eq!(m.output, "x");
        assert_eq!(buffer.as_str(), "\nextra");
        assert_eq!(buffer.take_all(), "\nextra");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_trailing_carriage_return_stripped_for_matching() {
        let m = feed(&["out\nPROMPT\r"], &prompt()).unwrap();
        assert_eq!(m.output, "out");
    }

    #[test]
    fn test_first_pattern_wins_within_a_line() {
        let patterns = PatternSet::new(["^A", "^AB"]).unwrap();
        let m = feed(&["ABC"], &patterns).unwrap();
        assert_eq!(m.index, 0);
        assert_eq!(m.pattern, "^A");
    }

    #[test]
    fn test_escape_codes_do_not_reach_patterns() {
        let m = feed(&["out\r\n\x1b[1mPROMPT\x1b[0m"], &prompt()).unwrap();
        assert_eq!(m.output, "out");
    }
}
