//! Pattern matching utilities for prompt detection.

use regex::Regex;

/// An ordered list of prompt patterns.
///
/// Patterns are tried in declaration order against a single line and the
/// first one that matches wins, regardless of how specific later patterns
/// are. Callers recover which prompt was seen from the returned index.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

/// A successful match of one pattern against one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMatch {
    /// Index of the matching pattern within the set.
    pub index: usize,

    /// Byte offset of the match start within the line.
    pub start: usize,

    /// Byte offset of the match end within the line.
    pub end: usize,

    /// Value of the `name` capture group, if the pattern has one.
    pub name: Option<String>,
}

impl PatternSet {
    /// Compile a list of pattern strings.
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Create a set holding one pattern.
    pub fn single(pattern: &str) -> Result<Self, regex::Error> {
        Self::new([pattern])
    }

    /// Append an already compiled pattern.
    pub fn push(&mut self, pattern: Regex) {
        self.patterns.push(pattern);
    }

    /// Concatenate two sets, keeping `self`'s patterns first.
    pub fn chain(&self, other: &PatternSet) -> PatternSet {
        let mut patterns = self.patterns.clone();
        patterns.extend(other.patterns.iter().cloned());
        Self { patterns }
    }

    /// Get a pattern by index.
    pub fn get(&self, index: usize) -> Option<&Regex> {
        self.patterns.get(index)
    }

    /// Iterate over the compiled patterns.
    pub fn iter(&self) -> impl Iterator<Item = &Regex> {
        self.patterns.iter()
    }

    /// Pattern sources, for error messages and logging.
    pub fn sources(&self) -> Vec<String> {
        self.patterns.iter().map(|p| p.as_str().to_string()).collect()
    }

    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the set has no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Find the first pattern matching `line`.
    pub fn find_match(&self, line: &str) -> Option<PromptMatch> {
        self.patterns.iter().enumerate().find_map(|(index, pattern)| {
            let caps = pattern.captures(line)?;
            let whole = caps.get(0)?;
            Some(PromptMatch {
                index,
                start: whole.start(),
                end: whole.end(),
                name: caps.name("name").map(|m| m.as_str().to_string()),
            })
        })
    }
}

impl From<Regex> for PatternSet {
    fn from(pattern: Regex) -> Self {
        Self {
            patterns: vec![pattern],
        }
    }
}

impl From<Vec<Regex>> for PatternSet {
    fn from(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_pattern_wins() {
        let set = PatternSet::new(["^A", "^AB"]).unwrap();
        let m = set.find_match("ABC").unwrap();
        assert_eq!(m.index, 0);
        assert_eq!((m.start, m.end), (0, 1));
    }

    #[test]
    fn test_later_pattern_when_first_misses() {
        let set = PatternSet::new([r"#\s*$", r">\s*$"]).unwrap();
        let m = set.find_match("router> ").unwrap();
        assert_eq!(m.index, 1);
    }

    #[test]
    fn test_no_match() {
        let set = PatternSet::new([r"^\S+#\s*$"]).unwrap();
        assert!(set.find_match("show running-config").is_none());
        assert!(set.find_match("").is_none());
    }

    #[test]
    fn test_name_capture() {
        let set = PatternSet::single(r"^(?P<name>[\w.\-]+)\(config\)#\s*$").unwrap();
        let m = set.find_match("core-sw1(config)#").unwrap();
        assert_eq!(m.name.as_deref(), Some("core-sw1"));
    }

    #[test]
    fn test_chain_keeps_order() {
        let a = PatternSet::single("a").unwrap();
        let b = PatternSet::new(["b", "c"]).unwrap();
        assert_eq!(a.chain(&b).sources(), vec!["a", "b", "c"]);
    }
}
