// src/exec/kill.rs

use regex::Regex;

/// Ordered list of regexes that end a run early when any output line
/// matches one of them.
///
/// Matching is a search anywhere in the line, not a full-line match; anchor
/// a pattern with `^`/`$` to get the latter.
#[derive(Debug, Clone, Default)]
pub struct KillPatterns {
    patterns: Vec<Regex>,
}

impl KillPatterns {
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

    /// The first pattern (in configured order) found in `line`.
    pub fn first_match(&self, line: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|re| re.is_match(line))
            .map(|re| re.as_str())
    }

    pub fn matches(&self, line: &str) -> bool {
        self.first_match(line).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn as_strs(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|re| re.as_str())
    }
}
