use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, WidgetError};

/// Title patterns recognised as birthdays. The first capture group is the
/// name shown on the widget.
pub const DEFAULT_BIRTHDAY_PATTERNS: &[&str] = &[
    r"^(.+?)'s [Bb]irthday$",
    r"^(.+?) [Bb]irthday$",
    r"^[Bb]irthday:?\s+(.+)$",
    r"^(.+?) hat Geburtstag$",
    r"^[Gg]eburtstag:?\s+(.+)$",
    r"^(.+?)s Geburtstag$",
];

static BUILTIN: Lazy<BirthdayMatcher> = Lazy::new(|| {
    let patterns = DEFAULT_BIRTHDAY_PATTERNS
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(err) => {
                tracing::error!(%pattern, %err, "built-in birthday pattern failed to compile");
                None
            }
        })
        .collect::<Vec<_>>();
    BirthdayMatcher {
        patterns: patterns.into(),
    }
});

/// Compiled birthday detection patterns, cheap to clone and share.
#[derive(Debug, Clone)]
pub struct BirthdayMatcher {
    patterns: Arc<[Regex]>,
}

impl BirthdayMatcher {
    /// Process-wide matcher for the built-in patterns, compiled on first use.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let compiled = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map_err(|source| WidgetError::InvalidBirthdayPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            patterns: compiled.into(),
        })
    }

    /// Uses the custom patterns when given, otherwise the shared built-ins.
    pub fn from_patterns(patterns: Option<&[String]>) -> Result<Self> {
        match patterns {
            Some(patterns) => Self::compile(patterns),
            None => Ok(Self::builtin()),
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns the display name when `title` looks like a birthday. Patterns
    /// without a capture group yield the matched text.
    pub fn match_title(&self, title: &str) -> Option<String> {
        self.patterns.iter().find_map(|pattern| {
            let captures = pattern.captures(title)?;
            let name = captures
                .get(1)
                .or_else(|| captures.get(0))
                .map(|m| m.as_str().trim().to_string())?;
            Some(name)
        })
    }
}

impl Default for BirthdayMatcher {
    fn default() -> Self {
        Self::builtin()
    }
}
