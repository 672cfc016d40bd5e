use serde::Serialize;
use std::fmt;

use crate::event::Rgb;

/// Presentation hints attached to a run of text. Renderers map these onto
/// whatever the target supports; plain-text targets ignore them.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct SpanStyle {
    /// Reduced emphasis, rendered at roughly 70% size on the widget.
    pub secondary: bool,
    /// De-emphasised colour used for times and locations.
    pub muted: bool,
    /// Foreground colour override.
    pub color: Option<Rgb>,
    /// Occupies space but is drawn invisibly.
    pub placeholder: bool,
}

impl SpanStyle {
    pub const PLAIN: Self = Self {
        secondary: false,
        muted: false,
        color: None,
        placeholder: false,
    };

    pub const SECONDARY: Self = Self {
        secondary: true,
        ..Self::PLAIN
    };

    pub const MUTED: Self = Self {
        muted: true,
        ..Self::PLAIN
    };

    pub const PLACEHOLDER: Self = Self {
        placeholder: true,
        ..Self::PLAIN
    };

    pub fn colored(color: Rgb) -> Self {
        Self {
            color: Some(color),
            ..Self::PLAIN
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

/// Text built from styled runs. Adjacent runs with equal style are merged.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StyledText {
    spans: Vec<Span>,
}

impl StyledText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plain(text: impl Into<String>) -> Self {
        let mut out = Self::new();
        out.push(text, SpanStyle::PLAIN);
        out
    }

    pub fn push(&mut self, text: impl Into<String>, style: SpanStyle) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(&text),
            _ => self.spans.push(Span { text, style }),
        }
    }

    pub fn push_str(&mut self, text: &str) {
        self.push(text, SpanStyle::PLAIN);
    }

    pub fn append(&mut self, other: StyledText) {
        for span in other.spans {
            self.push(span.text, span.style);
        }
    }

    /// Marks every run as muted, keeping its other attributes.
    pub fn muted(mut self) -> Self {
        let spans = std::mem::take(&mut self.spans);
        for span in spans {
            let style = SpanStyle {
                muted: true,
                ..span.style
            };
            self.push(span.text, style);
        }
        self
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The visible text. Placeholder runs become blanks of equal length.
    pub fn to_plain(&self) -> String {
        let mut out = String::new();
        for span in &self.spans {
            if span.style.placeholder {
                out.extend(
                    span.text
                        .chars()
                        .map(|c| if c.is_whitespace() { c } else { ' ' }),
                );
            } else {
                out.push_str(&span.text);
            }
        }
        out
    }
}

impl fmt::Display for StyledText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_plain())
    }
}

impl From<&str> for StyledText {
    fn from(text: &str) -> Self {
        Self::plain(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_runs_with_equal_style() {
        let mut text = StyledText::plain("Lunch");
        text.push_str(" with");
        text.push(", Cafe", SpanStyle::MUTED);
        assert_eq!(text.spans().len(), 2);
        assert_eq!(text.spans()[0].text, "Lunch with");
        assert_eq!(text.to_plain(), "Lunch with, Cafe");
    }

    #[test]
    fn muted_keeps_secondary_flag() {
        let mut text = StyledText::new();
        text.push("Today", SpanStyle::SECONDARY);
        text.push_str(" 9:00");
        let muted = text.muted();
        assert!(muted.spans().iter().all(|span| span.style.muted));
        assert!(muted.spans()[0].style.secondary);
        assert!(!muted.spans()[1].style.secondary);
    }

    #[test]
    fn placeholder_renders_as_blank() {
        let mut text = StyledText::new();
        text.push("■\t", SpanStyle::PLACEHOLDER);
        text.push_str("Anna");
        assert_eq!(text.to_plain(), " \tAnna");
    }
}
