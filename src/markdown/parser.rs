use once_cell::sync::Lazy;
use regex::Regex;
use serde::{ Serialize, Deserialize };

/// Opening fence with an optional language tag, a required newline, then a non-greedy body.
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```([\w+#.\-]+)?[ \t]*\r?\n((?s:.*?))```").expect("valid fence pattern")
});

pub const DEFAULT_LANGUAGE: &str = "text";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Text,
    Code,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSegment {
    pub kind: SegmentKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl ParsedSegment {
    pub fn text(content: impl Into<String>) -> Self {
        Self { kind: SegmentKind::Text, content: content.into(), language: None }
    }

    pub fn code(content: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Code,
            content: content.into(),
            language: Some(language.into()),
        }
    }

    pub fn is_code(&self) -> bool {
        self.kind == SegmentKind::Code
    }

    /// Language of a code segment, `"text"` when the fence had no tag.
    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }
}

/// Splits a response into alternating text and fenced-code segments.
///
/// Text runs are trimmed and dropped when empty, so blank input yields no segments.
/// An opening fence without a closer is left in the surrounding text.
pub fn parse_markdown(text: &str) -> Vec<ParsedSegment> {
    let mut segments = Vec::new();
    let mut last_index = 0;

    for caps in CODE_FENCE.captures_iter(text) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        push_text(&mut segments, &text[last_index..whole.start()]);

        let language = caps
            .get(1)
            .map(|m| m.as_str())
            .unwrap_or(DEFAULT_LANGUAGE);
        let body = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        segments.push(ParsedSegment::code(body.trim(), language));

        last_index = whole.end();
    }

    push_text(&mut segments, &text[last_index..]);
    segments
}

fn push_text(segments: &mut Vec<ParsedSegment>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        segments.push(ParsedSegment::text(trimmed));
    }
}
