use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("fence"));
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").expect("italic"));
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]*)`").expect("inline code"));
static HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[^\S\n]*#{1,6}[^\S\n]*").expect("header"));
static RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[^\S\n]*(?:-{3,}|={3,}|_{3,})[^\S\n]*$").expect("rule")
});
static BULLET_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*[ \t]*").expect("bullet"));
static STRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[#*\\|`]").expect("stray"));

const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

/// Returns every fenced block, markers included, exactly as it appears in `text`.
pub fn extract_code_blocks(text: &str) -> Vec<&str> {
    FENCED_BLOCK.find_iter(text).map(|m| m.as_str()).collect()
}

/// Strips markdown decoration from model output, leaving fenced code blocks byte-for-byte intact.
///
/// Bold, italic, inline code, headers, rules, pipes and backslashes are removed, `*` bullets
/// become `- `, every line is trimmed and runs of blank lines collapse to a single one.
/// Running it on its own output changes nothing.
pub fn clean_markdown(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let blocks = extract_code_blocks(text);
    let mut index = 0;
    let remainder = FENCED_BLOCK.replace_all(text, |_caps: &regex::Captures<'_>| {
        let token = placeholder(index);
        index += 1;
        token
    });

    let mut cleaned = remainder.replace("\r\n", "\n");
    loop {
        let next = strip_symbols(&cleaned);
        if next == cleaned {
            break;
        }
        cleaned = next;
    }
    let mut cleaned = normalize_whitespace(&cleaned);

    for (i, block) in blocks.iter().enumerate() {
        cleaned = cleaned.replacen(&placeholder(i), block, 1);
    }
    cleaned
}

fn placeholder(index: usize) -> String {
    format!("{}{}{}", PLACEHOLDER_OPEN, index, PLACEHOLDER_CLOSE)
}

fn strip_symbols(text: &str) -> String {
    let text = BOLD.replace_all(text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = HEADER.replace_all(&text, "");
    let text = RULE.replace_all(&text, "");
    let text = text.replace("||", "").replace('\\', "");
    let text = BULLET_STAR.replace_all(&text, "- ");
    STRAY.replace_all(&text, "").into_owned()
}

fn normalize_whitespace(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        lines.push(line);
    }
    lines.join("\n").trim().to_string()
}
