pub mod typing;

pub use typing::{ play, RevealPhase, RevealTracker, TypedReveal, DEFAULT_REVEAL_CADENCE };

use crate::markdown::{ parse_markdown, HeuristicDetector, ParsedSegment, StructureDetector };
use once_cell::sync::Lazy;
use regex::Regex;

static SECTION_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("section break"));

/// Lays out a cleaned reply for the terminal: prose as-is, structured text indented,
/// code blocks in a frame labelled with their language.
pub struct TerminalRenderer {
    detector: Box<dyn StructureDetector>,
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(Box::new(HeuristicDetector))
    }
}

impl TerminalRenderer {
    pub fn new(detector: Box<dyn StructureDetector>) -> Self {
        Self { detector }
    }

    pub fn render(&self, content: &str) -> String {
        parse_markdown(content)
            .iter()
            .map(|segment| self.render_segment(segment))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn render_segment(&self, segment: &ParsedSegment) -> String {
        if segment.is_code() {
            return render_code(&segment.content, segment.language());
        }
        SECTION_BREAK.split(&segment.content)
            .map(|section| section.trim_start_matches(['\r', '\n']).trim_end())
            .filter(|section| !section.trim().is_empty())
            .map(|section| self.render_section(section))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Each blank-line separated section is classified on its own.
    fn render_section(&self, section: &str) -> String {
        if self.detector.detect(section).is_preformatted() {
            indent(section, "  ")
        } else {
            section.to_string()
        }
    }
}

fn render_code(code: &str, language: &str) -> String {
    let mut out = format!("┌─ {}\n", language.to_uppercase());
    for line in code.lines() {
        out.push_str("│ ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("└─");
    out
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_block_is_framed() {
        let rendered = TerminalRenderer::default().render("Try this:\n```rust\nfn main() {\n    run();\n}\n```");
        assert_eq!(
            rendered,
            "Try this:\n\n┌─ RUST\n│ fn main() {\n│     run();\n│ }\n└─"
        );
    }

    #[test]
    fn lists_are_indented_and_prose_is_not() {
        let rendered = TerminalRenderer::default().render("Photosynthesis makes sugar.");
        assert_eq!(rendered, "Photosynthesis makes sugar.");
        let rendered = TerminalRenderer::default().render("1. Light\n2. Dark");
        assert_eq!(rendered, "  1. Light\n  2. Dark");
    }

    #[test]
    fn only_the_list_section_is_indented() {
        let rendered = TerminalRenderer::default().render(
            "Photosynthesis makes sugar in plants.\n\nKey points\n1. Light reactions\n2. Calvin cycle\n\nIn short, plants store sunlight."
        );
        assert_eq!(
            rendered,
            "Photosynthesis makes sugar in plants.\n\n  Key points\n  1. Light reactions\n  2. Calvin cycle\n\nIn short, plants store sunlight."
        );
    }

    #[test]
    fn empty_reply_renders_empty() {
        assert_eq!(TerminalRenderer::default().render(""), "");
    }
}
