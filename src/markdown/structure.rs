use once_cell::sync::Lazy;
use regex::Regex;
use serde::{ Serialize, Deserialize };

static BOX_DRAWING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[│┌┐└┘├┤┬┴┼─═║╔╗╚╝╠╣╦╩╬]").expect("box drawing")
});
static CHART_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*[\w \t]*\w[\w \t]*[|:→][ \t]*\w[\w \t]*$").expect("chart row")
});
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:(?:\d+|[A-Za-z])[.)]|[-•])[ \t]+\S.*$").expect("list item")
});

/// How a run of plain text should be laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Plain,
    AsciiArt,
    Chart,
    List,
}

impl ContentKind {
    /// Diagrams, charts and lists are printed with their line layout preserved.
    pub fn is_preformatted(&self) -> bool {
        !matches!(self, ContentKind::Plain)
    }
}

pub trait StructureDetector: Send + Sync {
    fn detect(&self, text: &str) -> ContentKind;
}

/// Pattern-based detector. Box-drawing characters win over chart rows, which win over lists.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicDetector;

impl StructureDetector for HeuristicDetector {
    fn detect(&self, text: &str) -> ContentKind {
        if BOX_DRAWING.is_match(text) {
            ContentKind::AsciiArt
        } else if CHART_ROW.is_match(text) {
            ContentKind::Chart
        } else if LIST_ITEM.is_match(text) {
            ContentKind::List
        } else {
            ContentKind::Plain
        }
    }
}
