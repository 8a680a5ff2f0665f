pub mod clean;
pub mod parser;
pub mod structure;

pub use clean::{ clean_markdown, extract_code_blocks };
pub use parser::{ parse_markdown, ParsedSegment, SegmentKind };
pub use structure::{ ContentKind, HeuristicDetector, StructureDetector };
