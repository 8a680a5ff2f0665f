use crate::models::chat::ModelType;
use once_cell::sync::Lazy;
use regex::RegexSet;

static CODING_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"\bcode\b",
        r"\bfunction\b",
        r"\bclass\b",
        r"\bmethod\b",
        r"\balgorithm\b",
        r"\bprogram\b",
        r"\bdebug\b",
        r"\berror\b.*\bcode\b",
        r"\bhow to (write|create|build|implement)",
        r"\b(javascript|python|java|typescript|html|css|react|vue|angular)\b",
        r"\b(npm|git|github|docker|api)\b",
    ]).expect("valid coding patterns")
});

const CODING_KEYWORDS: &[&str] = &[
    "code", "function", "class", "variable", "javascript", "typescript", "python", "java",
    "html", "css", "react", "component", "api", "debug", "error", "syntax", "algorithm",
    "array", "object", "loop", "if", "else", "return", "import", "export", "const", "let",
    "var", "async", "await", "promise", "callback", "method", "property", "constructor",
    "interface", "type", "enum", "generic", "compile", "runtime", "bug", "fix", "refactor",
    "optimize", "program", "script", "library", "framework", "package", "module", "npm",
    "git", "github", "repository", "commit", "branch", "merge", "pull request", "database",
    "sql", "query", "backend", "frontend", "fullstack", "web", "app", "application", "write",
    "build", "create", "develop", "implement", "programming", "coding", "software", "dev",
    "node", "express", "angular", "vue", "django", "flask", "spring", "php", "ruby", "go",
    "rust", "c++", "c#", "swift", "kotlin", "android", "ios", "mobile", "docker", "kubernetes",
];

/// Labels a question for the reply badge. Pure and deterministic.
///
/// Patterns are checked first, then the keyword list by plain substring, so short keywords
/// such as `go` or `if` also fire inside longer words.
pub fn classify(question: &str) -> ModelType {
    let lower = question.to_lowercase();
    if CODING_PATTERNS.is_match(&lower) || CODING_KEYWORDS.iter().any(|k| lower.contains(k)) {
        ModelType::Coding
    } else {
        ModelType::Academic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coding_questions() {
        assert_eq!(classify("write a function to reverse a string"), ModelType::Coding);
        assert_eq!(classify("how do I center a div in css"), ModelType::Coding);
        assert_eq!(classify("Why does my Docker container exit?"), ModelType::Coding);
        assert_eq!(classify("What does this ERROR CODE mean"), ModelType::Coding);
    }

    #[test]
    fn academic_questions() {
        assert_eq!(classify("explain the causes of World War 1"), ModelType::Academic);
        assert_eq!(classify("what is photosynthesis"), ModelType::Academic);
        assert_eq!(classify(""), ModelType::Academic);
    }

    #[test]
    fn keyword_substrings_count() {
        // "algorithms" misses the word-boundary pattern but hits the keyword list.
        assert_eq!(classify("compare sorting algorithms"), ModelType::Coding);
        assert_eq!(classify("c# or kotlin?"), ModelType::Coding);
    }

    #[test]
    fn deterministic() {
        let q = "Summarize the French Revolution";
        assert_eq!(classify(q), classify(q));
    }
}
