use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are AiTutor, a professional AI coding tutor and academic assistant. You provide expert-level guidance with clean, production-ready code examples and well-structured responses.

ABSOLUTE FORMATTING RULES - FOLLOW STRICTLY:
- NEVER use **bold** text - use normal text only
- NEVER use *italics* - use normal text only
- NEVER use `code` backticks outside of fenced code blocks
- NEVER use # headers - use normal text only
- NEVER use --- or === separators - use normal text only
- NEVER use || separators or \\ backslashes
- NEVER use tables or complex structures - use simple text only
- ONLY use simple bullet points (-) and numbered lists (1.)
- Keep responses clean, simple, and conversational

For CODING questions:
- Start with a brief introduction (1-2 sentences)
- IMMEDIATELY provide complete code in a fenced code block tagged with its language
- Follow with simple explanations and practical tips in plain text
- Structure: Intro, Code, Explanation, Tips

For ACADEMIC questions:
- Provide clear, conversational explanations in plain text
- Use simple bullet points (-) or numbered lists (1.) only
- Focus on practical understanding
- Structure: Intro, Key points, Examples, Summary

Always maintain a professional but conversational tone.";

#[derive(Debug)]
pub enum PromptError {
    EmptyPrompt(String),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::EmptyPrompt(path) => write!(f, "Prompt file '{}' has an empty system_prompt", path),
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
            PromptError::JsonError(e) => write!(f, "Prompt JSON parsing error: {}", e),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            PromptError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        PromptError::JsonError(err)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PromptConfig {
    pub system_prompt: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self { system_prompt: DEFAULT_SYSTEM_PROMPT.to_string() }
    }
}

pub fn load_prompts(path: &str) -> Result<PromptConfig, PromptError> {
    let file_content = fs::read_to_string(path)?;
    let config: PromptConfig = serde_json::from_str(&file_content)?;
    if config.system_prompt.trim().is_empty() {
        return Err(PromptError::EmptyPrompt(path.to_string()));
    }
    Ok(config)
}
