use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Terminal AI tutor for coding and academic questions", long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// Type of chat-completions provider (openrouter, openai)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "openrouter")]
    pub chat_llm_type: String,

    /// Full chat-completions endpoint URL. Defaults to the provider's public endpoint.
    #[arg(long, env = "OPENROUTER_API_URL")]
    pub api_url: Option<String>,

    /// API key sent as a bearer credential. Sends fail with a configuration error when unset.
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model identifier (e.g., qwen/qwen3-coder:free, gpt-4o)
    #[arg(long, env = "OPENROUTER_MODEL", default_value = "qwen/qwen3-coder:free")]
    pub model: String,

    /// Application name sent in the X-Title header.
    #[arg(long, env = "APP_NAME", default_value = "AiTutor")]
    pub app_name: String,

    /// Application URL sent in the HTTP-Referer header.
    #[arg(long, env = "APP_URL", default_value = "https://aitutor.app")]
    pub app_url: String,

    /// Number of prior messages sent with each question.
    #[arg(long, env = "HISTORY_WINDOW", default_value = "10")]
    pub history_window: usize,

    /// Path to a JSON file overriding the system prompt ({"system_prompt": "..."}).
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    // --- History Store Args ---
    /// Conversation store type (file, memory)
    #[arg(long, env = "HISTORY_TYPE", default_value = "file")]
    pub history_type: String,

    /// Directory for the conversation file. Defaults to the user data directory.
    #[arg(long, env = "HISTORY_PATH")]
    pub history_path: Option<String>,

    // --- Rendering Args ---
    /// Milliseconds between revealed characters when typing out a reply. 0 prints at once.
    #[arg(long, env = "REVEAL_CADENCE_MS", default_value = "10")]
    pub reveal_cadence_ms: u64,

    /// Seconds an error notice stays active before it is dismissed automatically.
    #[arg(long, env = "TOAST_TIMEOUT_SECS", default_value = "7")]
    pub toast_timeout_secs: u64,

    // --- Voice Args ---
    /// Text-to-speech command. `{rate}`, `{pitch}` and `{volume}` are substituted; the text is appended.
    #[arg(long, env = "SPEECH_COMMAND")]
    pub speech_command: Option<String>,

    /// Dictation command printing one transcript on stdout. `{locale}` is substituted.
    #[arg(long, env = "LISTEN_COMMAND")]
    pub listen_command: Option<String>,

    // --- Caching Args ---
    /// Cache answers to identical requests in memory.
    #[arg(long, env = "ENABLE_CACHE", default_value = "false")]
    pub enable_cache: bool,

    /// Time-to-live in seconds for cached answers.
    #[arg(long, env = "CACHE_TTL_SECS", default_value = "300")]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached answers.
    #[arg(long, env = "CACHE_CAPACITY", default_value = "100")]
    pub cache_capacity: u64,

    // --- General App Args ---
    /// Ask a single question, print the answer and exit.
    #[arg(long)]
    pub ask: Option<String>,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}
