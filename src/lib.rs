pub mod cache;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod history;
pub mod llm;
pub mod markdown;
pub mod models;
pub mod render;
pub mod repl;
pub mod session;
pub mod voice;

use cache::ResponseCache;
use cli::Args;
use config::AppConfig;
use history::{ initialize_history_store, ConversationStore };
use llm::chat::new_client;
use llm::response::ResponseService;
use log::info;
use repl::Repl;
use session::ChatSession;
use std::error::Error;
use std::time::Duration;
use voice::VoiceBridge;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = AppConfig::from_args(&args)?;

    info!("--- Core Configuration ---");
    info!("Chat LLM Type: {}", config.llm.llm_type);
    info!("API URL: {}", config.llm.base_url.as_deref().unwrap_or_default());
    info!("Model: {}", args.model);
    info!("API Key Configured: {}", config.llm.api_key.is_some());
    info!("History Store Type: {}", args.history_type);
    info!("History Window: {}", config.history_window);
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("(built-in)"));
    info!("Reveal Cadence: {:?}", config.reveal_cadence);
    info!("Cache Enabled: {}", args.enable_cache);
    if let Some(ttl) = config.cache_ttl {
        info!("Cache TTL: {:?}", ttl);
        info!("Cache Capacity: {}", config.cache_capacity);
    }
    info!("-------------------------");

    let client = new_client(&config.llm)?;
    let mut responder = ResponseService::new(client, config.system_prompt.clone(), config.history_window);
    if let Some(ttl) = config.cache_ttl {
        responder = responder.with_cache(ResponseCache::new(config.cache_capacity, ttl));
    }

    let store = ConversationStore::new(initialize_history_store(&args)?);
    let session = ChatSession::new(store, responder);
    let voice = VoiceBridge::from_args(&args);

    if let Some(question) = args.ask.as_deref() {
        let mut repl = Repl::new(session, voice, Duration::ZERO, config.toast_timeout);
        let mut out = tokio::io::stdout();
        if !repl.ask(question, &mut out).await? {
            return Err("No answer received".into());
        }
        return Ok(());
    }

    let mut repl = Repl::new(session, voice, config.reveal_cadence, config.toast_timeout);
    repl.run().await?;

    Ok(())
}
