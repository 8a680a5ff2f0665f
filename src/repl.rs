use crate::history::title_matches;
use crate::models::chat::{ Conversation, Message, Role };
use crate::render::{ play, RevealTracker, TerminalRenderer };
use crate::session::ChatSession;
use crate::voice::{ VoiceBridge, VoiceError };
use log::{ info, warn };
use std::future::Future;
use std::io;
use std::time::{ Duration, Instant };
use tokio::io::{ AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader };

pub const DEFAULT_TOAST_TIMEOUT: Duration = Duration::from_secs(7);

const HELP: &str = "Commands:
  /new              start a new conversation
  /list             list conversations
  /search <term>    list conversations whose title contains <term>
  /open <n|id>      open a conversation
  /delete <n|id>    delete a conversation
  /rename <title>   rename the open conversation
  /history          show the open conversation
  /listen           dictate a question (Ctrl-C cancels)
  /speak            read the last answer aloud
  /stop             stop reading aloud
  /dismiss          dismiss the current error
  /clear            delete all conversations
  /quit             exit
Anything else is sent as a question.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Empty,
    Help,
    New,
    List,
    Search(String),
    Open(String),
    Delete(String),
    Rename(String),
    History,
    Listen,
    Speak,
    Stop,
    Dismiss,
    Clear,
    Quit,
    Send(String),
    Unknown(String),
}

pub fn parse_command(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }
    let rest = match line.strip_prefix('/') {
        Some(rest) => rest,
        None => return ReplCommand::Send(line.to_string()),
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim().to_string()),
        None => (rest, String::new()),
    };
    match (name.to_lowercase().as_str(), arg.is_empty()) {
        ("help" | "?", _) => ReplCommand::Help,
        ("new", _) => ReplCommand::New,
        ("list" | "ls", _) => ReplCommand::List,
        ("search" | "find", false) => ReplCommand::Search(arg),
        ("open", false) => ReplCommand::Open(arg),
        ("delete" | "rm", false) => ReplCommand::Delete(arg),
        ("rename", false) => ReplCommand::Rename(arg),
        ("history", _) => ReplCommand::History,
        ("listen", _) => ReplCommand::Listen,
        ("speak", _) => ReplCommand::Speak,
        ("stop", _) => ReplCommand::Stop,
        ("dismiss", _) => ReplCommand::Dismiss,
        ("clear", _) => ReplCommand::Clear,
        ("quit" | "exit" | "q", _) => ReplCommand::Quit,
        _ => ReplCommand::Unknown(line.to_string()),
    }
}

/// Error notice that dismisses itself after a fixed timeout.
#[derive(Debug, Clone)]
pub struct Toast {
    message: String,
    raised_at: Instant,
    timeout: Duration,
}

impl Toast {
    pub fn new(message: impl Into<String>, timeout: Duration) -> Self {
        Self { message: message.into(), raised_at: Instant::now(), timeout }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_visible_at(&self, now: Instant) -> bool {
        now.duration_since(self.raised_at) < self.timeout
    }
}

/// Line-oriented front end over a [`ChatSession`].
pub struct Repl {
    session: ChatSession,
    voice: VoiceBridge,
    renderer: TerminalRenderer,
    tracker: RevealTracker,
    cadence: Duration,
    toast_timeout: Duration,
    toast: Option<Toast>,
}

impl Repl {
    pub fn new(session: ChatSession, voice: VoiceBridge, cadence: Duration, toast_timeout: Duration) -> Self {
        let mut tracker = RevealTracker::new();
        for conversation in session.conversations() {
            tracker.settle_all(&conversation.messages);
        }
        Self {
            session,
            voice,
            renderer: TerminalRenderer::default(),
            tracker,
            cadence,
            toast_timeout,
            toast: None,
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub async fn run(&mut self) -> io::Result<()> {
        let mut out = tokio::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        out.write_all(b"AiTutor, your coding and academic tutor. Type /help for commands.\n").await?;
        if !self.session.is_configured() {
            self.raise(&mut out, "API key is not configured. Questions will fail until OPENROUTER_API_KEY is set.").await?;
        }
        if let Some(conversation) = self.session.current().cloned() {
            write_line(&mut out, &format!("Resuming \"{}\"", conversation.title)).await?;
        }

        loop {
            self.expire_toast(Instant::now());
            let prompt = if self.toast.is_some() { "! > " } else { "> " };
            out.write_all(prompt.as_bytes()).await?;
            out.flush().await?;

            let line = tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => line,
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => break,
            };
            if !self.handle_line(&line, &mut out).await? {
                break;
            }
        }
        self.voice.stop_speaking();
        info!("Session closed");
        Ok(())
    }

    /// One-shot mode: prints the answer, or the error, and reports success.
    pub async fn ask<W>(&mut self, question: &str, out: &mut W) -> io::Result<bool>
        where W: AsyncWrite + Unpin
    {
        self.send(question, out).await
    }

    /// Handles one input line. Returns false when the user quits.
    pub async fn handle_line<W>(&mut self, line: &str, out: &mut W) -> io::Result<bool>
        where W: AsyncWrite + Unpin
    {
        match parse_command(line) {
            ReplCommand::Empty => {}
            ReplCommand::Help => write_line(out, HELP).await?,
            ReplCommand::New => {
                self.session.new_conversation();
                write_line(out, "Started a new conversation.").await?;
            }
            ReplCommand::List => self.list(out).await?,
            ReplCommand::Search(term) => self.search(&term, out).await?,
            ReplCommand::Open(target) => match self.resolve(&target) {
                Some(id) => {
                    self.session.select(&id);
                    self.show_history(out).await?;
                }
                None => self.raise(out, &format!("No conversation matches '{}'", target)).await?,
            },
            ReplCommand::Delete(target) => match self.resolve(&target) {
                Some(id) => {
                    self.session.delete(&id);
                    write_line(out, "Conversation deleted.").await?;
                }
                None => self.raise(out, &format!("No conversation matches '{}'", target)).await?,
            },
            ReplCommand::Rename(title) => {
                if self.session.rename_current(&title) {
                    write_line(out, &format!("Renamed to \"{}\"", title)).await?;
                } else {
                    self.raise(out, "No conversation is open").await?;
                }
            }
            ReplCommand::History => self.show_history(out).await?,
            ReplCommand::Listen => self.listen(out, ctrl_c()).await?,
            ReplCommand::Speak => self.speak(out).await?,
            ReplCommand::Stop => {
                self.voice.stop_speaking();
                self.voice.stop_listening();
            }
            ReplCommand::Dismiss => self.toast = None,
            ReplCommand::Clear => {
                self.session.clear_all();
                write_line(out, "All conversations deleted.").await?;
            }
            ReplCommand::Quit => return Ok(false),
            ReplCommand::Send(text) => {
                self.send(&text, out).await?;
            }
            ReplCommand::Unknown(line) => {
                self.raise(out, &format!("Unknown command '{}'. Type /help for commands.", line)).await?
            }
        }
        Ok(true)
    }

    async fn send<W>(&mut self, text: &str, out: &mut W) -> io::Result<bool>
        where W: AsyncWrite + Unpin
    {
        self.toast = None;
        match self.session.send_message(text).await {
            Ok(reply) => {
                self.print_message(out, &reply).await?;
                Ok(true)
            }
            Err(e) => {
                self.raise(out, &e.to_string()).await?;
                Ok(false)
            }
        }
    }

    /// Dictation ends with a transcript, an error, or `cancel` resolving first.
    async fn listen<W, C>(&mut self, out: &mut W, cancel: C) -> io::Result<()>
        where W: AsyncWrite + Unpin, C: Future<Output = ()>
    {
        write_line(out, "Listening...").await?;
        let result = tokio::select! {
            result = self.voice.listen() => result,
            _ = cancel => {
                self.voice.stop_listening();
                Err(VoiceError::Cancelled)
            }
        };
        match result {
            Ok(transcript) => {
                write_line(out, &format!("You said: {}", transcript)).await?;
                self.send(&transcript, out).await?;
            }
            Err(e) => self.raise(out, &e.to_string()).await?,
        }
        Ok(())
    }

    async fn speak<W>(&mut self, out: &mut W) -> io::Result<()>
        where W: AsyncWrite + Unpin
    {
        let text = match self.session.current().and_then(Conversation::last_assistant_message) {
            Some(message) => message.content.clone(),
            None => return self.raise(out, "Nothing to read aloud yet").await,
        };
        if let Err(e) = self.voice.speak(&text).await {
            warn!("Read-aloud failed: {}", e);
            self.raise(out, &e.to_string()).await?;
        }
        Ok(())
    }

    async fn list<W>(&self, out: &mut W) -> io::Result<()>
        where W: AsyncWrite + Unpin
    {
        let conversations = self.session.conversations();
        if conversations.is_empty() {
            return write_line(out, "No conversations yet.").await;
        }
        for (i, conversation) in conversations.iter().enumerate() {
            self.write_entry(out, i + 1, conversation).await?;
        }
        Ok(())
    }

    /// Matches keep their `/list` positions so `/open <n>` works on them.
    async fn search<W>(&self, term: &str, out: &mut W) -> io::Result<()>
        where W: AsyncWrite + Unpin
    {
        let matches: Vec<(usize, &Conversation)> = self.session
            .conversations()
            .iter()
            .enumerate()
            .filter(|(_, conversation)| title_matches(conversation, term))
            .collect();
        if matches.is_empty() {
            return write_line(out, "No matching conversations").await;
        }
        for (i, conversation) in matches {
            self.write_entry(out, i + 1, conversation).await?;
        }
        Ok(())
    }

    async fn write_entry<W>(&self, out: &mut W, position: usize, conversation: &Conversation) -> io::Result<()>
        where W: AsyncWrite + Unpin
    {
        let current = self.session.current().map(|c| c.id.as_str());
        let marker = if Some(conversation.id.as_str()) == current { "*" } else { " " };
        let short_id: String = conversation.id.chars().take(8).collect();
        let line = format!(
            "{} {:>2}. {} ({} messages) [{}]",
            marker,
            position,
            conversation.title,
            conversation.messages.len(),
            short_id
        );
        write_line(out, &line).await
    }

    async fn show_history<W>(&mut self, out: &mut W) -> io::Result<()>
        where W: AsyncWrite + Unpin
    {
        let messages = match self.session.current() {
            Some(conversation) => conversation.messages.clone(),
            None => return write_line(out, "No conversation is open.").await,
        };
        for message in &messages {
            self.print_message(out, message).await?;
        }
        Ok(())
    }

    async fn print_message<W>(&mut self, out: &mut W, message: &Message) -> io::Result<()>
        where W: AsyncWrite + Unpin
    {
        if message.role == Role::User {
            return write_line(out, &format!("You: {}", message.content)).await;
        }
        let header = match message.model_type {
            Some(model_type) => format!("AiTutor [{}]:", model_type),
            None => "AiTutor:".to_string(),
        };
        write_line(out, &header).await?;
        let mut reveal = self.tracker.begin(&message.id, self.renderer.render(&message.content));
        play(&mut reveal, out, self.cadence).await?;
        self.tracker.finish(&reveal);
        out.write_all(b"\n\n").await?;
        out.flush().await
    }

    async fn raise<W>(&mut self, out: &mut W, message: &str) -> io::Result<()>
        where W: AsyncWrite + Unpin
    {
        let toast = Toast::new(message, self.toast_timeout);
        write_line(out, &format!("Error: {}", toast.message())).await?;
        self.toast = Some(toast);
        Ok(())
    }

    fn expire_toast(&mut self, now: Instant) {
        if self.toast.as_ref().map_or(false, |t| !t.is_visible_at(now)) {
            self.toast = None;
        }
    }

    /// Accepts a 1-based list position or an id prefix.
    fn resolve(&self, target: &str) -> Option<String> {
        let conversations = self.session.conversations();
        if let Ok(n) = target.parse::<usize>() {
            return n.checked_sub(1).and_then(|i| conversations.get(i)).map(|c| c.id.clone());
        }
        conversations.iter().find(|c| c.id.starts_with(target)).map(|c| c.id.clone())
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn write_line<W>(out: &mut W, line: &str) -> io::Result<()>
    where W: AsyncWrite + Unpin
{
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{ ConversationStore, MemoryHistoryStore };
    use crate::llm::response::tests::FakeChatClient;
    use crate::llm::response::ResponseService;
    use crate::llm::ChatError;
    use crate::voice::{ SpeechRecognizer, Unsupported };
    use std::sync::Arc;

    fn repl(replies: Vec<Result<String, ChatError>>) -> Repl {
        repl_with(ConversationStore::new(Arc::new(MemoryHistoryStore::default())), VoiceBridge::default(), replies)
    }

    fn repl_with(store: ConversationStore, voice: VoiceBridge, replies: Vec<Result<String, ChatError>>) -> Repl {
        let responder = ResponseService::new(FakeChatClient::new(replies), "sys", 10);
        Repl::new(ChatSession::new(store, responder), voice, Duration::ZERO, DEFAULT_TOAST_TIMEOUT)
    }

    /// Recognizer that never hears anything.
    struct SilentRecognizer;

    #[async_trait::async_trait]
    impl SpeechRecognizer for SilentRecognizer {
        fn is_supported(&self) -> bool {
            true
        }

        async fn listen(&self) -> Result<String, VoiceError> {
            std::future::pending().await
        }

        fn stop(&self) {}
    }

    async fn run_line(repl: &mut Repl, line: &str) -> (bool, String) {
        let mut out = Vec::new();
        let keep_going = repl.handle_line(line, &mut out).await.unwrap();
        (keep_going, String::from_utf8(out).unwrap())
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("   "), ReplCommand::Empty);
        assert_eq!(parse_command("what is rust?"), ReplCommand::Send("what is rust?".into()));
        assert_eq!(parse_command("/open 2"), ReplCommand::Open("2".into()));
        assert_eq!(parse_command("/search rust"), ReplCommand::Search("rust".into()));
        assert_eq!(parse_command("/search"), ReplCommand::Unknown("/search".into()));
        assert_eq!(parse_command("/rename  Biology notes "), ReplCommand::Rename("Biology notes".into()));
        assert_eq!(parse_command("/QUIT"), ReplCommand::Quit);
        assert_eq!(parse_command("/open"), ReplCommand::Unknown("/open".into()));
        assert_eq!(parse_command("/frobnicate"), ReplCommand::Unknown("/frobnicate".into()));
    }

    #[test]
    fn toast_expires() {
        let toast = Toast::new("boom", Duration::from_secs(7));
        let now = Instant::now();
        assert!(toast.is_visible_at(now));
        assert!(!toast.is_visible_at(now + Duration::from_secs(8)));
    }

    #[tokio::test]
    async fn question_prints_badge_and_code_frame() {
        let mut repl = repl(vec![Ok("Like this:\n```css\n.box { display: flex; }\n```".into())]);
        let (keep_going, output) = run_line(&mut repl, "how do I center a div in css").await;
        assert!(keep_going);
        assert!(output.starts_with("AiTutor [coding]:\n"));
        assert!(output.contains("┌─ CSS\n│ .box { display: flex; }\n└─"));
        assert!(repl.toast().is_none());
    }

    #[tokio::test]
    async fn failure_raises_toast_and_keeps_going() {
        let mut repl = repl(vec![Err(ChatError::RateLimited)]);
        let (keep_going, output) = run_line(&mut repl, "hello").await;
        assert!(keep_going);
        assert_eq!(output, format!("Error: {}\n", ChatError::RateLimited));
        assert_eq!(repl.toast().unwrap().message(), ChatError::RateLimited.to_string());
        run_line(&mut repl, "/dismiss").await;
        assert!(repl.toast().is_none());
        assert!(!repl.session().is_loading());
    }

    #[tokio::test]
    async fn list_open_and_delete_by_position() {
        let mut repl = repl(vec![Ok("a".into()), Ok("b".into())]);
        run_line(&mut repl, "first question").await;
        run_line(&mut repl, "/new").await;
        run_line(&mut repl, "second question").await;

        let (_, listing) = run_line(&mut repl, "/list").await;
        assert!(listing.contains(" 1. second question (2 messages)"));
        assert!(listing.contains(" 2. first question (2 messages)"));

        let (_, history) = run_line(&mut repl, "/open 2").await;
        assert!(history.starts_with("You: first question\nAiTutor [academic]:\na\n"));

        run_line(&mut repl, "/delete 1").await;
        assert_eq!(repl.session().conversations().len(), 1);
        let (_, output) = run_line(&mut repl, "/open 9").await;
        assert!(output.starts_with("Error: No conversation matches '9'"));
    }

    #[tokio::test]
    async fn speak_without_engine_reports_unsupported() {
        let mut repl = repl(vec![Ok("answer".into())]);
        run_line(&mut repl, "what is dna").await;
        let (_, output) = run_line(&mut repl, "/speak").await;
        assert_eq!(output, "Error: Speech synthesis not supported\n");
    }

    #[tokio::test]
    async fn quit_stops_the_loop() {
        let mut repl = repl(vec![]);
        let (keep_going, _) = run_line(&mut repl, "/quit").await;
        assert!(!keep_going);
    }

    #[tokio::test]
    async fn search_filters_titles() {
        let mut repl = repl(vec![Ok("a".into()), Ok("b".into())]);
        run_line(&mut repl, "Explain Rust lifetimes").await;
        run_line(&mut repl, "/new").await;
        run_line(&mut repl, "What is photosynthesis").await;

        let (_, output) = run_line(&mut repl, "/search RUST").await;
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains(" 2. Explain Rust lifetimes (2 messages)"));

        let (_, output) = run_line(&mut repl, "/search calculus").await;
        assert_eq!(output, "No matching conversations\n");
    }

    #[tokio::test]
    async fn list_shortens_non_ascii_ids() {
        let mut conversation = ConversationStore::create("Accents");
        conversation.id = "abcdefgé-1".to_string();
        let store = ConversationStore::new(Arc::new(MemoryHistoryStore::default()));
        store.save_all(&[conversation]);

        let mut repl = repl_with(store, VoiceBridge::default(), vec![]);
        let (_, output) = run_line(&mut repl, "/list").await;
        assert!(output.contains("Accents (0 messages) [abcdefgé]"));
    }

    #[tokio::test]
    async fn dictation_can_be_cancelled() {
        let voice = VoiceBridge::new(Arc::new(SilentRecognizer), Arc::new(Unsupported));
        let mut repl = repl_with(ConversationStore::new(Arc::new(MemoryHistoryStore::default())), voice, vec![]);
        let mut out = Vec::new();
        repl.listen(&mut out, async {}).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Listening...\nError: Voice input cancelled\n");
        assert!(repl.session().conversations().is_empty());
    }
}
