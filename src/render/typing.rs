use crate::models::chat::Message;
use std::collections::HashSet;
use std::time::Duration;
use tokio::io::{ AsyncWrite, AsyncWriteExt };

pub const DEFAULT_REVEAL_CADENCE: Duration = Duration::from_millis(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealPhase {
    Pending,
    Typing,
    Settled,
}

/// Character-by-character reveal of one message.
#[derive(Clone, Debug)]
pub struct TypedReveal {
    message_id: String,
    content: String,
    shown: usize,
    phase: RevealPhase,
}

impl TypedReveal {
    pub fn pending(message_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            content: content.into(),
            shown: 0,
            phase: RevealPhase::Pending,
        }
    }

    pub fn settled(message_id: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            message_id: message_id.into(),
            shown: content.len(),
            content,
            phase: RevealPhase::Settled,
        }
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn visible(&self) -> &str {
        &self.content[..self.shown]
    }

    /// Reveals the next character. Returns `None` once everything is shown.
    pub fn tick(&mut self) -> Option<char> {
        if self.phase == RevealPhase::Settled {
            return None;
        }
        self.phase = RevealPhase::Typing;
        match self.content[self.shown..].chars().next() {
            Some(c) => {
                self.shown += c.len_utf8();
                Some(c)
            }
            None => {
                self.phase = RevealPhase::Settled;
                None
            }
        }
    }

    /// Shows the remaining content at once.
    pub fn finish(&mut self) -> &str {
        let rest = self.shown;
        self.shown = self.content.len();
        self.phase = RevealPhase::Settled;
        &self.content[rest..]
    }

    /// Abandons an in-progress reveal when the message identity changes.
    /// Returns true if the reveal restarted.
    pub fn retarget(&mut self, message_id: &str, content: &str) -> bool {
        if self.message_id == message_id && self.content == content {
            return false;
        }
        *self = TypedReveal::pending(message_id, content);
        true
    }
}

/// Remembers which messages were already typed out, so a revisit shows them in full.
///
/// An interrupted reveal is kept as the active one: beginning the same message again
/// resumes it, beginning another message restarts it.
#[derive(Debug, Default)]
pub struct RevealTracker {
    settled: HashSet<String>,
    active: Option<TypedReveal>,
}

impl RevealTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks messages loaded from storage as already revealed.
    pub fn settle_all<'a>(&mut self, messages: impl IntoIterator<Item = &'a Message>) {
        self.settled.extend(messages.into_iter().map(|m| m.id.clone()));
    }

    pub fn begin(&mut self, message_id: &str, rendered: impl Into<String>) -> TypedReveal {
        let rendered = rendered.into();
        if self.settled.contains(message_id) {
            return TypedReveal::settled(message_id, rendered);
        }
        match self.active.take() {
            Some(mut reveal) => {
                reveal.retarget(message_id, &rendered);
                reveal
            }
            None => TypedReveal::pending(message_id, rendered),
        }
    }

    pub fn finish(&mut self, reveal: &TypedReveal) {
        if reveal.phase() == RevealPhase::Settled {
            self.settled.insert(reveal.message_id().to_string());
            self.active = None;
        } else {
            self.active = Some(reveal.clone());
        }
    }

    pub fn is_settled(&self, message_id: &str) -> bool {
        self.settled.contains(message_id)
    }
}

/// Writes the reveal to `out`, one character per `cadence`.
///
/// A settled reveal, or any reveal at zero cadence, is written in full at once.
pub async fn play<W>(reveal: &mut TypedReveal, out: &mut W, cadence: Duration) -> std::io::Result<()>
    where W: AsyncWrite + Unpin
{
    if reveal.phase() == RevealPhase::Settled {
        out.write_all(reveal.visible().as_bytes()).await?;
        return out.flush().await;
    }
    if cadence.is_zero() {
        reveal.finish();
        out.write_all(reveal.visible().as_bytes()).await?;
        return out.flush().await;
    }

    // A resumed reveal starts on a fresh line, so repeat what was already shown.
    if !reveal.visible().is_empty() {
        out.write_all(reveal.visible().as_bytes()).await?;
    }
    let mut interval = tokio::time::interval(cadence);
    let mut buf = [0u8; 4];
    while let Some(c) = reveal.tick() {
        interval.tick().await;
        out.write_all(c.encode_utf8(&mut buf).as_bytes()).await?;
        out.flush().await?;
    }
    Ok(())
}
