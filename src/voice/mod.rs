mod command;

pub use command::{ CommandRecognizer, CommandSynthesizer };

use crate::cli::Args;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;

/// Dictation is single-shot, final-result only, in this locale.
pub const RECOGNITION_LOCALE: &str = "en-US";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoiceError {
    #[error("Speech recognition not supported")]
    RecognitionUnsupported,
    #[error("Speech synthesis not supported")]
    SynthesisUnsupported,
    #[error("Voice recognition error: {0}")]
    Recognition(String),
    #[error("Speech synthesis error: {0}")]
    Synthesis(String),
    #[error("Voice input cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechParams {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for SpeechParams {
    fn default() -> Self {
        Self { rate: 1.0, pitch: 1.0, volume: 1.0 }
    }
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    fn is_supported(&self) -> bool;
    /// Waits for one final transcript.
    async fn listen(&self) -> Result<String, VoiceError>;
    fn stop(&self);
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn is_supported(&self) -> bool;
    /// Starts speaking, cancelling any current utterance. The receiver fires at end of speech.
    async fn speak(&self, text: &str, params: SpeechParams) -> Result<oneshot::Receiver<()>, VoiceError>;
    fn stop(&self);
    fn is_speaking(&self) -> bool;
}

/// Stand-in when no engine is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unsupported;

#[async_trait]
impl SpeechRecognizer for Unsupported {
    fn is_supported(&self) -> bool {
        false
    }

    async fn listen(&self) -> Result<String, VoiceError> {
        Err(VoiceError::RecognitionUnsupported)
    }

    fn stop(&self) {}
}

#[async_trait]
impl SpeechSynthesizer for Unsupported {
    fn is_supported(&self) -> bool {
        false
    }

    async fn speak(&self, _text: &str, _params: SpeechParams) -> Result<oneshot::Receiver<()>, VoiceError> {
        Err(VoiceError::SynthesisUnsupported)
    }

    fn stop(&self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct VoiceBridge {
    recognizer: Arc<dyn SpeechRecognizer>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl Default for VoiceBridge {
    fn default() -> Self {
        Self::new(Arc::new(Unsupported), Arc::new(Unsupported))
    }
}

impl VoiceBridge {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self { recognizer, synthesizer }
    }

    pub fn from_args(args: &Args) -> Self {
        let recognizer: Arc<dyn SpeechRecognizer> = match args.listen_command.as_deref().and_then(CommandRecognizer::parse) {
            Some(recognizer) => {
                info!("Voice input via: {}", recognizer.program());
                Arc::new(recognizer)
            }
            None => Arc::new(Unsupported),
        };
        let synthesizer: Arc<dyn SpeechSynthesizer> = match args.speech_command.as_deref().and_then(CommandSynthesizer::parse) {
            Some(synthesizer) => {
                info!("Read-aloud via: {}", synthesizer.program());
                Arc::new(synthesizer)
            }
            None => Arc::new(Unsupported),
        };
        Self::new(recognizer, synthesizer)
    }

    pub fn can_listen(&self) -> bool {
        self.recognizer.is_supported()
    }

    pub fn can_speak(&self) -> bool {
        self.synthesizer.is_supported()
    }

    pub async fn listen(&self) -> Result<String, VoiceError> {
        self.recognizer.listen().await
    }

    pub fn stop_listening(&self) {
        self.recognizer.stop();
    }

    pub async fn speak(&self, text: &str) -> Result<oneshot::Receiver<()>, VoiceError> {
        self.synthesizer.speak(text, SpeechParams::default()).await
    }

    pub fn stop_speaking(&self) {
        self.synthesizer.stop();
    }

    pub fn is_speaking(&self) -> bool {
        self.synthesizer.is_speaking()
    }
}
