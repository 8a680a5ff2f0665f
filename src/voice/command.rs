use super::{ SpeechParams, SpeechRecognizer, SpeechSynthesizer, VoiceError, RECOGNITION_LOCALE };
use async_trait::async_trait;
use log::{ debug, warn };
use std::process::Stdio;
use std::sync::atomic::{ AtomicBool, AtomicU64, Ordering };
use std::sync::{ Arc, Mutex };
use tokio::process::Command;
use tokio::sync::oneshot;

fn split_command(command: &str) -> Option<(String, Vec<String>)> {
    let mut parts = command.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

fn take_cancel(slot: &Mutex<Option<oneshot::Sender<()>>>) -> Option<oneshot::Sender<()>> {
    slot.lock().unwrap_or_else(|e| e.into_inner()).take()
}

fn set_cancel(slot: &Mutex<Option<oneshot::Sender<()>>>, sender: oneshot::Sender<()>) {
    *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(sender);
}

/// Reads text aloud through an external program such as `espeak`.
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
    cancel: Mutex<Option<oneshot::Sender<()>>>,
    speaking: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            cancel: Mutex::new(None),
            speaking: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn parse(command: &str) -> Option<Self> {
        split_command(command).map(|(program, args)| Self::new(program, args))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn render_args(&self, params: SpeechParams) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{rate}", &params.rate.to_string())
                    .replace("{pitch}", &params.pitch.to_string())
                    .replace("{volume}", &params.volume.to_string())
            })
            .collect()
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandSynthesizer {
    fn is_supported(&self) -> bool {
        true
    }

    async fn speak(&self, text: &str, params: SpeechParams) -> Result<oneshot::Receiver<()>, VoiceError> {
        self.stop();

        let mut child = Command::new(&self.program)
            .args(self.render_args(params))
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VoiceError::Synthesis(e.to_string()))?;

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        set_cancel(&self.cancel, cancel_tx);

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = self.generation.clone();
        let speaking = self.speaking.clone();
        speaking.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => match status {
                    Ok(status) if !status.success() => warn!("Speech command exited with {}", status),
                    Ok(_) => debug!("Speech finished"),
                    Err(e) => warn!("Speech command failed: {}", e),
                },
                _ = cancel_rx => {
                    if let Err(e) = child.kill().await {
                        debug!("Speech command already gone: {}", e);
                    }
                }
            }
            if current.load(Ordering::SeqCst) == generation {
                speaking.store(false, Ordering::SeqCst);
            }
            let _ = done_tx.send(());
        });

        Ok(done_rx)
    }

    fn stop(&self) {
        if let Some(cancel) = take_cancel(&self.cancel) {
            let _ = cancel.send(());
        }
        self.speaking.store(false, Ordering::SeqCst);
    }

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }
}

/// Single-shot dictation through an external program that prints the transcript on stdout.
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
    cancel: Mutex<Option<oneshot::Sender<()>>>,
}

impl CommandRecognizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            cancel: Mutex::new(None),
        }
    }

    pub fn parse(command: &str) -> Option<Self> {
        split_command(command).map(|(program, args)| Self::new(program, args))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl SpeechRecognizer for CommandRecognizer {
    fn is_supported(&self) -> bool {
        true
    }

    async fn listen(&self) -> Result<String, VoiceError> {
        let args: Vec<String> = self.args.iter().map(|a| a.replace("{locale}", RECOGNITION_LOCALE)).collect();
        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VoiceError::Recognition(e.to_string()))?;

        let (cancel_tx, cancel_rx) = oneshot::channel();
        set_cancel(&self.cancel, cancel_tx);

        let output = tokio::select! {
            output = child.wait_with_output() => output.map_err(|e| VoiceError::Recognition(e.to_string()))?,
            _ = cancel_rx => return Err(VoiceError::Cancelled),
        };
        take_cancel(&self.cancel);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let code = if stderr.is_empty() { output.status.to_string() } else { stderr };
            return Err(VoiceError::Recognition(code));
        }

        let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if transcript.is_empty() {
            return Err(VoiceError::Recognition("no-speech".to_string()));
        }
        Ok(transcript)
    }

    fn stop(&self) {
        if let Some(cancel) = take_cancel(&self.cancel) {
            let _ = cancel.send(());
        }
    }
}
