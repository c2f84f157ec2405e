//! Spoken emotion announcements.
//!
//! [`SpeechGate`] decides *whether* to speak, [`SpeechWorker`] does the
//! speaking on its own thread so the capture loop never waits on audio.

use std::{
    process::{Command, Stdio},
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use emotive_utils::config::SpeechSettings;
use log::{debug, info, warn};

/// Anything that can say a short phrase out loud. `speak` may block until
/// playback finishes.
pub trait SpeechSynthesizer: Send + Sync {
    fn speak(&self, text: &str) -> Result<()>;

    fn name(&self) -> &str;
}

/// Change-or-cooldown rate limiter for announcements.
#[derive(Debug, Clone)]
pub struct SpeechGate {
    cooldown: Duration,
    last_emotion: Option<String>,
    last_time: Option<Instant>,
}

impl SpeechGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_emotion: None,
            last_time: None,
        }
    }

    /// Record and return `true` when `emotion` differs from the last spoken
    /// label or strictly more than the cooldown has passed since it was spoken.
    pub fn should_speak(&mut self, emotion: &str, now: Instant) -> bool {
        let changed = self.last_emotion.as_deref() != Some(emotion);
        let cooled = self
            .last_time
            .is_none_or(|at| now.saturating_duration_since(at) > self.cooldown);
        if !(changed || cooled) {
            return false;
        }
        self.last_emotion = Some(emotion.to_owned());
        self.last_time = Some(now);
        true
    }

    pub fn last_spoken(&self) -> Option<&str> {
        self.last_emotion.as_deref()
    }
}

#[derive(Default)]
struct MailboxState {
    pending: Option<String>,
    closed: bool,
}

#[derive(Default)]
struct Mailbox {
    state: Mutex<MailboxState>,
    ready: Condvar,
}

impl Mailbox {
    fn lock(&self) -> MutexGuard<'_, MailboxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One long-lived speech thread with a single-slot, latest-wins mailbox.
///
/// An utterance queued while another is playing replaces any utterance that
/// has not started yet.
pub struct SpeechWorker {
    mailbox: Arc<Mailbox>,
    _handle: JoinHandle<()>,
}

impl SpeechWorker {
    pub fn spawn(synth: Box<dyn SpeechSynthesizer>) -> std::io::Result<Self> {
        let mailbox = Arc::new(Mailbox::default());
        let inbox = Arc::clone(&mailbox);
        let handle = thread::Builder::new()
            .name("emotive-speech".into())
            .spawn(move || speech_loop(&inbox, synth.as_ref()))?;
        Ok(Self {
            mailbox,
            _handle: handle,
        })
    }

    pub fn say(&self, text: impl Into<String>) {
        let mut state = self.mailbox.lock();
        if state.closed {
            return;
        }
        if let Some(dropped) = state.pending.replace(text.into()) {
            debug!("Replacing queued utterance '{dropped}'");
        }
        self.mailbox.ready.notify_one();
    }

    /// Close the mailbox. The thread exits after any utterance in progress;
    /// it is not joined since playback cannot be cancelled.
    pub fn shutdown(&self) {
        {
            let mut state = self.mailbox.lock();
            state.closed = true;
            state.pending = None;
        }
        self.mailbox.ready.notify_all();
    }
}

impl Drop for SpeechWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn speech_loop(mailbox: &Mailbox, synth: &dyn SpeechSynthesizer) {
    loop {
        let text = {
            let mut state = mailbox.lock();
            loop {
                if state.closed {
                    return;
                }
                if let Some(text) = state.pending.take() {
                    break text;
                }
                state = mailbox
                    .ready
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };
        if let Err(err) = synth.speak(&text) {
            warn!("Speech error ({}): {err:#}", synth.name());
        }
    }
}

/// Gate + worker pair shared between the UI and the capture loop.
///
/// Lives for the whole application run so the gate's memory carries across
/// capture sessions.
pub struct SpeechNotifier {
    gate: Mutex<SpeechGate>,
    worker: Option<SpeechWorker>,
}

impl SpeechNotifier {
    /// Notifier that voices through `synth`. With `None` the gate still runs
    /// but nothing is spoken.
    pub fn new(cooldown: Duration, synth: Option<Box<dyn SpeechSynthesizer>>) -> Self {
        let worker = synth.and_then(|synth| {
            let name = synth.name().to_owned();
            match SpeechWorker::spawn(synth) {
                Ok(worker) => {
                    info!("Speech enabled using {name}");
                    Some(worker)
                }
                Err(err) => {
                    warn!("Unable to start speech worker: {err}");
                    None
                }
            }
        });
        Self {
            gate: Mutex::new(SpeechGate::new(cooldown)),
            worker,
        }
    }

    /// Probe the platform speech tool once and build a notifier around it.
    pub fn from_settings(settings: &SpeechSettings) -> Self {
        let synth = CommandSynthesizer::probe(settings.rate_wpm)
            .map(|s| Box::new(s) as Box<dyn SpeechSynthesizer>);
        if synth.is_none() {
            info!("No speech engine found; announcements are disabled");
        }
        Self::new(settings.cooldown(), synth)
    }

    pub fn is_voiced(&self) -> bool {
        self.worker.is_some()
    }

    /// Consider announcing `emotion` now. See [`SpeechNotifier::evaluate_at`].
    pub fn evaluate(&self, emotion: Option<&str>, enabled: bool) -> bool {
        self.evaluate_at(emotion, enabled, Instant::now())
    }

    /// Returns `true` when the gate fired. Disabled or empty input leaves the
    /// gate untouched.
    pub fn evaluate_at(&self, emotion: Option<&str>, enabled: bool, now: Instant) -> bool {
        let Some(emotion) = emotion.filter(|e| enabled && !e.is_empty()) else {
            return false;
        };
        let fired = self
            .gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .should_speak(emotion, now);
        if fired && let Some(worker) = &self.worker {
            worker.say(emotion);
        }
        fired
    }

    pub fn last_spoken(&self) -> Option<String> {
        self.gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_spoken()
            .map(str::to_owned)
    }

    /// Stop voicing; the gate keeps working.
    pub fn shutdown(&self) {
        if let Some(worker) = &self.worker {
            worker.shutdown();
        }
    }
}

/// Platform command-line speech tools, in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechTool {
    /// macOS `say`.
    Say,
    /// Windows PowerShell driving `System.Speech`.
    PowerShell,
    EspeakNg,
    Espeak,
}

impl SpeechTool {
    fn candidates() -> &'static [SpeechTool] {
        if cfg!(target_os = "macos") {
            &[Self::Say]
        } else if cfg!(target_os = "windows") {
            &[Self::PowerShell, Self::EspeakNg]
        } else {
            &[Self::EspeakNg, Self::Espeak]
        }
    }

    fn program(self) -> &'static str {
        match self {
            Self::Say => "say",
            Self::PowerShell => "powershell",
            Self::EspeakNg => "espeak-ng",
            Self::Espeak => "espeak",
        }
    }

    fn is_available(self) -> bool {
        let mut cmd = Command::new(self.program());
        match self {
            Self::Say => cmd.args(["-v", "?"]),
            Self::PowerShell => cmd.args([
                "-NoProfile",
                "-NonInteractive",
                "-Command",
                "Add-Type -AssemblyName System.Speech",
            ]),
            Self::EspeakNg | Self::Espeak => cmd.arg("--version"),
        };
        cmd.stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    }
}

/// [`SpeechSynthesizer`] that shells out to a platform speech tool.
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    tool: SpeechTool,
    rate_wpm: u32,
}

impl CommandSynthesizer {
    pub fn new(tool: SpeechTool, rate_wpm: u32) -> Self {
        Self { tool, rate_wpm }
    }

    /// First available tool for this platform, if any.
    pub fn probe(rate_wpm: u32) -> Option<Self> {
        SpeechTool::candidates()
            .iter()
            .copied()
            .find(|tool| {
                let ok = tool.is_available();
                debug!("Speech tool {} available: {ok}", tool.program());
                ok
            })
            .map(|tool| Self::new(tool, rate_wpm))
    }

    fn command(&self, text: &str) -> Command {
        let text = sanitize(text);
        let mut cmd = Command::new(self.tool.program());
        match self.tool {
            SpeechTool::Say => {
                cmd.arg("-r").arg(self.rate_wpm.to_string()).arg(text);
            }
            SpeechTool::PowerShell => {
                let script = format!(
                    "Add-Type -AssemblyName System.Speech; \
                     $s = New-Object System.Speech.Synthesis.SpeechSynthesizer; \
                     $s.Rate = {}; $s.Speak('{}'); $s.Dispose()",
                    sapi_rate(self.rate_wpm),
                    text.replace('\'', "''")
                );
                cmd.args(["-NoProfile", "-NonInteractive", "-Command"])
                    .arg(script);
            }
            SpeechTool::EspeakNg | SpeechTool::Espeak => {
                cmd.arg("-s").arg(self.rate_wpm.to_string()).arg(text);
            }
        }
        cmd.stdout(Stdio::null()).stderr(Stdio::piped());
        cmd
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn speak(&self, text: &str) -> Result<()> {
        let output = self
            .command(text)
            .output()
            .with_context(|| format!("failed to run {}", self.tool.program()))?;
        anyhow::ensure!(
            output.status.success(),
            "{} exited with {}: {}",
            self.tool.program(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        self.tool.program()
    }
}

fn sanitize(text: &str) -> String {
    text.chars().filter(|c| !c.is_control()).take(200).collect()
}

/// Words per minute to the `-10..=10` SAPI rate scale (250 wpm = 0).
fn sapi_rate(wpm: u32) -> i32 {
    ((wpm as f32 - 250.0) / 25.0).round().clamp(-10.0, 10.0) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_fires_on_first_label() {
        let mut gate = SpeechGate::new(Duration::from_millis(1500));
        assert!(gate.should_speak("happy", Instant::now()));
        assert_eq!(gate.last_spoken(), Some("happy"));
    }

    #[test]
    fn cooldown_boundary_is_strict() {
        let cooldown = Duration::from_millis(1500);
        let mut gate = SpeechGate::new(cooldown);
        let t0 = Instant::now();
        assert!(gate.should_speak("sad", t0));
        assert!(!gate.should_speak("sad", t0 + cooldown));
        assert!(gate.should_speak("sad", t0 + cooldown + Duration::from_millis(1)));
    }

    #[test]
    fn sapi_rate_maps_words_per_minute() {
        assert_eq!(sapi_rate(250), 0);
        assert_eq!(sapi_rate(150), -4);
        assert_eq!(sapi_rate(0), -10);
        assert_eq!(sapi_rate(900), 10);
    }

    #[test]
    fn sanitize_strips_control_characters() {
        assert_eq!(sanitize("hap\npy\u{7}"), "happy");
    }
}
