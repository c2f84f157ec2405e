#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::Result;
use emotive_core::{AnalysisResult, DetectorBackend, EmotionAnalyzer, FaceAnalysis, FaceRegion};
use emotive_gui::{
    Services,
    core::speech::{SpeechNotifier, SpeechSynthesizer},
};
use emotive_utils::{AppConfig, CameraOpener, FrameSource};
use image::{Rgb, RgbImage};

pub const BACKGROUND: Rgb<u8> = Rgb([40, 40, 40]);

/// Opener whose cameras yield a fixed frame (or nothing) and record releases.
pub struct FakeOpener {
    pub frame: Option<RgbImage>,
    pub fail: bool,
    pub opens: AtomicUsize,
    pub releases: Arc<AtomicUsize>,
    pub reads: Arc<AtomicUsize>,
}

impl FakeOpener {
    pub fn with_frame(frame: RgbImage) -> Self {
        Self {
            frame: Some(frame),
            fail: false,
            opens: AtomicUsize::new(0),
            releases: Arc::new(AtomicUsize::new(0)),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn empty() -> Self {
        Self {
            frame: None,
            ..Self::with_frame(RgbImage::new(1, 1))
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::empty()
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl CameraOpener for FakeOpener {
    fn open(&self, index: u32) -> Result<Box<dyn FrameSource>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        anyhow::ensure!(!self.fail, "no device at index {index}");
        Ok(Box::new(FakeSource {
            frame: self.frame.clone(),
            released: false,
            releases: Arc::clone(&self.releases),
            reads: Arc::clone(&self.reads),
        }))
    }
}

struct FakeSource {
    frame: Option<RgbImage>,
    released: bool,
    releases: Arc<AtomicUsize>,
    reads: Arc<AtomicUsize>,
}

impl FrameSource for FakeSource {
    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.frame.clone())
    }

    fn release(&mut self) -> Result<()> {
        if !self.released {
            self.released = true;
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Analyzer that returns a scripted outcome and records the backend it saw.
pub struct ScriptedAnalyzer {
    pub faces: Vec<FaceAnalysis>,
    pub fail: AtomicBool,
    pub seen: Mutex<Vec<DetectorBackend>>,
    /// Time spent in every `analyze` call, like a first-use model load.
    pub delay: Duration,
}

impl ScriptedAnalyzer {
    pub fn new(faces: Vec<FaceAnalysis>) -> Self {
        Self {
            faces,
            fail: AtomicBool::new(false),
            seen: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    pub fn slow(faces: Vec<FaceAnalysis>, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new(faces)
        }
    }
}

impl EmotionAnalyzer for ScriptedAnalyzer {
    fn analyze(&self, _frame: &RgbImage, backend: DetectorBackend) -> Result<AnalysisResult> {
        self.seen.lock().unwrap().push(backend);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        anyhow::ensure!(!self.fail.load(Ordering::SeqCst), "inference exploded");
        Ok(AnalysisResult::Multiple(self.faces.clone()))
    }
}

/// Face at `region` whose dominant emotion is `label` at `probability`.
pub fn face(region: FaceRegion, label: &str, probability: f32) -> FaceAnalysis {
    let emotion: BTreeMap<String, f32> = [(label.to_string(), probability)]
        .into_iter()
        .chain(
            [("neutral", 5.0), ("sad", 2.5)]
                .into_iter()
                .filter(|(k, _)| *k != label)
                .map(|(k, v)| (k.to_string(), v)),
        )
        .collect();
    FaceAnalysis {
        region,
        dominant_emotion: label.into(),
        emotion,
    }
}

pub fn happy_face() -> FaceAnalysis {
    face(FaceRegion::new(10, 10, 50, 50), "happy", 92.5)
}

/// Synthesizer that records every phrase it is asked to speak.
#[derive(Clone, Default)]
pub struct Recorder {
    pub spoken: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    /// Wait up to five seconds for `count` phrases and return what was said.
    pub fn wait_for(&self, count: usize) -> Vec<String> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let spoken = self.spoken.lock().unwrap().clone();
            if spoken.len() >= count || Instant::now() > deadline {
                return spoken;
            }
            thread::sleep(Duration::from_millis(2));
        }
    }
}

impl SpeechSynthesizer for Recorder {
    fn speak(&self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_owned());
        Ok(())
    }

    fn name(&self) -> &str {
        "recorder"
    }
}

pub fn camera_frame() -> RgbImage {
    RgbImage::from_pixel(1280, 720, BACKGROUND)
}

/// Default config with fast loop pauses and a throwaway screenshot dir.
pub fn test_config(screenshot_dir: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.capture.read_retry_ms = 1;
    config.capture.idle_pause_ms = 1;
    config.capture.restart_pause_ms = 0;
    config.screenshots.directory = screenshot_dir.to_path_buf();
    config
}

pub fn services(opener: Arc<FakeOpener>, analyzer: Arc<ScriptedAnalyzer>) -> Services {
    Services {
        opener,
        analyzer,
        speech: Arc::new(SpeechNotifier::new(Duration::from_millis(1500), None)),
    }
}
