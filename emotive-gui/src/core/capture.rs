//! Background capture loop: camera -> analyzer -> overlays -> UI.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use emotive_core::{DetectorBackend, EmotionAnalyzer, FaceAnalysis, FaceRegion};
use emotive_utils::{
    CameraOpener, FrameSource, config::CaptureSettings, crop_clamped, fit_within, resize_exact,
};
use image::{Rgb, RgbImage, imageops::FilterType};
use log::{debug, info, warn};

use crate::{
    core::{annotate::Annotator, error::SessionError, speech::SpeechNotifier},
    types::{CardSummary, FrameUpdate, LiveControls, UiMessage},
};

/// Thumbnails are fitted inside this square.
pub const THUMBNAIL_SIDE: u32 = 96;
const PLACEHOLDER_COLOR: Rgb<u8> = Rgb([100, 100, 100]);

/// Exponentially smoothed frames-per-second estimate.
#[derive(Debug, Clone, Default)]
pub struct FpsMeter {
    fps: Option<f32>,
}

impl FpsMeter {
    /// Fold one loop duration into the estimate and return it.
    ///
    /// The first sample seeds the estimate; later ones are blended
    /// `0.9 * previous + 0.1 * instant`.
    pub fn record(&mut self, loop_time: Duration) -> f32 {
        let secs = loop_time.as_secs_f32().max(1e-6);
        let instant = 1.0 / secs;
        let fps = match self.fps {
            Some(prev) => 0.9 * prev + 0.1 * instant,
            None => instant,
        };
        self.fps = Some(fps);
        fps
    }

    pub fn current(&self) -> f32 {
        self.fps.unwrap_or(0.0)
    }
}

/// Run the analyzer, treating any failure as "no faces" for this frame.
pub fn analyze_frame(
    analyzer: &dyn EmotionAnalyzer,
    frame: &RgbImage,
    backend: DetectorBackend,
) -> Vec<FaceAnalysis> {
    match analyzer.analyze(frame, backend) {
        Ok(result) => result.into_faces(),
        Err(err) => {
            debug!("Analysis failed ({backend}): {err:#}");
            Vec::new()
        }
    }
}

/// Crop `region` out of `frame` for a card, or a gray placeholder when the
/// crop is empty.
pub fn face_thumbnail(frame: &RgbImage, region: FaceRegion) -> RgbImage {
    let region = region.clamped();
    crop_clamped(
        frame,
        region.x as u32,
        region.y as u32,
        region.w as u32,
        region.h as u32,
    )
    .map(|crop| fit_within(&crop, THUMBNAIL_SIDE, THUMBNAIL_SIDE))
    .unwrap_or_else(|| RgbImage::from_pixel(THUMBNAIL_SIDE, THUMBNAIL_SIDE, PLACEHOLDER_COLOR))
}

/// Scale to `width`, keeping the aspect ratio.
pub fn scale_to_width(image: &RgbImage, width: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    if w == 0 || width == 0 {
        return image.clone();
    }
    let height = ((width as f32 * h as f32 / w as f32).round() as u32).max(1);
    resize_exact(image, width, height, FilterType::Triangle)
}

/// Output of one loop iteration, before it is sent to the UI.
#[derive(Debug)]
pub struct ProcessedFrame {
    pub display: RgbImage,
    pub frame: RgbImage,
    pub cards: Vec<CardSummary>,
    pub fps: f32,
}

impl ProcessedFrame {
    /// Dominant emotion of the first face, the only one that may be spoken.
    pub fn primary_emotion(&self) -> Option<&str> {
        self.cards.first().map(|card| card.emotion.as_str())
    }
}

/// Per-session frame pipeline state.
pub struct FramePipeline {
    annotator: Annotator,
    fps: FpsMeter,
    frame_size: (u32, u32),
    display_width: u32,
}

impl FramePipeline {
    pub fn new(settings: &CaptureSettings) -> Self {
        Self {
            annotator: Annotator::new(),
            fps: FpsMeter::default(),
            frame_size: (settings.frame_width, settings.frame_height),
            display_width: settings.display_width,
        }
    }

    /// Resize, analyze and annotate one raw frame. `started` marks the
    /// beginning of the iteration for FPS purposes.
    pub fn process(
        &mut self,
        raw: &RgbImage,
        analyzer: &dyn EmotionAnalyzer,
        backend: DetectorBackend,
        started: Instant,
    ) -> ProcessedFrame {
        let (width, height) = self.frame_size;
        let frame = resize_exact(raw, width, height, FilterType::Triangle);
        let faces = analyze_frame(analyzer, &frame, backend);

        let mut annotated = frame.clone();
        let cards: Vec<CardSummary> = faces
            .iter()
            .map(|face| {
                let region = face.region.clamped();
                let probability = face.probability();
                self.annotator.draw_face_overlay(
                    &mut annotated,
                    region,
                    &face.dominant_emotion,
                    probability,
                );
                CardSummary {
                    thumbnail: face_thumbnail(&frame, region),
                    emotion: face.dominant_emotion.clone(),
                    probability,
                    region,
                }
            })
            .collect();

        let fps = self.fps.record(started.elapsed());
        self.annotator.draw_fps_banner(&mut annotated, fps, backend);
        let display = scale_to_width(&annotated, self.display_width);

        ProcessedFrame {
            display,
            frame: annotated,
            cards,
            fps,
        }
    }
}

/// Everything a capture session needs, moved onto the worker thread.
pub struct CaptureRequest {
    pub session: u64,
    pub camera_index: u32,
    pub settings: CaptureSettings,
    pub opener: Arc<dyn CameraOpener>,
    pub analyzer: Arc<dyn EmotionAnalyzer>,
    pub controls: Arc<LiveControls>,
    pub speech: Arc<SpeechNotifier>,
    pub sink: mpsc::Sender<UiMessage>,
    /// Woken after each posted frame.
    pub repaint: Option<egui::Context>,
}

/// Owner of a running capture worker.
///
/// [`CaptureHandle::request_stop`] only clears the running flag. Dropping or
/// [`CaptureHandle::stop`]ping the handle also joins the worker, which
/// releases the camera on its way out.
pub struct CaptureHandle {
    session: u64,
    camera_index: u32,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl CaptureHandle {
    /// Open the camera on a new worker thread and start the loop.
    ///
    /// Blocks until the worker reports whether the camera opened.
    pub fn start(request: CaptureRequest) -> Result<Self, SessionError> {
        let session = request.session;
        let camera_index = request.camera_index;
        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), String>>(1);

        let flag = Arc::clone(&running);
        let worker = thread::Builder::new()
            .name(format!("emotive-capture-{session}"))
            .spawn(move || {
                let source = match request.opener.open(request.camera_index) {
                    Ok(source) => {
                        let _ = ready_tx.send(Ok(()));
                        source
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(format!("{err:#}")));
                        return;
                    }
                };
                run_capture_loop(source, &request, &flag);
            })
            .map_err(SessionError::WorkerSpawn)?;

        let opened = ready_rx
            .recv()
            .unwrap_or_else(|_| Err("capture worker exited before opening the camera".into()));
        match opened {
            Ok(()) => {
                info!("Capture session {session} started on camera {camera_index}");
                Ok(Self {
                    session,
                    camera_index,
                    running,
                    worker: Some(worker),
                })
            }
            Err(reason) => {
                let _ = worker.join();
                warn!("Could not open camera {camera_index}: {reason}");
                Err(SessionError::CameraOpen {
                    index: camera_index,
                    reason,
                })
            }
        }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn camera_index(&self) -> u32 {
        self.camera_index
    }

    /// `false` once stopped or once the worker has exited on its own.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Ask the worker to exit after its current iteration, without waiting.
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// `true` once the worker thread has exited (and released the camera).
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Clear the running flag and wait for the worker. At most one
    /// in-flight iteration completes first.
    pub fn stop(&mut self) {
        self.request_stop();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Capture worker for session {} panicked", self.session);
            }
            info!("Capture session {} stopped", self.session);
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_capture_loop(
    mut source: Box<dyn FrameSource>,
    request: &CaptureRequest,
    running: &AtomicBool,
) {
    let settings = &request.settings;
    let mut pipeline = FramePipeline::new(settings);

    while running.load(Ordering::Acquire) {
        let started = Instant::now();
        let raw = match source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                thread::sleep(settings.read_retry());
                continue;
            }
            Err(err) => {
                debug!("Frame read failed: {err:#}");
                thread::sleep(settings.read_retry());
                continue;
            }
        };

        let backend = request.controls.backend();
        let processed = pipeline.process(&raw, request.analyzer.as_ref(), backend, started);
        let primary = processed.primary_emotion().map(str::to_owned);

        let update = FrameUpdate {
            session: request.session,
            display: processed.display,
            frame: Arc::new(processed.frame),
            cards: processed.cards,
            fps: processed.fps,
        };
        if request.sink.send(UiMessage::Frame(update)).is_err() {
            debug!("UI channel closed; ending capture session {}", request.session);
            break;
        }
        if let Some(ctx) = &request.repaint {
            ctx.request_repaint();
        }

        request
            .speech
            .evaluate(primary.as_deref(), request.controls.speech_enabled());

        thread::sleep(settings.idle_pause());
    }

    if let Err(err) = source.release() {
        warn!("Failed to release camera {}: {err:#}", request.camera_index);
    }
    let _ = request.sink.send(UiMessage::Stopped {
        session: request.session,
    });
    if let Some(ctx) = &request.repaint {
        ctx.request_repaint();
    }
}
