use std::{
    path::PathBuf,
    sync::{Arc, OnceLock},
};

use anyhow::{Context, Result};
use emotive_utils::{
    config::{DetectionSettings, ModelPaths},
    crop_clamped,
};
use image::RgbImage;
use log::{debug, info};

use crate::{
    analysis::{AnalysisResult, EmotionAnalyzer, FaceAnalysis, FaceRegion},
    backend::DetectorBackend,
    detector::FaceDetector,
    emotion::{EmotionClassifier, EmotionScores, dominant_emotion},
    postprocess::{BoundingBox, PostprocessConfig},
};

/// Model loaded on first use. A load failure is remembered so a missing file
/// is not re-read on every frame.
struct LazyModel<T> {
    cell: OnceLock<Result<Arc<T>, String>>,
}

impl<T> LazyModel<T> {
    const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    fn get_or_load(&self, load: impl FnOnce() -> Result<T>) -> Result<Arc<T>> {
        self.cell
            .get_or_init(|| load().map(Arc::new).map_err(|e| format!("{e:#}")))
            .clone()
            .map_err(anyhow::Error::msg)
    }
}

/// [`EmotionAnalyzer`] backed by YuNet + FER+ ONNX models run with tract.
pub struct OnnxEmotionAnalyzer {
    detector_path: PathBuf,
    classifier_path: PathBuf,
    postprocess: PostprocessConfig,
    yunet: LazyModel<FaceDetector>,
    yunet_fast: LazyModel<FaceDetector>,
    classifier: LazyModel<EmotionClassifier>,
}

impl OnnxEmotionAnalyzer {
    /// Nothing is loaded until the first [`EmotionAnalyzer::analyze`] call.
    pub fn new(models: &ModelPaths, detection: &DetectionSettings) -> Self {
        Self {
            detector_path: models.face_detector.clone(),
            classifier_path: models.emotion_classifier.clone(),
            postprocess: detection.into(),
            yunet: LazyModel::new(),
            yunet_fast: LazyModel::new(),
            classifier: LazyModel::new(),
        }
    }

    fn detector(&self, backend: DetectorBackend) -> Result<Option<Arc<FaceDetector>>> {
        let (slot, input) = match (backend, backend.input_size()) {
            (DetectorBackend::YuNet, Some(input)) => (&self.yunet, input),
            (DetectorBackend::YuNetFast, Some(input)) => (&self.yunet_fast, input),
            _ => return Ok(None),
        };
        slot.get_or_load(|| {
            info!(
                "Loading face detector for backend {backend} ({}x{}) from {}",
                input.width,
                input.height,
                self.detector_path.display()
            );
            FaceDetector::new(&self.detector_path, input, self.postprocess.clone())
        })
        .map(Some)
    }

    fn classifier(&self) -> Result<Arc<EmotionClassifier>> {
        self.classifier.get_or_load(|| {
            info!(
                "Loading emotion classifier from {}",
                self.classifier_path.display()
            );
            EmotionClassifier::new(&self.classifier_path)
        })
    }
}

impl EmotionAnalyzer for OnnxEmotionAnalyzer {
    fn analyze(&self, frame: &RgbImage, backend: DetectorBackend) -> Result<AnalysisResult> {
        let classifier = self.classifier()?;
        let Some(detector) = self.detector(backend)? else {
            let (w, h) = frame.dimensions();
            let region = FaceRegion::new(0, 0, w as i32, h as i32);
            let scores = classifier
                .classify(frame)
                .context("failed to classify full frame")?;
            return Ok(AnalysisResult::Single(face_analysis(region, scores)));
        };

        let detections = detector.detect(frame)?;
        let mut faces = Vec::with_capacity(detections.len());
        for detection in detections {
            let region = region_from_bbox(&detection.bbox);
            let clamped = region.clamped();
            let Some(crop) = crop_clamped(
                frame,
                clamped.x as u32,
                clamped.y as u32,
                clamped.w as u32,
                clamped.h as u32,
            ) else {
                debug!("Skipping face {region:?} outside the frame");
                continue;
            };
            let scores = classifier.classify(&crop)?;
            faces.push(face_analysis(region, scores));
        }
        Ok(AnalysisResult::Multiple(faces))
    }
}

fn region_from_bbox(bbox: &BoundingBox) -> FaceRegion {
    FaceRegion::new(
        bbox.x.round() as i32,
        bbox.y.round() as i32,
        bbox.width.round() as i32,
        bbox.height.round() as i32,
    )
}

fn face_analysis(region: FaceRegion, emotion: EmotionScores) -> FaceAnalysis {
    let dominant_emotion = dominant_emotion(&emotion).unwrap_or_default().to_string();
    FaceAnalysis {
        region,
        dominant_emotion,
        emotion,
    }
}
