//! Face detection and emotion classification.
//!
//! YuNet finds faces, FER+ scores their expressions; both ONNX graphs are run
//! with `tract-onnx`. Callers talk to the [`EmotionAnalyzer`] trait.

/// Normalized analysis results and the analyzer trait.
pub mod analysis;
/// ONNX-backed analyzer with lazily loaded models.
pub mod analyzer;
/// Selectable detector backends.
pub mod backend;
/// YuNet face detection runner.
pub mod detector;
/// FER+ emotion classifier.
pub mod emotion;
/// ONNX model loading and execution.
pub mod model;
/// Detection post-processing (decoding, score filtering, NMS).
pub mod postprocess;
/// Detector input preprocessing.
pub mod preprocess;

pub use analysis::{AnalysisResult, EmotionAnalyzer, FaceAnalysis, FaceRegion};
pub use analyzer::OnnxEmotionAnalyzer;
pub use backend::DetectorBackend;
pub use detector::FaceDetector;
pub use emotion::{
    EmotionClassifier, EmotionScores, FERPLUS_LABELS, dominant_emotion, scores_from_logits,
};
pub use model::OnnxModel;
pub use postprocess::{BoundingBox, Detection, PostprocessConfig, apply_postprocess};
pub use preprocess::{InputSize, PreprocessOutput, preprocess_frame};
