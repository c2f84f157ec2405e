//! Normalized results of one emotion-analysis call.

use std::collections::BTreeMap;

use anyhow::Result;
use image::RgbImage;

use crate::backend::DetectorBackend;

/// Face rectangle as reported by the analyzer. May be partly off-frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaceRegion {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl FaceRegion {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Origin clamped to non-negative values; size clamped to >= 0.
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.max(0),
            y: self.y.max(0),
            w: self.w.max(0),
            h: self.h.max(0),
        }
    }
}

/// One face: where it is and how it feels.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceAnalysis {
    pub region: FaceRegion,
    pub dominant_emotion: String,
    /// Label -> probability in percent.
    pub emotion: BTreeMap<String, f32>,
}

impl FaceAnalysis {
    /// Probability of the dominant emotion, `0.0` if it is missing from the map.
    pub fn probability(&self) -> f32 {
        self.emotion
            .get(&self.dominant_emotion)
            .copied()
            .unwrap_or(0.0)
    }
}

/// Analyzers may report a single face or a list of faces.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    Single(FaceAnalysis),
    Multiple(Vec<FaceAnalysis>),
}

impl AnalysisResult {
    pub fn into_faces(self) -> Vec<FaceAnalysis> {
        match self {
            Self::Single(face) => vec![face],
            Self::Multiple(faces) => faces,
        }
    }
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self::Multiple(Vec::new())
    }
}

/// Frame in, faces out.
///
/// Finding no face is `Ok` with an empty result, never an error.
pub trait EmotionAnalyzer: Send + Sync {
    fn analyze(&self, frame: &RgbImage, backend: DetectorBackend) -> Result<AnalysisResult>;
}
