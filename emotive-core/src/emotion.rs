//! FER+ facial expression classifier.

use std::{collections::BTreeMap, path::Path};

use anyhow::Result;
use emotive_utils::{resize_exact, timing_guard, to_gray_tensor};
use image::{RgbImage, imageops::FilterType};
use tract_onnx::prelude::Tensor;

use crate::model::OnnxModel;

/// Output order of the FER+ model.
pub const FERPLUS_LABELS: [&str; 8] = [
    "neutral", "happy", "surprise", "sad", "angry", "disgust", "fear", "contempt",
];

/// FER+ takes 64x64 grayscale faces.
pub const FERPLUS_INPUT_SIDE: u32 = 64;

/// Label -> probability in percent (values sum to ~100).
pub type EmotionScores = BTreeMap<String, f32>;

#[derive(Debug)]
pub struct EmotionClassifier {
    model: OnnxModel,
    side: u32,
}

impl EmotionClassifier {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let side = FERPLUS_INPUT_SIDE as usize;
        let model = OnnxModel::load(model_path, "FER+", [1, 1, side, side])?;
        Ok(Self {
            model,
            side: FERPLUS_INPUT_SIDE,
        })
    }

    /// Classify a face crop.
    pub fn classify(&self, face: &RgbImage) -> Result<EmotionScores> {
        let _guard = timing_guard("emotive_core::classify_emotion", log::Level::Debug);
        anyhow::ensure!(
            face.width() > 0 && face.height() > 0,
            "face crop is empty"
        );
        let resized = resize_exact(face, self.side, self.side, FilterType::Triangle);
        let (data, _) = to_gray_tensor(&resized).into_raw_vec_and_offset();
        let side = self.side as usize;
        let input = Tensor::from_shape(&[1, 1, side, side], &data)
            .map_err(|e| anyhow::anyhow!("failed to build classifier tensor: {e}"))?;

        let outputs = self.model.run(input)?;
        let logits = outputs
            .first()
            .ok_or_else(|| anyhow::anyhow!("emotion classifier produced no outputs"))?
            .as_slice::<f32>()
            .map_err(|e| anyhow::anyhow!("emotion classifier output is not f32: {e}"))?;
        scores_from_logits(logits, &FERPLUS_LABELS)
    }
}

/// Softmax `logits` into percentages keyed by `labels`.
pub fn scores_from_logits(logits: &[f32], labels: &[&str]) -> Result<EmotionScores> {
    anyhow::ensure!(
        logits.len() == labels.len(),
        "expected {} emotion logits, got {}",
        labels.len(),
        logits.len()
    );
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    anyhow::ensure!(
        total.is_finite() && total > 0.0,
        "emotion logits are not finite"
    );

    Ok(labels
        .iter()
        .zip(exps)
        .map(|(label, e)| (label.to_string(), e / total * 100.0))
        .collect())
}

/// Highest-scoring label; ties resolve to the alphabetically first label.
pub fn dominant_emotion(scores: &EmotionScores) -> Option<&str> {
    scores
        .iter()
        .fold(None::<(&String, f32)>, |best, (label, &p)| match best {
            Some((_, best_p)) if best_p >= p => best,
            _ => Some((label, p)),
        })
        .map(|(label, _)| label.as_str())
}
