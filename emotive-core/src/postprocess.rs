//! YuNet output decoding, score filtering and non-maximum suppression.

use std::cmp::Ordering;

use anyhow::Result;
use emotive_utils::config::DetectionSettings;
use tract_onnx::prelude::Tensor;

use crate::preprocess::InputSize;

const STRIDES: [usize; 3] = [8, 16, 32];
/// cls, obj, bbox, kps per stride.
const HEADS: usize = 4;
/// bbox (4) + landmarks (10) + score (1)
const ROW_LEN: usize = 15;

/// Filtering parameters applied to decoded detector rows.
#[derive(Debug, Clone)]
pub struct PostprocessConfig {
    /// Rows scoring below this are dropped.
    pub score_threshold: f32,
    /// IoU above which the lower-scoring of two boxes is suppressed.
    pub nms_threshold: f32,
    /// Keep at most this many rows before NMS; `0` keeps all.
    pub top_k: usize,
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        DetectionSettings::default().into()
    }
}

impl From<DetectionSettings> for PostprocessConfig {
    fn from(settings: DetectionSettings) -> Self {
        Self {
            score_threshold: settings.score_threshold,
            nms_threshold: settings.nms_threshold,
            top_k: settings.top_k,
        }
    }
}

impl From<&DetectionSettings> for PostprocessConfig {
    fn from(settings: &DetectionSettings) -> Self {
        settings.clone().into()
    }
}

/// Axis-aligned box in frame coordinates. May extend past the frame edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Left edge; negative when the face is cut off by the frame.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Finite coordinates and a positive size.
    pub fn is_usable(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Intersection over union.
    pub fn iou(&self, other: &Self) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);
        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        if intersection <= 0.0 {
            return 0.0;
        }
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 { 0.0 } else { intersection / union }
    }
}

/// One detected face.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Face box scaled back to frame coordinates.
    pub bbox: BoundingBox,
    /// Face confidence in `0.0..=1.0`.
    pub score: f32,
}

/// Turn raw detector outputs into the `[N, 15]` row layout.
///
/// Single-output models already emit rows. Multi-stride models emit twelve
/// tensors (cls/obj/bbox/kps for strides 8, 16, 32) that are decoded against
/// the anchor grid of `input`.
pub fn rows_from_outputs(mut outputs: Vec<Tensor>, input: InputSize) -> Result<Tensor> {
    match outputs.len() {
        0 => anyhow::bail!("face detector produced no outputs"),
        1 => Ok(outputs.remove(0)),
        n if n == STRIDES.len() * HEADS => decode_strides(&outputs, input),
        other => anyhow::bail!(
            "unexpected number of detector outputs: expected 1 or {}, got {}",
            STRIDES.len() * HEADS,
            other
        ),
    }
}

fn decode_strides(outputs: &[Tensor], input: InputSize) -> Result<Tensor> {
    let pad_w = (input.width as usize).div_ceil(32) * 32;
    let pad_h = (input.height as usize).div_ceil(32) * 32;

    let mut rows: Vec<f32> = Vec::new();
    for (level, &stride) in STRIDES.iter().enumerate() {
        let cols = pad_w / stride;
        let grid_rows = pad_h / stride;
        let cells = cols * grid_rows;

        let cls = head_slice(outputs, level, 0, cells, "cls")?;
        let obj = head_slice(outputs, level, 1, cells, "obj")?;
        let bbox = head_slice(outputs, level, 2, cells * 4, "bbox")?;
        let kps = head_slice(outputs, level, 3, cells * 10, "kps")?;

        let s = stride as f32;
        rows.reserve(cells * ROW_LEN);
        for idx in 0..cells {
            let (row, col) = ((idx / cols) as f32, (idx % cols) as f32);
            let score = (cls[idx].clamp(0.0, 1.0) * obj[idx].clamp(0.0, 1.0)).sqrt();

            let b = &bbox[idx * 4..idx * 4 + 4];
            let cx = (col + b[0]) * s;
            let cy = (row + b[1]) * s;
            let w = b[2].exp() * s;
            let h = b[3].exp() * s;
            rows.extend_from_slice(&[cx - w / 2.0, cy - h / 2.0, w, h]);

            for lm in kps[idx * 10..idx * 10 + 10].chunks_exact(2) {
                rows.push((lm[0] + col) * s);
                rows.push((lm[1] + row) * s);
            }
            rows.push(if score.is_finite() { score } else { 0.0 });
        }
    }

    Tensor::from_shape(&[rows.len() / ROW_LEN, ROW_LEN], &rows)
        .map_err(|e| anyhow::anyhow!("failed to build decoded detector tensor: {e}"))
}

fn head_slice<'a>(
    outputs: &'a [Tensor],
    level: usize,
    kind: usize,
    expected: usize,
    label: &str,
) -> Result<&'a [f32]> {
    let stride = STRIDES[level];
    let slice = outputs[level + STRIDES.len() * kind]
        .as_slice::<f32>()
        .map_err(|e| anyhow::anyhow!("{label} output at stride {stride} is not f32: {e}"))?;
    anyhow::ensure!(
        slice.len() == expected,
        "{label} length mismatch at stride {stride}: expected {expected}, got {}",
        slice.len()
    );
    Ok(slice)
}

/// Filter, rescale and de-duplicate detector rows.
///
/// Rows are dropped when their score is below the threshold or their box is
/// empty or non-finite. Survivors are sorted by score, truncated to `top_k`
/// and passed through NMS.
///
/// # Arguments
///
/// * `rows` - `[N, 15]` or `[1, N, 15]` tensor from [`rows_from_outputs`].
/// * `scale_x` - Factor mapping detector-input x coordinates to the frame.
/// * `scale_y` - Factor mapping detector-input y coordinates to the frame.
/// * `config` - Score, NMS and top-k limits.
pub fn apply_postprocess(
    rows: &Tensor,
    scale_x: f32,
    scale_y: f32,
    config: &PostprocessConfig,
) -> Result<Vec<Detection>> {
    let count = match rows.shape() {
        [n, ROW_LEN] | [1, n, ROW_LEN] => *n,
        other => anyhow::bail!("detector rows must be [N, 15] or [1, N, 15], got {other:?}"),
    };
    let data = rows
        .as_slice::<f32>()
        .map_err(|e| anyhow::anyhow!("detector rows are not f32: {e}"))?;

    let mut detections: Vec<Detection> = data[..count * ROW_LEN]
        .chunks_exact(ROW_LEN)
        .filter_map(|row| {
            let score = row[14];
            if !score.is_finite() || score < config.score_threshold {
                return None;
            }
            let bbox = BoundingBox {
                x: row[0] * scale_x,
                y: row[1] * scale_y,
                width: row[2] * scale_x,
                height: row[3] * scale_y,
            };
            bbox.is_usable().then_some(Detection { bbox, score })
        })
        .collect();

    detections.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    if config.top_k > 0 {
        detections.truncate(config.top_k);
    }
    if config.nms_threshold > 0.0 && detections.len() > 1 {
        detections = non_max_suppression(detections, config.nms_threshold);
    }
    Ok(detections)
}

fn non_max_suppression(detections: Vec<Detection>, threshold: f32) -> Vec<Detection> {
    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        if kept.iter().all(|k| candidate.bbox.iou(&k.bbox) <= threshold) {
            kept.push(candidate);
        }
    }
    kept
}
