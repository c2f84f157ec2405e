use std::path::Path;

use anyhow::Result;
use image::RgbImage;

use crate::model::OnnxModel;
use crate::postprocess::{Detection, PostprocessConfig, apply_postprocess, rows_from_outputs};
use crate::preprocess::{InputSize, preprocess_frame};
use emotive_utils::timing_guard;

/// YuNet face detector bound to one input resolution.
#[derive(Debug)]
pub struct FaceDetector {
    model: OnnxModel,
    input_size: InputSize,
    postprocess: PostprocessConfig,
}

impl FaceDetector {
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        input_size: InputSize,
        postprocess: PostprocessConfig,
    ) -> Result<Self> {
        let model = OnnxModel::load(model_path, "YuNet", input_size.tensor_shape())?;
        Ok(Self {
            model,
            input_size,
            postprocess,
        })
    }

    /// Detect faces in `frame`; coordinates are in `frame` space.
    pub fn detect(&self, frame: &RgbImage) -> Result<Vec<Detection>> {
        let _guard = timing_guard("emotive_core::detect_faces", log::Level::Debug);
        let prep = preprocess_frame(frame, self.input_size)?;
        let outputs = {
            let _guard = timing_guard("emotive_core::yunet_inference", log::Level::Debug);
            self.model.run(prep.tensor)?
        };
        let rows = rows_from_outputs(outputs, self.input_size)?;
        apply_postprocess(&rows, prep.scale_x, prep.scale_y, &self.postprocess)
    }
}
