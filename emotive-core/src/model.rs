use std::{fmt::Write, path::Path};

use anyhow::{Context, Result};
use log::{debug, warn};
use tract_onnx::prelude::{
    DatumExt, Framework, Graph, InferenceModelExt, IntoTensor, SimplePlan, Tensor, TypedFact,
    TypedOp, tvec,
};

type RunnableModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// A loaded, runnable ONNX graph with a fixed `[N, C, H, W]` input.
#[derive(Debug)]
pub struct OnnxModel {
    runnable: RunnableModel,
    /// Short label used in logs and errors ("YuNet", "FER+").
    name: &'static str,
}

impl OnnxModel {
    /// Load `model_path`, pinning its first input to `input_shape`.
    ///
    /// An optimized plan is tried first; if tract cannot optimize the graph the
    /// decluttered (slower) plan is used instead.
    ///
    /// # Arguments
    ///
    /// * `model_path` - Path to the `.onnx` file. It must exist.
    /// * `name` - Label for log lines and error messages.
    /// * `input_shape` - Fixed `[N, C, H, W]` shape of the first input.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing, cannot be parsed, or neither plan can
    /// be built.
    pub fn load<P: AsRef<Path>>(
        model_path: P,
        name: &'static str,
        input_shape: [usize; 4],
    ) -> Result<Self> {
        let path = model_path.as_ref();
        anyhow::ensure!(
            path.exists(),
            "{name} model file not found: {}",
            path.display()
        );

        let runnable = match load_runnable(path, input_shape, true) {
            Ok(model) => {
                debug!(
                    "{name} model {} optimized for input {:?}",
                    path.display(),
                    input_shape
                );
                model
            }
            Err(opt_err) => {
                let mut chain = String::new();
                for cause in opt_err.chain() {
                    let _ = writeln!(&mut chain, "  - {cause}");
                }
                warn!(
                    "{name} model {} could not be optimized; using decluttered graph.\n{}",
                    path.display(),
                    chain.trim_end()
                );
                load_runnable(path, input_shape, false).with_context(|| {
                    format!("decluttered {name} graph failed after optimize error: {opt_err}")
                })?
            }
        };

        Ok(Self { runnable, name })
    }

    /// Run the graph on `input` and return every output tensor.
    pub fn run(&self, input: Tensor) -> Result<Vec<Tensor>> {
        let outputs = self
            .runnable
            .run(tvec![input.into()])
            .map_err(|e| anyhow::anyhow!("{} execution failed: {e}", self.name))?;
        Ok(outputs.into_iter().map(|v| v.into_tensor()).collect())
    }
}

fn load_runnable(path: &Path, input_shape: [usize; 4], optimized: bool) -> Result<RunnableModel> {
    let model = tract_onnx::onnx()
        .model_for_path(path)
        .with_context(|| format!("failed to parse ONNX graph from {}", path.display()))?
        .with_input_fact(0, f32::fact(input_shape).into())
        .map_err(|e| anyhow::anyhow!("unable to pin input shape {input_shape:?}: {e}"))?;

    if optimized {
        model
            .into_optimized()
            .map_err(|e| anyhow::anyhow!("unable to optimize graph: {e}"))?
            .into_runnable()
            .map_err(|e| anyhow::anyhow!("unable to make graph runnable: {e}"))
    } else {
        model
            .into_typed()
            .map_err(|e| anyhow::anyhow!("unable to type-check graph: {e}"))?
            .into_decluttered()
            .map_err(|e| anyhow::anyhow!("unable to declutter graph: {e}"))?
            .into_runnable()
            .map_err(|e| anyhow::anyhow!("unable to make graph runnable: {e}"))
    }
}
