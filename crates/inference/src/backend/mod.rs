use ndarray::{Array, IxDyn};

#[cfg(feature = "ort-backend")]
pub mod ort;

pub trait DetectionBackend {
    fn load_model(path: &str) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Run the model on a preprocessed NCHW input tensor.
    ///
    /// `Ok(None)` means the session ran but produced no prediction output.
    /// Callers treat it the same as a model that returned no boxes.
    fn infer(&mut self, input: &Array<f32, IxDyn>) -> anyhow::Result<Option<RawPredictions>>;
}

pub struct RawPredictions {
    /// [1, 4 + num_classes, num_anchors] - cxcywh box channels in input
    /// pixels followed by per-class scores
    pub preds: ndarray::ArrayD<f32>,
}
