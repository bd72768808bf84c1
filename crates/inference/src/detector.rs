use crate::{
    backend::DetectionBackend,
    config::DetectorConfig,
    processing::{
        post::{PostProcessor, RawDetection, TransformParams},
        pre::PreProcessor,
    },
};
use image::RgbImage;
use std::sync::Mutex;

/// Process-wide handle to the loaded detection model.
///
/// Built once at startup and shared read-only across requests via `Arc`.
/// The ONNX session needs exclusive access for each run, so calls are
/// serialized through an internal mutex; callers only ever see `&self`.
pub struct Detector<B> {
    inner: Mutex<DetectorInner<B>>,
    postprocessor: PostProcessor,
    config: DetectorConfig,
}

struct DetectorInner<B> {
    backend: B,
    preprocessor: PreProcessor,
}

impl<B: DetectionBackend> Detector<B> {
    pub fn new(backend: B, config: DetectorConfig) -> Self {
        let postprocessor = PostProcessor::new(config.confidence_threshold, config.iou_threshold);
        let preprocessor = PreProcessor::new(config.input_size);
        Self {
            inner: Mutex::new(DetectorInner {
                backend,
                preprocessor,
            }),
            postprocessor,
            config,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Run the full model-side pipeline on an RGB image.
    ///
    /// Returns detections in original-image pixel coordinates, or `None`
    /// when the model produced no prediction output at all. This is a
    /// blocking call; async callers dispatch it to a worker thread.
    pub fn predict(&self, image: &RgbImage) -> anyhow::Result<Option<Vec<RawDetection>>> {
        let (width, height) = image.dimensions();

        let (raw, scale, offset_x, offset_y) = {
            let mut inner = self
                .inner
                .lock()
                .map_err(|_| anyhow::anyhow!("Detector lock poisoned"))?;

            let (input, scale, offset_x, offset_y) = inner.preprocessor.preprocess(image)?;

            let raw = {
                let _infer_span = tracing::info_span!("model_inference").entered();
                inner.backend.infer(&input)?
            };

            (raw, scale, offset_x, offset_y)
        };

        let Some(raw) = raw else {
            return Ok(None);
        };

        let transform = TransformParams {
            orig_width: width,
            orig_height: height,
            scale,
            offset_x,
            offset_y,
        };

        let detections = self
            .postprocessor
            .parse_detections(&raw.preds.view(), &transform)?;

        tracing::debug!(
            width,
            height,
            detections = detections.len(),
            "Image processed"
        );

        Ok(Some(detections))
    }
}
