use crate::annotate::{Annotator, DISPLAY_CONFIDENCE_THRESHOLD, Detection};
use crate::metrics::Metrics;
use inference::Detector;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct PredictResponse {
    pub status: &'static str,
    pub detections: Vec<Detection>,
    /// Base64-encoded annotated JPEG, null when the model returned no boxes
    pub annotated_image: Option<String>,
}

pub struct AppState<B> {
    pub detector: Arc<Detector<B>>,
    pub annotator: Arc<Annotator>,
    pub metrics: Arc<Metrics>,
}

impl<B> AppState<B> {
    pub fn new(detector: Detector<B>) -> anyhow::Result<Self> {
        let annotator = Annotator::new(DISPLAY_CONFIDENCE_THRESHOLD)?;
        Ok(Self {
            detector: Arc::new(detector),
            annotator: Arc::new(annotator),
            metrics: Arc::new(Metrics::init()),
        })
    }
}

// Manual impl: `B` itself need not be Clone for the Arcs to be
impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            detector: self.detector.clone(),
            annotator: self.annotator.clone(),
            metrics: self.metrics.clone(),
        }
    }
}
