pub struct TransformParams {
    pub orig_width: u32,
    pub orig_height: u32,
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// One decoded detection in original-image pixel coordinates.
#[derive(Debug, Clone)]
pub struct RawDetection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
    pub class_id: usize,
}

pub struct PostProcessor {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
}

impl PostProcessor {
    pub fn new(confidence_threshold: f32, iou_threshold: f32) -> Self {
        Self {
            confidence_threshold,
            iou_threshold,
        }
    }

    /// Parse detections from YOLO-layout predictions.
    ///
    /// Expects [1, 4 + num_classes, num_anchors]: cxcywh box channels in
    /// input pixels followed by per-class scores. Survivors are mapped back
    /// to original-image coordinates, clamped to the image bounds, and
    /// deduplicated with class-aware NMS. Output order is
    /// confidence-descending, the order the suppression emits.
    #[tracing::instrument(skip(self, preds, transform))]
    pub fn parse_detections(
        &self,
        preds: &ndarray::ArrayViewD<f32>,
        transform: &TransformParams,
    ) -> anyhow::Result<Vec<RawDetection>> {
        let shape = preds.shape();
        if shape.len() != 3 || shape[1] <= 4 {
            anyhow::bail!(
                "Unexpected prediction shape {:?}, want [1, 4 + classes, anchors]",
                shape
            );
        }

        let num_classes = shape[1] - 4;
        let num_anchors = shape[2];

        let mut detections = Vec::new();

        for a in 0..num_anchors {
            // Argmax over class channels for this anchor
            let mut confidence = f32::NEG_INFINITY;
            let mut class_id = 0usize;
            for c in 0..num_classes {
                let score = preds[[0, 4 + c, a]];
                if score > confidence {
                    confidence = score;
                    class_id = c;
                }
            }

            if confidence < self.confidence_threshold {
                continue;
            }

            // Box in cxcywh, input-pixel units
            let cx = preds[[0, 0, a]];
            let cy = preds[[0, 1, a]];
            let w = preds[[0, 2, a]];
            let h = preds[[0, 3, a]];

            let (x1_input, y1_input, x2_input, y2_input) = cxcywh_to_xyxy(cx, cy, w, h);

            // Apply inverse letterbox transform to original image coordinates
            let x1 = ((x1_input - transform.offset_x) / transform.scale)
                .max(0.0)
                .min(transform.orig_width as f32);
            let y1 = ((y1_input - transform.offset_y) / transform.scale)
                .max(0.0)
                .min(transform.orig_height as f32);
            let x2 = ((x2_input - transform.offset_x) / transform.scale)
                .max(0.0)
                .min(transform.orig_width as f32);
            let y2 = ((y2_input - transform.offset_y) / transform.scale)
                .max(0.0)
                .min(transform.orig_height as f32);

            detections.push(RawDetection {
                x1,
                y1,
                x2,
                y2,
                confidence,
                class_id,
            });
        }

        Ok(self.nms(detections))
    }

    /// Greedy class-aware non-max suppression.
    fn nms(&self, mut detections: Vec<RawDetection>) -> Vec<RawDetection> {
        detections.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut result: Vec<RawDetection> = Vec::new();

        while !detections.is_empty() {
            let best = detections.remove(0);

            detections.retain(|det| {
                det.class_id != best.class_id || iou(&best, det) < self.iou_threshold
            });

            result.push(best);
        }

        result
    }
}

#[inline]
fn cxcywh_to_xyxy(cx: f32, cy: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
    let x1 = cx - w / 2.0;
    let y1 = cy - h / 2.0;
    let x2 = cx + w / 2.0;
    let y2 = cy + h / 2.0;
    (x1, y1, x2, y2)
}

fn iou(a: &RawDetection, b: &RawDetection) -> f32 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area_a = (a.x2 - a.x1) * (a.y2 - a.y1);
    let area_b = (b.x2 - b.x1) * (b.y2 - b.y1);
    let union = area_a + area_b - intersection;

    if union > 0.0 { intersection / union } else { 0.0 }
}
