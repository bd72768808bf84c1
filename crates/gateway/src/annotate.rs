use ab_glyph::{FontRef, PxScale};
use common::span;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use inference::{RawDetection, classes};
use serde::Serialize;
use std::io::Cursor;

/// Display-time confidence cutoff. The model call already filters at its
/// own stricter threshold (0.45, see `inference::config`) before results
/// reach this layer; with default settings this looser filter passes
/// everything through and only bites when the detector is built with a
/// lower call-time cutoff.
pub const DISPLAY_CONFIDENCE_THRESHOLD: f32 = 0.25;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const FONT_SCALE: f32 = 16.0;
const BOX_THICKNESS: i32 = 2;

static FONT_DATA: &[u8] = include_bytes!("../assets/font.ttf");

/// One detection as reported to clients.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bbox: [i32; 4],
}

pub struct ProcessedOutput {
    pub detections: Vec<Detection>,
    pub annotated_jpeg: Option<Vec<u8>>,
}

pub struct Annotator {
    font: FontRef<'static>,
    confidence_threshold: f32,
}

impl Annotator {
    pub fn new(confidence_threshold: f32) -> anyhow::Result<Self> {
        let font = FontRef::try_from_slice(FONT_DATA)
            .map_err(|e| anyhow::anyhow!("Failed to load embedded font: {e}"))?;
        Ok(Self {
            font,
            confidence_threshold,
        })
    }

    /// Filter raw detections, draw labeled boxes onto a copy of the image,
    /// and encode the copy as JPEG.
    ///
    /// `raw` is `None` when the model produced no box container at all; in
    /// that case nothing is drawn or encoded. A present-but-empty detection
    /// set still yields an annotated (unmarked) copy.
    pub fn process(
        &self,
        raw: Option<&[RawDetection]>,
        image: &RgbImage,
    ) -> anyhow::Result<ProcessedOutput> {
        let Some(raw) = raw else {
            return Ok(ProcessedOutput {
                detections: Vec::new(),
                annotated_jpeg: None,
            });
        };

        let _s = span!("annotate_detections");

        let mut canvas = image.clone();
        let mut detections = Vec::with_capacity(raw.len());

        for det in raw {
            if det.confidence < self.confidence_threshold {
                continue;
            }

            // Truncating casts, matching how clients expect integer pixels
            let x1 = det.x1 as i32;
            let y1 = det.y1 as i32;
            let x2 = det.x2 as i32;
            let y2 = det.y2 as i32;

            let label = classes::class_name(det.class_id)
                .map(str::to_string)
                .unwrap_or_else(|| det.class_id.to_string());

            self.draw_box(&mut canvas, x1, y1, x2, y2);
            self.draw_label(&mut canvas, &label, det.confidence, x1, y1);

            detections.push(Detection {
                label,
                confidence: det.confidence,
                bbox: [x1, y1, x2, y2],
            });
        }

        let annotated_jpeg = encode_jpeg(&canvas)?;

        Ok(ProcessedOutput {
            detections,
            annotated_jpeg: Some(annotated_jpeg),
        })
    }

    fn draw_box(&self, canvas: &mut RgbImage, x1: i32, y1: i32, x2: i32, y2: i32) {
        for t in 0..BOX_THICKNESS {
            let w = (x2 - x1) - 2 * t;
            let h = (y2 - y1) - 2 * t;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(x1 + t, y1 + t).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(canvas, rect, BOX_COLOR);
        }
    }

    fn draw_label(&self, canvas: &mut RgbImage, label: &str, confidence: f32, x1: i32, y1: i32) {
        let text = format!("{} {:.2}", label, confidence);
        let scale = PxScale::from(FONT_SCALE);

        let (text_w, text_h) = text_size(scale, &self.font, &text);
        let (text_w, text_h) = (text_w as i32, text_h as i32);
        if text_w <= 0 || text_h <= 0 {
            return;
        }

        // Above the box when there is vertical room, else just under the
        // top edge so labels near the canvas top stay visible
        let text_y = if y1 - text_h > 0 { y1 - text_h } else { y1 + 2 };

        let background = Rect::at(x1, text_y).of_size(text_w as u32, text_h as u32);
        draw_filled_rect_mut(canvas, background, BOX_COLOR);
        draw_text_mut(canvas, TEXT_COLOR, x1, text_y, scale, &self.font, &text);
    }
}

pub fn encode_jpeg(image: &RgbImage) -> anyhow::Result<Vec<u8>> {
    let mut jpeg_bytes = Cursor::new(Vec::new());
    image.write_to(&mut jpeg_bytes, image::ImageFormat::Jpeg)?;
    Ok(jpeg_bytes.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32, class_id: usize) -> RawDetection {
        RawDetection {
            x1,
            y1,
            x2,
            y2,
            confidence,
            class_id,
        }
    }

    fn annotator() -> Annotator {
        Annotator::new(DISPLAY_CONFIDENCE_THRESHOLD).unwrap()
    }

    fn test_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([200, 30, 30]))
    }

    #[test]
    fn missing_box_container_takes_fast_path() {
        let image = test_image(64, 64);

        let output = annotator().process(None, &image).unwrap();

        assert!(output.detections.is_empty());
        assert!(output.annotated_jpeg.is_none());
    }

    #[test]
    fn empty_detections_still_produce_annotated_image() {
        let image = test_image(100, 100);

        let output = annotator().process(Some(&[]), &image).unwrap();

        assert!(output.detections.is_empty());
        let jpeg = output.annotated_jpeg.expect("annotated image expected");
        let decoded = image::load_from_memory(&jpeg).expect("valid JPEG expected");
        assert_eq!(decoded.width(), 100);
        assert_eq!(decoded.height(), 100);
    }

    #[test]
    fn detections_below_threshold_are_dropped() {
        let image = test_image(200, 200);
        let raw_dets = [
            raw(10.0, 10.0, 50.0, 50.0, 0.9, 0),
            raw(60.0, 60.0, 100.0, 100.0, 0.2, 1),
            raw(110.0, 110.0, 150.0, 150.0, 0.25, 2),
        ];

        let output = annotator().process(Some(&raw_dets), &image).unwrap();

        let labels: Vec<&str> = output.detections.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["person", "car"], "0.2 dropped, boundary 0.25 kept");
        for det in &output.detections {
            assert!(det.confidence >= DISPLAY_CONFIDENCE_THRESHOLD);
        }
    }

    #[test]
    fn equal_confidence_detections_keep_model_order() {
        let image = test_image(200, 200);
        let raw_dets = [
            raw(10.0, 10.0, 50.0, 50.0, 0.50, 2),
            raw(100.0, 100.0, 150.0, 150.0, 0.50, 0),
        ];

        let annotator = Annotator::new(0.45).unwrap();
        let output = annotator.process(Some(&raw_dets), &image).unwrap();

        assert_eq!(output.detections.len(), 2, "Both retained at threshold 0.45");
        assert_eq!(output.detections[0].label, "car");
        assert_eq!(output.detections[1].label, "person");
    }

    #[test]
    fn coordinates_are_truncated_not_rounded() {
        let image = test_image(200, 200);
        let raw_dets = [raw(10.9, 11.7, 50.2, 60.999, 0.9, 0)];

        let output = annotator().process(Some(&raw_dets), &image).unwrap();

        assert_eq!(output.detections[0].bbox, [10, 11, 50, 60]);
    }

    #[test]
    fn box_coordinates_stay_ordered() {
        let image = test_image(300, 300);
        let raw_dets = [
            raw(10.0, 10.0, 50.0, 50.0, 0.9, 0),
            raw(200.5, 100.5, 280.9, 250.1, 0.8, 16),
        ];

        let output = annotator().process(Some(&raw_dets), &image).unwrap();

        for det in &output.detections {
            let [x1, y1, x2, y2] = det.bbox;
            assert!(x1 <= x2);
            assert!(y1 <= y2);
        }
    }

    #[test]
    fn unmapped_class_falls_back_to_stringified_index() {
        let image = test_image(100, 100);
        let raw_dets = [raw(10.0, 10.0, 50.0, 50.0, 0.9, 999)];

        let output = annotator().process(Some(&raw_dets), &image).unwrap();

        assert_eq!(output.detections[0].label, "999");
    }

    #[test]
    fn annotated_image_preserves_input_dimensions() {
        let image = test_image(320, 240);
        let raw_dets = [raw(10.0, 10.0, 100.0, 100.0, 0.9, 0)];

        let output = annotator().process(Some(&raw_dets), &image).unwrap();

        let jpeg = output.annotated_jpeg.unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 240));
    }

    #[test]
    fn original_image_is_not_mutated() {
        let image = test_image(100, 100);
        let before = image.clone();
        let raw_dets = [raw(10.0, 10.0, 90.0, 90.0, 0.9, 0)];

        annotator().process(Some(&raw_dets), &image).unwrap();

        assert_eq!(image, before);
    }

    #[test]
    fn drawing_marks_the_box_outline() {
        let image = test_image(200, 200);
        let raw_dets = [raw(50.0, 80.0, 150.0, 160.0, 0.9, 0)];

        let output = annotator().process(Some(&raw_dets), &image).unwrap();

        let jpeg = output.annotated_jpeg.unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap().to_rgb8();
        // JPEG is lossy; just require the outline pixel to be clearly green
        let px = decoded.get_pixel(100, 80);
        assert!(
            px[1] > 150 && px[1] > px[0] && px[1] > px[2],
            "Expected green outline at the box top edge, got {:?}",
            px
        );
    }

    #[test]
    fn label_near_top_edge_is_drawn_below_it() {
        // A box flush with the canvas top leaves no room above; the label
        // background must land inside the canvas rather than be clipped away
        let image = test_image(200, 200);
        let raw_dets = [raw(20.0, 0.0, 120.0, 80.0, 0.9, 0)];

        let output = annotator().process(Some(&raw_dets), &image).unwrap();

        let jpeg = output.annotated_jpeg.unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap().to_rgb8();
        // The filled label background starts 2px under the top edge; some
        // pixels in that band are glyph ink, so scan for the green fill
        let found_fill = (21..40)
            .flat_map(|x| (3..8).map(move |y| (x, y)))
            .any(|(x, y)| {
                let px = decoded.get_pixel(x, y);
                px[1] > 150 && px[1] > px[0] && px[1] > px[2]
            });
        assert!(found_fill, "Expected label background below the top edge");
    }

    #[test]
    fn degenerate_box_is_reported_but_not_drawn() {
        let image = test_image(100, 100);
        let raw_dets = [raw(40.0, 40.0, 40.0, 40.0, 0.9, 0)];

        let output = annotator().process(Some(&raw_dets), &image).unwrap();

        // Still reported to the client; drawing skips the zero-area rect
        assert_eq!(output.detections.len(), 1);
        assert!(output.annotated_jpeg.is_some());
    }

    #[test]
    fn detection_serializes_with_box_key() {
        let det = Detection {
            label: "person".to_string(),
            confidence: 0.87,
            bbox: [1, 2, 3, 4],
        };

        let json = serde_json::to_value(&det).unwrap();
        assert_eq!(json["label"], "person");
        assert_eq!(json["box"], serde_json::json!([1, 2, 3, 4]));
    }
}
