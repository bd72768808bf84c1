use common::span;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::RgbImage;
use ndarray::{Array, IxDyn};

const LETTERBOX_COLOR: u8 = 114;

pub struct PreProcessor {
    pub input_size: (u32, u32),
    rgb_buffer: Vec<u8>,
    letterboxed_buffer: Vec<u8>,
}

impl PreProcessor {
    pub fn new(input_size: (u32, u32)) -> Self {
        Self {
            input_size,
            rgb_buffer: Vec::with_capacity(1920 * 1080 * 3),
            letterboxed_buffer: vec![LETTERBOX_COLOR; (input_size.0 * input_size.1 * 3) as usize],
        }
    }

    /// Letterbox an RGB image into the model input size and lay it out as a
    /// [1, 3, H, W] tensor scaled to [0, 1].
    ///
    /// Returns the tensor together with the scale and padding offsets needed
    /// to map box coordinates back to the source image.
    pub fn preprocess(
        &mut self,
        image: &RgbImage,
    ) -> anyhow::Result<(Array<f32, IxDyn>, f32, f32, f32)> {
        let _s = span!("preprocess_image");

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            anyhow::bail!("Cannot preprocess an empty image ({}x{})", width, height);
        }

        self.rgb_buffer.clear();
        self.rgb_buffer.extend_from_slice(image.as_raw());

        let (scale, offset_x, offset_y, letterboxed) = self.resize_and_letterbox(width, height)?;

        let input = Self::to_tensor(&letterboxed)?;

        Ok((input, scale, offset_x, offset_y))
    }

    fn resize_and_letterbox(
        &mut self,
        width: u32,
        height: u32,
    ) -> anyhow::Result<(f32, f32, f32, Image<'_>)> {
        let _s = span!("resize_and_letterbox");

        let scale =
            (self.input_size.0 as f32 / width as f32).min(self.input_size.1 as f32 / height as f32);
        let new_width = (width as f32 * scale) as u32;
        let new_height = (height as f32 * scale) as u32;

        let offset_x = (self.input_size.0 - new_width) / 2;
        let offset_y = (self.input_size.1 - new_height) / 2;

        let src = Image::from_slice_u8(width, height, &mut self.rgb_buffer, PixelType::U8x3)?;

        let mut resized = Image::new(new_width, new_height, PixelType::U8x3);

        Resizer::new().resize(
            &src,
            &mut resized,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        )?;

        self.letterboxed_buffer.fill(LETTERBOX_COLOR);

        let resized_data = resized.buffer();
        let stride = self.input_size.0 * 3;

        for y in 0..new_height {
            let src_row = (y * new_width * 3) as usize;
            let dst_row = ((y + offset_y) * stride + offset_x * 3) as usize;

            self.letterboxed_buffer[dst_row..dst_row + (new_width * 3) as usize]
                .copy_from_slice(&resized_data[src_row..src_row + (new_width * 3) as usize]);
        }

        let final_img = Image::from_slice_u8(
            self.input_size.0,
            self.input_size.1,
            &mut self.letterboxed_buffer,
            PixelType::U8x3,
        )?;

        Ok((scale, offset_x as f32, offset_y as f32, final_img))
    }

    fn to_tensor(image: &Image) -> anyhow::Result<Array<f32, IxDyn>> {
        let _s = span!("to_tensor");

        let width = image.width() as usize;
        let height = image.height() as usize;
        let spatial = width * height;

        let mut output = vec![0.0f32; 3 * spatial];
        let buf = image.buffer();

        for (i, px) in buf.chunks_exact(3).enumerate() {
            output[i] = px[0] as f32 / 255.0;
            output[i + spatial] = px[1] as f32 / 255.0;
            output[i + 2 * spatial] = px[2] as f32 / 255.0;
        }

        Ok(Array::from_shape_vec(
            IxDyn(&[1, 3, height, width]),
            output,
        )?)
    }
}

impl Default for PreProcessor {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_INPUT_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn output_shape_matches_input_size() {
        let image = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));

        let mut preprocessor = PreProcessor::default();
        let (output, _, _, _) = preprocessor.preprocess(&image).unwrap();

        assert_eq!(output.shape(), &[1, 3, 640, 640]);
    }

    #[test]
    fn letterboxing_preserves_aspect_ratio() {
        // 800x600 image (4:3 aspect ratio)
        let image = RgbImage::from_pixel(800, 600, Rgb([128, 128, 128]));

        let mut preprocessor = PreProcessor::default();
        let (output, scale, offset_x, offset_y) = preprocessor.preprocess(&image).unwrap();

        // Scale should be min(640/800, 640/600) = 0.8
        assert_eq!(scale, 0.8, "Scale should preserve aspect ratio");

        // Resized dimensions: 800*0.8 = 640, 600*0.8 = 480
        // Offset X: (640 - 640) / 2 = 0
        // Offset Y: (640 - 480) / 2 = 80
        assert_eq!(offset_x, 0.0, "X offset should be 0 for wide image");
        assert_eq!(offset_y, 80.0, "Y offset should center vertically");

        assert_eq!(output.shape(), &[1, 3, 640, 640]);
    }

    #[test]
    fn pixel_values_are_scaled_to_unit_range() {
        let image = RgbImage::from_pixel(640, 640, Rgb([128, 64, 255]));

        let mut preprocessor = PreProcessor::default();
        let (output, _, _, _) = preprocessor.preprocess(&image).unwrap();

        let r = output[[0, 0, 320, 320]];
        let g = output[[0, 1, 320, 320]];
        let b = output[[0, 2, 320, 320]];

        assert!((r - 128.0 / 255.0).abs() < 1e-6, "R should be 128/255 (got {})", r);
        assert!((g - 64.0 / 255.0).abs() < 1e-6, "G should be 64/255 (got {})", g);
        assert!((b - 1.0).abs() < 1e-6, "B should be 255/255 (got {})", b);
    }

    #[test]
    fn padding_uses_letterbox_fill() {
        // Wide image leaves horizontal bands of padding at top and bottom
        let image = RgbImage::from_pixel(640, 320, Rgb([0, 0, 0]));

        let mut preprocessor = PreProcessor::default();
        let (output, _, _, offset_y) = preprocessor.preprocess(&image).unwrap();

        assert_eq!(offset_y, 160.0);

        // Top-left corner lies in the padded band
        let padded = output[[0, 0, 0, 0]];
        assert!(
            (padded - 114.0 / 255.0).abs() < 1e-6,
            "Padding should carry the letterbox fill (got {})",
            padded
        );

        // Center lies inside the image content
        let content = output[[0, 0, 320, 320]];
        assert!(content.abs() < 1e-6, "Content should be black (got {})", content);
    }

    #[test]
    fn empty_image_is_rejected() {
        let image = RgbImage::new(0, 0);

        let mut preprocessor = PreProcessor::default();
        assert!(preprocessor.preprocess(&image).is_err());
    }
}
