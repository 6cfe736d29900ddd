use super::types::{is_foreground, CategoryMask, QueryBasis};
use crate::error::{Result, StickerError};
use image::{imageops, GrayImage, Luma, RgbaImage};
use ndarray::Array4;

/// Channel index of the prompt map in the preprocessed tensor
pub const PROMPT_CHANNEL: usize = 3;

const DEFAULT_PROMPT_RADIUS: f32 = 3.0;

/// Preprocessor for converting a raster plus its query into a model input
/// tensor, and model output back into a category mask
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
    prompt_radius: f32,
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
            prompt_radius: DEFAULT_PROMPT_RADIUS,
        }
    }

    pub fn with_prompt_radius(mut self, radius: f32) -> Self {
        self.prompt_radius = radius.max(0.0);
        self
    }

    pub fn target_size(&self) -> (u32, u32) {
        (self.target_width, self.target_height)
    }

    /// Preprocess an RGBA raster and query basis into a normalized NCHW tensor
    ///
    /// Steps:
    /// 1. Resize to target dimensions
    /// 2. Convert RGB to float and normalize to [0, 1] (alpha is dropped)
    /// 3. Paint the query basis into a fourth "prompt" channel: a disc per
    ///    point, with consecutive scribble points joined into a stroke
    ///
    /// Returns: Array4<f32> with shape [1, 4, height, width]
    pub fn preprocess(&self, raster: &RgbaImage, basis: &QueryBasis) -> Array4<f32> {
        let _span = tracing::debug_span!("preprocess").entered();

        let resized = if raster.dimensions() != (self.target_width, self.target_height) {
            imageops::resize(
                raster,
                self.target_width,
                self.target_height,
                imageops::FilterType::Lanczos3,
            )
        } else {
            raster.clone()
        };

        let (width, height) = resized.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 4, height as usize, width as usize));

        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            tensor[[0, 0, y, x]] = pixel[0] as f32 / 255.0;
            tensor[[0, 1, y, x]] = pixel[1] as f32 / 255.0;
            tensor[[0, 2, y, x]] = pixel[2] as f32 / 255.0;
        }

        self.paint_prompt(&mut tensor, basis, width, height);

        tensor
    }

    fn paint_prompt(&self, tensor: &mut Array4<f32>, basis: &QueryBasis, width: u32, height: u32) {
        let to_pixel = |point: &super::NormalizedPoint| {
            let (x, y) = point.to_pixel(width, height);
            (
                x.min(width.saturating_sub(1) as f32),
                y.min(height.saturating_sub(1) as f32),
            )
        };

        let points: Vec<(f32, f32)> = basis.points().iter().map(to_pixel).collect();
        if let Some(&(x, y)) = points.first() {
            self.stamp(tensor, x, y);
        }

        for pair in points.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
            for step in 1..=steps {
                let t = step as f32 / steps as f32;
                self.stamp(tensor, x0 + (x1 - x0) * t, y0 + (y1 - y0) * t);
            }
        }
    }

    fn stamp(&self, tensor: &mut Array4<f32>, cx: f32, cy: f32) {
        let height = tensor.shape()[2] as i64;
        let width = tensor.shape()[3] as i64;
        let r = self.prompt_radius;
        let r2 = r * r;
        // Snap to the nearest pixel so a zero radius still marks one pixel
        let (cx, cy) = (cx.round(), cy.round());

        let (x0, x1) = ((cx - r).floor() as i64, (cx + r).ceil() as i64);
        let (y0, y1) = ((cy - r).floor() as i64, (cy + r).ceil() as i64);

        for y in y0.max(0)..=y1.min(height - 1) {
            for x in x0.max(0)..=x1.min(width - 1) {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if dx * dx + dy * dy <= r2 {
                    tensor[[0, PROMPT_CHANNEL, y as usize, x as usize]] = 1.0;
                }
            }
        }
    }

    /// Postprocess flat model scores back to the query raster's dimensions
    ///
    /// Category scores are resampled nearest-neighbour so that every output
    /// pixel keeps the exact class of one input pixel.
    ///
    /// Returns: CategoryMask of `target_width` x `target_height`
    pub fn postprocess_scores(
        scores: &[f32],
        mask_width: u32,
        mask_height: u32,
        target_width: u32,
        target_height: u32,
    ) -> Result<CategoryMask> {
        let _span = tracing::debug_span!("postprocess").entered();

        // Validate the buffer before indexing into it; an empty source has
        // no class to carry over and must not resample into a selection
        let source = CategoryMask::new(mask_width, mask_height, scores.to_vec())?;
        if target_width == 0 || target_height == 0 {
            return Err(StickerError::InvalidMask {
                width: target_width,
                height: target_height,
                len: 0,
            });
        }
        if source.dimensions() == (target_width, target_height) {
            return Ok(source);
        }

        // Foreground maps to exactly 0; background never rounds down to 0
        let gray_image = GrayImage::from_fn(mask_width, mask_height, |x, y| {
            let idx = (y * mask_width + x) as usize;
            let score = source.scores()[idx];
            let value = if is_foreground(score) {
                0
            } else if score.is_nan() {
                255
            } else {
                (score * 255.0).round().clamp(1.0, 255.0) as u8
            };
            Luma([value])
        });

        let resized = imageops::resize(
            &gray_image,
            target_width,
            target_height,
            imageops::FilterType::Nearest,
        );

        let output: Vec<f32> = resized.pixels().map(|p| p[0] as f32 / 255.0).collect();

        CategoryMask::new(target_width, target_height, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::NormalizedPoint;
    use image::Rgba;

    #[test]
    fn tensor_has_rgb_and_prompt_channels() {
        let raster = RgbaImage::from_pixel(8, 4, Rgba([255, 0, 51, 255]));
        let basis = QueryBasis::Point(NormalizedPoint::new(0.5, 0.5));

        let tensor = Preprocessor::new(8, 4)
            .with_prompt_radius(0.0)
            .preprocess(&raster, &basis);

        assert_eq!(tensor.shape(), &[1, 4, 4, 8]);
        assert_eq!(tensor[[0, 0, 0, 0]], 1.0);
        assert_eq!(tensor[[0, 1, 0, 0]], 0.0);
        assert!((tensor[[0, 2, 0, 0]] - 0.2).abs() < 1e-6);
        assert_eq!(tensor[[0, PROMPT_CHANNEL, 2, 4]], 1.0);
        assert_eq!(tensor.index_axis(ndarray::Axis(1), PROMPT_CHANNEL).sum(), 1.0);
    }

    #[test]
    fn scribble_points_are_joined_into_a_stroke() {
        let raster = RgbaImage::new(10, 1);
        let basis = QueryBasis::Scribble(vec![
            NormalizedPoint::new(0.0, 0.0),
            NormalizedPoint::new(0.9, 0.0),
        ]);

        let tensor = Preprocessor::new(10, 1)
            .with_prompt_radius(0.0)
            .preprocess(&raster, &basis);

        for x in 0..10 {
            assert_eq!(tensor[[0, PROMPT_CHANNEL, 0, x]], 1.0, "gap at x={x}");
        }
    }

    #[test]
    fn postprocess_keeps_classes_exact() {
        let scores = vec![0.0, 0.9, 0.001, 0.3];
        let mask = Preprocessor::postprocess_scores(&scores, 2, 2, 4, 4).unwrap();

        assert_eq!(mask.dimensions(), (4, 4));
        assert_eq!(mask.selected_count(), 8);
        assert!(mask.is_selected(0));
        assert!(!mask.is_selected(2));
        assert!(mask.is_selected(8));
        assert!(mask
            .scores()
            .iter()
            .all(|s| is_foreground(*s) || (*s * 255.0).round() >= 1.0));
    }

    #[test]
    fn postprocess_rejects_empty_buffers() {
        let err = Preprocessor::postprocess_scores(&[], 0, 0, 2, 2).unwrap_err();
        assert!(matches!(err, StickerError::InvalidMask { len: 0, .. }));

        let err = Preprocessor::postprocess_scores(&[0.0], 1, 1, 0, 4).unwrap_err();
        assert!(matches!(err, StickerError::InvalidMask { width: 0, .. }));
    }

    #[test]
    fn postprocess_passes_through_matching_size() {
        let scores = vec![0.0, 1.0];
        let mask = Preprocessor::postprocess_scores(&scores, 2, 1, 2, 1).unwrap();
        assert_eq!(mask.scores(), &[0.0, 1.0]);
    }
}
