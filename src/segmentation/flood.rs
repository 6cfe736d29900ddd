use super::preprocess::{Preprocessor, PROMPT_CHANNEL};
use super::types::{CategoryMask, QueryBasis, SegmentationResult};
use super::{ExecutionHint, SegmentationEngine};
use crate::error::{Result, StickerError};
use async_trait::async_trait;
use image::RgbaImage;
use ndarray::Array4;
use std::collections::VecDeque;

const SELECTED: f32 = 0.0;
const UNSELECTED: f32 = 1.0;

/// Tuning for [`FloodEngine`]
#[derive(Debug, Clone, PartialEq)]
pub struct FloodConfig {
    /// Maximum colour distance (0..1, normalized RGB euclidean) from the seed
    /// colour for a pixel to join the region
    pub tolerance: f32,
    /// Radius of each prompt point in working pixels
    pub prompt_radius: f32,
    /// Resolution to segment at; `None` segments at the raster's own size
    pub working_size: Option<(u32, u32)>,
}

impl Default for FloodConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.12,
            prompt_radius: 2.0,
            working_size: None,
        }
    }
}

/// Reference engine: grows a region outward from the prompt pixels over
/// neighbours of similar colour.
///
/// It consumes the same [1, 4, H, W] tensor a model-backed engine would, so
/// the preprocessing path is shared.
pub struct FloodEngine {
    config: FloodConfig,
    hint: Option<ExecutionHint>,
}

impl FloodEngine {
    pub fn new(config: FloodConfig) -> Self {
        Self { config, hint: None }
    }

    pub fn config(&self) -> &FloodConfig {
        &self.config
    }

    /// Preprocess, grow and map the scores back to the raster's size. CPU
    /// bound; `segment` runs it on the blocking pool.
    fn run(config: &FloodConfig, raster: &RgbaImage, basis: &QueryBasis) -> Result<CategoryMask> {
        let _span = tracing::debug_span!("flood_segment").entered();

        let (raster_width, raster_height) = raster.dimensions();
        let (width, height) = config.working_size.unwrap_or((raster_width, raster_height));

        let tensor = Preprocessor::new(width, height)
            .with_prompt_radius(config.prompt_radius)
            .preprocess(raster, basis);
        let scores = Self::grow(config.tolerance, &tensor);

        let mask = Preprocessor::postprocess_scores(&scores, width, height, raster_width, raster_height)?;
        tracing::debug!(
            "Flood selected {} of {} pixels",
            mask.selected_count(),
            mask.len()
        );
        Ok(mask)
    }

    fn grow(tolerance: f32, tensor: &Array4<f32>) -> Vec<f32> {
        let height = tensor.shape()[2];
        let width = tensor.shape()[3];
        let color = |x: usize, y: usize| {
            [
                tensor[[0, 0, y, x]],
                tensor[[0, 1, y, x]],
                tensor[[0, 2, y, x]],
            ]
        };

        let mut scores = vec![UNSELECTED; width * height];
        let mut queue = VecDeque::new();

        for y in 0..height {
            for x in 0..width {
                if tensor[[0, PROMPT_CHANNEL, y, x]] > 0.5 {
                    let index = y * width + x;
                    scores[index] = SELECTED;
                    queue.push_back((x, y, color(x, y)));
                }
            }
        }

        // Each pixel is compared against the seed that reached it first, so a
        // scribble across two colours grows both regions
        let limit = tolerance * tolerance * 3.0;
        while let Some((x, y, seed)) = queue.pop_front() {
            let neighbours = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            for (nx, ny) in neighbours {
                if nx >= width || ny >= height {
                    continue;
                }
                let index = ny * width + nx;
                if scores[index] == SELECTED {
                    continue;
                }
                let c = color(nx, ny);
                let distance: f32 = (0..3).map(|i| (c[i] - seed[i]).powi(2)).sum();
                if distance <= limit {
                    scores[index] = SELECTED;
                    queue.push_back((nx, ny, seed));
                }
            }
        }

        scores
    }
}

impl Default for FloodEngine {
    fn default() -> Self {
        Self::new(FloodConfig::default())
    }
}

#[async_trait]
impl SegmentationEngine for FloodEngine {
    async fn initialize(&mut self, model_location: &str, hint: ExecutionHint) -> Result<()> {
        // No weights to load; the location is accepted for interface parity
        tracing::info!(
            "Flood engine ready (model location {:?}, hint {:?})",
            model_location,
            hint
        );
        self.hint = Some(hint);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.hint.is_some()
    }

    async fn segment(&self, raster: &RgbaImage, basis: &QueryBasis) -> Result<SegmentationResult> {
        if !self.is_ready() {
            return Err(StickerError::EngineNotReady);
        }
        if basis.is_empty() {
            return Err(StickerError::Engine("query has no points".into()));
        }

        let config = self.config.clone();
        let raster = raster.clone();
        let basis = basis.clone();
        let mask = tokio::task::spawn_blocking(move || Self::run(&config, &raster, &basis))
            .await
            .map_err(|e| StickerError::Engine(format!("flood task failed: {e}")))??;

        Ok(SegmentationResult::with_mask(mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::NormalizedPoint;
    use image::Rgba;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Left half red, right half blue
    fn split_image() -> RgbaImage {
        RgbaImage::from_fn(10, 6, |x, _| {
            if x < 5 {
                Rgba([220, 20, 20, 255])
            } else {
                Rgba([20, 20, 220, 255])
            }
        })
    }

    async fn ready_engine(config: FloodConfig) -> FloodEngine {
        let mut engine = FloodEngine::new(config);
        engine.initialize("builtin", ExecutionHint::Cpu).await.unwrap();
        engine
    }

    #[tokio::test]
    async fn rejects_queries_before_initialize() {
        let engine = FloodEngine::default();
        let basis = QueryBasis::Point(NormalizedPoint::new(0.5, 0.5));

        let err = engine.segment(&split_image(), &basis).await.unwrap_err();
        assert!(matches!(err, StickerError::EngineNotReady));
    }

    #[tokio::test]
    async fn click_selects_uniform_region_only() {
        let engine = ready_engine(FloodConfig::default()).await;
        let basis = QueryBasis::Point(NormalizedPoint::new(0.2, 0.5));

        let result = engine.segment(&split_image(), &basis).await.unwrap();
        let mask = result.category_mask.unwrap();

        assert_eq!(mask.dimensions(), (10, 6));
        for index in 0..mask.len() {
            let (x, _) = mask.index_to_xy(index);
            assert_eq!(mask.is_selected(index), x < 5, "pixel {index}");
        }
    }

    #[tokio::test]
    async fn scribble_across_edge_grows_both_sides() {
        let engine = ready_engine(FloodConfig::default()).await;
        let basis = QueryBasis::Scribble(vec![
            NormalizedPoint::new(0.1, 0.5),
            NormalizedPoint::new(0.9, 0.5),
        ]);

        let result = engine.segment(&split_image(), &basis).await.unwrap();
        assert_eq!(result.category_mask.unwrap().selected_count(), 60);
    }

    #[tokio::test]
    async fn segment_yields_to_other_tasks() {
        let engine = ready_engine(FloodConfig::default()).await;
        let raster = RgbaImage::from_pixel(256, 256, Rgba([90, 90, 90, 255]));
        let basis = QueryBasis::Point(NormalizedPoint::new(0.5, 0.5));

        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        tokio::spawn(async move { flag.store(true, Ordering::SeqCst) });

        // The test runtime is single threaded, so the spawned task only runs
        // if segmenting awaits instead of holding the thread
        let mask = engine
            .segment(&raster, &basis)
            .await
            .unwrap()
            .category_mask
            .unwrap();

        assert_eq!(mask.selected_count(), 256 * 256);
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn working_size_is_mapped_back_to_raster_size() {
        let engine = ready_engine(FloodConfig {
            working_size: Some((5, 3)),
            prompt_radius: 0.0,
            ..FloodConfig::default()
        })
        .await;
        let basis = QueryBasis::Point(NormalizedPoint::new(0.9, 0.5));

        let mask = engine
            .segment(&split_image(), &basis)
            .await
            .unwrap()
            .category_mask
            .unwrap();

        assert_eq!(mask.dimensions(), (10, 6));
        assert!(mask.is_selected(9));
        assert!(!mask.is_selected(0));
    }
}
