mod flood;
mod preprocess;
mod session;
pub mod types;

pub use flood::{FloodConfig, FloodEngine};
pub use preprocess::{Preprocessor, PROMPT_CHANNEL};
pub use session::{Commit, PendingQuery, QueryTicket, SegmentationSession};
pub use types::{
    is_foreground, CategoryMask, NormalizedPoint, PointerSample, QueryBasis, SegmentationResult,
};

use crate::error::Result;
use async_trait::async_trait;
use image::RgbaImage;

/// Where the engine should run its model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionHint {
    #[default]
    Cpu,
    Gpu,
}

/// Trait for interactive segmentation engines
/// Allows swapping between backends (a local heuristic, an ONNX model, a
/// remote service) without touching the session
#[async_trait]
pub trait SegmentationEngine: Send + Sync {
    /// Load the model and prepare for queries
    ///
    /// Queries issued before this completes are rejected with
    /// `EngineNotReady`, never queued.
    async fn initialize(&mut self, model_location: &str, hint: ExecutionHint) -> Result<()>;

    /// Whether `initialize` has completed successfully
    fn is_ready(&self) -> bool;

    /// Segment `raster` around the given query
    ///
    /// # Returns
    /// * A result whose category mask, when present, has the raster's
    ///   dimensions and marks the selected region with score zero
    async fn segment(&self, raster: &RgbaImage, basis: &QueryBasis) -> Result<SegmentationResult>;
}
