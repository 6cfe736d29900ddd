use super::types::{CategoryMask, NormalizedPoint, QueryBasis, SegmentationResult};
use super::SegmentationEngine;
use crate::error::{Result, StickerError};
use crate::media::{rasterize, MediaObject};
use crate::output::{extract, ExtractOptions, ImageArtifact, OverlayRenderer};
use crate::surface::Surface;
use image::RgbaImage;

/// Identifies one issued query and the raster size its answer must match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket {
    pub token: u64,
    pub dimensions: (u32, u32),
}

/// A query that has been issued but not yet answered
#[derive(Debug, Clone)]
pub struct PendingQuery {
    ticket: QueryTicket,
    raster: RgbaImage,
    basis: QueryBasis,
}

impl PendingQuery {
    pub fn ticket(&self) -> QueryTicket {
        self.ticket
    }

    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    pub fn basis(&self) -> &QueryBasis {
        &self.basis
    }
}

/// Outcome of handing an engine response back to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// The response was current and is now the latest mask
    Applied,
    /// A newer query or newer input superseded this response
    Stale { token: u64 },
}

/// State of one interactive selection: accumulated input, the latest mask
/// and the token of the only query whose answer is still wanted.
///
/// Start a new session (or call [`reset`](Self::reset)) when the user moves
/// on to a different source image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentationSession {
    basis: Option<QueryBasis>,
    latest_mask: Option<CategoryMask>,
    generation: u64,
    current_token: Option<u64>,
    last_input: Option<NormalizedPoint>,
    overlay: Option<Surface>,
    renderer: OverlayRenderer,
}

impl SegmentationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_renderer(renderer: OverlayRenderer) -> Self {
        Self {
            renderer,
            ..Self::default()
        }
    }

    /// Point mode: the click becomes the whole query, scribbles are dropped
    pub fn record_click(&mut self, point: NormalizedPoint) {
        tracing::debug!("Click at ({:.3}, {:.3})", point.x, point.y);
        self.basis = Some(QueryBasis::Point(point));
        self.note_input(point);
    }

    /// Scribble mode: append in input order; a previous click is dropped
    pub fn record_scribble(&mut self, point: NormalizedPoint) {
        match &mut self.basis {
            Some(QueryBasis::Scribble(points)) => points.push(point),
            _ => self.basis = Some(QueryBasis::Scribble(vec![point])),
        }
        self.note_input(point);
    }

    /// Forget input, mask and any pending query, and clear the overlay.
    /// Calling this on a fresh session changes nothing.
    pub fn reset(&mut self) {
        if self.basis.is_some() || self.latest_mask.is_some() || self.current_token.is_some() {
            tracing::debug!("Resetting segmentation session");
        }
        self.basis = None;
        self.latest_mask = None;
        self.current_token = None;
        self.last_input = None;
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.clear();
        }
    }

    pub fn basis(&self) -> Option<&QueryBasis> {
        self.basis.as_ref()
    }

    /// Accumulated scribble samples; empty in point mode
    pub fn scribbles(&self) -> &[NormalizedPoint] {
        match &self.basis {
            Some(QueryBasis::Scribble(points)) => points,
            _ => &[],
        }
    }

    pub fn latest_mask(&self) -> Option<&CategoryMask> {
        self.latest_mask.as_ref()
    }

    pub fn last_input(&self) -> Option<NormalizedPoint> {
        self.last_input
    }

    /// Token of the query whose answer would currently be accepted
    pub fn pending_token(&self) -> Option<u64> {
        self.current_token
    }

    /// Issue a query: rasterize `media` at its own size and snapshot the
    /// current input under a fresh token. Any earlier pending query is
    /// superseded.
    pub fn begin_query(
        &mut self,
        engine: &dyn SegmentationEngine,
        media: &dyn MediaObject,
    ) -> Result<PendingQuery> {
        if !engine.is_ready() {
            tracing::warn!("Segmentation requested before the engine finished loading");
            return Err(StickerError::EngineNotReady);
        }
        let basis = match &self.basis {
            Some(basis) if !basis.is_empty() => basis.clone(),
            _ => return Err(StickerError::EmptyQuery),
        };

        let raster = rasterize(media).into_image();

        self.generation += 1;
        self.current_token = Some(self.generation);

        let ticket = QueryTicket {
            token: self.generation,
            dimensions: raster.dimensions(),
        };
        tracing::debug!(
            "Issued query {} at {}x{}",
            ticket.token,
            ticket.dimensions.0,
            ticket.dimensions.1
        );

        Ok(PendingQuery {
            ticket,
            raster,
            basis,
        })
    }

    /// Hand an engine response back. Responses for anything but the most
    /// recently issued (and not since superseded) query are discarded.
    pub fn commit(
        &mut self,
        ticket: QueryTicket,
        response: Result<SegmentationResult>,
    ) -> Result<Commit> {
        if self.current_token != Some(ticket.token) {
            tracing::debug!(
                "Discarding stale response for query {} (current {:?})",
                ticket.token,
                self.current_token
            );
            return Ok(Commit::Stale {
                token: ticket.token,
            });
        }
        self.current_token = None;

        let mask = response?
            .category_mask
            .ok_or(StickerError::NoMaskAvailable)?;
        if mask.dimensions() != ticket.dimensions {
            return Err(StickerError::DimensionMismatch {
                expected: ticket.dimensions,
                actual: mask.dimensions(),
            });
        }

        tracing::debug!(
            "Query {} selected {} pixels",
            ticket.token,
            mask.selected_count()
        );
        self.latest_mask = Some(mask);
        Ok(Commit::Applied)
    }

    /// Run one query to completion and keep its mask
    pub async fn request_segmentation(
        &mut self,
        engine: &dyn SegmentationEngine,
        media: &dyn MediaObject,
    ) -> Result<&CategoryMask> {
        let pending = self.begin_query(engine, media)?;
        let response = engine.segment(pending.raster(), pending.basis()).await;

        match self.commit(pending.ticket(), response)? {
            Commit::Applied => self.latest_mask.as_ref().ok_or(StickerError::NoMaskAvailable),
            // Unreachable while `self` is borrowed for the whole call
            Commit::Stale { .. } => Err(StickerError::NoMaskAvailable),
        }
    }

    /// Attach the surface the highlight overlay is drawn into
    pub fn attach_overlay(&mut self, surface: Surface) {
        self.overlay = Some(surface);
    }

    pub fn overlay(&self) -> Option<&Surface> {
        self.overlay.as_ref()
    }

    pub fn detach_overlay(&mut self) -> Option<Surface> {
        self.overlay.take()
    }

    /// Redraw the overlay from the latest mask, then mark the last input
    /// position on top of it
    pub fn redraw_overlay(&mut self) -> Result<usize> {
        let painted = self
            .renderer
            .render(self.latest_mask.as_ref(), self.overlay.as_mut())?;

        if let (Some(point), Some(surface)) = (self.last_input, self.overlay.as_mut()) {
            let (x, y) = point.to_pixel(surface.width(), surface.height());
            self.renderer.render_input_marker(Some(surface), x, y)?;
        }

        Ok(painted)
    }

    /// Cut the latest selection out of `media` into a new image
    pub fn extract(&self, media: &dyn MediaObject, options: &ExtractOptions) -> Result<ImageArtifact> {
        extract(media, self.latest_mask.as_ref(), options)
    }

    fn note_input(&mut self, point: NormalizedPoint) {
        self.last_input = Some(point);
        // New input makes any in-flight answer obsolete
        self.current_token = None;
    }
}
