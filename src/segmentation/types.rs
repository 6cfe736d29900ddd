use crate::error::{Result, StickerError};

/// An input sample in the source image's own [0, 1] x [0, 1] space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPoint {
    pub x: f32,
    pub y: f32,
}

impl NormalizedPoint {
    /// Values outside [0, 1] are clamped onto the image edge
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        }
    }

    /// Pixel position of this point in a raster of the given size
    pub fn to_pixel(self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }
}

/// A raw pointer event as reported by the display element.
///
/// The element may be displayed at a different size than the surface it
/// shows, so positions are rescaled before they are related to any object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
    pub element_width: f32,
    pub element_height: f32,
}

impl PointerSample {
    /// Position in surface pixels for a surface of the given size
    pub fn to_surface(&self, surface_width: u32, surface_height: u32) -> (f32, f32) {
        let scale_x = if self.element_width > 0.0 {
            surface_width as f32 / self.element_width
        } else {
            1.0
        };
        let scale_y = if self.element_height > 0.0 {
            surface_height as f32 / self.element_height
        } else {
            1.0
        };
        (self.x * scale_x, self.y * scale_y)
    }
}

/// What a query asks the engine to segment around
#[derive(Debug, Clone, PartialEq)]
pub enum QueryBasis {
    /// A single foreground click
    Point(NormalizedPoint),
    /// Scribble samples in input order
    Scribble(Vec<NormalizedPoint>),
}

impl QueryBasis {
    pub fn points(&self) -> &[NormalizedPoint] {
        match self {
            QueryBasis::Point(point) => std::slice::from_ref(point),
            QueryBasis::Scribble(points) => points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points().is_empty()
    }
}

/// True when a score falls in the selected class.
///
/// The selected class is score zero: anything that rounds to 0 on a 0..255
/// scale is foreground, everything else (including NaN) is background.
#[inline]
pub fn is_foreground(score: f32) -> bool {
    (score * 255.0).round() == 0.0
}

/// Per-pixel category scores from the engine, row-major
/// (`index = y * width + x`).
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMask {
    width: u32,
    height: u32,
    scores: Vec<f32>,
}

impl CategoryMask {
    /// Wrap a flat score buffer. Both sides must be non-zero and the length
    /// must equal `width * height`.
    pub fn new(width: u32, height: u32, scores: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 || scores.len() != width as usize * height as usize {
            return Err(StickerError::InvalidMask {
                width,
                height,
                len: scores.len(),
            });
        }
        Ok(Self {
            width,
            height,
            scores,
        })
    }

    pub fn from_fn(width: u32, height: u32, mut score: impl FnMut(u32, u32) -> f32) -> Self {
        let mut scores = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                scores.push(score(x, y));
            }
        }
        Self {
            width,
            height,
            scores,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Pixel position of a flat index: `x = index % width`,
    /// `y = (index - x) / width`
    #[inline]
    pub fn index_to_xy(&self, index: usize) -> (u32, u32) {
        let width = self.width as usize;
        let x = index % width;
        let y = (index - x) / width;
        (x as u32, y as u32)
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.scores.get(index).copied().is_some_and(is_foreground)
    }

    /// Flat indices of every selected pixel, ascending
    pub fn selected_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.scores
            .iter()
            .enumerate()
            .filter(|(_, score)| is_foreground(**score))
            .map(|(index, _)| index)
    }

    pub fn selected_count(&self) -> usize {
        self.selected_indices().count()
    }

    /// Inclusive-exclusive bounding box `(x0, y0, x1, y1)` of the selection
    pub fn selection_bounds(&self) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for index in self.selected_indices() {
            let (x, y) = self.index_to_xy(index);
            bounds = Some(match bounds {
                None => (x, y, x + 1, y + 1),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x + 1), y1.max(y + 1)),
            });
        }
        bounds
    }

    /// Nearest-neighbour resample to a new size; the selected/unselected
    /// class of every output pixel is taken from exactly one input pixel
    pub fn resample(&self, width: u32, height: u32) -> Result<CategoryMask> {
        super::Preprocessor::postprocess_scores(&self.scores, self.width, self.height, width, height)
    }
}

/// What the engine hands back for one query
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SegmentationResult {
    /// Category mask at the query raster's size; absent when the engine
    /// produced nothing usable
    pub category_mask: Option<CategoryMask>,
}

impl SegmentationResult {
    pub fn with_mask(mask: CategoryMask) -> Self {
        Self {
            category_mask: Some(mask),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreground_is_score_zero_after_rounding() {
        assert!(is_foreground(0.0));
        assert!(is_foreground(0.0015));
        assert!(!is_foreground(0.002));
        assert!(!is_foreground(1.0));
        assert!(!is_foreground(255.0));
        assert!(!is_foreground(f32::NAN));
    }

    #[test]
    fn index_mapping_is_row_major_including_last_pixel() {
        let mask = CategoryMask::from_fn(3, 2, |_, _| 1.0);

        assert_eq!(mask.index_to_xy(0), (0, 0));
        assert_eq!(mask.index_to_xy(2), (2, 0));
        assert_eq!(mask.index_to_xy(3), (0, 1));
        assert_eq!(mask.index_to_xy(5), (2, 1));
    }

    #[test]
    fn wrong_buffer_length_is_rejected() {
        let err = CategoryMask::new(2, 2, vec![0.0; 3]).unwrap_err();
        assert!(matches!(
            err,
            StickerError::InvalidMask {
                width: 2,
                height: 2,
                len: 3
            }
        ));
    }

    #[test]
    fn zero_sized_mask_is_rejected() {
        for (width, height) in [(0, 0), (0, 3), (3, 0)] {
            let err = CategoryMask::new(width, height, vec![]).unwrap_err();
            assert!(matches!(err, StickerError::InvalidMask { len: 0, .. }));
        }
    }

    #[test]
    fn empty_mask_cannot_be_resampled() {
        let empty = CategoryMask::from_fn(0, 3, |_, _| 0.0);
        assert!(matches!(
            empty.resample(2, 2),
            Err(StickerError::InvalidMask { .. })
        ));
    }

    #[test]
    fn selection_bounds_cover_selected_pixels() {
        let mask = CategoryMask::from_fn(5, 5, |x, y| {
            if (1..=2).contains(&x) && (2..=4).contains(&y) {
                0.0
            } else {
                1.0
            }
        });

        assert_eq!(mask.selected_count(), 6);
        assert_eq!(mask.selection_bounds(), Some((1, 2, 3, 5)));
        assert_eq!(CategoryMask::from_fn(2, 2, |_, _| 1.0).selection_bounds(), None);
    }

    #[test]
    fn pointer_is_rescaled_from_element_to_surface() {
        let sample = PointerSample {
            x: 50.0,
            y: 25.0,
            element_width: 100.0,
            element_height: 50.0,
        };
        assert_eq!(sample.to_surface(200, 100), (100.0, 50.0));
    }

    #[test]
    fn normalized_points_are_clamped() {
        let point = NormalizedPoint::new(-0.5, 1.5);
        assert_eq!((point.x, point.y), (0.0, 1.0));
    }
}
