//! End-to-end: click on an object, segment, highlight, cut out, re-place.

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use std::sync::Arc;
use std::time::Duration;
use stickerfx::media::{ImageObject, MediaObject};
use stickerfx::output::{ExtractOptions, MismatchPolicy};
use stickerfx::segmentation::{
    CategoryMask, Commit, ExecutionHint, FloodEngine, NormalizedPoint, QueryBasis,
    SegmentationEngine, SegmentationResult, SegmentationSession,
};
use stickerfx::surface::Surface;
use stickerfx::{Result, StickerError};

const BACKGROUND: Rgba<u8> = Rgba([240, 240, 240, 255]);
const SUBJECT: Rgba<u8> = Rgba([30, 140, 60, 255]);

/// 12x8 light canvas with a green 6x6 square at (3, 1)
fn scene() -> RgbaImage {
    RgbaImage::from_fn(12, 8, |x, y| {
        if (3..9).contains(&x) && (1..7).contains(&y) {
            SUBJECT
        } else {
            BACKGROUND
        }
    })
}

/// Selects the pixel under the query point only, after an optional delay
struct SinglePixelEngine {
    delay: Duration,
}

#[async_trait]
impl SegmentationEngine for SinglePixelEngine {
    async fn initialize(&mut self, _: &str, _: ExecutionHint) -> Result<()> {
        Ok(())
    }

    fn is_ready(&self) -> bool {
        true
    }

    async fn segment(&self, raster: &RgbaImage, basis: &QueryBasis) -> Result<SegmentationResult> {
        tokio::time::sleep(self.delay).await;
        let (width, height) = raster.dimensions();
        let (px, py) = basis.points()[0].to_pixel(width, height);
        let (px, py) = (px as u32, py as u32);
        Ok(SegmentationResult::with_mask(CategoryMask::from_fn(
            width,
            height,
            |x, y| if (x, y) == (px, py) { 0.0 } else { 1.0 },
        )))
    }
}

#[tokio::test]
async fn click_to_sticker() {
    let mut engine = FloodEngine::default();
    let object = ImageObject::new(100.0, 50.0, 12.0, 8.0, Arc::new(scene()));
    let mut session = SegmentationSession::new();

    let point = NormalizedPoint::new(0.5, 0.5);
    session.record_click(point);

    let err = session
        .request_segmentation(&engine, &object)
        .await
        .unwrap_err();
    assert!(matches!(err, StickerError::EngineNotReady));

    engine.initialize("builtin", ExecutionHint::Cpu).await.unwrap();
    let mask = session
        .request_segmentation(&engine, &object)
        .await
        .unwrap();
    assert_eq!(mask.dimensions(), (12, 8));
    assert_eq!(mask.selected_count(), 36);

    session.attach_overlay(Surface::new(1, 1));
    let painted = session.redraw_overlay().unwrap();
    assert_eq!(painted, 36);
    let overlay = session.overlay().unwrap();
    assert_eq!(overlay.dimensions(), (12, 8));
    assert_eq!(overlay.pixel(0, 0).map(|p| p[3]), Some(0));

    let artifact = session
        .extract(
            &object,
            &ExtractOptions {
                trim: true,
                ..ExtractOptions::default()
            },
        )
        .unwrap();
    assert_eq!(artifact.dimensions(), (6, 6));
    assert!(artifact.to_data_uri().starts_with("data:image/png;base64,"));

    let mut sticker = artifact.into_media_object(300.0, 10.0).unwrap();
    assert!(sticker.source().pixels().all(|p| *p == SUBJECT));
    sticker.frame_mut().resize(8.0, 8.0);
    assert_eq!(sticker.frame().handles()[3].x, 308.0 - 10.0);
    assert_eq!(object.frame().x(), 100.0);
}

#[tokio::test]
async fn resized_object_needs_resample() {
    let engine = SinglePixelEngine {
        delay: Duration::ZERO,
    };
    let mut object = ImageObject::new(0.0, 0.0, 12.0, 8.0, Arc::new(scene()));
    let mut session = SegmentationSession::new();
    session.record_click(NormalizedPoint::new(0.0, 0.0));
    session
        .request_segmentation(&engine, &object)
        .await
        .unwrap();

    object.frame_mut().resize(24.0, 16.0);

    let err = session
        .extract(&object, &ExtractOptions::default())
        .unwrap_err();
    assert!(matches!(err, StickerError::DimensionMismatch { .. }));

    let cut = session
        .extract(
            &object,
            &ExtractOptions {
                on_mismatch: MismatchPolicy::Resample,
                trim: false,
            },
        )
        .unwrap()
        .decode()
        .unwrap();
    assert_eq!(cut.dimensions(), (24, 16));
    let kept = cut.pixels().filter(|p| p[3] > 0).count();
    assert_eq!(kept, 4);
}

#[tokio::test]
async fn out_of_order_responses_keep_newest_mask() {
    let slow = SinglePixelEngine {
        delay: Duration::from_millis(40),
    };
    let fast = SinglePixelEngine {
        delay: Duration::ZERO,
    };
    let object = ImageObject::new(0.0, 0.0, 12.0, 8.0, Arc::new(scene()));
    let mut session = SegmentationSession::new();

    session.record_click(NormalizedPoint::new(0.0, 0.0));
    let first = session.begin_query(&slow, &object).unwrap();
    session.record_click(NormalizedPoint::new(0.5, 0.5));
    let second = session.begin_query(&fast, &object).unwrap();

    let (first_response, second_response) = tokio::join!(
        slow.segment(first.raster(), first.basis()),
        fast.segment(second.raster(), second.basis()),
    );

    assert_eq!(
        session.commit(second.ticket(), second_response).unwrap(),
        Commit::Applied
    );
    assert!(matches!(
        session.commit(first.ticket(), first_response).unwrap(),
        Commit::Stale { .. }
    ));

    let mask = session.latest_mask().unwrap();
    assert!(mask.is_selected(4 * 12 + 6));
    assert!(!mask.is_selected(0));
}
