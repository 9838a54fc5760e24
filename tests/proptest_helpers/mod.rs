#![allow(dead_code)]

use cavelabel::geom::{FrameSize, PixelBox};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// Round-trip tolerance in pixels for a frame: the label file keeps six
/// decimals of the normalized value.
pub fn eps_pixels(frame: FrameSize) -> f64 {
    frame.width.max(frame.height) as f64 * 1e-4
}

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_frame() -> BoxedStrategy<FrameSize> {
    (1u32..=4096, 1u32..=4096)
        .prop_map(|(w, h)| FrameSize::new(w, h))
        .boxed()
}

/// A box at least one pixel wide and tall, fully inside `frame`.
pub fn arb_box_within(frame: FrameSize) -> BoxedStrategy<PixelBox> {
    let width = frame.width as f64;
    let height = frame.height as f64;
    (0.0..1.0f64, 0.0..1.0f64, 0.0..1.0f64, 0.0..1.0f64)
        .prop_map(move |(sx, sy, sw, sh)| {
            let w = 1.0 + sw * (width - 1.0);
            let h = 1.0 + sh * (height - 1.0);
            let xmin = sx * (width - w);
            let ymin = sy * (height - h);
            PixelBox::from_xyxy(xmin, ymin, xmin + w, ymin + h)
        })
        .boxed()
}

/// A frame with a handful of boxes inside it.
pub fn arb_frame_with_boxes(max_boxes: usize) -> BoxedStrategy<(FrameSize, Vec<PixelBox>)> {
    arb_frame()
        .prop_flat_map(move |frame| {
            (
                Just(frame),
                prop::collection::vec(arb_box_within(frame), 0..=max_boxes),
            )
        })
        .boxed()
}

/// Drag gestures in pixel space that may overhang, miss, or collapse on
/// the frame.
pub fn arb_drags(max_drags: usize) -> BoxedStrategy<Vec<((f64, f64), (f64, f64))>> {
    let point = (-500.0..5000.0f64, -500.0..5000.0f64);
    prop::collection::vec((point.clone(), point), 0..=max_drags).boxed()
}

pub fn assert_boxes_close(a: &PixelBox, b: &PixelBox, eps: f64) -> Result<(), String> {
    let pairs = [
        ("xmin", a.xmin, b.xmin),
        ("ymin", a.ymin, b.ymin),
        ("xmax", a.xmax, b.xmax),
        ("ymax", a.ymax, b.ymax),
    ];
    for (name, left, right) in pairs {
        if (left - right).abs() > eps {
            return Err(format!("{name} differs: {left} vs {right} (eps {eps})"));
        }
    }
    Ok(())
}
