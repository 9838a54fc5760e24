//! Conversion between pixel-space boxes and normalized label records.
//!
//! Pure functions only; nothing here touches the filesystem.

use super::{BBoxXYXY, BoundingBox, Pixel};
use crate::config::ClassId;
use crate::error::LabelError;

/// A box in image pixel coordinates.
pub type PixelBox = BBoxXYXY<Pixel>;

/// Smallest normalized width or height that survives serialization.
const MIN_NORMALIZED_SIZE: f64 = 1e-6;

/// Image dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The whole frame as a pixel box anchored at the origin.
    pub fn bounds(&self) -> PixelBox {
        PixelBox::from_xyxy(0.0, 0.0, self.width as f64, self.height as f64)
    }

    fn dims(&self) -> Result<(f64, f64), LabelError> {
        if self.width == 0 || self.height == 0 {
            return Err(LabelError::invalid_geometry(format!(
                "image frame {}x{} has no area",
                self.width, self.height
            )));
        }
        Ok((self.width as f64, self.height as f64))
    }
}

impl std::fmt::Display for FrameSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Converts a pixel box to a normalized record for `class_id`.
///
/// Fails with [`LabelError::InvalidGeometry`] if the box has non-positive
/// width or height, or lies entirely outside the frame. A box that only
/// overhangs the frame is cut to the visible part.
pub fn encode(
    pixel_box: &PixelBox,
    frame: FrameSize,
    class_id: ClassId,
) -> Result<BoundingBox, LabelError> {
    let (width, height) = frame.dims()?;

    if !pixel_box.is_finite() {
        return Err(LabelError::invalid_geometry(
            "box has non-finite coordinates",
        ));
    }
    if !pixel_box.has_positive_area() {
        return Err(LabelError::invalid_geometry(format!(
            "box width {} and height {} must be positive",
            pixel_box.width(),
            pixel_box.height()
        )));
    }

    let visible = pixel_box.intersect(&frame.bounds());
    if !visible.has_positive_area() {
        return Err(LabelError::invalid_geometry(format!(
            "box lies entirely outside the {frame} frame"
        )));
    }

    let (cx, cy, w, h) = visible.to_normalized(width, height).to_cxcywh();
    if w < MIN_NORMALIZED_SIZE || h < MIN_NORMALIZED_SIZE {
        return Err(LabelError::invalid_geometry(
            "box is smaller than the label file precision",
        ));
    }

    Ok(BoundingBox::new(
        class_id,
        cx.clamp(0.0, 1.0),
        cy.clamp(0.0, 1.0),
        w.clamp(0.0, 1.0),
        h.clamp(0.0, 1.0),
    ))
}

/// Converts a normalized record back to pixel coordinates.
pub fn decode(bbox: &BoundingBox, frame: FrameSize) -> PixelBox {
    bbox.to_xyxy()
        .to_pixel(frame.width as f64, frame.height as f64)
}

/// Intersects a box with the image frame.
///
/// Fails with [`LabelError::DegenerateBox`] when nothing with positive area
/// is left.
pub fn clamp_to_frame(pixel_box: &PixelBox, frame: FrameSize) -> Result<PixelBox, LabelError> {
    let clamped = pixel_box.intersect(&frame.bounds());
    if clamped.has_positive_area() {
        Ok(clamped)
    } else {
        Err(LabelError::DegenerateBox)
    }
}
