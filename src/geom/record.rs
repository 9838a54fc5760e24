//! The normalized, class-indexed box record stored one per label line.

use std::fmt;

use super::{BBoxXYXY, Normalized};
use crate::config::ClassId;

/// Slack allowed when checking normalized values against `[0, 1]`.
///
/// Values are serialized with six decimals, so an edge-aligned box can
/// overshoot the frame by up to half a unit in the last place.
pub const NORMALIZED_EPSILON: f64 = 1e-5;

/// Decimal places used when writing normalized values.
pub const LABEL_PRECISION: usize = 6;

/// One object: class id plus normalized center and size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub class_id: ClassId,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl BoundingBox {
    pub fn new(class_id: impl Into<ClassId>, cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self {
            class_id: class_id.into(),
            cx,
            cy,
            w,
            h,
        }
    }

    /// The same box as normalized XYXY.
    pub fn to_xyxy(&self) -> BBoxXYXY<Normalized> {
        BBoxXYXY::from_cxcywh(self.cx, self.cy, self.w, self.h)
    }

    /// Describes the first geometric invariant this box violates, if any.
    pub fn geometry_problem(&self) -> Option<String> {
        let fields = [("cx", self.cx), ("cy", self.cy), ("w", self.w), ("h", self.h)];
        for (name, value) in fields {
            if !value.is_finite() {
                return Some(format!("{name} is not a finite number"));
            }
            if !(-NORMALIZED_EPSILON..=1.0 + NORMALIZED_EPSILON).contains(&value) {
                return Some(format!("{name} {value} is outside [0, 1]"));
            }
        }

        if self.w <= 0.0 || self.h <= 0.0 {
            return Some(format!(
                "degenerate box: width {} and height {} must be positive",
                self.w, self.h
            ));
        }

        let extent = self.to_xyxy();
        if extent.xmin < -NORMALIZED_EPSILON
            || extent.ymin < -NORMALIZED_EPSILON
            || extent.xmax > 1.0 + NORMALIZED_EPSILON
            || extent.ymax > 1.0 + NORMALIZED_EPSILON
        {
            return Some("box extends outside the image frame".to_string());
        }

        None
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.geometry_problem().is_none()
    }
}

/// Renders the on-disk form: `class_id cx cy w h`.
impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.prec$} {:.prec$} {:.prec$} {:.prec$}",
            self.class_id,
            self.cx,
            self.cy,
            self.w,
            self.h,
            prec = LABEL_PRECISION
        )
    }
}
