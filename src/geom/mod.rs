//! Box geometry and the pixel/normalized codec.
//!
//! Boxes drawn by the user live in pixel space ([`PixelBox`]); boxes written
//! to label files are normalized, class-indexed [`BoundingBox`] records. The
//! [`Pixel`] and [`Normalized`] markers keep the two apart at compile time,
//! and [`codec`] is the only bridge between them.
//!
//! ```
//! use cavelabel::config::ClassId;
//! use cavelabel::geom::{codec, FrameSize, PixelBox};
//!
//! let frame = FrameSize::new(640, 480);
//! let drawn = PixelBox::from_xyxy(100.0, 100.0, 300.0, 300.0);
//! let record = codec::encode(&drawn, frame, ClassId::new(1)).unwrap();
//! assert_eq!(record.to_string(), "1 0.312500 0.416667 0.312500 0.416667");
//! ```

mod bbox;
pub mod codec;
mod record;
mod space;

pub use bbox::BBoxXYXY;
pub use codec::{FrameSize, PixelBox};
pub use record::{BoundingBox, LABEL_PRECISION, NORMALIZED_EPSILON};
pub use space::{Normalized, Pixel};
