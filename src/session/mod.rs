//! In-memory labelling state for a single image.
//!
//! A session holds the committed boxes for one image, the class new boxes
//! get, an optional box being drawn, and the undo/redo history. Geometry is
//! validated when a draft is finished, so everything in
//! [`AnnotationSession::committed_boxes`] is already fit to be written and
//! [`AnnotationSession::commit`] cannot fail for geometric reasons.

mod history;

pub use history::{History, HistoryConfig};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ClassId, ClassList};
use crate::error::LabelError;
use crate::geom::{codec, BoundingBox, FrameSize, PixelBox};
use crate::store::LabelStore;

/// A box being drawn: the corner where dragging started and the current
/// opposite corner, in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Draft {
    pub anchor: (f64, f64),
    pub corner: (f64, f64),
}

impl Draft {
    pub fn pixel_box(&self) -> PixelBox {
        PixelBox::from_corners(self.anchor, self.corner)
    }
}

#[derive(Debug, Clone)]
pub struct AnnotationSession {
    classes: Arc<ClassList>,
    frame: FrameSize,
    committed: Vec<BoundingBox>,
    active_class: ClassId,
    draft: Option<Draft>,
    history: History,
    dirty: bool,
}

impl AnnotationSession {
    /// Starts an empty session for an image of the given size. The first
    /// configured class is active.
    pub fn new(classes: Arc<ClassList>, frame: FrameSize) -> Self {
        Self {
            classes,
            frame,
            committed: Vec::new(),
            active_class: ClassId::new(0),
            draft: None,
            history: History::new(),
            dirty: false,
        }
    }

    /// Starts a session seeded with boxes loaded from an existing label file.
    ///
    /// The active class becomes the class of the last box, matching what
    /// the user was most recently labelling on this image.
    pub fn with_boxes(
        classes: Arc<ClassList>,
        frame: FrameSize,
        boxes: Vec<BoundingBox>,
    ) -> Result<Self, LabelError> {
        for bbox in &boxes {
            if !classes.contains(bbox.class_id) {
                return Err(LabelError::UnknownClass {
                    class: bbox.class_id.to_string(),
                });
            }
            if let Some(problem) = bbox.geometry_problem() {
                return Err(LabelError::invalid_geometry(problem));
            }
        }

        let mut session = Self::new(classes, frame);
        if let Some(last) = boxes.last() {
            session.active_class = last.class_id;
        }
        session.committed = boxes;
        Ok(session)
    }

    pub fn with_history_config(mut self, config: HistoryConfig) -> Self {
        self.history = History::with_config(config);
        self
    }

    pub fn frame(&self) -> FrameSize {
        self.frame
    }

    pub fn classes(&self) -> &ClassList {
        &self.classes
    }

    pub fn committed_boxes(&self) -> &[BoundingBox] {
        &self.committed
    }

    pub fn active_class(&self) -> ClassId {
        self.active_class
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    /// True if the boxes changed since the session opened or last committed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Opens a draft anchored at `(x, y)`. Returns false, leaving the open
    /// draft untouched, if one is already being drawn.
    pub fn begin_box(&mut self, x: f64, y: f64) -> bool {
        if self.draft.is_some() {
            return false;
        }
        self.draft = Some(Draft {
            anchor: (x, y),
            corner: (x, y),
        });
        true
    }

    /// Moves the draft's opposite corner. Returns false if no draft is open.
    pub fn update_box(&mut self, x: f64, y: f64) -> bool {
        match self.draft.as_mut() {
            Some(draft) => {
                draft.corner = (x, y);
                true
            }
            None => false,
        }
    }

    /// Drops the open draft without committing it.
    pub fn cancel_draft(&mut self) -> bool {
        self.draft.take().is_some()
    }

    /// Turns the open draft into a committed box of the active class.
    ///
    /// Returns the new box's index, or `None` if no draft was open. The
    /// draft is cut to the image frame first; if nothing usable is left it
    /// is discarded and the error is returned for the caller to show.
    pub fn finish_box(&mut self) -> Result<Option<usize>, LabelError> {
        let Some(draft) = self.draft.take() else {
            return Ok(None);
        };

        let encoded = codec::clamp_to_frame(&draft.pixel_box(), self.frame)
            .and_then(|clamped| codec::encode(&clamped, self.frame, self.active_class));

        let bbox = match encoded {
            Ok(bbox) => bbox,
            Err(err) => {
                log::warn!("discarded draft {:?}: {err}", draft.pixel_box());
                return Err(err);
            }
        };

        self.record();
        self.committed.push(bbox);
        Ok(Some(self.committed.len() - 1))
    }

    /// Removes and returns the box at `index`.
    pub fn delete_box(&mut self, index: usize) -> Result<BoundingBox, LabelError> {
        if index >= self.committed.len() {
            return Err(LabelError::IndexOutOfRange {
                index,
                len: self.committed.len(),
            });
        }
        self.record();
        Ok(self.committed.remove(index))
    }

    /// Removes every committed box as one undoable step. Returns how many
    /// boxes were removed.
    pub fn clear(&mut self) -> usize {
        if self.committed.is_empty() {
            return 0;
        }
        self.record();
        let removed = self.committed.len();
        self.committed.clear();
        removed
    }

    /// Restores the boxes as they were before the last mutation. A no-op
    /// returning false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.committed) {
            Some(previous) => {
                self.committed = previous;
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Re-applies the last undone mutation.
    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.committed) {
            Some(next) => {
                self.committed = next;
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn set_active_class(&mut self, class_id: ClassId) -> Result<(), LabelError> {
        if !self.classes.contains(class_id) {
            return Err(LabelError::UnknownClass {
                class: class_id.to_string(),
            });
        }
        self.active_class = class_id;
        Ok(())
    }

    /// Writes the committed boxes as the label file for `image_path`,
    /// replacing whatever was there. Returns the label file path.
    pub fn commit(
        &mut self,
        image_path: &Path,
        store: &LabelStore,
    ) -> Result<PathBuf, LabelError> {
        let label_path = store.label_path_for(image_path);
        store.save(&label_path, &self.committed)?;
        self.dirty = false;
        log::info!(
            "committed {} box(es) for {} to {}",
            self.committed.len(),
            image_path.display(),
            label_path.display()
        );
        Ok(label_path)
    }

    fn record(&mut self) {
        self.history.record(&self.committed);
        self.dirty = true;
    }
}
