//! The interactive labelling loop.
//!
//! Drives one [`AnnotationSession`] at a time across the image list. The
//! loop is single-threaded and blocks on user input between commands.
//! Nothing is written except on `save` or when navigating away from an
//! image, so quitting (or losing the input stream) only discards the edits
//! to the image currently open.

mod command;

pub use command::{Command, HELP};

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ClassId, ClassList, DatasetLayout};
use crate::dataset;
use crate::error::LabelError;
use crate::geom::codec;
use crate::session::AnnotationSession;
use crate::store::LabelStore;

/// Where the controller is in its lifecycle.
#[derive(Debug)]
pub enum ControllerState {
    Idle,
    Editing {
        index: usize,
        session: AnnotationSession,
        /// The image's existing label file could not be read. Navigating
        /// away leaves it on disk until the boxes are edited or saved.
        labels_unreadable: bool,
    },
}

/// A session ready for one image, with the banner announcing it.
struct OpenedImage {
    session: AnnotationSession,
    banner: String,
    labels_unreadable: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// What to do after a command has been applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Continue(String),
    Quit(String),
}

/// Totals for one run of the loop.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Successful label file writes.
    pub commits: usize,
    /// Whether unsaved edits were dropped on exit.
    pub discarded_changes: bool,
}

pub struct Controller {
    images: Vec<PathBuf>,
    store: LabelStore,
    classes: Arc<ClassList>,
    state: ControllerState,
    commits: usize,
}

impl Controller {
    /// Creates a controller over `images`, which must not be empty.
    pub fn new(
        images: Vec<PathBuf>,
        store: LabelStore,
        classes: Arc<ClassList>,
    ) -> Result<Self, LabelError> {
        if images.is_empty() {
            return Err(LabelError::NoImages {
                path: store.labels_dir().to_path_buf(),
            });
        }
        Ok(Self {
            images,
            store,
            classes,
            state: ControllerState::Idle,
            commits: 0,
        })
    }

    /// Lists the split's images and creates its labels directory if needed.
    pub fn from_layout(
        layout: &DatasetLayout,
        classes: Arc<ClassList>,
    ) -> Result<Self, LabelError> {
        let images_dir = layout.images_dir();
        let images = dataset::list_images(&images_dir)?;
        if images.is_empty() {
            return Err(LabelError::NoImages { path: images_dir });
        }

        let labels_dir = layout.labels_dir();
        fs::create_dir_all(&labels_dir)?;
        log::debug!(
            "labelling {} image(s) from {} into {}",
            images.len(),
            images_dir.display(),
            labels_dir.display()
        );

        let store = LabelStore::new(labels_dir, classes.clone());
        Self::new(images, store, classes)
    }

    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn current_index(&self) -> Option<usize> {
        match &self.state {
            ControllerState::Editing { index, .. } => Some(*index),
            ControllerState::Idle => None,
        }
    }

    pub fn session(&self) -> Option<&AnnotationSession> {
        match &self.state {
            ControllerState::Editing { session, .. } => Some(session),
            ControllerState::Idle => None,
        }
    }

    /// Opens image `index` (0-based): `Idle -> Editing`.
    ///
    /// Images whose size cannot be read are reported and skipped, first
    /// forward and then backward from `index`. Fails with
    /// [`LabelError::NoImages`] if no image in the list can be opened.
    pub fn start(&mut self, index: usize) -> Result<String, LabelError> {
        if index >= self.images.len() {
            return Err(LabelError::IndexOutOfRange {
                index: index + 1,
                len: self.images.len(),
            });
        }

        let mut skipped = Vec::new();
        let found = match self.open_from(index, Direction::Forward, None, &mut skipped) {
            Some(found) => Some(found),
            None => index
                .checked_sub(1)
                .and_then(|before| self.open_from(before, Direction::Backward, None, &mut skipped)),
        };
        let Some((index, opened)) = found else {
            let path = self
                .images
                .first()
                .and_then(|image| image.parent())
                .map(Path::to_path_buf)
                .unwrap_or_default();
            return Err(LabelError::NoImages { path });
        };

        self.state = ControllerState::Editing {
            index,
            session: opened.session,
            labels_unreadable: opened.labels_unreadable,
        };
        skipped.push(opened.banner);
        Ok(skipped.join("\n"))
    }

    /// Reads commands from `input` until `quit` or end of input, writing
    /// feedback to `output`. Command errors are reported and the loop goes
    /// on; only failures of the streams themselves end it early.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        start: usize,
        input: R,
        mut output: W,
    ) -> Result<RunSummary, LabelError> {
        let banner = self.start(start)?;
        writeln!(output, "{banner}")?;
        writeln!(output, "Type 'help' for commands.")?;

        let mut discarded_changes = false;
        let mut lines = input.lines();
        loop {
            write!(output, "> ")?;
            output.flush()?;

            let Some(line) = lines.next().transpose()? else {
                discarded_changes = self.quit();
                log::info!("input closed; leaving without saving the open image");
                writeln!(output)?;
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(message) => {
                    writeln!(output, "error: {message}")?;
                    continue;
                }
            };

            if command == Command::Quit {
                discarded_changes = self.is_dirty();
            }

            match self.execute(command) {
                Ok(Reply::Continue(message)) => write_message(&mut output, &message)?,
                Ok(Reply::Quit(message)) => {
                    write_message(&mut output, &message)?;
                    break;
                }
                Err(err @ (LabelError::DegenerateBox | LabelError::InvalidGeometry { .. })) => {
                    writeln!(output, "warning: box discarded: {err}")?;
                }
                Err(err) => writeln!(output, "error: {err}")?,
            }
        }

        Ok(RunSummary {
            commits: self.commits,
            discarded_changes,
        })
    }

    /// Applies one command to the controller.
    pub fn execute(&mut self, command: Command) -> Result<Reply, LabelError> {
        let ControllerState::Editing {
            index,
            session,
            labels_unreadable,
        } = &mut self.state
        else {
            return Ok(Reply::Quit("no image open".to_string()));
        };
        let index = *index;

        let message = match command {
            Command::Begin { x, y } => {
                if session.begin_box(x, y) {
                    format!("box started at ({x}, {y})")
                } else {
                    "a box is already being drawn; 'finish' or 'cancel' it first".to_string()
                }
            }
            Command::Drag { x, y } => {
                if session.update_box(x, y) {
                    format!("corner at ({x}, {y})")
                } else {
                    "no box is being drawn; use 'begin X Y'".to_string()
                }
            }
            Command::Finish => match session.finish_box()? {
                Some(i) => describe_added(session, i),
                None => "no box is being drawn".to_string(),
            },
            Command::Box { x1, y1, x2, y2 } => {
                session.cancel_draft();
                session.begin_box(x1, y1);
                session.update_box(x2, y2);
                match session.finish_box()? {
                    Some(i) => describe_added(session, i),
                    None => "no box is being drawn".to_string(),
                }
            }
            Command::Cancel => {
                if session.cancel_draft() {
                    "box cancelled".to_string()
                } else {
                    "no box is being drawn".to_string()
                }
            }
            Command::Class(input) => {
                let class_id = self.classes.resolve(&input)?;
                session.set_active_class(class_id)?;
                format!(
                    "active class: {} {}",
                    class_id,
                    self.classes.name(class_id).unwrap_or_default()
                )
            }
            Command::Delete(number) => {
                let len = session.committed_boxes().len();
                let out_of_range = LabelError::IndexOutOfRange { index: number, len };
                let box_index = number.checked_sub(1).ok_or(out_of_range)?;
                let removed = session.delete_box(box_index).map_err(|err| match err {
                    LabelError::IndexOutOfRange { len, .. } => {
                        LabelError::IndexOutOfRange { index: number, len }
                    }
                    other => other,
                })?;
                format!(
                    "deleted box {number} ({})",
                    self.classes.name(removed.class_id).unwrap_or_default()
                )
            }
            Command::Undo => {
                if session.undo() {
                    format!("undone; {} box(es)", session.committed_boxes().len())
                } else {
                    "nothing to undo".to_string()
                }
            }
            Command::Redo => {
                if session.redo() {
                    format!("redone; {} box(es)", session.committed_boxes().len())
                } else {
                    "nothing to redo".to_string()
                }
            }
            Command::Clear => format!("cleared {} box(es)", session.clear()),
            Command::List => describe_boxes(session),
            Command::Classes => describe_classes(&self.classes, session),
            Command::Help => HELP.trim_end().to_string(),
            Command::Save => {
                let path = session.commit(&self.images[index], &self.store)?;
                *labels_unreadable = false;
                self.commits += 1;
                format!("saved {}", display_name(&path))
            }
            Command::Next => {
                let target = (index + 1 < self.images.len()).then_some(index + 1);
                return self.navigate(index, target, "last");
            }
            Command::Prev => return self.navigate(index, index.checked_sub(1), "first"),
            Command::Goto(number) => {
                if number == 0 || number > self.images.len() {
                    return Err(LabelError::IndexOutOfRange {
                        index: number,
                        len: self.images.len(),
                    });
                }
                return self.navigate(index, Some(number - 1), "");
            }
            Command::Quit => {
                let dirty = self.quit();
                let message = if dirty {
                    "quit; unsaved changes to this image were discarded"
                } else {
                    "quit"
                };
                return Ok(Reply::Quit(message.to_string()));
            }
        };

        Ok(Reply::Continue(message))
    }

    /// Commits the open image, then opens `target`:
    /// `Editing(i) -> Editing(target)`. With no target the controller stays
    /// on the current image, which sits at the `edge` of the list.
    ///
    /// An unreadable label file that was never edited is left on disk
    /// rather than replaced by an empty one. Unreadable images are skipped
    /// in the direction of travel; if none is left that way the controller
    /// stays put.
    fn navigate(
        &mut self,
        current: usize,
        target: Option<usize>,
        edge: &str,
    ) -> Result<Reply, LabelError> {
        let ControllerState::Editing {
            session,
            labels_unreadable,
            ..
        } = &mut self.state
        else {
            return Ok(Reply::Quit("no image open".to_string()));
        };
        let active_class = session.active_class();

        let saved = if *labels_unreadable && !session.is_dirty() {
            let label_path = self.store.label_path_for(&self.images[current]);
            log::info!("leaving unreadable {} in place", label_path.display());
            format!(
                "kept unreadable {} unchanged; 'save' replaces it",
                display_name(&label_path)
            )
        } else {
            let path = session.commit(&self.images[current], &self.store)?;
            *labels_unreadable = false;
            self.commits += 1;
            format!("saved {}", display_name(&path))
        };

        let target = match target {
            None => {
                return Ok(Reply::Continue(format!(
                    "{saved}; already at the {edge} image"
                )))
            }
            Some(target) if target == current => return Ok(Reply::Continue(saved)),
            Some(target) => target,
        };

        let direction = if target > current {
            Direction::Forward
        } else {
            Direction::Backward
        };
        let mut lines = vec![saved];
        match self.open_from(target, direction, Some(active_class), &mut lines) {
            Some((index, opened)) => {
                self.state = ControllerState::Editing {
                    index,
                    session: opened.session,
                    labels_unreadable: opened.labels_unreadable,
                };
                lines.push(opened.banner);
            }
            None => lines.push(format!(
                "no readable image {} this one; staying on image {}",
                if direction == Direction::Forward {
                    "after"
                } else {
                    "before"
                },
                current + 1
            )),
        }
        Ok(Reply::Continue(lines.join("\n")))
    }

    /// Opens the first image from `from` onwards in `direction` whose size
    /// can be read. Each image skipped on the way adds a warning to
    /// `skipped`.
    fn open_from(
        &self,
        from: usize,
        direction: Direction,
        carry_class: Option<ClassId>,
        skipped: &mut Vec<String>,
    ) -> Option<(usize, OpenedImage)> {
        let mut next = Some(from);
        while let Some(index) = next.filter(|index| *index < self.images.len()) {
            match self.open(index, carry_class) {
                Ok(opened) => return Some((index, opened)),
                Err(err) => {
                    log::warn!("skipping {}: {err}", self.images[index].display());
                    skipped.push(format!(
                        "warning: skipped {}: {err}",
                        display_name(&self.images[index])
                    ));
                }
            }
            next = match direction {
                Direction::Forward => index.checked_add(1),
                Direction::Backward => index.checked_sub(1),
            };
        }
        None
    }

    /// `Editing -> Idle`, dropping the session. Returns whether it held
    /// unsaved edits.
    fn quit(&mut self) -> bool {
        let dirty = self.is_dirty();
        self.state = ControllerState::Idle;
        dirty
    }

    fn is_dirty(&self) -> bool {
        self.session().map(AnnotationSession::is_dirty).unwrap_or(false)
    }

    /// Builds a session for image `index`, seeded from its label file.
    /// Images without usable labels start with `carry_class` active.
    fn open(
        &self,
        index: usize,
        carry_class: Option<ClassId>,
    ) -> Result<OpenedImage, LabelError> {
        let image = self.images.get(index).ok_or(LabelError::IndexOutOfRange {
            index: index + 1,
            len: self.images.len(),
        })?;
        let frame = dataset::read_frame_size(image)?;
        let label_path = self.store.label_path_for(image);

        let mut notes = Vec::new();
        let mut labels_unreadable = false;
        let fresh = || {
            let mut session = AnnotationSession::new(self.classes.clone(), frame);
            if let Some(class_id) = carry_class {
                session.set_active_class(class_id).ok();
            }
            session
        };

        let session = if self.store.exists(&label_path) {
            let loaded = self.store.load(&label_path).and_then(|boxes| {
                AnnotationSession::with_boxes(self.classes.clone(), frame, boxes)
            });
            match loaded {
                Ok(session) => {
                    notes.push(format!(
                        "loaded {} box(es) from {}",
                        session.committed_boxes().len(),
                        display_name(&label_path)
                    ));
                    session
                }
                Err(err) => {
                    log::warn!("ignoring unreadable label file {}: {err}", label_path.display());
                    notes.push(format!(
                        "warning: existing label file ignored ({err}); \
                         it is kept unless you edit or save"
                    ));
                    labels_unreadable = true;
                    fresh()
                }
            }
        } else {
            notes.push("no label file yet".to_string());
            fresh()
        };

        log::debug!("opened {} ({frame})", image.display());

        let active = session.active_class();
        let mut banner = format!(
            "Image {}/{}: {} ({frame}), class {} {}",
            index + 1,
            self.images.len(),
            display_name(image),
            active,
            self.classes.name(active).unwrap_or_default()
        );
        for note in notes {
            banner.push('\n');
            banner.push_str(&note);
        }
        Ok(OpenedImage {
            session,
            banner,
            labels_unreadable,
        })
    }
}

fn write_message<W: Write>(output: &mut W, message: &str) -> io::Result<()> {
    if message.is_empty() {
        return Ok(());
    }
    writeln!(output, "{message}")
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn describe_added(session: &AnnotationSession, index: usize) -> String {
    let bbox = session.committed_boxes()[index];
    format!(
        "added box {}: {} {}",
        index + 1,
        session.classes().name(bbox.class_id).unwrap_or_default(),
        bbox
    )
}

fn describe_boxes(session: &AnnotationSession) -> String {
    let boxes = session.committed_boxes();
    if boxes.is_empty() {
        return "no boxes".to_string();
    }

    let frame = session.frame();
    boxes
        .iter()
        .enumerate()
        .map(|(i, bbox)| {
            let px = codec::decode(bbox, frame);
            format!(
                "  {}. {} ({:.0}, {:.0})-({:.0}, {:.0})  [{}]",
                i + 1,
                session.classes().name(bbox.class_id).unwrap_or_default(),
                px.xmin,
                px.ymin,
                px.xmax,
                px.ymax,
                bbox
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn describe_classes(classes: &ClassList, session: &AnnotationSession) -> String {
    classes
        .iter()
        .map(|(id, name)| {
            let marker = if id == session.active_class() { "*" } else { " " };
            format!(" {marker}{id}: {name}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
        let row_stride = (width * 3).div_ceil(4) * 4;
        let pixel_array_size = row_stride * height;
        let file_size = 54 + pixel_array_size;

        let mut bytes = Vec::with_capacity(file_size as usize);
        bytes.extend_from_slice(b"BM");
        bytes.extend_from_slice(&file_size.to_le_bytes());
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(&54u32.to_le_bytes());
        bytes.extend_from_slice(&40u32.to_le_bytes());
        bytes.extend_from_slice(&(width as i32).to_le_bytes());
        bytes.extend_from_slice(&(height as i32).to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&24u16.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
        bytes.extend_from_slice(&2835u32.to_le_bytes());
        bytes.extend_from_slice(&2835u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.resize(file_size as usize, 0);
        bytes
    }

    struct Fixture {
        temp: tempfile::TempDir,
        controller: Controller,
    }

    impl Fixture {
        fn label(&self, name: &str) -> PathBuf {
            self.temp.path().join("labels/train").join(name)
        }
    }

    fn fixture(images: &[&str]) -> Fixture {
        let temp = tempfile::tempdir().expect("create temp dir");
        let images_dir = temp.path().join("images/train");
        fs::create_dir_all(&images_dir).expect("create images dir");
        for name in images {
            fs::write(images_dir.join(name), bmp_bytes(64, 48)).expect("write image");
        }

        let classes = Arc::new(ClassList::new(["stop_sign", "rock", "panel", "crate"]).unwrap());
        let layout = DatasetLayout::new(temp.path(), "train");
        let controller = Controller::from_layout(&layout, classes).expect("controller");
        Fixture { temp, controller }
    }

    fn run(controller: &mut Controller, script: &str) -> (RunSummary, String) {
        let mut out = Vec::new();
        let summary = controller
            .run(0, Cursor::new(script.to_string()), &mut out)
            .expect("run");
        (summary, String::from_utf8(out).expect("utf8 output"))
    }

    #[test]
    fn from_layout_creates_labels_dir() {
        let fx = fixture(&["a.bmp"]);
        assert!(fx.temp.path().join("labels/train").is_dir());
        assert_eq!(fx.controller.images().len(), 1);
        assert!(matches!(fx.controller.state(), ControllerState::Idle));
    }

    #[test]
    fn from_layout_without_images_fails() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(temp.path().join("images/train")).unwrap();
        let classes = Arc::new(ClassList::new(["rock"]).unwrap());
        let err = Controller::from_layout(&DatasetLayout::new(temp.path(), "train"), classes)
            .err()
            .expect("should fail");
        assert!(matches!(err, LabelError::NoImages { .. }));
    }

    #[test]
    fn next_commits_and_advances() {
        let mut fx = fixture(&["a.bmp", "b.bmp"]);
        let (summary, out) = run(&mut fx.controller, "class rock\nbox 16 12 48 36\nnext\n");

        assert!(out.contains("Image 1/2: a.bmp (64x48)"));
        assert!(out.contains("Image 2/2: b.bmp"));
        assert_eq!(summary.commits, 1);
        assert!(!summary.discarded_changes);
        assert_eq!(
            fs::read_to_string(fx.label("a.txt")).unwrap(),
            "1 0.500000 0.500000 0.500000 0.500000\n"
        );
        assert!(!fx.label("b.txt").exists());
        assert!(matches!(fx.controller.state(), ControllerState::Idle));
    }

    #[test]
    fn next_on_untouched_image_writes_empty_label() {
        let mut fx = fixture(&["a.bmp", "b.bmp"]);
        run(&mut fx.controller, "next\nquit\n");
        assert_eq!(fs::read_to_string(fx.label("a.txt")).unwrap(), "");
    }

    #[test]
    fn quit_discards_only_current_image() {
        let mut fx = fixture(&["a.bmp", "b.bmp"]);
        let (summary, out) = run(
            &mut fx.controller,
            "box 0 0 10 10\nnext\nbox 5 5 20 20\nquit\n",
        );
        assert!(fx.label("a.txt").is_file());
        assert!(!fx.label("b.txt").exists());
        assert!(summary.discarded_changes);
        assert!(out.contains("unsaved changes"));
    }

    #[test]
    fn end_of_input_behaves_like_quit() {
        let mut fx = fixture(&["a.bmp"]);
        let (summary, _) = run(&mut fx.controller, "box 0 0 10 10\n");
        assert!(summary.discarded_changes);
        assert!(!fx.label("a.txt").exists());
    }

    #[test]
    fn reopening_loads_existing_boxes() {
        let mut fx = fixture(&["a.bmp", "b.bmp"]);
        fs::write(fx.label("a.txt"), "2 0.5 0.5 0.25 0.25\n").unwrap();

        fx.controller.start(0).expect("start");
        let session = fx.controller.session().expect("editing");
        assert_eq!(session.committed_boxes().len(), 1);
        assert_eq!(session.active_class(), ClassId::new(2));
    }

    #[test]
    fn malformed_existing_label_starts_empty_with_warning() {
        let mut fx = fixture(&["a.bmp"]);
        fs::write(fx.label("a.txt"), "9 0.5 0.5 0.25 0.25\n").unwrap();

        let banner = fx.controller.start(0).expect("start");
        assert!(banner.contains("warning: existing label file ignored"));
        assert!(fx.controller.session().unwrap().committed_boxes().is_empty());
    }

    #[test]
    fn unreadable_label_file_survives_navigation_without_edits() {
        let mut fx = fixture(&["a.bmp", "b.bmp"]);
        let original = "0 0.5 0.5 0.25 0.25\n1 0.2 0.2 0.1 0.1\n2 0.5 0.5 0.25\n";
        fs::write(fx.label("a.txt"), original).unwrap();

        let (summary, out) = run(&mut fx.controller, "next\nprev\nquit\n");
        assert!(out.contains("kept unreadable a.txt unchanged"));
        assert_eq!(fs::read_to_string(fx.label("a.txt")).unwrap(), original);
        assert_eq!(summary.commits, 1);
    }

    #[test]
    fn unreadable_label_file_is_replaced_once_edited() {
        let mut fx = fixture(&["a.bmp", "b.bmp"]);
        fs::write(fx.label("a.txt"), "oops\n").unwrap();

        run(&mut fx.controller, "box 16 12 48 36\nnext\n");
        assert_eq!(
            fs::read_to_string(fx.label("a.txt")).unwrap(),
            "0 0.500000 0.500000 0.500000 0.500000\n"
        );
    }

    #[test]
    fn unreadable_label_file_is_replaced_by_explicit_save() {
        let mut fx = fixture(&["a.bmp", "b.bmp"]);
        fs::write(fx.label("a.txt"), "oops\n").unwrap();

        run(&mut fx.controller, "save\nnext\n");
        assert_eq!(fs::read_to_string(fx.label("a.txt")).unwrap(), "");
    }

    fn corrupt(fx: &Fixture, name: &str) {
        fs::write(fx.temp.path().join("images/train").join(name), b"not a jpeg")
            .expect("overwrite image");
    }

    #[test]
    fn corrupt_first_image_is_skipped() {
        let mut fx = fixture(&["a.jpg", "b.bmp"]);
        corrupt(&fx, "a.jpg");

        let (summary, out) = run(&mut fx.controller, "box 16 12 48 36\nsave\n");
        assert!(out.contains("warning: skipped a.jpg"));
        assert!(out.contains("Image 2/2: b.bmp"));
        assert_eq!(summary.commits, 1);
        assert!(fx.label("b.txt").is_file());
        assert!(!fx.label("a.txt").exists());
    }

    #[test]
    fn navigation_steps_over_corrupt_images() {
        let mut fx = fixture(&["a.bmp", "b.jpg", "c.bmp"]);
        corrupt(&fx, "b.jpg");
        fx.controller.start(0).unwrap();

        let Reply::Continue(message) = fx.controller.execute(Command::Next).unwrap() else {
            panic!("next should continue");
        };
        assert!(message.contains("warning: skipped b.jpg"));
        assert_eq!(fx.controller.current_index(), Some(2));

        fx.controller.execute(Command::Prev).unwrap();
        assert_eq!(fx.controller.current_index(), Some(0));
    }

    #[test]
    fn next_stays_put_when_only_corrupt_images_follow() {
        let mut fx = fixture(&["a.bmp", "b.jpg"]);
        corrupt(&fx, "b.jpg");
        fx.controller.start(0).unwrap();

        let Reply::Continue(message) = fx.controller.execute(Command::Next).unwrap() else {
            panic!("next should continue");
        };
        assert!(message.contains("no readable image after this one"));
        assert_eq!(fx.controller.current_index(), Some(0));
        assert!(fx.label("a.txt").is_file());
    }

    #[test]
    fn start_falls_back_to_earlier_readable_image() {
        let mut fx = fixture(&["a.bmp", "b.jpg"]);
        corrupt(&fx, "b.jpg");

        let banner = fx.controller.start(1).expect("start");
        assert!(banner.contains("warning: skipped b.jpg"));
        assert_eq!(fx.controller.current_index(), Some(0));
    }

    #[test]
    fn start_without_any_readable_image_fails() {
        let mut fx = fixture(&["a.jpg", "b.jpg"]);
        corrupt(&fx, "a.jpg");
        corrupt(&fx, "b.jpg");

        let err = fx.controller.start(0).unwrap_err();
        assert!(matches!(err, LabelError::NoImages { .. }));
    }

    #[test]
    fn degenerate_box_is_reported_as_warning() {
        let mut fx = fixture(&["a.bmp"]);
        let (_, out) = run(&mut fx.controller, "box 10 10 10 30\nsave\n");
        assert!(out.contains("warning: box discarded"));
        assert_eq!(fs::read_to_string(fx.label("a.txt")).unwrap(), "");
    }

    #[test]
    fn errors_do_not_stop_the_loop() {
        let mut fx = fixture(&["a.bmp"]);
        let (summary, out) = run(
            &mut fx.controller,
            "jump\nclass tree\ndelete 3\nbox 0 0 32 24\nsave\n",
        );
        assert!(out.contains("error: unknown command 'jump'"));
        assert!(out.contains("error: Unknown class 'tree'"));
        assert!(out.contains("error: Index 3 out of range"));
        assert_eq!(summary.commits, 1);
    }

    #[test]
    fn prev_at_first_image_saves_and_stays() {
        let mut fx = fixture(&["a.bmp", "b.bmp"]);
        fx.controller.start(0).unwrap();
        let reply = fx.controller.execute(Command::Prev).unwrap();
        assert_eq!(
            reply,
            Reply::Continue("saved a.txt; already at the first image".to_string())
        );
        assert_eq!(fx.controller.current_index(), Some(0));
    }

    #[test]
    fn active_class_carries_to_unlabelled_images() {
        let mut fx = fixture(&["a.bmp", "b.bmp"]);
        fx.controller.start(0).unwrap();
        fx.controller
            .execute(Command::Class("panel".to_string()))
            .unwrap();
        fx.controller.execute(Command::Next).unwrap();

        let session = fx.controller.session().expect("editing");
        assert_eq!(session.active_class(), ClassId::new(2));
    }

    #[test]
    fn goto_jumps_and_validates() {
        let mut fx = fixture(&["a.bmp", "b.bmp", "c.bmp"]);
        fx.controller.start(0).unwrap();
        fx.controller.execute(Command::Goto(3)).unwrap();
        assert_eq!(fx.controller.current_index(), Some(2));

        let err = fx.controller.execute(Command::Goto(4)).unwrap_err();
        assert!(matches!(err, LabelError::IndexOutOfRange { index: 4, len: 3 }));
    }

    #[test]
    fn undo_and_list_through_commands() {
        let mut fx = fixture(&["a.bmp"]);
        fx.controller.start(0).unwrap();
        fx.controller
            .execute(Command::Box {
                x1: 0.0,
                y1: 0.0,
                x2: 32.0,
                y2: 24.0,
            })
            .unwrap();

        let Reply::Continue(listing) = fx.controller.execute(Command::List).unwrap() else {
            panic!("list should continue");
        };
        assert!(listing.contains("1. stop_sign (0, 0)-(32, 24)"));

        fx.controller.execute(Command::Undo).unwrap();
        assert_eq!(
            fx.controller.execute(Command::List).unwrap(),
            Reply::Continue("no boxes".to_string())
        );
    }
}
