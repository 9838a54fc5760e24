//! Per-image label files: `class_id cx cy w h`, one box per line.
//!
//! Reads are all-or-nothing: one bad line rejects the whole file, so a
//! typo can never silently drop the valid boxes around it. Writes go to a
//! temporary file in the labels directory and are renamed into place, so
//! readers see either the old file or the new one, never a partial write.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;

use crate::config::{ClassId, ClassList};
use crate::dataset;
use crate::error::LabelError;
use crate::geom::BoundingBox;

/// Reads and writes the label files of one labels directory.
#[derive(Clone, Debug)]
pub struct LabelStore {
    labels_dir: PathBuf,
    classes: Arc<ClassList>,
}

impl LabelStore {
    pub fn new(labels_dir: impl Into<PathBuf>, classes: Arc<ClassList>) -> Self {
        Self {
            labels_dir: labels_dir.into(),
            classes,
        }
    }

    pub fn labels_dir(&self) -> &Path {
        &self.labels_dir
    }

    /// Where the label file for `image_path` lives.
    pub fn label_path_for(&self, image_path: &Path) -> PathBuf {
        dataset::label_path_for(&self.labels_dir, image_path)
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// Loads every box in `path`, validating class ids against the
    /// configured classes.
    pub fn load(&self, path: &Path) -> Result<Vec<BoundingBox>, LabelError> {
        read_label_file(path, self.classes.len())
    }

    /// Replaces `path` with exactly `boxes`, atomically.
    pub fn save(&self, path: &Path, boxes: &[BoundingBox]) -> Result<(), LabelError> {
        for bbox in boxes {
            if !self.classes.contains(bbox.class_id) {
                return Err(LabelError::UnknownClass {
                    class: bbox.class_id.to_string(),
                });
            }
        }
        write_label_file(path, boxes)
    }
}

/// Reads a label file with class ids checked against `class_count`.
pub fn read_label_file(path: &Path, class_count: usize) -> Result<Vec<BoundingBox>, LabelError> {
    let content = fs::read_to_string(path)?;
    parse_labels(&content, path, class_count)
}

/// Parses label file content. `path` is only used in error messages.
pub fn parse_labels(
    content: &str,
    path: &Path,
    class_count: usize,
) -> Result<Vec<BoundingBox>, LabelError> {
    let mut boxes = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        if let Some(bbox) = parse_label_line(line, path, line_idx + 1, class_count)? {
            boxes.push(bbox);
        }
    }
    Ok(boxes)
}

fn parse_label_line(
    line: &str,
    path: &Path,
    line_num: usize,
    class_count: usize,
) -> Result<Option<BoundingBox>, LabelError> {
    let malformed = |message: String| LabelError::MalformedLabelLine {
        path: path.to_path_buf(),
        line: line_num,
        message,
    };

    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // At most 6 tokens so pathological lines do not allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(6).collect();
    if tokens.len() < 5 {
        return Err(malformed(format!(
            "expected 5 tokens, found {}",
            tokens.len()
        )));
    }
    if tokens.len() > 5 {
        return Err(malformed(
            "expected 5 tokens; segmentation/pose rows are not supported".to_string(),
        ));
    }

    let class_id = tokens[0].parse::<usize>().map_err(|_| {
        malformed(format!(
            "invalid class id '{}'; expected non-negative integer",
            tokens[0]
        ))
    })?;
    if class_id >= class_count {
        return Err(malformed(format!(
            "class id out of range: {class_id} (configured: {class_count} class(es))"
        )));
    }

    let mut values = [0.0f64; 4];
    for (slot, (raw, name)) in values
        .iter_mut()
        .zip(tokens[1..].iter().zip(["cx", "cy", "w", "h"]))
    {
        *slot = raw.parse::<f64>().map_err(|_| {
            malformed(format!(
                "invalid {name} '{raw}'; expected decimal number"
            ))
        })?;
    }

    let [cx, cy, w, h] = values;
    let bbox = BoundingBox::new(ClassId::new(class_id), cx, cy, w, h);
    if let Some(problem) = bbox.geometry_problem() {
        return Err(malformed(problem));
    }

    Ok(Some(bbox))
}

/// Renders boxes in file form, one per line with a trailing newline.
pub fn format_labels(boxes: &[BoundingBox]) -> String {
    let mut out = String::new();
    for bbox in boxes {
        out.push_str(&bbox.to_string());
        out.push('\n');
    }
    out
}

/// Writes `boxes` to `path` through a temporary file and a rename.
///
/// The parent directory must already exist.
pub fn write_label_file(path: &Path, boxes: &[BoundingBox]) -> Result<(), LabelError> {
    for (idx, bbox) in boxes.iter().enumerate() {
        if let Some(problem) = bbox.geometry_problem() {
            return Err(LabelError::invalid_geometry(format!("box {idx}: {problem}")));
        }
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(format_labels(boxes).as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| LabelError::Io(err.error))?;

    log::debug!("wrote {} box(es) to {}", boxes.len(), path.display());
    Ok(())
}

/// Fuzz-only entrypoint for single-line parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_label_line(input: &str) -> Result<(), LabelError> {
    let _ = parse_label_line(input, Path::new("<fuzz>"), 1, usize::MAX)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> LabelStore {
        let classes = ClassList::new(["stop_sign", "rock", "panel", "crate"]).expect("classes");
        LabelStore::new(dir, Arc::new(classes))
    }

    fn line_err(content: &str) -> (usize, String) {
        match parse_labels(content, Path::new("a.txt"), 4).unwrap_err() {
            LabelError::MalformedLabelLine { line, message, .. } => (line, message),
            other => panic!("expected MalformedLabelLine, got {other:?}"),
        }
    }

    #[test]
    fn parses_valid_lines_and_skips_blank_ones() {
        let boxes = parse_labels(
            "1 0.5 0.25 0.3 0.1\n\n  \n3 0.1 0.1 0.2 0.2\n",
            Path::new("a.txt"),
            4,
        )
        .expect("parse");
        assert_eq!(
            boxes,
            vec![
                BoundingBox::new(1usize, 0.5, 0.25, 0.3, 0.1),
                BoundingBox::new(3usize, 0.1, 0.1, 0.2, 0.2),
            ]
        );
    }

    #[test]
    fn empty_content_means_no_objects() {
        assert!(parse_labels("", Path::new("a.txt"), 4).unwrap().is_empty());
    }

    #[test]
    fn rejects_wrong_token_count() {
        assert_eq!(line_err("0 0.5 0.5 0.1 0.1\n0 0.1 0.2\n").0, 2);
        assert!(line_err("0 0.1 0.2 0.3 0.4 0.5").1.contains("segmentation"));
    }

    #[test]
    fn rejects_non_integer_and_out_of_range_class() {
        assert!(line_err("1.0 0.5 0.5 0.1 0.1").1.contains("invalid class id"));
        assert!(line_err("-1 0.5 0.5 0.1 0.1").1.contains("invalid class id"));
        assert!(line_err("9 0.5 0.5 0.5 0.5").1.contains("class id out of range"));
    }

    #[test]
    fn rejects_bad_coordinates() {
        assert!(line_err("0 abc 0.5 0.1 0.1").1.contains("invalid cx"));
        assert!(line_err("0 0.5 1.2 0.1 0.1").1.contains("outside [0, 1]"));
        assert!(line_err("0 0.5 0.5 0.0 0.1").1.contains("degenerate"));
        assert!(line_err("0 NaN 0.5 0.1 0.1").1.contains("finite"));
    }

    #[test]
    fn save_then_load_preserves_order() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let store = store(temp.path());
        let path = temp.path().join("img.txt");
        let boxes = vec![
            BoundingBox::new(2usize, 0.7, 0.7, 0.2, 0.2),
            BoundingBox::new(0usize, 0.2, 0.3, 0.1, 0.1),
        ];

        store.save(&path, &boxes).expect("save");
        assert!(store.exists(&path));
        assert_eq!(store.load(&path).expect("load"), boxes);
    }

    #[test]
    fn save_overwrites_previous_content() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let store = store(temp.path());
        let path = temp.path().join("img.txt");
        fs::write(&path, "0 0.5 0.5 0.1 0.1\n1 0.5 0.5 0.1 0.1\n3 0.5 0.5 0.1 0.1\n")
            .expect("seed label file");

        store
            .save(&path, &[BoundingBox::new(1usize, 0.25, 0.25, 0.5, 0.5)])
            .expect("save");
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "1 0.250000 0.250000 0.500000 0.500000\n"
        );
    }

    #[test]
    fn save_empty_writes_empty_file() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let store = store(temp.path());
        let path = temp.path().join("nothing.txt");

        store.save(&path, &[]).expect("save");
        assert!(path.is_file());
        assert!(fs::read_to_string(&path).unwrap().is_empty());
    }

    #[test]
    fn save_leaves_no_temporary_files() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let store = store(temp.path());
        store
            .save(&temp.path().join("a.txt"), &[BoundingBox::new(0usize, 0.5, 0.5, 0.2, 0.2)])
            .expect("save");

        let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn save_rejects_unknown_class_and_bad_geometry() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let store = store(temp.path());
        let path = temp.path().join("a.txt");

        let err = store
            .save(&path, &[BoundingBox::new(7usize, 0.5, 0.5, 0.2, 0.2)])
            .unwrap_err();
        assert!(matches!(err, LabelError::UnknownClass { .. }));

        let err = store
            .save(&path, &[BoundingBox::new(0usize, 0.5, 0.5, 0.0, 0.2)])
            .unwrap_err();
        assert!(matches!(err, LabelError::InvalidGeometry { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn save_into_missing_directory_is_an_io_error() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let store = store(temp.path());
        let err = store
            .save(&temp.path().join("missing/a.txt"), &[])
            .unwrap_err();
        assert!(matches!(err, LabelError::Io(_)));
    }
}
