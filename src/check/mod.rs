//! Dataset consistency checking.
//!
//! Cross-references an images directory with its labels directory before
//! training:
//! - every image has exactly one label file with the same base name, and
//!   no two images or two label files share a base name
//! - every label file has an image
//! - every label file parses and only uses configured class ids
//!
//! The check only reads. Label files are replaced atomically by the
//! [`store`](crate::store), so running it next to a labelling session never
//! sees a half-written file.

mod report;

pub use report::{AmbiguousName, ConsistencyReport, MalformedLabel};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::dataset;
use crate::error::LabelError;
use crate::store;

/// Checks one images/labels directory pair against `class_count` classes.
///
/// Fails only if a directory cannot be listed; every per-file finding goes
/// into the report.
pub fn check(
    images_dir: &Path,
    labels_dir: &Path,
    class_count: usize,
) -> Result<ConsistencyReport, LabelError> {
    let images = dataset::list_images(images_dir)?;
    let labels = dataset::list_labels(labels_dir)?;

    let mut report = ConsistencyReport::new(class_count);
    report.images_checked = images.len();
    report.labels_checked = labels.len();

    let images_by_name = group_by_base_name(&images);
    let labels_by_name = group_by_base_name(&labels);

    for (name, files) in &images_by_name {
        if !labels_by_name.contains_key(name) {
            report.unpaired_images.push(name.clone());
        }
        if files.len() > 1 {
            report.ambiguous_images.push(ambiguous(name, files));
        }
    }

    for (name, files) in &labels_by_name {
        if !images_by_name.contains_key(name) {
            report.unpaired_labels.push(name.clone());
        }
        if files.len() > 1 {
            report.ambiguous_labels.push(ambiguous(name, files));
        }

        // Every file is parsed, even when its base name is ambiguous.
        for path in files {
            check_label_file(&mut report, name, path, class_count);
        }
    }

    log::info!(
        "checked {} image(s), {} label file(s): {} problem(s)",
        report.images_checked,
        report.labels_checked,
        report.problem_count()
    );

    Ok(report)
}

fn check_label_file(
    report: &mut ConsistencyReport,
    name: &str,
    path: &Path,
    class_count: usize,
) {
    let (line, reason) = match store::read_label_file(path, class_count) {
        Ok(boxes) => {
            if boxes.is_empty() {
                report.empty_labels.push(name.to_string());
            }
            report.box_count += boxes.len();
            for bbox in boxes {
                report.class_counts[bbox.class_id.as_usize()] += 1;
            }
            return;
        }
        Err(LabelError::MalformedLabelLine { line, message, .. }) => (Some(line), message),
        Err(err) => (None, err.to_string()),
    };

    report.malformed_labels.push(MalformedLabel {
        base_name: name.to_string(),
        file: file_name(path),
        line,
        reason,
    });
}

fn ambiguous(name: &str, files: &[&PathBuf]) -> AmbiguousName {
    AmbiguousName {
        base_name: name.to_string(),
        files: files.iter().map(|p| file_name(p)).collect(),
    }
}

fn group_by_base_name(paths: &[PathBuf]) -> BTreeMap<String, Vec<&PathBuf>> {
    let mut grouped: BTreeMap<String, Vec<&PathBuf>> = BTreeMap::new();
    for path in paths {
        grouped
            .entry(dataset::base_name(path))
            .or_default()
            .push(path);
    }
    grouped
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
