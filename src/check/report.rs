//! Consistency report types.
//!
//! The report is plain data so it can be printed for a human, rendered as
//! JSON for scripts, or compared between runs.

use std::fmt;

use serde::Serialize;

/// Everything the checker found for one images/labels directory pair.
///
/// Entries are sorted by base name so two runs over the same files produce
/// equal reports.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    /// Number of image files seen.
    pub images_checked: usize,
    /// Number of label files seen.
    pub labels_checked: usize,
    /// Images with no label file.
    pub unpaired_images: Vec<String>,
    /// Label files with no image.
    pub unpaired_labels: Vec<String>,
    /// Base names shared by more than one image file.
    pub ambiguous_images: Vec<AmbiguousName>,
    /// Base names shared by more than one label file, e.g. `a.txt` and
    /// `a.TXT` on a case-sensitive filesystem.
    pub ambiguous_labels: Vec<AmbiguousName>,
    /// Label files that could not be loaded.
    pub malformed_labels: Vec<MalformedLabel>,
    /// Label files recording that an image has no objects. Informational.
    pub empty_labels: Vec<String>,
    /// Boxes across all well-formed label files.
    pub box_count: usize,
    /// Boxes per class id.
    pub class_counts: Vec<usize>,
}

impl ConsistencyReport {
    pub fn new(class_count: usize) -> Self {
        Self {
            class_counts: vec![0; class_count],
            ..Default::default()
        }
    }

    /// Number of findings that make the dataset unfit for training.
    pub fn problem_count(&self) -> usize {
        self.unpaired_images.len()
            + self.unpaired_labels.len()
            + self.ambiguous_images.len()
            + self.ambiguous_labels.len()
            + self.malformed_labels.len()
    }

    /// True when every image has exactly one well-formed label file and
    /// every label file has an image.
    pub fn is_consistent(&self) -> bool {
        self.problem_count() == 0
    }
}

impl fmt::Display for ConsistencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Checked {} image(s) and {} label file(s): {} box(es), {} empty label file(s)",
            self.images_checked,
            self.labels_checked,
            self.box_count,
            self.empty_labels.len()
        )?;

        if self.is_consistent() {
            return writeln!(f, "Dataset is consistent: no problems found");
        }

        writeln!(
            f,
            "Dataset check found {} problem(s):",
            self.problem_count()
        )?;
        writeln!(f)?;

        for name in &self.unpaired_images {
            writeln!(f, "  [ERROR] UnpairedImage {name}: no label file")?;
        }
        for name in &self.unpaired_labels {
            writeln!(f, "  [ERROR] UnpairedLabel {name}: no matching image")?;
        }
        for ambiguous in &self.ambiguous_images {
            writeln!(f, "  [ERROR] AmbiguousImage {ambiguous}")?;
        }
        for ambiguous in &self.ambiguous_labels {
            writeln!(f, "  [ERROR] AmbiguousLabel {ambiguous}")?;
        }
        for malformed in &self.malformed_labels {
            writeln!(f, "  [ERROR] MalformedLabel {malformed}")?;
        }

        Ok(())
    }
}

/// Several files of one kind sharing a base name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AmbiguousName {
    pub base_name: String,
    pub files: Vec<String>,
}

impl fmt::Display for AmbiguousName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: shared by {}",
            self.base_name,
            self.files.join(", ")
        )
    }
}

/// A label file that failed to load, and why.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MalformedLabel {
    pub base_name: String,
    /// The label file's name, which tells apart files sharing a base name.
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub reason: String,
}

impl fmt::Display for MalformedLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {}): {}", self.file, line, self.reason),
            None => write!(f, "{}: {}", self.file, self.reason),
        }
    }
}
