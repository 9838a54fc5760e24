use std::path::PathBuf;
use thiserror::Error;

use crate::check::ConsistencyReport;

/// The main error type for cavelabel operations.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid geometry: {message}")]
    InvalidGeometry { message: String },

    #[error("Degenerate box: intersection with the image frame has zero area")]
    DegenerateBox,

    #[error("Malformed label line in {path}:{line}: {message}")]
    MalformedLabelLine {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Unknown class '{class}'")]
    UnknownClass { class: String },

    #[error("Index {index} out of range ({len} item(s))")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid class configuration {path}: {message}")]
    ClassConfig { path: PathBuf, message: String },

    #[error("Failed to parse class YAML from {path}: {source}")]
    ClassYamlParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid dataset layout at {path}: {message}")]
    LayoutInvalid { path: PathBuf, message: String },

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("No images found in {path}")]
    NoImages { path: PathBuf },

    #[error("Failed to render report: {0}")]
    ReportWrite(#[from] serde_json::Error),

    #[error("Consistency check failed with {} problem(s)", .report.problem_count())]
    CheckFailed { report: ConsistencyReport },
}

impl LabelError {
    pub(crate) fn invalid_geometry(message: impl Into<String>) -> Self {
        LabelError::InvalidGeometry {
            message: message.into(),
        }
    }
}
