//! Directory listing for the images/labels pair of one split.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::LabelError;
use crate::geom::FrameSize;

pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];
pub const LABEL_EXTENSION: &str = "txt";

/// Lists image files directly inside `dir`, sorted by file name.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, LabelError> {
    list_files_with_extensions(dir, &IMAGE_EXTENSIONS)
}

/// Lists `.txt` label files directly inside `dir`, sorted by file name.
pub fn list_labels(dir: &Path) -> Result<Vec<PathBuf>, LabelError> {
    list_files_with_extensions(dir, &[LABEL_EXTENSION])
}

fn list_files_with_extensions(
    dir: &Path,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, LabelError> {
    if !dir.is_dir() {
        return Err(LabelError::LayoutInvalid {
            path: dir.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| LabelError::LayoutInvalid {
            path: dir.to_path_buf(),
            message: format!("failed while listing directory: {source}"),
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }

    log::debug!("found {} file(s) in {}", files.len(), dir.display());
    Ok(files)
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

/// File name without its extension; the key pairing an image with its labels.
pub fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `<labels_dir>/<base name>.txt` for an image.
pub fn label_path_for(labels_dir: &Path, image_path: &Path) -> PathBuf {
    labels_dir.join(format!("{}.{}", base_name(image_path), LABEL_EXTENSION))
}

/// Reads image dimensions from the file header without decoding pixels.
pub fn read_frame_size(path: &Path) -> Result<FrameSize, LabelError> {
    let size = imagesize::size(path).map_err(|source| LabelError::ImageDimensionRead {
        path: path.to_path_buf(),
        source,
    })?;

    let width: u32 = size
        .width
        .try_into()
        .map_err(|_| LabelError::LayoutInvalid {
            path: path.to_path_buf(),
            message: format!("image width {} does not fit in u32", size.width),
        })?;
    let height: u32 = size
        .height
        .try_into()
        .map_err(|_| LabelError::LayoutInvalid {
            path: path.to_path_buf(),
            message: format!("image height {} does not fit in u32", size.height),
        })?;

    Ok(FrameSize::new(width, height))
}
