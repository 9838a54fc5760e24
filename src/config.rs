//! Class configuration and dataset directory layout.
//!
//! The class list is shared verbatim with the external trainer, so it is
//! read from the same `data.yaml` / `classes.txt` files the trainer uses and
//! is never mutated once loaded.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LabelError;

pub const DEFAULT_SPLIT: &str = "train";

/// Dense, zero-based class identifier. Index into the [`ClassList`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub usize);

impl ClassId {
    #[inline]
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    #[inline]
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl From<usize> for ClassId {
    fn from(id: usize) -> Self {
        Self(id)
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The ordered list of class names; position is the class id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassList {
    names: Vec<String>,
}

impl ClassList {
    /// Builds a class list, rejecting empty lists, blank names and duplicates.
    pub fn new<I, S>(names: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err("class list is empty".to_string());
        }

        let mut seen = HashSet::new();
        for (id, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(format!("class {id} has an empty name"));
            }
            if !seen.insert(name.as_str()) {
                return Err(format!("class name '{name}' is used more than once"));
            }
        }

        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, id: ClassId) -> bool {
        id.as_usize() < self.names.len()
    }

    pub fn name(&self, id: ClassId) -> Option<&str> {
        self.names.get(id.as_usize()).map(String::as_str)
    }

    pub fn id_of(&self, name: &str) -> Option<ClassId> {
        self.names.iter().position(|n| n == name).map(ClassId::new)
    }

    /// Resolves user input that is either a numeric id or a class name.
    pub fn resolve(&self, input: &str) -> Result<ClassId, LabelError> {
        let input = input.trim();
        let found = match input.parse::<usize>() {
            Ok(id) => Some(ClassId::new(id)).filter(|id| self.contains(*id)),
            Err(_) => self.id_of(input),
        };
        found.ok_or_else(|| LabelError::UnknownClass {
            class: input.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(id, name)| (ClassId::new(id), name.as_str()))
    }

    /// Loads a class file. `.yaml`/`.yml` files are read as a trainer
    /// `data.yaml` (`names:` key); anything else as one name per line.
    pub fn load(path: &Path) -> Result<Self, LabelError> {
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);

        let names = if is_yaml {
            read_yaml_names(path)?
        } else {
            read_txt_names(path)?
        };

        let classes = Self::new(names).map_err(|message| LabelError::ClassConfig {
            path: path.to_path_buf(),
            message,
        })?;
        log::debug!(
            "loaded {} class(es) from {}",
            classes.len(),
            path.display()
        );
        Ok(classes)
    }

    /// Finds the class configuration for a dataset: an explicit path wins,
    /// then `<root>/data.yaml`, then `<root>/classes.txt`.
    pub fn discover(dataset_root: &Path, explicit: Option<&Path>) -> Result<Self, LabelError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        for candidate in ["data.yaml", "classes.txt"] {
            let path = dataset_root.join(candidate);
            if path.is_file() {
                return Self::load(&path);
            }
        }

        Err(LabelError::ClassConfig {
            path: dataset_root.to_path_buf(),
            message: "no data.yaml or classes.txt found; pass --classes".to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ClassYaml {
    names: ClassYamlNames,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassYamlNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<usize, String>),
}

fn read_yaml_names(path: &Path) -> Result<Vec<String>, LabelError> {
    let data = fs::read_to_string(path)?;
    let parsed: ClassYaml =
        serde_yaml::from_str(&data).map_err(|source| LabelError::ClassYamlParse {
            path: path.to_path_buf(),
            source,
        })?;

    match parsed.names {
        ClassYamlNames::Sequence(names) => Ok(names),
        ClassYamlNames::Mapping(mapping) => {
            // Ids must be dense: renumbering would invalidate existing labels.
            for (expected, id) in mapping.keys().enumerate() {
                if *id != expected {
                    return Err(LabelError::ClassConfig {
                        path: path.to_path_buf(),
                        message: format!("class ids must be dense from 0; missing id {expected}"),
                    });
                }
            }
            Ok(mapping.into_values().collect())
        }
    }
}

fn read_txt_names(path: &Path) -> Result<Vec<String>, LabelError> {
    let data = fs::read_to_string(path)?;
    let mut names = Vec::new();

    for (line_idx, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(LabelError::ClassConfig {
                path: path.to_path_buf(),
                message: format!("line {} is empty", line_idx + 1),
            });
        }
        names.push(trimmed.to_string());
    }

    Ok(names)
}

/// `<root>/images/<split>` and `<root>/labels/<split>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetLayout {
    pub root: PathBuf,
    pub split: String,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>, split: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            split: split.into(),
        }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images").join(&self.split)
    }

    pub fn labels_dir(&self) -> PathBuf {
        self.root.join("labels").join(&self.split)
    }
}
