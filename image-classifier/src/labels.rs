//! # Label tables
//!
//! A [`LabelTable`] maps the class index produced by a model to a human-readable name.
//! It is loaded once, never mutated afterwards and can be shared by reference between
//! any number of classification requests.
//!
//! Two file formats are understood:
//! - the ImageNet class index JSON, `{"0": ["n01440764", "tench"], ...}`;
//! - plain text with one label per line.
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader, Read},
    ops::Index,
    path::Path,
};

use log::debug;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Could not read the label file: {0}")]
    Io(#[from] std::io::Error),
    #[error("The label file is not a valid class index: {0}")]
    Json(#[from] serde_json::Error),
    #[error("The class id {0:?} is not a non-negative integer")]
    InvalidClassId(String),
    #[error("The class id {0} appears more than once")]
    DuplicateClassId(usize),
    #[error("The class id {0} is missing, ids must go from 0 to the number of classes - 1")]
    MissingClassId(usize),
    #[error("The label file does not contain any label")]
    Empty,
}

/// `[wordnet id, label]` pair of the class index format.
#[derive(Deserialize)]
struct ClassIndexEntry(String, String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
    wordnet_ids: Option<Vec<String>>,
}

impl LabelTable {
    pub fn new(labels: Vec<String>) -> Self {
        Self {
            labels,
            wordnet_ids: None,
        }
    }

    /// Loads a label file, choosing the format from the extension (`.json` is a class index,
    /// everything else is one label per line).
    pub fn open<P>(path: P) -> Result<Self, LabelError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let table = if is_json {
            Self::from_class_index_json(reader)?
        } else {
            Self::from_lines(reader)?
        };
        debug!("Loaded {} labels from {}", table.len(), path.display());
        Ok(table)
    }

    /// Parses an ImageNet style class index.
    ///
    /// Entries may appear in any order in the file; they are placed by their id, and the
    /// ids must cover `0..N` exactly.
    pub fn from_class_index_json<R: Read>(reader: R) -> Result<Self, LabelError> {
        let raw: BTreeMap<String, ClassIndexEntry> = serde_json::from_reader(reader)?;

        let mut by_id = BTreeMap::new();
        for (key, entry) in raw {
            let id = key
                .trim()
                .parse::<usize>()
                .map_err(|_| LabelError::InvalidClassId(key.clone()))?;
            if by_id.insert(id, entry).is_some() {
                return Err(LabelError::DuplicateClassId(id));
            }
        }
        if by_id.is_empty() {
            return Err(LabelError::Empty);
        }

        let mut labels = Vec::with_capacity(by_id.len());
        let mut wordnet_ids = Vec::with_capacity(by_id.len());
        // BTreeMap iterates in ascending id order, so any gap shows up as a mismatch
        for (expected, (id, ClassIndexEntry(wordnet_id, label))) in by_id.into_iter().enumerate() {
            if id != expected {
                return Err(LabelError::MissingClassId(expected));
            }
            wordnet_ids.push(wordnet_id);
            labels.push(label);
        }

        Ok(Self {
            labels,
            wordnet_ids: Some(wordnet_ids),
        })
    }

    /// Parses one label per line. Blank lines are skipped and surrounding whitespace is trimmed.
    pub fn from_lines<R: BufRead>(reader: R) -> Result<Self, LabelError> {
        let labels = reader
            .lines()
            .filter_map(|line| match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(Ok(line.trim().to_string())),
                Err(e) => Some(Err(e)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        if labels.is_empty() {
            return Err(LabelError::Empty);
        }
        Ok(Self::new(labels))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, class_id: usize) -> Option<&str> {
        self.labels.get(class_id).map(String::as_str)
    }

    /// WordNet synset id of a class, only known when loaded from a class index.
    pub fn wordnet_id(&self, class_id: usize) -> Option<&str> {
        self.wordnet_ids
            .as_ref()
            .and_then(|ids| ids.get(class_id))
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for LabelTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

impl Index<usize> for LabelTable {
    type Output = str;

    fn index(&self, class_id: usize) -> &str {
        &self.labels[class_id]
    }
}
