use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

/// File name of the class list written next to an annotation table
pub const CLASSES_FILE_NAME: &str = "classes.csv";

// One annotated object, in the column order of the RetinaNet CSV generator:
// image_path,xmin,ymin,xmax,ymax,label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRow {
    pub image_path: String,
    pub xmin: String,
    pub ymin: String,
    pub xmax: String,
    pub ymax: String,
    pub label: String,
}

// The <annotation> root of a Pascal VOC file, as written by RectLabel and LabelImg.
// Only the fields the conversion reads are modelled; everything else is skipped.
#[derive(Debug, Clone, Deserialize)]
pub struct VocAnnotation {
    pub filename: String,
    // A single <object> and repeated <object>s both land here
    #[serde(default, rename = "object")]
    pub objects: Vec<VocObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VocObject {
    pub name: String,
    pub bndbox: BndBox,
}

// Bounds stay as the decimal strings found in the XML
#[derive(Debug, Clone, Deserialize)]
pub struct BndBox {
    pub xmin: String,
    pub ymin: String,
    pub xmax: String,
    pub ymax: String,
}

/// Label to zero-based class index, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassList {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl ClassList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a class list from labels, keeping the first occurrence of each.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classes = Self::new();
        for label in labels {
            classes.insert(label.as_ref());
        }
        classes
    }

    /// Insert a label if it is new and return its index.
    pub fn insert(&mut self, label: &str) -> usize {
        if let Some(&id) = self.index.get(label) {
            return id;
        }
        let id = self.labels.len();
        self.labels.push(label.to_string());
        self.index.insert(label.to_string(), id);
        id
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn name_of(&self, index: usize) -> Result<&str> {
        self.labels
            .get(index)
            .map(String::as_str)
            .ok_or(Error::UnknownClassIndex(index))
    }

    /// Iterate `(label, index)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(id, label)| (label.as_str(), id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_list_first_seen_order() {
        let classes = ClassList::from_labels(["Tree", "Tree", "Shrub"]);

        assert_eq!(classes.len(), 2);
        assert_eq!(classes.index_of("Tree"), Some(0));
        assert_eq!(classes.index_of("Shrub"), Some(1));
        assert_eq!(classes.index_of("Snag"), None);
        assert_eq!(classes.labels(), &["Tree".to_string(), "Shrub".to_string()]);
    }

    #[test]
    fn test_name_of() {
        let classes = ClassList::from_labels(["Tree", "Shrub"]);

        assert_eq!(classes.name_of(1).unwrap(), "Shrub");
        assert!(matches!(
            classes.name_of(2),
            Err(Error::UnknownClassIndex(2))
        ));
    }
}
