use glob::glob;
use log::{info, warn};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{AnnotationRow, ClassList, CLASSES_FILE_NAME};

/// Collect the XML files under each input. Files are taken as given,
/// directories are searched recursively. The result is sorted and deduplicated.
pub fn collect_xml_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut xml_files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let pattern = format!("{}/**/*.xml", input.display());
            match glob(&pattern) {
                Ok(entries) => xml_files.extend(entries.filter_map(|entry| entry.ok())),
                Err(e) => warn!("Invalid glob pattern {}: {}", pattern, e),
            }
        } else {
            xml_files.push(input.clone());
        }
    }
    xml_files.sort();
    xml_files.dedup();
    xml_files
}

/// Write rows as a headerless annotation CSV, optionally appending to an existing table.
pub fn write_annotations(path: &Path, rows: &[AnnotationRow], append: bool) -> Result<()> {
    let file = if append {
        OpenOptions::new().create(true).append(true).open(path)?
    } else {
        File::create(path)?
    };
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_annotations(path: &Path) -> Result<Vec<AnnotationRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<AnnotationRow>, csv::Error>>()?;
    Ok(rows)
}

/// Build the class list from an annotation CSV and write it as `classes.csv`
/// in the same directory. Returns the path of the written file.
pub fn create_classes(annotations_file: &Path) -> Result<PathBuf> {
    let rows = read_annotations(annotations_file)?;
    let classes = ClassList::from_labels(rows.iter().map(|row| row.label.as_str()));
    if classes.is_empty() {
        warn!("No labels found in {}", annotations_file.display());
    }
    info!("{}", describe_labels(&classes));

    let classes_path = classes_path_for(annotations_file);
    write_classes(&classes_path, &classes)?;
    Ok(classes_path)
}

/// Summary of a class list as reported when it is created
pub fn describe_labels(classes: &ClassList) -> String {
    format!(
        "There are {} unique labels: {:?}",
        classes.len(),
        classes.labels()
    )
}

/// Path of the class list that belongs to an annotation CSV
pub fn classes_path_for(annotations_file: &Path) -> PathBuf {
    annotations_file
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(CLASSES_FILE_NAME)
}

pub fn write_classes(path: &Path, classes: &ClassList) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    for (label, index) in classes.iter() {
        writer.serialize((label, index))?;
    }
    writer.flush()?;
    Ok(())
}

/// Load a `label,index` class list. Rows are ordered by index on load.
pub fn read_classes(path: &Path) -> Result<ClassList> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    let mut entries = reader
        .deserialize()
        .collect::<std::result::Result<Vec<(String, usize)>, csv::Error>>()?;
    entries.sort_by_key(|&(_, index)| index);
    Ok(ClassList::from_labels(entries.iter().map(|(label, _)| label)))
}

/// Number of distinct images referenced by an annotation CSV
pub fn number_of_images(annotations_file: &Path) -> Result<usize> {
    let rows = read_annotations(annotations_file)?;
    Ok(count_images(&rows))
}

fn count_images(rows: &[AnnotationRow]) -> usize {
    rows.iter()
        .map(|row| row.image_path.as_str())
        .collect::<HashSet<_>>()
        .len()
}
