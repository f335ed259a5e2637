use indicatif::ProgressBar;
use log::debug;
use quick_xml::events::Event;
use quick_xml::Reader;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{AnnotationRow, VocAnnotation, VocObject};

const ANNOTATION_ROOT: &str = "annotation";

/// Load a Pascal VOC annotation (e.g. from the RectLabel editor) and convert it
/// to RetinaNet rows, one per object, in document order.
pub fn xml_to_annotations(xml_path: &Path) -> Result<Vec<AnnotationRow>> {
    let content = fs::read_to_string(xml_path).map_err(|source| Error::ReadAnnotation {
        path: xml_path.to_path_buf(),
        source,
    })?;
    parse_annotations(&content, xml_path)
}

/// Convert already loaded XML text. `xml_path` is only used in errors.
pub fn parse_annotations(content: &str, xml_path: &Path) -> Result<Vec<AnnotationRow>> {
    if let Some(root) = root_element(content) {
        if root != ANNOTATION_ROOT {
            return Err(Error::MalformedAnnotation {
                path: xml_path.to_path_buf(),
                document: format!("root element <{}>: {}", root, content.trim()),
            });
        }
    }

    let doc: VocAnnotation = quick_xml::de::from_str(content).map_err(|source| Error::Xml {
        path: xml_path.to_path_buf(),
        source,
    })?;

    if doc.objects.is_empty() {
        return Err(Error::MalformedAnnotation {
            path: xml_path.to_path_buf(),
            document: format!("{:?}", doc),
        });
    }

    let image_path = basename(&doc.filename);
    debug!(
        "{}: {} objects for {}",
        xml_path.display(),
        doc.objects.len(),
        image_path
    );

    Ok(doc
        .objects
        .iter()
        .map(|object| to_row(&image_path, object))
        .collect())
}

/// Convert many XML files in parallel. Rows keep the order of `xml_paths`.
pub fn convert_xml_files(xml_paths: &[PathBuf], pb: &ProgressBar) -> Result<Vec<AnnotationRow>> {
    let per_file: Vec<Vec<AnnotationRow>> = xml_paths
        .par_iter()
        .map(|path| {
            let rows = xml_to_annotations(path);
            pb.inc(1);
            rows
        })
        .collect::<Result<_>>()?;

    Ok(per_file.into_iter().flatten().collect())
}

// Name of the first element; None when there is none or the prolog is broken,
// which the deserializer then reports.
fn root_element(content: &str) -> Option<String> {
    let mut reader = Reader::from_str(content);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.name().as_ref()).into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

fn to_row(image_path: &str, object: &VocObject) -> AnnotationRow {
    AnnotationRow {
        image_path: image_path.to_string(),
        xmin: object.bndbox.xmin.clone(),
        ymin: object.bndbox.ymin.clone(),
        xmax: object.bndbox.xmax.clone(),
        ymax: object.bndbox.ymax.clone(),
        label: object.name.clone(),
    }
}

// Annotation tools store either a bare name or the absolute path they saw on
// the labelling machine, which may use either separator.
fn basename(filename: &str) -> String {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .to_string()
}
