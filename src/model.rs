use log::info;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Backbones the RetinaNet trainer ships feature extractors for
pub const KNOWN_BACKBONES: &[&str] = &[
    "resnet50",
    "resnet101",
    "resnet152",
    "mobilenet128",
    "mobilenet160",
    "mobilenet192",
    "mobilenet224",
    "vgg16",
    "vgg19",
    "densenet121",
    "densenet169",
    "densenet201",
    "EfficientNetB0",
];

/// A saved detection model ready to hand to the inference runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionModel {
    pub path: PathBuf,
    pub backbone: String,
}

/// Load a saved model for the given backbone.
///
/// Only the weights file and the backbone name are validated here; building the
/// network is left to the runtime that consumes the handle.
pub fn read_model(model_path: &Path, backbone: &str) -> Result<DetectionModel> {
    if !KNOWN_BACKBONES.contains(&backbone) {
        return Err(Error::InvalidBackbone(backbone.to_string()));
    }
    if !model_path.is_file() {
        return Err(Error::ModelNotFound(model_path.to_path_buf()));
    }
    info!("Loaded {} model from {}", backbone, model_path.display());
    Ok(DetectionModel {
        path: model_path.to_path_buf(),
        backbone: backbone.to_string(),
    })
}
