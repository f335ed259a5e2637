use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors raised while preparing a RetinaNet training run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("There is no config file in dir: {}, yields {source}", .dir.display())]
    ConfigNotFound {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to read annotation {}: {source}", .path.display())]
    ReadAnnotation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No `object` node, or a root other than `<annotation>`. `document` is a dump
    /// of what was parsed.
    #[error("Malformed annotation {}, parsed document: {document}", .path.display())]
    MalformedAnnotation { path: PathBuf, document: String },

    #[error("Failed to parse annotation XML {}: {source}", .path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: quick_xml::DeError,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Release request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode release metadata: {0}")]
    ReleaseMetadata(#[from] serde_json::Error),

    #[error("Release {tag} lists no downloadable assets")]
    NoReleaseAssets { tag: String },

    #[error("Model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("Invalid backbone: {0:?}")]
    InvalidBackbone(String),

    #[error("No class with index {0}")]
    UnknownClassIndex(usize),

    #[error("Trainer {program} exited with {status}")]
    TrainerFailed { program: String, status: ExitStatus },
}

pub type Result<T> = std::result::Result<T, Error>;
