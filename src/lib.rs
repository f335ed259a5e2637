//! Pascal VOC to RetinaNet CSV converter
//!
//! This library turns hand-annotated VOC XML bounding boxes into the flat CSV
//! format of the RetinaNet CSV generator, derives the class list, and assembles
//! the argument list for a training run.

pub mod arguments;
pub mod config;
pub mod conversion;
pub mod error;
pub mod io;
pub mod model;
pub mod release;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use arguments::{format_args, run_trainer, training_flags, ArgValue, FlagList};
pub use config::{read_config, Cli, Command, TrainingConfig};
pub use conversion::{convert_xml_files, xml_to_annotations};
pub use error::{Error, Result};
pub use io::{
    collect_xml_files, create_classes, number_of_images, read_annotations, read_classes,
    write_annotations,
};
pub use model::{read_model, DetectionModel};
pub use release::{ModelFetcher, Release, ReleaseAsset};
pub use types::{AnnotationRow, ClassList};
