use clap::{Parser, Subcommand};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::release::{DEFAULT_DATA_DIR, LATEST_RELEASE_URL};

/// Name of the training configuration looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "deepforest_config.yml";

/// Prepare Pascal VOC tree annotations for RetinaNet training.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Convert VOC XML files (or directories of them) into a RetinaNet annotation CSV
    Convert {
        /// XML files or directories searched recursively for *.xml
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Annotation CSV to write
        #[arg(short = 'o', long = "output")]
        output: PathBuf,

        /// Append to the annotation CSV instead of replacing it
        #[arg(long = "append")]
        append: bool,
    },

    /// Write classes.csv next to an annotation CSV
    Classes {
        /// Annotation CSV in the image_path,xmin,ymin,xmax,ymax,label format
        annotations: PathBuf,
    },

    /// Print the RetinaNet training arguments, or run a trainer with them
    TrainArgs {
        /// Annotation CSV in the image_path,xmin,ymin,xmax,ymax,label format
        annotations: PathBuf,

        /// Directory holding deepforest_config.yml
        #[arg(long = "config_dir", default_value = ".")]
        config_dir: PathBuf,

        /// Trainer executable to invoke with the arguments
        #[arg(long = "trainer")]
        trainer: Option<String>,
    },

    /// Download the latest released model unless it is already cached
    FetchModel {
        /// Directory that caches downloaded models
        #[arg(long = "data_dir", default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,

        /// Release metadata endpoint
        #[arg(long = "url", default_value = LATEST_RELEASE_URL)]
        url: String,

        /// Check the downloaded model against this backbone
        #[arg(long = "backbone")]
        backbone: Option<String>,
    },
}

/// Options forwarded to the RetinaNet trainer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrainingConfig {
    /// Pretrained snapshot; `None`, `null` and a missing key all mean no weights
    #[serde(default, deserialize_with = "deserialize_weights")]
    pub weights: Option<String>,
    pub backbone: String,
    /// Read as a number, so `800` and `800.0` both reach the trainer as `800`
    #[serde(rename = "image-min-side")]
    pub image_min_side: f64,
    #[serde(rename = "multi-gpu")]
    pub multi_gpu: u32,
    pub epochs: u32,
}

impl TrainingConfig {
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Read `deepforest_config.yml` from `dir`.
pub fn read_config(dir: &Path) -> Result<TrainingConfig> {
    TrainingConfig::from_yaml(&dir.join(CONFIG_FILE_NAME)).map_err(|e| match e {
        Error::Io(source) => Error::ConfigNotFound {
            dir: dir.to_path_buf(),
            source,
        },
        other => other,
    })
}

// A literal "None" means no weights, same as a YAML null
fn deserialize_weights<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let weights: Option<String> = Option::deserialize(deserializer)?;
    Ok(weights.filter(|w| w != "None"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> TrainingConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_none_sentinel_is_absent() {
        let config = parse(
            "weights: None\nbackbone: resnet50\nimage-min-side: 800\nmulti-gpu: 1\nepochs: 1\n",
        );
        assert_eq!(config.weights, None);
        assert_eq!(config.backbone, "resnet50");
        assert_eq!(config.image_min_side, 800.0);
    }

    #[test]
    fn test_null_and_missing_weights() {
        let null = parse("weights: ~\nbackbone: resnet50\nimage-min-side: 800\nmulti-gpu: 1\nepochs: 1\n");
        let missing = parse("backbone: resnet50\nimage-min-side: 800\nmulti-gpu: 1\nepochs: 1\n");
        assert_eq!(null.weights, None);
        assert_eq!(missing.weights, None);
    }

    #[test]
    fn test_weights_path_is_kept() {
        let config = parse(
            "weights: data/NEON.h5\nbackbone: resnet50\nimage-min-side: 400\nmulti-gpu: 2\nepochs: 10\n",
        );
        assert_eq!(config.weights.as_deref(), Some("data/NEON.h5"));
        assert_eq!(config.multi_gpu, 2);
        assert_eq!(config.epochs, 10);
    }

    #[test]
    fn test_read_config_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = read_config(temp_dir.path()).unwrap_err();

        assert!(matches!(err, Error::ConfigNotFound { .. }));
        assert!(err
            .to_string()
            .contains(&temp_dir.path().display().to_string()));
    }

    #[test]
    fn test_read_config_rejects_missing_key() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "weights: None\n").unwrap();

        let err = read_config(temp_dir.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_cli_parses_train_args() {
        let cli = Cli::parse_from([
            "voc2retinanet",
            "train-args",
            "annotations.csv",
            "--config_dir",
            "configs",
        ]);
        match cli.command {
            Command::TrainArgs {
                annotations,
                config_dir,
                trainer,
            } => {
                assert_eq!(annotations, PathBuf::from("annotations.csv"));
                assert_eq!(config_dir, PathBuf::from("configs"));
                assert_eq!(trainer, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
