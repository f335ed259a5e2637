//! Assemble the argv-style argument list of the RetinaNet CSV trainer.
//!
//! The trainer parses its arguments with argparse, so the list mimics a command
//! line: flags and their values first, then the `csv` generator subcommand with
//! its two positional paths.

use log::info;
use std::fmt;
use std::path::Path;
use std::process::Command;

use crate::config::TrainingConfig;
use crate::error::{Error, Result};
use crate::io::{create_classes, number_of_images};

/// Generator subcommand understood by the trainer
pub const CSV_GENERATOR: &str = "csv";

/// A flag value, rendered the way the trainer's argparse expects it.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Text(String),
    Int(u64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Text(s) => f.write_str(s),
            ArgValue::Int(n) => write!(f, "{}", n),
            ArgValue::Float(x) => write!(f, "{}", x),
            ArgValue::Bool(true) => f.write_str("True"),
            ArgValue::Bool(false) => f.write_str("False"),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Text(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Text(value)
    }
}

impl From<u32> for ArgValue {
    fn from(value: u32) -> Self {
        ArgValue::Int(u64::from(value))
    }
}

impl From<usize> for ArgValue {
    fn from(value: usize) -> Self {
        ArgValue::Int(value as u64)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Float(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Bool(value)
    }
}

/// Flags in insertion order. A flag pushed twice keeps its first position and
/// takes the latest value.
#[derive(Debug, Clone, Default)]
pub struct FlagList {
    flags: Vec<(String, ArgValue)>,
}

impl FlagList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, flag: &str, value: impl Into<ArgValue>) -> &mut Self {
        let value = value.into();
        match self.flags.iter_mut().find(|(name, _)| name == flag) {
            Some((_, existing)) => *existing = value,
            None => self.flags.push((flag.to_string(), value)),
        }
        self
    }

    pub fn push_if(&mut self, condition: bool, flag: &str, value: impl Into<ArgValue>) -> &mut Self {
        if condition {
            self.push(flag, value);
        }
        self
    }

    pub fn get(&self, flag: &str) -> Option<&ArgValue> {
        self.flags
            .iter()
            .find(|(name, _)| name == flag)
            .map(|(_, value)| value)
    }

    /// Flatten to `[flag, value, ...]` followed by the positionals, all as strings
    pub fn into_args<I, S>(self, positionals: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags
            .into_iter()
            .flat_map(|(flag, value)| [flag, value.to_string()])
            .chain(positionals.into_iter().map(Into::into))
            .collect()
    }
}

/// Build the trainer flags for a config and the number of training images.
pub fn training_flags(config: &TrainingConfig, steps: usize) -> FlagList {
    let mut flags = FlagList::new();
    if let Some(weights) = &config.weights {
        flags.push("--snapshot", weights.as_str());
    }
    flags
        .push("--backbone", config.backbone.as_str())
        .push("--image-min-side", config.image_min_side)
        .push("--multi-gpu", config.multi_gpu)
        .push("--epochs", config.epochs)
        .push("--steps", steps)
        .push_if(config.multi_gpu > 1, "--multi-gpu-force", true);
    flags
}

/// Write the class list next to `annotations` and return the full trainer
/// argument list.
pub fn format_args(annotations: &Path, config: &TrainingConfig) -> Result<Vec<String>> {
    let classes_file = create_classes(annotations)?;
    let steps = number_of_images(annotations)?;

    let args = training_flags(config, steps).into_args([
        CSV_GENERATOR.to_string(),
        annotations.display().to_string(),
        classes_file.display().to_string(),
    ]);
    Ok(args)
}

/// Run an external trainer with the given arguments and wait for it.
pub fn run_trainer(program: &str, args: &[String]) -> Result<()> {
    info!("Running {} {}", program, args.join(" "));
    let status = Command::new(program).args(args).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(Error::TrainerFailed {
            program: program.to_string(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(weights: Option<&str>, multi_gpu: u32) -> TrainingConfig {
        TrainingConfig {
            weights: weights.map(str::to_string),
            backbone: "resnet50".to_string(),
            image_min_side: 800.0,
            multi_gpu,
            epochs: 1,
        }
    }

    #[test]
    fn test_flag_order_with_weights() {
        let args = training_flags(&config(Some("data/NEON.h5"), 1), 3).into_args(Vec::<String>::new());

        assert_eq!(
            args,
            vec![
                "--snapshot",
                "data/NEON.h5",
                "--backbone",
                "resnet50",
                "--image-min-side",
                "800",
                "--multi-gpu",
                "1",
                "--epochs",
                "1",
                "--steps",
                "3",
            ]
        );
    }

    #[test]
    fn test_no_snapshot_without_weights() {
        let flags = training_flags(&config(None, 1), 3);
        assert!(flags.get("--snapshot").is_none());
        assert_eq!(flags.into_args(Vec::<String>::new()).len(), 10);
    }

    #[test]
    fn test_multi_gpu_force() {
        let flags = training_flags(&config(None, 2), 3);
        assert_eq!(flags.get("--multi-gpu-force"), Some(&ArgValue::Bool(true)));

        let args = flags.into_args(Vec::<String>::new());
        assert_eq!(&args[args.len() - 2..], ["--multi-gpu-force", "True"]);

        let flags = training_flags(&config(None, 1), 3);
        assert!(flags.get("--multi-gpu-force").is_none());
    }

    #[test]
    fn test_push_keeps_first_position() {
        let mut flags = FlagList::new();
        flags.push("--a", 1u32).push("--b", 2u32).push("--a", 3u32);

        assert_eq!(flags.into_args(["x"]), vec!["--a", "3", "--b", "2", "x"]);
    }

    #[test]
    fn test_float_rendering() {
        assert_eq!(ArgValue::Float(800.0).to_string(), "800");
        assert_eq!(ArgValue::Float(800.5).to_string(), "800.5");
        assert_eq!(ArgValue::Bool(false).to_string(), "False");
    }

    #[test]
    fn test_integral_image_min_side_drops_fraction() {
        let yaml_config: TrainingConfig = serde_yaml::from_str(
            "weights: None\nbackbone: resnet50\nimage-min-side: 800.0\nmulti-gpu: 1\nepochs: 1\n",
        )
        .unwrap();
        let flags = training_flags(&yaml_config, 1);

        assert_eq!(
            flags.get("--image-min-side").map(ToString::to_string).as_deref(),
            Some("800")
        );
    }
}
