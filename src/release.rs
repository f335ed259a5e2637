use indicatif::ProgressBar;
use log::info;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::utils::create_download_bar;

/// Latest prebuilt DeepForest model release
pub const LATEST_RELEASE_URL: &str =
    "https://api.github.com/repos/Weecology/DeepForest/releases/latest";

/// Directory that caches downloaded models
pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub html_url: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

impl Release {
    /// The model is published as the first asset of a release
    pub fn model_asset(&self) -> Result<&ReleaseAsset> {
        self.assets.first().ok_or_else(|| Error::NoReleaseAssets {
            tag: self.tag_name.clone(),
        })
    }
}

/// Fetches model releases and caches them under a data directory.
pub struct ModelFetcher {
    client: Client,
    release_url: String,
    data_dir: PathBuf,
}

impl ModelFetcher {
    pub fn new(release_url: impl Into<String>, data_dir: impl Into<PathBuf>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            release_url: release_url.into(),
            data_dir: data_dir.into(),
        })
    }

    /// Check for, or download, the latest model release. Returns the local path.
    pub fn use_release(&self) -> Result<PathBuf> {
        let release = self.latest_release()?;
        self.ensure_cached(&release)
    }

    pub fn latest_release(&self) -> Result<Release> {
        let response = self
            .client
            .get(&self.release_url)
            .header(ACCEPT, "application/vnd.github.v3+json")
            .send()?
            .error_for_status()?;
        Ok(serde_json::from_reader(response)?)
    }

    /// Local path the model asset of `release` is cached at
    pub fn cached_path(&self, release: &Release) -> Result<PathBuf> {
        Ok(self.data_dir.join(&release.model_asset()?.name))
    }

    /// Download the model asset unless it is already cached.
    pub fn ensure_cached(&self, release: &Release) -> Result<PathBuf> {
        let output_path = self.cached_path(release)?;
        if output_path.exists() {
            info!(
                "Model from DeepForest release {} was already downloaded. Loading model from file.",
                release.html_url
            );
            return Ok(output_path);
        }

        info!(
            "Downloading model from DeepForest release {}, see {} for details",
            release.tag_name, release.html_url
        );
        fs::create_dir_all(&self.data_dir)?;
        self.download(release.model_asset()?, &output_path)?;
        Ok(output_path)
    }

    // Streams into a sibling .part file that is renamed into place once complete
    fn download(&self, asset: &ReleaseAsset, output_path: &Path) -> Result<()> {
        let response = self
            .client
            .get(&asset.browser_download_url)
            .send()?
            .error_for_status()?;

        let pb = match response.content_length() {
            Some(len) => create_download_bar(len, &asset.name),
            None => ProgressBar::new_spinner(),
        };

        let partial_path = output_path.with_extension("part");
        let mut writer = BufWriter::new(File::create(&partial_path)?);
        let copied = io::copy(&mut pb.wrap_read(response), &mut writer);
        let flushed = copied.and_then(|_| writer.flush());
        if let Err(e) = flushed {
            pb.abandon();
            let _ = fs::remove_file(&partial_path);
            return Err(e.into());
        }
        drop(writer);

        fs::rename(&partial_path, output_path)?;
        pb.finish_with_message(format!("Downloaded {}", asset.name));
        Ok(())
    }
}
