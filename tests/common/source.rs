//! Video source that serves scripted formats and writes real transient files

#![allow(dead_code)]

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use tubedrop::download::{DownloadError, FetchResult, MediaMetadata, QualityOption, VideoSource};

/// What `fetch` does
#[derive(Debug, Clone)]
pub enum FetchScript {
    /// Writes a sparse file of `size_bytes` into a fresh workspace
    File { size_bytes: u64, transcoded: bool },
    NotFound,
    CompressionFailed,
}

pub struct ScriptedSource {
    /// Parent of every fetch workspace; must stay empty after each flow
    root: PathBuf,
    options: Vec<QualityOption>,
    list_fails: bool,
    fetch: FetchScript,
    fetches: Mutex<Vec<(String, String)>>,
}

impl ScriptedSource {
    pub fn new(root: PathBuf, options: Vec<QualityOption>, fetch: FetchScript) -> Self {
        Self {
            root,
            options,
            list_fails: false,
            fetch,
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_list(root: PathBuf) -> Self {
        Self {
            list_fails: true,
            ..Self::new(root, Vec::new(), FetchScript::NotFound)
        }
    }

    /// `(video_id, quality)` of every fetch so far
    pub fn fetches(&self) -> Vec<(String, String)> {
        self.fetches.lock().unwrap().clone()
    }

    /// Entries left under the workspace root
    pub fn leftovers(&self) -> usize {
        std::fs::read_dir(&self.root).map(|dir| dir.count()).unwrap_or(0)
    }
}

pub fn option(height: u32, size_bytes: Option<u64>) -> QualityOption {
    let label = format!("{}p", height);
    QualityOption {
        description: label.clone(),
        label,
        rank: height,
        size_bytes,
        has_audio: true,
    }
}

#[async_trait]
impl VideoSource for ScriptedSource {
    async fn list_formats(&self, video_id: &str) -> Result<Vec<QualityOption>, DownloadError> {
        if self.list_fails {
            return Err(DownloadError::NotFound(video_id.to_string()));
        }
        Ok(self.options.clone())
    }

    async fn fetch(&self, video_id: &str, quality: &str) -> Result<FetchResult, DownloadError> {
        self.fetches
            .lock()
            .unwrap()
            .push((video_id.to_string(), quality.to_string()));

        match &self.fetch {
            FetchScript::NotFound => Err(DownloadError::NotFound(video_id.to_string())),
            FetchScript::CompressionFailed => Err(DownloadError::CompressionFailed("still too large".to_string())),
            FetchScript::File { size_bytes, transcoded } => {
                let workspace = tempfile::Builder::new().prefix("tubedrop-").tempdir_in(&self.root)?;
                let path = workspace.path().join(format!("{}.mp4", video_id));
                File::create(&path)?.set_len(*size_bytes)?;
                let metadata = MediaMetadata {
                    title: format!("Video {}", video_id),
                    description: Some("A test video".to_string()),
                    duration_secs: 60,
                    width: Some(1280),
                    height: Some(720),
                };
                Ok(FetchResult::new(workspace, path, *size_bytes, metadata, *transcoded))
            }
        }
    }
}
