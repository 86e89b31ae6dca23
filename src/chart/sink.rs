//! Destinations for encoded chart images.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::CapacityError;

/// Trait implemented by anything that can persist a PNG-encoded chart.
#[async_trait]
pub trait ChartSink: Send + Sync {
    async fn write(&self, name: &str, png: Vec<u8>) -> Result<(), CapacityError>;
}

/// Writes `<dir>/<name>.png`, creating the directory on first use.
#[derive(Debug, Clone)]
pub struct PngDirectory {
    dir: PathBuf,
}

impl PngDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.png"))
    }
}

#[async_trait]
impl ChartSink for PngDirectory {
    async fn write(&self, name: &str, png: Vec<u8>) -> Result<(), CapacityError> {
        fs::create_dir_all(&self.dir).await.map_err(|err| {
            CapacityError::Io(format!("failed to create {}: {err}", self.dir.display()))
        })?;
        let path = self.path_for(name);
        fs::write(&path, &png)
            .await
            .map_err(|err| CapacityError::Io(format!("failed to write {}: {err}", path.display())))?;
        debug!(path = %path.display(), bytes = png.len(), "chart saved");
        Ok(())
    }
}

/// Keeps encoded charts in memory, mostly for tests and dry runs.
#[derive(Clone, Default)]
pub struct MemorySink {
    charts: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl MemorySink {
    /// Names and encoded bytes in write order.
    pub fn charts(&self) -> Vec<(String, Vec<u8>)> {
        self.charts.lock().expect("chart sink mutex poisoned").clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.charts
            .lock()
            .expect("chart sink mutex poisoned")
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl ChartSink for MemorySink {
    async fn write(&self, name: &str, png: Vec<u8>) -> Result<(), CapacityError> {
        let mut charts = self.charts.lock().expect("chart sink mutex poisoned");
        charts.push((name.to_string(), png));
        Ok(())
    }
}
