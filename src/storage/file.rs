use std::path::{Component, Path, PathBuf};
use async_trait::async_trait;
use tokio::fs as async_fs;
use crate::error::{Error, Result};
use crate::interfaces::{CheckpointStore, RawSource};

/// Local directory holding the raw transaction log and the stage checkpoints
///
/// ## Layout
/// - **Raw log**: `{dir}/{file}`
/// - **Checkpoints**: `{dir}/{stage}.csv`, one file per stage, overwritten on save
///
/// The directory is created on the first checkpoint save. Saves are plain
/// writes, so a run that fails mid-save can leave a partial checkpoint behind.
pub struct FileStorage {
    dir: PathBuf,
    file: String,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>, file: impl Into<String>) -> Self {
        FileStorage {
            dir: dir.as_ref().to_path_buf(),
            file: file.into(),
        }
    }

    /// Path of the checkpoint for `stage`, refusing names that leave the directory.
    pub fn stage_path(&self, stage: &str) -> Result<PathBuf> {
        let name = format!("{}.csv", stage);
        let mut components = Path::new(&name).components();

        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.dir.join(name)),
            _ => Err(Error::Checkpoint {
                stage: stage.to_string(),
                reason: "invalid path".to_string(),
            }),
        }
    }
}

#[async_trait]
impl RawSource for FileStorage {
    async fn load(&self) -> Result<Vec<u8>> {
        let path = self.dir.join(&self.file);

        let data = async_fs::read(&path)
            .await
            .map_err(|e| Error::Source(format!("opening file {:?}: {}", path, e)))?;

        tracing::info!("Loaded {} bytes from {:?}", data.len(), path);
        Ok(data)
    }
}

#[async_trait]
impl CheckpointStore for FileStorage {
    async fn load_stage(&self, stage: &str) -> Result<Vec<u8>> {
        let path = self.stage_path(stage)?;

        let data = async_fs::read(&path)
            .await
            .map_err(|e| Error::Checkpoint {
                stage: stage.to_string(),
                reason: format!("opening file {:?}: {}", path, e),
            })?;

        tracing::info!("Loaded checkpoint {:?}", path);
        Ok(data)
    }

    async fn save_stage(&self, stage: &str, data: &[u8]) -> Result<()> {
        let path = self.stage_path(stage)?;

        async_fs::create_dir_all(&self.dir).await?;
        async_fs::write(&path, data).await?;

        tracing::info!("Saved checkpoint to {:?}", path);
        Ok(())
    }
}
