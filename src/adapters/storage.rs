use crate::domain::model::Artifact;
use crate::domain::ports::ResultSink;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Writes artifacts into a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalSink {
    base_path: String,
}

impl LocalSink {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

#[async_trait]
impl ResultSink for LocalSink {
    async fn deliver(&self, artifact: &Artifact) -> Result<String> {
        let full_path = Path::new(&self.base_path).join(&artifact.name);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(&full_path).await?;
        file.write_all(&artifact.bytes).await?;
        file.flush().await?;

        tracing::debug!(
            "Wrote {} of {} declared bytes to {}",
            artifact.bytes.len(),
            artifact.size,
            full_path.display()
        );
        Ok(full_path.display().to_string())
    }
}
