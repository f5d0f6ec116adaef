use crate::domain::model::{Artifact, ParseOptions, SerializerOptions};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Where a finished artifact goes. One write per export; callers do not retry.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Returns a human-readable location of the delivered artifact.
    async fn deliver(&self, artifact: &Artifact) -> Result<String>;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> Option<&str>;
    fn output_path(&self) -> &str;
    fn file_name(&self) -> &str;
    fn parse_options(&self) -> ParseOptions;
    fn serializer_options(&self) -> SerializerOptions;
    fn disabled_transforms(&self) -> Vec<String>;
    fn batch_size(&self) -> usize;
}
