use annotation::{Example, Project};
use async_trait::async_trait;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    /// `None` for providers that answer locally.
    pub base_url: Option<String>,
}

/// Backend behind the KIPP chat panel.
#[async_trait]
pub trait KippProvider: Send + Sync {
    async fn reply(
        &self,
        project: &Project,
        prompt: &str,
        context: Option<&Example>,
    ) -> anyhow::Result<String>;
    fn info(&self) -> ProviderInfo;
}
