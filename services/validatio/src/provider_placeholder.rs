use annotation::{kipp, Example, Project};
use async_trait::async_trait;

use crate::provider::{KippProvider, ProviderInfo};

/// Answers every prompt with the canned suggestion; no model is called.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderProvider;

impl PlaceholderProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl KippProvider for PlaceholderProvider {
    async fn reply(
        &self,
        project: &Project,
        prompt: &str,
        context: Option<&Example>,
    ) -> anyhow::Result<String> {
        tracing::debug!(project_id = %project.id, prompt_len = prompt.len(), "placeholder reply");
        Ok(kipp::suggestion(project, context))
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "placeholder".to_string(),
            base_url: None,
        }
    }
}
