//! Template expansion collaborator.
//!
//! The rendering engine itself is outside the pipeline's core: given a
//! source tree and a data context it produces an expanded tree, failing
//! per file on render error. [`VerbatimRenderer`] is the shipped
//! implementation, copying the tree without substitution; generators
//! with templated files plug in their own engine.

use crate::errors::{LaunchpadError, Result};
use async_trait::async_trait;
use std::path::Path;

/// Expands a template tree into a destination directory.
#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    /// Expands `source` into `destination` with `data` as the render
    /// context.
    async fn expand(
        &self,
        source: &Path,
        destination: &Path,
        data: &serde_json::Value,
    ) -> Result<()>;
}

/// Renderer that copies the template tree as-is.
#[derive(Debug, Default)]
pub struct VerbatimRenderer;

impl VerbatimRenderer {
    /// Creates a verbatim renderer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn copy_tree<'a>(
        source: &'a Path,
        destination: &'a Path,
    ) -> futures::future::BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let metadata = tokio::fs::metadata(source).await.map_err(|e| {
                LaunchpadError::validation(format!(
                    "failed to read template entry {}: {e}",
                    source.display()
                ))
            })?;

            if metadata.is_dir() {
                tokio::fs::create_dir_all(destination).await?;
                let mut entries = tokio::fs::read_dir(source).await?;
                while let Some(entry) = entries.next_entry().await? {
                    let name = entry.file_name();
                    Self::copy_tree(&source.join(&name), &destination.join(&name)).await?;
                }
                return Ok(());
            }

            tokio::fs::copy(source, destination).await?;
            Ok(())
        })
    }
}

#[async_trait]
impl TemplateRenderer for VerbatimRenderer {
    async fn expand(
        &self,
        source: &Path,
        destination: &Path,
        _data: &serde_json::Value,
    ) -> Result<()> {
        Self::copy_tree(source, destination).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn verbatim_renderer_copies_nested_tree() {
        let source = tempfile::tempdir().unwrap();
        let destination = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(source.path().join("src"))
            .await
            .unwrap();
        tokio::fs::write(source.path().join("README.md"), "hello")
            .await
            .unwrap();
        tokio::fs::write(source.path().join("src/main.txt"), "body")
            .await
            .unwrap();

        let renderer = VerbatimRenderer::new();
        renderer
            .expand(
                source.path(),
                destination.path(),
                &serde_json::Value::Null,
            )
            .await
            .unwrap();

        let copied = tokio::fs::read_to_string(destination.path().join("README.md"))
            .await
            .unwrap();
        assert_eq!(copied, "hello");
        let nested = tokio::fs::read_to_string(destination.path().join("src/main.txt"))
            .await
            .unwrap();
        assert_eq!(nested, "body");
    }

    #[tokio::test]
    async fn missing_source_fails_descriptively() {
        let destination = tempfile::tempdir().unwrap();
        let renderer = VerbatimRenderer::new();
        let err = renderer
            .expand(
                Path::new("/nonexistent/template"),
                destination.path(),
                &serde_json::Value::Null,
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/template"));
    }
}
