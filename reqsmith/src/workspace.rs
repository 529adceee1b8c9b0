//! Output directory for the generated app.
//!
//! Exactly two files live here, `index.html` and `main.js`. They are
//! written by `implementation`, read back by the review stages and
//! overwritten by every refactor.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::artifacts::{GeneratedAppFiles, WrittenFiles};

pub const HTML_FILE: &str = "index.html";
pub const JS_FILE: &str = "main.js";

/// The app output directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn html_path(&self) -> PathBuf {
        self.root.join(HTML_FILE)
    }

    pub fn js_path(&self) -> PathBuf {
        self.root.join(JS_FILE)
    }

    /// Write both files, creating the directory as needed.
    pub async fn save(&self, files: &GeneratedAppFiles) -> Result<WrittenFiles> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create {}", self.root.display()))?;
        write(&self.html_path(), &files.html_content).await?;
        write(&self.js_path(), &files.js_content).await?;
        Ok(WrittenFiles {
            html: self.html_path().display().to_string(),
            javascript: self.js_path().display().to_string(),
        })
    }

    /// Read both files back; either missing is an error.
    pub async fn load(&self) -> Result<GeneratedAppFiles> {
        Ok(GeneratedAppFiles {
            html_content: read(&self.html_path()).await?,
            js_content: read(&self.js_path()).await?,
        })
    }

    /// Read a file if it exists and is readable.
    pub async fn read_optional(&self, name: &str) -> Option<String> {
        tokio::fs::read_to_string(self.root.join(name)).await.ok()
    }
}

async fn write(path: &Path, content: &str) -> Result<()> {
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = content.len(), "Wrote file");
    Ok(())
}

async fn read(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(tag: &str) -> GeneratedAppFiles {
        GeneratedAppFiles {
            html_content: format!("<p>{tag}</p>"),
            js_content: format!("console.log('{tag}');"),
        }
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path().join("out"));

        let written = ws.save(&files("v1")).await.unwrap();
        assert!(written.html.ends_with("index.html"));
        assert!(written.javascript.ends_with("main.js"));
        assert_eq!(ws.load().await.unwrap(), files("v1"));

        ws.save(&files("v2")).await.unwrap();
        assert_eq!(ws.load().await.unwrap(), files("v2"));
    }

    #[tokio::test]
    async fn missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        assert!(ws.load().await.is_err());
        assert!(ws.read_optional(HTML_FILE).await.is_none());
    }
}
