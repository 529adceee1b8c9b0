//! Source document loading.
//!
//! PDFs go through the external `pdftotext` tool; anything else is read as
//! UTF-8 text.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tokio::process::Command;

/// Load the text of the document at `path`.
pub async fn load(path: &Path) -> Result<String> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        bail!("Document not found at: {}", path.display());
    }

    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    let text = if is_pdf {
        pdf_to_text(path).await?
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?
    };

    tracing::info!(
        path = %path.display(),
        chars = text.chars().count(),
        "Loaded source document"
    );
    Ok(text)
}

async fn pdf_to_text(path: &Path) -> Result<String> {
    let output = Command::new("pdftotext")
        .arg("-layout")
        .arg(path)
        .arg("-")
        .output()
        .await
        .context("Failed to run pdftotext (is poppler-utils installed?)")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext failed on {} [exit code: {}]: {}",
            path.display(),
            output.status.code().unwrap_or(-1),
            stderr.trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brief.md");
        tokio::fs::write(&path, "# Brief\nBuild a todo app.").await.unwrap();

        let text = load(&path).await.unwrap();
        assert!(text.contains("todo app"));
    }

    #[tokio::test]
    async fn missing_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("nope.pdf")).await.unwrap_err();
        assert!(err.to_string().contains("Document not found"));
    }
}
