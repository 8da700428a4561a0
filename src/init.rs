use anyhow::{Context, Result, bail};
use std::path::Path;
use tokio::fs;

/// Tools the assembler shells out to.
const REQUIRED_TOOLS: &[&str] = &["ffmpeg", "ffprobe"];

async fn tool_runs(tool: &str) -> bool {
    match tokio::process::Command::new(tool)
        .arg("-version")
        .output()
        .await
    {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

/// Fails unless every required tool answers `-version`.
pub async fn check_ffmpeg() -> Result<()> {
    for tool in REQUIRED_TOOLS {
        if !tool_runs(tool).await {
            bail!("{} not found on PATH or not working; install FFmpeg first", tool);
        }
    }
    Ok(())
}

/// Creates the parent directory of `path` when it has one.
pub async fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !fs::try_exists(parent).await.unwrap_or(false) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create dir {}", parent.display()))?;
            tracing::info!("Created directory: {}", parent.display());
        }
    }
    Ok(())
}
