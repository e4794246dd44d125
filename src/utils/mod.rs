use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Replace filesystem-hostile characters so a generated title can name a file.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = sanitized.trim().trim_matches('.');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.chars().take(120).collect()
    }
}

/// Default output path derived from a title and format.
pub fn default_output_path(title: &str, extension: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", sanitize_filename(title), extension))
}

/// Resolve the user-requested output location. A directory gets a filename
/// derived from the title; anything else is used as given.
pub fn resolve_output_path(requested: PathBuf, title: &str, extension: &str) -> PathBuf {
    if requested.is_dir() {
        requested.join(default_output_path(title, extension))
    } else {
        requested
    }
}

/// External tools the pipeline shells out to
pub const REQUIRED_TOOLS: &[&str] = &["ffmpeg", "ffprobe", "yt-dlp"];

/// Optional tools only some configurations need
pub const OPTIONAL_TOOLS: &[&str] = &["whisper"];

/// Probe whether a command-line tool responds to `--version`.
pub async fn tool_available(tool: &str) -> bool {
    Command::new(tool)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Check every known tool, returning (name, available) pairs.
pub async fn check_dependencies() -> Vec<(&'static str, bool)> {
    let mut results = Vec::new();
    for tool in REQUIRED_TOOLS.iter().chain(OPTIONAL_TOOLS) {
        results.push((*tool, tool_available(tool).await));
    }
    results
}
