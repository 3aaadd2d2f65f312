use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// Resolve the server home directory into an absolute path.
///
/// - `None` (or empty) → `<platform home>/<default_subdir>`
/// - leading `~` is expanded against the platform home
/// - relative paths are resolved against the current working directory
///
/// When `create` is set the directory is created if missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let resolved = match configured.filter(|s| !s.trim().is_empty()) {
        Some(raw) => expand_and_absolutize(raw.trim())?,
        None => platform_home()?.join(default_subdir),
    };

    if create {
        std::fs::create_dir_all(&resolved)
            .with_context(|| format!("Failed to create home dir {}", resolved.display()))?;
    }
    Ok(resolved)
}

fn platform_home() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine the user home directory"))
}

fn expand_and_absolutize(raw: &str) -> Result<PathBuf> {
    let expanded = if raw == "~" {
        platform_home()?
    } else if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        platform_home()?.join(rest)
    } else {
        PathBuf::from(raw)
    };

    if expanded.is_absolute() {
        return Ok(expanded);
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(expanded))
}

/// Resolve `file` against `base_dir` unless it is already absolute.
pub fn resolve_under(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}
