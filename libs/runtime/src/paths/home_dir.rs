use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

/// Resolve the server home directory.
///
/// - `Some(path)`: `~` / `~/...` is expanded against the user's home; relative
///   paths are made absolute against the current working directory.
/// - `None`: `<platform home>/<default_subdir>` (`%APPDATA%` on Windows).
///
/// When `create` is set the directory is created if missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let resolved = match configured {
        Some(raw) => expand(raw.trim())?,
        None => platform_base()?.join(default_subdir),
    };

    let resolved = if resolved.is_absolute() {
        resolved
    } else {
        std::env::current_dir()
            .context("cannot read current directory")?
            .join(resolved)
    };

    if create {
        std::fs::create_dir_all(&resolved)
            .with_context(|| format!("cannot create home_dir {}", resolved.display()))?;
    }
    Ok(resolved)
}

fn expand(raw: &str) -> Result<PathBuf> {
    if raw == "~" {
        return user_home();
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return Ok(user_home()?.join(rest));
    }
    Ok(PathBuf::from(raw))
}

fn user_home() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow!("cannot determine user home directory"))
}

#[cfg(target_os = "windows")]
fn platform_base() -> Result<PathBuf> {
    std::env::var_os("APPDATA")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("APPDATA is not set"))
}

#[cfg(not(target_os = "windows"))]
fn platform_base() -> Result<PathBuf> {
    user_home()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absolute_path_is_kept_and_created() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("nested").join("home");
        let resolved = resolve_home_dir(
            Some(target.to_string_lossy().to_string()),
            ".sensus",
            true,
        )
        .unwrap();
        assert_eq!(resolved, target);
        assert!(target.is_dir());
    }

    #[test]
    fn relative_path_becomes_absolute() {
        let resolved = resolve_home_dir(Some("relative/home".into()), ".sensus", false).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("relative/home"));
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn tilde_expands_to_user_home() {
        let resolved = resolve_home_dir(Some("~/.sensus_tilde".into()), ".sensus", false).unwrap();
        assert!(resolved.is_absolute());
        assert!(!resolved.to_string_lossy().contains('~'));
        assert!(resolved.ends_with(".sensus_tilde"));
    }
}
