/// Helper utilities for Server Check

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::constants::APP_NAME;

/// Get the per-user config directory (`~/.config/server-check`)
///
/// The directory is not created here, see [`ensure_private_dir`].
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join(APP_NAME))
}

/// Create a directory (and parents) readable only by the current user
pub fn ensure_private_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }

    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o700))
            .with_context(|| format!("Failed to restrict permissions on {}", path.display()))?;
    }

    Ok(())
}

/// Strip trailing line separators from remote command output
pub fn strip_line_endings(output: &str) -> String {
    output.trim_end_matches(['\r', '\n']).to_string()
}

/// Clip text to at most `width` characters
pub fn fit_width(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_line_endings() {
        assert_eq!(strip_line_endings("30%\n"), "30%");
        assert_eq!(strip_line_endings("30%\r\n\r\n"), "30%");
        assert_eq!(strip_line_endings("a\nb\n"), "a\nb");
        assert_eq!(strip_line_endings(""), "");
    }

    #[test]
    fn test_fit_width() {
        assert_eq!(fit_width("Intel(R) Xeon(R) CPU E5-2680 v4", 10), "Intel(R) X");
        assert_eq!(fit_width("short", 10), "short");
        assert_eq!(fit_width("héllo", 2), "hé");
    }

    #[test]
    fn test_ensure_private_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("a").join("b");

        ensure_private_dir(&dir).unwrap();
        assert!(dir.is_dir());
        // second call is a no-op
        ensure_private_dir(&dir).unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&dir).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o700);
        }
    }

    #[test]
    fn test_config_dir_ends_with_app_name() {
        if let Ok(dir) = config_dir() {
            assert!(dir.ends_with(".config/server-check"));
        }
    }
}
