//! Locating and verifying the engine executable.

use std::path::Path;

use tracing::warn;

use super::error::EngineError;

/// Make sure `path` names an executable file.
///
/// A file without any execute bit gets one chmod 0755 attempt. If it is still
/// not executable afterwards, the error names the path.
pub async fn ensure_executable(path: &Path) -> Result<(), EngineError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(EngineError::NotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(EngineError::NotExecutable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };

    if !metadata.is_file() {
        return Err(EngineError::NotExecutable {
            path: path.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }

    if is_executable(&metadata) {
        return Ok(());
    }

    repair_permissions(path).await
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}

#[cfg(unix)]
async fn repair_permissions(path: &Path) -> Result<(), EngineError> {
    use std::os::unix::fs::PermissionsExt;

    let not_executable = |reason: String| EngineError::NotExecutable {
        path: path.to_path_buf(),
        reason,
    };

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| not_executable(e.to_string()))?;
    warn!(path = %path.display(), "Attempted to set execute permission");

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| not_executable(e.to_string()))?;
    if is_executable(&metadata) {
        Ok(())
    } else {
        Err(not_executable("still not executable after chmod".to_string()))
    }
}

#[cfg(not(unix))]
async fn repair_permissions(_path: &Path) -> Result<(), EngineError> {
    Ok(())
}
