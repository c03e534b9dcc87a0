//! Small async filesystem helpers shared by the registry store and the
//! file-backed vault store.

use std::path::Path;

use rand::RngCore;
use tokio::fs;

use crate::errors::Result;

/// Replace `path` with `bytes` via temp file + rename.
///
/// The temp file sits in the same directory so the rename stays on one
/// filesystem. Concurrent writers each get their own temp name; the last
/// rename wins.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let mut nonce = [0u8; 6];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    let tmp_path = parent.join(format!(
        ".{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        hex::encode(nonce)
    ));

    fs::write(&tmp_path, bytes).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600)).await?;
    }

    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }
    Ok(())
}

/// Create `dir` (and parents) if missing, owner-only on unix.
pub fn ensure_private_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)?;
    Ok(())
}
