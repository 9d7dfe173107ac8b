use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Replace `path` with `contents` through a sibling temp file and a rename, so
/// readers never observe a half-written file.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(contents)?;
    temp.flush()?;
    temp.persist(path).map_err(|e| e.error)?;
    tracing::trace!("Wrote {} bytes to {:?}", contents.len(), path);
    Ok(())
}
