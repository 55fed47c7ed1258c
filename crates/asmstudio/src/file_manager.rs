use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default extension given to save targets typed without one.
pub const SOURCE_EXTENSION: &str = "s";

/// Writes the two persisted representations of a program: the source
/// text at the user-chosen path and the binary artifact next to it.
/// Each write is independent; the controller decides how to surface
/// failures, this layer only reports them.
pub struct FileManager;

impl FileManager {
    pub fn new() -> Self {
        Self
    }

    pub async fn write_text(&self, path: &Path, text: &str) -> Result<()> {
        self.prepare_parent(path).await?;
        fs::write(path, text.as_bytes())
            .await
            .map_err(|e| anyhow::anyhow!("cannot write {}: {}", path.display(), e))?;
        log::info!("Successfully wrote source to: {}", path.display());
        Ok(())
    }

    pub async fn write_binary(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.prepare_parent(path).await?;
        fs::write(path, bytes)
            .await
            .map_err(|e| anyhow::anyhow!("cannot write {}: {}", path.display(), e))?;
        log::info!("Successfully wrote binary to: {}", path.display());
        Ok(())
    }

    /// Sibling path for the binary artifact: the final extension
    /// segment is replaced by `.bin`. A path with no extension simply
    /// gains `.bin`.
    pub fn derived_binary_path(path: &Path) -> PathBuf {
        path.with_extension("bin")
    }

    /// Give a typed save target the standard source extension when the
    /// user left it off.
    pub fn ensure_source_extension(path: PathBuf) -> PathBuf {
        if path.extension().is_none() {
            path.with_extension(SOURCE_EXTENSION)
        } else {
            path
        }
    }

    async fn prepare_parent(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    anyhow::anyhow!("cannot create directory {}: {}", parent.display(), e)
                })?;
                log::info!("Created directory: {}", parent.display());
            }
        }
        Ok(())
    }
}

impl Default for FileManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_derived_binary_path_strips_final_extension() {
        assert_eq!(
            FileManager::derived_binary_path(Path::new("prog.s")),
            PathBuf::from("prog.bin")
        );
        assert_eq!(
            FileManager::derived_binary_path(Path::new("archive.tar.s")),
            PathBuf::from("archive.tar.bin")
        );
        assert_eq!(
            FileManager::derived_binary_path(Path::new("noext")),
            PathBuf::from("noext.bin")
        );
    }

    #[test]
    fn test_ensure_source_extension() {
        assert_eq!(
            FileManager::ensure_source_extension(PathBuf::from("prog")),
            PathBuf::from("prog.s")
        );
        assert_eq!(
            FileManager::ensure_source_extension(PathBuf::from("prog.as")),
            PathBuf::from("prog.as")
        );
    }

    #[tokio::test]
    async fn test_write_text_and_binary_are_independent() {
        let dir = TempDir::new().unwrap();
        let fm = FileManager::new();

        let text_path = dir.path().join("prog.s");
        fm.write_text(&text_path, "halt\n").await.unwrap();

        let binary_path = FileManager::derived_binary_path(&text_path);
        fm.write_binary(&binary_path, &[1, 2, 3, 4]).await.unwrap();

        assert_eq!(std::fs::read_to_string(&text_path).unwrap(), "halt\n");
        assert_eq!(std::fs::read(&binary_path).unwrap(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_write_creates_missing_parent() {
        let dir = TempDir::new().unwrap();
        let fm = FileManager::new();
        let nested = dir.path().join("sub").join("deep").join("prog.s");
        fm.write_text(&nested, "li r1, 1\n").await.unwrap();
        assert!(nested.exists());
    }

    #[tokio::test]
    async fn test_write_failure_is_reported_not_panicked() {
        let dir = TempDir::new().unwrap();
        let fm = FileManager::new();
        // A directory cannot be opened for writing as a file.
        let err = fm.write_text(dir.path(), "x").await.unwrap_err();
        assert!(err.to_string().contains("cannot write"));
    }
}
