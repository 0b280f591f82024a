use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

// @module: File and directory utilities

/// Suffix tag of the UTF-8 work file holding translated rows
pub const WORK_FILE_TAG: &str = "utf8_translated";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    /// Find files under `dir` whose name ends with `suffix`, ignoring case
    ///
    /// Work files left by an interrupted run are not listed. The result is sorted.
    pub fn find_files<P: AsRef<Path>>(dir: P, suffix: &str) -> Result<Vec<PathBuf>> {
        let suffix = suffix.to_lowercase();
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if !name.ends_with(&suffix) {
                continue;
            }
            match Self::work_source(path) {
                Some(source) if source.is_file() => {
                    debug!("Skipping work file {}", path.display());
                }
                Some(source) => {
                    warn!(
                        "Skipping {}: its name marks it as the work file of {}, which does not exist",
                        path.display(),
                        source.display()
                    );
                }
                None => result.push(path.to_path_buf()),
            }
        }

        result.sort();
        Ok(result)
    }

    // @generates: `<stem>_<tag><ext>` next to `file`
    pub fn tagged_path<P: AsRef<Path>>(file: P, tag: &str) -> PathBuf {
        let file = file.as_ref();
        let stem = file.file_stem().unwrap_or_default().to_string_lossy();
        let name = match file.extension() {
            Some(ext) => format!("{}_{}.{}", stem, tag, ext.to_string_lossy()),
            None => format!("{}_{}", stem, tag),
        };
        file.with_file_name(name)
    }

    /// Work file receiving the translated rows of `file`
    pub fn work_path<P: AsRef<Path>>(file: P) -> PathBuf {
        Self::tagged_path(file, WORK_FILE_TAG)
    }

    /// Source file a work file belongs to, or None when `path` is not a work file
    pub fn work_source<P: AsRef<Path>>(path: P) -> Option<PathBuf> {
        let path = path.as_ref();
        let stem = path.file_stem()?.to_string_lossy();
        let source_stem = stem.strip_suffix(&format!("_{}", WORK_FILE_TAG))?;
        let name = match path.extension() {
            Some(ext) => format!("{}.{}", source_stem, ext.to_string_lossy()),
            None => source_stem.to_string(),
        };
        Some(path.with_file_name(name))
    }

    /// Replace `target` with `bytes` through a synced temporary file and one rename
    ///
    /// On failure `target` is left as it was.
    pub fn write_atomic<P: AsRef<Path>>(target: P, bytes: &[u8]) -> io::Result<()> {
        let target = target.as_ref();
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;

        if let Ok(metadata) = fs::metadata(target) {
            // Keep the original's permissions when possible
            let _ = fs::set_permissions(temp.path(), metadata.permissions());
        }

        temp.persist(target).map_err(|e| e.error)?;
        Ok(())
    }

    /// Delete `path` if present, logging instead of failing
    pub fn remove_quietly<P: AsRef<Path>>(path: P) -> bool {
        let path = path.as_ref();
        match fs::remove_file(path) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => {
                warn!("Failed to remove temporary file {}: {}", path.display(), e);
                false
            }
        }
    }
}
