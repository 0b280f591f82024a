/*!
 * Tests for file and directory utilities
 */

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use csvbridge::file_utils::FileManager;
use crate::common;

#[test]
fn test_findFiles_shouldRecurseMatchSuffixCaseInsensitivelyAndSort() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(root, "b.csv", b"")?;
    common::create_test_file(root, "A.CSV", b"")?;
    common::create_test_file(root, "nested/deeper/c.csv", b"")?;
    common::create_test_file(root, "notes.txt", b"")?;

    let files = FileManager::find_files(root, ".csv")?;

    let names: Vec<PathBuf> = files
        .iter()
        .map(|f| f.strip_prefix(root).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        names,
        vec![
            PathBuf::from("A.CSV"),
            PathBuf::from("b.csv"),
            PathBuf::from("nested/deeper/c.csv"),
        ]
    );
    Ok(())
}

#[test]
fn test_findFiles_shouldSkipWorkFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let data = common::create_test_file(temp_dir.path(), "data.csv", b"")?;
    fs::write(FileManager::work_path(&data), b"")?;

    let files = FileManager::find_files(temp_dir.path(), ".csv")?;
    assert_eq!(files, vec![data]);
    Ok(())
}

#[test]
fn test_findFiles_withEmptyDir_shouldReturnNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    assert!(FileManager::find_files(temp_dir.path(), ".csv")?.is_empty());
    Ok(())
}

#[test]
fn test_workPath_shouldSitNextToSource() {
    let work = FileManager::work_path("/data/report.csv");
    assert_eq!(work, PathBuf::from("/data/report_utf8_translated.csv"));
    assert_eq!(FileManager::work_source(&work), Some(PathBuf::from("/data/report.csv")));
    assert_eq!(FileManager::work_source("/data/report.csv"), None);
}

#[test]
fn test_findFiles_withWorkFileNameButNoSource_shouldStillSkipIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let orphan = common::create_test_file(temp_dir.path(), "sales_utf8_translated.csv", b"a\n")?;

    assert!(FileManager::find_files(temp_dir.path(), ".csv")?.is_empty());
    assert!(!FileManager::work_source(&orphan).is_some_and(|source| source.exists()));
    Ok(())
}

#[test]
fn test_writeAtomic_shouldReplaceContentWithoutLeftovers() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let target = common::create_test_file(temp_dir.path(), "a.csv", b"old")?;

    FileManager::write_atomic(&target, b"new content")?;

    assert_eq!(fs::read(&target)?, b"new content");
    let entries = fs::read_dir(temp_dir.path())?.count();
    assert_eq!(entries, 1, "no temporary file may remain");
    Ok(())
}

#[test]
fn test_writeAtomic_withMissingDirectory_shouldFailAndCreateNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let target = temp_dir.path().join("absent").join("a.csv");

    assert!(FileManager::write_atomic(&target, b"x").is_err());
    assert!(!target.exists());
    Ok(())
}

#[test]
fn test_removeQuietly_withMissingFile_shouldSucceed() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    assert!(FileManager::remove_quietly(temp_dir.path().join("nope.csv")));
    Ok(())
}
