//! File expansion and receiver-side path handling

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::{LocalDropError, Result};
use crate::transfer::types::FileEntry;

/// A file together with the metadata needed to send it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileWithMetadata {
    /// Local path of the file
    pub path: PathBuf,
    /// Relative path used on the receiver side, `/`-separated
    pub relative_path: String,
    /// Size in bytes
    pub size: u64,
    /// Whether the file was transmitted successfully, `None` until known
    pub transmission_success: Option<bool>,
}

impl FileWithMetadata {
    pub fn new(path: PathBuf, relative_path: String, size: u64) -> Self {
        Self {
            path,
            relative_path,
            size,
            transmission_success: None,
        }
    }

    pub fn to_entry(&self) -> FileEntry {
        FileEntry {
            relative_path: self.relative_path.clone(),
            size: self.size,
        }
    }
}

/// Expand files and directories into a flat list of files with relative paths
///
/// Directories are walked recursively; each contained file keeps the
/// directory's own name as the first path component so the structure can be
/// rebuilt on the receiving side.
pub fn expand_files_with_relative_paths<P: AsRef<Path>>(
    paths: &[P],
) -> Result<Vec<FileWithMetadata>> {
    let mut result = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| {
            LocalDropError::not_found(format!("Cannot access {}: {}", path.display(), e))
        })?;

        if metadata.is_dir() {
            result.extend(expand_directory(path)?);
        } else {
            let name = file_name_of(path)?;
            result.push(FileWithMetadata::new(
                path.to_path_buf(),
                name,
                metadata.len(),
            ));
        }
    }

    Ok(result)
}

fn expand_directory(root: &Path) -> Result<Vec<FileWithMetadata>> {
    let root_name = file_name_of(root)?;
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| LocalDropError::file_operation(e.to_string()))?;
        let mut relative_path = root_name.clone();
        for component in relative.components() {
            relative_path.push('/');
            relative_path.push_str(&component.as_os_str().to_string_lossy());
        }

        let size = entry.metadata()?.len();
        files.push(FileWithMetadata::new(
            entry.path().to_path_buf(),
            relative_path,
            size,
        ));
    }

    Ok(files)
}

fn file_name_of(path: &Path) -> Result<String> {
    // canonicalize so that "." and ".." still yield a directory name
    let resolved = if path.file_name().is_none() {
        std::fs::canonicalize(path)?
    } else {
        path.to_path_buf()
    };
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            LocalDropError::validation(format!("{} has no file name", path.display()))
        })
}

/// Turn a wire relative path into a safe relative filesystem path
///
/// Rejects empty, absolute and parent-traversing paths.
pub fn sanitize_relative_path(relative_path: &str) -> Result<PathBuf> {
    let normalized = relative_path.replace('\\', "/");
    let mut sanitized = PathBuf::new();

    for part in normalized.split('/') {
        if part.is_empty() {
            if sanitized.as_os_str().is_empty() && normalized.starts_with('/') {
                return Err(LocalDropError::validation(format!(
                    "Absolute path not allowed: {}",
                    relative_path
                )));
            }
            continue;
        }
        match Path::new(part).components().next() {
            Some(Component::Normal(_)) if Path::new(part).components().count() == 1 => {
                sanitized.push(part)
            }
            Some(Component::CurDir) => {}
            _ => {
                return Err(LocalDropError::validation(format!(
                    "Unsafe path component '{}' in {}",
                    part, relative_path
                )));
            }
        }
    }

    if sanitized.as_os_str().is_empty() {
        return Err(LocalDropError::validation("Empty relative path"));
    }
    Ok(sanitized)
}

/// Candidate destinations under `dir`, in order of preference
///
/// `a.txt`, then `a (1).txt`, `a (2).txt`, ... without end.
pub fn destination_candidates(
    dir: &Path,
    relative: &Path,
) -> impl Iterator<Item = PathBuf> + use<> {
    let candidate = dir.join(relative);
    let parent = candidate
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dir.to_path_buf());
    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = candidate
        .extension()
        .map(|e| e.to_string_lossy().into_owned());

    std::iter::once(candidate).chain((1u32..).map(move |n| {
        let name = match &extension {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        parent.join(name)
    }))
}

/// Total size of all regular files below `dir`
pub fn dir_size(dir: &Path) -> Result<u64> {
    if !dir.is_dir() {
        return Err(LocalDropError::validation(format!(
            "{} is not an existing directory",
            dir.display()
        )));
    }

    Ok(WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_expand_single_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, b"hello").unwrap();

        let files = expand_files_with_relative_paths(&[&file]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "notes.txt");
        assert_eq!(files[0].size, 5);
        assert_eq!(files[0].transmission_success, None);
    }

    #[test]
    fn test_expand_directory_keeps_structure() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("album");
        fs::create_dir_all(root.join("2024/summer")).unwrap();
        fs::write(root.join("cover.png"), b"1234").unwrap();
        fs::write(root.join("2024/summer/beach.jpg"), b"12").unwrap();

        let files = expand_files_with_relative_paths(&[&root]).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["album/2024/summer/beach.jpg", "album/cover.png"]);
    }

    #[test]
    fn test_expand_missing_path() {
        let result = expand_files_with_relative_paths(&["/definitely/not/here"]);
        assert!(matches!(result, Err(LocalDropError::NotFound(_))));
    }

    #[test]
    fn test_sanitize_relative_path() {
        assert_eq!(
            sanitize_relative_path("album/cover.png").unwrap(),
            PathBuf::from("album").join("cover.png")
        );
        assert_eq!(
            sanitize_relative_path("./a//b.txt").unwrap(),
            PathBuf::from("a").join("b.txt")
        );
        assert!(sanitize_relative_path("../etc/passwd").is_err());
        assert!(sanitize_relative_path("a/../../b").is_err());
        assert!(sanitize_relative_path("/etc/passwd").is_err());
        assert!(sanitize_relative_path("..\\windows").is_err());
        assert!(sanitize_relative_path("").is_err());
        assert!(sanitize_relative_path("./").is_err());
    }

    #[test]
    fn test_destination_candidates() {
        let dir = TempDir::new().unwrap();
        let names: Vec<PathBuf> = destination_candidates(dir.path(), Path::new("docs/a.txt"))
            .take(3)
            .collect();
        assert_eq!(
            names,
            vec![
                dir.path().join("docs/a.txt"),
                dir.path().join("docs/a (1).txt"),
                dir.path().join("docs/a (2).txt"),
            ]
        );

        let mut readme = destination_candidates(dir.path(), Path::new("README")).skip(1);
        assert_eq!(readme.next(), Some(dir.path().join("README (1)")));
    }

    #[test]
    fn test_dir_size() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a"), vec![0u8; 10]).unwrap();
        fs::write(dir.path().join("sub/b"), vec![0u8; 5]).unwrap();

        assert_eq!(dir_size(dir.path()).unwrap(), 15);
        assert!(dir_size(&dir.path().join("a")).is_err());
    }
}
