//! Finding program files on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

/// File extension of program scripts.
pub const SCRIPT_EXTENSION: &str = "bf";

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Nothing matched the requested name.
    #[error("script not found: {name}")]
    NotFound { name: String, searched: Vec<PathBuf> },

    #[error("failed to read script {}: {source}", .path.display())]
    Read { path: PathBuf, #[source] source: io::Error },

    #[error("failed to list scripts in {}: {source}", .dir.display())]
    ListDir { dir: PathBuf, #[source] source: io::Error },
}

/// Locate a script by path or by name inside `dir`.
///
/// Candidates, in order: `name` as given, `name.bf`, `dir/name`, `dir/name.bf`.
pub fn resolve(name: &str, dir: &Path) -> Result<PathBuf, ScriptError> {
    let mut searched = Vec::new();
    let direct = PathBuf::from(name);
    let in_dir = dir.join(name);

    for candidate in [
        direct.clone(),
        with_extension(&direct),
        in_dir.clone(),
        with_extension(&in_dir),
    ] {
        if searched.contains(&candidate) {
            continue;
        }
        if candidate.is_file() {
            return Ok(candidate);
        }
        searched.push(candidate);
    }

    warn!(script = name, dir = %dir.display(), "script not found");
    Err(ScriptError::NotFound {
        name: name.to_string(),
        searched,
    })
}

/// Read a script in full. Scripts are UTF-8 text.
pub fn load(path: &Path) -> Result<String, ScriptError> {
    fs::read_to_string(path).map_err(|source| ScriptError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Names (without extension) of every script in `dir`, sorted.
pub fn list(dir: &Path) -> Result<Vec<String>, ScriptError> {
    let entries = fs::read_dir(dir).map_err(|source| ScriptError::ListDir {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ScriptError::ListDir {
            dir: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(SCRIPT_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}

fn with_extension(path: &Path) -> PathBuf {
    if path.extension().and_then(|e| e.to_str()) == Some(SCRIPT_EXTENSION) {
        path.to_path_buf()
    } else {
        let mut os = path.as_os_str().to_owned();
        os.push(".");
        os.push(SCRIPT_EXTENSION);
        PathBuf::from(os)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripts_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("hello.bf"), "+.").unwrap();
        fs::write(dir.path().join("add.bf"), "++.").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a script").unwrap();
        fs::create_dir(dir.path().join("nested.bf")).unwrap();
        dir
    }

    #[test]
    fn list_returns_sorted_script_names_only() {
        let dir = scripts_dir();
        assert_eq!(list(dir.path()).unwrap(), vec!["add", "hello"]);
    }

    #[test]
    fn resolve_accepts_name_with_or_without_extension() {
        let dir = scripts_dir();
        let expected = dir.path().join("hello.bf");
        assert_eq!(resolve("hello", dir.path()).unwrap(), expected);
        assert_eq!(resolve("hello.bf", dir.path()).unwrap(), expected);
    }

    #[test]
    fn resolve_accepts_a_direct_path() {
        let dir = scripts_dir();
        let path = dir.path().join("add.bf");
        let found = resolve(path.to_str().unwrap(), Path::new("elsewhere")).unwrap();
        assert_eq!(found, path);
        assert_eq!(load(&found).unwrap(), "++.");
    }

    #[test]
    fn missing_script_reports_candidates() {
        let dir = scripts_dir();
        let err = resolve("nope", dir.path()).unwrap_err();
        match err {
            ScriptError::NotFound { name, searched } => {
                assert_eq!(name, "nope");
                assert!(searched.contains(&dir.path().join("nope.bf")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_directory_is_a_list_error() {
        let dir = scripts_dir();
        let err = list(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, ScriptError::ListDir { .. }));
    }
}
