//! Path discovery for the CLI's two input modes (§6): a directory
//! containing `.github/workflows`, or a single workflow file already
//! living inside one.

use camino::{Utf8Path, Utf8PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum DiscoverError {
    #[error("{0}: no such directory")]
    DirectoryNotFound(Utf8PathBuf),
    #[error("{0}/.github/workflows: no such directory")]
    WorkflowsDirectoryNotFound(Utf8PathBuf),
    #[error("{0}: no workflow files found")]
    NoWorkflowFiles(Utf8PathBuf),
    #[error("{0}: no such file")]
    FileNotFound(Utf8PathBuf),
    #[error("{0}: must live inside a `.github/workflows` directory")]
    NotInWorkflowsDirectory(Utf8PathBuf),
    #[error("failed to read {0}: {1}")]
    Io(Utf8PathBuf, std::io::Error),
}

/// Enumerates `.yml`/`.yaml` files directly under `<root>/.github/workflows`,
/// in lexicographic order.
pub fn discover_directory(root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, DiscoverError> {
    if !root.is_dir() {
        return Err(DiscoverError::DirectoryNotFound(root.to_path_buf()));
    }

    let workflows_dir = root.join(".github").join("workflows");
    if !workflows_dir.is_dir() {
        return Err(DiscoverError::WorkflowsDirectoryNotFound(root.to_path_buf()));
    }

    let mut paths = Vec::new();
    let entries = std::fs::read_dir(&workflows_dir)
        .map_err(|err| DiscoverError::Io(workflows_dir.clone(), err))?;

    for entry in entries {
        let entry = entry.map_err(|err| DiscoverError::Io(workflows_dir.clone(), err))?;
        let path = Utf8PathBuf::try_from(entry.path())
            .map_err(|err| DiscoverError::Io(workflows_dir.clone(), err.into()))?;

        if !path.is_file() {
            continue;
        }
        match path.extension() {
            Some("yml") | Some("yaml") => paths.push(path),
            _ => {}
        }
    }

    if paths.is_empty() {
        return Err(DiscoverError::NoWorkflowFiles(root.to_path_buf()));
    }

    paths.sort();
    Ok(paths)
}

/// Validates that `path` lies inside a `.github/workflows` directory.
pub fn discover_file(path: &Utf8Path) -> Result<Utf8PathBuf, DiscoverError> {
    if !path.is_file() {
        return Err(DiscoverError::FileNotFound(path.to_path_buf()));
    }

    let parent = path.parent();
    let grandparent = parent.and_then(Utf8Path::parent);

    let in_workflows = parent.map(|p| p.file_name() == Some("workflows")).unwrap_or(false);
    let in_dot_github = grandparent
        .map(|p| p.file_name() == Some(".github"))
        .unwrap_or(false);

    if !in_workflows || !in_dot_github {
        return Err(DiscoverError::NotInWorkflowsDirectory(path.to_path_buf()));
    }

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicU32, Ordering};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    fn tempdir() -> Utf8PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!("ghacheck-test-{}-{n}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        Utf8PathBuf::try_from(dir).unwrap()
    }

    #[test]
    fn directory_without_workflows_dir_errors() {
        let root = tempdir().join("no-workflows-here");
        fs::create_dir_all(&root).unwrap();
        let err = discover_directory(&root).unwrap_err();
        assert!(matches!(err, DiscoverError::WorkflowsDirectoryNotFound(_)));
    }

    #[test]
    fn directory_enumerates_sorted_yaml_files() {
        let root = tempdir().join("with-workflows");
        let workflows = root.join(".github").join("workflows");
        fs::create_dir_all(&workflows).unwrap();
        fs::write(workflows.join("b.yml"), "on: push\njobs: {}\n").unwrap();
        fs::write(workflows.join("a.yaml"), "on: push\njobs: {}\n").unwrap();
        fs::write(workflows.join("readme.md"), "not a workflow").unwrap();

        let found = discover_directory(&root).unwrap();
        let names: Vec<_> = found.iter().map(|p| p.file_name().unwrap()).collect();
        assert_eq!(names, vec!["a.yaml", "b.yml"]);
    }

    #[test]
    fn file_outside_workflows_directory_errors() {
        let root = tempdir().join("stray-file");
        fs::create_dir_all(&root).unwrap();
        let file = root.join("ci.yml");
        fs::write(&file, "on: push\njobs: {}\n").unwrap();

        let err = discover_file(&file).unwrap_err();
        assert!(matches!(err, DiscoverError::NotInWorkflowsDirectory(_)));
    }

    #[test]
    fn file_inside_workflows_directory_succeeds() {
        let root = tempdir().join("proper-layout");
        let workflows = root.join(".github").join("workflows");
        fs::create_dir_all(&workflows).unwrap();
        let file = workflows.join("ci.yml");
        fs::write(&file, "on: push\njobs: {}\n").unwrap();

        assert_eq!(discover_file(&file).unwrap(), file);
    }
}
