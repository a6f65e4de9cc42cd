use std::path::{Path, PathBuf};

/// Resolves `filename` the way a shell would: names containing `/` are taken
/// as paths, anything else is searched for in `PATH`.
pub fn find_path(filename: &str) -> Option<PathBuf> {
    if filename.contains('/') {
        let path = PathBuf::from(filename);
        return is_executable(&path).then_some(path);
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(filename))
        .find(|path| is_executable(path))
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match path.metadata() {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn explicit_paths_are_checked_directly() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("tool");
        fs::write(&tool, "#!/bin/sh\n").unwrap();

        let tool_str = tool.to_str().unwrap();
        assert_eq!(find_path(tool_str), None);

        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(find_path(tool_str), Some(tool.clone()));
    }

    #[test]
    fn missing_names_resolve_to_none() {
        assert_eq!(find_path("definitely-not-a-real-interpreter-name"), None);
        assert_eq!(find_path("/no/such/dir/python3"), None);
    }

    #[test]
    fn shell_is_found_in_path() {
        let sh = find_path("sh").expect("sh on PATH");
        assert!(sh.ends_with("sh"));
    }
}
