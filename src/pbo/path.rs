use std::path::{Component, Path, PathBuf};

use super::error::{PboError, PboResult};

/// Separator used in stored entry names.
pub const ENTRY_SEPARATOR: char = '\\';

/// Name under which `file_path` is stored when archiving `root`.
pub fn entry_name(root: &Path, file_path: &Path) -> PboResult<String> {
    let rel = file_path
        .strip_prefix(root)
        .map_err(|_| PboError::UnsafePath(file_path.to_string_lossy().into_owned()))?;

    let mut out = String::new();
    for comp in rel.components() {
        match comp {
            Component::Normal(part) => {
                if !out.is_empty() {
                    out.push(ENTRY_SEPARATOR);
                }
                out.push_str(&part.to_string_lossy());
            }
            Component::CurDir => {}
            _ => return Err(PboError::UnsafePath(rel.to_string_lossy().into_owned())),
        }
    }

    if out.is_empty() {
        return Err(PboError::UnsafePath(file_path.to_string_lossy().into_owned()));
    }
    Ok(out)
}

/// Relative host path for a stored entry name.
///
/// Both `\` and `/` count as separators. Names that would land outside the
/// output directory are rejected.
pub fn host_path(name: &str) -> PboResult<PathBuf> {
    let mut out = PathBuf::new();
    for part in name.split(['\\', '/']) {
        match part {
            "" | "." => continue,
            ".." => return Err(PboError::UnsafePath(name.to_string())),
            p if p.contains(':') => return Err(PboError::UnsafePath(name.to_string())),
            p => out.push(p),
        }
    }
    if out.as_os_str().is_empty() {
        return Err(PboError::UnsafePath(name.to_string()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_names_use_backslashes() {
        let root = Path::new("/src/addon");
        let file = root.join("data").join("tex.paa");
        assert_eq!(entry_name(root, &file).unwrap(), "data\\tex.paa");
        assert_eq!(entry_name(root, &root.join("config.cpp")).unwrap(), "config.cpp");
    }

    #[test]
    fn entry_name_outside_root() {
        let err = entry_name(Path::new("/a/b"), Path::new("/a/c/d.txt")).unwrap_err();
        assert!(matches!(err, PboError::UnsafePath(_)));
        assert!(entry_name(Path::new("/a"), Path::new("/a")).is_err());
    }

    #[test]
    fn host_path_accepts_either_separator() {
        let expected: PathBuf = ["data", "sub", "x.bin"].iter().collect();
        assert_eq!(host_path("data\\sub\\x.bin").unwrap(), expected);
        assert_eq!(host_path("data/sub/x.bin").unwrap(), expected);
        assert_eq!(host_path("\\data\\.\\sub\\x.bin").unwrap(), expected);
    }

    #[test]
    fn host_path_rejects_escapes() {
        for name in ["..\\evil", "a/../../b", "C:\\windows", "\\", ""] {
            assert!(
                matches!(host_path(name), Err(PboError::UnsafePath(_))),
                "{name} accepted"
            );
        }
    }
}
