use crate::error::SyncError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// The generated TypeScript module. `source` names the file the version came from.
pub fn render_version_module(version: &str, source: &str) -> String {
    format!(
        "/**\n * ⚠️ AUTO-GENERATED — DO NOT EDIT\n * Source: {source}\n */\n\nexport const APP_VERSION = '{version}';\n"
    )
}

/// Replace `path` with `contents` via a sibling temp file so readers never see
/// a half-written module.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), SyncError> {
    let write_err = |source| SyncError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

pub(crate) fn read_source(path: &Path) -> Result<String, SyncError> {
    std::fs::read_to_string(path).map_err(|source| SyncError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn rendered_module_has_banner_and_constant() {
        let out = render_version_module("1.2.3", "formulus/src/version.ts");
        assert!(out.starts_with("/**\n * ⚠️ AUTO-GENERATED — DO NOT EDIT\n"));
        assert!(out.contains(" * Source: formulus/src/version.ts\n"));
        assert!(out.ends_with("export const APP_VERSION = '1.2.3';\n"));
    }

    #[test]
    fn write_atomic_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("version.ts");
        std::fs::write(&path, "stale").unwrap();
        write_atomic(&path, "fresh").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh");
        // no temp files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn write_atomic_reports_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("version.ts");
        let err = write_atomic(&path, "x").unwrap_err();
        assert!(matches!(err, SyncError::Write { .. }));
    }
}
