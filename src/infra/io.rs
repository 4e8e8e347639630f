use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Read a source file, replacing invalid UTF-8 instead of failing
pub fn read_source<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read file {}", path.display()))?;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            tracing::warn!(path = %path.display(), "source is not valid UTF-8; decoding lossily");
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

/// Write `text` to `root/rel`, creating parent directories
pub fn write_file(root: &Path, rel: &Path, text: &str) -> Result<()> {
    let dest = root.join(rel);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    fs::write(&dest, text).with_context(|| format!("Failed to write {}", dest.display()))
}

/// Copy `src` to `root/rel` unless it is already there
pub fn copy_once(src: &Path, root: &Path, rel: &Path) -> Result<()> {
    let dest = root.join(rel);
    if dest.exists() {
        return Ok(());
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    fs::copy(src, &dest)
        .with_context(|| format!("Failed to copy {} to {}", src.display(), dest.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_file_creates_parents() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), Path::new("p/methods/3.java"), "void f() {}").unwrap();

        let back = fs::read_to_string(dir.path().join("p/methods/3.java")).unwrap();
        assert_eq!(back, "void f() {}");
    }

    #[test]
    fn copy_once_keeps_first_copy() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.java");
        let b = dir.path().join("b.java");
        fs::write(&a, "first").unwrap();
        fs::write(&b, "second").unwrap();

        copy_once(&a, dir.path(), Path::new("out/x.java")).unwrap();
        copy_once(&b, dir.path(), Path::new("out/x.java")).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("out/x.java")).unwrap(), "first");
    }

    #[test]
    fn read_source_tolerates_bad_utf8() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("bad.java");
        fs::write(&p, b"class A { String s = \"\xff\"; }").unwrap();

        let text = read_source(&p).unwrap();
        assert!(text.starts_with("class A"));
    }
}
