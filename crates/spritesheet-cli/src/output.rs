//! All-or-nothing output: every file is first written to a temporary sibling and
//! only moved into place once all of them have been written successfully.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// A fully written temporary file waiting to be moved onto `target`.
/// Dropping it deletes the temporary.
pub struct Staged {
    tmp: NamedTempFile,
    target: PathBuf,
}

impl Staged {
    pub fn target(&self) -> &Path {
        &self.target
    }
}

/// Writes `target`'s future content into a temporary file in the same directory.
pub fn stage<F>(target: &Path, write: F) -> anyhow::Result<Staged>
where
    F: FnOnce(&mut File) -> anyhow::Result<()>,
{
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).with_context(|| format!("create directory {}", dir.display()))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".spritesheet-")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .with_context(|| format!("create temporary file in {}", dir.display()))?;
    write(tmp.as_file_mut()).with_context(|| format!("write {}", target.display()))?;
    tmp.as_file_mut()
        .flush()
        .with_context(|| format!("flush {}", target.display()))?;
    debug!(target = %target.display(), tmp = %tmp.path().display(), "staged");

    Ok(Staged {
        tmp,
        target: target.to_path_buf(),
    })
}

/// Moves every staged file onto its target, in order. If one move fails, the
/// targets already moved in this call are removed again.
pub fn commit(files: Vec<Staged>) -> anyhow::Result<Vec<PathBuf>> {
    let mut written: Vec<PathBuf> = Vec::with_capacity(files.len());
    for Staged { tmp, target } in files {
        if let Err(e) = tmp.persist(&target) {
            for done in &written {
                if let Err(rm) = fs::remove_file(done) {
                    warn!(path = %done.display(), error = %rm, "could not remove partial output");
                }
            }
            return Err(e.error).with_context(|| format!("write {}", target.display()));
        }
        written.push(target);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .expect("read dir")
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn commit_moves_every_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = stage(&dir.path().join("atlas.png"), |f| Ok(f.write_all(b"png")?)).expect("stage");
        let b = stage(&dir.path().join("atlas.json"), |f| Ok(f.write_all(b"{}")?)).expect("stage");
        assert_eq!(entries(dir.path()).len(), 2, "temporaries live next to the targets");

        let written = commit(vec![a, b]).expect("commit");
        assert_eq!(written.len(), 2);
        assert_eq!(entries(dir.path()), vec!["atlas.json", "atlas.png"]);
        assert_eq!(fs::read(dir.path().join("atlas.json")).expect("read"), b"{}");
    }

    #[test]
    fn failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let image = stage(&dir.path().join("atlas.png"), |f| Ok(f.write_all(b"png")?)).expect("stage");
        let manifest = stage(&dir.path().join("atlas.json"), |_| anyhow::bail!("encoder failed"));
        assert!(manifest.is_err());
        drop(image);
        assert!(entries(dir.path()).is_empty());
    }

    #[test]
    fn failed_second_move_removes_the_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        // a directory in the way makes the rename fail
        fs::create_dir(dir.path().join("atlas.json")).expect("mkdir");
        let a = stage(&dir.path().join("atlas.png"), |f| Ok(f.write_all(b"png")?)).expect("stage");
        let b = stage(&dir.path().join("atlas.json"), |f| Ok(f.write_all(b"{}")?)).expect("stage");

        assert!(commit(vec![a, b]).is_err());
        assert_eq!(entries(dir.path()), vec!["atlas.json"]);
        assert!(dir.path().join("atlas.json").is_dir());
    }

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("nested/deeper/atlas.png");
        let s = stage(&target, |f| Ok(f.write_all(b"x")?)).expect("stage");
        assert_eq!(s.target(), target.as_path());
        commit(vec![s]).expect("commit");
        assert!(target.is_file());
    }
}
