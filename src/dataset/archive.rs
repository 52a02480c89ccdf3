//! Archive unpacking and relocation of the records directory

use crate::error::{AsnError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use zip::ZipArchive;

/// Unpack a zip archive into `dest`
///
/// Parent directories are created as needed and unix file modes stored in
/// the archive are applied. Entries whose names would escape `dest` are
/// skipped. The name of every top-level item that gets created is recorded
/// in `created`, also when unpacking fails halfway, so the caller can remove
/// it afterwards.
///
/// Returns the number of entries processed.
pub fn unpack(
    archive: &Path,
    dest: &Path,
    show_progress: bool,
    created: &mut BTreeSet<OsString>,
) -> Result<usize> {
    let file = File::open(archive).map_err(|e| AsnError::fs(archive, e))?;
    let mut zip = ZipArchive::new(file)
        .map_err(|e| AsnError::Archive(format!("failed to open zip archive: {e}")))?;

    let bar = extract_bar(zip.len() as u64, show_progress);

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| AsnError::Archive(format!("invalid entry #{i}: {e}")))?;

        let Some(rel) = entry.enclosed_name() else {
            warn!("skipping archive entry with unsafe path: {}", entry.name());
            bar.inc(1);
            continue;
        };
        if let Some(Component::Normal(top)) = rel.components().next() {
            created.insert(top.to_os_string());
        }

        let path = dest.join(&rel);
        if entry.is_dir() {
            fs::create_dir_all(&path).map_err(|e| AsnError::fs(&path, e))?;
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| AsnError::fs(parent, e))?;
            }
            let mut out = File::create(&path).map_err(|e| AsnError::fs(&path, e))?;
            io::copy(&mut entry, &mut out).map_err(|e| match e.kind() {
                io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                    AsnError::Archive(format!("corrupt entry {}: {e}", entry.name()))
                }
                _ => AsnError::fs(&path, e),
            })?;
        }

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(mode))
                .map_err(|e| AsnError::fs(&path, e))?;
        }

        bar.inc(1);
    }

    bar.finish_with_message("Extraction completed!");
    Ok(zip.len())
}

/// Find the unpacked folder holding the records directory
///
/// The folder name carries a version or branch suffix that is not known in
/// advance, so it is matched by `prefix` among the top-level items the
/// archive created. Returns the path of `<folder>/<records_subdir>`.
pub fn locate_records(
    dest: &Path,
    created: &BTreeSet<OsString>,
    prefix: &str,
    records_subdir: &str,
) -> Option<PathBuf> {
    created
        .iter()
        .filter(|name| name.to_string_lossy().starts_with(prefix))
        .map(|name| dest.join(name).join(records_subdir))
        .find(|records| records.is_dir())
}

/// Move `src` to `dest`, replacing whatever is at `dest`
///
/// Falls back to copy-then-delete when a plain rename is not possible, e.g.
/// when the cache lives on another filesystem than the work directory.
pub fn relocate(src: &Path, dest: &Path) -> Result<()> {
    if dest.exists() {
        fs::remove_dir_all(dest).map_err(|e| AsnError::fs(dest, e))?;
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| AsnError::fs(parent, e))?;
    }

    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(
                "rename {} -> {} failed ({e}), copying instead",
                src.display(),
                dest.display()
            );
            copy_dir(src, dest)?;
            fs::remove_dir_all(src).map_err(|e| AsnError::fs(src, e))
        }
    }
}

/// Remove the temporary archive and every top-level item it unpacked
///
/// Failures are logged and otherwise ignored.
pub fn cleanup(archive: &Path, dest: &Path, created: &BTreeSet<OsString>) {
    if archive.exists() {
        if let Err(e) = fs::remove_file(archive) {
            warn!("failed to remove {}: {e}", archive.display());
        }
    }
    for name in created {
        let path = dest.join(name);
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else if path.exists() {
            fs::remove_file(&path)
        } else {
            Ok(())
        };
        if let Err(e) = result {
            warn!("failed to remove {}: {e}", path.display());
        }
    }
}

fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).map_err(|e| AsnError::fs(dest, e))?;
    for entry in fs::read_dir(src).map_err(|e| AsnError::fs(src, e))? {
        let entry = entry.map_err(|e| AsnError::fs(src, e))?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| AsnError::fs(&from, e))?;
        if file_type.is_dir() {
            copy_dir(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|e| AsnError::fs(&to, e))?;
        }
    }
    Ok(())
}

fn extract_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::with_template("[+] Extracting ASN DB [{bar:50.green}] {percent:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("## "),
    );
    bar
}
