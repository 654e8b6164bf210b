use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{info, warn};

use super::BackupError;

pub fn archive_file_name(stamp: &str) -> String {
    format!("wagtail_media_{stamp}.tar.gz")
}

/// Archives the media root as `<dir name>/...` into a gzip tarball in `backup_dir`.
pub async fn backup_media(
    media_root: &Path,
    backup_dir: &Path,
    stamp: &str,
) -> Result<PathBuf, BackupError> {
    let media_root = media_root.to_path_buf();
    let output = backup_dir.join(archive_file_name(stamp));
    let backup_dir = backup_dir.to_path_buf();
    let target = output.clone();

    let result = tokio::task::spawn_blocking(move || {
        fs::create_dir_all(&backup_dir)?;
        write_archive(&media_root, &target)?;
        Ok::<_, BackupError>(())
    })
    .await?;

    if let Err(err) = result {
        if fs::remove_file(&output).is_ok() {
            warn!(path = %output.display(), "removed partial media archive");
        }
        return Err(err);
    }
    info!(path = %output.display(), "media archive written");
    Ok(output)
}

fn write_archive(media_root: &Path, output: &Path) -> Result<(), BackupError> {
    if !media_root.is_dir() {
        return Err(BackupError::MediaRootMissing(media_root.to_path_buf()));
    }
    let dir_name = media_root
        .canonicalize()?
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("media"));

    let encoder = GzEncoder::new(File::create(output)?, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(&dir_name, media_root)?;
    builder.into_inner()?.finish()?;
    Ok(())
}

/// Counts reported by a completed restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreReport {
    pub entries: usize,
}

/// Replaces the media root with the contents of `archive`.
///
/// The archive is read end to end first. Nothing under the media root changes
/// unless that pass succeeds.
pub async fn restore_media(archive: &Path, media_root: &Path) -> Result<RestoreReport, BackupError> {
    let archive = archive.to_path_buf();
    let media_root = media_root.to_path_buf();
    tokio::task::spawn_blocking(move || {
        validate_archive(&archive)?;
        warn!(media_root = %media_root.display(), "replacing media directory");
        if media_root.exists() {
            fs::remove_dir_all(&media_root)?;
        }
        fs::create_dir_all(&media_root)?;
        let entries = extract_archive(&archive, &media_root)?;
        info!(entries, archive = %archive.display(), "media restored");
        Ok::<_, BackupError>(RestoreReport { entries })
    })
    .await?
}

fn open_archive(path: &Path) -> io::Result<tar::Archive<GzDecoder<File>>> {
    Ok(tar::Archive::new(GzDecoder::new(File::open(path)?)))
}

/// Path of an entry below its top-level directory; `None` for the top-level entry itself.
fn stripped(entry_path: &Path) -> Result<Option<PathBuf>, BackupError> {
    let mut components = entry_path.components();
    match components.next() {
        Some(Component::Normal(_)) => {}
        Some(Component::CurDir) => return stripped(components.as_path()),
        _ => return Err(BackupError::UnsafeEntry(entry_path.to_path_buf())),
    }
    let rest = components.as_path();
    if rest
        .components()
        .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir))
    {
        return Err(BackupError::UnsafeEntry(entry_path.to_path_buf()));
    }
    Ok((!rest.as_os_str().is_empty()).then(|| rest.to_path_buf()))
}

fn link_is_safe(target: &Path) -> bool {
    target
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

fn invalid(archive: &Path, err: impl ToString) -> BackupError {
    BackupError::InvalidArchive {
        path: archive.to_path_buf(),
        reason: err.to_string(),
    }
}

fn validate_archive(archive: &Path) -> Result<(), BackupError> {
    if !archive.is_file() {
        return Err(BackupError::ArchiveMissing(archive.to_path_buf()));
    }
    let mut reader = open_archive(archive).map_err(|err| invalid(archive, err))?;
    let mut seen = 0usize;
    for entry in reader.entries().map_err(|err| invalid(archive, err))? {
        let mut entry = entry.map_err(|err| invalid(archive, err))?;
        let path = entry.path().map_err(|err| invalid(archive, err))?.into_owned();
        stripped(&path)?;
        if entry.header().entry_type().is_symlink() || entry.header().entry_type().is_hard_link() {
            let target = entry.link_name().map_err(|err| invalid(archive, err))?;
            if !target.map(|target| link_is_safe(&target)).unwrap_or(false) {
                return Err(BackupError::UnsafeEntry(path));
            }
        }
        io::copy(&mut entry, &mut io::sink()).map_err(|err| invalid(archive, err))?;
        seen += 1;
    }
    if seen == 0 {
        return Err(invalid(archive, "archive is empty"));
    }
    // Reading to the end verifies the gzip trailer and checksum.
    let mut decoder = reader.into_inner();
    io::copy(&mut decoder, &mut io::sink()).map_err(|err| invalid(archive, err))?;
    Ok(())
}

fn extract_archive(archive: &Path, media_root: &Path) -> Result<usize, BackupError> {
    let mut reader = open_archive(archive)?;
    let mut extracted = 0;
    for entry in reader.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        let Some(relative) = stripped(&path)? else {
            continue;
        };
        let destination = media_root.join(relative);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        entry.unpack(&destination)?;
        extracted += 1;
    }
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_directory_is_stripped() {
        assert_eq!(stripped(Path::new("media")).expect("safe"), None);
        assert_eq!(
            stripped(Path::new("media/images/a.png")).expect("safe"),
            Some(PathBuf::from("images/a.png"))
        );
        assert_eq!(
            stripped(Path::new("./media/doc.pdf")).expect("safe"),
            Some(PathBuf::from("doc.pdf"))
        );
    }

    #[test]
    fn escaping_paths_are_rejected() {
        assert!(matches!(
            stripped(Path::new("media/../../etc/passwd")),
            Err(BackupError::UnsafeEntry(_))
        ));
        assert!(matches!(
            stripped(Path::new("/etc/passwd")),
            Err(BackupError::UnsafeEntry(_))
        ));
        assert!(matches!(
            stripped(Path::new("../outside")),
            Err(BackupError::UnsafeEntry(_))
        ));
    }

    #[test]
    fn archive_names_carry_the_stamp() {
        assert_eq!(
            archive_file_name("2025-12-22_120000"),
            "wagtail_media_2025-12-22_120000.tar.gz"
        );
    }
}
