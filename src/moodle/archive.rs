//! Unpacking `.mbz` backup archives.
//!
//! Moodle has shipped backups both as gzip-compressed tarballs and as zip
//! files under the same extension, so the container is detected from its
//! magic bytes rather than the file name.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::GzDecoder;
use tempfile::TempDir;
use tracing::info;

use crate::error::{Error, Result};

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
const ZIP_MAGIC: [u8; 4] = [b'P', b'K', 0x03, 0x04];

/// Container format of a backup archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Zip,
}

/// Detect the container format from the leading bytes.
pub fn detect_archive(magic: &[u8]) -> Option<ArchiveKind> {
    if magic.starts_with(&GZIP_MAGIC) {
        Some(ArchiveKind::TarGz)
    } else if magic.starts_with(&ZIP_MAGIC) {
        Some(ArchiveKind::Zip)
    } else {
        None
    }
}

/// Unpack `path` into a fresh temporary directory.
///
/// The directory is removed when the returned [`TempDir`] is dropped.
pub fn extract_archive(path: &Path) -> Result<TempDir> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 4];
    let read = file.read(&mut magic)?;
    file.seek(SeekFrom::Start(0))?;

    let kind = detect_archive(&magic[..read]).ok_or_else(|| {
        Error::InvalidBackup(format!(
            "{} is neither a directory nor a gzip/zip backup archive",
            path.display()
        ))
    })?;

    let dir = tempfile::Builder::new().prefix("moodle2edx").tempdir()?;
    info!(archive = %path.display(), kind = ?kind, "extracting backup");

    match kind {
        ArchiveKind::TarGz => {
            let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
            archive.unpack(dir.path())?;
        }
        ArchiveKind::Zip => {
            let mut archive = zip::ZipArchive::new(BufReader::new(file))?;
            archive.extract(dir.path())?;
        }
    }

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_archive() {
        assert_eq!(detect_archive(&[0x1F, 0x8B, 0x08, 0x00]), Some(ArchiveKind::TarGz));
        assert_eq!(detect_archive(b"PK\x03\x04"), Some(ArchiveKind::Zip));
        assert_eq!(detect_archive(b"<?xm"), None);
        assert_eq!(detect_archive(&[]), None);
    }

    #[test]
    fn test_extract_tar_gz() {
        let src = TempDir::new().unwrap();
        let archive_path = src.path().join("course.mbz");

        let file = File::create(&archive_path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let data = b"<moodle_backup/>";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "moodle_backup.xml", &data[..])
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let dir = extract_archive(&archive_path).unwrap();
        let extracted = std::fs::read(dir.path().join("moodle_backup.xml")).unwrap();
        assert_eq!(extracted, data);
    }

    #[test]
    fn test_extract_zip() {
        let src = TempDir::new().unwrap();
        let archive_path = src.path().join("course.mbz");

        let file = File::create(&archive_path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("files.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<files/>").unwrap();
        zip.finish().unwrap();

        let dir = extract_archive(&archive_path).unwrap();
        assert!(dir.path().join("files.xml").exists());
    }

    #[test]
    fn test_reject_unknown_container() {
        let src = TempDir::new().unwrap();
        let path = src.path().join("notes.txt");
        std::fs::write(&path, "plain text").unwrap();
        assert!(matches!(extract_archive(&path), Err(Error::InvalidBackup(_))));
    }
}
